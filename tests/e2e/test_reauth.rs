use crate::e2e::helpers;

use coursedesk_client::domain::session::{ExpiryReason, Navigator, SessionEvent};
use coursedesk_client::{ApiRequest, ClientError};
use futures::future::join_all;
use helpers::{drain_events, TestContext, START_PATH};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_attach_bearer_token_exactly_once(ctx: &TestContext) {
    let token = ctx.sign_in_as("teacher");

    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);

    let requests = ctx.state().requests_to("GET", "/courses");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization, vec![format!("Bearer {}", token)]);
    assert!(requests[0].request_id.is_some(), "x-request-id should be set");
    assert!(
        requests[0]
            .cookie
            .as_deref()
            .unwrap_or_default()
            .contains("accessToken="),
        "credential cookies should be sent"
    );
    assert_eq!(ctx.state().refresh_calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refresh_and_retry_with_new_token(ctx: &TestContext) {
    // A1 is no longer accepted by the backend, R1 still is
    ctx.state().allow_refresh_token("R1", None);
    ctx.seed_tokens(Some("A1"), Some("R1"));
    let mut events = ctx.client.subscribe();

    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ctx.state().refresh_bodies(), vec![json!({ "refreshToken": "R1" })]);
    assert_eq!(ctx.client.session().access_token().as_deref(), Some("A2"));

    let requests = ctx.state().requests_to("GET", "/courses");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].authorization, vec!["Bearer A1".to_string()]);
    assert_eq!(requests[1].authorization, vec!["Bearer A2".to_string()]);

    assert_eq!(drain_events(&mut events), vec![SessionEvent::Refreshed]);
    assert!(ctx.navigator.history().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_replay_method_and_body_on_retry(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R1", None);
    ctx.seed_tokens(Some("A1"), Some("R1"));

    let request = ApiRequest::patch("/echo")
        .json(&json!({ "title": "Week 3 slides" }))
        .unwrap();
    let response = ctx.client.send(request).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body.unwrap(),
        json!({ "method": "PATCH", "body": { "title": "Week 3 slides" } })
    );
    assert_eq!(ctx.state().hits("PATCH", "/echo"), 2);
    assert_eq!(ctx.state().refresh_calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_retry_twice_when_retry_is_also_unauthorized(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R1", None);
    ctx.seed_tokens(Some("A1"), Some("R1"));

    let response = ctx.client.send(ApiRequest::get("/always-401")).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.state().hits("GET", "/always-401"), 2);
    assert_eq!(ctx.state().refresh_calls(), 1);
    // The refreshed token stays; only a failed refresh tears the session down
    assert_eq!(ctx.client.session().access_token().as_deref(), Some("A2"));
    assert!(ctx.navigator.history().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clear_and_redirect_without_refresh_token(ctx: &TestContext) {
    let mut events = ctx.client.subscribe();
    assert_eq!(ctx.navigator.current_path(), START_PATH);

    let response = ctx.client.send(ApiRequest::get("/profile")).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.state().refresh_calls(), 0);
    assert!(!ctx.client.session().is_authenticated());
    assert_eq!(ctx.navigator.current_path(), "/login");
    assert_eq!(ctx.navigator.history(), vec!["/login".to_string()]);
    assert_eq!(
        drain_events(&mut events),
        vec![SessionEvent::Expired {
            reason: ExpiryReason::MissingRefreshToken,
            redirected_to: Some("/login".to_string()),
        }]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clear_stale_access_token_when_refresh_token_missing(ctx: &TestContext) {
    ctx.seed_tokens(Some("A1"), None);

    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(ctx.client.session().access_token().is_none());
    assert_eq!(ctx.state().hits("GET", "/courses"), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_redirect_only_once_across_failures(ctx: &TestContext) {
    ctx.client.send(ApiRequest::get("/profile")).await.unwrap();
    ctx.client.send(ApiRequest::get("/courses")).await.unwrap();

    assert_eq!(ctx.navigator.history(), vec!["/login".to_string()]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_redirect_from_auth_pages(ctx: &TestContext) {
    for page in ["/login", "/register", "/forgot-password", "/reset-password"] {
        let (client, navigator) = ctx.client_at(page, |_| {});
        client.session().store_refresh_token("R-unknown", false).unwrap();
        let mut events = client.subscribe();

        let response = client.send(ApiRequest::get("/courses")).await.unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(navigator.history().is_empty(), "redirected away from {}", page);
        assert_eq!(navigator.current_path(), page);
        assert!(!client.session().is_authenticated());
        assert_eq!(
            drain_events(&mut events),
            vec![SessionEvent::Expired {
                reason: ExpiryReason::RefreshFailed,
                redirected_to: None,
            }]
        );
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_tear_down_session_when_refresh_is_rejected(ctx: &TestContext) {
    ctx.seed_tokens(Some("A1"), Some("R-revoked"));
    let mut events = ctx.client.subscribe();

    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_message().as_deref(), Some("Unauthorized"));
    assert_eq!(ctx.state().refresh_calls(), 1);
    assert_eq!(ctx.state().hits("GET", "/courses"), 1);
    assert!(!ctx.client.session().is_authenticated());
    assert_eq!(ctx.navigator.history(), vec!["/login".to_string()]);
    assert_eq!(
        drain_events(&mut events),
        vec![SessionEvent::Expired {
            reason: ExpiryReason::RefreshFailed,
            redirected_to: Some("/login".to_string()),
        }]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_treat_refresh_server_error_as_rejection(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R1", None);
    ctx.state().set_refresh_server_error(true);
    ctx.seed_tokens(Some("A1"), Some("R1"));

    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!ctx.client.session().is_authenticated());
    assert_eq!(ctx.navigator.current_path(), "/login");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_treat_refresh_timeout_as_rejection(ctx: &TestContext) {
    let (client, navigator) = ctx.client_at("/teacher", |config| {
        config.request_timeout_secs = Some(1);
    });
    ctx.state().allow_refresh_token("R1", None);
    ctx.state().set_refresh_delay(Duration::from_millis(1500));
    client.session().store_access_token("A1", chrono::Duration::days(1), false).unwrap();
    client.session().store_refresh_token("R1", false).unwrap();

    let response = client.send(ApiRequest::get("/courses")).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!client.session().is_authenticated());
    assert_eq!(navigator.history(), vec!["/login".to_string()]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pass_through_other_errors(ctx: &TestContext) {
    ctx.sign_in_as("teacher");

    let response = ctx.client.send(ApiRequest::get("/broken")).await.unwrap();

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_message().as_deref(), Some("Database unavailable"));
    assert_eq!(ctx.state().refresh_calls(), 0);
    assert!(ctx.client.session().is_authenticated());

    let err = response.into_result().unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
    ));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_coalesce_concurrent_refreshes(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R1", None);
    ctx.state().set_refresh_delay(Duration::from_millis(100));
    ctx.seed_tokens(Some("A1"), Some("R1"));

    let responses = join_all((0..5).map(|_| ctx.client.send(ApiRequest::get("/courses")))).await;

    for response in responses {
        assert_eq!(response.unwrap().status, StatusCode::OK);
    }
    assert_eq!(ctx.state().refresh_calls(), 1);
    assert_eq!(ctx.client.session().access_token().as_deref(), Some("A2"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_publish_one_expiry_for_concurrent_failures(ctx: &TestContext) {
    ctx.seed_tokens(Some("A1"), None);
    let mut events = ctx.client.subscribe();

    let responses = join_all((0..5).map(|_| ctx.client.send(ApiRequest::get("/courses")))).await;

    for response in responses {
        assert_eq!(response.unwrap().status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(
        drain_events(&mut events),
        vec![SessionEvent::Expired {
            reason: ExpiryReason::MissingRefreshToken,
            redirected_to: Some("/login".to_string()),
        }]
    );
    assert_eq!(ctx.navigator.history(), vec!["/login".to_string()]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_publish_one_expiry_when_shared_refresh_fails(ctx: &TestContext) {
    ctx.state().set_refresh_delay(Duration::from_millis(50));
    ctx.seed_tokens(Some("A1"), Some("R-revoked"));
    let mut events = ctx.client.subscribe();

    join_all((0..4).map(|_| ctx.client.send(ApiRequest::get("/courses")))).await;

    assert_eq!(ctx.state().refresh_calls(), 1);
    assert_eq!(
        drain_events(&mut events),
        vec![SessionEvent::Expired {
            reason: ExpiryReason::RefreshFailed,
            redirected_to: Some("/login".to_string()),
        }]
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_store_rotated_refresh_token(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R1", None);
    ctx.state().set_rotate_refresh_tokens(true);
    ctx.seed_tokens(Some("A1"), Some("R1"));

    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);

    let rotated = ctx.client.session().refresh_token().unwrap();
    assert_ne!(rotated, "R1");
    assert!(ctx.state().is_refresh_token_valid(&rotated));
    assert!(!ctx.state().is_refresh_token_valid("R1"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refresh_when_access_cookie_has_expired(ctx: &TestContext) {
    ctx.state().allow_access_token("A1", None);
    ctx.state().allow_refresh_token("R1", None);
    ctx.seed_expired_access_cookie("A1");
    ctx.seed_tokens(None, Some("R1"));

    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);

    let requests = ctx.state().requests_to("GET", "/courses");
    assert_eq!(requests.len(), 2);
    assert!(requests[0].authorization.is_empty());
    assert_eq!(requests[1].authorization, vec!["Bearer A2".to_string()]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refresh_again_on_later_expiry(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R1", None);
    ctx.seed_tokens(Some("A1"), Some("R1"));

    ctx.client.send(ApiRequest::get("/courses")).await.unwrap();
    assert_eq!(ctx.client.session().access_token().as_deref(), Some("A2"));

    // A2 expires server-side too; the stored token is the one that failed
    ctx.state().revoke_access_token("A2");
    let response = ctx.client.send(ApiRequest::get("/courses")).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ctx.state().refresh_calls(), 2);
    let requests = ctx.state().requests_to("GET", "/courses");
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[3].authorization, vec!["Bearer A3".to_string()]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_transport_errors(ctx: &TestContext) {
    let (client, navigator) = ctx.client_at("/teacher", |config| {
        config.api_url = "http://127.0.0.1:1/api".to_string();
    });
    client.session().store_refresh_token("R1", false).unwrap();

    let result = client.send(ApiRequest::get("/courses")).await;

    assert!(matches!(result, Err(ClientError::Transport(_))));
    // Nothing came back, so nothing was torn down
    assert!(client.session().is_authenticated());
    assert!(navigator.history().is_empty());
}
