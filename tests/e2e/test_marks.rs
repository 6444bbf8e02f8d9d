use crate::e2e::helpers;

use coursedesk_client::domain::access::Role;
use coursedesk_client::domain::mark::{MarkEntry, MarkService, MarkServiceApi};
use coursedesk_client::domain::session::{ExpiryReason, SessionEvent};
use coursedesk_client::ClientError;
use helpers::mock_backend::jwt_for;
use helpers::{drain_events, TestContext};
use pretty_assertions::assert_eq;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_marks_for_a_course(ctx: &TestContext) {
    ctx.sign_in_as("admin");

    let marks = MarkService::new(ctx.client.clone())
        .list_marks("c1")
        .await
        .unwrap();

    assert_eq!(marks.len(), 2);
    assert_eq!(marks[0].student_id, "s1");
    assert_eq!(marks[0].score, 72.5);
    assert_eq!(marks[0].comment.as_deref(), Some("Solid work"));
    assert_eq!(marks[1].comment, None);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_submit_marks_as_teacher(ctx: &TestContext) {
    ctx.sign_in_as("teacher");

    let saved = MarkService::new(ctx.client.clone())
        .submit_marks(
            "c2",
            vec![
                MarkEntry::new("s1", 81.0).with_comment("Excellent analysis"),
                MarkEntry::new("s2", 64.5),
            ],
        )
        .await
        .unwrap();

    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].course_id, "c2");
    assert_eq!(saved[0].comment.as_deref(), Some("Excellent analysis"));
    assert_eq!(saved[1].score, 64.5);
    assert_eq!(ctx.state().hits("PUT", "/courses/c2/marks"), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_validate_mark_sheet_before_sending(ctx: &TestContext) {
    ctx.sign_in_as("teacher");
    let marks = MarkService::new(ctx.client.clone());

    let out_of_range = marks
        .submit_marks("c2", vec![MarkEntry::new("s1", 101.0)])
        .await;
    assert!(matches!(out_of_range, Err(ClientError::Validation(_))));

    let duplicated = marks
        .submit_marks(
            "c2",
            vec![MarkEntry::new("s1", 50.0), MarkEntry::new("s1", 60.0)],
        )
        .await;
    assert!(matches!(duplicated, Err(ClientError::Validation(_))));

    let empty = marks.submit_marks("c2", vec![]).await;
    assert!(matches!(empty, Err(ClientError::Validation(_))));

    assert_eq!(ctx.state().hits("PUT", "/courses/c2/marks"), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_forbid_admin_from_entering_marks(ctx: &TestContext) {
    ctx.sign_in_as("admin");

    let result = MarkService::new(ctx.client.clone())
        .submit_marks("c1", vec![MarkEntry::new("s1", 70.0)])
        .await;

    assert!(matches!(result, Err(ClientError::Forbidden(_))));
    assert_eq!(ctx.state().hits("PUT", "/courses/c1/marks"), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refresh_lapsed_access_cookie_before_role_check(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R1", Some("teacher"));
    ctx.seed_expired_access_cookie(&jwt_for("teacher", 7));
    ctx.seed_tokens(None, Some("R1"));

    let marks = MarkService::new(ctx.client.clone())
        .list_marks("c1")
        .await
        .unwrap();

    assert_eq!(marks.len(), 2);
    assert_eq!(ctx.state().refresh_calls(), 1);
    assert_eq!(ctx.state().hits("GET", "/courses/c1/marks"), 1);
    assert_eq!(ctx.client.session().role(), Some(Role::Teacher));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_check_permission_after_refreshing_lapsed_cookie(ctx: &TestContext) {
    ctx.state().allow_refresh_token("R-admin", Some("admin"));
    ctx.seed_expired_access_cookie(&jwt_for("admin", 7));
    ctx.seed_tokens(None, Some("R-admin"));

    let result = MarkService::new(ctx.client.clone())
        .submit_marks("c1", vec![MarkEntry::new("s1", 70.0)])
        .await;

    assert!(matches!(result, Err(ClientError::Forbidden(_))));
    assert_eq!(ctx.state().refresh_calls(), 1);
    assert_eq!(ctx.state().hits("PUT", "/courses/c1/marks"), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_expire_session_when_lapsed_cookie_cannot_be_refreshed(ctx: &TestContext) {
    ctx.seed_expired_access_cookie(&jwt_for("teacher", 7));
    ctx.seed_tokens(None, Some("R-revoked"));
    let mut events = ctx.client.subscribe();

    let result = MarkService::new(ctx.client.clone()).list_marks("c1").await;

    assert!(matches!(result, Err(ClientError::Unauthorized(_))));
    assert_eq!(ctx.state().refresh_calls(), 1);
    assert_eq!(ctx.state().hits("GET", "/courses/c1/marks"), 0);
    assert!(!ctx.client.session().is_authenticated());
    assert_eq!(
        drain_events(&mut events),
        vec![SessionEvent::Expired {
            reason: ExpiryReason::RefreshFailed,
            redirected_to: Some("/login".to_string()),
        }]
    );
}
