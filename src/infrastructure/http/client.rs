use moka::future::Cache;
use reqwest::header::COOKIE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use super::request::ApiRequest;
use super::response::ApiResponse;
use crate::domain::access::{Permission, Role};
use crate::domain::auth::{RefreshTokenRequest, RefreshTokenResponse};
use crate::domain::session::{is_auth_page, ExpiryReason, Navigator, Session, SessionEvent};
use crate::error::{ClientError, ClientResult};
use crate::infrastructure::config::Config;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const REFRESH_PATH: &str = "/auth/refresh";

const EVENT_CHANNEL_CAPACITY: usize = 32;
const CACHE_CAPACITY: u64 = 256;

/// HTTP client for the course backend.
///
/// Attaches the stored access token to every request and recovers from a
/// single 401 by refreshing the token and replaying the request once. When
/// the session cannot be recovered the credentials are dropped, the
/// navigator is sent to the login page and `SessionEvent::Expired` is
/// published.
pub struct ApiClient {
    config: Arc<Config>,
    http_client: reqwest::Client,
    session: Session,
    navigator: Arc<dyn Navigator>,
    events: broadcast::Sender<SessionEvent>,
    // Serialises refreshes so concurrent 401s share one refresh call
    refresh_lock: Mutex<()>,
    cache: Option<Cache<String, ApiResponse>>,
}

impl ApiClient {
    pub fn new(
        config: Arc<Config>,
        session: Session,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        // Initialize cache if enabled
        let cache = if config.cache_ttl_secs > 0 {
            Some(
                Cache::builder()
                    .max_capacity(CACHE_CAPACITY)
                    .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                    .build(),
            )
        } else {
            None
        };

        Ok(Self {
            config,
            http_client,
            session,
            navigator,
            events,
            refresh_lock: Mutex::new(()),
            cache,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    /// Send a request, refreshing the access token at most once on a 401.
    ///
    /// Only transport failures are errors; every HTTP status, including an
    /// unrecovered 401, comes back as an `ApiResponse`.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let use_cache = request.cacheable && request.method == Method::GET;

        if use_cache {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.get(&request.cache_key()).await {
                    tracing::debug!(path = %request.path, "Response cache hit");
                    return Ok(hit);
                }
            }
        }

        let token = self.session.access_token();
        let mut response = self.dispatch(&request, token.as_deref()).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                "Received 401, attempting reauthentication"
            );
            if let Some(new_token) = self.reauthenticate(token.as_deref()).await {
                response = self.dispatch(&request, Some(&new_token)).await?;
            }
        }

        if request.method != Method::GET {
            self.invalidate_cache();
        } else if use_cache && response.is_success() {
            if let Some(cache) = &self.cache {
                cache.insert(request.cache_key(), response.clone()).await;
            }
        }

        Ok(response)
    }

    /// Send and decode a successful JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        self.send(request).await?.into_result()?.json()
    }

    /// Role of the signed-in user, checked against `permission`.
    ///
    /// When the access cookie has lapsed but a refresh token is stored, the
    /// token is refreshed first so the role can be read from the new one.
    pub async fn authorize(&self, permission: Permission) -> ClientResult<Role> {
        if self.session.access_token().is_none() && self.session.refresh_token().is_some() {
            tracing::debug!(?permission, "Access token missing, refreshing before role check");
            self.reauthenticate(None).await;
        }
        self.session.require(permission)
    }

    /// Persist a freshly issued token pair
    pub(crate) fn store_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> ClientResult<()> {
        let secure = self.config.uses_tls();
        self.session
            .store_access_token(access_token, self.config.access_token_ttl(), secure)?;
        if let Some(refresh_token) = refresh_token {
            self.session.store_refresh_token(refresh_token, secure)?;
        }
        Ok(())
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        self.events.send(event).ok();
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> ClientResult<ApiResponse> {
        let request_id = Uuid::new_v4().to_string();

        let mut builder = self
            .http_client
            .request(request.method.clone(), self.url(&request.path))
            .header(X_REQUEST_ID, &request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(cookies) = self.session.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                method = %request.method,
                path = %request.path,
                error = %e,
                "Request failed before a response arrived"
            );
            ClientError::Transport(e)
        })?;

        let response = ApiResponse::from_response(response).await?;

        tracing::debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            "Request completed"
        );

        Ok(response)
    }

    /// Obtain a usable access token after `failed_token` was rejected.
    /// Returns `None` once the session has been torn down.
    async fn reauthenticate(&self, failed_token: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.session.access_token();
        let refresh_token = self.session.refresh_token();

        // Another request refreshed while we waited for the lock
        if let Some(current) = current.as_ref() {
            if Some(current.as_str()) != failed_token {
                tracing::debug!("Access token already replaced, reusing it");
                return Some(current.clone());
            }
        }

        // Another request already tore the session down
        if failed_token.is_some() && current.is_none() && refresh_token.is_none() {
            tracing::debug!("Session already expired, skipping reauthentication");
            return None;
        }

        let Some(refresh_token) = refresh_token else {
            self.expire_session(ExpiryReason::MissingRefreshToken);
            return None;
        };

        match self.request_refresh(&refresh_token).await {
            Ok(tokens) => {
                if let Err(e) =
                    self.store_tokens(&tokens.access_token, tokens.refresh_token.as_deref())
                {
                    tracing::error!(error = %e, "Failed to persist refreshed tokens");
                }
                tracing::info!("Access token refreshed");
                self.emit(SessionEvent::Refreshed);
                Some(tokens.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.expire_session(ExpiryReason::RefreshFailed);
                None
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> ClientResult<RefreshTokenResponse> {
        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        })?;

        let response = self
            .dispatch(&request, None)
            .await?
            .into_result()
            .map_err(|e| ClientError::RefreshRejected(e.to_string()))?;

        let tokens: RefreshTokenResponse = response.json()?;
        if tokens.access_token.is_empty() {
            return Err(ClientError::RefreshRejected(
                "Refresh response carried an empty access token".to_string(),
            ));
        }

        Ok(tokens)
    }

    /// Tear down local auth state and send the user to the login page
    fn expire_session(&self, reason: ExpiryReason) {
        if let Err(e) = self.session.clear() {
            tracing::error!(error = %e, "Failed to clear credentials");
        }
        self.invalidate_cache();

        let current = self.navigator.current_path();
        let redirected_to = if is_auth_page(&current) || current == self.config.login_path {
            None
        } else {
            self.navigator.navigate(&self.config.login_path);
            Some(self.config.login_path.clone())
        };

        tracing::warn!(
            reason = %reason,
            from = %current,
            redirected = redirected_to.is_some(),
            "Session expired"
        );

        self.emit(SessionEvent::Expired {
            reason,
            redirected_to,
        });
    }
}
