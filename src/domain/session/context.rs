use chrono::{Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::cookie::{Cookie, SameSite, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use super::store::CredentialStore;
use crate::domain::access::{Permission, Role};
use crate::error::{ClientError, ClientResult};

/// Claims carried by backend-issued access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    pub exp: i64,
}

/// Session context owned by the API client.
///
/// Cheap to clone; all clones share the same underlying store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Live cookie by name. Expired entries are evicted on read.
    fn live(&self, name: &str) -> Option<Cookie> {
        let cookie = self.store.get(name)?;
        if cookie.is_expired(Utc::now()) {
            if let Err(e) = self.store.remove(name) {
                tracing::warn!(error = %e, cookie = name, "Failed to evict expired cookie");
            }
            return None;
        }
        Some(cookie)
    }

    pub fn access_token(&self) -> Option<String> {
        self.live(ACCESS_TOKEN_COOKIE).map(|c| c.value)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.live(REFRESH_TOKEN_COOKIE).map(|c| c.value)
    }

    pub fn store_access_token(&self, token: &str, ttl: Duration, secure: bool) -> ClientResult<()> {
        self.store.set(
            Cookie::new(ACCESS_TOKEN_COOKIE, token)
                .expires_at(Utc::now() + ttl)
                .secure(secure)
                .same_site(SameSite::Lax),
        )
    }

    pub fn store_refresh_token(&self, token: &str, secure: bool) -> ClientResult<()> {
        self.store.set(
            Cookie::new(REFRESH_TOKEN_COOKIE, token)
                .secure(secure)
                .same_site(SameSite::Lax),
        )
    }

    /// Drop all local auth state
    pub fn clear(&self) -> ClientResult<()> {
        self.store.clear()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some() || self.refresh_token().is_some()
    }

    /// Value for a `Cookie:` header, `None` when the jar holds nothing live
    pub fn cookie_header(&self) -> Option<String> {
        let now = Utc::now();
        let mut cookies: Vec<Cookie> = self
            .store
            .all()
            .into_iter()
            .filter(|c| !c.is_expired(now))
            .collect();
        if cookies.is_empty() {
            return None;
        }
        cookies.sort_by(|a, b| a.name.cmp(&b.name));
        Some(
            cookies
                .iter()
                .map(Cookie::header_pair)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Claims of the current access token, read without signature checks.
    /// Only good for UI decisions; the backend remains the authority.
    pub fn claims(&self) -> Option<Claims> {
        let token = self.access_token()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(&token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .ok()
    }

    pub fn role(&self) -> Option<Role> {
        self.claims().and_then(|c| c.role)
    }

    /// Check the current role against the static permission table
    pub fn require(&self, permission: Permission) -> ClientResult<Role> {
        let role = self
            .role()
            .ok_or_else(|| ClientError::Unauthorized("No signed-in role".to_string()))?;
        if !role.can(permission) {
            return Err(ClientError::Forbidden(format!(
                "Role '{}' lacks permission {:?}",
                role, permission
            )));
        }
        Ok(role)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
