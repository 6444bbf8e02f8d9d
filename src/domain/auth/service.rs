use super::dto::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest, UserProfile,
};
use super::error::AuthError;
use crate::domain::session::SessionEvent;
use crate::infrastructure::http::{ApiClient, ApiRequest};
use async_trait::async_trait;
use std::sync::Arc;

const MIN_PASSWORD_LEN: usize = 8;

pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn validate_email(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        let valid = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !valid {
            return Err(AuthError::Invalid(format!("'{}' is not an email address", email)));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait AuthServiceApi: Send + Sync {
    /// Exchange credentials for a token pair and store both tokens
    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError>;

    /// Revoke the refresh token server-side (best effort) and clear local state
    async fn logout(&self) -> Result<(), AuthError>;

    async fn register(&self, request: RegisterRequest) -> Result<String, AuthError>;

    async fn forgot_password(&self, email: &str) -> Result<String, AuthError>;

    async fn reset_password(&self, token: &str, password: &str) -> Result<String, AuthError>;

    async fn profile(&self) -> Result<UserProfile, AuthError>;
}

#[async_trait]
impl AuthServiceApi for AuthService {
    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        self.validate_email(email)?;
        if password.is_empty() {
            return Err(AuthError::Invalid("Password is required".to_string()));
        }

        let request = ApiRequest::post("/auth/login").json(&LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        })?;
        let response: LoginResponse = self.client.send_json(request).await?;

        self.client.invalidate_cache();
        self.client
            .store_tokens(&response.access_token, Some(&response.refresh_token))?;
        self.client.emit(SessionEvent::LoggedIn);

        tracing::info!(user_id = %response.user.id, role = %response.user.role, "Logged in");

        Ok(response.user)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        if let Some(refresh_token) = self.client.session().refresh_token() {
            let request = ApiRequest::post("/auth/logout").json(&RefreshTokenRequest {
                refresh_token,
            })?;
            match self.client.send(request).await {
                Ok(response) if !response.is_success() => {
                    tracing::warn!(
                        status = response.status.as_u16(),
                        "Server-side logout failed, clearing local session anyway"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Server-side logout failed, clearing local session anyway");
                }
                Ok(_) => {}
            }
        }

        self.client.invalidate_cache();
        self.client.session().clear()?;
        self.client.emit(SessionEvent::LoggedOut);

        tracing::info!("Logged out");

        Ok(())
    }

    async fn register(&self, request: RegisterRequest) -> Result<String, AuthError> {
        if request.name.trim().is_empty() {
            return Err(AuthError::Invalid("Name is required".to_string()));
        }
        self.validate_email(&request.email)?;
        self.validate_password(&request.password)?;

        let request = ApiRequest::post("/auth/register").json(&request)?;
        let response: MessageResponse = self.client.send_json(request).await?;
        Ok(response.message)
    }

    async fn forgot_password(&self, email: &str) -> Result<String, AuthError> {
        self.validate_email(email)?;

        let request = ApiRequest::post("/auth/forgot-password").json(&ForgotPasswordRequest {
            email: email.trim().to_string(),
        })?;
        let response: MessageResponse = self.client.send_json(request).await?;
        Ok(response.message)
    }

    async fn reset_password(&self, token: &str, password: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Invalid("Reset token is required".to_string()));
        }
        self.validate_password(password)?;

        let request = ApiRequest::post("/auth/reset-password").json(&ResetPasswordRequest {
            token: token.to_string(),
            password: password.to_string(),
        })?;
        let response: MessageResponse = self.client.send_json(request).await?;
        Ok(response.message)
    }

    async fn profile(&self) -> Result<UserProfile, AuthError> {
        let profile = self.client.send_json(ApiRequest::get("/profile")).await?;
        Ok(profile)
    }
}
