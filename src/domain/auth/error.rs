use crate::error::ClientError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<ClientError> for AuthError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized(_) => AuthError::InvalidCredentials,
            ClientError::RefreshRejected(_) => AuthError::SessionExpired,
            ClientError::Validation(msg) => AuthError::Invalid(msg),
            ClientError::Api { status, message } if status.is_client_error() => {
                AuthError::Invalid(message)
            }
            _ => AuthError::Dependency(err.to_string()),
        }
    }
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ClientError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::SessionExpired => {
                ClientError::RefreshRejected("Session expired".to_string())
            }
            AuthError::Invalid(msg) => ClientError::Validation(msg),
            AuthError::Dependency(msg) => ClientError::Internal(msg),
        }
    }
}
