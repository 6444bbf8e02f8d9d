use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    /// A 401 arrived and no refresh token was stored
    MissingRefreshToken,
    /// The refresh call was rejected or could not be completed
    RefreshFailed,
}

impl std::fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpiryReason::MissingRefreshToken => write!(f, "missing_refresh_token"),
            ExpiryReason::RefreshFailed => write!(f, "refresh_failed"),
        }
    }
}

/// Session lifecycle notifications published by the API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    LoggedOut,
    Expired {
        reason: ExpiryReason,
        /// Where the navigator was sent, `None` when already on an auth page
        redirected_to: Option<String>,
    },
}
