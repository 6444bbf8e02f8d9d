pub mod context;
pub mod cookie;
pub mod events;
pub mod navigation;
pub mod store;

pub use context::{Claims, Session};
pub use cookie::{Cookie, SameSite, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use events::{ExpiryReason, SessionEvent};
pub use navigation::{is_auth_page, MemoryNavigator, Navigator, AUTH_PAGES};
pub use store::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
