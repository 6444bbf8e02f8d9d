pub mod client;
pub mod request;
pub mod response;

pub use client::{ApiClient, REFRESH_PATH, X_REQUEST_ID};
pub use request::{segment, ApiRequest};
pub use response::ApiResponse;
