pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ClientError, ClientResult};
pub use infrastructure::config::Config;
pub use infrastructure::http::{ApiClient, ApiRequest, ApiResponse};
