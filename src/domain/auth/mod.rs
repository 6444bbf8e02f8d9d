pub mod dto;
pub mod error;
pub mod service;

pub use dto::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    UserProfile,
};
pub use error::AuthError;
pub use service::{AuthService, AuthServiceApi};
