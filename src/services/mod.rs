pub mod auth_service;
pub mod oauth_service;

pub use auth_service::AuthService;
pub use oauth_service::OAuthService;
