//! Google OAuth 2.0 endpoints and client configuration.

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
/// Legacy userinfo endpoint used by the best-effort display-name refresh.
pub const GOOGLE_USERINFO_V1_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v1/userinfo";

pub const GOOGLE_SCOPES: &str = "profile email";

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}
