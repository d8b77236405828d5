use axum::{
    extract::{Query, State},
    response::Redirect,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::middleware::error_handling::Result;
use crate::middleware::JwtService;
use crate::services::OAuthService;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// GET /auth/google — redirect to Google's consent screen.
pub async fn google_start(State(config): State<AppConfig>) -> Result<Redirect> {
    let oauth_service = OAuthService::new(config.database_pool.clone(), config.oauth.clone());
    let auth_url = oauth_service.authorization_url()?;

    Ok(Redirect::temporary(&auth_url))
}

/// GET /auth/google/callback
///
/// Always answers with a redirect: to the success page carrying the token, or
/// back to the login page with an error marker. Never a JSON error body.
pub async fn google_callback(
    State(config): State<AppConfig>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if let Some(error) = &query.error {
        tracing::warn!(error = %error, "Google OAuth callback returned an error");
        return login_error_redirect("Google authentication failed");
    }
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::warn!("Google OAuth callback missing authorization code");
        return login_error_redirect("Google authentication failed");
    };

    let oauth_service = OAuthService::new(config.database_pool.clone(), config.oauth.clone());
    let user = match oauth_service.login(code).await {
        Ok(user) => user,
        Err(err) => {
            tracing::error!(error = %err, "Google OAuth code exchange failed");
            return login_error_redirect("Google authentication failed");
        }
    };

    let jwt_service = JwtService::new(&config.jwt_secret);
    match jwt_service.generate_token(user.id, &user.email) {
        Ok(token) => {
            let encoded = utf8_percent_encode(&token, NON_ALPHANUMERIC).to_string();
            Redirect::temporary(&format!("/auth/success?token={encoded}"))
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to sign token after Google login");
            login_error_redirect("Something went wrong")
        }
    }
}

fn login_error_redirect(message: &str) -> Redirect {
    let encoded = utf8_percent_encode(message, NON_ALPHANUMERIC).to_string();
    Redirect::temporary(&format!("/auth/login?error={encoded}"))
}
