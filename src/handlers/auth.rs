use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::middleware::error_handling::{AppError, Result};
use crate::middleware::validation;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile};
use crate::repositories::UserRepository;
use crate::services::AuthService;

pub async fn root() -> &'static str {
    "Hello World!"
}

/// POST /auth/register
///
/// `WithRejection` routes malformed bodies through [`AppError`] so they come
/// back in the uniform error shape instead of axum's plain-text rejection.
pub async fn register(
    State(config): State<AppConfig>,
    WithRejection(Json(mut request), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<impl IntoResponse> {
    request.normalize();
    validation::check(&request, RegisterRequest::FIELDS)?;

    let auth_service = AuthService::new(
        UserRepository::new(config.database_pool.clone()),
        &config.jwt_secret,
    );
    let token = auth_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token })))
}

/// POST /auth/login
pub async fn login(
    State(config): State<AppConfig>,
    WithRejection(Json(mut request), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<AuthResponse>> {
    request.normalize();
    validation::check(&request, LoginRequest::FIELDS)?;

    let auth_service = AuthService::new(
        UserRepository::new(config.database_pool.clone()),
        &config.jwt_secret,
    );
    let token = auth_service.login(request).await?;

    Ok(Json(AuthResponse { token }))
}

/// GET /auth/me
///
/// The auth middleware has already resolved the user; the missing-extension
/// arm is defensive only.
pub async fn me(
    State(config): State<AppConfig>,
    user: Option<Extension<User>>,
) -> Result<Json<UserProfile>> {
    let Some(Extension(user)) = user else {
        return Err(AppError::authentication());
    };

    let auth_service = AuthService::new(
        UserRepository::new(config.database_pool.clone()),
        &config.jwt_secret,
    );
    let profile = auth_service.profile(user.id).await?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    #[serde(default)]
    token: Option<String>,
}

/// GET /auth/success
///
/// Handoff endpoint for client-side token capture after the OAuth redirect:
/// echoes the `token` query parameter back as JSON.
pub async fn success(Query(query): Query<SuccessQuery>) -> Result<Json<AuthResponse>> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::new("No token provided", StatusCode::BAD_REQUEST))?;

    Ok(Json(AuthResponse { token }))
}
