pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use config::{AppConfig, Environment};

pub fn create_app(config: AppConfig) -> Router {
    let cors = cors_layer(&config);

    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/success", get(handlers::auth::success))
        .route("/google", get(handlers::oauth::google_start))
        .route("/google/callback", get(handlers::oauth::google_callback))
        .merge(
            Router::new()
                .route("/me", get(handlers::auth::me))
                .layer(axum_middleware::from_fn_with_state(
                    config.clone(),
                    middleware::auth_middleware,
                )),
        );

    Router::new()
        .route("/", get(handlers::auth::root))
        .nest("/auth", auth_routes)
        .fallback(middleware::error_handling::not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_logging))
                .layer(axum_middleware::from_fn(middleware::security_headers_middleware))
                .layer(cors)
                .layer(axum_middleware::from_fn(
                    middleware::error_handling::method_not_allowed_fallback,
                )),
        )
        .with_state(config)
}

/// CORS policy: whitelisted origins in production, mirrored origin elsewhere
/// (credentials rule out a wildcard).
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .expose_headers([HeaderName::from_static("x-total-count")])
        .max_age(Duration::from_secs(86400));

    if config.environment == Environment::Production {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::error!("Invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        layer.allow_origin(origins)
    } else {
        layer.allow_origin(AllowOrigin::mirror_request())
    }
}
