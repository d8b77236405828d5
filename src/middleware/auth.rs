use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::middleware::error_handling::AppError;
use crate::repositories::UserRepository;

/// Tokens expire one hour after issuance.
const TOKEN_TTL_SECS: usize = 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn generate_token(&self, id: i64, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as usize;

        let claims = Claims {
            id,
            email: email.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }

    pub fn extract_bearer(auth_header: &str) -> Option<&str> {
        auth_header.strip_prefix("Bearer ")
    }
}

/// Bearer-token guard for protected routes.
///
/// Verification failures, unknown subjects, and storage faults during lookup
/// all surface as the same 401 "Authentication failed" so a probing client
/// cannot tell which check rejected it. Only the missing-header case gets its
/// own message. Failures flow through the error channel, never a direct write.
pub async fn auth_middleware(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(JwtService::extract_bearer);

    let Some(token) = token else {
        tracing::warn!("Authentication failed: No token provided - {} {}", method, uri);
        return Err(AppError::new("Authentication required", StatusCode::UNAUTHORIZED));
    };

    let jwt_service = JwtService::new(&config.jwt_secret);
    let claims = match jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(_) => {
            tracing::warn!("Authentication failed: Invalid token - {} {}", method, uri);
            return Err(AppError::new("Authentication failed", StatusCode::UNAUTHORIZED));
        }
    };

    let user_repo = UserRepository::new(config.database_pool.clone());
    let user = match user_repo.find_by_id(claims.id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Authentication failed: User not found - {} {}", method, uri);
            return Err(AppError::new("Authentication failed", StatusCode::UNAUTHORIZED));
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                "Authentication failed: User lookup error - {} {}",
                method,
                uri
            );
            return Err(AppError::new("Authentication failed", StatusCode::UNAUTHORIZED));
        }
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
