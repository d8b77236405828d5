use axum::http::StatusCode;

use crate::middleware::error_handling::{AppError, Result};
use crate::middleware::JwtService;
use crate::models::user::{LoginRequest, RegisterRequest, UserProfile};
use crate::repositories::UserRepository;

/// Bcrypt work factor for newly stored passwords.
const BCRYPT_COST: u32 = 10;

pub struct AuthService {
    user_repo: UserRepository,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: &str) -> Self {
        Self {
            user_repo,
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    /// Register a local account and issue a token for it.
    ///
    /// The existence check runs before the insert; a concurrent registration
    /// racing past it is caught by the database unique constraint and surfaces
    /// as the translator's duplicate-field response.
    pub async fn register(&self, request: RegisterRequest) -> Result<String> {
        if self.user_repo.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::new("User already exists", StatusCode::BAD_REQUEST));
        }

        let password_hash = bcrypt::hash(&request.password, BCRYPT_COST)?;
        let user = self
            .user_repo
            .create(&request.name, &request.email, &password_hash)
            .await?;

        tracing::info!(user_id = user.id, "New user registered: {}", user.email);

        Ok(self.jwt_service.generate_token(user.id, &user.email)?)
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown email, OAuth-only account, and wrong password all answer with
    /// the same message so accounts cannot be enumerated.
    pub async fn login(&self, request: LoginRequest) -> Result<String> {
        let invalid = || AppError::new("Invalid credentials", StatusCode::BAD_REQUEST);

        let Some(user) = self.user_repo.find_by_email(&request.email).await? else {
            return Err(invalid());
        };
        let Some(password_hash) = user.password.as_deref() else {
            return Err(invalid());
        };
        if !bcrypt::verify(&request.password, password_hash)? {
            return Err(invalid());
        }

        Ok(self.jwt_service.generate_token(user.id, &user.email)?)
    }

    /// Fetch the `{id, name, email}` projection for a user.
    pub async fn profile(&self, user_id: i64) -> Result<UserProfile> {
        self.user_repo
            .profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}
