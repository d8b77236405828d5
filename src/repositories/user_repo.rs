use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::middleware::error_handling::Result;
use crate::models::user::{User, UserProfile};

const USER_COLUMNS: &str = "id, email, password, name, google_id, access_token, refresh_token, \
                            token_expiry, created_at, updated_at";

/// Opaque user-record store. Email and google_id uniqueness are enforced by
/// the database; a constraint hit propagates as a `sqlx::Error` and is mapped
/// by the error translator.
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email_or_google_id(
        &self,
        email: &str,
        google_id: &str,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR google_id = $2 LIMIT 1"
        ))
        .bind(email)
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Create a local (password) account.
    pub async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Create an OAuth-only account (no password).
    #[allow(clippy::too_many_arguments)]
    pub async fn create_oauth(
        &self,
        email: &str,
        name: Option<&str>,
        google_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: DateTime<Utc>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, google_id, access_token, refresh_token, token_expiry) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(google_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Attach or refresh Google credentials on an existing account.
    pub async fn update_oauth_tokens(
        &self,
        id: i64,
        google_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: DateTime<Utc>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET google_id = $2, access_token = $3, refresh_token = $4, \
             token_expiry = $5, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(google_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_name(&self, id: i64, name: &str) -> Result<()> {
        sqlx::query("UPDATE users SET name = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Projection for the profile endpoint; never selects credentials.
    pub async fn profile(&self, id: i64) -> Result<Option<UserProfile>> {
        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT id, name, email FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(profile)
    }

    /// Remove every user row. Test-support operation.
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
