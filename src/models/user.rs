use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row in the `users` table.
///
/// `password` is absent for OAuth-only accounts; `google_id` is absent for
/// local accounts. Neither the hash nor the OAuth tokens are ever serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub name: Option<String>,
    pub google_id: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl RegisterRequest {
    /// Declared field order; validation issues are reported in this order.
    pub const FIELDS: &'static [&'static str] = &["name", "email", "password"];

    /// Trim name and email, lowercase email. Runs before validation and the
    /// normalized values are what the handler persists.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginRequest {
    pub const FIELDS: &'static [&'static str] = &["email", "password"];

    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Profile projection returned by `GET /auth/me`. Only these three columns are
/// ever selected, so credentials cannot leak through this path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases_email() {
        let mut request = RegisterRequest {
            name: "  Jane Doe  ".to_string(),
            email: "  Jane.Doe@Example.COM ".to_string(),
            password: "secret1".to_string(),
        };
        request.normalize();
        assert_eq!(request.name, "Jane Doe");
        assert_eq!(request.email, "jane.doe@example.com");
    }

    #[test]
    fn user_serialization_never_includes_credentials() {
        let user = User {
            id: 1,
            email: "jane@example.com".to_string(),
            password: Some("$2b$10$hash".to_string()),
            name: Some("Jane".to_string()),
            google_id: None,
            access_token: Some("ya29.token".to_string()),
            refresh_token: Some("1//refresh".to_string()),
            token_expiry: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("access_token").is_none());
        assert!(json.get("refresh_token").is_none());
        assert_eq!(json["email"], "jane@example.com");
    }
}
