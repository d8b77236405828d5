//! Application error taxonomy and the terminal error translator.
//!
//! Every failure a handler or middleware produces flows through [`AppError`];
//! its `IntoResponse` impl is the single place error responses are formatted.
//! Handlers never build error bodies themselves.

use std::backtrace::Backtrace;
use std::sync::OnceLock;

use axum::{
    extract::{rejection::JsonRejection, Request},
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Environment;

pub type Result<T> = std::result::Result<T, AppError>;

/// A single field-level validation failure, in the wire shape
/// `{type, value, msg, path, location}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub msg: String,
    pub path: String,
    pub location: String,
}

impl ValidationIssue {
    pub fn field(path: &str, value: &str, msg: &str) -> Self {
        Self {
            kind: "field".to_string(),
            value: value.to_string(),
            msg: msg.to_string(),
            path: path.to_string(),
            location: "body".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// An anticipated failure carrying a deliberate status code and message,
    /// as opposed to a programming defect or infrastructure fault.
    #[error("{message}")]
    Operational {
        message: String,
        status_code: StatusCode,
        issues: Vec<ValidationIssue>,
        trace: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] JsonRejection),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self::Operational {
            message: message.into(),
            status_code,
            issues: Vec::new(),
            trace: Backtrace::force_capture().to_string(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(format!("{resource} not found"), StatusCode::NOT_FOUND)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn authentication() -> Self {
        Self::new("Not authenticated", StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden() -> Self {
        Self::new("Not authorized", StatusCode::FORBIDDEN)
    }

    pub fn with_issues(mut self, new_issues: Vec<ValidationIssue>) -> Self {
        if let Self::Operational { issues, .. } = &mut self {
            *issues = new_issues;
        }
        self
    }
}

/// `"fail"` for client errors (4xx), `"error"` for everything else.
pub fn status_label(code: StatusCode) -> &'static str {
    if code.is_client_error() {
        "fail"
    } else {
        "error"
    }
}

/// The only shape ever returned for non-2xx responses. Absent optional fields
/// are omitted from the JSON entirely, never serialized as null.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationIssue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}

/// Map an error to its HTTP status and wire body.
///
/// Pure so the status-code mapping and stack gating are unit-testable without
/// a router in the loop.
pub fn translate(err: &AppError, environment: Environment) -> (StatusCode, ErrorBody) {
    let mut status_code = StatusCode::INTERNAL_SERVER_ERROR;
    let mut body = ErrorBody {
        status: "error".to_string(),
        message: "Internal server error".to_string(),
        errors: None,
        stack: None,
    };

    match err {
        AppError::Operational { message, status_code: code, issues, .. } => {
            status_code = *code;
            body.status = status_label(*code).to_string();
            body.message = message.clone();
            if !issues.is_empty() {
                body.errors = Some(issues.clone());
            }
        }
        AppError::Json(_) => {
            status_code = StatusCode::BAD_REQUEST;
            body.status = status_label(status_code).to_string();
            body.message = "Invalid JSON".to_string();
        }
        AppError::Database(db) if is_unique_violation(db) => {
            // Upstream of us this produced a 400, but `status` was historically
            // left at the "error" default rather than re-derived as "fail".
            // Kept as-is: clients match on the message for this case.
            status_code = StatusCode::BAD_REQUEST;
            body.message = "Duplicate field value entered".to_string();
        }
        AppError::Database(_) | AppError::Jwt(_) | AppError::Hash(_) | AppError::Internal(_) => {}
    }

    if environment.is_development() {
        body.stack = Some(match err {
            AppError::Operational { trace, .. } => trace.clone(),
            other => format!("{other:?}"),
        });
    }

    (status_code, body)
}

/// Runtime environment consumed by `IntoResponse`, set once at config load.
static RUN_ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

pub fn set_environment(environment: Environment) {
    let _ = RUN_ENVIRONMENT.set(environment);
}

fn current_environment() -> Environment {
    RUN_ENVIRONMENT.get().copied().unwrap_or(Environment::Development)
}

/// Resolved error details, attached to the response so the request-logging
/// middleware can emit the `"<method> <url> - <message>"` line with context.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub status_code: StatusCode,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, body) = translate(&self, current_environment());
        let message = body.message.clone();
        let mut response = (status_code, Json(body)).into_response();
        response
            .extensions_mut()
            .insert(ErrorContext { status_code, message });
        response
    }
}

/// Fallback for unmatched routes. Logs a warning and forwards an operational
/// 404 into the regular error channel instead of responding directly.
pub async fn not_found_handler(method: Method, uri: Uri) -> AppError {
    tracing::warn!(
        status_code = 404,
        path = %uri,
        method = %method,
        "Route not found: {} {}",
        method,
        uri
    );

    AppError::new(
        format!("Can't find {uri} on this server!"),
        StatusCode::NOT_FOUND,
    )
}

/// Rewrites the router's bare 405 into the same response an unmatched path
/// gets: a method mismatch on a known path falls through like an unknown
/// route, and stays inside the uniform error shape.
pub async fn method_not_allowed_fallback(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    not_found_handler(method, uri).await.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct StubDbError;

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint \"users_email_key\"")
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"users_email_key\""
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn unique_violation() -> AppError {
        AppError::Database(sqlx::Error::Database(Box::new(StubDbError)))
    }

    #[test]
    fn status_label_is_fail_for_client_errors_only() {
        for code in 400..500 {
            let code = StatusCode::from_u16(code).unwrap();
            assert_eq!(status_label(code), "fail", "{code}");
        }
        assert_eq!(status_label(StatusCode::INTERNAL_SERVER_ERROR), "error");
        assert_eq!(status_label(StatusCode::NOT_IMPLEMENTED), "error");
        assert_eq!(status_label(StatusCode::OK), "error");
    }

    #[test]
    fn helper_constructors_carry_conventional_codes() {
        let (code, body) = translate(&AppError::not_found("User"), Environment::Test);
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "User not found");
        assert_eq!(body.status, "fail");

        let (code, body) = translate(&AppError::validation("Validation Error"), Environment::Test);
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Validation Error");

        let (code, body) = translate(&AppError::authentication(), Environment::Test);
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "Not authenticated");

        let (code, body) = translate(&AppError::forbidden(), Environment::Test);
        assert_eq!(code, StatusCode::FORBIDDEN);
        assert_eq!(body.message, "Not authorized");
    }

    #[test]
    fn operational_errors_keep_their_code_and_attach_issues() {
        let issues = vec![ValidationIssue::field("email", "nope", "Invalid email")];
        let err = AppError::validation("Validation Error").with_issues(issues.clone());

        let (code, body) = translate(&err, Environment::Production);
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body.status, "fail");
        assert_eq!(body.message, "Validation Error");
        assert_eq!(body.errors, Some(issues));
    }

    #[test]
    fn operational_error_without_issues_omits_errors_key() {
        let err = AppError::new("User already exists", StatusCode::BAD_REQUEST);
        let (_, body) = translate(&err, Environment::Production);
        assert!(body.errors.is_none());

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json.get("stack").is_none());
    }

    #[test]
    fn unique_violation_maps_to_duplicate_message_with_error_status() {
        let (code, body) = translate(&unique_violation(), Environment::Production);
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Duplicate field value entered");
        // Deliberate quirk: status stays "error" even though the code is 400.
        assert_eq!(body.status, "error");
    }

    #[test]
    fn unknown_errors_collapse_to_internal_server_error() {
        let err = AppError::Internal(anyhow::anyhow!("connection pool exhausted"));
        let (code, body) = translate(&err, Environment::Production);
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.status, "error");
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn stack_is_exposed_in_development_only() {
        let err = AppError::new("boom", StatusCode::BAD_REQUEST);

        let (_, body) = translate(&err, Environment::Development);
        assert!(body.stack.as_deref().is_some_and(|s| !s.is_empty()));

        let (_, body) = translate(&err, Environment::Production);
        assert!(body.stack.is_none());

        let (_, body) = translate(&err, Environment::Test);
        assert!(body.stack.is_none());
    }

    #[test]
    fn validation_issue_serializes_with_type_key() {
        let issue = ValidationIssue::field("password", "123", "too short");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "field");
        assert_eq!(json["path"], "password");
        assert_eq!(json["msg"], "too short");
        assert_eq!(json["location"], "body");
    }
}
