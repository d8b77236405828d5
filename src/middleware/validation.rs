//! Request-body validation pipeline.
//!
//! The declarative rules live on the request DTOs as `validator` derives; this
//! module turns rule failures into ordered [`ValidationIssue`]s and funnels
//! them through the regular error channel as a single 400 "Validation Error".
//! All fields are checked (no short-circuit across fields) and a field failing
//! two rules yields two issues.

use validator::{Validate, ValidationErrors};

use super::error_handling::{AppError, ValidationIssue};

/// Validate `request`, reporting issues in the DTO's declared field order.
/// Success passes control onward unchanged.
pub fn check<T: Validate>(request: &T, field_order: &[&str]) -> Result<(), AppError> {
    match request.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            Err(AppError::validation("Validation Error").with_issues(collect_issues(&errors, field_order)))
        }
    }
}

pub fn collect_issues(errors: &ValidationErrors, field_order: &[&str]) -> Vec<ValidationIssue> {
    let by_field = errors.field_errors();
    let mut issues = Vec::new();

    for field in field_order {
        let Some(failures) = by_field.get(*field) else {
            continue;
        };
        for failure in failures.iter() {
            let value = failure
                .params
                .get("value")
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            let msg = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| failure.code.to_string());

            issues.push(ValidationIssue::field(field, &value, &msg));
        }
    }

    issues
}
