//! Unified error handling for backend calls and form validation.
//!
//! Every backend call resolves to `ApiResult<T>`. `ApiResponse<T>` is the
//! flattened `{success, data, error}` shape used for machine-readable
//! output, and `FieldErrors` collects per-field validation messages.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Message used when the backend gives no usable `detail`.
pub const GENERIC_ERROR: &str = "Something went wrong";

/// Error returned by any backend call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401. For calls that carried the session token, the session has
    /// already been expired when this is returned.
    #[error("{message}")]
    Unauthorized { message: String },

    /// Any other non-2xx response
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Transport(String),

    /// A 2xx response whose body did not match the expected shape
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Could not encode request: {0}")]
    Encode(String),
}

impl ApiError {
    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::Encode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Flattened result envelope
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T, E: fmt::Display> From<Result<T, E>> for ApiResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Extract a human-readable message from an error body.
///
/// The backend reports errors as `{"detail": "..."}`, or as a list of
/// `{"msg": "..."}` objects for request validation failures.
pub fn detail_message(body: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return GENERIC_ERROR.to_string(),
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                GENERIC_ERROR.to_string()
            } else {
                messages.join("; ")
            }
        }
        _ => GENERIC_ERROR.to_string(),
    }
}

// -------------------------------------------------------------------------
// Field-level validation errors
// -------------------------------------------------------------------------

/// Collector for per-field validation messages. One message per field;
/// the first one added wins, the way a form shows a single line under
/// each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
        self
    }

    /// Add `message` for `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.add(field, message);
        }
        self
    }

    /// Drop the error for a field, as a form does when the user edits it
    pub fn clear(&mut self, field: &str) {
        self.errors.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return Ok(()) if no errors, or Err(self) if there are errors
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            if let Some(message) = self.errors.values().next() {
                return f.write_str(message);
            }
        }
        write!(f, "Validation failed for {} fields", self.errors.len())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        assert_eq!(
            detail_message(r#"{"detail": "Email already registered"}"#),
            "Email already registered"
        );
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}, {"msg": "too short"}]}"#;
        assert_eq!(detail_message(body), "field required; too short");
    }

    #[test]
    fn test_detail_fallbacks() {
        assert_eq!(detail_message(""), GENERIC_ERROR);
        assert_eq!(detail_message("<html>502</html>"), GENERIC_ERROR);
        assert_eq!(detail_message(r#"{"error": "x"}"#), GENERIC_ERROR);
        assert_eq!(detail_message(r#"{"detail": ""}"#), GENERIC_ERROR);
        assert_eq!(detail_message(r#"{"detail": []}"#), GENERIC_ERROR);
    }

    #[test]
    fn test_api_response_from_result() {
        let ok: ApiResponse<u32> = Ok::<u32, ApiError>(5).into();
        assert!(ok.success);
        assert_eq!(ok.data, Some(5));

        let err: ApiResponse<u32> = Err(ApiError::Rejected {
            status: 400,
            message: "Class exists".to_string(),
        })
        .into();
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("Class exists"));
    }

    #[test]
    fn test_api_error_status() {
        let err = ApiError::Unauthorized {
            message: "Not authenticated".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(ApiError::Transport("refused".into()).status(), None);
    }

    #[test]
    fn test_field_errors_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.add("name", "Name is required");
        errors.add("name", "Name is too short");
        errors.add("email", "Please enter a valid email address");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.to_string(), "Validation failed for 2 fields");

        errors.clear("email");
        assert_eq!(errors.to_string(), "Name is required");
    }

    #[test]
    fn test_field_errors_finish() {
        assert!(FieldErrors::new().finish().is_ok());

        let mut errors = FieldErrors::new();
        errors.check(false, "message", "Please provide feedback");
        errors.check(true, "rating", "Please provide a rating");
        let err = errors.finish().unwrap_err();
        assert_eq!(err.get("message"), Some("Please provide feedback"));
        assert_eq!(err.get("rating"), None);
    }
}
