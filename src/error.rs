use std::fmt::Display;

use axum::http::StatusCode;
use tracing::error;

/// Rejection shape shared by every handler.
pub type ApiError = (StatusCode, String);

pub fn internal<E: Display>(e: E) -> ApiError {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.into())
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, msg.into())
}

/// Trimmed, non-empty and at most `max_chars` long.
pub fn require_name(raw: &str, max_chars: usize) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(bad_request("name must not be empty"));
    }
    if name.chars().count() > max_chars {
        return Err(bad_request("name is too long"));
    }
    Ok(name.to_string())
}

pub fn require_non_negative(field: &str, v: f64) -> Result<f64, ApiError> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(bad_request(format!("{field} must be a non-negative number")))
    }
}

/// Postgres unique_violation somewhere in the error chain.
pub fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(|se| se.as_database_error())
            .and_then(|db| db.code())
            .is_some_and(|code| code == "23505")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_hides_details() {
        let (status, body) = internal("connection refused: secret host");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("secret"));
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(require_name("  Гречка  ", 10).unwrap(), "Гречка");
        assert_eq!(require_name("   ", 10).unwrap_err().0, StatusCode::BAD_REQUEST);
        assert!(require_name(&"я".repeat(10), 10).is_ok());
        assert!(require_name(&"я".repeat(11), 10).is_err());
    }

    #[test]
    fn amounts_must_be_non_negative() {
        assert_eq!(require_non_negative("x", 0.0).unwrap(), 0.0);
        assert!(require_non_negative("x", -0.1).is_err());
        assert!(require_non_negative("x", f64::NAN).is_err());
    }

    #[test]
    fn plain_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&anyhow::anyhow!("boom")));
        let wrapped = anyhow::Error::new(sqlx::Error::RowNotFound).context("find row");
        assert!(!is_unique_violation(&wrapped));
    }
}
