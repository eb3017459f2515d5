//! Unified error handling for the lifting-lads library.
//!
//! Only structurally invalid input and collaborator failures are errors.
//! A missing activity id is never an error: reconciliation treats it as a
//! no-op and returns the snapshot unchanged.

use thiserror::Error;

/// Unified error type for lifting-lads operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LadsError {
    /// A coordinate is NaN, infinite, or outside the WGS-84 range
    #[error("{field} has invalid coordinates: {message}")]
    InvalidCoordinates { field: String, message: String },

    /// A trip distance is negative or not finite
    #[error("Distance {value} km is not a finite, non-negative number")]
    InvalidDistance { value: f64 },

    /// HTTP/API error
    #[error("HTTP error{}: {message}", status_suffix(.status_code))]
    Http {
        message: String,
        status_code: Option<u16>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn status_suffix(status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

impl From<serde_json::Error> for LadsError {
    fn from(err: serde_json::Error) -> Self {
        LadsError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for LadsError {
    fn from(err: reqwest::Error) -> Self {
        LadsError::Http {
            status_code: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Result type alias for lifting-lads operations.
pub type Result<T> = std::result::Result<T, LadsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LadsError::InvalidCoordinates {
            field: "origin".to_string(),
            message: "latitude is NaN".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "origin has invalid coordinates: latitude is NaN"
        );
    }

    #[test]
    fn test_http_error_display() {
        let with_status = LadsError::Http {
            message: "not found".to_string(),
            status_code: Some(404),
        };
        assert_eq!(with_status.to_string(), "HTTP error (404): not found");

        let without_status = LadsError::Http {
            message: "connection refused".to_string(),
            status_code: None,
        };
        assert_eq!(without_status.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{oops");
        let err: LadsError = parse.unwrap_err().into();
        assert!(matches!(err, LadsError::Config { .. }));
    }
}
