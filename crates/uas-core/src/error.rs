//! # Error Types
//!
//! Errors shared across the workspace. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Domain-primitive validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The value is not a six-octet hardware address.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
}

/// Failure reported by a controller capability (fetch or apply).
///
/// Carries the operation name so a status line or log entry can say which
/// call failed without the caller re-wrapping it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller could not be reached or the connection dropped.
    #[error("{operation}: transport failure: {reason}")]
    Transport {
        /// The controller operation that failed.
        operation: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The controller answered but rejected the request.
    #[error("{operation}: controller returned {status}: {message}")]
    Rejected {
        /// The controller operation that failed.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response envelope, if any.
        message: String,
    },

    /// Login failed or the session expired.
    #[error("{operation}: not authorized")]
    Unauthorized {
        /// The controller operation that failed.
        operation: String,
    },

    /// The response body did not have the expected shape.
    #[error("{operation}: malformed response: {reason}")]
    Malformed {
        /// The controller operation that failed.
        operation: String,
        /// Description of the decoding failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_error_display_names_operation() {
        let err = ControllerError::Rejected {
            operation: "upd/user".into(),
            status: 400,
            message: "api.err.InvalidObject".into(),
        };
        assert_eq!(
            err.to_string(),
            "upd/user: controller returned 400: api.err.InvalidObject"
        );
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::InvalidMac("zz".into());
        assert_eq!(err.to_string(), "invalid MAC address: zz");
    }
}
