//! Unified error system for the Swan operator
//!
//! One error type covers every engine operation. Each variant belongs to one of
//! three categories that decide how the transport layer reports it:
//! validation errors are returned verbatim, server errors are logged and
//! reported generically, authorization errors short-circuit the request.

use serde::{Deserialize, Serialize};

/// Broad classification of an error, used to pick the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caused by the client's input. Never retried.
    Validation,
    /// Caused by operator configuration or infrastructure.
    Server,
    /// The caller lacks a valid access credential.
    Authorization,
}

/// Unified error type for all Swan operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum SwanError {
    /// A required request parameter was not supplied
    #[error("missing '{name}' parameter")]
    MissingParameter {
        /// Name of the missing parameter
        name: String,
    },

    /// A field value could not be parsed as the signed layout for its key
    #[error("malformed '{key}' field: {message}")]
    MalformedField {
        /// Field key being decoded
        key: String,
        /// What was wrong with the value
        message: String,
    },

    /// A field's signature could not be verified against a trusted domain
    #[error("'{key}' not a verified signed value")]
    UnverifiedField {
        /// Field key that failed verification
        key: String,
    },

    /// Submitted or returned data is past its usable lifetime
    #[error("expired: {message}")]
    Expired {
        /// Description of what expired
        message: String,
    },

    /// A stop-list entry is not a usable domain
    #[error("invalid stop entry '{entry}'")]
    InvalidStopEntry {
        /// The rejected entry
        entry: String,
    },

    /// Any other invalid input
    #[error("invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// No signing key is registered for the requesting domain
    #[error("no signer available for domain '{domain}'")]
    SignerUnavailable {
        /// Domain that has no signer
        domain: String,
    },

    /// The storage network failed or could not be reached
    #[error("storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Serialization/deserialization of engine-produced data failed
    #[error("serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Internal system error
    #[error("internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },

    /// The caller is not authorized to use the operator
    #[error("access denied: {message}")]
    AuthorizationDenied {
        /// Error message describing the denial
        message: String,
    },
}

impl SwanError {
    /// Create a missing parameter error
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create a malformed field error
    pub fn malformed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedField {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an unverified field error
    pub fn unverified(key: impl Into<String>) -> Self {
        Self::UnverifiedField { key: key.into() }
    }

    /// Create an expired data error
    pub fn expired(message: impl Into<String>) -> Self {
        Self::Expired {
            message: message.into(),
        }
    }

    /// Create an invalid stop entry error
    pub fn invalid_stop_entry(entry: impl Into<String>) -> Self {
        Self::InvalidStopEntry {
            entry: entry.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a signer unavailable error
    pub fn signer_unavailable(domain: impl Into<String>) -> Self {
        Self::SignerUnavailable {
            domain: domain.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an authorization denied error
    pub fn denied(message: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingParameter { .. }
            | Self::MalformedField { .. }
            | Self::UnverifiedField { .. }
            | Self::Expired { .. }
            | Self::InvalidStopEntry { .. }
            | Self::Invalid { .. } => ErrorCategory::Validation,
            Self::SignerUnavailable { .. }
            | Self::Storage { .. }
            | Self::Serialization { .. }
            | Self::Internal { .. } => ErrorCategory::Server,
            Self::AuthorizationDenied { .. } => ErrorCategory::Authorization,
        }
    }

    /// HTTP-equivalent status code for this error
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::Server => 500,
            ErrorCategory::Authorization => 401,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Server errors never expose internal detail.
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::Server => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Standard Result type for Swan operations
pub type Result<T> = std::result::Result<T, SwanError>;

impl From<serde_json::Error> for SwanError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for SwanError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SwanError::unverified("pref");
        assert!(matches!(err, SwanError::UnverifiedField { .. }));
        assert_eq!(err.to_string(), "'pref' not a verified signed value");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            SwanError::malformed("rid", "short").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            SwanError::signer_unavailable("a.example").category(),
            ErrorCategory::Server
        );
        assert_eq!(SwanError::denied("no key").status_code(), 401);
        assert_eq!(SwanError::missing_parameter("encrypted").status_code(), 400);
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = SwanError::storage("node 10.0.0.4 refused connection");
        assert_eq!(err.public_message(), "internal server error");

        let err = SwanError::expired("data expired and can no longer be used");
        assert!(err.public_message().contains("data expired"));
    }
}
