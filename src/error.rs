// Error taxonomy
// Validation errors abort the single action that raised them, service errors
// carry the provider's message, malformed import data is defaulted instead.

use std::path::PathBuf;

/// Inline validation failure, reported next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure to read a record source at all.
///
/// Bad cells never produce one of these: they are coerced to defaults.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("missing header row")]
    MissingHeader,

    #[error("no recognized columns in header")]
    NoRecognizedColumns,

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identity provider failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("user already registered")]
    UserExists,

    #[error("no verification code was requested for this identity")]
    NoPendingOtp,

    #[error("verification code does not match")]
    OtpMismatch,

    #[error("verification code has expired")]
    OtpExpired,

    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Blob store failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Document workflow failure (upload, listing, download, delete).
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] rusqlite::Error),
}

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        let err = FieldError::new("neet_mark", "must be between 0 and 720");
        assert_eq!(err.to_string(), "neet_mark: must be between 0 and 720");
    }

    #[test]
    fn test_auth_error_wraps_field_error() {
        let err: AuthError = FieldError::new("email", "invalid email address").into();
        assert_eq!(err.to_string(), "email: invalid email address");
    }
}
