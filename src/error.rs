//! Error types for permhound.
//!
//! Only run-level failures are errors here: an unreadable identity
//! registry, an unreachable scan root, bad configuration, or a broken
//! pipeline. Problems with a single filesystem entry are recorded on the
//! entry's `FileRecord` instead and never surface as `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the scan-and-graph pipeline.
#[derive(Error, Debug)]
pub enum HoundError {
    /// The passwd/group registry could not be opened or read.
    #[error("cannot read identity registry '{}': {source}", path.display())]
    IdentitySource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The starting path of a walk cannot be stat'ed at all.
    #[error("walk error: root '{}' is unreachable: {source}", path.display())]
    RootUnreachable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file is not valid TOML.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O errors (output file, stdin, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The consumer went away before the producer finished.
    #[error("Record channel closed unexpectedly")]
    ChannelClosed,

    /// A pipeline thread panicked.
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

/// Result type alias for HoundError
pub type Result<T> = std::result::Result<T, HoundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_mentions_path() {
        let err = HoundError::IdentitySource {
            path: PathBuf::from("/etc/passwd"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/passwd"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: HoundError = io.into();
        assert!(matches!(err, HoundError::Io(_)));
    }
}
