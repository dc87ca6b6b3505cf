//! Crate-wide error type.
//!
//! Every fallible operation in `scio_core` returns `Result<T>`. Variants
//! carry enough context to produce the structured log lines called for
//! in the error handling design: analyzer name, stage, and the
//! underlying cause.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Alias file line could not be parsed (unbalanced escape, etc).
    #[error("alias parse error: {0}")]
    AliasParse(String),

    /// An alias compiled to an unsafe or invalid regex (e.g. all-digit alias).
    #[error("alias regex compile error: {0}")]
    RegexCompile(String),

    /// Submitted content failed base64 or hex-ID validation.
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// Queue depth at or above the configured maximum.
    #[error("queue saturated: {0}")]
    QueueSaturated(String),

    /// Job body could not be decompressed or deserialized.
    #[error("corrupt queue job: {0}")]
    CorruptJob(String),

    /// The extractor black box failed on a blob.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// An analyzer raised an error during its `analyze` call.
    #[error("analyzer '{name}' failed: {source}")]
    AnalyzerFailed { name: String, source: String },

    /// Requested blob does not exist in the content-addressed store.
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// Sink POST or index upsert failed.
    #[error("index write failed: {0}")]
    IndexWrite(String),

    /// Configuration file or value could not be parsed/validated.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::RegexCompile(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::BlobNotFound("abc123".to_string());
        assert_eq!(err.to_string(), "blob not found: abc123");

        let err = Error::AnalyzerFailed {
            name: "indicators".to_string(),
            source: "boom".to_string(),
        };
        assert!(err.to_string().contains("indicators"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        match err {
            Error::Io(msg) => assert!(msg.contains("missing")),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
