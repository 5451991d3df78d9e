//! Typed failure reasons for every I/O boundary of the pipeline.
//!
//! Only [`CurateError`] ever escapes a curation run. Source and AI failures are
//! absorbed where they happen (zero items, fallback shortlist, fallback analysis),
//! but they are still returned as values so the absorbing site is explicit.

use std::path::PathBuf;
use std::time::Duration;

/// Failure of one source adapter call or one feed registry entry.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Coarse bucket an AI failure falls into; surfaced to humans in fallback summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    RateLimited,
    NotFound,
    Generic,
}

/// Failure of a classifier call (stage 1 or stage 2).
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI disabled or credential missing")]
    Disabled,

    #[error("rate limited (429)")]
    RateLimited,

    #[error("model not found or access denied ({0})")]
    NotFound(u16),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl AiError {
    /// Map an HTTP status code onto the error taxonomy.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => AiError::RateLimited,
            403 | 404 => AiError::NotFound(status),
            other => AiError::Status(other),
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            AiError::RateLimited => FailureClass::RateLimited,
            AiError::NotFound(_) => FailureClass::NotFound,
            _ => FailureClass::Generic,
        }
    }
}

/// Fatal to a run: the result could not be persisted.
#[derive(Debug, thiserror::Error)]
pub enum CurateError {
    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_classes() {
        assert_eq!(AiError::from_status(429).class(), FailureClass::RateLimited);
        assert_eq!(AiError::from_status(404).class(), FailureClass::NotFound);
        assert_eq!(AiError::from_status(403).class(), FailureClass::NotFound);
        assert_eq!(AiError::from_status(500).class(), FailureClass::Generic);
        assert_eq!(AiError::Disabled.class(), FailureClass::Generic);
    }
}
