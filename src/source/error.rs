//! Error taxonomy for external sources

use thiserror::Error;

/// Errors an external source can report for a single call.
///
/// How the pipeline reacts depends on the variant: transient and parse
/// failures skip the call, `Auth` disables the source for the rest of the
/// run, and `Oversized` triggers one reduced-detail retry where one exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("response too large")]
    Oversized,
    #[error("not found: {0}")]
    NotFound(String),
}

impl SourceError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Short label used in the query log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::Auth(_) => "auth",
            Self::Parse(_) => "parse",
            Self::Oversized => "oversized",
            Self::NotFound(_) => "not_found",
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth(format!("{} returned {}", context, status)),
            404 => Self::NotFound(context.to_string()),
            413 => Self::Oversized,
            _ => Self::Transient(format!("{} returned {}", context, status)),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status, "request")
        } else {
            Self::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
