//! Error taxonomy for the synchronization layer.
//!
//! Every failure mode resolves into a typed value; neither the request
//! coordinator nor the favorites store lets an error escape a caller's
//! synchronous frame. UI layers branch on [`ErrorInfo`] alone.

use thiserror::Error;

/// Outcome classification for a single fetch attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The fetch was superseded, canceled, or gave up on its own
    /// signal. Expected; never surfaces as an error (a live abort
    /// resets the coordinator to idle).
    #[error("request aborted")]
    Aborted,

    /// Transport failure or non-2xx response. Retryable by issuing a
    /// new request for the same key.
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived but failed shape validation. Normalized into
    /// the network shape before surfacing so UI code has one error to
    /// branch on.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// The single error shape surfaced through `FetchState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
}

impl ErrorInfo {
    /// Normalize a fetch failure for UI consumption.
    ///
    /// Malformed responses collapse into the network shape here.
    /// `Aborted` has no UI representation and must be filtered out
    /// before this conversion; mapping it anyway keeps the function
    /// total.
    #[must_use]
    pub fn from_fetch(error: &FetchError) -> Self {
        let message = match error {
            FetchError::Aborted => "request aborted".to_owned(),
            FetchError::Network(msg) => format!("network error: {msg}"),
            FetchError::MalformedResponse(msg) => {
                format!("network error: malformed response: {msg}")
            }
        };
        Self { message }
    }
}

/// Storage write failure. Logged and advisory; the in-memory favorites
/// set remains authoritative for the session.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage write failed for key {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
