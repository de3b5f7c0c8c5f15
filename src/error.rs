//! Error and failure-record types.
//!
//! `FetchError` is what a single indicator request can fail with. `Failure` is
//! the diagnostics record the coordinator keeps for every interaction that did
//! not end in a displayed dataset; none of these are fatal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why an indicator fetch produced no dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network error, timeout, or a non-success HTTP status.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The body arrived but was not shaped like `[metadata, [records...]]`.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors raised while loading the static lookup tables.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid table json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("table entry has an empty {0}")]
    EmptyField(&'static str),
    #[error("duplicate indicator code {0}")]
    DuplicateCode(String),
}

/// Classification of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Display name not present in the country-code table.
    ResolutionFailure,
    FetchTransportFailure,
    FetchMalformedResponse,
    /// A result arrived after a newer click; discarded, not a real error.
    Superseded,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::ResolutionFailure => "resolution failure",
            FailureKind::FetchTransportFailure => "transport failure",
            FailureKind::FetchMalformedResponse => "malformed response",
            FailureKind::Superseded => "superseded",
        })
    }
}

impl From<&FetchError> for FailureKind {
    fn from(e: &FetchError) -> Self {
        match e {
            FetchError::Transport(_) => FailureKind::FetchTransportFailure,
            FetchError::Malformed(_) => FailureKind::FetchMalformedResponse,
        }
    }
}

/// One diagnostics entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    /// Country display name the interaction was about.
    pub country: String,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl Failure {
    pub fn new(kind: FailureKind, country: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            country: country.into(),
            detail: detail.into(),
            recorded_at: Utc::now(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.recorded_at.format("%H:%M:%S"),
            self.kind,
            self.country,
            self.detail
        )
    }
}
