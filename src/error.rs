//! Error kinds raised by the statistics API boundary.

use thiserror::Error;

/// Failure of a single fetch against the statistics service.
///
/// These never escape a dashboard operation: the orchestrator turns them into
/// the shared error message and resets the operation's result slot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The service answered with something other than `200 OK`.
    #[error("HTTP error: {status}")]
    HttpStatus { status: reqwest::StatusCode },

    /// A `200 OK` whose payload was empty or absent.
    #[error("no {what} available")]
    EmptyResult { what: &'static str },

    /// A comparison pandemic could not be found in the loaded pandemic list.
    #[error("unable to resolve pandemic '{name}' for comparison")]
    Unresolved { name: String },

    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn empty(what: &'static str) -> Self {
        FetchError::EmptyResult { what }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        FetchError::Unresolved { name: name.into() }
    }
}
