//! Error types for the litflow pipeline core.
//!
//! Backend adapters never retry internally; every `BackendError` surfaced
//! during a stage is fatal to the run. Search failures are the one local
//! exception; they are recovered inside the research prompt builder.

use thiserror::Error;

use crate::core::StageName;

/// Errors produced by a generation backend adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend process could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The backend exceeded its wall-clock deadline.
    #[error("backend timed out after {seconds}s")]
    Timeout {
        /// The configured deadline in seconds.
        seconds: u64,
    },

    /// The backend produced no recoverable complete chunk.
    #[error("backend protocol error: {detail}")]
    Protocol {
        /// Diagnostic text (e.g., the process's stderr).
        detail: String,
    },

    /// The completion API returned a non-success status.
    #[error("completion API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The response body, best effort.
        message: String,
    },

    /// A transport-level HTTP error.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// An IO error while reading backend output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A backend adapter failed during the named stage.
    #[error("stage '{stage}' failed: {source}")]
    Backend {
        /// The stage whose backend failed.
        stage: StageName,
        /// The backend failure.
        #[source]
        source: BackendError,
    },
}

impl PipelineError {
    /// The stage during which the run aborted.
    #[must_use]
    pub fn stage(&self) -> StageName {
        match self {
            Self::Backend { stage, .. } => *stage,
        }
    }
}

/// Errors from the search collaborator.
///
/// These never propagate out of the research stage; they degrade to a
/// fallback context string.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The search request could not be performed.
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The search endpoint returned a non-success status.
    #[error("search endpoint returned status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The provider is configured without results (testing).
    #[error("search unavailable: {reason}")]
    Unavailable {
        /// Why the provider cannot answer.
        reason: String,
    },
}
