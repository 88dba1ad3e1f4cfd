//! # Errors
//!
//! Typed failures at the library seams: the remote service, the `ask`
//! pipeline and session bookkeeping. IO-heavy paths (scanning, snapshots,
//! configuration) use `anyhow` with context instead.

use crate::models::backend::{Role, Run};
use crate::session::pipeline::PipelineStage;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the remote text-generation service
#[derive(Debug, Error)]
pub enum BackendError {
    /// The provider asked us to slow down
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Wait suggested by the `retry-after` header, if any
        retry_after: Option<Duration>,
    },
    /// Any other non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}

/// Why an `ask` round stopped before producing an answer
#[derive(Debug, Error)]
pub enum AskError {
    /// A previous round was cancelled mid-flight and never settled
    #[error("a round is still in flight ({0:?}); abandon it before asking again")]
    Busy(PipelineStage),
    /// The session configuration cannot be used
    #[error("invalid configuration: {0:#}")]
    Config(#[source] anyhow::Error),
    /// Scanning the workspace failed (unreadable file, broken walk)
    #[error(transparent)]
    Refresh(#[from] anyhow::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A run reached a terminal status other than `completed`
    #[error("{role} run {} ended with status {}", .run.id, .run.status)]
    RunFailed { role: Role, run: Run },
    /// A run completed but produced no messages
    #[error("{role} run completed without producing a message")]
    EmptyResult { role: Role, runs: Vec<Run> },
    /// The architect's reply is not a well-formed change plan
    #[error("architect reply is not a valid change plan: {reason}")]
    MalformedPlan { raw: String, reason: String },
    /// The architect named files that do not exist in the workspace
    #[error("architect named files that are not in the workspace: {unknown:?}")]
    InvalidPlan { unknown: Vec<String> },
}

/// Session bookkeeping errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown files: {0:?}")]
    UnknownFiles(Vec<String>),
    #[error("nothing selected")]
    EmptySelection,
}
