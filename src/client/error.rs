use std::time::Duration;

use thiserror::Error;

/// Everything the query executor can fail with.
///
/// The session layer matches on these to decide what to show and which
/// state to land in, so the set is closed on purpose.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The backend was unreachable or refused the connection.
    #[error("connection to {target} failed: {message}")]
    Connection { target: String, message: String },

    /// The backend accepted the connection but rejected the query text.
    /// The message is the backend's own wording, surfaced verbatim.
    #[error("query rejected: {0}")]
    Query(String),

    /// The cancellation token fired before the call completed.
    #[error("query cancelled")]
    Cancelled,

    /// The configured query timeout elapsed before the backend answered.
    #[error("query timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// One or more cached connections failed to close on shutdown.
    /// Every failure is kept, none are discarded.
    #[error("{} of {total} connection(s) failed to close: {}", .failures.len(), .failures.join("; "))]
    Close {
        failures: Vec<String>,
        total: usize,
    },
}

impl ExecutorError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutorError::Cancelled)
    }
}
