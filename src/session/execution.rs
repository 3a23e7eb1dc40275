use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Lifecycle of one query submission. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// One in-flight or settled query submission.
///
/// The id is a per-session generation counter: completion events carry
/// it back, and anything that does not match the live handle (or lands
/// after the handle settled) is discarded. That is what keeps a late
/// success from resurfacing after a cancel.
#[derive(Debug)]
pub struct ExecutionHandle {
    id: u64,
    status: ExecutionStatus,
    cancel: CancellationToken,
    started: Instant,
}

impl ExecutionHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            status: ExecutionStatus::Pending,
            cancel: CancellationToken::new(),
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Apply a forward transition. Returns false (and changes nothing)
    /// for anything that would move backwards or out of a settled state.
    pub fn advance(&mut self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        let allowed = matches!(
            (self.status, next),
            (Pending, Running)
                | (Pending, Succeeded)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Running, Cancelled)
        );
        if allowed {
            self.status = next;
        }
        allowed
    }

    /// Fire the token and settle as cancelled. Returns false when the
    /// handle had already settled.
    pub fn request_cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.cancel.cancel();
        self.advance(ExecutionStatus::Cancelled)
    }
}
