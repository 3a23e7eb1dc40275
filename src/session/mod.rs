//! Session state machine
//!
//! Owns the query buffer, the focus mode, the in-flight execution
//! handle, and the last result set. Pure event-in / command-out: the
//! presentation layer feeds it semantic events and runs the commands it
//! returns.

pub mod events;
pub mod execution;
pub mod state;

pub use events::{Scroll, SessionCommand, SessionEvent};
pub use execution::{ExecutionHandle, ExecutionStatus};
pub use state::{Session, SessionMode};
