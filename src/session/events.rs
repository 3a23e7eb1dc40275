use tokio_util::sync::CancellationToken;
use tui_textarea::Input;

use crate::client::ExecutorError;
use crate::data::ResultSet;

/// How far to move the results viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    Up(u16),
    Down(u16),
    Top,
    Bottom,
}

/// Semantic events applied to the session, decoupled from key bindings.
///
/// The `Execution*` variants are sent back by the spawned query task;
/// everything else comes from the key mapper.
#[derive(Debug)]
pub enum SessionEvent {
    FocusBuffer,
    UnfocusBuffer,
    /// A keystroke forwarded to the query buffer; ignored outside Editing.
    Edit(Input),
    SubmitQuery,
    CancelRequest,
    CycleFormat,
    ScrollResults(Scroll),
    ExecutionStarted {
        id: u64,
    },
    ExecutionSucceeded {
        id: u64,
        results: ResultSet,
    },
    ExecutionFailed {
        id: u64,
        error: ExecutorError,
    },
    Quit,
}

/// Effects the session asks the presentation layer to carry out.
/// The session itself never spawns tasks or touches the terminal.
#[derive(Debug)]
pub enum SessionCommand {
    None,
    /// Run this query on a background task and feed the completion back
    /// in as an `Execution*` event carrying the same id.
    Execute {
        id: u64,
        target: String,
        query: String,
        cancel: CancellationToken,
    },
    Quit,
}
