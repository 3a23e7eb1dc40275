use std::time::Duration;

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

use crate::client::ExecutorError;
use crate::data::ResultSet;
use crate::format::FormatKind;
use crate::session::events::{Scroll, SessionCommand, SessionEvent};
use crate::session::execution::{ExecutionHandle, ExecutionStatus};

/// Which part of the session holds focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// The query buffer has input focus.
    Editing,
    /// Buffer unfocused, nothing to show yet.
    Idle,
    /// A query is in flight.
    Running,
    /// Results are on screen, buffer unfocused.
    Viewing,
}

/// The interactive core: query buffer, mode, the in-flight execution,
/// the last result set, and its cached render.
///
/// `apply` is the only way anything changes. The event loop calls it
/// serially, so there is no locking anywhere in here.
pub struct Session {
    mode: SessionMode,
    buffer: TextArea<'static>,
    format: FormatKind,
    csv_delimiter: u8,
    target: String,
    handle: Option<ExecutionHandle>,
    results: Option<ResultSet>,
    rendered: Option<String>,
    status_line: String,
    scroll: u16,
    next_id: u64,
    should_quit: bool,
}

impl Session {
    pub fn new(format: FormatKind, target: String, csv_delimiter: u8) -> Self {
        let mut buffer = TextArea::default();
        buffer.set_placeholder_text("Enter a query...");
        let mut session = Self {
            mode: SessionMode::Editing,
            buffer,
            format,
            csv_delimiter,
            target,
            handle: None,
            results: None,
            rendered: None,
            status_line: String::new(),
            scroll: 0,
            next_id: 0,
            should_quit: false,
        };
        session.style_buffer();
        session
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn buffer(&self) -> &TextArea<'static> {
        &self.buffer
    }

    pub fn format(&self) -> FormatKind {
        self.format
    }

    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Elapsed time of the in-flight query, if one is live.
    pub fn running_elapsed(&self) -> Option<Duration> {
        self.handle
            .as_ref()
            .filter(|h| h.status().is_active())
            .map(|h| h.elapsed())
    }

    /// Apply one semantic event and return the effect to run, if any.
    pub fn apply(&mut self, event: SessionEvent) -> SessionCommand {
        match event {
            SessionEvent::FocusBuffer => {
                if matches!(self.mode, SessionMode::Idle | SessionMode::Viewing) {
                    self.mode = SessionMode::Editing;
                    self.style_buffer();
                }
                SessionCommand::None
            }
            SessionEvent::UnfocusBuffer => {
                if self.mode == SessionMode::Editing {
                    self.mode = self.rest_mode();
                    self.style_buffer();
                }
                SessionCommand::None
            }
            SessionEvent::Edit(input) => {
                if self.mode == SessionMode::Editing {
                    self.buffer.input(input);
                }
                SessionCommand::None
            }
            SessionEvent::SubmitQuery => self.submit(),
            SessionEvent::ExecutionStarted { id } => {
                if let Some(handle) = self.handle.as_mut() {
                    if handle.id() == id {
                        handle.advance(ExecutionStatus::Running);
                    }
                }
                SessionCommand::None
            }
            SessionEvent::ExecutionSucceeded { id, results } => {
                self.on_succeeded(id, results);
                SessionCommand::None
            }
            SessionEvent::ExecutionFailed { id, error } => {
                self.on_failed(id, error);
                SessionCommand::None
            }
            SessionEvent::CancelRequest => {
                self.cancel();
                SessionCommand::None
            }
            SessionEvent::CycleFormat => {
                self.cycle_format();
                SessionCommand::None
            }
            SessionEvent::ScrollResults(scroll) => {
                self.scroll_results(scroll);
                SessionCommand::None
            }
            SessionEvent::Quit => {
                info!("quit requested");
                self.should_quit = true;
                SessionCommand::Quit
            }
        }
    }

    /// Where blurring the buffer lands: Viewing while results are held,
    /// Idle otherwise.
    fn rest_mode(&self) -> SessionMode {
        if self.results.is_some() {
            SessionMode::Viewing
        } else {
            SessionMode::Idle
        }
    }

    fn submit(&mut self) -> SessionCommand {
        if self
            .handle
            .as_ref()
            .is_some_and(|h| h.status().is_active())
        {
            // single in-flight query: refuse, don't queue
            self.status_line = "a query is already running (Esc cancels it)".to_string();
            return SessionCommand::None;
        }

        let query = self.buffer.lines().join("\n");
        if query.trim().is_empty() {
            self.status_line = "query is empty".to_string();
            return SessionCommand::None;
        }

        // the previous result set is superseded by this submission
        self.results = None;
        self.rendered = None;
        self.scroll = 0;

        self.next_id += 1;
        let handle = ExecutionHandle::new(self.next_id);
        let command = SessionCommand::Execute {
            id: handle.id(),
            target: self.target.clone(),
            query,
            cancel: handle.cancel_token(),
        };
        info!(id = handle.id(), "query submitted");
        self.handle = Some(handle);
        self.mode = SessionMode::Running;
        self.style_buffer();
        self.status_line = "running query...".to_string();
        command
    }

    fn on_succeeded(&mut self, id: u64, results: ResultSet) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if handle.id() != id || !handle.advance(ExecutionStatus::Succeeded) {
            debug!(id, "discarding stale success");
            return;
        }
        info!(id, rows = results.row_count(), "query succeeded");
        self.status_line = format!(
            "{} row(s) in {:.1}s{}",
            results.row_count(),
            handle.elapsed().as_secs_f64(),
            if results.truncated { " (truncated)" } else { "" },
        );
        self.results = Some(results);
        self.scroll = 0;
        self.render();
        self.mode = SessionMode::Viewing;
    }

    fn on_failed(&mut self, id: u64, error: ExecutorError) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if handle.id() != id {
            debug!(id, "discarding stale failure");
            return;
        }
        let next = if error.is_cancelled() {
            ExecutionStatus::Cancelled
        } else {
            ExecutionStatus::Failed
        };
        if !handle.advance(next) {
            // already settled locally (cancel raced the completion)
            return;
        }
        if error.is_cancelled() {
            info!(id, "query cancelled");
            self.status_line = "query cancelled".to_string();
        } else {
            warn!(id, error = %error, "query failed");
            self.status_line = format!("error: {error}");
        }
        self.mode = self.rest_mode();
        self.style_buffer();
    }

    fn cancel(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if !handle.request_cancel() {
            return;
        }
        info!(id = handle.id(), "cancellation requested");
        // optimistic: leave Running now, the executor confirms later
        self.status_line = "cancelling query...".to_string();
        self.mode = self.rest_mode();
        self.style_buffer();
    }

    fn cycle_format(&mut self) {
        if self.mode == SessionMode::Running {
            return;
        }
        self.format = self.format.next();
        self.status_line = format!("output format: {}", self.format.name());
        self.render();
    }

    fn render(&mut self) {
        let Some(results) = &self.results else {
            self.rendered = None;
            return;
        };
        match self.format.formatter(self.csv_delimiter).format(results) {
            Ok(output) => self.rendered = Some(output),
            Err(e) => {
                // the result set is kept, another format can still work,
                // but stale output must not sit under the new format label
                warn!(error = %e, format = self.format.name(), "render failed");
                self.rendered = None;
                self.status_line = format!("render failed: {e}");
            }
        }
    }

    fn scroll_results(&mut self, scroll: Scroll) {
        let last_line = self
            .rendered
            .as_deref()
            .map(|r| u16::try_from(r.lines().count().saturating_sub(1)).unwrap_or(u16::MAX))
            .unwrap_or(0);
        self.scroll = match scroll {
            Scroll::Up(n) => self.scroll.saturating_sub(n),
            Scroll::Down(n) => self.scroll.saturating_add(n).min(last_line),
            Scroll::Top => 0,
            Scroll::Bottom => last_line,
        };
    }

    fn style_buffer(&mut self) {
        let focused = self.mode == SessionMode::Editing;
        let (border, cursor) = if focused {
            (
                Style::default().fg(Color::Yellow),
                Style::default().add_modifier(Modifier::REVERSED),
            )
        } else {
            (Style::default().fg(Color::DarkGray), Style::default())
        };
        self.buffer.set_cursor_style(cursor);
        self.buffer.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(" Query "),
        );
    }
}
