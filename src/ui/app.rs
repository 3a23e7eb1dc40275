use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::QueryExecutor;
use crate::session::{Session, SessionCommand, SessionEvent};
use crate::ui::{keys, render};

/// Redraw cadence while nothing else is happening; keeps the elapsed
/// counter moving during a long query.
const TICK: Duration = Duration::from_millis(100);

/// The event loop. Owns the session and is its only mutator: terminal
/// input and execution completions both arrive here and are applied
/// serially, in order.
pub struct App {
    session: Session,
    executor: Arc<QueryExecutor>,
    max_rows: usize,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl App {
    pub fn new(session: Session, executor: Arc<QueryExecutor>, max_rows: usize) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session,
            executor,
            max_rows,
            events_tx,
            events_rx,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = self.event_loop(&mut terminal).await;

        // restore the terminal even when the loop errored
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        let mut input = EventStream::new();
        let mut tick = tokio::time::interval(TICK);

        loop {
            terminal.draw(|frame| render::draw(frame, &self.session))?;

            tokio::select! {
                maybe_event = input.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if let Some(event) = keys::map_key(key, self.session.mode()) {
                            let command = self.session.apply(event);
                            self.dispatch(command);
                        }
                    }
                    // resize redraws at the top of the loop
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => {
                    let command = self.session.apply(event);
                    self.dispatch(command);
                }
                _ = tick.tick() => {}
            }

            if self.session.should_quit() {
                break;
            }
        }
        Ok(())
    }

    /// Run a session command. Execution is spawned so the loop stays
    /// responsive; the task reports back through the event channel only.
    fn dispatch(&self, command: SessionCommand) {
        let SessionCommand::Execute {
            id,
            target,
            query,
            cancel,
        } = command
        else {
            return;
        };

        debug!(id, "spawning execution task");
        let executor = Arc::clone(&self.executor);
        let tx = self.events_tx.clone();
        let max_rows = self.max_rows;
        tokio::spawn(async move {
            let _ = tx.send(SessionEvent::ExecutionStarted { id });
            let outcome = match executor.submit(&target, &query, cancel).await {
                Ok(stream) => stream.collect(max_rows).await,
                Err(e) => Err(e),
            };
            let event = match outcome {
                Ok(results) => SessionEvent::ExecutionSucceeded { id, results },
                Err(error) => SessionEvent::ExecutionFailed { id, error },
            };
            // send failure only means the loop already shut down
            let _ = tx.send(event);
        });
    }
}
