use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::{Scroll, SessionEvent, SessionMode};

/// Map a raw key event to a semantic session event.
///
/// While editing, almost everything is forwarded into the buffer; the
/// submit chords and Ctrl+C stay global so the user is never trapped.
pub fn map_key(key: KeyEvent, mode: SessionMode) -> Option<SessionEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match (key.code, key.modifiers) {
        (KeyCode::F(5), _) => return Some(SessionEvent::SubmitQuery),
        (KeyCode::Char('e'), KeyModifiers::CONTROL) => return Some(SessionEvent::SubmitQuery),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            // cancels first; quits once nothing is running
            return Some(if mode == SessionMode::Running {
                SessionEvent::CancelRequest
            } else {
                SessionEvent::Quit
            });
        }
        _ => {}
    }

    match mode {
        SessionMode::Editing => match key.code {
            KeyCode::Esc => Some(SessionEvent::UnfocusBuffer),
            _ => Some(SessionEvent::Edit(key.into())),
        },
        SessionMode::Running => match key.code {
            KeyCode::Esc => Some(SessionEvent::CancelRequest),
            _ => None,
        },
        SessionMode::Idle | SessionMode::Viewing => match key.code {
            KeyCode::Char('i') => Some(SessionEvent::FocusBuffer),
            KeyCode::Char('q') => Some(SessionEvent::Quit),
            KeyCode::Char('f') => Some(SessionEvent::CycleFormat),
            KeyCode::Down | KeyCode::Char('j') => Some(SessionEvent::ScrollResults(Scroll::Down(1))),
            KeyCode::Up | KeyCode::Char('k') => Some(SessionEvent::ScrollResults(Scroll::Up(1))),
            KeyCode::PageDown => Some(SessionEvent::ScrollResults(Scroll::Down(20))),
            KeyCode::PageUp => Some(SessionEvent::ScrollResults(Scroll::Up(20))),
            KeyCode::Home | KeyCode::Char('g') => Some(SessionEvent::ScrollResults(Scroll::Top)),
            KeyCode::End | KeyCode::Char('G') => Some(SessionEvent::ScrollResults(Scroll::Bottom)),
            _ => None,
        },
    }
}
