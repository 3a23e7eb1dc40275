use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::session::{Session, SessionMode};

/// Query area on top, results below, one status line at the bottom.
pub fn draw(frame: &mut Frame, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(session.buffer(), chunks[0]);
    draw_results(frame, session, chunks[1]);
    draw_status(frame, session, chunks[2]);
}

fn draw_results(frame: &mut Frame, session: &Session, area: Rect) {
    let title = format!(" Results [{}] ", session.format().name());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(match session.mode() {
            SessionMode::Viewing => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::DarkGray),
        })
        .title(title);

    let body = match session.mode() {
        SessionMode::Running => {
            let elapsed = session
                .running_elapsed()
                .map(|e| e.as_secs_f64())
                .unwrap_or(0.0);
            format!("running... {elapsed:.1}s (Esc to cancel)")
        }
        _ => session
            .rendered()
            .unwrap_or("no results (i to edit, F5 to run)")
            .to_string(),
    };

    let paragraph = Paragraph::new(body)
        .block(block)
        .scroll((session.scroll(), 0));
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, session: &Session, area: Rect) {
    let (tag, tag_style) = match session.mode() {
        SessionMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        SessionMode::Idle => (" IDLE ", Style::default().bg(Color::DarkGray)),
        SessionMode::Running => (" RUN  ", Style::default().bg(Color::Cyan).fg(Color::Black)),
        SessionMode::Viewing => (" VIEW ", Style::default().bg(Color::Green).fg(Color::Black)),
    };

    let hints = match session.mode() {
        SessionMode::Editing => "Esc blur | F5 run | Ctrl+C quit",
        SessionMode::Running => "Esc cancel",
        _ => "i edit | F5 run | f format | j/k scroll | q quit",
    };

    let line = Line::from(vec![
        Span::styled(tag, tag_style.add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::raw(session.status_line()),
        Span::raw("  "),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
