use chrono::{DateTime, Local};
use ratatui::{
    prelude::*,
    widgets::Paragraph,
};

use crate::panel::document::{Alert, Document};

/// Set or clear the page-level alert. Accepts an optional
/// `(message, timestamp)` tuple.
pub fn ui_error_set(doc: &mut Document, error: Option<(String, DateTime<Local>)>) {
    doc.set_alert(error.map(|(message, timestamp)| Alert { message, timestamp }));
}

pub fn alert_text(alert: &Alert) -> String {
    format!(
        " [{}] {}  (Esc to dismiss)",
        alert.timestamp.format("%H:%M:%S"),
        alert.message
    )
}

pub fn render_alert(frame: &mut Frame, area: Rect, alert: &Alert) {
    let line = Line::from(Span::styled(
        alert_text(alert),
        Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::Red)),
        area,
    );
}
