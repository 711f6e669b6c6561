pub mod components;
pub mod panels;

use anyhow::Result;
use ratatui::prelude::*;

use crate::tui::App;
use components::{error_msg::render_alert, render_boxed_paragraph};

const HINTS: &str = "Ctrl+O explorer · F5 refresh · F2 theme · Esc close · Ctrl+Q quit";

pub fn render_ui(frame: &mut Frame, app: &App) -> Result<()> {
    let area = frame.area();
    app.manager.resize(area.as_size());

    let doc = app.manager.document();
    let doc = doc.read();
    let alert = doc.alert().cloned();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(0),
            Constraint::Length(1), // Hints
            Constraint::Length(if alert.is_some() { 1 } else { 0 }),
        ])
        .split(area);

    let title = Line::from(vec![
        Span::styled(" overlaykit", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" · "),
        Span::styled(app.source_label.clone(), Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(
        ratatui::widgets::Paragraph::new(title).style(Style::default().bg(Color::DarkGray)),
        chunks[0],
    );

    let open: Vec<String> = doc
        .panels()
        .iter()
        .map(|node| format!("  {} {}", node.id, node.title))
        .collect();
    let mut page = vec![
        Line::from(format!("Source: {}", app.source_label)),
        Line::from(if app.explorer.is_loading() {
            "Fetching data…".to_string()
        } else {
            format!("{} panel(s) open", open.len())
        }),
        Line::default(),
    ];
    page.extend(open.into_iter().map(Line::from));
    if doc.panels().is_empty() {
        page.push(Line::from(Span::styled(
            "Press Ctrl+O to open the Table Explorer.",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    render_boxed_paragraph(frame, chunks[1], page, Some("Page"), Style::default(), true);

    frame.render_widget(
        ratatui::widgets::Paragraph::new(Line::from(Span::styled(
            HINTS,
            Style::default().fg(Color::Gray),
        ))),
        chunks[2],
    );
    if let Some(alert) = &alert {
        render_alert(frame, chunks[3], alert);
    }

    panels::render_document(frame.buffer_mut(), &doc);
    Ok(())
}
