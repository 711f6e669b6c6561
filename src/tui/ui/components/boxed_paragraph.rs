use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

/// Render lines inside a bordered block.
///
/// `title` goes into the top border. With `wrap` long lines are wrapped
/// instead of clipped.
pub fn render_boxed_paragraph(
    frame: &mut Frame,
    area: Rect,
    content: Vec<Line>,
    title: Option<&str>,
    style: Style,
    wrap: bool,
) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(style);
    if let Some(title) = title {
        block = block.title(format!(" {title} "));
    }

    let mut para = Paragraph::new(content).block(block);
    if wrap {
        para = para.wrap(Wrap { trim: true });
    }
    frame.render_widget(para, area);
}
