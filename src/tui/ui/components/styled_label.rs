use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::panel::theme::Palette;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextState {
    Normal,
    Editing,
}

/// Input spans with placeholder support.
///
/// When the value is empty and a placeholder is given, the placeholder is
/// shown muted and italic. Editing adds the `> ` / ` <` markers and a
/// trailing cursor.
pub fn input_spans_with_placeholder<'a>(
    current_value: &str,
    placeholder: Option<&str>,
    state: TextState,
    palette: &Palette,
) -> Vec<Span<'a>> {
    let placeholder_style = Style::default()
        .fg(palette.text_muted)
        .add_modifier(Modifier::ITALIC);
    let show_placeholder = current_value.is_empty() && placeholder.is_some();

    match state {
        TextState::Normal => {
            if let (true, Some(placeholder)) = (show_placeholder, placeholder) {
                vec![Span::styled(placeholder.to_string(), placeholder_style)]
            } else {
                vec![Span::styled(
                    current_value.to_string(),
                    Style::default().fg(palette.text),
                )]
            }
        }
        TextState::Editing => {
            let marker = Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD);
            let mut out = vec![Span::styled("> ", marker)];
            if let (true, Some(placeholder)) = (show_placeholder, placeholder) {
                out.push(Span::styled("_", marker));
                out.push(Span::styled(placeholder.to_string(), placeholder_style));
            } else {
                out.push(Span::styled(
                    current_value.to_string(),
                    Style::default().fg(palette.primary),
                ));
                out.push(Span::styled("_", marker));
            }
            out.push(Span::styled(" <", marker));
            out
        }
    }
}

/// `[label]` button. Disabled buttons are muted.
pub fn button_spans<'a>(label: &str, enabled: bool, palette: &Palette) -> Vec<Span<'a>> {
    let style = if !enabled {
        Style::default()
            .fg(palette.text_muted)
            .add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(palette.primary)
    };
    vec![
        Span::styled("[", style),
        Span::styled(label.to_string(), style),
        Span::styled("]", style),
    ]
}
