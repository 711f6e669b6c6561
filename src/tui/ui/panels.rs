//! Drawing of the floating panels and their grids, straight into the
//! frame buffer so the geometry matches hit-testing exactly.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Widget},
};
use unicode_width::UnicodeWidthStr;

use super::components::{button_spans, input_spans_with_placeholder, TextState};
use crate::{
    grid::{Grid, CLEAR_GLYPH, EMPTY_MESSAGE},
    panel::{
        document::{BodyContent, Document, PanelNode, CLOSE_GLYPH},
        theme::Palette,
    },
};

const FILTER_LABEL: &str = "Filter: ";

/// Draw every attached panel, bottom first.
pub fn render_document(buf: &mut Buffer, doc: &Document) {
    let focused = doc.focused();
    for node in doc.panels() {
        render_panel(buf, doc, node, focused == Some(node.id));
    }
}

fn render_panel(buf: &mut Buffer, doc: &Document, node: &PanelNode, focused: bool) {
    let layout = doc.layout(node);
    if layout.area.is_empty() || layout.area.intersection(*buf.area()) != layout.area {
        log::debug!("Panel {} does not fit the frame, skipped", node.id);
        return;
    }
    let palette = doc.palette_for(node);
    let base = Style::default().fg(palette.text).bg(palette.bg);

    Clear.render(layout.area, buf);
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { palette.primary } else { palette.border }))
        .style(base)
        .render(layout.area, buf);

    let header_style = Style::default().fg(palette.header_text).bg(palette.header_bg);
    buf.set_style(layout.header, header_style);
    let title_room = layout.close.x.saturating_sub(layout.header.x + 2) as usize;
    buf.set_stringn(
        layout.header.x + 1,
        layout.header.y,
        format!(" {} ", node.title),
        title_room,
        header_style.add_modifier(Modifier::BOLD),
    );
    buf.set_string(
        layout.close.x,
        layout.close.y,
        CLOSE_GLYPH,
        Style::default().fg(palette.close).bg(palette.header_bg),
    );

    render_body(buf, &node.body, layout.body, &palette, focused);

    if let (Some(rect), Some(footer)) = (layout.footer, node.footer.as_ref()) {
        buf.set_style(rect, Style::default().bg(palette.footer_bg));
        let first_control = layout
            .buttons
            .iter()
            .map(|(_, r)| r.x)
            .chain(layout.theme_toggle.map(|r| r.x))
            .min()
            .unwrap_or(rect.right());
        buf.set_stringn(
            rect.x,
            rect.y,
            &footer.text,
            first_control.saturating_sub(rect.x + 1) as usize,
            Style::default().fg(palette.text_muted).bg(palette.footer_bg),
        );
        for (id, r) in &layout.buttons {
            if let Some(button) = footer.buttons.iter().find(|b| &b.id == id) {
                let line = Line::from(button_spans(&button.label, button.enabled, &palette));
                buf.set_line(r.x, r.y, &line, r.width);
            }
        }
        if let Some(r) = layout.theme_toggle {
            let line = Line::from(button_spans(node.theme.toggle_label(), true, &palette));
            buf.set_line(r.x, r.y, &line, r.width);
        }
    }
}

fn render_body(buf: &mut Buffer, body: &BodyContent, area: Rect, palette: &Palette, focused: bool) {
    if area.is_empty() {
        return;
    }
    let muted = Style::default().fg(palette.text_muted);
    match body {
        BodyContent::Empty => {}
        BodyContent::Text(lines) => {
            for (row, line) in lines.iter().take(area.height as usize).enumerate() {
                buf.set_stringn(
                    area.x,
                    area.y + row as u16,
                    line,
                    area.width as usize,
                    Style::default().fg(palette.text),
                );
            }
        }
        BodyContent::Loading(message) => {
            buf.set_stringn(
                area.x,
                area.y,
                message,
                area.width as usize,
                muted.add_modifier(Modifier::ITALIC),
            );
        }
        BodyContent::Error(message) => {
            buf.set_stringn(
                area.x,
                area.y,
                format!("⚠ {message}"),
                area.width as usize,
                Style::default().fg(palette.text_error),
            );
        }
        BodyContent::Grid(grid) => render_grid(buf, grid, area, palette, focused),
    }
}

pub fn render_grid(buf: &mut Buffer, grid: &Grid, area: Rect, palette: &Palette, focused: bool) {
    let layout = grid.layout(area);
    if let Some(rect) = layout.empty {
        buf.set_stringn(
            rect.x,
            rect.y,
            EMPTY_MESSAGE,
            rect.width as usize,
            Style::default()
                .fg(palette.text_muted)
                .add_modifier(Modifier::ITALIC),
        );
        return;
    }

    for (format, rect) in &layout.toolbar {
        let line = Line::from(button_spans(format.label(), true, palette));
        buf.set_line(rect.x, rect.y, &line, rect.width);
    }

    if let Some(rect) = layout.filter {
        let state = if focused {
            TextState::Editing
        } else {
            TextState::Normal
        };
        let placeholder = grid.filter_placeholder();
        let mut spans = vec![ratatui::text::Span::styled(
            FILTER_LABEL,
            Style::default().fg(palette.text_muted),
        )];
        spans.extend(input_spans_with_placeholder(
            grid.filter(),
            Some(&placeholder),
            state,
            palette,
        ));
        let room = layout.clear.map(|r| r.x.saturating_sub(rect.x + 1)).unwrap_or(rect.width);
        buf.set_line(rect.x, rect.y, &Line::from(spans), room);
        if let Some(clear) = layout.clear {
            buf.set_string(clear.x, clear.y, CLEAR_GLYPH, Style::default().fg(palette.text_error));
        }
    }

    let (_, cursor_column) = grid.cursor();
    let sort_column = grid.sort_key().map(|key| key.column);
    for (position, rect) in layout.columns.iter().enumerate() {
        if rect.width == 0 {
            continue;
        }
        let Some(label) = grid.header_label(position) else {
            continue;
        };
        let mut style = Style::default().fg(palette.text).add_modifier(Modifier::BOLD);
        if sort_column == grid.column_order().get(position).copied() {
            style = style.fg(palette.primary);
        }
        if focused && position == cursor_column {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if grid.pressed_header() == Some(position) {
            style = style.bg(palette.bg_hover);
        }
        if grid.drop_target() == Some(position) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        buf.set_stringn(rect.x, rect.y, label, rect.width as usize, style);
    }

    let rows = layout.rows;
    let height = rows.height as usize;
    let offset = grid.row_offset(height);
    let (cursor_row, _) = grid.cursor();
    for (index, row) in grid.visible_rows().skip(offset).take(height).enumerate() {
        let y = rows.y + index as u16;
        if focused && offset + index == cursor_row {
            buf.set_style(Rect::new(rows.x, y, rows.width, 1), Style::default().bg(palette.bg_hover));
        }
        for (position, line) in grid.display_cells(row).into_iter().enumerate() {
            let Some(column) = layout.columns.get(position) else {
                break;
            };
            if column.width == 0 {
                continue;
            }
            let width = column.width.min(rows.right().saturating_sub(column.x));
            if line.width() > width as usize {
                let text = crate::grid::line_text(line);
                let clipped = clip(&text, width as usize);
                buf.set_stringn(column.x, y, clipped, width as usize, line.style);
            } else {
                buf.set_line(column.x, y, line, width);
            }
        }
    }
}

/// Cut `text` to `width` cells, ending with an ellipsis.
fn clip(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip("abcdef", 4), "abc…");
        assert_eq!(clip("abc", 4), "abc");
    }
}
