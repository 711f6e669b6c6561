//! Interactive data grid: sortable and reorderable columns, free-text
//! filtering and multi-format export.
//!
//! A [`Grid`] is rebuilt from scratch by every fresh render; between
//! renders it owns the column order, the sort key and the filter query.

pub mod cell;
pub mod export;
pub mod sort;

pub use cell::{line_text, text_row, CellRenderer, CellValue};
pub use export::{ExportContext, ExportFile, ExportFormat};
pub use sort::{SortDirection, SortKey};

use anyhow::Result;
use ratatui::{
    layout::{Position, Rect},
    text::Line,
};
use std::fmt;
use strum::IntoEnumIterator;
use unicode_width::UnicodeWidthStr;

use crate::core::error::OverlayError;

pub const EMPTY_MESSAGE: &str = "No data available";

const MIN_COLUMN_WIDTH: u16 = 3;
const MAX_COLUMN_WIDTH: u16 = 32;
pub const CLEAR_GLYPH: &str = "[x]";

#[derive(Clone, Default)]
pub struct GridOptions {
    pub searchable: bool,
    pub cell_renderer: Option<CellRenderer>,
    /// Enables the export toolbar and names exported files.
    pub export: Option<ExportContext>,
}

impl GridOptions {
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn renderer(mut self, renderer: CellRenderer) -> Self {
        self.cell_renderer = Some(renderer);
        self
    }

    pub fn exportable(mut self, context: ExportContext) -> Self {
        self.export = Some(context);
        self
    }
}

impl fmt::Debug for GridOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridOptions")
            .field("searchable", &self.searchable)
            .field("cell_renderer", &self.cell_renderer.is_some())
            .field("export", &self.export)
            .finish()
    }
}

/// A row as currently displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    /// Index into the rows the grid was built with.
    pub source: usize,
    /// Lower-cased, space-joined cell text in display order.
    pub text: String,
    pub hidden: bool,
}

/// Screen areas of a grid drawn into a body rectangle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub toolbar: Vec<(ExportFormat, Rect)>,
    pub filter: Option<Rect>,
    pub clear: Option<Rect>,
    /// Header cell per display position.
    pub columns: Vec<Rect>,
    pub rows: Rect,
    /// Set instead of everything else when there are no rows.
    pub empty: Option<Rect>,
}

impl GridLayout {
    pub fn column_at(&self, position: Position) -> Option<usize> {
        self.columns
            .iter()
            .position(|rect| rect.width > 0 && rect.contains(position))
    }

    pub fn export_at(&self, position: Position) -> Option<ExportFormat> {
        self.toolbar
            .iter()
            .find(|(_, rect)| rect.contains(position))
            .map(|(format, _)| *format)
    }

    pub fn is_clear(&self, position: Position) -> bool {
        self.clear.is_some_and(|rect| rect.contains(position))
    }
}

pub struct Grid {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    options: GridOptions,
    /// Rendered cells per source row, in original column order.
    cells: Vec<Vec<Line<'static>>>,
    column_order: Vec<usize>,
    sort: Option<SortKey>,
    rendered: Vec<RenderedRow>,
    filter: String,
    cursor_row: usize,
    cursor_column: usize,
    press: Option<usize>,
    hover: Option<usize>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("headers", &self.headers)
            .field("rows", &self.rows.len())
            .field("column_order", &self.column_order)
            .field("sort", &self.sort)
            .field("filter", &self.filter)
            .finish()
    }
}

impl Grid {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>, options: GridOptions) -> Self {
        let cells = rows
            .iter()
            .map(|row| {
                (0..headers.len())
                    .map(|column| render_cell(&options, row, column))
                    .collect()
            })
            .collect();
        let mut grid = Self {
            column_order: (0..headers.len()).collect(),
            headers,
            rows,
            options,
            cells,
            sort: None,
            rendered: Vec::new(),
            filter: String::new(),
            cursor_row: 0,
            cursor_column: 0,
            press: None,
            hover: None,
        };
        grid.rebuild();
        grid
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_order(&self) -> &[usize] {
        &self.column_order
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    fn rebuild(&mut self) {
        let order: Vec<usize> = match self.sort {
            Some(key) => {
                let texts: Vec<String> = self
                    .rows
                    .iter()
                    .map(|row| row.get(key.column).map(CellValue::text).unwrap_or_default())
                    .collect();
                sort::sorted_order(&texts, key.direction)
            }
            None => (0..self.rows.len()).collect(),
        };

        self.rendered = order
            .into_iter()
            .map(|source| {
                let text = self
                    .column_order
                    .iter()
                    .map(|&column| line_text(&self.cells[source][column]))
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                RenderedRow {
                    source,
                    text,
                    hidden: false,
                }
            })
            .collect();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let query = self.filter.to_lowercase();
        for row in &mut self.rendered {
            row.hidden = !query.is_empty() && !row.text.contains(&query);
        }
        self.cursor_row = self.cursor_row.min(self.visible_count().saturating_sub(1));
    }

    /// Header click at display position `position`.
    pub fn click_header(&mut self, position: usize) -> bool {
        let Some(&column) = self.column_order.get(position) else {
            return false;
        };
        self.sort = Some(SortKey::after_click(self.sort, column));
        self.rebuild();
        true
    }

    /// Move the header at display position `from` to `to`. Sort and filter
    /// are kept.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        let len = self.column_order.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let column = self.column_order.remove(from);
        self.column_order.insert(to, column);
        self.rebuild();
        true
    }

    pub fn set_filter(&mut self, query: impl Into<String>) {
        self.filter = query.into();
        self.apply_filter();
    }

    pub fn push_filter_char(&mut self, ch: char) {
        self.filter.push(ch);
        self.apply_filter();
    }

    pub fn pop_filter_char(&mut self) -> bool {
        let popped = self.filter.pop().is_some();
        if popped {
            self.apply_filter();
        }
        popped
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(String::new());
    }

    pub fn total_count(&self) -> usize {
        self.rendered.len()
    }

    pub fn visible_count(&self) -> usize {
        self.rendered.iter().filter(|row| !row.hidden).count()
    }

    /// Footer summary line.
    pub fn summary(&self) -> String {
        let total = self.total_count();
        let visible = self.visible_count();
        if visible == total {
            format!("{total} result(s)")
        } else {
            format!("{visible} of {total} result(s) shown")
        }
    }

    pub fn filter_placeholder(&self) -> String {
        format!("Search {}…", self.headers.join(", "))
    }

    pub fn rendered_rows(&self) -> &[RenderedRow] {
        &self.rendered
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &RenderedRow> {
        self.rendered.iter().filter(|row| !row.hidden)
    }

    pub fn display_headers(&self) -> Vec<String> {
        self.column_order
            .iter()
            .map(|&column| self.headers[column].clone())
            .collect()
    }

    /// Header caption with its sort indicator.
    pub fn header_label(&self, position: usize) -> Option<String> {
        let column = *self.column_order.get(position)?;
        let glyph = match self.sort {
            Some(key) if key.column == column => key.direction.glyph(),
            _ => sort::NEUTRAL_GLYPH,
        };
        Some(format!("{} {glyph}", self.headers[column]))
    }

    /// Rendered cells of `row` in display order.
    pub fn display_cells(&self, row: &RenderedRow) -> Vec<&Line<'static>> {
        self.column_order
            .iter()
            .map(|&column| &self.cells[row.source][column])
            .collect()
    }

    /// Headers and raw cell text of every rendered row, hidden rows
    /// included, in display column order and sort order.
    pub fn export_table(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let rows = self
            .rendered
            .iter()
            .map(|row| {
                self.column_order
                    .iter()
                    .map(|&column| {
                        self.rows[row.source]
                            .get(column)
                            .map(CellValue::text)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        (self.display_headers(), rows)
    }

    pub fn export(&self, format: ExportFormat) -> Result<ExportFile> {
        let context = self.options.export.clone().unwrap_or_default();
        let (headers, rows) = self.export_table();
        ExportFile::build(format, &context, &headers, &rows)
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_column)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let last = self.visible_count().saturating_sub(1);
        self.cursor_row = self.cursor_row.saturating_add_signed(delta).min(last);
    }

    pub fn move_cursor_column(&mut self, delta: isize) {
        let last = self.column_order.len().saturating_sub(1);
        self.cursor_column = self.cursor_column.saturating_add_signed(delta).min(last);
    }

    /// Keyboard reorder: shift the cursor column one place.
    pub fn shift_cursor_column(&mut self, delta: isize) -> bool {
        let from = self.cursor_column;
        let Some(to) = from.checked_add_signed(delta) else {
            return false;
        };
        if self.move_column(from, to) {
            self.cursor_column = to;
            true
        } else {
            false
        }
    }

    pub fn sort_cursor_column(&mut self) -> bool {
        self.click_header(self.cursor_column)
    }

    /// First visible row to draw so the cursor stays in a window of
    /// `height` rows.
    pub fn row_offset(&self, height: usize) -> usize {
        if height == 0 || self.cursor_row < height {
            0
        } else {
            self.cursor_row + 1 - height
        }
    }

    pub fn press_header(&mut self, position: usize) {
        self.press = Some(position);
        self.hover = Some(position);
    }

    pub fn hover_header(&mut self, position: Option<usize>) {
        if self.press.is_some() {
            self.hover = position;
        }
    }

    /// End a header press. Releasing on the pressed header sorts by it,
    /// releasing on another header drops the column there.
    pub fn release_header(&mut self, position: Option<usize>) -> bool {
        let pressed = self.press.take();
        self.hover = None;
        match (pressed, position) {
            (Some(from), Some(to)) if from == to => self.click_header(from),
            (Some(from), Some(to)) => self.move_column(from, to),
            _ => false,
        }
    }

    pub fn pressed_header(&self) -> Option<usize> {
        self.press
    }

    pub fn drop_target(&self) -> Option<usize> {
        match (self.press, self.hover) {
            (Some(from), Some(to)) if from != to => Some(to),
            _ => None,
        }
    }

    /// Rows needed to show everything.
    pub fn preferred_height(&self) -> u16 {
        if self.is_empty() {
            return 1;
        }
        let chrome = 1 + u16::from(self.options.export.is_some()) + u16::from(self.options.searchable);
        chrome.saturating_add(self.visible_count().max(1).min(u16::MAX as usize) as u16)
    }

    /// Display width of each column, header and every row considered.
    pub fn column_widths(&self) -> Vec<u16> {
        (0..self.column_order.len())
            .map(|position| {
                let column = self.column_order[position];
                let header = self
                    .header_label(position)
                    .map(|label| label.width())
                    .unwrap_or(0);
                let widest = self
                    .cells
                    .iter()
                    .map(|row| row[column].width())
                    .max()
                    .unwrap_or(0)
                    .max(header);
                (widest.min(MAX_COLUMN_WIDTH as usize) as u16).max(MIN_COLUMN_WIDTH)
            })
            .collect()
    }

    pub fn layout(&self, area: Rect) -> GridLayout {
        let mut layout = GridLayout::default();
        if area.is_empty() {
            return layout;
        }
        if self.is_empty() {
            layout.empty = Some(Rect { height: 1, ..area });
            return layout;
        }

        let mut y = area.y;
        let bottom = area.bottom();

        if self.options.export.is_some() && y < bottom {
            let mut x = area.x;
            for format in ExportFormat::iter() {
                let width = format.label().width() as u16 + 2;
                if x.saturating_add(width) > area.right() {
                    break;
                }
                layout.toolbar.push((format, Rect::new(x, y, width, 1)));
                x += width + 1;
            }
            y += 1;
        }

        if self.options.searchable && y < bottom {
            layout.filter = Some(Rect::new(area.x, y, area.width, 1));
            let clear_width = CLEAR_GLYPH.width() as u16;
            if !self.filter.is_empty() && area.width > clear_width {
                layout.clear = Some(Rect::new(area.right() - clear_width, y, clear_width, 1));
            }
            y += 1;
        }

        if y < bottom {
            let mut x = area.x;
            for width in self.column_widths() {
                let available = area.right().saturating_sub(x);
                let width = width.min(available);
                layout.columns.push(Rect::new(x, y, width, 1));
                x = x.saturating_add(width).saturating_add(1).min(area.right());
            }
            y += 1;
        }

        layout.rows = Rect::new(area.x, y, area.width, bottom.saturating_sub(y));
        layout
    }
}

fn render_cell(options: &GridOptions, row: &[CellValue], column: usize) -> Line<'static> {
    let empty = CellValue::Empty;
    let value = row.get(column).unwrap_or(&empty);
    let fallback = || Line::raw(value.text().replace(['\n', '\r'], " "));
    let Some(renderer) = &options.cell_renderer else {
        return fallback();
    };
    match renderer(row, column, value) {
        Ok(Some(line)) => line,
        Ok(None) => fallback(),
        Err(err) => {
            let err = OverlayError::RenderData {
                column,
                message: format!("{err:#}"),
            };
            log::debug!("{err}");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn people() -> Grid {
        Grid::new(
            vec!["Name".into(), "Age".into()],
            vec![
                text_row(["Carol", "10"]),
                text_row(["alice", "2"]),
                text_row(["Bob", "33"]),
            ],
            GridOptions::default().searchable(true),
        )
    }

    fn column(grid: &Grid, position: usize) -> Vec<String> {
        let (_, rows) = grid.export_table();
        rows.into_iter().map(|row| row[position].clone()).collect()
    }

    #[test]
    fn test_click_sorts_and_flips() {
        let mut grid = people();
        assert!(grid.click_header(1));
        assert_eq!(column(&grid, 1), vec!["2", "10", "33"]);
        assert_eq!(grid.header_label(1).as_deref(), Some("Age ↑"));
        assert_eq!(grid.header_label(0).as_deref(), Some("Name ⇅"));

        grid.click_header(1);
        assert_eq!(column(&grid, 1), vec!["33", "10", "2"]);
        assert_eq!(grid.header_label(1).as_deref(), Some("Age ↓"));

        grid.click_header(0);
        assert_eq!(column(&grid, 0), vec!["alice", "Bob", "Carol"]);
        assert!(!grid.click_header(9));
    }

    #[test]
    fn test_sort_follows_column_order() {
        let mut grid = people();
        grid.move_column(1, 0);
        grid.click_header(0);
        assert_eq!(grid.sort_key().map(|key| key.column), Some(1));
        assert_eq!(column(&grid, 0), vec!["2", "10", "33"]);
    }

    #[test]
    fn test_filter_hides_rows() {
        let mut grid = people();
        grid.set_filter("O");
        assert_eq!(grid.visible_count(), 2);
        assert_eq!(grid.summary(), "2 of 3 result(s) shown");
        grid.push_filter_char('b');
        assert_eq!(grid.visible_count(), 1);
        grid.clear_filter();
        assert_eq!(grid.summary(), "3 result(s)");
    }

    #[test]
    fn test_header_press_release() {
        let mut grid = people();
        grid.press_header(0);
        grid.hover_header(Some(1));
        assert_eq!(grid.drop_target(), Some(1));
        assert!(grid.release_header(Some(1)));
        assert_eq!(grid.display_headers(), vec!["Age", "Name"]);

        grid.press_header(1);
        assert!(grid.release_header(Some(1)));
        assert_eq!(grid.sort_key().map(|key| key.column), Some(0));
        assert!(!grid.release_header(Some(0)));
    }

    #[test]
    fn test_renderer_error_falls_back() {
        let renderer: CellRenderer = Arc::new(
            |_row: &[CellValue], column: usize, value: &CellValue| -> Result<Option<Line<'static>>> {
                if column == 1 {
                    anyhow::bail!("boom")
                }
                Ok(Some(Line::raw(format!("<{}>", value.text()))))
            },
        );
        let grid = Grid::new(
            vec!["A".into(), "B".into()],
            vec![text_row(["x", "y"])],
            GridOptions::default().renderer(renderer),
        );
        let row = &grid.rendered_rows()[0];
        let texts: Vec<String> = grid.display_cells(row).into_iter().map(line_text).collect();
        assert_eq!(texts, vec!["<x>", "y"]);
        assert_eq!(row.text, "<x> y");
    }

    #[test]
    fn test_missing_cells_are_empty() {
        let grid = Grid::new(
            vec!["A".into(), "B".into()],
            vec![text_row(["only"])],
            GridOptions::default(),
        );
        let (_, rows) = grid.export_table();
        assert_eq!(rows, vec![vec!["only".to_string(), String::new()]]);
    }

    #[test]
    fn test_layout_regions() {
        let grid = Grid::new(
            vec!["Name".into(), "Age".into()],
            vec![text_row(["Ann", "5"])],
            GridOptions::default()
                .searchable(true)
                .exportable(ExportContext::default()),
        );
        let layout = grid.layout(Rect::new(0, 0, 40, 10));
        assert_eq!(layout.toolbar.len(), 3);
        assert_eq!(layout.toolbar[0].1, Rect::new(0, 0, 5, 1));
        assert_eq!(layout.filter, Some(Rect::new(0, 1, 40, 1)));
        assert_eq!(layout.clear, None);
        assert_eq!(layout.columns[0], Rect::new(0, 2, 6, 1));
        assert_eq!(layout.columns[1], Rect::new(7, 2, 5, 1));
        assert_eq!(layout.rows, Rect::new(0, 3, 40, 7));
        assert_eq!(layout.column_at(Position { x: 8, y: 2 }), Some(1));
        assert_eq!(
            layout.export_at(Position { x: 7, y: 0 }),
            Some(ExportFormat::Json)
        );
    }

    #[test]
    fn test_empty_grid_layout() {
        let grid = Grid::new(vec!["A".into()], Vec::new(), GridOptions::default());
        let layout = grid.layout(Rect::new(2, 3, 20, 5));
        assert_eq!(layout.empty, Some(Rect::new(2, 3, 20, 1)));
        assert!(layout.columns.is_empty());
        assert_eq!(grid.summary(), "0 result(s)");
    }
}
