use ratatui::text::Line;
use serde_json::Value;
use std::sync::Arc;

/// One grid cell: plain text or an opaque JSON payload handed to the
/// cell renderer untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Payload(Value),
}

impl CellValue {
    /// Plain-text form used for sorting, export and the default display.
    pub fn text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Payload(value) => payload_text(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            CellValue::Payload(value) => value.is_null(),
        }
    }
}

fn payload_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::String(text) => CellValue::Text(text),
            other => CellValue::Payload(other),
        }
    }
}

/// Caller-supplied cell formatter: `(row, original column, cell)`.
///
/// `Ok(None)` keeps the default text. An error is reported for that cell
/// only and the raw text is shown instead.
pub type CellRenderer = Arc<
    dyn Fn(&[CellValue], usize, &CellValue) -> anyhow::Result<Option<Line<'static>>>
        + Send
        + Sync,
>;

/// Build a row of text cells.
pub fn text_row<I, S>(cells: I) -> Vec<CellValue>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    cells
        .into_iter()
        .map(|cell| CellValue::Text(cell.into()))
        .collect()
}

/// Concatenated content of a rendered line.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans
        .iter()
        .map(|span| span.content.as_ref())
        .collect()
}
