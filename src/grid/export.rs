//! CSV, JSON and Markdown export of a grid's rendered dataset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ExportFormat {
    #[strum(serialize = "csv")]
    Csv,
    #[strum(serialize = "json")]
    Json,
    #[strum(serialize = "md", serialize = "markdown")]
    Markdown,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Markdown => "text/markdown",
        }
    }

    /// Toolbar button caption.
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
            ExportFormat::Markdown => "MD",
        }
    }
}

/// Naming context of an export: the entity and the tab it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportContext {
    pub entity: String,
    pub tab: String,
}

impl Default for ExportContext {
    fn default() -> Self {
        Self {
            entity: "entity".to_string(),
            tab: "Data".to_string(),
        }
    }
}

impl ExportContext {
    pub fn new(entity: impl Into<String>, tab: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            tab: tab.into(),
        }
    }

    /// `<entity>_<tab lower-cased, whitespace runs as '_'>`
    pub fn base_name(&self) -> String {
        let mut tab = String::with_capacity(self.tab.len());
        let mut in_space = false;
        for ch in self.tab.to_lowercase().chars() {
            if !ch.is_whitespace() {
                tab.push(ch);
            } else if !in_space {
                tab.push('_');
            }
            in_space = ch.is_whitespace();
        }
        format!("{}_{}", self.entity, tab)
    }

    pub fn file_name(&self, format: ExportFormat) -> String {
        format!("{}.{}", self.base_name(), format.extension())
    }
}

/// Every field quoted, quotes doubled, header first, `\n` between records.
pub fn to_csv(headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(headers).context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(row).context("Failed to write CSV row")?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV")?;
    let mut content = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
    // No trailing terminator after the last record.
    if content.ends_with('\n') {
        content.pop();
    }
    Ok(content)
}

/// JSON export document. Field order is part of the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonExport {
    pub entity: String,
    pub tab: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn to_json(context: &ExportContext, headers: &[String], rows: &[Vec<String>]) -> Result<String> {
    let document = JsonExport {
        entity: context.entity.clone(),
        tab: context.tab.clone(),
        headers: headers.to_vec(),
        rows: rows.to_vec(),
    };
    serde_json::to_string_pretty(&document).context("Failed to serialize export")
}

fn markdown_cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

fn markdown_row(cells: &[String]) -> String {
    let cells: Vec<String> = cells.iter().map(|cell| markdown_cell(cell)).collect();
    format!("| {} |", cells.join(" | "))
}

pub fn to_markdown(context: &ExportContext, headers: &[String], rows: &[Vec<String>]) -> String {
    let mut lines = vec![
        format!("# {}: {}", context.tab, context.entity),
        String::new(),
        markdown_row(headers),
        format!("|{}", "---|".repeat(headers.len())),
    ];
    lines.extend(rows.iter().map(|row| markdown_row(row)));
    lines.join("\n")
}

/// A finished export, ready to be written or handed to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime: &'static str,
    pub content: String,
}

impl ExportFile {
    pub fn build(
        format: ExportFormat,
        context: &ExportContext,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<Self> {
        let content = match format {
            ExportFormat::Csv => to_csv(headers, rows)?,
            ExportFormat::Json => to_json(context, headers, rows)?,
            ExportFormat::Markdown => to_markdown(context, headers, rows),
        };
        Ok(Self {
            file_name: context.file_name(format),
            mime: format.mime(),
            content,
        })
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {dir:?}"))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.content).with_context(|| format!("Failed to write {path:?}"))?;
        log::info!("💾 Exported {} ({}) to {path:?}", self.file_name, self.mime);
        Ok(path)
    }
}
