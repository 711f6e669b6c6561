//! Table Explorer: a keyed panel that shows the active data source in a
//! searchable, exportable grid.

use anyhow::Result;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use uuid::Uuid;

use crate::{
    core::{bus::Bus, error::OverlayError},
    grid::{CellRenderer, CellValue, ExportContext, ExportFormat, GridOptions},
    panel::{
        document::{PanelEvent, PanelId},
        geometry::Corner,
        theme::ThemeChoice,
        PanelHandle, PanelManager, PanelOptions,
    },
    source::Dataset,
    utils::{is_guid, sanitize_guid},
};

pub const EXPLORER_KEY: &str = "table-explorer";
pub const EXPLORER_TITLE: &str = "Table Explorer";
pub const REFRESH_BUTTON: &str = "refresh";
const REFRESH_LABEL: &str = "⟳ Refresh";
const LOADING_MESSAGE: &str = "Loading…";

pub struct Explorer {
    title: String,
    context: ExportContext,
    out_dir: PathBuf,
    theme: Option<ThemeChoice>,
    position: Option<Corner>,
    handle: Option<PanelHandle>,
    pending: Option<Uuid>,
}

impl Explorer {
    pub fn new(title: impl Into<String>, context: ExportContext, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            context,
            out_dir: out_dir.into(),
            theme: None,
            position: None,
            handle: None,
            pending: None,
        }
    }

    pub fn with_theme(mut self, theme: Option<ThemeChoice>) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_position(mut self, position: Option<Corner>) -> Self {
        self.position = position;
        self
    }

    pub fn handle(&self) -> Option<&PanelHandle> {
        self.handle.as_ref().filter(|handle| handle.is_attached())
    }

    pub fn is_open(&self) -> bool {
        self.handle().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Open the panel, or close it when already open.
    pub fn toggle(&mut self, manager: &PanelManager, bus: &Bus) {
        let mut options = PanelOptions::keyed(EXPLORER_KEY).footer_text("");
        if let Some(theme) = self.theme {
            options = options.theme(theme);
        }
        if let Some(position) = self.position {
            options = options.position(position);
        }

        match manager.create_panel(&self.title, options) {
            Ok(Some(handle)) => {
                if let Some(footer) = handle.footer() {
                    footer.add_button(REFRESH_BUTTON, REFRESH_LABEL);
                }
                self.handle = Some(handle);
                self.pending = None;
                self.refresh(manager, bus);
            }
            Ok(None) => {
                self.handle = None;
                self.pending = None;
            }
            Err(err) => {
                log::error!("{err}");
                manager.set_alert(err.to_string());
            }
        }
    }

    /// Issue a fresh fetch unless one is already in flight.
    pub fn refresh(&mut self, manager: &PanelManager, bus: &Bus) {
        if self.pending.is_some() {
            log::debug!("Fetch already pending, refresh ignored");
            return;
        }
        let Some(handle) = self.handle() else {
            return;
        };
        let panel = handle.id();
        handle.body().set_loading(LOADING_MESSAGE);
        if let Some(footer) = handle.footer() {
            footer.set_text(LOADING_MESSAGE);
            footer.set_button_enabled(REFRESH_BUTTON, false);
        }

        match bus.request_fetch(panel) {
            Ok(request) => self.pending = Some(request),
            Err(err) => {
                log::error!("{err}");
                handle.body().set_error(err.to_string());
                if let Some(footer) = handle.footer() {
                    footer.set_button_enabled(REFRESH_BUTTON, true);
                }
                manager.set_alert(format!("Refresh failed: {err}"));
            }
        }
    }

    /// Apply a finished fetch. Answers for other requests, or for a panel
    /// that has since been closed, are dropped.
    pub fn on_loaded(&mut self, request: Uuid, panel: PanelId, outcome: Result<Dataset, OverlayError>) {
        if self.pending != Some(request) {
            log::debug!("Stale result {request} dropped");
            return;
        }
        self.pending = None;
        let Some(handle) = self.handle().cloned() else {
            return;
        };
        if handle.id() != panel {
            return;
        }
        if let Some(footer) = handle.footer() {
            footer.set_button_enabled(REFRESH_BUTTON, true);
        }

        match outcome {
            Ok(dataset) => {
                log::info!("📊 Loaded {} row(s) into {}", dataset.len(), panel);
                let options = GridOptions::default()
                    .searchable(true)
                    .renderer(explorer_cell_renderer())
                    .exportable(self.context.clone());
                handle.body().render_grid(dataset.headers, dataset.rows, options);
            }
            Err(err) => {
                handle.body().set_error(err.to_string());
                if let Some(footer) = handle.footer() {
                    footer.set_text("Request failed");
                }
            }
        }
    }

    /// React to events raised by panels. Returns true when the event
    /// belonged to the explorer.
    pub fn on_event(&mut self, event: &PanelEvent, manager: &PanelManager, bus: &Bus) -> bool {
        let own = self.handle.as_ref().map(|handle| handle.id());
        match event {
            PanelEvent::FooterButton { panel, button } if Some(*panel) == own => {
                if button == REFRESH_BUTTON {
                    self.refresh(manager, bus);
                }
                true
            }
            PanelEvent::Export { panel, format } if Some(*panel) == own => {
                match self.export(*format) {
                    Ok(Some(path)) => manager.set_alert(format!("Exported {}", path.display())),
                    Ok(None) => {}
                    Err(err) => {
                        log::error!("Export failed: {err:#}");
                        manager.set_alert(format!("Export failed: {err}"));
                    }
                }
                true
            }
            PanelEvent::Closed { panel, .. } if Some(*panel) == own => {
                self.handle = None;
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Write the current grid in `format` into the output directory.
    pub fn export(&self, format: ExportFormat) -> Result<Option<PathBuf>> {
        let Some(handle) = self.handle() else {
            return Ok(None);
        };
        let Some(file) = handle.body().with_grid(|grid| grid.export(format)) else {
            return Ok(None);
        };
        let path = file?.write_to(&self.out_dir)?;
        Ok(Some(path))
    }
}

/// Cell renderer for raw source values: booleans as check glyphs,
/// brace-wrapped GUIDs unwrapped, nested payloads as compact JSON.
pub fn explorer_cell_renderer() -> CellRenderer {
    Arc::new(|_row: &[CellValue], _column: usize, value: &CellValue| -> Result<Option<Line<'static>>> {
        let line = match value {
            CellValue::Payload(Value::Bool(true)) => {
                Some(Line::from(Span::styled("✓", Style::default().fg(Color::Green))))
            }
            CellValue::Payload(Value::Bool(false)) => {
                Some(Line::from(Span::styled("✗", Style::default().fg(Color::Red))))
            }
            CellValue::Payload(nested @ (Value::Array(_) | Value::Object(_))) => Some(Line::from(
                Span::styled(
                    serde_json::to_string(nested)?,
                    Style::default().add_modifier(Modifier::DIM),
                ),
            )),
            CellValue::Text(text) if text.starts_with('{') && is_guid(&sanitize_guid(text)) => {
                Some(Line::from(sanitize_guid(text)))
            }
            _ => None,
        };
        Ok(line)
    })
}
