//! Floating panel manager.
//!
//! Feature modules ask a [`PanelManager`] for a panel and get back a
//! [`PanelHandle`] with body/header/footer regions. A keyed panel exists
//! at most once per document; asking for it again closes it (toggle).

pub mod document;
pub mod events;
pub mod geometry;
pub mod style;
pub mod theme;

use anyhow::Result;
use chrono::Local;
use ratatui::layout::Size;
use std::sync::Arc;

use crate::{
    core::{
        config::PanelDefaults,
        error::OverlayError,
        persistence::{panel_theme_key, Preferences},
    },
    grid::{CellValue, Grid, GridOptions},
};
use document::{
    Alert, BodyContent, CloseCallback, Document, Footer, FooterButton, ListenerKind,
    ListenerTarget, PanelEvent, PanelId, PanelNode, SharedDocument, Teardown, ToggleCallback,
};
use geometry::{Anchor, Corner, CssLength, DragState};
use style::StyleSheet;
use theme::{resolve_theme, ColorScheme, ThemeChoice, ThemeMode};

/// Options of [`PanelManager::create_panel`]. Unset values fall back to
/// the manager's [`PanelDefaults`].
#[derive(Clone)]
pub struct PanelOptions {
    pub key: Option<String>,
    pub style_id: Option<String>,
    pub position: Option<Corner>,
    pub top: Option<u16>,
    pub right: Option<u16>,
    pub left: Option<u16>,
    pub bottom: Option<u16>,
    pub width: Option<u16>,
    pub max_height: Option<CssLength>,
    pub theme: Option<ThemeChoice>,
    /// Defaults to true for keyed panels. Never applies without a key.
    pub toggle: Option<bool>,
    pub esc_key: bool,
    pub draggable: bool,
    pub footer: bool,
    pub footer_text: Option<String>,
    pub on_close: Option<CloseCallback>,
    pub on_toggle: Option<ToggleCallback>,
    pub custom_styles: Option<String>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            key: None,
            style_id: None,
            position: None,
            top: None,
            right: None,
            left: None,
            bottom: None,
            width: None,
            max_height: None,
            theme: None,
            toggle: None,
            esc_key: true,
            draggable: true,
            footer: true,
            footer_text: None,
            on_close: None,
            on_toggle: None,
            custom_styles: None,
        }
    }
}

impl PanelOptions {
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn position(mut self, corner: Corner) -> Self {
        self.position = Some(corner);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn max_height(mut self, max_height: CssLength) -> Self {
        self.max_height = Some(max_height);
        self
    }

    pub fn theme(mut self, theme: ThemeChoice) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn toggle(mut self, toggle: bool) -> Self {
        self.toggle = Some(toggle);
        self
    }

    pub fn footer_text(mut self, text: impl Into<String>) -> Self {
        self.footer_text = Some(text.into());
        self
    }

    pub fn styles(mut self, style_id: impl Into<String>, css: impl Into<String>) -> Self {
        self.style_id = Some(style_id.into());
        self.custom_styles = Some(css.into());
        self
    }

    pub fn on_close(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(callback));
        self
    }

    pub fn on_toggle(mut self, callback: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_toggle = Some(Arc::new(callback));
        self
    }

    fn explicit_anchor(&self) -> Anchor {
        Anchor {
            top: self.top,
            right: self.right,
            left: self.left,
            bottom: self.bottom,
        }
    }
}

/// Owner of the document. Cheap to clone; clones share the same panels.
#[derive(Clone)]
pub struct PanelManager {
    doc: SharedDocument,
    prefs: Preferences,
    feature: String,
    defaults: PanelDefaults,
    system_dark: bool,
}

impl PanelManager {
    pub fn new(prefs: Preferences, feature: impl Into<String>, viewport: Size) -> Self {
        Self {
            doc: Document::shared(viewport),
            prefs,
            feature: feature.into(),
            defaults: PanelDefaults::default(),
            system_dark: theme::system_prefers_dark(),
        }
    }

    pub fn with_defaults(mut self, defaults: PanelDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_system_dark(mut self, dark: bool) -> Self {
        self.system_dark = dark;
        self
    }

    pub fn document(&self) -> SharedDocument {
        Arc::clone(&self.doc)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn resize(&self, viewport: Size) {
        self.doc.write().resize(viewport);
    }

    /// Create a panel, or close the existing keyed instance when toggling.
    ///
    /// Returns `Ok(None)` when an existing instance was toggled off.
    pub fn create_panel(
        &self,
        title: &str,
        options: PanelOptions,
    ) -> Result<Option<PanelHandle>, OverlayError> {
        let key = options.key.clone();
        let toggle = key.is_some() && options.toggle.unwrap_or(true);
        let mode = resolve_theme(
            options.theme.unwrap_or(self.defaults.theme),
            key.as_deref(),
            &self.feature,
            &self.prefs,
            self.system_dark,
        );
        let colors = ColorScheme::load(&self.prefs, &self.feature);

        let mut teardowns: Vec<Teardown> = Vec::new();
        let created = {
            let mut doc = self.doc.write();
            if !doc.is_available() {
                return Err(OverlayError::environment("document"));
            }

            let existing = key.as_deref().and_then(|key| doc.find_key(key));
            if let Some(existing) = existing {
                teardowns.extend(doc.detach(existing));
            }

            if existing.is_some() && toggle {
                None
            } else {
                doc.set_colors(colors);
                Some(self.attach(&mut doc, title, &options, mode))
            }
        };

        for teardown in teardowns {
            teardown.run();
        }

        match created {
            Some(handle) => {
                if let Some(on_toggle) = &options.on_toggle {
                    on_toggle(true);
                }
                log::info!("🪟 Opened panel {:?} {}", title, handle.id());
                Ok(Some(handle))
            }
            None => {
                log::info!("🪟 Toggled off panel {:?}", title);
                Ok(None)
            }
        }
    }

    fn attach(
        &self,
        doc: &mut Document,
        title: &str,
        options: &PanelOptions,
        mode: ThemeMode,
    ) -> PanelHandle {
        let id = PanelId(doc.allocate_id());
        let explicit = options.explicit_anchor();
        let anchor = if explicit.is_unset() {
            options
                .position
                .unwrap_or(self.defaults.position)
                .default_anchor()
        } else {
            explicit
        };

        let owned_style = match (&options.style_id, &options.custom_styles) {
            (Some(style_id), Some(css)) => {
                doc.add_style(StyleSheet::parse(style_id.clone(), css.clone()));
                Some(style_id.clone())
            }
            _ => None,
        };

        doc.attach(PanelNode {
            id,
            key: options.key.clone(),
            title: title.to_string(),
            anchor,
            width: options.width.unwrap_or(self.defaults.width),
            max_height: options.max_height.unwrap_or(self.defaults.max_height),
            theme: mode,
            draggable: options.draggable,
            style_id: options.style_id.clone(),
            body: BodyContent::Empty,
            footer: options.footer.then(|| Footer {
                text: options.footer_text.clone().unwrap_or_default(),
                buttons: Vec::new(),
            }),
            drag: DragState::default(),
            owned_style,
            on_close: options.on_close.clone(),
            on_toggle: options.on_toggle.clone(),
        });

        if options.esc_key {
            doc.add_listener(id, ListenerTarget::Document, ListenerKind::KeyDown);
        }
        if options.draggable {
            doc.add_listener(id, ListenerTarget::Window, ListenerKind::MouseMove);
            doc.add_listener(id, ListenerTarget::Window, ListenerKind::MouseUp);
        }

        PanelHandle {
            id,
            key: options.key.clone(),
            has_footer: options.footer,
            doc: Arc::clone(&self.doc),
            prefs: self.prefs.clone(),
        }
    }

    /// Route a terminal event. Returns true when a panel consumed it.
    pub fn dispatch(&self, event: &crossterm::event::Event) -> bool {
        let dispatch = self.doc.write().handle_event(event);
        for (key, mode) in &dispatch.theme_changes {
            if let Some(key) = key {
                self.prefs.set(&panel_theme_key(key), &mode.to_string());
            }
        }
        for teardown in dispatch.teardowns {
            teardown.run();
        }
        dispatch.consumed
    }

    pub fn drain_events(&self) -> Vec<PanelEvent> {
        std::mem::take(&mut self.doc.write().events)
    }

    pub fn panel(&self, key: &str) -> Option<PanelHandle> {
        let doc = self.doc.read();
        let id = doc.find_key(key)?;
        self.handle_for(&doc, id)
    }

    pub fn focused(&self) -> Option<PanelHandle> {
        let doc = self.doc.read();
        let id = doc.focused()?;
        self.handle_for(&doc, id)
    }

    fn handle_for(&self, doc: &Document, id: PanelId) -> Option<PanelHandle> {
        let node = doc.node(id)?;
        Some(PanelHandle {
            id,
            key: node.key.clone(),
            has_footer: node.footer.is_some(),
            doc: Arc::clone(&self.doc),
            prefs: self.prefs.clone(),
        })
    }

    pub fn panel_count(&self) -> usize {
        self.doc.read().panels().len()
    }

    pub fn set_alert(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("📢 {message}");
        self.doc.write().set_alert(Some(Alert {
            message,
            timestamp: Local::now(),
        }));
    }

    pub fn clear_alert(&self) {
        self.doc.write().set_alert(None);
    }

    /// Persist a feature color scheme and apply it to open panels.
    pub fn save_color_scheme(&self, scheme: &ColorScheme) -> Result<()> {
        scheme.save(&self.prefs, &self.feature)?;
        self.doc.write().set_colors(Some(scheme.clone()));
        Ok(())
    }

    /// Close every panel and refuse new ones.
    pub fn shut_down(&self) {
        let teardowns = {
            let mut doc = self.doc.write();
            doc.set_available(false);
            doc.detach_all()
        };
        for teardown in teardowns {
            teardown.run();
        }
    }
}

/// Handle to one panel instance. Operations on a closed panel do nothing.
#[derive(Clone)]
pub struct PanelHandle {
    id: PanelId,
    key: Option<String>,
    has_footer: bool,
    doc: SharedDocument,
    prefs: Preferences,
}

impl PanelHandle {
    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_attached(&self) -> bool {
        self.doc.read().node(self.id).is_some()
    }

    pub fn body(&self) -> BodyRegion {
        BodyRegion {
            panel: self.id,
            doc: Arc::clone(&self.doc),
        }
    }

    pub fn header(&self) -> HeaderRegion {
        HeaderRegion {
            panel: self.id,
            doc: Arc::clone(&self.doc),
        }
    }

    pub fn footer(&self) -> Option<FooterRegion> {
        self.has_footer.then(|| FooterRegion {
            panel: self.id,
            doc: Arc::clone(&self.doc),
        })
    }

    /// Tear the panel down. Safe to call any number of times.
    pub fn close(&self) {
        let teardown = self.doc.write().detach(self.id);
        if let Some(teardown) = teardown {
            teardown.run();
        }
    }

    pub fn update_footer(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        with_node(&self.doc, self.id, |node| match node.footer.as_mut() {
            Some(footer) => {
                footer.text = text;
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    /// Switch palette without persisting the choice.
    pub fn update_theme(&self, mode: ThemeMode) -> bool {
        with_node(&self.doc, self.id, |node| node.theme = mode).is_some()
    }

    pub fn theme(&self) -> Option<ThemeMode> {
        self.doc.read().node(self.id).map(|node| node.theme)
    }

    /// Same as pressing the footer theme toggle.
    pub fn toggle_theme(&self) -> Option<ThemeMode> {
        let mode = with_node(&self.doc, self.id, |node| {
            node.theme = node.theme.toggled();
            node.theme
        })?;
        if let Some(key) = &self.key {
            self.prefs.set(&panel_theme_key(key), &mode.to_string());
        }
        self.doc.write().events.push(PanelEvent::ThemeChanged {
            panel: self.id,
            mode,
        });
        Some(mode)
    }
}

fn with_node<R>(
    doc: &SharedDocument,
    id: PanelId,
    f: impl FnOnce(&mut PanelNode) -> R,
) -> Option<R> {
    doc.write().node_mut(id).map(f)
}

pub struct BodyRegion {
    panel: PanelId,
    doc: SharedDocument,
}

impl BodyRegion {
    fn set(&self, content: BodyContent) -> bool {
        with_node(&self.doc, self.panel, |node| node.body = content).is_some()
    }

    pub fn set_text<I, S>(&self, lines: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(BodyContent::Text(lines.into_iter().map(Into::into).collect()))
    }

    pub fn set_loading(&self, message: impl Into<String>) -> bool {
        self.set(BodyContent::Loading(message.into()))
    }

    pub fn set_error(&self, message: impl Into<String>) -> bool {
        self.set(BodyContent::Error(message.into()))
    }

    pub fn clear(&self) -> bool {
        self.set(BodyContent::Empty)
    }

    /// Replace the body with a fresh grid. Any previous grid state is
    /// discarded.
    pub fn render_grid(
        &self,
        headers: Vec<String>,
        rows: Vec<Vec<CellValue>>,
        options: GridOptions,
    ) -> bool {
        if !self.is_attached() {
            return false;
        }
        let grid = Grid::new(headers, rows, options);
        let mut doc = self.doc.write();
        let Some(node) = doc.node_mut(self.panel) else {
            return false;
        };
        node.body = BodyContent::Grid(Box::new(grid));
        doc.sync_footer(self.panel);
        true
    }

    /// Run `f` on the body grid, then refresh the footer counts.
    pub fn with_grid<R>(&self, f: impl FnOnce(&mut Grid) -> R) -> Option<R> {
        let mut doc = self.doc.write();
        let result = doc
            .node_mut(self.panel)
            .and_then(|node| node.body.grid_mut())
            .map(f)?;
        doc.sync_footer(self.panel);
        Some(result)
    }

    pub fn with_content<R>(&self, f: impl FnOnce(&BodyContent) -> R) -> Option<R> {
        self.doc.read().node(self.panel).map(|node| f(&node.body))
    }

    pub fn is_attached(&self) -> bool {
        self.doc.read().node(self.panel).is_some()
    }
}

pub struct HeaderRegion {
    panel: PanelId,
    doc: SharedDocument,
}

impl HeaderRegion {
    pub fn set_title(&self, title: impl Into<String>) -> bool {
        let title = title.into();
        with_node(&self.doc, self.panel, |node| node.title = title).is_some()
    }

    pub fn title(&self) -> Option<String> {
        self.doc.read().node(self.panel).map(|node| node.title.clone())
    }
}

pub struct FooterRegion {
    panel: PanelId,
    doc: SharedDocument,
}

impl FooterRegion {
    fn with_footer<R>(&self, f: impl FnOnce(&mut Footer) -> R) -> Option<R> {
        with_node(&self.doc, self.panel, |node| node.footer.as_mut().map(f)).flatten()
    }

    pub fn set_text(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.with_footer(|footer| footer.text = text).is_some()
    }

    pub fn text(&self) -> Option<String> {
        self.doc
            .read()
            .node(self.panel)
            .and_then(|node| node.footer.as_ref())
            .map(|footer| footer.text.clone())
    }

    /// Add a feature button; a button with the same id is replaced.
    pub fn add_button(&self, id: impl Into<String>, label: impl Into<String>) -> bool {
        let button = FooterButton {
            id: id.into(),
            label: label.into(),
            enabled: true,
        };
        self.with_footer(|footer| {
            match footer.buttons.iter_mut().find(|b| b.id == button.id) {
                Some(existing) => *existing = button,
                None => footer.buttons.push(button),
            }
        })
        .is_some()
    }

    pub fn set_button_enabled(&self, id: &str, enabled: bool) -> bool {
        self.with_footer(|footer| {
            footer
                .buttons
                .iter_mut()
                .find(|b| b.id == id)
                .map(|b| b.enabled = enabled)
                .is_some()
        })
        .unwrap_or(false)
    }

    pub fn button_enabled(&self, id: &str) -> Option<bool> {
        self.doc
            .read()
            .node(self.panel)
            .and_then(|node| node.footer.as_ref())
            .and_then(|footer| footer.buttons.iter().find(|b| b.id == id))
            .map(|b| b.enabled)
    }
}
