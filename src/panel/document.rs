//! The host document: every attached panel in z-order, the listeners they
//! registered and their style blocks.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use ratatui::layout::{Rect, Size};
use std::{collections::BTreeMap, fmt, sync::Arc};
use unicode_width::UnicodeWidthStr;

use super::{
    geometry::{Anchor, CssLength, DragState},
    style::StyleSheet,
    theme::{ColorScheme, Palette, ThemeMode},
};
use crate::grid::{ExportFormat, Grid};

pub type SharedDocument = Arc<RwLock<Document>>;
pub type CloseCallback = Arc<dyn Fn() + Send + Sync>;
pub type ToggleCallback = Arc<dyn Fn(bool) + Send + Sync>;

pub const CLOSE_GLYPH: &str = "[×]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PanelId(pub u64);

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Document,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    KeyDown,
    MouseMove,
    MouseUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    pub id: u64,
    pub target: ListenerTarget,
    pub kind: ListenerKind,
    pub owner: PanelId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterButton {
    pub id: String,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footer {
    pub text: String,
    pub buttons: Vec<FooterButton>,
}

#[derive(Debug, Default)]
pub enum BodyContent {
    #[default]
    Empty,
    Text(Vec<String>),
    Loading(String),
    Error(String),
    Grid(Box<Grid>),
}

impl BodyContent {
    pub fn preferred_height(&self) -> u16 {
        match self {
            BodyContent::Text(lines) => lines.len().clamp(1, u16::MAX as usize) as u16,
            BodyContent::Grid(grid) => grid.preferred_height(),
            _ => 1,
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        match self {
            BodyContent::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn grid_mut(&mut self) -> Option<&mut Grid> {
        match self {
            BodyContent::Grid(grid) => Some(grid),
            _ => None,
        }
    }
}

pub struct PanelNode {
    pub id: PanelId,
    pub key: Option<String>,
    pub title: String,
    pub anchor: Anchor,
    pub width: u16,
    pub max_height: CssLength,
    pub theme: ThemeMode,
    pub draggable: bool,
    pub style_id: Option<String>,
    pub body: BodyContent,
    pub footer: Option<Footer>,
    pub drag: DragState,
    /// Style block this panel registered and removes on teardown.
    pub(crate) owned_style: Option<String>,
    pub(crate) on_close: Option<CloseCallback>,
    pub(crate) on_toggle: Option<ToggleCallback>,
}

impl fmt::Debug for PanelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelNode")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("title", &self.title)
            .field("anchor", &self.anchor)
            .field("theme", &self.theme)
            .field("body", &self.body)
            .field("footer", &self.footer)
            .finish()
    }
}

/// Events the document produces for feature code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    FooterButton { panel: PanelId, button: String },
    Export { panel: PanelId, format: ExportFormat },
    ThemeChanged { panel: PanelId, mode: ThemeMode },
    Closed { panel: PanelId, key: Option<String> },
}

/// Page-level message bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// Callbacks of a detached panel, run once the document lock is released.
pub struct Teardown {
    pub panel: PanelId,
    pub key: Option<String>,
    on_close: Option<CloseCallback>,
    on_toggle: Option<ToggleCallback>,
}

impl Teardown {
    pub fn run(self) {
        if let Some(on_close) = self.on_close {
            on_close();
        }
        if let Some(on_toggle) = self.on_toggle {
            on_toggle(false);
        }
    }
}

/// Screen areas of one panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    pub area: Rect,
    pub header: Rect,
    pub close: Rect,
    pub body: Rect,
    pub footer: Option<Rect>,
    pub theme_toggle: Option<Rect>,
    pub buttons: Vec<(String, Rect)>,
}

pub struct Document {
    viewport: Size,
    available: bool,
    panels: Vec<PanelNode>,
    listeners: Vec<Listener>,
    styles: BTreeMap<String, StyleSheet>,
    next_id: u64,
    pub(crate) events: Vec<PanelEvent>,
    alert: Option<Alert>,
    colors: Option<ColorScheme>,
    pub(crate) grid_press: Option<PanelId>,
}

impl Document {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            available: true,
            panels: Vec::new(),
            listeners: Vec::new(),
            styles: BTreeMap::new(),
            next_id: 1,
            events: Vec::new(),
            alert: None,
            colors: None,
            grid_press: None,
        }
    }

    pub fn shared(viewport: Size) -> SharedDocument {
        Arc::new(RwLock::new(Self::new(viewport)))
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// The document can host panels: not shut down and not zero-sized.
    pub fn is_available(&self) -> bool {
        self.available && self.viewport.width > 0 && self.viewport.height > 0
    }

    pub(crate) fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Attached panels, bottom first.
    pub fn panels(&self) -> &[PanelNode] {
        &self.panels
    }

    pub fn node(&self, id: PanelId) -> Option<&PanelNode> {
        self.panels.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: PanelId) -> Option<&mut PanelNode> {
        self.panels.iter_mut().find(|node| node.id == id)
    }

    pub fn find_key(&self, key: &str) -> Option<PanelId> {
        self.panels
            .iter()
            .find(|node| node.key.as_deref() == Some(key))
            .map(|node| node.id)
    }

    /// Topmost panel, which also has keyboard focus.
    pub fn focused(&self) -> Option<PanelId> {
        self.panels.last().map(|node| node.id)
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn has_listener(&self, owner: PanelId, target: ListenerTarget, kind: ListenerKind) -> bool {
        self.listeners
            .iter()
            .any(|l| l.owner == owner && l.target == target && l.kind == kind)
    }

    pub fn style(&self, style_id: &str) -> Option<&StyleSheet> {
        self.styles.get(style_id)
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn set_alert(&mut self, alert: Option<Alert>) {
        self.alert = alert;
    }

    pub fn colors(&self) -> Option<&ColorScheme> {
        self.colors.as_ref()
    }

    pub fn set_colors(&mut self, colors: Option<ColorScheme>) {
        self.colors = colors;
    }

    pub(crate) fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn attach(&mut self, node: PanelNode) {
        log::debug!("📌 Attached panel {} ({:?})", node.id, node.title);
        self.panels.push(node);
    }

    pub(crate) fn add_listener(&mut self, owner: PanelId, target: ListenerTarget, kind: ListenerKind) {
        let id = self.allocate_id();
        self.listeners.push(Listener {
            id,
            target,
            kind,
            owner,
        });
    }

    pub(crate) fn add_style(&mut self, sheet: StyleSheet) {
        self.styles.insert(sheet.id.clone(), sheet);
    }

    /// Remove a panel with its listeners and style block. `None` when it
    /// is already gone, which makes every close path idempotent.
    pub(crate) fn detach(&mut self, id: PanelId) -> Option<Teardown> {
        let index = self.panels.iter().position(|node| node.id == id)?;
        let node = self.panels.remove(index);
        self.listeners.retain(|listener| listener.owner != id);
        if let Some(style_id) = &node.owned_style {
            self.styles.remove(style_id);
        }
        if self.grid_press == Some(id) {
            self.grid_press = None;
        }
        self.events.push(PanelEvent::Closed {
            panel: id,
            key: node.key.clone(),
        });
        log::debug!("🗑️ Detached panel {id} ({:?})", node.title);
        Some(Teardown {
            panel: id,
            key: node.key,
            on_close: node.on_close,
            on_toggle: node.on_toggle,
        })
    }

    pub(crate) fn detach_all(&mut self) -> Vec<Teardown> {
        let ids: Vec<PanelId> = self.panels.iter().rev().map(|node| node.id).collect();
        ids.into_iter().filter_map(|id| self.detach(id)).collect()
    }

    pub(crate) fn raise(&mut self, id: PanelId) {
        if let Some(index) = self.panels.iter().position(|node| node.id == id) {
            let node = self.panels.remove(index);
            self.panels.push(node);
        }
    }

    /// Mirror a grid body's counts into the footer text.
    pub(crate) fn sync_footer(&mut self, id: PanelId) {
        if let Some(node) = self.node_mut(id) {
            if let (Some(grid), Some(footer)) = (node.body.grid(), node.footer.as_mut()) {
                footer.text = grid.summary();
            }
        }
    }

    pub fn palette_for(&self, node: &PanelNode) -> Palette {
        let mut palette = node.theme.palette();
        if let Some(colors) = &self.colors {
            colors.apply(node.theme, &mut palette);
        }
        if let Some(sheet) = node.style_id.as_deref().and_then(|id| self.styles.get(id)) {
            sheet.apply(&mut palette);
        }
        palette
    }

    pub fn layout_of(&self, id: PanelId) -> Option<PanelLayout> {
        self.node(id).map(|node| self.layout(node))
    }

    pub fn layout(&self, node: &PanelNode) -> PanelLayout {
        let viewport = self.viewport;
        let width = node.width.min(viewport.width).max(8.min(viewport.width));
        let footer_rows = u16::from(node.footer.is_some());
        let wanted = 2u16
            .saturating_add(footer_rows)
            .saturating_add(node.body.preferred_height());
        let cap = node.max_height.resolve(viewport.height);
        let height = wanted.min(cap).max(3 + footer_rows).min(viewport.height);

        let origin = node.anchor.origin(Size::new(width, height), viewport);
        let area = Rect::new(origin.x, origin.y, width, height);
        let header = Rect::new(area.x, area.y, area.width, 1.min(area.height));
        let close_width = CLOSE_GLYPH.width() as u16;
        let close = Rect::new(
            area.right().saturating_sub(close_width + 1).max(area.x),
            area.y,
            close_width.min(area.width),
            1.min(area.height),
        );

        let inner = Rect::new(
            area.x.saturating_add(1),
            area.y.saturating_add(1),
            area.width.saturating_sub(2),
            area.height.saturating_sub(2),
        );
        let (body, footer) = if footer_rows > 0 && inner.height > 0 {
            (
                Rect { height: inner.height - 1, ..inner },
                Some(Rect::new(inner.x, inner.bottom() - 1, inner.width, 1)),
            )
        } else {
            (inner, None)
        };

        let mut theme_toggle = None;
        let mut buttons = Vec::new();
        if let (Some(rect), Some(footer_data)) = (footer, node.footer.as_ref()) {
            let mut right = rect.right();
            let toggle_width = node.theme.toggle_label().width() as u16 + 2;
            if toggle_width <= rect.width {
                right -= toggle_width;
                theme_toggle = Some(Rect::new(right, rect.y, toggle_width, 1));
            }
            for button in footer_data.buttons.iter().rev() {
                let width = button.label.width() as u16 + 2;
                if right < rect.x + width + 1 {
                    break;
                }
                right -= width + 1;
                buttons.push((button.id.clone(), Rect::new(right, rect.y, width, 1)));
            }
            buttons.reverse();
        }

        PanelLayout {
            area,
            header,
            close,
            body,
            footer,
            theme_toggle,
            buttons,
        }
    }

    /// Topmost panel whose frame contains the given cell.
    pub fn panel_at(&self, x: u16, y: u16) -> Option<PanelId> {
        self.panels
            .iter()
            .rev()
            .find(|node| {
                self.layout(node)
                    .area
                    .contains(ratatui::layout::Position { x, y })
            })
            .map(|node| node.id)
    }
}
