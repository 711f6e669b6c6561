//! Keyboard and mouse routing inside the document.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Size};

use super::{
    document::{BodyContent, Document, ListenerKind, ListenerTarget, PanelEvent, PanelId, Teardown},
    theme::ThemeMode,
};

const PAGE_ROWS: isize = 10;
const WHEEL_ROWS: isize = 3;

/// Outcome of routing one terminal event.
#[derive(Default)]
pub struct Dispatch {
    pub consumed: bool,
    pub teardowns: Vec<Teardown>,
    /// Theme flips made through a footer toggle, to be persisted.
    pub theme_changes: Vec<(Option<String>, ThemeMode)>,
}

impl Dispatch {
    fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::default()
        }
    }
}

impl Document {
    pub(crate) fn handle_event(&mut self, event: &Event) -> Dispatch {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key),
            Event::Mouse(mouse) => self.on_mouse(mouse),
            Event::Resize(width, height) => {
                self.resize(Size::new(*width, *height));
                Dispatch::consumed()
            }
            _ => Dispatch::default(),
        }
    }

    fn on_key(&mut self, key: &KeyEvent) -> Dispatch {
        if key.code == KeyCode::Esc {
            let mut owners: Vec<PanelId> = self
                .listeners()
                .iter()
                .filter(|l| l.target == ListenerTarget::Document && l.kind == ListenerKind::KeyDown)
                .map(|l| l.owner)
                .collect();
            owners.dedup();
            let teardowns: Vec<Teardown> =
                owners.into_iter().filter_map(|id| self.detach(id)).collect();
            return Dispatch {
                consumed: !teardowns.is_empty(),
                teardowns,
                ..Dispatch::default()
            };
        }

        let Some(id) = self.focused() else {
            return Dispatch::default();
        };
        let Some(grid) = self.node_mut(id).and_then(|node| node.body.grid_mut()) else {
            return Dispatch::default();
        };

        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        let handled = match key.code {
            KeyCode::Up => {
                grid.move_cursor(-1);
                true
            }
            KeyCode::Down => {
                grid.move_cursor(1);
                true
            }
            KeyCode::PageUp => {
                grid.move_cursor(-PAGE_ROWS);
                true
            }
            KeyCode::PageDown => {
                grid.move_cursor(PAGE_ROWS);
                true
            }
            KeyCode::Home => {
                grid.move_cursor(isize::MIN);
                true
            }
            KeyCode::End => {
                grid.move_cursor(isize::MAX);
                true
            }
            KeyCode::Left if shift => grid.shift_cursor_column(-1),
            KeyCode::Right if shift => grid.shift_cursor_column(1),
            KeyCode::Left => {
                grid.move_cursor_column(-1);
                true
            }
            KeyCode::Right => {
                grid.move_cursor_column(1);
                true
            }
            KeyCode::Enter => grid.sort_cursor_column(),
            KeyCode::Backspace if grid.options().searchable => grid.pop_filter_char(),
            KeyCode::Delete if grid.options().searchable => {
                grid.clear_filter();
                true
            }
            KeyCode::Char(ch) if plain && grid.options().searchable => {
                grid.push_filter_char(ch);
                true
            }
            _ => false,
        };
        if handled {
            self.sync_footer(id);
        }
        Dispatch {
            consumed: handled,
            ..Dispatch::default()
        }
    }

    fn on_mouse(&mut self, mouse: &MouseEvent) -> Dispatch {
        let position = Position {
            x: mouse.column,
            y: mouse.row,
        };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.on_press(position),
            MouseEventKind::Drag(MouseButton::Left) => self.on_move(position),
            MouseEventKind::Up(MouseButton::Left) => self.on_release(position),
            MouseEventKind::ScrollDown => self.on_wheel(position, WHEEL_ROWS),
            MouseEventKind::ScrollUp => self.on_wheel(position, -WHEEL_ROWS),
            _ => Dispatch::default(),
        }
    }

    fn on_press(&mut self, position: Position) -> Dispatch {
        let Some(id) = self.panel_at(position.x, position.y) else {
            return Dispatch::default();
        };
        self.raise(id);
        let Some(layout) = self.layout_of(id) else {
            return Dispatch::default();
        };
        let mut dispatch = Dispatch::consumed();

        if layout.close.contains(position) {
            dispatch.teardowns.extend(self.detach(id));
            return dispatch;
        }

        if layout.header.contains(position) {
            if let Some(node) = self.node_mut(id) {
                if node.draggable {
                    node.drag.begin(layout.area, position);
                }
            }
            return dispatch;
        }

        if layout.theme_toggle.is_some_and(|rect| rect.contains(position)) {
            if let Some(node) = self.node_mut(id) {
                node.theme = node.theme.toggled();
                let mode = node.theme;
                dispatch.theme_changes.push((node.key.clone(), mode));
                self.events.push(PanelEvent::ThemeChanged { panel: id, mode });
            }
            return dispatch;
        }

        if let Some((button, _)) = layout.buttons.iter().find(|(_, rect)| rect.contains(position)) {
            let enabled = self
                .node(id)
                .and_then(|node| node.footer.as_ref())
                .and_then(|footer| footer.buttons.iter().find(|b| &b.id == button))
                .is_some_and(|b| b.enabled);
            if enabled {
                self.events.push(PanelEvent::FooterButton {
                    panel: id,
                    button: button.clone(),
                });
            }
            return dispatch;
        }

        if layout.body.contains(position) {
            let Some(node) = self.node_mut(id) else {
                return dispatch;
            };
            let BodyContent::Grid(grid) = &mut node.body else {
                return dispatch;
            };
            let grid_layout = grid.layout(layout.body);
            if grid_layout.is_clear(position) {
                grid.clear_filter();
                self.sync_footer(id);
            } else if let Some(format) = grid_layout.export_at(position) {
                self.events.push(PanelEvent::Export { panel: id, format });
            } else if let Some(column) = grid_layout.column_at(position) {
                grid.press_header(column);
                self.grid_press = Some(id);
            }
        }
        dispatch
    }

    fn on_move(&mut self, position: Position) -> Dispatch {
        let mut dispatch = Dispatch::default();
        let viewport = self.viewport();

        let dragging: Vec<PanelId> = self
            .panels()
            .iter()
            .filter(|node| node.drag.is_active())
            .map(|node| node.id)
            .filter(|&id| self.has_listener(id, ListenerTarget::Window, ListenerKind::MouseMove))
            .collect();
        for id in dragging {
            let Some(area) = self.layout_of(id).map(|layout| layout.area) else {
                continue;
            };
            if let Some(node) = self.node_mut(id) {
                if let Some(anchor) =
                    node.drag
                        .follow(position, Size::new(area.width, area.height), viewport)
                {
                    node.anchor = anchor;
                    dispatch.consumed = true;
                }
            }
        }

        if let Some(id) = self.grid_press {
            if let Some(body) = self.layout_of(id).map(|layout| layout.body) {
                if let Some(grid) = self.node_mut(id).and_then(|node| node.body.grid_mut()) {
                    let column = grid.layout(body).column_at(position);
                    grid.hover_header(column);
                    dispatch.consumed = true;
                }
            }
        }
        dispatch
    }

    fn on_release(&mut self, position: Position) -> Dispatch {
        let mut dispatch = Dispatch::default();
        let releasing: Vec<PanelId> = self
            .panels()
            .iter()
            .filter(|node| node.drag.is_active())
            .map(|node| node.id)
            .filter(|&id| self.has_listener(id, ListenerTarget::Window, ListenerKind::MouseUp))
            .collect();
        for id in releasing {
            if let Some(node) = self.node_mut(id) {
                node.drag.end();
                dispatch.consumed = true;
            }
        }

        if let Some(id) = self.grid_press.take() {
            if let Some(body) = self.layout_of(id).map(|layout| layout.body) {
                if let Some(grid) = self.node_mut(id).and_then(|node| node.body.grid_mut()) {
                    let column = grid.layout(body).column_at(position);
                    grid.release_header(column);
                    dispatch.consumed = true;
                }
            }
            self.sync_footer(id);
        }
        dispatch
    }

    fn on_wheel(&mut self, position: Position, rows: isize) -> Dispatch {
        let Some(id) = self.panel_at(position.x, position.y) else {
            return Dispatch::default();
        };
        match self.node_mut(id).and_then(|node| node.body.grid_mut()) {
            Some(grid) => {
                grid.move_cursor(rows);
                Dispatch::consumed()
            }
            None => Dispatch::consumed(),
        }
    }
}
