use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::tui::{ui::components::error_msg::ui_error_set, App};

/// Application-level shortcuts handled before panels see a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleExplorer,
    Refresh,
    ToggleTheme,
    None,
}

pub fn map_key(key: &KeyEvent) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Action::Quit,
        KeyCode::Char('o') if ctrl => Action::ToggleExplorer,
        KeyCode::F(5) => Action::Refresh,
        KeyCode::F(2) => Action::ToggleTheme,
        _ => Action::None,
    }
}

pub fn handle_event(event: &Event, app: &mut App) {
    if let Event::Key(key) = event {
        if handle_key_event(key, app) {
            return;
        }
    }

    if !app.manager.dispatch(event) {
        log::trace!("Event not consumed: {event:?}");
    }
}

/// Returns true when the key was a global shortcut.
fn handle_key_event(key: &KeyEvent, app: &mut App) -> bool {
    match map_key(key) {
        Action::Quit => {
            log::info!("⌨️ Quit requested");
            app.quit = true;
        }
        Action::ToggleExplorer => app.toggle_explorer(),
        Action::Refresh => app.refresh(),
        Action::ToggleTheme => {
            if let Some(mode) = app.manager.focused().and_then(|panel| panel.toggle_theme()) {
                log::debug!("Focused panel switched to {mode}");
            }
        }
        Action::None => {
            if key.kind == KeyEventKind::Press && key.code == KeyCode::Esc {
                ui_error_set(&mut app.manager.document().write(), None);
            }
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(map_key(&ctrl('q')), Action::Quit);
        assert_eq!(map_key(&ctrl('c')), Action::Quit);
        assert_eq!(map_key(&ctrl('o')), Action::ToggleExplorer);
        assert_eq!(map_key(&KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE)), Action::Refresh);
        assert_eq!(map_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)), Action::None);
    }
}
