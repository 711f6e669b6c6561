use anyhow::{anyhow, Result};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use parking_lot::Mutex;
use ratatui::layout::Size;
use std::sync::Arc;

use overlaykit::{
    core::persistence::Preferences,
    grid::text_row,
    panel::{
        document::{ListenerKind, ListenerTarget, PanelEvent},
        theme::{ThemeChoice, ThemeMode},
    },
    GridOptions, OverlayError, PanelManager, PanelOptions,
};

fn manager() -> PanelManager {
    PanelManager::new(Preferences::in_memory(), "explorer", Size::new(100, 30)).with_system_dark(false)
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
    Event::Mouse(MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

fn click(column: u16, row: u16) -> Event {
    mouse(MouseEventKind::Down(MouseButton::Left), column, row)
}

#[test]
fn test_keyed_panel_toggles() -> Result<()> {
    let manager = manager();

    let first = manager
        .create_panel("Explorer", PanelOptions::keyed("explorer"))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    assert_eq!(manager.panel_count(), 1);

    // Second request with the same key closes the open instance.
    assert!(manager
        .create_panel("Explorer", PanelOptions::keyed("explorer"))?
        .is_none());
    assert_eq!(manager.panel_count(), 0);
    assert!(!first.is_attached());

    let reopened = manager
        .create_panel("Explorer", PanelOptions::keyed("explorer"))?
        .ok_or_else(|| anyhow!("panel not reopened"))?;
    assert_eq!(manager.panel_count(), 1);
    assert_ne!(first.id(), reopened.id());
    Ok(())
}

#[test]
fn test_keyed_panel_without_toggle_is_replaced() -> Result<()> {
    let manager = manager();
    let first = manager
        .create_panel("One", PanelOptions::keyed("settings").toggle(false))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    let second = manager
        .create_panel("Two", PanelOptions::keyed("settings").toggle(false))?
        .ok_or_else(|| anyhow!("panel not replaced"))?;

    assert_eq!(manager.panel_count(), 1);
    assert!(!first.is_attached());
    assert_eq!(second.header().title().as_deref(), Some("Two"));
    Ok(())
}

#[test]
fn test_unkeyed_panels_stack() -> Result<()> {
    let manager = manager();
    manager.create_panel("A", PanelOptions::default())?;
    manager.create_panel("A", PanelOptions::default())?;
    assert_eq!(manager.panel_count(), 2);
    Ok(())
}

#[test]
fn test_escape_closes_panels() -> Result<()> {
    let manager = manager();
    manager.create_panel("A", PanelOptions::keyed("a"))?;
    let pinned = manager
        .create_panel(
            "B",
            PanelOptions {
                esc_key: false,
                ..PanelOptions::keyed("b")
            },
        )?
        .ok_or_else(|| anyhow!("panel not created"))?;

    assert!(manager.dispatch(&key(KeyCode::Esc)));
    assert_eq!(manager.panel_count(), 1);
    assert!(pinned.is_attached());

    // Nothing left that listens for Escape.
    assert!(!manager.dispatch(&key(KeyCode::Esc)));
    Ok(())
}

#[test]
fn test_close_is_idempotent_and_cleans_up() -> Result<()> {
    let manager = manager();
    let calls = Arc::new(Mutex::new(Vec::<String>::new()));
    let on_close = Arc::clone(&calls);
    let on_toggle = Arc::clone(&calls);

    let handle = manager
        .create_panel(
            "Styled",
            PanelOptions::keyed("styled")
                .styles("styled-css", ".panel { background: #102030; }")
                .on_close(move || on_close.lock().push("close".into()))
                .on_toggle(move |open| on_toggle.lock().push(format!("toggle:{open}"))),
        )?
        .ok_or_else(|| anyhow!("panel not created"))?;

    {
        let doc = manager.document();
        let doc = doc.read();
        assert_eq!(doc.style_count(), 1);
        assert!(doc.has_listener(handle.id(), ListenerTarget::Document, ListenerKind::KeyDown));
        assert!(doc.has_listener(handle.id(), ListenerTarget::Window, ListenerKind::MouseMove));
    }

    handle.close();
    handle.close();

    let doc = manager.document();
    let doc = doc.read();
    assert!(doc.panels().is_empty());
    assert!(doc.listeners().is_empty());
    assert_eq!(doc.style_count(), 0);
    assert_eq!(
        *calls.lock(),
        vec!["toggle:true".to_string(), "close".into(), "toggle:false".into()]
    );
    Ok(())
}

#[test]
fn test_closed_event_is_emitted_once() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("A", PanelOptions::keyed("a"))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    handle.close();
    handle.close();
    assert_eq!(
        manager.drain_events(),
        vec![PanelEvent::Closed {
            panel: handle.id(),
            key: Some("a".into()),
        }]
    );
    Ok(())
}

#[test]
fn test_unavailable_document() {
    let manager = PanelManager::new(Preferences::in_memory(), "explorer", Size::new(0, 0));
    assert!(matches!(
        manager.create_panel("A", PanelOptions::default()),
        Err(OverlayError::EnvironmentUnavailable { .. })
    ));

    let manager = self::manager();
    manager.shut_down();
    assert!(matches!(
        manager.create_panel("A", PanelOptions::default()),
        Err(OverlayError::EnvironmentUnavailable { .. })
    ));
    assert_eq!(manager.panel_count(), 0);
}

#[test]
fn test_operations_after_close_do_nothing() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("A", PanelOptions::default())?
        .ok_or_else(|| anyhow!("panel not created"))?;
    handle.close();

    assert!(!handle.body().set_text(["late"]));
    assert!(!handle.update_footer("late"));
    assert!(!handle.header().set_title("late"));
    assert!(!handle.update_theme(ThemeMode::Dark));
    assert!(handle.toggle_theme().is_none());
    Ok(())
}

#[test]
fn test_theme_toggle_click_is_persisted() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("Themed", PanelOptions::keyed("themed"))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    assert_eq!(handle.theme(), Some(ThemeMode::Light));

    let toggle = manager
        .document()
        .read()
        .layout_of(handle.id())
        .and_then(|layout| layout.theme_toggle)
        .ok_or_else(|| anyhow!("no theme toggle"))?;
    assert!(manager.dispatch(&click(toggle.x, toggle.y)));

    assert_eq!(handle.theme(), Some(ThemeMode::Dark));
    assert_eq!(
        manager.preferences().get("overlay-theme-themed").as_deref(),
        Some("dark")
    );
    assert!(manager.drain_events().contains(&PanelEvent::ThemeChanged {
        panel: handle.id(),
        mode: ThemeMode::Dark,
    }));

    // The stored choice wins when the panel comes back.
    handle.close();
    let reopened = manager
        .create_panel("Themed", PanelOptions::keyed("themed"))?
        .ok_or_else(|| anyhow!("panel not reopened"))?;
    assert_eq!(reopened.theme(), Some(ThemeMode::Dark));
    Ok(())
}

#[test]
fn test_explicit_theme_overrides_preference() -> Result<()> {
    let manager = manager();
    manager.preferences().set("overlay-theme-fixed", "dark");
    let handle = manager
        .create_panel("Fixed", PanelOptions::keyed("fixed").theme(ThemeChoice::Light))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    assert_eq!(handle.theme(), Some(ThemeMode::Light));
    Ok(())
}

#[test]
fn test_update_theme_is_not_persisted() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("A", PanelOptions::keyed("a"))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    assert!(handle.update_theme(ThemeMode::Dark));
    assert_eq!(manager.preferences().get("overlay-theme-a"), None);
    Ok(())
}

#[test]
fn test_drag_moves_and_clamps() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("Drag", PanelOptions::default().width(40))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    let area = |manager: &PanelManager| {
        manager
            .document()
            .read()
            .layout_of(handle.id())
            .map(|layout| layout.area)
    };

    let start = area(&manager).ok_or_else(|| anyhow!("no layout"))?;
    assert_eq!((start.x, start.y), (56, 2));

    let grab_x = start.x + 2;
    assert!(manager.dispatch(&click(grab_x, start.y)));
    assert!(manager.dispatch(&mouse(MouseEventKind::Drag(MouseButton::Left), grab_x - 20, 10)));
    let moved = area(&manager).ok_or_else(|| anyhow!("no layout"))?;
    assert_eq!((moved.x, moved.y), (36, 10));

    // Far outside the viewport: kept one cell inside.
    manager.dispatch(&mouse(MouseEventKind::Drag(MouseButton::Left), 0, 0));
    let clamped = area(&manager).ok_or_else(|| anyhow!("no layout"))?;
    assert_eq!((clamped.x, clamped.y), (1, 1));

    manager.dispatch(&mouse(MouseEventKind::Up(MouseButton::Left), 0, 0));
    manager.dispatch(&mouse(MouseEventKind::Drag(MouseButton::Left), 50, 20));
    let released = area(&manager).ok_or_else(|| anyhow!("no layout"))?;
    assert_eq!((released.x, released.y), (1, 1));
    Ok(())
}

#[test]
fn test_close_glyph_click() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("A", PanelOptions::default())?
        .ok_or_else(|| anyhow!("panel not created"))?;
    let close = manager
        .document()
        .read()
        .layout_of(handle.id())
        .map(|layout| layout.close)
        .ok_or_else(|| anyhow!("no layout"))?;
    assert!(manager.dispatch(&click(close.x + 1, close.y)));
    assert!(!handle.is_attached());
    Ok(())
}

#[test]
fn test_footer_button_click() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("A", PanelOptions::default())?
        .ok_or_else(|| anyhow!("panel not created"))?;
    let footer = handle.footer().ok_or_else(|| anyhow!("no footer"))?;
    assert!(footer.add_button("refresh", "Refresh"));

    let button = manager
        .document()
        .read()
        .layout_of(handle.id())
        .and_then(|layout| layout.buttons.first().map(|(_, rect)| *rect))
        .ok_or_else(|| anyhow!("no button"))?;

    manager.dispatch(&click(button.x, button.y));
    assert_eq!(
        manager.drain_events(),
        vec![PanelEvent::FooterButton {
            panel: handle.id(),
            button: "refresh".into(),
        }]
    );

    footer.set_button_enabled("refresh", false);
    manager.dispatch(&click(button.x, button.y));
    assert!(manager.drain_events().is_empty());
    Ok(())
}

#[test]
fn test_grid_keys_update_footer() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("Grid", PanelOptions::keyed("grid"))?
        .ok_or_else(|| anyhow!("panel not created"))?;
    assert!(handle.body().render_grid(
        vec!["Name".into()],
        vec![text_row(["alice"]), text_row(["bob"])],
        GridOptions::default().searchable(true),
    ));
    let footer = handle.footer().ok_or_else(|| anyhow!("no footer"))?;
    assert_eq!(footer.text().as_deref(), Some("2 result(s)"));

    manager.dispatch(&key(KeyCode::Char('b')));
    assert_eq!(footer.text().as_deref(), Some("1 of 2 result(s) shown"));

    manager.dispatch(&key(KeyCode::Backspace));
    assert_eq!(footer.text().as_deref(), Some("2 result(s)"));
    Ok(())
}

#[test]
fn test_no_footer_panel() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel(
            "Bare",
            PanelOptions {
                footer: false,
                ..PanelOptions::default()
            },
        )?
        .ok_or_else(|| anyhow!("panel not created"))?;
    assert!(handle.footer().is_none());
    assert!(!handle.update_footer("text"));
    Ok(())
}

#[test]
fn test_large_grid_layout_is_capped() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("Big", PanelOptions::default())?
        .ok_or_else(|| anyhow!("panel not created"))?;
    let rows = (0..70_000).map(|n| text_row([n.to_string()])).collect();
    assert!(handle
        .body()
        .render_grid(vec!["N".into()], rows, GridOptions::default().searchable(true)));

    let doc = manager.document();
    let layout = doc
        .read()
        .layout_of(handle.id())
        .ok_or_else(|| anyhow!("no layout"))?;
    // Capped by the max height, not collapsed to the minimum.
    assert!(layout.area.height > 4);
    assert!(layout.area.height <= 30);
    assert_eq!(handle.footer().and_then(|footer| footer.text()), Some("70000 result(s)".into()));
    Ok(())
}

#[test]
fn test_fresh_render_resets_grid_state() -> Result<()> {
    let manager = manager();
    let handle = manager
        .create_panel("Grid", PanelOptions::default())?
        .ok_or_else(|| anyhow!("panel not created"))?;
    let headers = || vec!["A".to_string(), "B".to_string()];
    let rows = || vec![text_row(["2", "x"]), text_row(["1", "y"])];
    let body = handle.body();

    assert!(body.render_grid(headers(), rows(), GridOptions::default()));
    body.with_grid(|grid| {
        grid.move_column(0, 1);
        grid.click_header(0);
    })
    .ok_or_else(|| anyhow!("no grid"))?;
    let (order, sort) = body
        .with_grid(|grid| (grid.column_order().to_vec(), grid.sort_key()))
        .ok_or_else(|| anyhow!("no grid"))?;
    assert_eq!(order, vec![1, 0]);
    assert!(sort.is_some());

    assert!(body.render_grid(headers(), rows(), GridOptions::default()));
    let (order, sort) = body
        .with_grid(|grid| (grid.column_order().to_vec(), grid.sort_key()))
        .ok_or_else(|| anyhow!("no grid"))?;
    assert_eq!(order, vec![0, 1]);
    assert_eq!(sort, None);
    Ok(())
}
