pub mod explorer;
pub mod input;
pub mod ui;

use anyhow::{anyhow, Result};
use ratatui::{backend::CrosstermBackend, prelude::*};
use std::{io, path::PathBuf, sync::Arc, time::Duration};

use crate::{
    core::{
        bus::{spawn_core, Bus, CoreToUi, UiToCore},
        config::Settings,
        persistence::Preferences,
    },
    grid::ExportContext,
    panel::{geometry::Corner, theme::ThemeChoice, PanelManager},
    source::DataSource,
};
use explorer::Explorer;

/// How the terminal session starts.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub title: String,
    pub open_on_start: bool,
    pub export: ExportContext,
    pub out_dir: PathBuf,
    pub theme: Option<ThemeChoice>,
    pub position: Option<Corner>,
}

impl LaunchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            title: explorer::EXPLORER_TITLE.to_string(),
            open_on_start: true,
            export: settings.export.context(),
            out_dir: settings.export.out_dir.clone(),
            theme: None,
            position: None,
        }
    }
}

pub struct App {
    pub manager: PanelManager,
    pub bus: Bus,
    pub explorer: Explorer,
    pub source_label: String,
    pub quit: bool,
}

impl App {
    pub fn new(manager: PanelManager, bus: Bus, launch: &LaunchOptions, source_label: String) -> Self {
        let explorer = Explorer::new(launch.title.clone(), launch.export.clone(), launch.out_dir.clone())
            .with_theme(launch.theme)
            .with_position(launch.position);
        Self {
            manager,
            bus,
            explorer,
            source_label,
            quit: false,
        }
    }

    pub fn toggle_explorer(&mut self) {
        self.explorer.toggle(&self.manager, &self.bus);
    }

    pub fn refresh(&mut self) {
        if self.explorer.is_open() {
            self.explorer.refresh(&self.manager, &self.bus);
        }
    }

    /// Drain finished work from the core thread.
    pub fn pump_core(&mut self) {
        while let Ok(message) = self.bus.core_rx.try_recv() {
            match message {
                CoreToUi::Loaded {
                    request,
                    panel,
                    outcome,
                } => self.explorer.on_loaded(request, panel, outcome),
                CoreToUi::Quit => {
                    log::info!("⚙️ Core signalled quit");
                    self.quit = true;
                }
            }
        }
    }

    /// Hand events raised by panels to the feature that owns them.
    pub fn process_panel_events(&mut self) {
        for event in self.manager.drain_events() {
            if !self.explorer.on_event(&event, &self.manager, &self.bus) {
                log::debug!("Unhandled panel event {event:?}");
            }
        }
    }
}

pub fn start(
    settings: &Settings,
    prefs: Preferences,
    source: Arc<dyn DataSource>,
    launch: LaunchOptions,
) -> Result<()> {
    log::info!("🚀 overlaykit TUI starting...");
    let source_label = source.describe();
    let (bus, core_handle) = spawn_core(source)?;

    // Setup terminal
    let mut stdout = io::stdout();
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let manager = PanelManager::new(prefs, settings.feature.clone(), size)
        .with_defaults(settings.panel.clone());
    let mut app = App::new(manager, bus.clone(), &launch, source_label);
    if launch.open_on_start {
        app.toggle_explorer();
    }

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    app.manager.shut_down();
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if bus.ui_tx.send(UiToCore::Quit).is_err() {
        log::warn!("Core thread already gone");
    }
    core_handle
        .join()
        .map_err(|_| anyhow!("core thread panicked"))??;

    log::info!("👋 overlaykit TUI stopped");
    res
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            if let Err(err) = ui::render_ui(frame, app) {
                log::error!("Render failed: {err:#}");
            }
        })?;

        app.pump_core();
        if app.quit {
            break;
        }

        if crossterm::event::poll(Duration::from_millis(100))? {
            let event = crossterm::event::read()?;
            input::handle_event(&event, app);
        }
        app.process_panel_events();

        if app.quit {
            break;
        }
    }

    terminal.clear()?;
    Ok(())
}
