use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{path::PathBuf, str::FromStr, sync::Arc};

use overlaykit::{
    boot,
    core::{
        persistence::{set_no_cache, JsonFileStore, Preferences},
        Settings,
    },
    grid::{ExportFormat, Grid, GridOptions},
    panel::{
        geometry::Corner,
        theme::{ColorScheme, ThemeChoice},
    },
    source::{DataSource, JsonFileSource, RestSource},
    tui::{self, LaunchOptions},
};

const TOKEN_ENV: &str = "OVERLAYKIT_TOKEN";

fn cli() -> Command {
    Command::new("overlaykit")
        .about("Floating panels and a data grid for browsing tabular data in the terminal")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Settings file (defaults to ./overlaykit.toml when present)"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .short('d')
                .value_name("FILE")
                .help("Load rows from a JSON file")
                .conflicts_with("url"),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .value_name("BASE_URL")
                .help("Base URL of an OData service")
                .requires("entity-set"),
        )
        .arg(
            Arg::new("entity-set")
                .long("entity-set")
                .value_name("NAME")
                .help("Entity set queried under --url"),
        )
        .arg(
            Arg::new("select")
                .long("select")
                .value_name("COLUMNS")
                .help("Comma-separated columns to select"),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .value_name("EXPR")
                .help("Raw $filter expression"),
        )
        .arg(
            Arg::new("where")
                .long("where")
                .value_name("FIELD=VALUE")
                .action(ArgAction::Append)
                .requires("url")
                .help("Equality clause ANDed into $filter (GUID values are detected)"),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .value_name("TEXT")
                .help("Title of the explorer panel"),
        )
        .arg(
            Arg::new("theme")
                .long("theme")
                .value_name("auto|light|dark")
                .help("Theme of the explorer panel"),
        )
        .arg(
            Arg::new("position")
                .long("position")
                .value_name("CORNER")
                .help("top-left, top-right, bottom-left or bottom-right"),
        )
        .arg(
            Arg::new("no-config-cache")
                .long("no-config-cache")
                .help("Do not read or write the preference store")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("export")
                .long("export")
                .value_name("csv|json|md")
                .help("Write the dataset in this format and exit without the UI"),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .short('o')
                .value_name("DIR")
                .help("Directory exported files are written to"),
        )
        .arg(
            Arg::new("entity")
                .long("entity")
                .value_name("NAME")
                .help("Entity name used in export file names"),
        )
        .arg(
            Arg::new("tab")
                .long("tab")
                .value_name("NAME")
                .help("Tab name used in export file names"),
        )
        .arg(
            Arg::new("colors")
                .long("colors")
                .value_name("FILE")
                .help("Store a JSON color scheme for the feature and exit"),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let mut settings = Settings::load(matches.get_one::<String>("config").map(PathBuf::from).as_deref())?;
    boot::init_common(&settings.log);

    if let Some(out) = matches.get_one::<String>("out") {
        settings.export.out_dir = PathBuf::from(out);
    }
    if let Some(entity) = matches.get_one::<String>("entity") {
        settings.export.entity = Some(entity.clone());
    }
    if let Some(tab) = matches.get_one::<String>("tab") {
        settings.export.tab = Some(tab.clone());
    }

    if matches.get_flag("no-config-cache") || !settings.storage.enabled {
        set_no_cache(true);
    }
    let store = match &settings.storage.path {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::in_working_dir()?,
    };
    let prefs = Preferences::new(Arc::new(store));

    if let Some(path) = matches.get_one::<String>("colors") {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read color scheme from {path}"))?;
        let scheme = ColorScheme::from_json(&json)?;
        scheme.save(&prefs, &settings.feature)?;
        println!("Saved color scheme for '{}'", settings.feature);
        return Ok(());
    }

    let source = build_source(&matches)?;

    if let Some(format) = matches.get_one::<String>("export") {
        let format = ExportFormat::from_str(format)
            .map_err(|_| anyhow!("Unknown export format '{format}', expected csv, json or md"))?;
        return export_headless(&settings, source.as_ref(), format);
    }

    let mut launch = LaunchOptions::from_settings(&settings);
    if let Some(title) = matches.get_one::<String>("title") {
        launch.title = title.clone();
    }
    if let Some(theme) = matches.get_one::<String>("theme") {
        launch.theme = Some(
            ThemeChoice::from_str(theme).map_err(|_| anyhow!("Unknown theme '{theme}'"))?,
        );
    }
    if let Some(position) = matches.get_one::<String>("position") {
        launch.position = Some(
            Corner::from_str(position).map_err(|_| anyhow!("Unknown position '{position}'"))?,
        );
    }

    tui::start(&settings, prefs, source, launch)
}

fn build_source(matches: &ArgMatches) -> Result<Arc<dyn DataSource>> {
    if let Some(path) = matches.get_one::<String>("data") {
        return Ok(Arc::new(JsonFileSource::new(path)));
    }

    if let Some(url) = matches.get_one::<String>("url") {
        let entity_set = matches
            .get_one::<String>("entity-set")
            .ok_or_else(|| anyhow!("--url needs --entity-set"))?;
        let mut source = RestSource::new(url, entity_set);
        if let Some(select) = matches.get_one::<String>("select") {
            source = source.select(
                select
                    .split(',')
                    .map(str::trim)
                    .filter(|column| !column.is_empty()),
            );
        }
        if let Some(filter) = matches.get_one::<String>("filter") {
            source = source.filter(filter.clone());
        }
        for clause in matches.get_many::<String>("where").into_iter().flatten() {
            let (field, value) = clause
                .split_once('=')
                .ok_or_else(|| anyhow!("--where expects FIELD=VALUE, got {clause:?}"))?;
            source = source.where_value(field.trim(), value.trim());
        }
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            source = source.bearer_token(token);
        }
        return Ok(Arc::new(source));
    }

    Err(anyhow!("No data source given, use --data <FILE> or --url <BASE_URL> --entity-set <NAME>"))
}

fn export_headless(settings: &Settings, source: &dyn DataSource, format: ExportFormat) -> Result<()> {
    log::info!("📤 Headless {format:?} export of {}", source.describe());
    let dataset = source.fetch()?;
    let grid = Grid::new(
        dataset.headers,
        dataset.rows,
        GridOptions::default().exportable(settings.export.context()),
    );
    let path = grid.export(format)?.write_to(&settings.export.out_dir)?;
    println!("{}", path.display());
    Ok(())
}
