//! Application settings loaded from `overlaykit.toml`.
//!
//! Every field has a default, so an absent or partial file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    grid::ExportContext,
    panel::{
        geometry::{Corner, CssLength},
        theme::ThemeChoice,
    },
};

pub const DEFAULT_CONFIG_FILE: &str = "overlaykit.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace of the feature-wide preference keys.
    pub feature: String,
    pub panel: PanelDefaults,
    pub storage: StorageSettings,
    pub log: LogSettings,
    pub export: ExportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feature: "explorer".to_string(),
            panel: PanelDefaults::default(),
            storage: StorageSettings::default(),
            log: LogSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

/// Defaults applied to panel options left unset by a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelDefaults {
    pub width: u16,
    pub max_height: CssLength,
    pub position: Corner,
    pub theme: ThemeChoice,
}

impl Default for PanelDefaults {
    fn default() -> Self {
        Self {
            width: 72,
            max_height: CssLength::default(),
            position: Corner::default(),
            theme: ThemeChoice::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Preference file; the working directory default is used when unset.
    pub path: Option<PathBuf>,
    /// When false preferences only live for the session.
    pub enabled: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub file: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub out_dir: PathBuf,
    pub entity: Option<String>,
    pub tab: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            entity: None,
            tab: None,
        }
    }
}

impl ExportSettings {
    /// Naming context for exported files; unset fields keep the defaults.
    pub fn context(&self) -> ExportContext {
        let fallback = ExportContext::default();
        ExportContext::new(
            self.entity.clone().unwrap_or(fallback.entity),
            self.tab.clone().unwrap_or(fallback.tab),
        )
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse settings")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings")
    }

    /// Load from `path`, or from `overlaykit.toml` in the working directory
    /// when it exists. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = std::env::current_dir()
                    .context("Failed to get current working directory")?
                    .join(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {path:?}"))?;
        let settings = Self::from_toml(&text).with_context(|| format!("In {path:?}"))?;
        log::info!("📂 Loaded settings from {path:?}");
        Ok(settings)
    }
}
