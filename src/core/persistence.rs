//! Local key/value persistence for panel preferences
//!
//! Stores theme modes and color schemes as string values in a flat JSON map.
//! Keys are namespaced per feature and per concern:
//!
//! - `<feature>-theme-mode`: feature-wide `light` / `dark` mode
//! - `overlay-theme-<panel-key>`: per-panel mode chosen with the footer toggle
//! - `<feature>-colors`: JSON color map with exactly a `light` and a `dark` object
//!
//! ## --no-config-cache flag
//!
//! When started with `--no-config-cache`, all file reads and writes are
//! skipped and preferences only live for the session. Call
//! `set_no_cache(true)` early in startup to enable this.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::core::error::OverlayError;

/// Global flag to disable the on-disk store (set via --no-config-cache)
static NO_CONFIG_CACHE: AtomicBool = AtomicBool::new(false);

pub const DEFAULT_STORE_FILE: &str = "overlaykit_storage.json";

pub fn set_no_cache(enabled: bool) {
    NO_CONFIG_CACHE.store(enabled, Ordering::SeqCst);
    if enabled {
        log::info!("🚫 Preference store disabled (--no-config-cache)");
    }
}

fn is_no_cache() -> bool {
    NO_CONFIG_CACHE.load(Ordering::SeqCst)
}

/// Key under which a panel's own theme choice is remembered.
pub fn panel_theme_key(panel_key: &str) -> String {
    format!("overlay-theme-{panel_key}")
}

/// Key under which the feature-wide theme mode is remembered.
pub fn feature_theme_key(feature: &str) -> String {
    format!("{feature}-theme-mode")
}

/// Key under which a feature's custom color scheme is remembered.
pub fn feature_colors_key(feature: &str) -> String {
    format!("{feature}-colors")
}

/// Minimal string key/value storage, the terminal counterpart of browser
/// local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, OverlayError>;
    fn set(&self, key: &str, value: &str) -> Result<(), OverlayError>;
    fn remove(&self, key: &str) -> Result<(), OverlayError>;
}

/// Store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, OverlayError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), OverlayError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), OverlayError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Store backed by a pretty-printed JSON object on disk.
///
/// Every write re-reads the file, applies the change and writes it back, so
/// concurrent processes get last-write-wins semantics.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file in the current working directory.
    pub fn in_working_dir() -> Result<Self> {
        let dir = std::env::current_dir().context("Failed to get current working directory")?;
        Ok(Self::new(dir.join(DEFAULT_STORE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read store from {:?}", self.path))?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&json).context("Failed to deserialize preference store")
    }

    fn save_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let json =
            serde_json::to_string_pretty(map).context("Failed to serialize preference store")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write store to {:?}", self.path))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, OverlayError> {
        if is_no_cache() {
            return Ok(None);
        }
        let map = self
            .load_map()
            .map_err(|err| OverlayError::storage(key, format!("{err:#}")))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), OverlayError> {
        if is_no_cache() {
            log::debug!("⏭️  Skipping store write for {key} (--no-config-cache enabled)");
            return Ok(());
        }
        let mut map = self
            .load_map()
            .map_err(|err| OverlayError::storage(key, format!("{err:#}")))?;
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
            .map_err(|err| OverlayError::storage(key, format!("{err:#}")))?;
        log::debug!("💾 Stored {key} in {:?}", self.path);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), OverlayError> {
        if is_no_cache() {
            return Ok(());
        }
        let mut map = self
            .load_map()
            .map_err(|err| OverlayError::storage(key, format!("{err:#}")))?;
        if map.remove(key).is_some() {
            self.save_map(&map)
                .map_err(|err| OverlayError::storage(key, format!("{err:#}")))?;
        }
        Ok(())
    }
}

/// Preference access that never fails.
///
/// Storage errors are logged and swallowed; values written while the store
/// is unavailable are kept in a session map so the current run still sees
/// them.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    session: Arc<Mutex<HashMap<String, String>>>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            session: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(Some(value)) => Some(value),
            Ok(None) => self.session.lock().get(key).cloned(),
            Err(err) => {
                log::warn!("{err}");
                self.session.lock().get(key).cloned()
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        self.session
            .lock()
            .insert(key.to_string(), value.to_string());
        if let Err(err) = self.store.set(key, value) {
            log::warn!("{err}; keeping value for this session only");
        }
    }

    pub fn remove(&self, key: &str) {
        self.session.lock().remove(key);
        if let Err(err) = self.store.remove(key) {
            log::warn!("{err}");
        }
    }
}
