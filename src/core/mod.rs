//! UI-independent plumbing shared by the terminal front end and headless
//! runs:
//! - Message bus and worker thread for data fetches
//! - Settings file
//! - Preference persistence
//! - Error taxonomy

pub mod bus;
pub mod config;
pub mod error;
pub mod persistence;

pub use bus::{Bus, CoreToUi, UiToCore};
pub use config::Settings;
pub use error::OverlayError;
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore, Preferences};
