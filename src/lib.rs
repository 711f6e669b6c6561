//! overlaykit: floating panels and an interactive data grid for terminal
//! developer utilities.
//!
//! A [`panel::PanelManager`] owns every floating panel of a page: one
//! instance per key, drag-to-move, light/dark themes with persisted
//! preferences, Escape and close-glyph dismissal, and a footer bar. The
//! [`grid`] module renders rows into a panel body with click-to-sort headers,
//! column reordering, filtering and CSV/JSON/Markdown export.
//!
//! The terminal front end lives in [`tui`]; [`boot`] wires logging for the
//! binary.

#[doc(hidden)]
pub mod boot;
pub mod core;
pub mod grid;
pub mod panel;
pub mod source;
pub mod tui;
pub mod utils;

pub use crate::core::{error::OverlayError, Settings};
pub use grid::{CellValue, Grid, GridOptions};
pub use panel::{PanelHandle, PanelManager, PanelOptions};
