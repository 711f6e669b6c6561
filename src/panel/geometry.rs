//! Placement of floating panels inside the terminal viewport.
//!
//! Offsets are terminal cells. A panel is anchored by any combination of
//! top/right/left/bottom offsets; when none is given the named corner
//! supplies defaults.

use anyhow::{anyhow, Result};
use ratatui::layout::{Position, Rect, Size};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::{Display, EnumIter, EnumString};

/// Minimum distance kept between a dragged panel and every viewport edge.
pub const VIEWPORT_MARGIN: u16 = 1;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn default_anchor(self) -> Anchor {
        match self {
            Corner::TopLeft => Anchor {
                top: Some(2),
                left: Some(4),
                ..Anchor::default()
            },
            Corner::TopRight => Anchor {
                top: Some(2),
                right: Some(4),
                ..Anchor::default()
            },
            Corner::BottomLeft => Anchor {
                bottom: Some(1),
                left: Some(4),
                ..Anchor::default()
            },
            Corner::BottomRight => Anchor {
                bottom: Some(1),
                right: Some(4),
                ..Anchor::default()
            },
        }
    }
}

/// Edge offsets of a panel. Left wins over right and top wins over bottom
/// when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub top: Option<u16>,
    pub right: Option<u16>,
    pub left: Option<u16>,
    pub bottom: Option<u16>,
}

impl Anchor {
    pub fn pinned(left: u16, top: u16) -> Self {
        Self {
            top: Some(top),
            left: Some(left),
            right: None,
            bottom: None,
        }
    }

    pub fn is_unset(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.left.is_none() && self.bottom.is_none()
    }

    /// Top-left cell of a panel of `size` placed in `viewport`.
    pub fn origin(&self, size: Size, viewport: Size) -> Position {
        let x = match (self.left, self.right) {
            (Some(left), _) => left,
            (None, Some(right)) => viewport.width.saturating_sub(size.width.saturating_add(right)),
            (None, None) => 0,
        };
        let y = match (self.top, self.bottom) {
            (Some(top), _) => top,
            (None, Some(bottom)) => viewport
                .height
                .saturating_sub(size.height.saturating_add(bottom)),
            (None, None) => 0,
        };
        Position {
            x: x.min(viewport.width.saturating_sub(size.width)),
            y: y.min(viewport.height.saturating_sub(size.height)),
        }
    }
}

/// A CSS-like length used for the panel height cap: plain cells, `px`
/// (16 px per row) or a percentage of the viewport height (`vh`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CssLength {
    Cells(u16),
    ViewportPercent(u16),
}

impl Default for CssLength {
    fn default() -> Self {
        CssLength::ViewportPercent(70)
    }
}

impl CssLength {
    pub fn resolve(self, viewport_height: u16) -> u16 {
        match self {
            CssLength::Cells(cells) => cells.min(viewport_height),
            CssLength::ViewportPercent(percent) => {
                let percent = u32::from(percent.min(100));
                (u32::from(viewport_height) * percent / 100) as u16
            }
        }
    }
}

impl FromStr for CssLength {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let parse = |digits: &str| {
            digits
                .trim()
                .parse::<u16>()
                .map_err(|err| anyhow!("Invalid length '{s}': {err}"))
        };
        if let Some(digits) = s.strip_suffix("vh") {
            Ok(CssLength::ViewportPercent(parse(digits)?))
        } else if let Some(digits) = s.strip_suffix("px") {
            let px = parse(digits)?;
            Ok(CssLength::Cells(px.div_ceil(16)))
        } else {
            Ok(CssLength::Cells(parse(&s)?))
        }
    }
}

impl TryFrom<String> for CssLength {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CssLength> for String {
    fn from(value: CssLength) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssLength::Cells(cells) => write!(f, "{cells}"),
            CssLength::ViewportPercent(percent) => write!(f, "{percent}vh"),
        }
    }
}

/// Drag-to-move state of one panel.
///
/// The offset between the pointer and the panel origin is captured on
/// press and kept for the whole gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragState {
    grab: Option<(i32, i32)>,
}

impl DragState {
    pub fn begin(&mut self, panel: Rect, pointer: Position) {
        self.grab = Some((
            i32::from(panel.x) - i32::from(pointer.x),
            i32::from(panel.y) - i32::from(pointer.y),
        ));
    }

    pub fn is_active(&self) -> bool {
        self.grab.is_some()
    }

    /// New anchor for the panel when the pointer reaches `pointer`, or
    /// `None` when no drag is in progress. The result is always left/top
    /// pinned and clamped to the viewport margin.
    pub fn follow(&self, pointer: Position, size: Size, viewport: Size) -> Option<Anchor> {
        let (dx, dy) = self.grab?;
        let max_left = i32::from(viewport.width) - i32::from(size.width) - i32::from(VIEWPORT_MARGIN);
        let max_top =
            i32::from(viewport.height) - i32::from(size.height) - i32::from(VIEWPORT_MARGIN);
        let margin = i32::from(VIEWPORT_MARGIN);
        let left = (i32::from(pointer.x) + dx).min(max_left).max(margin);
        let top = (i32::from(pointer.y) + dy).min(max_top).max(margin);
        Some(Anchor::pinned(left as u16, top as u16))
    }

    pub fn end(&mut self) {
        self.grab = None;
    }
}
