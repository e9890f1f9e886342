#![forbid(unsafe_code)]

//! Panel side vocabulary shared by the layout model and its adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Orientation along which items are stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One of the four fixed screen-edge docking regions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PanelSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl PanelSide {
    /// All sides in canonical order.
    pub const ALL: [PanelSide; 4] = [
        PanelSide::Left,
        PanelSide::Right,
        PanelSide::Top,
        PanelSide::Bottom,
    ];

    /// Axis along which sections of this panel are stacked.
    ///
    /// Left/right panels are tall, so their sections stack vertically.
    #[must_use]
    pub const fn stacking_axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Vertical,
            Self::Top | Self::Bottom => Axis::Horizontal,
        }
    }

    /// Top and bottom panels run along the horizontal screen edges.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    /// Stable lowercase name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for PanelSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
