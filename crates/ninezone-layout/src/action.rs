#![forbid(unsafe_code)]

//! The closed vocabulary of layout mutations.
//!
//! Actions are plain data so they can be logged, replayed, queued, and sent
//! across process boundaries. The wire form is internally tagged by `kind`.

use std::fmt;

use ninezone_core::{PanelSide, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::ids::{TabId, WidgetId};
use crate::state::Tab;

/// Docking destination inside a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelTarget {
    /// Insert into an existing section before the widget at `index`.
    Section {
        side: PanelSide,
        section: usize,
        index: usize,
    },
    /// Create a new section at `position`.
    NewSection { side: PanelSide, position: usize },
}

impl PanelTarget {
    #[must_use]
    pub const fn side(&self) -> PanelSide {
        match self {
            Self::Section { side, .. } | Self::NewSection { side, .. } => *side,
        }
    }
}

/// Where a widget created by a tab action is placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetPlacement {
    Panel { target: PanelTarget },
    Floating { bounds: Option<Rect> },
}

/// A layout mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutAction {
    AddTab {
        tab: Tab,
        widget: WidgetId,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        placement: Option<WidgetPlacement>,
    },
    MoveTab {
        tab: TabId,
        widget: WidgetId,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        placement: Option<WidgetPlacement>,
    },
    RemoveTab {
        tab: TabId,
    },
    DockWidget {
        widget: WidgetId,
        target: PanelTarget,
    },
    FloatWidget {
        widget: WidgetId,
        #[serde(default)]
        bounds: Option<Rect>,
    },
    SendBack {
        widget: WidgetId,
    },
    BringToFront {
        widget: WidgetId,
    },
    ResizePanel {
        side: PanelSide,
        size: f64,
    },
    SetSplitterPercent {
        side: PanelSide,
        section: usize,
        percent: f64,
    },
    MergeWidgets {
        source: WidgetId,
        target: WidgetId,
        #[serde(default)]
        index: Option<usize>,
    },
    SetPanelCollapsed {
        side: PanelSide,
        collapsed: bool,
    },
    TogglePanelCollapsed {
        side: PanelSide,
    },
    SetPanelPinned {
        side: PanelSide,
        pinned: bool,
    },
    SetPanelSpan {
        side: PanelSide,
        span: bool,
    },
    ActivateTab {
        tab: TabId,
    },
    SetTabLabel {
        tab: TabId,
        label: String,
    },
    FloatTab {
        tab: TabId,
        widget: WidgetId,
        #[serde(default)]
        bounds: Option<Rect>,
    },
    SetFloatingBounds {
        widget: WidgetId,
        bounds: Rect,
        #[serde(default)]
        user_sized: bool,
    },
    SetWidgetMinimized {
        widget: WidgetId,
        minimized: bool,
    },
    ResizeViewport {
        size: Size,
    },
}

/// Payload-free discriminant of [`LayoutAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutActionKind {
    AddTab,
    MoveTab,
    RemoveTab,
    DockWidget,
    FloatWidget,
    SendBack,
    BringToFront,
    ResizePanel,
    SetSplitterPercent,
    MergeWidgets,
    SetPanelCollapsed,
    TogglePanelCollapsed,
    SetPanelPinned,
    SetPanelSpan,
    ActivateTab,
    SetTabLabel,
    FloatTab,
    SetFloatingBounds,
    SetWidgetMinimized,
    ResizeViewport,
}

impl LayoutActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddTab => "add_tab",
            Self::MoveTab => "move_tab",
            Self::RemoveTab => "remove_tab",
            Self::DockWidget => "dock_widget",
            Self::FloatWidget => "float_widget",
            Self::SendBack => "send_back",
            Self::BringToFront => "bring_to_front",
            Self::ResizePanel => "resize_panel",
            Self::SetSplitterPercent => "set_splitter_percent",
            Self::MergeWidgets => "merge_widgets",
            Self::SetPanelCollapsed => "set_panel_collapsed",
            Self::TogglePanelCollapsed => "toggle_panel_collapsed",
            Self::SetPanelPinned => "set_panel_pinned",
            Self::SetPanelSpan => "set_panel_span",
            Self::ActivateTab => "activate_tab",
            Self::SetTabLabel => "set_tab_label",
            Self::FloatTab => "float_tab",
            Self::SetFloatingBounds => "set_floating_bounds",
            Self::SetWidgetMinimized => "set_widget_minimized",
            Self::ResizeViewport => "resize_viewport",
        }
    }
}

impl fmt::Display for LayoutActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LayoutAction {
    #[must_use]
    pub const fn kind(&self) -> LayoutActionKind {
        match self {
            Self::AddTab { .. } => LayoutActionKind::AddTab,
            Self::MoveTab { .. } => LayoutActionKind::MoveTab,
            Self::RemoveTab { .. } => LayoutActionKind::RemoveTab,
            Self::DockWidget { .. } => LayoutActionKind::DockWidget,
            Self::FloatWidget { .. } => LayoutActionKind::FloatWidget,
            Self::SendBack { .. } => LayoutActionKind::SendBack,
            Self::BringToFront { .. } => LayoutActionKind::BringToFront,
            Self::ResizePanel { .. } => LayoutActionKind::ResizePanel,
            Self::SetSplitterPercent { .. } => LayoutActionKind::SetSplitterPercent,
            Self::MergeWidgets { .. } => LayoutActionKind::MergeWidgets,
            Self::SetPanelCollapsed { .. } => LayoutActionKind::SetPanelCollapsed,
            Self::TogglePanelCollapsed { .. } => LayoutActionKind::TogglePanelCollapsed,
            Self::SetPanelPinned { .. } => LayoutActionKind::SetPanelPinned,
            Self::SetPanelSpan { .. } => LayoutActionKind::SetPanelSpan,
            Self::ActivateTab { .. } => LayoutActionKind::ActivateTab,
            Self::SetTabLabel { .. } => LayoutActionKind::SetTabLabel,
            Self::FloatTab { .. } => LayoutActionKind::FloatTab,
            Self::SetFloatingBounds { .. } => LayoutActionKind::SetFloatingBounds,
            Self::SetWidgetMinimized { .. } => LayoutActionKind::SetWidgetMinimized,
            Self::ResizeViewport { .. } => LayoutActionKind::ResizeViewport,
        }
    }

    /// Convenience constructor for appending a tab to an existing widget.
    pub fn add_tab(tab: Tab, widget: impl Into<WidgetId>) -> Self {
        Self::AddTab {
            tab,
            widget: widget.into(),
            index: None,
            placement: None,
        }
    }

    pub fn float(widget: impl Into<WidgetId>, bounds: Option<Rect>) -> Self {
        Self::FloatWidget {
            widget: widget.into(),
            bounds,
        }
    }

    pub fn dock(widget: impl Into<WidgetId>, target: PanelTarget) -> Self {
        Self::DockWidget {
            widget: widget.into(),
            target,
        }
    }

    pub fn send_back(widget: impl Into<WidgetId>) -> Self {
        Self::SendBack {
            widget: widget.into(),
        }
    }

    pub fn remove_tab(tab: impl Into<TabId>) -> Self {
        Self::RemoveTab { tab: tab.into() }
    }
}
