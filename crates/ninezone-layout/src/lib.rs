#![forbid(unsafe_code)]

//! Ninezone Layout
//!
//! The state model and pure operations of the nine-zone docking layout:
//! four edge panels, each split into sections of widgets, plus a z-ordered
//! set of floating widgets over the central content area.
//!
//! # Key Components
//!
//! - [`LayoutState`] - Normalized, persistent layout snapshot
//! - [`LayoutAction`] / [`reduce`] - The closed mutation vocabulary and its reducer
//! - [`InvariantReport`] - Structural validation with stable issue codes
//! - [`LayoutDocument`] - Versioned persisted form
//! - [`LayoutGeometry`] - Rectangles solved from a state and viewport
//! - [`resolve_target`] - Pure drop-target resolution
//! - [`DragMachine`] - Drag lifecycle producing one action per drop
//!
//! # How it fits in the system
//! Nothing here performs I/O, logging, or scheduling. `ninezone-runtime`
//! owns the current state, serializes dispatch, and notifies observers.

pub mod action;
pub mod document;
pub mod drag;
pub mod error;
pub mod ids;
pub mod reduce;
pub mod solve;
pub mod state;
pub mod target;
pub mod validate;

pub use action::{LayoutAction, LayoutActionKind, PanelTarget, WidgetPlacement};
pub use document::{LAYOUT_DOCUMENT_SCHEMA_VERSION, LayoutDocument};
pub use drag::{
    DragCancelReason, DragEffect, DragMachine, DragNoopReason, DragPhase, DragSession, DragState,
    DragTransition, drop_action,
};
pub use error::{EntityKind, LayoutError, LayoutErrorKind, MalformedReason, NotFound};
pub use ids::{DEFAULT_WIDGET_ID_PREFIX, TabId, WidgetId, WidgetIdAllocator};
pub use reduce::{reduce, reduce_with};
pub use solve::{FloatingGeometry, LayoutGeometry, PanelGeometry, SectionGeometry, WidgetGeometry};
pub use state::{
    DEFAULT_MAX_SECTIONS, FloatingWidget, Home, LayoutDefaults, LayoutState, LayoutStateBuilder,
    MIN_SECTION_PERCENT, Panel, PanelSet, PanelSizing, Tab, Widget, WidgetLocation,
    create_initial_state,
};
pub use target::{
    DragItem, DragSource, DropTarget, DropTargetKind, TargetTuning, resolve_target,
    resolve_target_in,
};
pub use validate::{InvariantCode, InvariantIssue, InvariantReport, ValidationMode};

pub use ninezone_core::{Axis, PanelSide, Point, Rect, Sides, Size};
