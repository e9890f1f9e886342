#![forbid(unsafe_code)]

//! Ninezone public facade crate.
//!
//! Re-exports the layout model, the reducer, drag handling, and (with the
//! default `runtime` feature) the controller, behind one dependency and a
//! small prelude.

use std::fmt;

// --- Geometry re-exports ---------------------------------------------------

pub use ninezone_core::{Axis, PanelSide, Point, Rect, Sides, Size};

// --- Layout re-exports -----------------------------------------------------

pub use ninezone_layout::{
    DragCancelReason, DragEffect, DragItem, DragMachine, DragSource, DragState, DragTransition,
    DropTarget, InvariantReport, LayoutAction, LayoutDocument, LayoutError, LayoutErrorKind,
    LayoutGeometry, LayoutState, PanelTarget, Tab, TabId, TargetTuning, ValidationMode, Widget,
    WidgetId, WidgetIdAllocator, WidgetLocation, WidgetPlacement, create_initial_state, reduce,
    reduce_with, resolve_target,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use ninezone_runtime::{
    ConfigError, DeferredFailure, Dispatcher, LayoutConfig, LayoutController, Subscription,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for ninezone hosts.
#[derive(Debug)]
pub enum Error {
    /// A rejected action or persisted layout.
    Layout(LayoutError),
    /// Configuration failed to load or validate.
    #[cfg(feature = "runtime")]
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Config(err) => Some(err),
        }
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

#[cfg(feature = "runtime")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for ninezone APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DragItem, DropTarget, Error, LayoutAction, LayoutState, PanelSide, PanelTarget, Point,
        Rect, Result, Size, Tab, Widget, WidgetPlacement,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{LayoutConfig, LayoutController};

    pub use crate::{core, layout};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use ninezone_core as core;
pub use ninezone_layout as layout;
#[cfg(feature = "runtime")]
pub use ninezone_runtime as runtime;
