#![forbid(unsafe_code)]

//! Core primitives for the ninezone docking layout engine.
//!
//! This crate carries no state: it defines the screen-space geometry used by
//! the layout model and the panel-side vocabulary shared with adapters.

pub mod geometry;
pub mod side;

pub use geometry::{Point, Rect, Sides, Size};
pub use side::{Axis, PanelSide};
