#![forbid(unsafe_code)]

//! Ninezone Runtime
//!
//! Owns the current layout and serializes every change to it. Hosts
//! construct a [`LayoutController`] from a [`LayoutConfig`], dispatch
//! [`LayoutAction`](ninezone_layout::LayoutAction)s, drive drags through
//! it, and subscribe to published states.
//!
//! # Key Components
//!
//! - [`LayoutController`] - Single owner of the published `Arc<LayoutState>`
//! - [`Dispatcher`] - Cloneable handle for queueing follow-up actions
//! - [`ObserverRegistry`] / [`Subscription`] - Weakly held observers with RAII guards
//! - [`LayoutConfig`] - TOML/JSON configuration with collected validation errors
//!
//! # Logging
//!
//! The controller emits `tracing` events under the `ninezone.controller`
//! and `ninezone.drag` targets and a `layout.dispatch` span per applied
//! action. Installing a subscriber is left to the host.

pub mod config;
pub mod controller;
pub mod observer;

pub use config::{ConfigError, DEFAULT_MAX_FOLLOW_UPS, LayoutConfig};
pub use controller::{DeferredFailure, Dispatcher, FollowUpError, LayoutController};
pub use observer::{ObserverRegistry, Subscription};
