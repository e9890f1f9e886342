#![forbid(unsafe_code)]

//! Layout configuration as data.
//!
//! Every tunable the controller needs lives in one [`LayoutConfig`] that can
//! be loaded from TOML or JSON at startup.
//!
//! ```toml
//! # ninezone.toml
//! validation = "always"
//! max_follow_ups = 32
//!
//! [viewport]
//! width = 1920.0
//! height = 1080.0
//!
//! [targets]
//! tab_width = 120.0
//! edge_band = 32.0
//!
//! [panels]
//! size = 280.0
//! max_sections = 3
//!
//! [defaults]
//! side = "right"
//! ```
//!
//! Omitted fields keep their defaults.

use std::fmt;
use std::path::Path;

use ninezone_core::Size;
use ninezone_layout::{
    DEFAULT_WIDGET_ID_PREFIX, LayoutDefaults, LayoutError, LayoutState, PanelSizing, TargetTuning,
    ValidationMode, WidgetIdAllocator,
};
use serde::{Deserialize, Serialize};

/// Default cap on follow-up actions drained after one dispatch.
pub const DEFAULT_MAX_FOLLOW_UPS: usize = 64;

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Initial viewport size.
    pub viewport: Size,
    /// Drop-target hit-test thresholds.
    pub targets: TargetTuning,
    /// Sizing applied to all four panels of a fresh layout.
    pub panels: PanelSizing,
    /// Fallback side and floating size.
    pub defaults: LayoutDefaults,
    /// When dispatched actions are validated.
    pub validation: ValidationMode,
    /// Follow-up actions drained per dispatch before the rest are dropped.
    pub max_follow_ups: usize,
    /// Prefix for widget ids allocated by drops.
    pub widget_id_prefix: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(1280.0, 800.0),
            targets: TargetTuning::default(),
            panels: PanelSizing::default(),
            defaults: LayoutDefaults::default(),
            validation: ValidationMode::default(),
            max_follow_ups: DEFAULT_MAX_FOLLOW_UPS,
            widget_id_prefix: DEFAULT_WIDGET_ID_PREFIX.to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.viewport.is_valid() {
            errors.push(format!(
                "viewport must be finite and non-negative, got {}x{}",
                self.viewport.width, self.viewport.height
            ));
        }
        errors.extend(
            self.targets
                .validate()
                .into_iter()
                .map(|error| format!("targets.{error}")),
        );
        errors.extend(
            self.panels
                .validate()
                .into_iter()
                .map(|error| format!("panels.{error}")),
        );
        let floating = self.defaults.floating_size;
        if !floating.is_valid() || floating.width == 0.0 || floating.height == 0.0 {
            errors.push(format!(
                "defaults.floating_size must be positive, got {}x{}",
                floating.width, floating.height
            ));
        }
        if self.max_follow_ups == 0 {
            errors.push("max_follow_ups must be > 0".into());
        }
        if self.widget_id_prefix.trim().is_empty() {
            errors.push("widget_id_prefix must not be empty".into());
        }

        errors
    }

    /// `Ok(self)` when [`validate`](Self::validate) reports nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Empty layout with this configuration's viewport, defaults, and panel
    /// sizing.
    #[must_use]
    pub fn create_initial_state(&self) -> LayoutState {
        ninezone_layout::create_initial_state(self.viewport, self.defaults, self.panels)
    }

    #[must_use]
    pub fn widget_id_allocator(&self) -> WidgetIdAllocator {
        WidgetIdAllocator::new(self.widget_id_prefix.clone())
    }
}

/// Errors from loading or validating a [`LayoutConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
    /// The layout handed to a controller failed validation.
    InitialState(LayoutError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
            Self::InitialState(e) => write!(f, "invalid initial layout: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
            Self::InitialState(e) => Some(e),
        }
    }
}
