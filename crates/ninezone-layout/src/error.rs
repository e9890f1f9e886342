#![forbid(unsafe_code)]

//! Error vocabulary for the layout model.

use std::fmt;

use ninezone_core::PanelSide;
use serde::{Deserialize, Serialize};

use crate::validate::InvariantReport;

/// Kind of entity an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Tab,
    Widget,
    FloatingWidget,
    Section,
    PanelSpan,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tab => "tab",
            Self::Widget => "widget",
            Self::FloatingWidget => "floating widget",
            Self::Section => "section",
            Self::PanelSpan => "panel span",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accessor failure: the requested entity is absent from the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub kind: EntityKind,
    pub id: String,
}

impl NotFound {
    pub fn new(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn section(side: PanelSide, section: usize) -> Self {
        Self::new(EntityKind::Section, format!("{side}/{section}"))
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} not found", self.kind, self.id)
    }
}

impl std::error::Error for NotFound {}

/// Why a persisted layout could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedReason {
    UnsupportedSchemaVersion { found: u16, expected: u16 },
    Parse(String),
    DuplicateId { kind: EntityKind, id: String },
    DuplicatePanel { side: PanelSide },
    MissingPanel { side: PanelSide },
    Invariants(InvariantReport),
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { found, expected } => write!(
                f,
                "unsupported schema version {found} (expected {expected})"
            ),
            Self::Parse(message) => write!(f, "parse error: {message}"),
            Self::DuplicateId { kind, id } => write!(f, "duplicate {kind} id {id}"),
            Self::DuplicatePanel { side } => write!(f, "panel {side} listed more than once"),
            Self::MissingPanel { side } => write!(f, "panel {side} missing"),
            Self::Invariants(report) => write!(f, "{report}"),
        }
    }
}

/// Discriminant of [`LayoutError`], for logging and matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutErrorKind {
    InvalidReference,
    InvariantViolation,
    MalformedPersistedState,
}

/// Failure of a layout mutation or load.
///
/// A failed mutation never changes the caller's state: mutators work on a
/// structural copy and only hand it back on success.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// An action named a tab, widget, section, or floating entry that is absent.
    InvalidReference { kind: EntityKind, id: String },
    /// The mutation would produce an invalid state.
    InvariantViolation { report: InvariantReport },
    /// A persisted layout failed to parse or validate.
    MalformedPersistedState { reason: MalformedReason },
}

impl LayoutError {
    #[must_use]
    pub const fn kind(&self) -> LayoutErrorKind {
        match self {
            Self::InvalidReference { .. } => LayoutErrorKind::InvalidReference,
            Self::InvariantViolation { .. } => LayoutErrorKind::InvariantViolation,
            Self::MalformedPersistedState { .. } => LayoutErrorKind::MalformedPersistedState,
        }
    }

    pub(crate) fn malformed(reason: MalformedReason) -> Self {
        Self::MalformedPersistedState { reason }
    }
}

impl From<NotFound> for LayoutError {
    fn from(err: NotFound) -> Self {
        Self::InvalidReference {
            kind: err.kind,
            id: err.id,
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidReference { kind, id } => write!(f, "invalid {kind} reference {id}"),
            Self::InvariantViolation { report } => {
                write!(f, "layout invariant violated: {report}")
            }
            Self::MalformedPersistedState { reason } => {
                write!(f, "malformed persisted layout: {reason}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}
