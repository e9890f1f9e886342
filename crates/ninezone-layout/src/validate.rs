#![forbid(unsafe_code)]

//! Structural invariant checks.
//!
//! [`build_report`] inspects a state and lists every finding with a stable
//! code; an empty report means the state is valid. Mutators run it on their
//! result according to the active [`ValidationMode`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ninezone_core::PanelSide;
use serde::{Deserialize, Serialize};

use crate::ids::{TabId, WidgetId};
use crate::state::LayoutState;

/// Allowed deviation of a panel's splitter sum from 100.
pub const SPLITTER_SUM_TOLERANCE: f64 = 0.01;

/// When mutators validate their result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Validate in debug builds only.
    #[default]
    DebugOnly,
    Always,
    Never,
}

impl ValidationMode {
    #[must_use]
    pub const fn enabled(self) -> bool {
        match self {
            Self::DebugOnly => cfg!(debug_assertions),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    KeyMismatch,
    PanelSideMismatch,
    EmptyWidget,
    DuplicateTabInWidget,
    ActiveTabNotMember,
    MissingTab,
    OrphanTab,
    TabInMultipleWidgets,
    MissingWidget,
    WidgetPlacedTwice,
    UnplacedWidget,
    DuplicateWidgetId,
    EmptySection,
    TooManySections,
    SplitterCountMismatch,
    SplitterOutOfRange,
    SplitterSum,
    InvalidPanelBounds,
    PanelSizeOutOfRange,
    SpanOnVerticalPanel,
    InvalidFloatingBounds,
    ZIndexNotDense,
    InvalidViewport,
    SelfMerge,
}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    /// Id or location the finding is about, when there is one.
    pub subject: Option<String>,
    pub message: String,
}

/// Structured invariant report over one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub state_hash: u64,
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    /// Report carrying a single finding, used when a mutation is rejected
    /// before it produces a state.
    pub fn single(
        state: &LayoutState,
        code: InvariantCode,
        subject: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            state_hash: state.state_hash(),
            issues: vec![InvariantIssue {
                code,
                subject,
                message: message.into(),
            }],
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn has_code(&self, code: InvariantCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

impl fmt::Display for InvariantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [] => write!(f, "no issues [hash={:#x}]", self.state_hash),
            [only] => write!(f, "{} [hash={:#x}]", only.message, self.state_hash),
            [first, rest @ ..] => write!(
                f,
                "{} (+{} more) [hash={:#x}]",
                first.message,
                rest.len(),
                self.state_hash
            ),
        }
    }
}

fn push(
    issues: &mut Vec<InvariantIssue>,
    code: InvariantCode,
    subject: Option<String>,
    message: String,
) {
    issues.push(InvariantIssue {
        code,
        subject,
        message,
    });
}

pub(crate) fn build_report(state: &LayoutState) -> InvariantReport {
    let mut issues = Vec::new();

    let viewport = state.viewport;
    if !viewport.is_valid() {
        push(
            &mut issues,
            InvariantCode::InvalidViewport,
            None,
            format!("viewport {}x{} is invalid", viewport.width, viewport.height),
        );
    }

    for (key, tab) in &state.tabs {
        if *key != tab.id {
            push(
                &mut issues,
                InvariantCode::KeyMismatch,
                Some(key.to_string()),
                format!("tab stored under {key} has id {}", tab.id),
            );
        }
    }

    let mut owners: BTreeMap<&TabId, &WidgetId> = BTreeMap::new();
    for (key, widget) in &state.widgets {
        if *key != widget.id {
            push(
                &mut issues,
                InvariantCode::KeyMismatch,
                Some(key.to_string()),
                format!("widget stored under {key} has id {}", widget.id),
            );
        }
        if widget.tabs.is_empty() {
            push(
                &mut issues,
                InvariantCode::EmptyWidget,
                Some(key.to_string()),
                format!("widget {key} has no tabs"),
            );
        }
        if !widget.tabs.contains(&widget.active_tab) {
            push(
                &mut issues,
                InvariantCode::ActiveTabNotMember,
                Some(key.to_string()),
                format!(
                    "active tab {} is not a member of widget {key}",
                    widget.active_tab
                ),
            );
        }
        let mut seen = BTreeSet::new();
        for tab in &widget.tabs {
            if !seen.insert(tab) {
                push(
                    &mut issues,
                    InvariantCode::DuplicateTabInWidget,
                    Some(key.to_string()),
                    format!("tab {tab} listed twice in widget {key}"),
                );
                continue;
            }
            if !state.tabs.contains_key(tab) {
                push(
                    &mut issues,
                    InvariantCode::MissingTab,
                    Some(tab.to_string()),
                    format!("widget {key} references missing tab {tab}"),
                );
            }
            if let Some(previous) = owners.insert(tab, key) {
                push(
                    &mut issues,
                    InvariantCode::TabInMultipleWidgets,
                    Some(tab.to_string()),
                    format!("tab {tab} belongs to both {previous} and {key}"),
                );
            }
        }
    }

    for key in state.tabs.keys() {
        if !owners.contains_key(key) {
            push(
                &mut issues,
                InvariantCode::OrphanTab,
                Some(key.to_string()),
                format!("tab {key} belongs to no widget"),
            );
        }
    }

    let mut placements: BTreeMap<&WidgetId, String> = BTreeMap::new();

    for side in PanelSide::ALL {
        let panel = state.panels.get(side);
        if panel.side != side {
            push(
                &mut issues,
                InvariantCode::PanelSideMismatch,
                Some(side.to_string()),
                format!("panel stored as {side} reports side {}", panel.side),
            );
        }
        check_panel_bounds(&mut issues, side, panel.min_size, panel.max_size, panel.size);
        if panel.span && !side.is_horizontal() {
            push(
                &mut issues,
                InvariantCode::SpanOnVerticalPanel,
                Some(side.to_string()),
                format!("panel {side} cannot span"),
            );
        }
        if panel.sections.len() > panel.max_sections {
            push(
                &mut issues,
                InvariantCode::TooManySections,
                Some(side.to_string()),
                format!(
                    "panel {side} has {} sections (max {})",
                    panel.sections.len(),
                    panel.max_sections
                ),
            );
        }
        for (section, widgets) in panel.sections.iter().enumerate() {
            if widgets.is_empty() {
                push(
                    &mut issues,
                    InvariantCode::EmptySection,
                    Some(format!("{side}/{section}")),
                    format!("section {side}/{section} is empty"),
                );
            }
            for (index, widget) in widgets.iter().enumerate() {
                place(&mut issues, &mut placements, state, widget, format!("{side}/{section}/{index}"));
            }
        }
        check_splitters(&mut issues, side, panel.sections.len(), &panel.splitter_percents);
    }

    let mut ranks = Vec::with_capacity(state.floating.len());
    for (key, entry) in &state.floating {
        if *key != entry.widget {
            push(
                &mut issues,
                InvariantCode::KeyMismatch,
                Some(key.to_string()),
                format!("floating entry under {key} names widget {}", entry.widget),
            );
        }
        place(&mut issues, &mut placements, state, key, "floating".to_string());
        if !entry.bounds.is_valid() {
            push(
                &mut issues,
                InvariantCode::InvalidFloatingBounds,
                Some(key.to_string()),
                format!("floating widget {key} has invalid bounds {:?}", entry.bounds),
            );
        }
        ranks.push(entry.z_index);
    }
    ranks.sort_unstable();
    if ranks.iter().enumerate().any(|(expected, rank)| *rank != expected) {
        push(
            &mut issues,
            InvariantCode::ZIndexNotDense,
            None,
            format!("floating z-order {ranks:?} is not a dense 0..N-1 sequence"),
        );
    }

    for key in state.widgets.keys() {
        if !placements.contains_key(key) {
            push(
                &mut issues,
                InvariantCode::UnplacedWidget,
                Some(key.to_string()),
                format!("widget {key} is in no section and not floating"),
            );
        }
    }

    InvariantReport {
        state_hash: state.state_hash(),
        issues,
    }
}

fn place<'a>(
    issues: &mut Vec<InvariantIssue>,
    placements: &mut BTreeMap<&'a WidgetId, String>,
    state: &LayoutState,
    widget: &'a WidgetId,
    at: String,
) {
    if !state.widgets.contains_key(widget) {
        push(
            issues,
            InvariantCode::MissingWidget,
            Some(widget.to_string()),
            format!("{at} references missing widget {widget}"),
        );
    }
    if let Some(previous) = placements.get(widget) {
        push(
            issues,
            InvariantCode::WidgetPlacedTwice,
            Some(widget.to_string()),
            format!("widget {widget} placed at both {previous} and {at}"),
        );
    }
    placements.insert(widget, at);
}

fn check_panel_bounds(
    issues: &mut Vec<InvariantIssue>,
    side: PanelSide,
    min_size: f64,
    max_size: f64,
    size: f64,
) {
    if !(min_size.is_finite() && max_size.is_finite() && min_size >= 0.0 && min_size <= max_size)
    {
        push(
            issues,
            InvariantCode::InvalidPanelBounds,
            Some(side.to_string()),
            format!("panel {side} bounds [{min_size}, {max_size}] are invalid"),
        );
        return;
    }
    if !(size >= min_size && size <= max_size) {
        push(
            issues,
            InvariantCode::PanelSizeOutOfRange,
            Some(side.to_string()),
            format!("panel {side} size {size} outside [{min_size}, {max_size}]"),
        );
    }
}

fn check_splitters(
    issues: &mut Vec<InvariantIssue>,
    side: PanelSide,
    sections: usize,
    percents: &[f64],
) {
    if percents.len() != sections {
        push(
            issues,
            InvariantCode::SplitterCountMismatch,
            Some(side.to_string()),
            format!(
                "panel {side} has {} splitter shares for {sections} sections",
                percents.len()
            ),
        );
        return;
    }
    if percents.is_empty() {
        return;
    }
    if percents.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
        push(
            issues,
            InvariantCode::SplitterOutOfRange,
            Some(side.to_string()),
            format!("panel {side} has a non-positive splitter share in {percents:?}"),
        );
    }
    let sum: f64 = percents.iter().sum();
    if (sum - 100.0).abs() > SPLITTER_SUM_TOLERANCE {
        push(
            issues,
            InvariantCode::SplitterSum,
            Some(side.to_string()),
            format!("panel {side} splitter shares sum to {sum}"),
        );
    }
}
