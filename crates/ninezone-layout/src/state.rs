#![forbid(unsafe_code)]

//! Normalized, immutable layout state.
//!
//! Tabs, widgets, and floating entries live in persistent ordered maps keyed
//! by their stable ids; panels are a fixed set of four. A widget is placed in
//! exactly one container: a slot inside a panel section, or the floating
//! collection. Cloning a [`LayoutState`] is cheap and the clone shares every
//! entity with its origin until one side mutates it.
//!
//! Every read accessor is total over valid states and reports absent ids as
//! [`NotFound`].

use std::collections::{BTreeMap, BTreeSet};

use im::OrdMap;
use ninezone_core::{PanelSide, Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, LayoutError, NotFound};
use crate::ids::{TabId, WidgetId};
use crate::validate::{InvariantReport, build_report};

/// Default upper bound on sections per panel.
pub const DEFAULT_MAX_SECTIONS: usize = 2;

/// Smallest share any section may be squeezed to by a splitter drag.
pub const MIN_SECTION_PERCENT: f64 = 10.0;

fn default_true() -> bool {
    true
}

fn default_max_sections() -> usize {
    DEFAULT_MAX_SECTIONS
}

/// A single titled unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub label: String,
    #[serde(default)]
    pub can_pop_out: bool,
    /// Whether this tab may share a widget with tabs from other widgets.
    #[serde(default = "default_true")]
    pub allow_merge: bool,
    #[serde(default)]
    pub preferred_floating_size: Option<Size>,
    #[serde(default)]
    pub preferred_floating_position: Option<Point>,
    /// Panels this tab may be docked into. `None` allows every side.
    #[serde(default)]
    pub allowed_sides: Option<BTreeSet<PanelSide>>,
}

impl Tab {
    pub fn new(id: impl Into<TabId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            can_pop_out: false,
            allow_merge: true,
            preferred_floating_size: None,
            preferred_floating_position: None,
            allowed_sides: None,
        }
    }

    #[must_use]
    pub fn with_allow_merge(mut self, allow_merge: bool) -> Self {
        self.allow_merge = allow_merge;
        self
    }

    #[must_use]
    pub fn with_can_pop_out(mut self, can_pop_out: bool) -> Self {
        self.can_pop_out = can_pop_out;
        self
    }

    #[must_use]
    pub fn with_preferred_floating_size(mut self, size: Size) -> Self {
        self.preferred_floating_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_preferred_floating_position(mut self, position: Point) -> Self {
        self.preferred_floating_position = Some(position);
        self
    }

    #[must_use]
    pub fn with_allowed_sides(mut self, sides: impl IntoIterator<Item = PanelSide>) -> Self {
        self.allowed_sides = Some(sides.into_iter().collect());
        self
    }

    /// Whether the tab may be docked into the panel on `side`.
    #[must_use]
    pub fn allows_side(&self, side: PanelSide) -> bool {
        self.allowed_sides
            .as_ref()
            .is_none_or(|sides| sides.contains(&side))
    }
}

/// An ordered, non-empty container of tabs with exactly one active tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: WidgetId,
    pub tabs: Vec<TabId>,
    pub active_tab: TabId,
    #[serde(default)]
    pub minimized: bool,
}

impl Widget {
    /// A widget holding one (active) tab.
    pub fn single(id: impl Into<WidgetId>, tab: impl Into<TabId>) -> Self {
        let tab = tab.into();
        Self {
            id: id.into(),
            tabs: vec![tab.clone()],
            active_tab: tab,
            minimized: false,
        }
    }

    /// Append another tab. The active tab is unchanged.
    #[must_use]
    pub fn with_tab(mut self, tab: impl Into<TabId>) -> Self {
        self.tabs.push(tab.into());
        self
    }

    #[must_use]
    pub fn with_active(mut self, tab: impl Into<TabId>) -> Self {
        self.active_tab = tab.into();
        self
    }

    #[must_use]
    pub fn contains_tab(&self, tab: &TabId) -> bool {
        self.tabs.contains(tab)
    }

    #[must_use]
    pub fn tab_index(&self, tab: &TabId) -> Option<usize> {
        self.tabs.iter().position(|candidate| candidate == tab)
    }
}

/// Size limits and capacity applied to a panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSizing {
    pub size: f64,
    pub min_size: f64,
    pub max_size: f64,
    pub max_sections: usize,
}

impl Default for PanelSizing {
    fn default() -> Self {
        Self {
            size: 240.0,
            min_size: 120.0,
            max_size: 600.0,
            max_sections: DEFAULT_MAX_SECTIONS,
        }
    }
}

impl PanelSizing {
    /// Human-readable problems, empty when the sizing is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.min_size.is_finite() && self.max_size.is_finite() && self.size.is_finite()) {
            errors.push("panel sizes must be finite".to_string());
        }
        if self.min_size < 0.0 {
            errors.push(format!("min_size ({}) must be >= 0", self.min_size));
        }
        if self.min_size > self.max_size {
            errors.push(format!(
                "min_size ({}) must be <= max_size ({})",
                self.min_size, self.max_size
            ));
        }
        if self.size < self.min_size || self.size > self.max_size {
            errors.push(format!(
                "size ({}) must be within [{}, {}]",
                self.size, self.min_size, self.max_size
            ));
        }
        if self.max_sections == 0 {
            errors.push("max_sections must be >= 1".to_string());
        }
        errors
    }
}

/// One of the four edge panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub side: PanelSide,
    pub size: f64,
    pub min_size: f64,
    pub max_size: f64,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default = "default_true")]
    pub pinned: bool,
    /// Top/bottom only: the panel runs the full viewport width.
    #[serde(default)]
    pub span: bool,
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,
    #[serde(default)]
    pub sections: Vec<Vec<WidgetId>>,
    /// Share of the panel's long axis per section; sums to 100.
    #[serde(default)]
    pub splitter_percents: Vec<f64>,
}

impl Panel {
    #[must_use]
    pub fn new(side: PanelSide, sizing: PanelSizing) -> Self {
        Self {
            side,
            size: sizing.size,
            min_size: sizing.min_size,
            max_size: sizing.max_size,
            collapsed: false,
            pinned: true,
            span: false,
            max_sections: sizing.max_sections,
            sections: Vec::new(),
            splitter_percents: Vec::new(),
        }
    }

    /// The panel occupies screen space: it has content and is not collapsed.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.collapsed && !self.sections.is_empty()
    }

    /// No further section may be added.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.sections.len() >= self.max_sections
    }

    #[must_use]
    pub fn widget_count(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }

    /// Section and index of `widget` within this panel.
    #[must_use]
    pub fn find_widget(&self, widget: &WidgetId) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(section, widgets)| {
            widgets
                .iter()
                .position(|candidate| candidate == widget)
                .map(|index| (section, index))
        })
    }

    pub fn widgets(&self) -> impl Iterator<Item = &WidgetId> {
        self.sections.iter().flatten()
    }

    /// Insert a section at `position` (clamped), giving it an equal share and
    /// scaling the existing shares down proportionally.
    pub(crate) fn insert_section(&mut self, position: usize, widgets: Vec<WidgetId>) -> usize {
        let position = position.min(self.sections.len());
        let count = self.sections.len() as f64;
        let share = 100.0 / (count + 1.0);
        for percent in &mut self.splitter_percents {
            *percent *= count / (count + 1.0);
        }
        self.sections.insert(position, widgets);
        self.splitter_percents.insert(position, share);
        normalize_percents(&mut self.splitter_percents);
        position
    }

    /// Remove a section and rescale the remaining shares to 100.
    pub(crate) fn remove_section(&mut self, section: usize) {
        if section >= self.sections.len() {
            return;
        }
        self.sections.remove(section);
        if section < self.splitter_percents.len() {
            self.splitter_percents.remove(section);
        }
        let remaining: f64 = self.splitter_percents.iter().sum();
        if remaining > 0.0 {
            for percent in &mut self.splitter_percents {
                *percent *= 100.0 / remaining;
            }
        } else {
            self.reset_splitters();
        }
        normalize_percents(&mut self.splitter_percents);
    }

    /// Equal shares for every section.
    pub(crate) fn reset_splitters(&mut self) {
        let count = self.sections.len();
        self.splitter_percents = vec![100.0 / count.max(1) as f64; count];
        normalize_percents(&mut self.splitter_percents);
    }
}

/// Absorb floating-point drift into the largest share so the sum is 100.
pub(crate) fn normalize_percents(percents: &mut [f64]) {
    if percents.is_empty() {
        return;
    }
    let drift = 100.0 - percents.iter().sum::<f64>();
    if let Some(largest) = percents
        .iter_mut()
        .max_by(|a, b| a.total_cmp(b))
    {
        *largest += drift;
    }
}

/// The four edge panels.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSet {
    left: Panel,
    right: Panel,
    top: Panel,
    bottom: Panel,
}

impl PanelSet {
    /// Four empty panels sharing one sizing.
    #[must_use]
    pub fn uniform(sizing: PanelSizing) -> Self {
        Self {
            left: Panel::new(PanelSide::Left, sizing),
            right: Panel::new(PanelSide::Right, sizing),
            top: Panel::new(PanelSide::Top, sizing),
            bottom: Panel::new(PanelSide::Bottom, sizing),
        }
    }

    pub(crate) fn from_panels(left: Panel, right: Panel, top: Panel, bottom: Panel) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    #[must_use]
    pub fn get(&self, side: PanelSide) -> &Panel {
        match side {
            PanelSide::Left => &self.left,
            PanelSide::Right => &self.right,
            PanelSide::Top => &self.top,
            PanelSide::Bottom => &self.bottom,
        }
    }

    pub(crate) fn get_mut(&mut self, side: PanelSide) -> &mut Panel {
        match side {
            PanelSide::Left => &mut self.left,
            PanelSide::Right => &mut self.right,
            PanelSide::Top => &mut self.top,
            PanelSide::Bottom => &mut self.bottom,
        }
    }

    /// Panels in canonical side order.
    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        [&self.left, &self.right, &self.top, &self.bottom].into_iter()
    }

    /// Locate a docked widget.
    #[must_use]
    pub fn find_widget(&self, widget: &WidgetId) -> Option<(PanelSide, usize, usize)> {
        self.iter().find_map(|panel| {
            panel
                .find_widget(widget)
                .map(|(section, index)| (panel.side, section, index))
        })
    }
}

/// Where a floating widget returns to when sent back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Home {
    pub side: PanelSide,
    pub section: usize,
    pub index: usize,
    /// The widget was the only occupant of its section, so returning home
    /// recreates that section rather than joining a neighbour.
    #[serde(default)]
    pub standalone: bool,
}

impl Home {
    #[must_use]
    pub const fn new(side: PanelSide, section: usize, index: usize) -> Self {
        Self {
            side,
            section,
            index,
            standalone: false,
        }
    }

    #[must_use]
    pub const fn standalone(side: PanelSide, section: usize) -> Self {
        Self {
            side,
            section,
            index: 0,
            standalone: true,
        }
    }
}

/// A widget detached from the panels and positioned freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingWidget {
    pub widget: WidgetId,
    pub bounds: Rect,
    /// Dense stacking rank; the greatest value is front-most.
    pub z_index: usize,
    pub home: Home,
    #[serde(default)]
    pub user_sized: bool,
}

/// Fallbacks used when a mutation has no explicit placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDefaults {
    /// Panel that receives widgets whose home no longer exists.
    pub side: PanelSide,
    pub floating_size: Size,
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            side: PanelSide::Left,
            floating_size: Size::new(320.0, 240.0),
        }
    }
}

/// Current container of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetLocation {
    Docked {
        side: PanelSide,
        section: usize,
        index: usize,
    },
    Floating,
}

/// The complete layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutState {
    pub(crate) viewport: Size,
    pub(crate) defaults: LayoutDefaults,
    pub(crate) tabs: OrdMap<TabId, Tab>,
    pub(crate) widgets: OrdMap<WidgetId, Widget>,
    pub(crate) panels: PanelSet,
    pub(crate) floating: OrdMap<WidgetId, FloatingWidget>,
    pub(crate) extensions: BTreeMap<String, String>,
}

/// Empty layout with four default panels.
#[must_use]
pub fn create_initial_state(
    viewport: Size,
    defaults: LayoutDefaults,
    sizing: PanelSizing,
) -> LayoutState {
    LayoutState {
        viewport,
        defaults,
        tabs: OrdMap::new(),
        widgets: OrdMap::new(),
        panels: PanelSet::uniform(sizing),
        floating: OrdMap::new(),
        extensions: BTreeMap::new(),
    }
}

impl LayoutState {
    /// Empty layout with default panel sizing.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        create_initial_state(viewport, LayoutDefaults::default(), PanelSizing::default())
    }

    /// Start a builder over an empty layout.
    #[must_use]
    pub fn builder(viewport: Size) -> LayoutStateBuilder {
        LayoutStateBuilder::new(Self::new(viewport))
    }

    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    #[must_use]
    pub const fn viewport_rect(&self) -> Rect {
        Rect::from_size(self.viewport)
    }

    #[must_use]
    pub const fn defaults(&self) -> &LayoutDefaults {
        &self.defaults
    }

    /// Host-defined key/value pairs carried through persistence untouched.
    #[must_use]
    pub const fn extensions(&self) -> &BTreeMap<String, String> {
        &self.extensions
    }

    pub fn tab(&self, id: &TabId) -> Result<&Tab, NotFound> {
        self.tabs
            .get(id)
            .ok_or_else(|| NotFound::new(EntityKind::Tab, id))
    }

    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.values()
    }

    #[must_use]
    pub fn contains_tab(&self, id: &TabId) -> bool {
        self.tabs.contains_key(id)
    }

    pub fn widget(&self, id: &WidgetId) -> Result<&Widget, NotFound> {
        self.widgets
            .get(id)
            .ok_or_else(|| NotFound::new(EntityKind::Widget, id))
    }

    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.values()
    }

    #[must_use]
    pub fn contains_widget(&self, id: &WidgetId) -> bool {
        self.widgets.contains_key(id)
    }

    /// The widget currently holding `tab`.
    pub fn widget_of_tab(&self, tab: &TabId) -> Result<&Widget, NotFound> {
        self.tab(tab)?;
        self.widgets
            .values()
            .find(|widget| widget.contains_tab(tab))
            .ok_or_else(|| NotFound::new(EntityKind::Widget, format!("owner of {tab}")))
    }

    pub fn location_of_widget(&self, id: &WidgetId) -> Result<WidgetLocation, NotFound> {
        self.widget(id)?;
        if self.floating.contains_key(id) {
            return Ok(WidgetLocation::Floating);
        }
        self.panels
            .find_widget(id)
            .map(|(side, section, index)| WidgetLocation::Docked {
                side,
                section,
                index,
            })
            .ok_or_else(|| NotFound::new(EntityKind::Widget, id))
    }

    #[must_use]
    pub fn panel(&self, side: PanelSide) -> &Panel {
        self.panels.get(side)
    }

    #[must_use]
    pub const fn panels(&self) -> &PanelSet {
        &self.panels
    }

    pub fn floating_widget(&self, id: &WidgetId) -> Result<&FloatingWidget, NotFound> {
        self.floating
            .get(id)
            .ok_or_else(|| NotFound::new(EntityKind::FloatingWidget, id))
    }

    #[must_use]
    pub fn is_floating(&self, id: &WidgetId) -> bool {
        self.floating.contains_key(id)
    }

    /// Floating widgets ordered back to front.
    #[must_use]
    pub fn floating_by_z(&self) -> Vec<&FloatingWidget> {
        let mut entries: Vec<_> = self.floating.values().collect();
        entries.sort_by_key(|entry| entry.z_index);
        entries
    }

    #[must_use]
    pub fn front_floating(&self) -> Option<&FloatingWidget> {
        self.floating.values().max_by_key(|entry| entry.z_index)
    }

    /// Where the widget would return to: its current slot when docked, or its
    /// recorded home when floating.
    pub fn home_of(&self, id: &WidgetId) -> Result<Home, NotFound> {
        if let Some(entry) = self.floating.get(id) {
            return Ok(entry.home);
        }
        match self.location_of_widget(id)? {
            WidgetLocation::Docked {
                side,
                section,
                index,
            } => {
                let standalone = self.panel(side).sections[section].len() == 1;
                Ok(Home {
                    side,
                    section,
                    index,
                    standalone,
                })
            }
            WidgetLocation::Floating => Err(NotFound::new(EntityKind::FloatingWidget, id)),
        }
    }

    pub fn section_widgets(&self, side: PanelSide, section: usize) -> Result<&[WidgetId], NotFound> {
        self.panel(side)
            .sections
            .get(section)
            .map(Vec::as_slice)
            .ok_or_else(|| NotFound::section(side, section))
    }

    /// Inspect invariants and emit a structured diagnostics report.
    #[must_use]
    pub fn invariant_report(&self) -> InvariantReport {
        build_report(self)
    }

    /// Strict validation: any finding is an error.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let report = self.invariant_report();
        if report.is_ok() {
            Ok(())
        } else {
            Err(LayoutError::InvariantViolation { report })
        }
    }

    /// Viewport used to contain floating bounds, if it has any area.
    pub(crate) fn containment_rect(&self) -> Option<Rect> {
        let rect = self.viewport_rect();
        (!rect.is_empty()).then_some(rect)
    }

    /// Contain `bounds` within the viewport when one is known.
    pub(crate) fn contain(&self, bounds: Rect) -> Rect {
        match self.containment_rect() {
            Some(container) => bounds.contain_within(&container),
            None => bounds,
        }
    }
}

/// Assembles a layout from widgets placed directly into panels or the
/// floating collection. Tabs referenced by widgets but never registered are
/// created with their id as label. Splitter shares are reset to equal for
/// any panel whose sections were touched.
#[derive(Debug, Clone)]
pub struct LayoutStateBuilder {
    state: LayoutState,
    touched: BTreeSet<PanelSide>,
}

impl LayoutStateBuilder {
    fn new(state: LayoutState) -> Self {
        Self {
            state,
            touched: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn defaults(mut self, defaults: LayoutDefaults) -> Self {
        self.state.defaults = defaults;
        self
    }

    /// Apply sizing to the panel on `side`.
    #[must_use]
    pub fn panel_sizing(mut self, side: PanelSide, sizing: PanelSizing) -> Self {
        let panel = self.state.panels.get_mut(side);
        panel.size = sizing.size;
        panel.min_size = sizing.min_size;
        panel.max_size = sizing.max_size;
        panel.max_sections = sizing.max_sections;
        self
    }

    /// Edit panel flags directly.
    #[must_use]
    pub fn configure_panel(mut self, side: PanelSide, edit: impl FnOnce(&mut Panel)) -> Self {
        edit(self.state.panels.get_mut(side));
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.state.extensions.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn tab(mut self, tab: Tab) -> Self {
        self.state.tabs.insert(tab.id.clone(), tab);
        self
    }

    /// Dock `widget` into a new trailing section of the panel on `side`.
    #[must_use]
    pub fn dock(mut self, side: PanelSide, widget: Widget) -> Self {
        self.state
            .panels
            .get_mut(side)
            .sections
            .push(vec![widget.id.clone()]);
        self.touched.insert(side);
        self.register(widget)
    }

    /// Append `widget` to section `section` of `side`, creating the section
    /// when it is one past the end.
    #[must_use]
    pub fn dock_in(mut self, side: PanelSide, section: usize, widget: Widget) -> Self {
        let sections = &mut self.state.panels.get_mut(side).sections;
        if section < sections.len() {
            sections[section].push(widget.id.clone());
        } else {
            sections.push(vec![widget.id.clone()]);
        }
        self.touched.insert(side);
        self.register(widget)
    }

    /// Float `widget` at `bounds`, front-most, homed on the default side.
    #[must_use]
    pub fn float(self, widget: Widget, bounds: Rect) -> Self {
        let side = self.state.defaults.side;
        let section = self.state.panels.get(side).sections.len();
        self.float_with_home(widget, bounds, Home::standalone(side, section))
    }

    #[must_use]
    pub fn float_with_home(mut self, widget: Widget, bounds: Rect, home: Home) -> Self {
        let z_index = self.state.floating.len();
        self.state.floating.insert(
            widget.id.clone(),
            FloatingWidget {
                widget: widget.id.clone(),
                bounds,
                z_index,
                home,
                user_sized: false,
            },
        );
        self.register(widget)
    }

    fn register(mut self, widget: Widget) -> Self {
        for tab in &widget.tabs {
            if !self.state.tabs.contains_key(tab) {
                self.state
                    .tabs
                    .insert(tab.clone(), Tab::new(tab.clone(), tab.as_str()));
            }
        }
        self.state.widgets.insert(widget.id.clone(), widget);
        self
    }

    /// Finish and validate.
    pub fn build(mut self) -> Result<LayoutState, LayoutError> {
        for side in &self.touched {
            self.state.panels.get_mut(*side).reset_splitters();
        }
        self.state.validate()?;
        Ok(self.state)
    }
}
