#![forbid(unsafe_code)]

//! Drop-target resolution.
//!
//! Resolution is a pure function of the layout, the dragged item, the pointer
//! position, and [`TargetTuning`]. Candidates are tested in a fixed priority
//! order and the first match wins:
//!
//! 1. pointer outside the viewport: no target;
//! 2. the front-most floating widget under the pointer occludes everything
//!    beneath it (its tab strip, else a floating drop);
//! 3. docked widget tab strips;
//! 4. panel sections, inflated by the merge margin;
//! 5. panel edge bands, offering a new section;
//! 6. a free-floating drop.

use ninezone_core::{PanelSide, Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::error::NotFound;
use crate::ids::{TabId, WidgetId};
use crate::solve::{LayoutGeometry, PanelGeometry};
use crate::state::{LayoutState, Tab, WidgetLocation};

/// Hit-test thresholds, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetTuning {
    /// Height of the tab strip at the top of every widget.
    pub tab_strip_height: f64,
    /// Nominal width of one tab, used to pick an insertion slot.
    pub tab_width: f64,
    /// How far outside a section rectangle a drop still targets it.
    pub section_margin: f64,
    /// Thickness of the band that offers a new section along a panel edge.
    pub edge_band: f64,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            tab_strip_height: 24.0,
            tab_width: 96.0,
            section_margin: 12.0,
            edge_band: 24.0,
        }
    }
}

impl TargetTuning {
    /// Human-readable problems, empty when the tuning is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("tab_strip_height", self.tab_strip_height),
            ("tab_width", self.tab_width),
            ("section_margin", self.section_margin),
            ("edge_band", self.edge_band),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} ({value}) must be finite and >= 0"));
            }
        }
        if self.tab_width <= 0.0 {
            errors.push(format!("tab_width ({}) must be > 0", self.tab_width));
        }
        errors
    }
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DragSource {
    Tab(TabId),
    Widget(WidgetId),
}

/// A drag payload: the source plus where inside it the pointer grabbed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragItem {
    pub source: DragSource,
    /// Pointer offset from the dragged item's top-left corner.
    #[serde(default)]
    pub grab_offset: Point,
}

impl DragItem {
    pub fn tab(id: impl Into<TabId>) -> Self {
        Self {
            source: DragSource::Tab(id.into()),
            grab_offset: Point::ORIGIN,
        }
    }

    pub fn widget(id: impl Into<WidgetId>) -> Self {
        Self {
            source: DragSource::Widget(id.into()),
            grab_offset: Point::ORIGIN,
        }
    }

    #[must_use]
    pub fn with_grab_offset(mut self, offset: Point) -> Self {
        self.grab_offset = offset;
        self
    }
}

/// The resolved drop destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DropTarget {
    None,
    /// Merge into (or reorder within) a widget's tab strip.
    TabStrip { widget: WidgetId, index: usize },
    /// Join an existing section before the widget at `index`.
    Section {
        side: PanelSide,
        section: usize,
        index: usize,
    },
    /// Open a new section at `position`.
    NewSection { side: PanelSide, position: usize },
    /// Float at `bounds`.
    Floating { bounds: Rect },
}

impl DropTarget {
    #[must_use]
    pub const fn kind(&self) -> DropTargetKind {
        match self {
            Self::None => DropTargetKind::None,
            Self::TabStrip { .. } => DropTargetKind::WidgetTabStrip,
            Self::Section { .. } => DropTargetKind::PanelSection,
            Self::NewSection { .. } => DropTargetKind::PanelEdge,
            Self::Floating { .. } => DropTargetKind::FloatingWindow,
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Payload-free discriminant of [`DropTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropTargetKind {
    None,
    WidgetTabStrip,
    PanelSection,
    PanelEdge,
    FloatingWindow,
}

/// Properties of the dragged item that constrain its targets.
struct DragProfile<'a> {
    tabs: Vec<&'a Tab>,
    /// Widget that moves as a whole (widget drags only).
    moving_widget: Option<&'a WidgetId>,
    /// Widget the dragged tabs currently live in.
    owner: &'a WidgetId,
    floating_size: Size,
}

impl<'a> DragProfile<'a> {
    fn new(state: &'a LayoutState, item: &DragItem) -> Result<Self, NotFound> {
        match &item.source {
            DragSource::Tab(tab) => {
                let record = state.tab(tab)?;
                let owner = state.widget_of_tab(tab)?;
                Ok(Self {
                    tabs: vec![record],
                    moving_widget: None,
                    owner: &owner.id,
                    floating_size: state.floating_size_for(Some(record)),
                })
            }
            DragSource::Widget(widget) => {
                let record = state.widget(widget)?;
                let tabs = record
                    .tabs
                    .iter()
                    .map(|tab| state.tab(tab))
                    .collect::<Result<Vec<_>, _>>()?;
                let floating_size = match state.floating_widget(widget) {
                    Ok(entry) => entry.bounds.size(),
                    Err(_) => state.preferred_floating_bounds(record).size(),
                };
                Ok(Self {
                    tabs,
                    moving_widget: Some(&record.id),
                    owner: &record.id,
                    floating_size,
                })
            }
        }
    }

    fn allows_side(&self, side: PanelSide) -> bool {
        self.tabs.iter().all(|tab| tab.allows_side(side))
    }

    fn allows_merge(&self) -> bool {
        self.tabs.iter().all(|tab| tab.allow_merge)
    }

    /// Whether the dragged tabs may be dropped into `target`'s tab strip.
    fn can_enter(&self, state: &LayoutState, target: &WidgetId) -> bool {
        if self.moving_widget == Some(target) {
            return false;
        }
        if target == self.owner {
            // Reordering within the owning widget is not a merge.
            return true;
        }
        let Ok(widget) = state.widget(target) else {
            return false;
        };
        let target_merges = widget
            .tabs
            .iter()
            .all(|tab| state.tab(tab).is_ok_and(|tab| tab.allow_merge));
        let side_ok = match state.location_of_widget(target) {
            Ok(WidgetLocation::Docked { side, .. }) => self.allows_side(side),
            _ => true,
        };
        self.allows_merge() && target_merges && side_ok
    }
}

/// Index of the tab slot nearest to `x` in a strip holding `count` tabs.
fn tab_slot(strip: Rect, x: f64, count: usize, tab_width: f64) -> usize {
    let raw = ((x - strip.x) / tab_width).round();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        (raw as usize).min(count)
    }
}

/// Number of rectangles whose centre precedes `pointer` along `side`'s
/// stacking axis.
fn slot_along(side: PanelSide, pointer: Point, centres: impl Iterator<Item = Point>) -> usize {
    centres
        .filter(|centre| {
            if side.is_horizontal() {
                centre.x < pointer.x
            } else {
                centre.y < pointer.y
            }
        })
        .count()
}

/// Band along the inner edge of a panel where a new section is offered.
fn edge_band(panel: &PanelGeometry, band: f64) -> Rect {
    let rect = panel.rect;
    if panel.visible {
        match panel.side {
            PanelSide::Left => Rect::new(rect.right(), rect.y, band, rect.height),
            PanelSide::Right => Rect::new(rect.x - band, rect.y, band, rect.height),
            PanelSide::Top => Rect::new(rect.x, rect.bottom(), rect.width, band),
            PanelSide::Bottom => Rect::new(rect.x, rect.y - band, rect.width, band),
        }
    } else {
        match panel.side {
            PanelSide::Left => Rect::new(rect.x, rect.y, band, rect.height),
            PanelSide::Right => Rect::new(rect.right() - band, rect.y, band, rect.height),
            PanelSide::Top => Rect::new(rect.x, rect.y, rect.width, band),
            PanelSide::Bottom => Rect::new(rect.x, rect.bottom() - band, rect.width, band),
        }
    }
}

/// Resolve the drop target under `pointer`.
///
/// Fails only when the dragged item no longer exists in `state`.
pub fn resolve_target(
    state: &LayoutState,
    item: &DragItem,
    pointer: Point,
    tuning: &TargetTuning,
) -> Result<DropTarget, NotFound> {
    let geometry = LayoutGeometry::solve(state, tuning);
    resolve_target_in(state, &geometry, item, pointer, tuning)
}

/// Resolve against an already solved geometry of `state`.
pub fn resolve_target_in(
    state: &LayoutState,
    geometry: &LayoutGeometry,
    item: &DragItem,
    pointer: Point,
    tuning: &TargetTuning,
) -> Result<DropTarget, NotFound> {
    let profile = DragProfile::new(state, item)?;
    if !pointer.is_finite() || !geometry.viewport.contains(pointer) {
        return Ok(DropTarget::None);
    }

    let floating_drop = || {
        let origin = pointer.minus(item.grab_offset);
        let bounds = Rect::from_origin_size(origin, profile.floating_size);
        DropTarget::Floating {
            bounds: state.contain(bounds),
        }
    };

    let occluder = geometry.floating_front_to_back().find(|entry| {
        profile.moving_widget != Some(&entry.widget) && entry.rect.contains(pointer)
    });
    if let Some(entry) = occluder {
        if entry.tab_strip.contains(pointer) && profile.can_enter(state, &entry.widget) {
            let count = state.widget(&entry.widget)?.tabs.len();
            return Ok(DropTarget::TabStrip {
                widget: entry.widget.clone(),
                index: tab_slot(entry.tab_strip, pointer.x, count, tuning.tab_width),
            });
        }
        return Ok(floating_drop());
    }

    for (_, _, slot) in geometry.docked_widgets() {
        if slot.tab_strip.contains(pointer) && profile.can_enter(state, &slot.widget) {
            let count = state.widget(&slot.widget)?.tabs.len();
            return Ok(DropTarget::TabStrip {
                widget: slot.widget.clone(),
                index: tab_slot(slot.tab_strip, pointer.x, count, tuning.tab_width),
            });
        }
    }

    let open_panels = || {
        geometry
            .panels
            .iter()
            .filter(|panel| panel.visible && profile.allows_side(panel.side))
    };
    let exact = open_panels().find_map(|panel| {
        panel
            .sections
            .iter()
            .find(|section| section.rect.contains(pointer))
            .map(|section| (panel.side, section))
    });
    let hit = exact.or_else(|| {
        open_panels().find_map(|panel| {
            panel
                .sections
                .iter()
                .find(|section| section.rect.inflate(tuning.section_margin).contains(pointer))
                .map(|section| (panel.side, section))
        })
    });
    if let Some((side, section)) = hit {
        let index = slot_along(
            side,
            pointer,
            section.widgets.iter().map(|slot| slot.rect.center()),
        );
        return Ok(DropTarget::Section {
            side,
            section: section.index,
            index,
        });
    }

    for panel in &geometry.panels {
        let record = state.panel(panel.side);
        if record.is_full() || !profile.allows_side(panel.side) {
            continue;
        }
        if edge_band(panel, tuning.edge_band).contains(pointer) {
            let position = if panel.visible {
                slot_along(
                    panel.side,
                    pointer,
                    panel.sections.iter().map(|section| section.rect.center()),
                )
            } else {
                record.sections.len()
            };
            return Ok(DropTarget::NewSection {
                side: panel.side,
                position,
            });
        }
    }

    Ok(floating_drop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Widget;

    fn wid(raw: &str) -> WidgetId {
        WidgetId::new(raw)
    }

    fn resolve(state: &LayoutState, item: &DragItem, x: f64, y: f64) -> DropTarget {
        resolve_target(state, item, Point::new(x, y), &TargetTuning::default())
            .expect("item exists")
    }

    // Left panel 240 wide with sections [l1] and [l2, l3]; bottom panel 240
    // tall with [b1]; floating f1 at (500, 100, 200, 150).
    fn sample() -> LayoutState {
        LayoutState::builder(Size::new(1000.0, 800.0))
            .dock(PanelSide::Left, Widget::single("l1", "t1").with_tab("t1b"))
            .dock(PanelSide::Left, Widget::single("l2", "t2"))
            .dock_in(PanelSide::Left, 1, Widget::single("l3", "t3"))
            .dock(PanelSide::Bottom, Widget::single("b1", "t4"))
            .float(Widget::single("f1", "t5"), Rect::new(500.0, 100.0, 200.0, 150.0))
            .tab(Tab::new("t6", "Lonely"))
            .float(Widget::single("f2", "t6"), Rect::new(800.0, 300.0, 100.0, 100.0))
            .build()
            .expect("valid")
    }

    #[test]
    fn pointer_outside_viewport_has_no_target() {
        let state = sample();
        assert_eq!(
            resolve(&state, &DragItem::widget("f2"), -5.0, 10.0),
            DropTarget::None
        );
        assert_eq!(
            resolve(&state, &DragItem::widget("f2"), 10.0, 800.0),
            DropTarget::None
        );
    }

    #[test]
    fn tab_strip_picks_nearest_slot() {
        let state = sample();
        let target = resolve(&state, &DragItem::widget("f2"), 100.0, 10.0);
        assert_eq!(
            target,
            DropTarget::TabStrip {
                widget: wid("l1"),
                index: 1
            }
        );
        let target = resolve(&state, &DragItem::widget("f2"), 230.0, 10.0);
        assert_eq!(
            target,
            DropTarget::TabStrip {
                widget: wid("l1"),
                index: 2
            }
        );
    }

    #[test]
    fn own_widget_strip_is_excluded_for_widget_drags() {
        let state = sample();
        let target = resolve(&state, &DragItem::widget("l1"), 100.0, 10.0);
        assert_eq!(target.kind(), DropTargetKind::PanelSection);
    }

    #[test]
    fn tab_drag_may_reorder_within_owner() {
        let state = sample();
        let target = resolve(&state, &DragItem::tab("t1"), 200.0, 10.0);
        assert_eq!(
            target,
            DropTarget::TabStrip {
                widget: wid("l1"),
                index: 2
            }
        );
    }

    #[test]
    fn merge_disallowed_tabs_skip_tab_strips() {
        let state = LayoutState::builder(Size::new(1000.0, 800.0))
            .tab(Tab::new("solo", "Solo").with_allow_merge(false))
            .dock(PanelSide::Left, Widget::single("l1", "solo"))
            .float(Widget::single("f1", "t1"), Rect::new(500.0, 100.0, 200.0, 150.0))
            .build()
            .expect("valid");
        let target = resolve(&state, &DragItem::widget("f1"), 100.0, 10.0);
        assert_eq!(
            target,
            DropTarget::Section {
                side: PanelSide::Left,
                section: 0,
                index: 0
            }
        );
    }

    #[test]
    fn section_index_follows_widget_centres() {
        let state = sample();
        // Section 1 spans y 400..800 with l2 (400..600) and l3 (600..800).
        let target = resolve(&state, &DragItem::widget("f2"), 100.0, 450.0);
        assert_eq!(
            target,
            DropTarget::Section {
                side: PanelSide::Left,
                section: 1,
                index: 0
            }
        );
        let target = resolve(&state, &DragItem::widget("f2"), 100.0, 750.0);
        assert_eq!(
            target,
            DropTarget::Section {
                side: PanelSide::Left,
                section: 1,
                index: 2
            }
        );
    }

    #[test]
    fn section_margin_extends_hit_area() {
        let state = sample();
        let target = resolve(&state, &DragItem::widget("f2"), 245.0, 100.0);
        assert_eq!(
            target,
            DropTarget::Section {
                side: PanelSide::Left,
                section: 0,
                index: 0
            }
        );
    }

    #[test]
    fn edge_band_of_hidden_panel_offers_new_section() {
        let state = sample();
        let target = resolve(&state, &DragItem::widget("f2"), 990.0, 100.0);
        assert_eq!(
            target,
            DropTarget::NewSection {
                side: PanelSide::Right,
                position: 0
            }
        );
    }

    #[test]
    fn edge_band_of_visible_panel_positions_by_centre() {
        let state = sample();
        // Bottom panel spans x 240..1000; its band sits just above y 560.
        let target = resolve(&state, &DragItem::widget("f2"), 900.0, 545.0);
        assert_eq!(
            target,
            DropTarget::NewSection {
                side: PanelSide::Bottom,
                position: 1
            }
        );
    }

    #[test]
    fn full_panel_offers_no_new_section() {
        let state = sample();
        // Just beyond the left panel's section margin, in its edge band.
        let target = resolve(&state, &DragItem::widget("f2"), 258.0, 100.0);
        assert_eq!(target.kind(), DropTargetKind::FloatingWindow);
    }

    #[test]
    fn floating_widget_occludes_targets_beneath() {
        let state = LayoutState::builder(Size::new(1000.0, 800.0))
            .dock(PanelSide::Left, Widget::single("l1", "t1"))
            .float(Widget::single("f1", "t2"), Rect::new(0.0, 0.0, 300.0, 300.0))
            .float(Widget::single("f2", "t3"), Rect::new(600.0, 600.0, 100.0, 100.0))
            .build()
            .expect("valid");
        let target = resolve(&state, &DragItem::widget("f2"), 100.0, 10.0);
        assert_eq!(
            target,
            DropTarget::TabStrip {
                widget: wid("f1"),
                index: 1
            }
        );
        let target = resolve(&state, &DragItem::widget("f2"), 100.0, 150.0);
        assert_eq!(target.kind(), DropTargetKind::FloatingWindow);
    }

    #[test]
    fn allowed_sides_skip_disallowed_panels() {
        let state = LayoutState::builder(Size::new(1000.0, 800.0))
            .tab(Tab::new("t1", "Pinned").with_allowed_sides([PanelSide::Right]))
            .float(Widget::single("f1", "t1"), Rect::new(400.0, 400.0, 100.0, 100.0))
            .build()
            .expect("valid");
        let item = DragItem::widget("f1");
        assert_eq!(resolve(&state, &item, 5.0, 300.0).kind(), DropTargetKind::FloatingWindow);
        assert_eq!(resolve(&state, &item, 995.0, 300.0).kind(), DropTargetKind::PanelEdge);
    }

    #[test]
    fn floating_drop_is_contained_and_offset_by_grab() {
        let state = sample();
        let item = DragItem::widget("f2").with_grab_offset(Point::new(10.0, 5.0));
        let target = resolve(&state, &item, 400.0, 300.0);
        assert_eq!(
            target,
            DropTarget::Floating {
                bounds: Rect::new(390.0, 295.0, 100.0, 100.0)
            }
        );
        let target = resolve(&state, &item, 960.0, 300.0);
        assert_eq!(
            target,
            DropTarget::Floating {
                bounds: Rect::new(900.0, 295.0, 100.0, 100.0)
            }
        );
    }

    #[test]
    fn stale_item_is_reported() {
        let state = sample();
        let err = resolve_target(
            &state,
            &DragItem::widget("gone"),
            Point::new(1.0, 1.0),
            &TargetTuning::default(),
        )
        .expect_err("stale");
        assert_eq!(err.kind, crate::error::EntityKind::Widget);
    }

    #[test]
    fn tuning_validation_flags_bad_values() {
        let tuning = TargetTuning {
            tab_width: 0.0,
            edge_band: f64::NAN,
            ..TargetTuning::default()
        };
        assert_eq!(tuning.validate().len(), 2);
        assert!(TargetTuning::default().validate().is_empty());
    }
}
