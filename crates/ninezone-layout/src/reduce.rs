#![forbid(unsafe_code)]

//! Pure state mutators.
//!
//! [`reduce`] applies one [`LayoutAction`] to a structural copy of the input
//! and returns the copy. On error the copy is dropped, so callers observe
//! either the complete mutation or none of it.
//!
//! Index arguments in docking targets are expressed against the layout as it
//! was before the action: when detaching the moving widget shifts or removes
//! a section of the same panel, the target is adjusted here.

use ninezone_core::{PanelSide, Point, Rect, Size};

use crate::action::{LayoutAction, PanelTarget, WidgetPlacement};
use crate::error::{EntityKind, LayoutError, NotFound};
use crate::ids::{TabId, WidgetId};
use crate::state::{
    FloatingWidget, Home, LayoutState, MIN_SECTION_PERCENT, Tab, Widget, normalize_percents,
};
use crate::validate::{InvariantCode, InvariantReport, ValidationMode};

/// Apply `action` with the default validation mode.
pub fn reduce(state: &LayoutState, action: &LayoutAction) -> Result<LayoutState, LayoutError> {
    reduce_with(state, action, ValidationMode::default())
}

/// Apply `action`, validating the result when `mode` is enabled.
pub fn reduce_with(
    state: &LayoutState,
    action: &LayoutAction,
    mode: ValidationMode,
) -> Result<LayoutState, LayoutError> {
    let mut next = state.clone();
    next.apply_inner(action)?;
    if mode.enabled() {
        next.validate()?;
    }
    Ok(next)
}

/// What detaching a widget from its container left behind.
#[derive(Debug, Clone, PartialEq)]
enum Detached {
    Docked {
        side: PanelSide,
        section: usize,
        index: usize,
        section_removed: bool,
    },
    Floating(FloatingWidget),
}

/// Re-express a pre-detach docking target in post-detach coordinates.
fn adjust_for_detach(target: PanelTarget, detached: &Detached) -> PanelTarget {
    let Detached::Docked {
        side: from_side,
        section: from_section,
        index: from_index,
        section_removed,
    } = *detached
    else {
        return target;
    };
    match target {
        PanelTarget::Section {
            side,
            section,
            index,
        } if side == from_side => {
            if section_removed {
                if section == from_section {
                    PanelTarget::NewSection {
                        side,
                        position: from_section,
                    }
                } else if section > from_section {
                    PanelTarget::Section {
                        side,
                        section: section - 1,
                        index,
                    }
                } else {
                    target
                }
            } else if section == from_section && index > from_index {
                PanelTarget::Section {
                    side,
                    section,
                    index: index - 1,
                }
            } else {
                target
            }
        }
        PanelTarget::NewSection { side, position }
            if side == from_side && section_removed && position > from_section =>
        {
            PanelTarget::NewSection {
                side,
                position: position - 1,
            }
        }
        other => other,
    }
}

/// Shares for the sections not being dragged: proportional to their current
/// shares, none below `floor`, summing to `total`.
fn distribute(total: f64, weights: &[f64], floor: f64) -> Vec<f64> {
    let mut pinned = vec![false; weights.len()];
    loop {
        let pinned_count = pinned.iter().filter(|p| **p).count();
        let free_count = weights.len() - pinned_count;
        let free_total = total - floor * pinned_count as f64;
        let free_weight: f64 = weights
            .iter()
            .zip(&pinned)
            .filter(|(_, p)| !**p)
            .map(|(w, _)| *w)
            .sum();
        let share = |weight: f64| {
            if free_weight > 0.0 {
                weight / free_weight * free_total
            } else {
                free_total / free_count.max(1) as f64
            }
        };

        let mut changed = false;
        for (weight, is_pinned) in weights.iter().zip(pinned.iter_mut()) {
            if !*is_pinned && share(*weight) < floor {
                *is_pinned = true;
                changed = true;
            }
        }
        if !changed {
            return weights
                .iter()
                .zip(&pinned)
                .map(|(weight, is_pinned)| if *is_pinned { floor } else { share(*weight) })
                .collect();
        }
    }
}

impl LayoutState {
    /// Apply `action` with the default validation mode.
    pub fn apply(&self, action: &LayoutAction) -> Result<LayoutState, LayoutError> {
        reduce(self, action)
    }

    fn apply_inner(&mut self, action: &LayoutAction) -> Result<(), LayoutError> {
        match action {
            LayoutAction::AddTab {
                tab,
                widget,
                index,
                placement,
            } => self.add_tab(tab, widget, *index, *placement),
            LayoutAction::MoveTab {
                tab,
                widget,
                index,
                placement,
            } => self.move_tab(tab, widget, *index, *placement, true),
            LayoutAction::RemoveTab { tab } => self.remove_tab(tab),
            LayoutAction::DockWidget { widget, target } => self.dock_widget(widget, *target),
            LayoutAction::FloatWidget { widget, bounds } => self.float_widget(widget, *bounds),
            LayoutAction::SendBack { widget } => self.send_back(widget),
            LayoutAction::BringToFront { widget } => self.bring_to_front(widget),
            LayoutAction::ResizePanel { side, size } => self.resize_panel(*side, *size),
            LayoutAction::SetSplitterPercent {
                side,
                section,
                percent,
            } => self.set_splitter_percent(*side, *section, *percent),
            LayoutAction::MergeWidgets {
                source,
                target,
                index,
            } => self.merge_widgets(source, target, *index),
            LayoutAction::SetPanelCollapsed { side, collapsed } => {
                self.panels.get_mut(*side).collapsed = *collapsed;
                Ok(())
            }
            LayoutAction::TogglePanelCollapsed { side } => {
                let panel = self.panels.get_mut(*side);
                panel.collapsed = !panel.collapsed;
                Ok(())
            }
            LayoutAction::SetPanelPinned { side, pinned } => {
                self.panels.get_mut(*side).pinned = *pinned;
                Ok(())
            }
            LayoutAction::SetPanelSpan { side, span } => self.set_panel_span(*side, *span),
            LayoutAction::ActivateTab { tab } => self.activate_tab(tab),
            LayoutAction::SetTabLabel { tab, label } => {
                let record = self
                    .tabs
                    .get_mut(tab)
                    .ok_or_else(|| NotFound::new(EntityKind::Tab, tab))?;
                record.label.clone_from(label);
                Ok(())
            }
            LayoutAction::FloatTab {
                tab,
                widget,
                bounds,
            } => self.float_tab(tab, widget, *bounds),
            LayoutAction::SetFloatingBounds {
                widget,
                bounds,
                user_sized,
            } => self.set_floating_bounds(widget, *bounds, *user_sized),
            LayoutAction::SetWidgetMinimized { widget, minimized } => {
                let record = self
                    .widgets
                    .get_mut(widget)
                    .ok_or_else(|| NotFound::new(EntityKind::Widget, widget))?;
                record.minimized = *minimized;
                Ok(())
            }
            LayoutAction::ResizeViewport { size } => self.resize_viewport(*size),
        }
    }

    fn rejected(&self, code: InvariantCode, subject: impl ToString, message: String) -> LayoutError {
        LayoutError::InvariantViolation {
            report: InvariantReport::single(self, code, Some(subject.to_string()), message),
        }
    }

    fn check_bounds(&self, widget: &WidgetId, bounds: Rect) -> Result<(), LayoutError> {
        if bounds.is_valid() {
            Ok(())
        } else {
            Err(self.rejected(
                InvariantCode::InvalidFloatingBounds,
                widget,
                format!("floating bounds {bounds:?} for {widget} are invalid"),
            ))
        }
    }

    fn owner_of(&self, tab: &TabId) -> Result<WidgetId, LayoutError> {
        Ok(self.widget_of_tab(tab)?.id.clone())
    }

    /// Bounds for a widget floated without explicit bounds: its active tab's
    /// preferred size and position, else the default size centered in the
    /// viewport.
    #[must_use]
    pub fn preferred_floating_bounds(&self, widget: &Widget) -> Rect {
        let tab = self.tabs.get(&widget.active_tab);
        let size = self.floating_size_for(tab);
        let origin = tab
            .and_then(|tab| tab.preferred_floating_position)
            .unwrap_or_else(|| self.centered_origin(size));
        Rect::from_origin_size(origin, size)
    }

    /// Size a tab would float at.
    #[must_use]
    pub fn floating_size_for(&self, tab: Option<&Tab>) -> Size {
        tab.and_then(|tab| tab.preferred_floating_size)
            .unwrap_or(self.defaults.floating_size)
    }

    fn centered_origin(&self, size: Size) -> Point {
        Point::new(
            ((self.viewport.width - size.width) / 2.0).max(0.0),
            ((self.viewport.height - size.height) / 2.0).max(0.0),
        )
    }

    fn default_home(&self) -> Home {
        let side = self.defaults.side;
        Home::standalone(side, self.panels.get(side).sections.len())
    }

    /// Reassign dense ranks following the current stacking order.
    fn compact_z(&mut self) {
        let mut order: Vec<(usize, WidgetId)> = self
            .floating
            .values()
            .map(|entry| (entry.z_index, entry.widget.clone()))
            .collect();
        order.sort();
        for (rank, (_, id)) in order.into_iter().enumerate() {
            if let Some(entry) = self.floating.get_mut(&id) {
                entry.z_index = rank;
            }
        }
    }

    fn detach_widget(&mut self, id: &WidgetId) -> Result<Detached, LayoutError> {
        if let Some(entry) = self.floating.remove(id) {
            self.compact_z();
            return Ok(Detached::Floating(entry));
        }
        let (side, section, index) = self
            .panels
            .find_widget(id)
            .ok_or_else(|| NotFound::new(EntityKind::Widget, id))?;
        let panel = self.panels.get_mut(side);
        panel.sections[section].remove(index);
        let section_removed = panel.sections[section].is_empty();
        if section_removed {
            panel.remove_section(section);
        }
        Ok(Detached::Docked {
            side,
            section,
            index,
            section_removed,
        })
    }

    fn remove_widget(&mut self, id: &WidgetId) -> Result<Detached, LayoutError> {
        let detached = self.detach_widget(id)?;
        self.widgets.remove(id);
        Ok(detached)
    }

    fn attach_docked(&mut self, id: &WidgetId, target: PanelTarget) -> Result<(), LayoutError> {
        match target {
            PanelTarget::Section {
                side,
                section,
                index,
            } => {
                let widgets = self
                    .panels
                    .get_mut(side)
                    .sections
                    .get_mut(section)
                    .ok_or_else(|| NotFound::section(side, section))?;
                let index = index.min(widgets.len());
                widgets.insert(index, id.clone());
            }
            PanelTarget::NewSection { side, position } => {
                let panel = self.panels.get_mut(side);
                let is_full = panel.is_full();
                match panel.sections.last_mut() {
                    Some(last) if is_full => last.push(id.clone()),
                    _ => {
                        panel.insert_section(position, vec![id.clone()]);
                    }
                }
            }
        }
        Ok(())
    }

    fn attach_floating(&mut self, id: &WidgetId, bounds: Rect, home: Home, user_sized: bool) {
        let entry = FloatingWidget {
            widget: id.clone(),
            bounds: self.contain(bounds),
            z_index: self.floating.len(),
            home,
            user_sized,
        };
        self.floating.insert(id.clone(), entry);
    }

    /// Remove `tab` from `owner`, fixing the active tab and dropping the
    /// widget once it is empty. Returns where the dropped widget was.
    fn take_tab(&mut self, tab: &TabId, owner: &WidgetId) -> Result<Option<Detached>, LayoutError> {
        let widget = self
            .widgets
            .get_mut(owner)
            .ok_or_else(|| NotFound::new(EntityKind::Widget, owner))?;
        let index = widget
            .tab_index(tab)
            .ok_or_else(|| NotFound::new(EntityKind::Tab, tab))?;
        widget.tabs.remove(index);
        if widget.tabs.is_empty() {
            return self.remove_widget(owner).map(Some);
        }
        if widget.active_tab == *tab {
            let neighbour = index.min(widget.tabs.len() - 1);
            widget.active_tab = widget.tabs[neighbour].clone();
        }
        Ok(None)
    }

    /// Home for a widget created from a tab leaving `owner`.
    ///
    /// A floating owner passes on its own home. A docked owner that keeps
    /// other tabs is followed by the new widget; one that loses its last tab
    /// is replaced by it.
    fn tear_out_home(&self, owner: &Widget) -> Result<Home, LayoutError> {
        if let Some(entry) = self.floating.get(&owner.id) {
            return Ok(entry.home);
        }
        let slot = self.home_of(&owner.id)?;
        if owner.tabs.len() == 1 {
            Ok(slot)
        } else {
            Ok(Home::new(slot.side, slot.section, slot.index + 1))
        }
    }

    /// Put `tab` into `widget`, creating the widget at `placement` when it
    /// does not exist yet.
    fn place_tab(
        &mut self,
        tab: &TabId,
        widget: &WidgetId,
        index: Option<usize>,
        placement: Option<WidgetPlacement>,
        activate: bool,
        home: Option<Home>,
    ) -> Result<(), LayoutError> {
        if let Some(existing) = self.widgets.get_mut(widget) {
            let at = index.unwrap_or(existing.tabs.len()).min(existing.tabs.len());
            existing.tabs.insert(at, tab.clone());
            if activate {
                existing.active_tab = tab.clone();
                existing.minimized = false;
            }
            return Ok(());
        }

        let placement = placement.ok_or_else(|| NotFound::new(EntityKind::Widget, widget))?;
        let created = Widget::single(widget.clone(), tab.clone());
        match placement {
            WidgetPlacement::Panel { target } => {
                self.widgets.insert(widget.clone(), created);
                self.attach_docked(widget, target)
            }
            WidgetPlacement::Floating { bounds } => {
                let bounds = match bounds {
                    Some(bounds) => {
                        self.check_bounds(widget, bounds)?;
                        bounds
                    }
                    None => self.preferred_floating_bounds(&created),
                };
                let home = home.unwrap_or_else(|| self.default_home());
                self.widgets.insert(widget.clone(), created);
                self.attach_floating(widget, bounds, home, false);
                Ok(())
            }
        }
    }

    fn add_tab(
        &mut self,
        tab: &Tab,
        widget: &WidgetId,
        index: Option<usize>,
        placement: Option<WidgetPlacement>,
    ) -> Result<(), LayoutError> {
        if self.tabs.contains_key(&tab.id) {
            return self.move_tab(&tab.id, widget, index, placement, false);
        }
        if !self.widgets.contains_key(widget) && placement.is_none() {
            return Err(NotFound::new(EntityKind::Widget, widget).into());
        }
        self.tabs.insert(tab.id.clone(), tab.clone());
        self.place_tab(&tab.id, widget, index, placement, false, None)
    }

    fn move_tab(
        &mut self,
        tab: &TabId,
        widget: &WidgetId,
        index: Option<usize>,
        placement: Option<WidgetPlacement>,
        activate: bool,
    ) -> Result<(), LayoutError> {
        let source = self.owner_of(tab)?;
        if source == *widget {
            let record = self
                .widgets
                .get_mut(widget)
                .ok_or_else(|| NotFound::new(EntityKind::Widget, widget))?;
            let from = record
                .tab_index(tab)
                .ok_or_else(|| NotFound::new(EntityKind::Tab, tab))?;
            let slot = index.unwrap_or(record.tabs.len()).min(record.tabs.len());
            let to = if slot > from { slot - 1 } else { slot };
            let moved = record.tabs.remove(from);
            record.tabs.insert(to, moved);
            if activate {
                record.active_tab = tab.clone();
                record.minimized = false;
            }
            return Ok(());
        }

        if !self.widgets.contains_key(widget) && placement.is_none() {
            return Err(NotFound::new(EntityKind::Widget, widget).into());
        }
        let owner = self.widget(&source)?.clone();
        let home = self.tear_out_home(&owner)?;
        let placement = match (placement, self.take_tab(tab, &source)?) {
            (Some(WidgetPlacement::Panel { target }), Some(detached)) => {
                Some(WidgetPlacement::Panel {
                    target: adjust_for_detach(target, &detached),
                })
            }
            (placement, _) => placement,
        };
        self.place_tab(tab, widget, index, placement, activate, Some(home))
    }

    fn remove_tab(&mut self, tab: &TabId) -> Result<(), LayoutError> {
        let owner = self.owner_of(tab)?;
        self.take_tab(tab, &owner)?;
        self.tabs.remove(tab);
        Ok(())
    }

    fn dock_widget(&mut self, widget: &WidgetId, target: PanelTarget) -> Result<(), LayoutError> {
        self.widget(widget)?;
        let detached = self.detach_widget(widget)?;
        self.attach_docked(widget, adjust_for_detach(target, &detached))
    }

    fn float_widget(&mut self, widget: &WidgetId, bounds: Option<Rect>) -> Result<(), LayoutError> {
        let record = self.widget(widget)?.clone();
        if let Some(bounds) = bounds {
            self.check_bounds(widget, bounds)?;
        }

        if self.floating.contains_key(widget) {
            if let Some(bounds) = bounds {
                let contained = self.contain(bounds);
                if let Some(entry) = self.floating.get_mut(widget) {
                    entry.bounds = contained;
                }
            }
            return self.bring_to_front(widget);
        }

        let home = self.home_of(widget)?;
        self.detach_widget(widget)?;
        let bounds = bounds.unwrap_or_else(|| self.preferred_floating_bounds(&record));
        self.attach_floating(widget, bounds, home, false);
        Ok(())
    }

    /// Docking target for a widget returning to `home`.
    fn home_target(&self, home: Home) -> PanelTarget {
        let panel = self.panels.get(home.side);
        let len = panel.sections.len();
        if home.standalone && !panel.is_full() {
            return PanelTarget::NewSection {
                side: home.side,
                position: home.section.min(len),
            };
        }
        if home.section < len {
            return PanelTarget::Section {
                side: home.side,
                section: home.section,
                index: home.index,
            };
        }
        if !panel.is_full() {
            return PanelTarget::NewSection {
                side: home.side,
                position: len,
            };
        }

        let side = self.defaults.side;
        let fallback = self.panels.get(side);
        match fallback.sections.last() {
            Some(last) if fallback.is_full() => PanelTarget::Section {
                side,
                section: fallback.sections.len() - 1,
                index: last.len(),
            },
            _ => PanelTarget::NewSection {
                side,
                position: fallback.sections.len(),
            },
        }
    }

    fn send_back(&mut self, widget: &WidgetId) -> Result<(), LayoutError> {
        let home = self.floating_widget(widget)?.home;
        self.detach_widget(widget)?;
        let target = self.home_target(home);
        self.attach_docked(widget, target)
    }

    fn bring_to_front(&mut self, widget: &WidgetId) -> Result<(), LayoutError> {
        let entry = self
            .floating
            .get_mut(widget)
            .ok_or_else(|| NotFound::new(EntityKind::FloatingWidget, widget))?;
        entry.z_index = usize::MAX;
        self.compact_z();
        Ok(())
    }

    fn resize_panel(&mut self, side: PanelSide, size: f64) -> Result<(), LayoutError> {
        if !size.is_finite() {
            return Err(self.rejected(
                InvariantCode::PanelSizeOutOfRange,
                side,
                format!("panel {side} size {size} is not finite"),
            ));
        }
        let panel = self.panels.get_mut(side);
        panel.size = size.max(panel.min_size).min(panel.max_size);
        Ok(())
    }

    fn set_splitter_percent(
        &mut self,
        side: PanelSide,
        section: usize,
        percent: f64,
    ) -> Result<(), LayoutError> {
        if !percent.is_finite() {
            return Err(self.rejected(
                InvariantCode::SplitterOutOfRange,
                side,
                format!("splitter share {percent} for {side}/{section} is not finite"),
            ));
        }
        let panel = self.panels.get_mut(side);
        let count = panel.sections.len();
        if section >= count {
            return Err(NotFound::section(side, section).into());
        }
        if count == 1 {
            panel.splitter_percents = vec![100.0];
            return Ok(());
        }

        let floor = MIN_SECTION_PERCENT.min(100.0 / count as f64);
        let target = percent.max(floor).min(100.0 - floor * (count - 1) as f64);
        let others: Vec<f64> = panel
            .splitter_percents
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != section)
            .map(|(_, share)| *share)
            .collect();
        let mut rest = distribute(100.0 - target, &others, floor).into_iter();
        panel.splitter_percents = (0..count)
            .map(|index| {
                if index == section {
                    target
                } else {
                    rest.next().unwrap_or(floor)
                }
            })
            .collect();
        normalize_percents(&mut panel.splitter_percents);
        Ok(())
    }

    fn merge_widgets(
        &mut self,
        source: &WidgetId,
        target: &WidgetId,
        index: Option<usize>,
    ) -> Result<(), LayoutError> {
        let moved = self.widget(source)?.clone();
        self.widget(target)?;
        if source == target {
            return Err(self.rejected(
                InvariantCode::SelfMerge,
                source,
                format!("widget {source} cannot merge into itself"),
            ));
        }

        self.remove_widget(source)?;
        let receiver = self
            .widgets
            .get_mut(target)
            .ok_or_else(|| NotFound::new(EntityKind::Widget, target))?;
        let at = index.unwrap_or(receiver.tabs.len()).min(receiver.tabs.len());
        let tail = receiver.tabs.split_off(at);
        receiver.tabs.extend(moved.tabs);
        receiver.tabs.extend(tail);
        receiver.active_tab = moved.active_tab;
        receiver.minimized = false;
        Ok(())
    }

    fn set_panel_span(&mut self, side: PanelSide, span: bool) -> Result<(), LayoutError> {
        if !side.is_horizontal() {
            return Err(NotFound::new(EntityKind::PanelSpan, side).into());
        }
        self.panels.get_mut(side).span = span;
        Ok(())
    }

    fn activate_tab(&mut self, tab: &TabId) -> Result<(), LayoutError> {
        let owner = self.owner_of(tab)?;
        let widget = self
            .widgets
            .get_mut(&owner)
            .ok_or_else(|| NotFound::new(EntityKind::Widget, &owner))?;
        widget.active_tab = tab.clone();
        widget.minimized = false;
        Ok(())
    }

    fn float_tab(
        &mut self,
        tab: &TabId,
        widget: &WidgetId,
        bounds: Option<Rect>,
    ) -> Result<(), LayoutError> {
        let owner = self.widget_of_tab(tab)?.clone();
        if owner.tabs.len() == 1 {
            return self.float_widget(&owner.id, bounds);
        }
        if self.widgets.contains_key(widget) {
            return Err(self.rejected(
                InvariantCode::DuplicateWidgetId,
                widget,
                format!("widget {widget} already exists"),
            ));
        }
        if let Some(bounds) = bounds {
            self.check_bounds(widget, bounds)?;
        }

        let home = self.tear_out_home(&owner)?;
        self.take_tab(tab, &owner.id)?;
        let created = Widget::single(widget.clone(), tab.clone());
        let bounds = bounds.unwrap_or_else(|| self.preferred_floating_bounds(&created));
        self.widgets.insert(widget.clone(), created);
        self.attach_floating(widget, bounds, home, false);
        Ok(())
    }

    fn set_floating_bounds(
        &mut self,
        widget: &WidgetId,
        bounds: Rect,
        user_sized: bool,
    ) -> Result<(), LayoutError> {
        self.floating_widget(widget)?;
        self.check_bounds(widget, bounds)?;
        let contained = self.contain(bounds);
        if let Some(entry) = self.floating.get_mut(widget) {
            entry.bounds = contained;
            entry.user_sized = user_sized;
        }
        Ok(())
    }

    fn resize_viewport(&mut self, size: Size) -> Result<(), LayoutError> {
        if !size.is_valid() {
            return Err(self.rejected(
                InvariantCode::InvalidViewport,
                "viewport",
                format!("viewport {}x{} is invalid", size.width, size.height),
            ));
        }
        self.viewport = size;
        let ids: Vec<WidgetId> = self.floating.keys().cloned().collect();
        for id in ids {
            let Some(bounds) = self.floating.get(&id).map(|entry| entry.bounds) else {
                continue;
            };
            let contained = self.contain(bounds);
            if let Some(entry) = self.floating.get_mut(&id) {
                entry.bounds = contained;
            }
        }
        Ok(())
    }
}
