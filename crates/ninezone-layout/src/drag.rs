#![forbid(unsafe_code)]

//! Drag-and-drop lifecycle.
//!
//! ```text
//! Idle -> Dragging -> Idle
//!           |  ^
//!           +--+  (pointer moves, target re-resolved)
//! ```
//!
//! The machine never mutates a [`LayoutState`]. Dropping yields the single
//! [`LayoutAction`] that realizes the resolved target; the caller dispatches
//! it. Every step returns a [`DragTransition`] carrying a monotonically
//! increasing id, so hosts can log or replay the exact sequence.

use ninezone_core::Point;
use serde::{Deserialize, Serialize};

use crate::action::{LayoutAction, PanelTarget, WidgetPlacement};
use crate::error::LayoutError;
use crate::ids::WidgetIdAllocator;
use crate::state::LayoutState;
use crate::target::{DragItem, DragSource, DropTarget, TargetTuning, resolve_target};

/// An in-flight drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    pub item: DragItem,
    /// Pointer position when the drag began.
    pub origin: Point,
    pub pointer: Point,
    pub target: DropTarget,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Dragging(_) => DragPhase::Dragging,
        }
    }
}

/// Payload-free discriminant of [`DragState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCancelReason {
    EscapeKey,
    PointerCancel,
    FocusLost,
    Programmatic,
    /// Released where nothing accepts the item.
    NoTarget,
    /// The dragged tab or widget disappeared mid-drag.
    StaleItem,
}

/// Explicit diagnostics for lifecycle calls that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    DragAlreadyInProgress,
    PointerUnchanged,
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        item: DragItem,
        target: DropTarget,
    },
    TargetChanged {
        from: DropTarget,
        to: DropTarget,
    },
    Moved {
        pointer: Point,
    },
    Dropped {
        target: DropTarget,
        action: LayoutAction,
    },
    Cancelled {
        reason: DragCancelReason,
    },
    Noop {
        reason: DragNoopReason,
    },
}

impl DragEffect {
    /// The action a drop asks the caller to dispatch.
    #[must_use]
    pub fn dropped_action(&self) -> Option<&LayoutAction> {
        match self {
            Self::Dropped { action, .. } => Some(action),
            _ => None,
        }
    }
}

/// One lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

/// Drag lifecycle machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragMachine {
    state: DragState,
    tuning: TargetTuning,
    transition_counter: u64,
}

impl DragMachine {
    #[must_use]
    pub fn new(tuning: TargetTuning) -> Self {
        Self {
            state: DragState::Idle,
            tuning,
            transition_counter: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub const fn tuning(&self) -> &TargetTuning {
        &self.tuning
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    #[must_use]
    pub const fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging(session) => Some(session),
        }
    }

    /// Start dragging `item` from `pointer`.
    ///
    /// Fails when `item` does not exist in `state`; a drag already in
    /// progress turns the call into a no-op.
    pub fn begin(
        &mut self,
        item: DragItem,
        pointer: Point,
        state: &LayoutState,
    ) -> Result<DragTransition, LayoutError> {
        let from = self.state.phase();
        if self.is_active() {
            return Ok(self.emit(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::DragAlreadyInProgress,
                },
            ));
        }
        let target = resolve_target(state, &item, pointer, &self.tuning)?;
        self.state = DragState::Dragging(DragSession {
            item: item.clone(),
            origin: pointer,
            pointer,
            target: target.clone(),
        });
        Ok(self.emit(from, DragEffect::Started { item, target }))
    }

    /// Track the pointer and re-resolve the drop target against `state`.
    pub fn update(&mut self, pointer: Point, state: &LayoutState) -> DragTransition {
        let from = self.state.phase();
        let DragState::Dragging(session) = &mut self.state else {
            return self.emit(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::IdleWithoutActiveDrag,
                },
            );
        };
        if session.pointer == pointer {
            return self.emit(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::PointerUnchanged,
                },
            );
        }
        let Ok(target) = resolve_target(state, &session.item, pointer, &self.tuning) else {
            return self.cancel(DragCancelReason::StaleItem);
        };
        session.pointer = pointer;
        let effect = if session.target == target {
            DragEffect::Moved { pointer }
        } else {
            let previous = std::mem::replace(&mut session.target, target.clone());
            DragEffect::TargetChanged {
                from: previous,
                to: target,
            }
        };
        self.emit(from, effect)
    }

    /// Release at the last tracked pointer position.
    ///
    /// The target is re-resolved against `state`, so a layout that changed
    /// since the last update still receives a consistent action. Ids for
    /// widgets created by the drop come from `ids`.
    pub fn end(&mut self, state: &LayoutState, ids: &mut WidgetIdAllocator) -> DragTransition {
        let from = self.state.phase();
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return self.emit(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::IdleWithoutActiveDrag,
                },
            );
        };
        let effect = match resolve_target(state, &session.item, session.pointer, &self.tuning) {
            Err(_) => DragEffect::Cancelled {
                reason: DragCancelReason::StaleItem,
            },
            Ok(target) => match drop_action(state, &session.item, &target, ids) {
                Some(action) => DragEffect::Dropped { target, action },
                None => DragEffect::Cancelled {
                    reason: if target.is_none() {
                        DragCancelReason::NoTarget
                    } else {
                        DragCancelReason::StaleItem
                    },
                },
            },
        };
        self.emit(from, effect)
    }

    /// Abandon the drag without producing an action.
    pub fn cancel(&mut self, reason: DragCancelReason) -> DragTransition {
        let from = self.state.phase();
        if !self.is_active() {
            return self.emit(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::IdleWithoutActiveDrag,
                },
            );
        }
        self.state = DragState::Idle;
        self.emit(from, DragEffect::Cancelled { reason })
    }

    fn emit(&mut self, from: DragPhase, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state.phase(),
            effect,
        }
    }
}

/// The action that drops `item` onto `target`, or `None` when nothing
/// should happen (no target, or the item is gone).
///
/// Dragging the only tab of a widget moves the widget itself, so no new
/// widget id is allocated in that case.
pub fn drop_action(
    state: &LayoutState,
    item: &DragItem,
    target: &DropTarget,
    ids: &mut WidgetIdAllocator,
) -> Option<LayoutAction> {
    let panel_target = match *target {
        DropTarget::None => return None,
        DropTarget::Section {
            side,
            section,
            index,
        } => Some(PanelTarget::Section {
            side,
            section,
            index,
        }),
        DropTarget::NewSection { side, position } => {
            Some(PanelTarget::NewSection { side, position })
        }
        DropTarget::TabStrip { .. } | DropTarget::Floating { .. } => None,
    };

    let action = match &item.source {
        DragSource::Widget(widget) => {
            state.widget(widget).ok()?;
            match (target, panel_target) {
                (DropTarget::TabStrip { widget: into, index }, _) => LayoutAction::MergeWidgets {
                    source: widget.clone(),
                    target: into.clone(),
                    index: Some(*index),
                },
                (DropTarget::Floating { bounds }, _) => LayoutAction::FloatWidget {
                    widget: widget.clone(),
                    bounds: Some(*bounds),
                },
                (_, Some(panel)) => LayoutAction::DockWidget {
                    widget: widget.clone(),
                    target: panel,
                },
                _ => return None,
            }
        }
        DragSource::Tab(tab) => {
            let owner = state.widget_of_tab(tab).ok()?;
            let sole = owner.tabs.len() == 1;
            match (target, panel_target) {
                (DropTarget::TabStrip { widget: into, index }, _) => LayoutAction::MoveTab {
                    tab: tab.clone(),
                    widget: into.clone(),
                    index: Some(*index),
                    placement: None,
                },
                (DropTarget::Floating { bounds }, _) if sole => LayoutAction::FloatWidget {
                    widget: owner.id.clone(),
                    bounds: Some(*bounds),
                },
                (DropTarget::Floating { bounds }, _) => LayoutAction::FloatTab {
                    tab: tab.clone(),
                    widget: ids.allocate(state),
                    bounds: Some(*bounds),
                },
                (_, Some(panel)) if sole => LayoutAction::DockWidget {
                    widget: owner.id.clone(),
                    target: panel,
                },
                (_, Some(panel)) => LayoutAction::MoveTab {
                    tab: tab.clone(),
                    widget: ids.allocate(state),
                    index: None,
                    placement: Some(WidgetPlacement::Panel { target: panel }),
                },
                _ => return None,
            }
        }
    };
    Some(action)
}
