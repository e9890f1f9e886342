#![forbid(unsafe_code)]

//! The single owner of the current layout.
//!
//! # Design
//!
//! [`LayoutController`] holds the published `Arc<LayoutState>` and applies
//! actions one at a time through the reducer. After a successful action the
//! new state is published to every live observer synchronously, then any
//! follow-up actions observers queued through a [`Dispatcher`] are drained in
//! FIFO order. Follow-ups are never applied re-entrantly.
//!
//! # Failure Modes
//!
//! - **Rejected action**: the published state and version are unchanged and
//!   the error is returned to the caller.
//! - **Rejected follow-up**: logged at `warn` and retained for
//!   [`LayoutController::take_deferred_errors`]; draining continues.
//! - **Runaway follow-ups**: at most `max_follow_ups` are drained per call;
//!   the remainder is dropped and recorded as one deferred failure.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use ninezone_core::Point;
use ninezone_layout::{
    DragCancelReason, DragEffect, DragItem, DragMachine, DragState, DragTransition, LayoutAction,
    LayoutDocument, LayoutError, LayoutState, WidgetIdAllocator, reduce_with,
};
use tracing::{debug, debug_span, warn};

use crate::config::{ConfigError, LayoutConfig};
use crate::observer::{ObserverRegistry, Subscription};

const CONTROLLER_TARGET: &str = "ninezone.controller";
const DRAG_TARGET: &str = "ninezone.drag";

/// Cloneable handle for queueing follow-up actions.
///
/// Actions queued here are applied by the controller after the current
/// dispatch has published its state, or on the next
/// [`LayoutController::process_queued`].
#[derive(Clone, Default)]
pub struct Dispatcher {
    queue: Rc<RefCell<VecDeque<LayoutAction>>>,
}

impl Dispatcher {
    pub fn enqueue(&self, action: LayoutAction) {
        self.queue.borrow_mut().push_back(action);
    }

    /// Number of queued, not yet applied, actions.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn pop(&self) -> Option<LayoutAction> {
        self.queue.borrow_mut().pop_front()
    }

    fn clear(&self) -> usize {
        let mut queue = self.queue.borrow_mut();
        let dropped = queue.len();
        queue.clear();
        dropped
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Why a queued follow-up action did not apply.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowUpError {
    Rejected(LayoutError),
    /// The drain limit was hit; `dropped` actions were discarded.
    LimitExceeded { limit: usize, dropped: usize },
}

impl fmt::Display for FollowUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(error) => write!(f, "follow-up rejected: {error}"),
            Self::LimitExceeded { limit, dropped } => write!(
                f,
                "follow-up limit of {limit} reached; {dropped} queued actions dropped"
            ),
        }
    }
}

impl std::error::Error for FollowUpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(error) => Some(error),
            Self::LimitExceeded { .. } => None,
        }
    }
}

/// A follow-up action that failed after its triggering dispatch returned.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredFailure {
    pub action: LayoutAction,
    pub error: FollowUpError,
}

/// Owner of the published layout state.
pub struct LayoutController {
    config: LayoutConfig,
    state: Arc<LayoutState>,
    version: u64,
    drag: DragMachine,
    ids: WidgetIdAllocator,
    dispatcher: Dispatcher,
    observers: ObserverRegistry<Arc<LayoutState>>,
    drag_observers: ObserverRegistry<DragTransition>,
    deferred: Vec<DeferredFailure>,
}

impl fmt::Debug for LayoutController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutController")
            .field("version", &self.version)
            .field("drag", self.drag.state())
            .field("pending", &self.dispatcher.pending())
            .field("deferred", &self.deferred.len())
            .finish_non_exhaustive()
    }
}

impl LayoutController {
    /// Controller over an empty layout built from `config`.
    pub fn new(config: LayoutConfig) -> Result<Self, ConfigError> {
        let state = config.create_initial_state();
        Self::with_state(config, state)
    }

    /// Controller over an existing layout.
    ///
    /// The layout keeps its own viewport and panel sizing; `config` supplies
    /// everything else. The layout is checked per `config.validation`, the
    /// same way every dispatched action is.
    pub fn with_state(config: LayoutConfig, state: LayoutState) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        if config.validation.enabled() {
            state.validate().map_err(ConfigError::InitialState)?;
        }
        Ok(Self {
            drag: DragMachine::new(config.targets),
            ids: config.widget_id_allocator(),
            config,
            state: Arc::new(state),
            version: 0,
            dispatcher: Dispatcher::default(),
            observers: ObserverRegistry::new(),
            drag_observers: ObserverRegistry::new(),
            deferred: Vec::new(),
        })
    }

    /// The published state.
    #[must_use]
    pub fn state(&self) -> Arc<LayoutState> {
        Arc::clone(&self.state)
    }

    /// Number of states published since construction.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub const fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    /// Handle observers use to queue follow-up actions.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Observe every published state.
    pub fn subscribe(&self, observer: impl Fn(&Arc<LayoutState>) + 'static) -> Subscription {
        self.observers.subscribe(observer)
    }

    /// Observe every drag transition.
    pub fn subscribe_drag(&self, observer: impl Fn(&DragTransition) + 'static) -> Subscription {
        self.drag_observers.subscribe(observer)
    }

    /// Apply `action`, publish, then drain queued follow-ups.
    ///
    /// Returns the version of the state produced by `action`.
    pub fn dispatch(&mut self, action: LayoutAction) -> Result<u64, LayoutError> {
        let version = self.apply(&action)?;
        self.process_queued();
        Ok(version)
    }

    /// Drain actions queued through the [`Dispatcher`]. Returns how many
    /// applied successfully.
    pub fn process_queued(&mut self) -> usize {
        let limit = self.config.max_follow_ups;
        let mut drained = 0;
        let mut applied = 0;
        while let Some(action) = self.dispatcher.pop() {
            if drained == limit {
                let dropped = self.dispatcher.clear() + 1;
                warn!(
                    target: CONTROLLER_TARGET,
                    limit,
                    dropped,
                    "follow-up limit reached; dropping queued actions"
                );
                self.deferred.push(DeferredFailure {
                    action,
                    error: FollowUpError::LimitExceeded { limit, dropped },
                });
                break;
            }
            drained += 1;
            match self.apply(&action) {
                Ok(_) => applied += 1,
                Err(error) => {
                    warn!(
                        target: CONTROLLER_TARGET,
                        kind = %action.kind(),
                        error = %error,
                        "follow-up action rejected"
                    );
                    self.deferred.push(DeferredFailure {
                        action,
                        error: FollowUpError::Rejected(error),
                    });
                }
            }
        }
        applied
    }

    /// Failures of queued follow-ups since the last call.
    pub fn take_deferred_errors(&mut self) -> Vec<DeferredFailure> {
        std::mem::take(&mut self.deferred)
    }

    /// Replace the layout with a persisted document.
    pub fn load_document(&mut self, document: LayoutDocument) -> Result<u64, LayoutError> {
        let state = LayoutState::from_document(document)?;
        if self.drag.is_active() {
            self.cancel_drag(DragCancelReason::Programmatic);
        }
        debug!(
            target: CONTROLLER_TARGET,
            state_hash = state.state_hash(),
            "layout document loaded"
        );
        let version = self.publish(state);
        self.process_queued();
        Ok(version)
    }

    /// Parse and load a JSON layout document.
    pub fn load_json(&mut self, json: &str) -> Result<u64, LayoutError> {
        self.load_document(LayoutDocument::from_json_str(json)?)
    }

    #[must_use]
    pub fn save_document(&self) -> LayoutDocument {
        self.state.to_document()
    }

    /// Start dragging `item` from `pointer`.
    pub fn begin_drag(
        &mut self,
        item: DragItem,
        pointer: Point,
    ) -> Result<DragTransition, LayoutError> {
        let transition = self.drag.begin(item, pointer, &self.state)?;
        self.publish_drag(&transition);
        Ok(transition)
    }

    pub fn update_drag(&mut self, pointer: Point) -> DragTransition {
        let transition = self.drag.update(pointer, &self.state);
        self.publish_drag(&transition);
        transition
    }

    /// Release the drag, dispatching its action exactly once.
    ///
    /// The drag is over even when the dispatch fails.
    pub fn end_drag(&mut self) -> Result<DragTransition, LayoutError> {
        let transition = self.drag.end(&self.state, &mut self.ids);
        self.publish_drag(&transition);
        if let DragEffect::Dropped { action, .. } = &transition.effect {
            self.dispatch(action.clone())?;
        }
        Ok(transition)
    }

    pub fn cancel_drag(&mut self, reason: DragCancelReason) -> DragTransition {
        let transition = self.drag.cancel(reason);
        self.publish_drag(&transition);
        transition
    }

    fn apply(&mut self, action: &LayoutAction) -> Result<u64, LayoutError> {
        let kind = action.kind();
        let _span = debug_span!("layout.dispatch", kind = %kind, version = self.version).entered();
        match reduce_with(&self.state, action, self.config.validation) {
            Ok(next) => Ok(self.publish(next)),
            Err(error) => {
                debug!(
                    target: CONTROLLER_TARGET,
                    kind = %kind,
                    error_kind = ?error.kind(),
                    error = %error,
                    "layout action rejected"
                );
                Err(error)
            }
        }
    }

    fn publish(&mut self, state: LayoutState) -> u64 {
        self.state = Arc::new(state);
        self.version += 1;
        let notified = self.observers.notify(&self.state);
        debug!(
            target: CONTROLLER_TARGET,
            version = self.version,
            notified,
            "layout state published"
        );
        self.version
    }

    fn publish_drag(&self, transition: &DragTransition) {
        debug!(
            target: DRAG_TARGET,
            transition_id = transition.transition_id,
            from = ?transition.from,
            to = ?transition.to,
            effect = ?transition.effect,
            "drag transition"
        );
        self.drag_observers.notify(transition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ninezone_core::{PanelSide, Rect};
    use ninezone_layout::{LayoutErrorKind, Tab, WidgetPlacement};
    use std::cell::Cell;

    fn controller() -> LayoutController {
        LayoutController::new(LayoutConfig::default()).expect("default config")
    }

    fn add(tab: &str, widget: &str) -> LayoutAction {
        LayoutAction::AddTab {
            tab: Tab::new(tab, tab),
            widget: widget.into(),
            index: None,
            placement: Some(WidgetPlacement::Floating { bounds: None }),
        }
    }

    #[test]
    fn dispatch_bumps_version_and_publishes() {
        let mut controller = controller();
        let seen = Rc::new(Cell::new(0u64));
        let sink = Rc::clone(&seen);
        let _sub = controller.subscribe(move |state| sink.set(state.widgets().count() as u64));

        assert_eq!(controller.dispatch(add("t1", "w1")), Ok(1));
        assert_eq!(controller.version(), 1);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn rejected_dispatch_keeps_published_state() {
        let mut controller = controller();
        controller.dispatch(add("t1", "w1")).expect("add");
        let before = controller.state();
        let err = controller
            .dispatch(LayoutAction::send_back("ghost"))
            .expect_err("unknown widget");
        assert_eq!(err.kind(), LayoutErrorKind::InvalidReference);
        assert!(Arc::ptr_eq(&before, &controller.state()));
        assert_eq!(controller.version(), 1);
    }

    #[test]
    fn follow_ups_drain_in_fifo_order_after_publish() {
        let mut controller = controller();
        let dispatcher = controller.dispatcher();
        let armed = Rc::new(Cell::new(true));
        let flag = Rc::clone(&armed);
        let _sub = controller.subscribe(move |_| {
            if flag.replace(false) {
                dispatcher.enqueue(add("t2", "w2"));
                dispatcher.enqueue(LayoutAction::dock(
                    "w2",
                    ninezone_layout::PanelTarget::NewSection {
                        side: PanelSide::Right,
                        position: 0,
                    },
                ));
            }
        });

        assert_eq!(controller.dispatch(add("t1", "w1")), Ok(1));
        assert_eq!(controller.version(), 3);
        let state = controller.state();
        assert_eq!(state.panel(PanelSide::Right).widget_count(), 1);
        assert!(controller.take_deferred_errors().is_empty());
    }

    #[test]
    fn rejected_follow_up_is_deferred() {
        let mut controller = controller();
        controller.dispatcher().enqueue(LayoutAction::remove_tab("ghost"));
        controller.dispatch(add("t1", "w1")).expect("primary applies");
        let deferred = controller.take_deferred_errors();
        assert_eq!(deferred.len(), 1);
        assert!(matches!(deferred[0].error, FollowUpError::Rejected(_)));
        assert!(controller.take_deferred_errors().is_empty());
    }

    #[test]
    fn runaway_follow_ups_are_capped() {
        let mut config = LayoutConfig::default();
        config.max_follow_ups = 3;
        let mut controller = LayoutController::new(config).expect("config");
        controller.dispatch(add("t1", "w1")).expect("add");
        let dispatcher = controller.dispatcher();
        let _sub = controller.subscribe(move |_| {
            dispatcher.enqueue(LayoutAction::BringToFront {
                widget: "w1".into(),
            });
        });

        controller.dispatch(LayoutAction::BringToFront { widget: "w1".into() }).expect("front");
        assert_eq!(controller.version(), 5);
        let deferred = controller.take_deferred_errors();
        assert!(matches!(
            deferred.as_slice(),
            [DeferredFailure {
                error: FollowUpError::LimitExceeded { limit: 3, dropped: 1 },
                ..
            }]
        ));
    }

    #[test]
    fn dropped_subscription_stops_notifications() {
        let mut controller = controller();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = controller.subscribe(move |_| counter.set(counter.get() + 1));
        controller.dispatch(add("t1", "w1")).expect("add");
        sub.unsubscribe();
        controller.dispatch(add("t2", "w1")).expect("add");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn document_round_trip_through_controller() {
        let mut controller = controller();
        controller.dispatch(add("t1", "w1")).expect("add");
        controller
            .dispatch(LayoutAction::SetFloatingBounds {
                widget: "w1".into(),
                bounds: Rect::new(10.0, 20.0, 300.0, 200.0),
                user_sized: true,
            })
            .expect("bounds");
        let json = controller
            .save_document()
            .to_json_string()
            .expect("encode");

        let mut fresh = LayoutController::new(LayoutConfig::default()).expect("config");
        assert_eq!(fresh.load_json(&json), Ok(1));
        assert_eq!(*fresh.state(), *controller.state());

        let err = fresh.load_json("{\"viewport\":").expect_err("garbage");
        assert_eq!(err.kind(), LayoutErrorKind::MalformedPersistedState);
        assert_eq!(fresh.version(), 1);
    }

    #[test]
    fn invalid_initial_state_is_rejected_when_validating() {
        let sizing = ninezone_layout::PanelSizing {
            min_size: 500.0,
            max_size: 100.0,
            ..Default::default()
        };
        let broken = || {
            ninezone_layout::create_initial_state(
                ninezone_core::Size::new(800.0, 600.0),
                Default::default(),
                sizing,
            )
        };

        let mut strict = LayoutConfig::default();
        strict.validation = ninezone_layout::ValidationMode::Always;
        let err = LayoutController::with_state(strict, broken()).expect_err("invalid panels");
        assert!(matches!(
            &err,
            ConfigError::InitialState(error)
                if error.kind() == LayoutErrorKind::InvariantViolation
        ));

        let mut lax = LayoutConfig::default();
        lax.validation = ninezone_layout::ValidationMode::Never;
        assert!(LayoutController::with_state(lax, broken()).is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = LayoutConfig::default();
        config.max_follow_ups = 0;
        assert!(matches!(
            LayoutController::new(config),
            Err(ConfigError::Validation(_))
        ));
    }
}
