//! End-to-end layout scenarios exercised through the public API only.

use ninezone_layout::{
    DragItem, DragMachine, DropTarget, Home, LayoutAction, LayoutDocument, LayoutError,
    LayoutErrorKind, LayoutState, MalformedReason, PanelSide, PanelTarget, Point, Rect, Size, Tab,
    TabId, TargetTuning, Widget, WidgetId, WidgetIdAllocator, WidgetLocation, reduce,
    resolve_target,
};

fn wid(raw: &str) -> WidgetId {
    WidgetId::new(raw)
}

fn tid(raw: &str) -> TabId {
    TabId::new(raw)
}

fn single_left() -> LayoutState {
    LayoutState::builder(Size::new(1000.0, 800.0))
        .dock(PanelSide::Left, Widget::single("w1", "t1"))
        .build()
        .expect("valid")
}

#[test]
fn floating_sole_widget_records_home_and_empties_panel() {
    let state = single_left();
    let bounds = Rect::new(10.0, 10.0, 200.0, 100.0);
    let next = reduce(&state, &LayoutAction::float("w1", Some(bounds))).expect("float");

    assert!(next.panel(PanelSide::Left).sections.is_empty());
    let entry = next.floating_widget(&wid("w1")).expect("floating");
    assert_eq!(entry.bounds, bounds);
    assert_eq!(entry.z_index, 0);
    assert_eq!(
        (entry.home.side, entry.home.section, entry.home.index),
        (PanelSide::Left, 0, 0)
    );
    assert_eq!(next.location_of_widget(&wid("w1")), Ok(WidgetLocation::Floating));
}

#[test]
fn adding_tab_at_index_keeps_active_tab() {
    let state = single_left();
    let next = reduce(
        &state,
        &LayoutAction::AddTab {
            tab: Tab::new("t2", "Second"),
            widget: wid("w1"),
            index: Some(1),
            placement: None,
        },
    )
    .expect("add tab");
    let widget = next.widget(&wid("w1")).expect("w1");
    assert_eq!(widget.tabs, vec![tid("t1"), tid("t2")]);
    assert_eq!(widget.active_tab, tid("t1"));
}

#[test]
fn document_with_dangling_section_reference_is_rejected() {
    let mut document = single_left().to_document();
    document
        .panels
        .iter_mut()
        .find(|panel| panel.side == PanelSide::Left)
        .expect("left")
        .sections[0]
        .push(wid("missing"));
    let json = document.to_json_string().expect("encode");

    let parsed = LayoutDocument::from_json_str(&json).expect("syntactically valid");
    let err = LayoutState::from_document(parsed).expect_err("dangling reference");
    assert_eq!(err.kind(), LayoutErrorKind::MalformedPersistedState);
    assert!(matches!(
        err,
        LayoutError::MalformedPersistedState {
            reason: MalformedReason::Invariants(_)
        }
    ));
}

#[test]
fn dock_float_send_back_round_trips_middle_slot() {
    let state = LayoutState::builder(Size::new(1000.0, 800.0))
        .dock(PanelSide::Right, Widget::single("a", "ta"))
        .dock_in(PanelSide::Right, 0, Widget::single("b", "tb"))
        .dock_in(PanelSide::Right, 0, Widget::single("c", "tc"))
        .build()
        .expect("valid");

    let floated = reduce(&state, &LayoutAction::float("b", None)).expect("float");
    assert_eq!(
        floated.floating_widget(&wid("b")).expect("floating").home,
        Home::new(PanelSide::Right, 0, 1)
    );
    let restored = reduce(&floated, &LayoutAction::send_back("b")).expect("send back");
    assert_eq!(restored, state);
}

#[test]
fn removing_every_tab_collapses_structure() {
    let state = LayoutState::builder(Size::new(1000.0, 800.0))
        .dock(PanelSide::Top, Widget::single("w1", "t1").with_tab("t2"))
        .dock(PanelSide::Top, Widget::single("w2", "t3"))
        .build()
        .expect("valid");
    let once = reduce(&state, &LayoutAction::remove_tab("t1")).expect("remove t1");
    assert_eq!(once.widget(&wid("w1")).expect("w1").active_tab, tid("t2"));
    let twice = reduce(&once, &LayoutAction::remove_tab("t2")).expect("remove t2");
    assert!(!twice.contains_widget(&wid("w1")));
    let top = twice.panel(PanelSide::Top);
    assert_eq!(top.sections, vec![vec![wid("w2")]]);
    assert_eq!(top.splitter_percents, vec![100.0]);
}

#[test]
fn unknown_ids_are_invalid_references() {
    let state = single_left();
    for action in [
        LayoutAction::remove_tab("nope"),
        LayoutAction::float("nope", None),
        LayoutAction::send_back("w1"),
        LayoutAction::dock(
            "nope",
            PanelTarget::NewSection {
                side: PanelSide::Right,
                position: 0,
            },
        ),
    ] {
        let err = reduce(&state, &action).expect_err("invalid reference");
        assert_eq!(err.kind(), LayoutErrorKind::InvalidReference, "{action:?}");
    }
}

#[test]
fn panel_resize_clamps_to_bounds() {
    let state = single_left();
    let wide = reduce(
        &state,
        &LayoutAction::ResizePanel {
            side: PanelSide::Left,
            size: 10_000.0,
        },
    )
    .expect("resize");
    let panel = wide.panel(PanelSide::Left);
    assert_eq!(panel.size, panel.max_size);
}

#[test]
fn full_drag_session_docks_floating_widget() {
    let state = single_left();
    let floated = reduce(
        &state,
        &LayoutAction::float("w1", Some(Rect::new(400.0, 300.0, 200.0, 100.0))),
    )
    .expect("float");

    let tuning = TargetTuning::default();
    let target = resolve_target(
        &floated,
        &DragItem::widget("w1"),
        Point::new(990.0, 400.0),
        &tuning,
    )
    .expect("resolve");
    assert_eq!(
        target,
        DropTarget::NewSection {
            side: PanelSide::Right,
            position: 0
        }
    );

    let mut machine = DragMachine::new(tuning);
    let mut ids = WidgetIdAllocator::default();
    machine
        .begin(DragItem::widget("w1"), Point::new(450.0, 310.0), &floated)
        .expect("begin");
    machine.update(Point::new(990.0, 400.0), &floated);
    let end = machine.end(&floated, &mut ids);
    let action = end.effect.dropped_action().expect("drop action").clone();
    let docked = reduce(&floated, &action).expect("dock");
    assert_eq!(
        docked.location_of_widget(&wid("w1")),
        Ok(WidgetLocation::Docked {
            side: PanelSide::Right,
            section: 0,
            index: 0
        })
    );
    assert!(docked.floating_by_z().is_empty());
}

#[test]
fn actions_round_trip_through_json() {
    let action = LayoutAction::SetSplitterPercent {
        side: PanelSide::Left,
        section: 1,
        percent: 30.0,
    };
    let json = serde_json::to_string(&action).expect("encode");
    assert!(json.contains("\"kind\":\"set_splitter_percent\""));
    let back: LayoutAction = serde_json::from_str(&json).expect("decode");
    assert_eq!(back, action);
}
