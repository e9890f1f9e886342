#![forbid(unsafe_code)]

//! Persisted layout schema.
//!
//! A [`LayoutDocument`] is the flat, serializable form of a [`LayoutState`].
//!
//! # Schema Versioning Policy
//!
//! - Additive host data may be carried in `extensions` without a version bump.
//! - Breaking field or semantic changes bump [`LAYOUT_DOCUMENT_SCHEMA_VERSION`].
//! - Loaders reject unknown versions with [`MalformedReason::UnsupportedSchemaVersion`].
//!
//! Documents produced by [`LayoutState::to_document`] are canonical: panels in
//! side order, tabs and widgets ordered by id, floating widgets back to front.

use std::collections::BTreeMap;

use im::OrdMap;
use ninezone_core::{PanelSide, Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, LayoutError, MalformedReason};
use crate::state::{FloatingWidget, LayoutDefaults, LayoutState, Panel, PanelSet, Tab, Widget};

/// Current layout document schema version.
pub const LAYOUT_DOCUMENT_SCHEMA_VERSION: u16 = 1;

fn default_schema_version() -> u16 {
    LAYOUT_DOCUMENT_SCHEMA_VERSION
}

/// Serializable snapshot of a complete layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub viewport: Size,
    #[serde(default)]
    pub defaults: LayoutDefaults,
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    pub panels: Vec<Panel>,
    #[serde(default)]
    pub floating_widgets: Vec<FloatingWidget>,
    /// Forward-compatible extension bag.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

impl LayoutDocument {
    /// Canonical JSON encoding.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a document. Structural validation happens in
    /// [`LayoutState::from_document`].
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(json)
            .map_err(|err| LayoutError::malformed(MalformedReason::Parse(err.to_string())))
    }

    /// Sort every collection into canonical order.
    pub fn canonicalize(&mut self) {
        self.tabs.sort_by(|a, b| a.id.cmp(&b.id));
        self.widgets.sort_by(|a, b| a.id.cmp(&b.id));
        self.panels.sort_by_key(|panel| panel.side);
        self.floating_widgets.sort_by_key(|entry| entry.z_index);
    }
}

fn insert_unique<K: Ord + Clone + ToString, V: Clone>(
    map: &mut OrdMap<K, V>,
    key: K,
    value: V,
    kind: EntityKind,
) -> Result<(), LayoutError> {
    if map.contains_key(&key) {
        return Err(LayoutError::malformed(MalformedReason::DuplicateId {
            kind,
            id: key.to_string(),
        }));
    }
    map.insert(key, value);
    Ok(())
}

impl LayoutState {
    /// Flatten into the persisted form.
    #[must_use]
    pub fn to_document(&self) -> LayoutDocument {
        LayoutDocument {
            schema_version: LAYOUT_DOCUMENT_SCHEMA_VERSION,
            viewport: self.viewport,
            defaults: self.defaults,
            tabs: self.tabs.values().cloned().collect(),
            widgets: self.widgets.values().cloned().collect(),
            panels: self.panels.iter().cloned().collect(),
            floating_widgets: self.floating_by_z().into_iter().cloned().collect(),
            extensions: self.extensions.clone(),
        }
    }

    /// Rebuild a state from its persisted form, rejecting anything that is
    /// not a complete, valid layout.
    pub fn from_document(document: LayoutDocument) -> Result<Self, LayoutError> {
        if document.schema_version != LAYOUT_DOCUMENT_SCHEMA_VERSION {
            return Err(LayoutError::malformed(
                MalformedReason::UnsupportedSchemaVersion {
                    found: document.schema_version,
                    expected: LAYOUT_DOCUMENT_SCHEMA_VERSION,
                },
            ));
        }

        let mut tabs = OrdMap::new();
        for tab in document.tabs {
            insert_unique(&mut tabs, tab.id.clone(), tab, EntityKind::Tab)?;
        }
        let mut widgets = OrdMap::new();
        for widget in document.widgets {
            insert_unique(&mut widgets, widget.id.clone(), widget, EntityKind::Widget)?;
        }
        let mut floating = OrdMap::new();
        for entry in document.floating_widgets {
            insert_unique(
                &mut floating,
                entry.widget.clone(),
                entry,
                EntityKind::FloatingWidget,
            )?;
        }

        let mut panels: BTreeMap<PanelSide, Panel> = BTreeMap::new();
        for panel in document.panels {
            let side = panel.side;
            if panels.insert(side, panel).is_some() {
                return Err(LayoutError::malformed(MalformedReason::DuplicatePanel {
                    side,
                }));
            }
        }
        let mut take = |side: PanelSide| {
            panels
                .remove(&side)
                .ok_or(LayoutError::malformed(MalformedReason::MissingPanel { side }))
        };
        let panels = PanelSet::from_panels(
            take(PanelSide::Left)?,
            take(PanelSide::Right)?,
            take(PanelSide::Top)?,
            take(PanelSide::Bottom)?,
        );

        let state = LayoutState {
            viewport: document.viewport,
            defaults: document.defaults,
            tabs,
            widgets,
            panels,
            floating,
            extensions: document.extensions,
        };
        let report = state.invariant_report();
        if !report.is_ok() {
            return Err(LayoutError::malformed(MalformedReason::Invariants(report)));
        }
        Ok(state)
    }

    /// Deterministic FNV-1a structural hash, for diagnostics and replay
    /// comparison.
    ///
    /// Entities are mixed in id order, so states that compare equal hash
    /// equal regardless of how they were built.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix(hash: &mut u64, byte: u8) {
            *hash ^= u64::from(byte);
            *hash = hash.wrapping_mul(PRIME);
        }

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                mix(hash, *byte);
            }
        }

        fn mix_u64(hash: &mut u64, value: u64) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_len(hash: &mut u64, len: usize) {
            mix_u64(hash, len as u64);
        }

        fn mix_f64(hash: &mut u64, value: f64) {
            mix_u64(hash, value.to_bits());
        }

        fn mix_bool(hash: &mut u64, value: bool) {
            mix(hash, u8::from(value));
        }

        fn mix_str(hash: &mut u64, value: &str) {
            mix_len(hash, value.len());
            mix_bytes(hash, value.as_bytes());
        }

        fn mix_size(hash: &mut u64, size: Size) {
            mix_f64(hash, size.width);
            mix_f64(hash, size.height);
        }

        fn mix_point(hash: &mut u64, point: Point) {
            mix_f64(hash, point.x);
            mix_f64(hash, point.y);
        }

        fn mix_rect(hash: &mut u64, rect: Rect) {
            mix_f64(hash, rect.x);
            mix_f64(hash, rect.y);
            mix_f64(hash, rect.width);
            mix_f64(hash, rect.height);
        }

        fn mix_side(hash: &mut u64, side: PanelSide) {
            mix_str(hash, side.as_str());
        }

        fn mix_tab(hash: &mut u64, tab: &Tab) {
            mix_str(hash, tab.id.as_str());
            mix_str(hash, &tab.label);
            mix_bool(hash, tab.can_pop_out);
            mix_bool(hash, tab.allow_merge);
            match tab.preferred_floating_size {
                Some(size) => {
                    mix(hash, 1);
                    mix_size(hash, size);
                }
                None => mix(hash, 0),
            }
            match tab.preferred_floating_position {
                Some(point) => {
                    mix(hash, 1);
                    mix_point(hash, point);
                }
                None => mix(hash, 0),
            }
            match &tab.allowed_sides {
                Some(sides) => {
                    mix(hash, 1);
                    mix_len(hash, sides.len());
                    for side in sides {
                        mix_side(hash, *side);
                    }
                }
                None => mix(hash, 0),
            }
        }

        fn mix_widget(hash: &mut u64, widget: &Widget) {
            mix_str(hash, widget.id.as_str());
            mix_len(hash, widget.tabs.len());
            for tab in &widget.tabs {
                mix_str(hash, tab.as_str());
            }
            mix_str(hash, widget.active_tab.as_str());
            mix_bool(hash, widget.minimized);
        }

        fn mix_panel(hash: &mut u64, panel: &Panel) {
            mix_side(hash, panel.side);
            mix_f64(hash, panel.size);
            mix_f64(hash, panel.min_size);
            mix_f64(hash, panel.max_size);
            mix_bool(hash, panel.collapsed);
            mix_bool(hash, panel.pinned);
            mix_bool(hash, panel.span);
            mix_len(hash, panel.max_sections);
            mix_len(hash, panel.sections.len());
            for section in &panel.sections {
                mix_len(hash, section.len());
                for widget in section {
                    mix_str(hash, widget.as_str());
                }
            }
            mix_len(hash, panel.splitter_percents.len());
            for percent in &panel.splitter_percents {
                mix_f64(hash, *percent);
            }
        }

        fn mix_floating(hash: &mut u64, entry: &FloatingWidget) {
            mix_str(hash, entry.widget.as_str());
            mix_rect(hash, entry.bounds);
            mix_len(hash, entry.z_index);
            mix_side(hash, entry.home.side);
            mix_len(hash, entry.home.section);
            mix_len(hash, entry.home.index);
            mix_bool(hash, entry.home.standalone);
            mix_bool(hash, entry.user_sized);
        }

        let mut hash = OFFSET_BASIS;
        mix_u64(&mut hash, u64::from(LAYOUT_DOCUMENT_SCHEMA_VERSION));
        mix_size(&mut hash, self.viewport);
        mix_side(&mut hash, self.defaults.side);
        mix_size(&mut hash, self.defaults.floating_size);
        mix_len(&mut hash, self.extensions.len());
        for (key, value) in &self.extensions {
            mix_str(&mut hash, key);
            mix_str(&mut hash, value);
        }
        mix_len(&mut hash, self.tabs.len());
        for tab in self.tabs.values() {
            mix_tab(&mut hash, tab);
        }
        mix_len(&mut hash, self.widgets.len());
        for widget in self.widgets.values() {
            mix_widget(&mut hash, widget);
        }
        for panel in self.panels.iter() {
            mix_panel(&mut hash, panel);
        }
        mix_len(&mut hash, self.floating.len());
        for entry in self.floating.values() {
            mix_floating(&mut hash, entry);
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutErrorKind;
    use crate::ids::WidgetId;
    use crate::state::Home;

    fn sample() -> LayoutState {
        LayoutState::builder(Size::new(1200.0, 900.0))
            .dock(PanelSide::Left, Widget::single("w1", "t1").with_tab("t2"))
            .dock(PanelSide::Bottom, Widget::single("w2", "t3"))
            .float(Widget::single("w3", "t4"), Rect::new(40.0, 40.0, 300.0, 200.0))
            .extension("host.theme", "dark")
            .build()
            .expect("valid")
    }

    #[test]
    fn document_round_trip_preserves_state() {
        let state = sample();
        let json = state.to_document().to_json_string().expect("encode");
        let document = LayoutDocument::from_json_str(&json).expect("decode");
        let restored = LayoutState::from_document(document).expect("valid document");
        assert_eq!(restored, state);
        assert_eq!(restored.state_hash(), state.state_hash());
        assert_eq!(restored.extensions().get("host.theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn section_referencing_missing_widget_is_malformed() {
        let mut document = sample().to_document();
        let left = document
            .panels
            .iter_mut()
            .find(|panel| panel.side == PanelSide::Left)
            .expect("left panel");
        left.sections[0].push(WidgetId::new("ghost"));
        let err = LayoutState::from_document(document).expect_err("malformed");
        assert_eq!(err.kind(), LayoutErrorKind::MalformedPersistedState);
        let LayoutError::MalformedPersistedState {
            reason: MalformedReason::Invariants(report),
        } = err
        else {
            panic!("expected invariant report");
        };
        assert!(report.has_code(crate::validate::InvariantCode::MissingWidget));
    }

    #[test]
    fn unsupported_schema_version_is_rejected() {
        let mut document = sample().to_document();
        document.schema_version = 99;
        let err = LayoutState::from_document(document).expect_err("version");
        assert!(matches!(
            err,
            LayoutError::MalformedPersistedState {
                reason: MalformedReason::UnsupportedSchemaVersion {
                    found: 99,
                    expected: LAYOUT_DOCUMENT_SCHEMA_VERSION
                }
            }
        ));
    }

    #[test]
    fn duplicate_and_missing_panels_are_rejected() {
        let mut document = sample().to_document();
        let duplicate = document.panels[0].clone();
        document.panels.push(duplicate);
        assert!(matches!(
            LayoutState::from_document(document),
            Err(LayoutError::MalformedPersistedState {
                reason: MalformedReason::DuplicatePanel {
                    side: PanelSide::Left
                }
            })
        ));

        let mut document = sample().to_document();
        document.panels.retain(|panel| panel.side != PanelSide::Top);
        assert!(matches!(
            LayoutState::from_document(document),
            Err(LayoutError::MalformedPersistedState {
                reason: MalformedReason::MissingPanel {
                    side: PanelSide::Top
                }
            })
        ));
    }

    #[test]
    fn duplicate_tab_ids_are_rejected() {
        let mut document = sample().to_document();
        let tab = document.tabs[0].clone();
        document.tabs.push(tab);
        let err = LayoutState::from_document(document).expect_err("duplicate");
        assert!(matches!(
            err,
            LayoutError::MalformedPersistedState {
                reason: MalformedReason::DuplicateId {
                    kind: EntityKind::Tab,
                    ..
                }
            }
        ));
    }

    #[test]
    fn garbage_json_is_a_parse_error() {
        let err = LayoutDocument::from_json_str("{not json").expect_err("parse");
        assert!(matches!(
            err,
            LayoutError::MalformedPersistedState {
                reason: MalformedReason::Parse(_)
            }
        ));
    }

    #[test]
    fn canonicalize_orders_collections() {
        let mut document = sample().to_document();
        document.panels.reverse();
        document.tabs.reverse();
        document.canonicalize();
        assert_eq!(document, sample().to_document());
    }

    #[test]
    fn hash_changes_with_content() {
        let state = sample();
        let moved = state
            .apply(&crate::action::LayoutAction::send_back("w3"))
            .expect("send back");
        assert_ne!(state.state_hash(), moved.state_hash());
    }

    #[test]
    fn hash_ignores_construction_order_and_sees_flags() {
        let reordered = LayoutState::builder(Size::new(1200.0, 900.0))
            .extension("host.theme", "dark")
            .float_with_home(
                Widget::single("w3", "t4"),
                Rect::new(40.0, 40.0, 300.0, 200.0),
                Home::standalone(PanelSide::Left, 1),
            )
            .dock(PanelSide::Bottom, Widget::single("w2", "t3"))
            .dock(PanelSide::Left, Widget::single("w1", "t1").with_tab("t2"))
            .build()
            .expect("valid");
        let state = sample();
        assert_eq!(reordered, state);
        assert_eq!(reordered.state_hash(), state.state_hash());
        assert_eq!(state.invariant_report().state_hash, state.state_hash());

        let relabeled = state
            .apply(&crate::action::LayoutAction::SetTabLabel {
                tab: "t1".into(),
                label: "Renamed".into(),
            })
            .expect("relabel");
        let pinned = state
            .apply(&crate::action::LayoutAction::SetPanelPinned {
                side: PanelSide::Left,
                pinned: false,
            })
            .expect("unpin");
        assert_ne!(relabeled.state_hash(), state.state_hash());
        assert_ne!(pinned.state_hash(), state.state_hash());
        assert_ne!(pinned.state_hash(), relabeled.state_hash());
    }
}
