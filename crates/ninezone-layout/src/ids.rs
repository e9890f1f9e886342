#![forbid(unsafe_code)]

//! Stable identifiers for tabs and widgets, plus deterministic widget id
//! allocation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::LayoutState;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Stable identifier for a tab. Survives every widget move.
    TabId
);

string_id!(
    /// Stable identifier for a widget (a container of tabs).
    WidgetId
);

/// Default prefix for allocated widget ids.
pub const DEFAULT_WIDGET_ID_PREFIX: &str = "widget";

/// Deterministic allocator for fresh widget ids.
///
/// Produces `<prefix>-<n>` with a monotonically increasing counter, skipping
/// any id already present in the supplied state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetIdAllocator {
    prefix: String,
    next: u64,
}

impl Default for WidgetIdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_WIDGET_ID_PREFIX)
    }
}

impl WidgetIdAllocator {
    /// Allocator starting at `<prefix>-1`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Prefix applied to every allocated id.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Counter value the next allocation will try first.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Allocate an id that does not collide with any widget in `state`.
    pub fn allocate(&mut self, state: &LayoutState) -> WidgetId {
        loop {
            let candidate = WidgetId::new(format!("{}-{}", self.prefix, self.next));
            self.next = self.next.saturating_add(1);
            if !state.contains_widget(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LayoutState, Widget};
    use ninezone_core::{PanelSide, Size};

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&TabId::new("t1")).expect("serialize id");
        assert_eq!(json, "\"t1\"");
    }

    #[test]
    fn allocator_skips_existing_widgets() {
        let state = LayoutState::builder(Size::new(800.0, 600.0))
            .dock(PanelSide::Left, Widget::single("widget-1", "t1"))
            .build()
            .expect("valid state");
        let mut ids = WidgetIdAllocator::default();
        assert_eq!(ids.allocate(&state), WidgetId::new("widget-2"));
        assert_eq!(ids.allocate(&state), WidgetId::new("widget-3"));
        assert_eq!(ids.peek(), 4);
    }
}
