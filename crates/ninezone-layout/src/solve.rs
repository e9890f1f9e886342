#![forbid(unsafe_code)]

//! Projection of a layout onto its viewport.
//!
//! The solver is the only place that turns sizes and splitter shares into
//! rectangles; drop-target resolution and hosts both read from its output.
//! Hidden panels (collapsed or empty) are kept as zero-thickness rectangles
//! along their edge so edge bands can still be derived from them.

use ninezone_core::{Axis, PanelSide, Rect};

use crate::ids::WidgetId;
use crate::state::{LayoutState, Panel};
use crate::target::TargetTuning;

/// Solved widget slot.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetGeometry {
    pub widget: WidgetId,
    pub rect: Rect,
    pub tab_strip: Rect,
}

/// Solved panel section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionGeometry {
    pub index: usize,
    pub rect: Rect,
    pub widgets: Vec<WidgetGeometry>,
}

/// Solved panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGeometry {
    pub side: PanelSide,
    pub rect: Rect,
    pub visible: bool,
    pub sections: Vec<SectionGeometry>,
}

/// Solved floating widget.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingGeometry {
    pub widget: WidgetId,
    pub rect: Rect,
    pub tab_strip: Rect,
    pub z_index: usize,
}

/// Every rectangle of one layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutGeometry {
    pub viewport: Rect,
    /// Viewport minus the pinned, visible panels.
    pub content: Rect,
    /// Panels in canonical side order.
    pub panels: Vec<PanelGeometry>,
    /// Floating widgets back to front.
    pub floating: Vec<FloatingGeometry>,
}

fn tab_strip(rect: Rect, height: f64) -> Rect {
    Rect::new(rect.x, rect.y, rect.width, height.min(rect.height).max(0.0))
}

/// Split `rect` along `axis` into consecutive slices by `shares` (percent).
fn split(rect: Rect, axis: Axis, shares: &[f64]) -> Vec<Rect> {
    let total = match axis {
        Axis::Vertical => rect.height,
        Axis::Horizontal => rect.width,
    };
    let mut offset = 0.0;
    shares
        .iter()
        .enumerate()
        .map(|(index, share)| {
            let length = if index + 1 == shares.len() {
                total - offset
            } else {
                total * share / 100.0
            };
            let slice = match axis {
                Axis::Vertical => Rect::new(rect.x, rect.y + offset, rect.width, length),
                Axis::Horizontal => Rect::new(rect.x + offset, rect.y, length, rect.height),
            };
            offset += length;
            slice
        })
        .collect()
}

impl LayoutGeometry {
    /// Solve every rectangle of `state`.
    #[must_use]
    pub fn solve(state: &LayoutState, tuning: &TargetTuning) -> Self {
        let viewport = state.viewport_rect();
        let extent = |panel: &Panel, room: f64| {
            if panel.is_visible() {
                panel.size.min(room).max(0.0)
            } else {
                0.0
            }
        };

        let left = state.panel(PanelSide::Left);
        let right = state.panel(PanelSide::Right);
        let top = state.panel(PanelSide::Top);
        let bottom = state.panel(PanelSide::Bottom);

        let left_w = extent(left, viewport.width);
        let right_w = extent(right, viewport.width - left_w);
        let top_h = extent(top, viewport.height);
        let bottom_h = extent(bottom, viewport.height - top_h);

        let side_y = if top.span { top_h } else { 0.0 };
        let side_h = viewport.height - side_y - if bottom.span { bottom_h } else { 0.0 };
        let edge_rect = |span: bool, y: f64, h: f64| {
            if span {
                Rect::new(0.0, y, viewport.width, h)
            } else {
                Rect::new(left_w, y, (viewport.width - left_w - right_w).max(0.0), h)
            }
        };

        let rects = [
            Rect::new(0.0, side_y, left_w, side_h.max(0.0)),
            Rect::new(viewport.width - right_w, side_y, right_w, side_h.max(0.0)),
            edge_rect(top.span, 0.0, top_h),
            edge_rect(bottom.span, viewport.height - bottom_h, bottom_h),
        ];

        let panels = [left, right, top, bottom]
            .into_iter()
            .zip(rects)
            .map(|(panel, rect)| Self::solve_panel(panel, rect, tuning))
            .collect();

        let pinned = |panel: &Panel, thickness: f64| if panel.pinned { thickness } else { 0.0 };
        let x0 = pinned(left, left_w);
        let x1 = pinned(right, right_w);
        let y0 = pinned(top, top_h);
        let y1 = pinned(bottom, bottom_h);
        let content = Rect::new(
            x0,
            y0,
            (viewport.width - x0 - x1).max(0.0),
            (viewport.height - y0 - y1).max(0.0),
        );

        let floating = state
            .floating_by_z()
            .into_iter()
            .map(|entry| FloatingGeometry {
                widget: entry.widget.clone(),
                rect: entry.bounds,
                tab_strip: tab_strip(entry.bounds, tuning.tab_strip_height),
                z_index: entry.z_index,
            })
            .collect();

        Self {
            viewport,
            content,
            panels,
            floating,
        }
    }

    fn solve_panel(panel: &Panel, rect: Rect, tuning: &TargetTuning) -> PanelGeometry {
        let visible = panel.is_visible();
        let axis = panel.side.stacking_axis();
        let sections = if visible {
            split(rect, axis, &panel.splitter_percents)
                .into_iter()
                .zip(&panel.sections)
                .enumerate()
                .map(|(index, (section_rect, widgets))| {
                    let even = vec![100.0 / widgets.len().max(1) as f64; widgets.len()];
                    let widgets = split(section_rect, axis, &even)
                        .into_iter()
                        .zip(widgets)
                        .map(|(rect, widget)| WidgetGeometry {
                            widget: widget.clone(),
                            rect,
                            tab_strip: tab_strip(rect, tuning.tab_strip_height),
                        })
                        .collect();
                    SectionGeometry {
                        index,
                        rect: section_rect,
                        widgets,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };
        PanelGeometry {
            side: panel.side,
            rect,
            visible,
            sections,
        }
    }

    #[must_use]
    pub fn panel(&self, side: PanelSide) -> Option<&PanelGeometry> {
        self.panels.iter().find(|panel| panel.side == side)
    }

    /// Docked widget slots across every panel.
    pub fn docked_widgets(
        &self,
    ) -> impl Iterator<Item = (PanelSide, &SectionGeometry, &WidgetGeometry)> {
        self.panels.iter().flat_map(|panel| {
            panel.sections.iter().flat_map(move |section| {
                section
                    .widgets
                    .iter()
                    .map(move |widget| (panel.side, section, widget))
            })
        })
    }

    /// Floating widgets front to back.
    pub fn floating_front_to_back(&self) -> impl Iterator<Item = &FloatingGeometry> {
        self.floating.iter().rev()
    }

    /// Solved rectangle of any widget.
    #[must_use]
    pub fn widget_rect(&self, widget: &WidgetId) -> Option<Rect> {
        self.floating
            .iter()
            .find(|entry| entry.widget == *widget)
            .map(|entry| entry.rect)
            .or_else(|| {
                self.docked_widgets()
                    .find(|(_, _, slot)| slot.widget == *widget)
                    .map(|(_, _, slot)| slot.rect)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Widget;
    use ninezone_core::Size;

    fn solve(state: &LayoutState) -> LayoutGeometry {
        LayoutGeometry::solve(state, &TargetTuning::default())
    }

    fn sample() -> LayoutState {
        LayoutState::builder(Size::new(1000.0, 800.0))
            .dock(PanelSide::Left, Widget::single("l1", "t1"))
            .dock(PanelSide::Left, Widget::single("l2", "t2"))
            .dock(PanelSide::Bottom, Widget::single("b1", "t3"))
            .configure_panel(PanelSide::Bottom, |panel| panel.size = 200.0)
            .build()
            .expect("valid")
    }

    #[test]
    fn panels_frame_the_viewport() {
        let geometry = solve(&sample());
        let left = geometry.panel(PanelSide::Left).expect("left");
        assert_eq!(left.rect, Rect::new(0.0, 0.0, 240.0, 800.0));
        let bottom = geometry.panel(PanelSide::Bottom).expect("bottom");
        assert_eq!(bottom.rect, Rect::new(240.0, 600.0, 760.0, 200.0));
        let right = geometry.panel(PanelSide::Right).expect("right");
        assert!(!right.visible);
        assert_eq!(right.rect.width, 0.0);
        assert_eq!(geometry.content, Rect::new(240.0, 0.0, 760.0, 600.0));
    }

    #[test]
    fn spanning_bottom_panel_shortens_side_panels() {
        let state = sample()
            .apply(&crate::action::LayoutAction::SetPanelSpan {
                side: PanelSide::Bottom,
                span: true,
            })
            .expect("span");
        let geometry = solve(&state);
        assert_eq!(
            geometry.panel(PanelSide::Bottom).expect("bottom").rect,
            Rect::new(0.0, 600.0, 1000.0, 200.0)
        );
        assert_eq!(
            geometry.panel(PanelSide::Left).expect("left").rect,
            Rect::new(0.0, 0.0, 240.0, 600.0)
        );
    }

    #[test]
    fn sections_follow_splitter_shares() {
        let geometry = solve(&sample());
        let left = geometry.panel(PanelSide::Left).expect("left");
        assert_eq!(left.sections.len(), 2);
        assert_eq!(left.sections[0].rect, Rect::new(0.0, 0.0, 240.0, 400.0));
        assert_eq!(left.sections[1].rect, Rect::new(0.0, 400.0, 240.0, 400.0));
        let slot = &left.sections[1].widgets[0];
        assert_eq!(slot.tab_strip, Rect::new(0.0, 400.0, 240.0, 24.0));
    }

    #[test]
    fn collapsed_panel_takes_no_space() {
        let state = sample()
            .apply(&crate::action::LayoutAction::SetPanelCollapsed {
                side: PanelSide::Left,
                collapsed: true,
            })
            .expect("collapse");
        let geometry = solve(&state);
        let left = geometry.panel(PanelSide::Left).expect("left");
        assert!(!left.visible);
        assert!(left.sections.is_empty());
        assert_eq!(geometry.content.x, 0.0);
    }

    #[test]
    fn widget_rect_finds_docked_and_floating() {
        let state = sample()
            .apply(&crate::action::LayoutAction::float(
                "l2",
                Some(Rect::new(300.0, 100.0, 200.0, 150.0)),
            ))
            .expect("float");
        let geometry = solve(&state);
        assert_eq!(
            geometry.widget_rect(&WidgetId::new("l2")),
            Some(Rect::new(300.0, 100.0, 200.0, 150.0))
        );
        assert_eq!(
            geometry.widget_rect(&WidgetId::new("l1")),
            Some(Rect::new(0.0, 0.0, 240.0, 800.0))
        );
    }
}
