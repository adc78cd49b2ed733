use eframe::egui::{
    self, Align2, Color32, FontId, PointerButton, Pos2, Sense, Shape, Stroke, Ui, pos2, vec2,
};
use eframe::egui::epaint::QuadraticBezierShape;

use crate::geometry::{Viewport, curve_control_point};
use crate::model::LinkKind;
use crate::util::{initials, parse_hex_color};

use super::ViewModel;

const FIT_PADDING: f32 = 60.0;
const CURVE_BEND: f32 = 0.18;
const BACKGROUND: Color32 = Color32::from_rgb(21, 24, 30);
const DEFAULT_NODE_COLOR: Color32 = Color32::from_rgb(95, 125, 160);
const FOCUS_RING: Color32 = Color32::from_rgb(245, 206, 93);

impl ViewModel {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);

        self.canvas_size = rect.size();
        if self.needs_fit {
            self.viewport
                .fit_to_content(&self.store.state().nodes, rect.size(), FIT_PADDING);
            self.needs_fit = false;
        }

        let origin = rect.min.to_vec2();
        let hover = response.hover_pos().map(|screen| screen - origin);
        let gesture = response.interact_pointer_pos().map(|screen| screen - origin);

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let cursor = hover.unwrap_or(rect.center() - origin);
                // egui reports scroll-up as positive; the controller follows
                // wheel semantics where positive delta zooms out.
                self.viewport.on_wheel(cursor, -scroll);
            }
        }

        let hovered_id = hover.and_then(|cursor| self.hit_test(cursor));

        if response.drag_started_by(PointerButton::Primary)
            && let Some(pointer) = gesture
        {
            // A press on a node starts a drag and never a pan.
            match &hovered_id {
                Some(id) => self.drag.on_node_grab(id, pointer),
                None => self.viewport.on_pan_start(pointer),
            }
        }

        if response.dragged_by(PointerButton::Primary)
            && let Some(pointer) = gesture
        {
            if self.drag.is_dragging() {
                let scale = self.viewport.view().scale;
                self.drag.on_pointer_move(pointer, scale, &mut self.store);
            } else {
                self.viewport.on_pan_move(pointer);
            }
        }

        if response.drag_stopped() {
            self.drag.on_release();
            self.viewport.on_pan_end();
        }
        if !response.dragged() && !ui.rect_contains_pointer(rect) {
            self.viewport.on_pointer_leave();
        }

        if response.clicked_by(PointerButton::Primary) {
            self.store.set_focus(hovered_id.clone());
        }

        if response.dragged() {
            ui.ctx().request_repaint();
        }
        if hovered_id.is_some() || self.drag.is_dragging() {
            ui.output_mut(|output| {
                output.cursor_icon = if self.drag.is_dragging() {
                    egui::CursorIcon::Grabbing
                } else {
                    egui::CursorIcon::PointingHand
                };
            });
        }

        let view = self.viewport.view();
        let index = self.store.nodes_by_id().clone();
        let state = self.store.state();
        let focused = self.store.focused().map(str::to_string);
        let to_screen = |world: Pos2| view.world_to_screen(world) + origin;

        for link in &state.links {
            // Links whose endpoint was removed later are omitted, not errors.
            let (Some(&source), Some(&target)) =
                (index.get(&link.source), index.get(&link.target))
            else {
                continue;
            };

            let a = to_screen(pos2(state.nodes[source].x, state.nodes[source].y));
            let b = to_screen(pos2(state.nodes[target].x, state.nodes[target].y));
            let stroke = Stroke::new(
                (1.6 * view.scale.sqrt()).clamp(0.8, 3.2),
                Color32::from_rgba_unmultiplied(150, 155, 165, 190),
            );

            match link.kind {
                LinkKind::Solid => {
                    painter.line_segment([a, b], stroke);
                }
                LinkKind::Dashed => {
                    painter.add(Shape::dashed_line(&[a, b], stroke, 9.0, 6.0));
                }
                LinkKind::Dotted => {
                    painter.add(Shape::dashed_line(&[a, b], stroke, 2.0, 5.0));
                }
                LinkKind::Curved => {
                    let control = curve_control_point(a, b, CURVE_BEND);
                    painter.add(QuadraticBezierShape::from_points_stroke(
                        [a, control, b],
                        false,
                        Color32::TRANSPARENT,
                        stroke,
                    ));
                }
            }
        }

        for node in &state.nodes {
            let position = to_screen(pos2(node.x, node.y));
            let radius = node.radius() * view.scale;

            let color = state
                .groups
                .get(&node.group)
                .and_then(|group| group.color.as_deref())
                .and_then(parse_hex_color)
                .unwrap_or(DEFAULT_NODE_COLOR);

            let is_focused = focused.as_deref() == Some(node.id.as_str());
            let is_hovered = hovered_id.as_deref() == Some(node.id.as_str());

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_hovered { 2.2 } else { 1.2 },
                    Color32::from_rgba_unmultiplied(12, 12, 12, 200),
                ),
            );
            if is_focused {
                painter.circle_stroke(position, radius + 3.5, Stroke::new(2.0, FOCUS_RING));
            }

            painter.text(
                position,
                Align2::CENTER_CENTER,
                initials(&node.label),
                FontId::proportional((radius * 0.8).clamp(9.0, 22.0)),
                Color32::from_gray(245),
            );
            if view.scale > 0.55 || is_focused || is_hovered {
                painter.text(
                    position + vec2(0.0, radius + 4.0),
                    Align2::CENTER_TOP,
                    &node.label,
                    FontId::proportional(12.0),
                    Color32::from_gray(225),
                );
            }
        }
    }

    /// Topmost node under the pointer, in canvas-local coordinates.
    fn hit_test(&self, cursor: Pos2) -> Option<String> {
        let view: Viewport = self.viewport.view();
        self.store
            .state()
            .nodes
            .iter()
            .rev()
            .find(|node| {
                let position = view.world_to_screen(pos2(node.x, node.y));
                let radius = node.radius() * view.scale;
                position.distance(cursor) <= radius
            })
            .map(|node| node.id.clone())
    }
}
