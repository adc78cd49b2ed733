use eframe::egui::{Pos2, Vec2};

use crate::geometry::{ScaleLimits, Viewport, fit_view};
use crate::model::Node;

const WHEEL_ZOOM_RATE: f32 = 0.0018;

#[derive(Clone, Copy, Debug, Default)]
pub struct ViewPatch {
    pub scale: Option<f32>,
    pub tx: Option<f32>,
    pub ty: Option<f32>,
}

/// Owns the continuous pan/zoom transform and the pan gesture state machine
/// (Idle or Panning). Every input is clamped; there are no error states.
pub struct ViewportController {
    view: Viewport,
    limits: ScaleLimits,
    panning: bool,
    last_pointer: Option<Pos2>,
}

impl ViewportController {
    pub fn new(limits: ScaleLimits) -> Self {
        Self {
            view: Viewport::IDENTITY,
            limits,
            panning: false,
            last_pointer: None,
        }
    }

    pub fn view(&self) -> Viewport {
        self.view
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    /// Anchor-preserving zoom: the world point under the cursor before the
    /// zoom stays under the cursor after it. Positive wheel delta zooms out.
    pub fn on_wheel(&mut self, cursor: Pos2, delta_y: f32) {
        if delta_y == 0.0 {
            return;
        }
        let factor = (-delta_y * WHEEL_ZOOM_RATE).exp().clamp(0.85, 1.15);
        self.zoom_about(cursor, factor);
    }

    pub fn zoom_about(&mut self, anchor: Pos2, factor: f32) {
        let new_scale = self.limits.clamp(self.view.scale * factor);
        let wx = (anchor.x - self.view.tx) / self.view.scale;
        let wy = (anchor.y - self.view.ty) / self.view.scale;
        self.view = Viewport {
            scale: new_scale,
            tx: anchor.x - wx * new_scale,
            ty: anchor.y - wy * new_scale,
        };
    }

    pub fn on_pan_start(&mut self, pointer: Pos2) {
        self.panning = true;
        self.last_pointer = Some(pointer);
    }

    /// Offsets are in screen space, so panning applies the raw screen delta
    /// with no scale correction.
    pub fn on_pan_move(&mut self, pointer: Pos2) {
        if !self.panning {
            return;
        }
        if let Some(last) = self.last_pointer {
            self.view.tx += pointer.x - last.x;
            self.view.ty += pointer.y - last.y;
        }
        self.last_pointer = Some(pointer);
    }

    pub fn on_pan_end(&mut self) {
        self.panning = false;
        self.last_pointer = None;
    }

    pub fn on_pointer_leave(&mut self) {
        self.on_pan_end();
    }

    pub fn fit_to_content(&mut self, nodes: &[Node], size: Vec2, padding: f32) {
        let fitted = fit_view(nodes, size, padding, self.limits);
        self.set_view(ViewPatch {
            scale: Some(fitted.scale),
            tx: Some(fitted.tx),
            ty: Some(fitted.ty),
        });
    }

    pub fn set_view(&mut self, patch: ViewPatch) {
        if let Some(scale) = patch.scale {
            self.view.scale = self.limits.clamp(scale);
        }
        if let Some(tx) = patch.tx {
            self.view.tx = tx;
        }
        if let Some(ty) = patch.ty {
            self.view.ty = ty;
        }
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(ScaleLimits::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn wheel_zoom_preserves_world_point_under_cursor() {
        let cursors = [pos2(0.0, 0.0), pos2(311.0, 97.0), pos2(-40.0, 512.5)];
        let deltas = [-120.0, -30.0, 15.0, 53.0, 120.0];

        for cursor in cursors {
            let mut controller = ViewportController::default();
            controller.set_view(ViewPatch {
                scale: Some(1.3),
                tx: Some(80.0),
                ty: Some(-25.0),
            });

            for delta in deltas {
                let before = controller.view().screen_to_world(cursor);
                controller.on_wheel(cursor, delta);
                let after = controller.view().screen_to_world(cursor);
                assert!(
                    (before.x - after.x).abs() < 1e-3 && (before.y - after.y).abs() < 1e-3,
                    "anchor drifted: {before:?} -> {after:?} (delta {delta})"
                );
            }
        }
    }

    #[test]
    fn positive_wheel_delta_zooms_out() {
        let mut controller = ViewportController::default();
        let start = controller.view().scale;
        controller.on_wheel(pos2(100.0, 100.0), 120.0);
        assert!(controller.view().scale < start);

        controller.on_wheel(pos2(100.0, 100.0), -120.0);
        controller.on_wheel(pos2(100.0, 100.0), -120.0);
        assert!(controller.view().scale > start);
    }

    #[test]
    fn scale_never_leaves_its_bounds() {
        let mut controller = ViewportController::default();
        for _ in 0..200 {
            controller.on_wheel(pos2(50.0, 50.0), -120.0);
        }
        assert_eq!(controller.view().scale, ScaleLimits::DEFAULT.max);

        for _ in 0..400 {
            controller.on_wheel(pos2(50.0, 50.0), 120.0);
        }
        assert_eq!(controller.view().scale, ScaleLimits::DEFAULT.min);
    }

    #[test]
    fn pan_applies_raw_screen_deltas_between_start_and_end() {
        let mut controller = ViewportController::default();
        controller.set_view(ViewPatch {
            scale: Some(2.0),
            ..Default::default()
        });

        // Moves before the gesture starts are ignored.
        controller.on_pan_move(pos2(10.0, 10.0));
        assert_eq!(controller.view().tx, 0.0);

        controller.on_pan_start(pos2(100.0, 100.0));
        controller.on_pan_move(pos2(110.0, 95.0));
        controller.on_pan_move(pos2(130.0, 95.0));
        assert_eq!(controller.view().tx, 30.0);
        assert_eq!(controller.view().ty, -5.0);

        controller.on_pan_end();
        controller.on_pan_move(pos2(500.0, 500.0));
        assert_eq!(controller.view().tx, 30.0);
    }

    #[test]
    fn set_view_clamps_scale_only() {
        let mut controller = ViewportController::default();
        controller.set_view(ViewPatch {
            scale: Some(99.0),
            tx: Some(-12_345.0),
            ty: None,
        });
        assert_eq!(controller.view().scale, ScaleLimits::DEFAULT.max);
        assert_eq!(controller.view().tx, -12_345.0);
        assert_eq!(controller.view().ty, 0.0);
    }
}
