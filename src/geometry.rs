use eframe::egui::{Pos2, Vec2, pos2};

use crate::model::Node;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Viewport {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        pos2(world.x * self.scale + self.tx, world.y * self.scale + self.ty)
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        pos2((screen.x - self.tx) / self.scale, (screen.y - self.ty) / self.scale)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLimits {
    pub min: f32,
    pub max: f32,
}

impl ScaleLimits {
    pub const DEFAULT: Self = Self { min: 0.4, max: 2.5 };

    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Largest view that frames every node (inflated by its radius) plus padding,
/// centered in a viewport of the given size. Degenerate input keeps the
/// identity view instead of failing.
pub fn fit_view(nodes: &[Node], viewport: Vec2, padding: f32, limits: ScaleLimits) -> Viewport {
    if nodes.is_empty() || viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Viewport::IDENTITY;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for node in nodes {
        let r = node.radius();
        min_x = min_x.min(node.x - r);
        min_y = min_y.min(node.y - r);
        max_x = max_x.max(node.x + r);
        max_y = max_y.max(node.y + r);
    }

    // A single node yields a degenerate box; treat each side as at least 1.
    let width = (max_x - min_x).max(1.0);
    let height = (max_y - min_y).max(1.0);

    let available_x = (viewport.x - padding * 2.0).max(1.0);
    let available_y = (viewport.y - padding * 2.0).max(1.0);
    let scale = limits.clamp((available_x / width).min(available_y / height));

    let center_x = (min_x + max_x) * 0.5;
    let center_y = (min_y + max_y) * 0.5;

    Viewport {
        scale,
        tx: viewport.x * 0.5 - center_x * scale,
        ty: viewport.y * 0.5 - center_y * scale,
    }
}

/// Control point for routing a link as a quadratic curve: the segment
/// midpoint pushed perpendicular, proportional to segment length so curves
/// deform smoothly while an endpoint is dragged.
pub fn curve_control_point(a: Pos2, b: Pos2, bend: f32) -> Pos2 {
    let mid_x = (a.x + b.x) * 0.5;
    let mid_y = (a.y + b.y) * 0.5;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    pos2(mid_x - dy * bend, mid_y + dx * bend)
}
