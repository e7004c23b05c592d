//! The visible region that particles must stay within to survive culling.

use glam::DVec2;

/// Bounds of the visible area, in pixels.
///
/// There's deliberately no upper bound: a particle that flies off the top of the screen is still
/// going to fall back into view.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "It's very unlikely that this is going to have any more fields added to it"
)]
pub struct Viewport {
    /// Left edge
    pub min_x: f64,
    /// Right edge
    pub max_x: f64,
    /// Bottom edge
    pub min_y: f64,
}

impl Viewport {
    /// A viewport anchored at the origin.
    #[must_use]
    pub const fn with_width(width: f64) -> Self {
        Self {
            min_x: 0.0,
            max_x: width,
            min_y: 0.0,
        }
    }

    /// Is the point within the horizontal bounds and above the bottom edge?
    #[must_use]
    pub fn retains(&self, point: DVec2) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y
    }
}
