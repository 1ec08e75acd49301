use serde::{Deserialize, Serialize};

/// Golden ratio, (1 + sqrt(5)) / 2.
pub const GOLDEN_RATIO: f64 = 1.618033988749895;

/// Golden angle in degrees, 360 * (1 - 1/phi), roughly 137.5.
pub const GOLDEN_ANGLE_DEGREES: f64 = 360.0 * (1.0 - 1.0 / GOLDEN_RATIO);

/// A 2D coordinate in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Vogel spiral position for a slot index. Slot 0 is the innermost ring;
/// consecutive slots advance by the golden angle, which spreads points
/// evenly without overlaps.
///
/// Pure and total for any `usize` slot. Negative slots are unrepresentable
/// by the parameter type, so the non-negativity precondition is enforced
/// statically rather than coerced at runtime. Spacing must be strictly
/// positive; `LayoutState` and `load_config` validate it before placement
/// ever happens, so the assertion here only guards direct callers.
pub fn position(slot: usize, spacing: f64) -> Point {
    assert!(spacing > 0.0, "spiral spacing must be positive");
    let radius = spacing * ((slot as f64) + 1.0).sqrt();
    let angle = (slot as f64 * GOLDEN_ANGLE_DEGREES).to_radians();
    Point::new(radius * angle.cos(), radius * angle.sin())
}
