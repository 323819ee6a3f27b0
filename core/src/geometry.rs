use serde::{Deserialize, Serialize};

use crate::Coord2;

/// Pixel-space point in board-local coordinates.
pub type PxPoint = (f64, f64);

/// Gestures smaller than this on both axes count as accidental clicks.
pub const MIN_DRAG_PX: f64 = 2.0;

/// Axis-aligned drag rectangle, normalized to non-negative extents.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl SelectRect {
    /// Builds the rectangle spanned by two drag corners, in either order.
    pub fn from_corners(a: PxPoint, b: PxPoint) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            w: (b.0 - a.0).abs(),
            h: (b.1 - a.1).abs(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.w < MIN_DRAG_PX && self.h < MIN_DRAG_PX
    }

    /// Strict overlap against the pixel square of cell `coords`.
    ///
    /// The cell spans `[x*cell_size, (x+1)*cell_size)` on each axis; touching
    /// edges do not select.
    pub fn overlaps_cell(&self, (x, y): Coord2, cell_size: f64) -> bool {
        let left = f64::from(x) * cell_size;
        let top = f64::from(y) * cell_size;
        self.x < left + cell_size
            && self.x + self.w > left
            && self.y < top + cell_size
            && self.y + self.h > top
    }
}
