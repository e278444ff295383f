// axis-aligned rectangle helpers for overlay placement
//
// rectangles use placement form (x1, y1, x2, y2) in integer pixel
// coordinates with x1 < x2 and y1 < y2. detection code constructs them
// from (x, y, width, height) via `from_xywh`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Rect {
    #[inline]
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        debug_assert!(x1 < x2 && y1 < y2);
        Rect { x1, y1, x2, y2 }
    }

    /// build a rect from detection form (top-left corner plus size)
    #[inline]
    pub fn from_xywh(x: u32, y: u32, w: u32, h: u32) -> Self {
        Rect::new(x, y, x + w, y + h)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// area in square pixels
    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// integer center, rounded down (matches detection-box centering)
    #[inline]
    pub fn center(&self) -> (u32, u32) {
        (self.x1 + self.width() / 2, self.y1 + self.height() / 2)
    }

    /// strict rectangle intersection test.
    /// rects that only touch along an edge or corner do NOT overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x2 <= other.x1
            || other.x2 <= self.x1
            || self.y2 <= other.y1
            || other.y2 <= self.y1)
    }
}
