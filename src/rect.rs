use std::fmt;

/// Axis-aligned rectangle in device coordinates.
///
/// Used for scissor and viewport values carried by draw state. Empty
/// rectangles (zero width or height) never intersect anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct URect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl URect {
    pub const ZERO: Self = Self { x: 0, y: 0, width: 0, height: 0 };

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn top(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.top()
    }

    /// Whether the two rectangles overlap in a non-empty region.
    pub fn intersects(&self, other: &URect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }

    /// The overlapping region of the two rectangles, `None` when disjoint.
    pub fn intersection(&self, other: &URect) -> Option<URect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let top = self.top().min(other.top());
        Some(URect { x, y, width: right - x, height: top - y })
    }
}

impl fmt::Display for URect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}

/// Outward expansion of a node's content rectangle, in node-space units.
///
/// A scissor scope clips to the node's content rectangle grown by this
/// padding, so decorations drawn slightly outside the content bounds
/// (shadows, outlines) survive the clip.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Padding {
    pub const ZERO: Self = Self { left: 0.0, top: 0.0, right: 0.0, bottom: 0.0 };

    pub fn all(value: f32) -> Self {
        Self { left: value, top: value, right: value, bottom: value }
    }

    pub fn horizontal_vertical(horizontal: f32, vertical: f32) -> Self {
        Self { left: horizontal, top: vertical, right: horizontal, bottom: vertical }
    }
}
