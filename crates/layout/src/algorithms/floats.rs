//! Float placement and the float-avoidance queries used by line layout.
//!
//! One `FloatManager` exists per block formatting context. Positions are
//! stored relative to the origin of that context, so they stay valid no
//! matter where the context itself ends up in the document.

use flowbox_style::display::{Clear, Float};
use flowbox_types::BoxId;
use flowbox_types::geometry::EPSILON;

/// A placed float: its margin box in BFC coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxOffset {
    pub box_id: BoxId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxOffset {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    fn overlaps_band(&self, top: f32, bottom: f32) -> bool {
        // A zero-height band still "sits" at `top`.
        let bottom = if bottom <= top { top + EPSILON * 2.0 } else { bottom };
        self.y < bottom - EPSILON && top < self.bottom() - EPSILON
    }

    fn intersects(&self, other: &BoxOffset) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && other.width > 0.0
            && other.height > 0.0
            && self.x < other.right() - EPSILON
            && other.x < self.right() - EPSILON
            && self.y < other.bottom() - EPSILON
            && other.y < self.bottom() - EPSILON
    }
}

/// The horizontal extent floats are placed into, in BFC coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatContainer {
    pub x: f32,
    pub width: f32,
}

impl FloatContainer {
    pub fn new(x: f32, width: f32) -> Self {
        Self { x, width }
    }

    fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatManager {
    left: Vec<BoxOffset>,
    right: Vec<BoxOffset>,
}

impl FloatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    pub fn left_floats(&self) -> &[BoxOffset] {
        &self.left
    }

    pub fn right_floats(&self) -> &[BoxOffset] {
        &self.right
    }

    /// Places a float whose margin box is `width` x `height`, no higher than
    /// `y`. Returns the chosen offset, which is also recorded.
    pub fn place_float(
        &mut self,
        box_id: BoxId,
        side: Float,
        clear: Clear,
        width: f32,
        height: f32,
        y: f32,
        container: FloatContainer,
    ) -> BoxOffset {
        let is_left = side != Float::Right;
        let edge_x = if is_left {
            container.x
        } else {
            container.right() - width
        };
        let (same, opposite) = if is_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        // Push to the extreme edge.
        let mut offset = BoxOffset {
            box_id,
            x: edge_x,
            y,
            width,
            height,
        };

        // Not above the last float of either side; flush beside the last
        // same-side float when they share a band.
        if let Some(last) = same.last() {
            offset.y = offset.y.max(last.y);
            if last.overlaps_band(offset.y, offset.y + height) {
                offset.x = if is_left { last.right() } else { last.x - width };
            }
        }
        if let Some(last) = opposite.last() {
            offset.y = offset.y.max(last.y);
        }

        let fits = |o: &BoxOffset| {
            o.x >= container.x - EPSILON && o.right() <= container.right() + EPSILON
        };

        // Back to the edge and below the same-side floats.
        if !fits(&offset) || same.iter().any(|f| f.intersects(&offset)) {
            offset.x = edge_x;
            offset.y = offset.y.max(lowest_bottom(same));
        }

        // Below opposite floats it collides with, then re-check the same side.
        if opposite.iter().any(|f| f.intersects(&offset)) {
            offset.y = offset.y.max(lowest_bottom(opposite));
            offset.x = edge_x;
            if let Some(beside) = same
                .iter()
                .filter(|f| f.overlaps_band(offset.y, offset.y + height))
                .map(|f| if is_left { f.right() } else { f.x - width })
                .reduce(|a, b| if is_left { a.max(b) } else { a.min(b) })
            {
                offset.x = beside;
            }
            if !fits(&offset) || same.iter().any(|f| f.intersects(&offset)) {
                offset.x = edge_x;
                offset.y = offset.y.max(lowest_bottom(same));
            }
        }

        // Explicit clearance wins over everything above.
        if clear != Clear::None {
            let mut below = 0.0f32;
            if clear.clears_left() {
                below = below.max(lowest_bottom(&self.left));
            }
            if clear.clears_right() {
                below = below.max(lowest_bottom(&self.right));
            }
            if below > offset.y {
                offset.x = edge_x;
                offset.y = below;
            }
        }

        log::trace!(
            "Placed {:?} float {} at ({:.2}, {:.2}) size {:.2}x{:.2}",
            side,
            box_id,
            offset.x,
            offset.y,
            width,
            height
        );
        if is_left {
            self.left.push(offset);
        } else {
            self.right.push(offset);
        }
        offset
    }

    /// How far left floats intrude past `line_left` within the band
    /// `[y, y + height)`.
    pub fn left_distance(&self, y: f32, height: f32, line_left: f32) -> f32 {
        self.left
            .iter()
            .filter(|f| f.overlaps_band(y, y + height))
            .map(|f| f.right() - line_left)
            .fold(0.0f32, f32::max)
    }

    /// How far right floats intrude before `line_right` within the band
    /// `[y, y + height)`.
    pub fn right_distance(&self, y: f32, height: f32, line_right: f32) -> f32 {
        self.right
            .iter()
            .filter(|f| f.overlaps_band(y, y + height))
            .map(|f| line_right - f.x)
            .fold(0.0f32, f32::max)
    }

    /// Vertical distance from `y` to below the floats `clear` names.
    pub fn clear_delta(&self, y: f32, clear: Clear) -> f32 {
        let mut bottom = f32::NEG_INFINITY;
        if clear.clears_left() {
            bottom = bottom.max(lowest_bottom(&self.left));
        }
        if clear.clears_right() {
            bottom = bottom.max(lowest_bottom(&self.right));
        }
        (bottom - y).max(0.0)
    }

    /// Smallest step down from `y` after which at least one float that is
    /// still beside `y` has ended. Zero when no float reaches below `y`.
    pub fn next_line_delta(&self, y: f32) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .map(|f| f.bottom() - y)
            .filter(|d| *d > EPSILON)
            .fold(None, |acc: Option<f32>, d| Some(acc.map_or(d, |a| a.min(d))))
            .unwrap_or(0.0)
    }

    pub fn lowest_float_bottom(&self) -> f32 {
        lowest_bottom(&self.left).max(lowest_bottom(&self.right))
    }

    pub fn remove_float(&mut self, box_id: BoxId) {
        self.left.retain(|f| f.box_id != box_id);
        self.right.retain(|f| f.box_id != box_id);
    }

    /// Removes every float for which `pred` holds.
    pub fn remove_where(&mut self, mut pred: impl FnMut(BoxId) -> bool) {
        self.left.retain(|f| !pred(f.box_id));
        self.right.retain(|f| !pred(f.box_id));
    }
}

fn lowest_bottom(list: &[BoxOffset]) -> f32 {
    list.iter().map(BoxOffset::bottom).fold(0.0f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> BoxId {
        BoxId::new(n)
    }

    const CONTAINER: FloatContainer = FloatContainer { x: 0.0, width: 300.0 };

    #[test]
    fn left_float_intrudes_only_where_it_is() {
        let mut floats = FloatManager::new();
        floats.place_float(id(1), Float::Left, Clear::None, 100.0, 50.0, 0.0, CONTAINER);
        assert_eq!(floats.left_distance(0.0, 20.0, 0.0), 100.0);
        assert_eq!(floats.left_distance(40.0, 20.0, 0.0), 100.0);
        assert_eq!(floats.left_distance(50.0, 20.0, 0.0), 0.0);
        assert_eq!(floats.left_distance(60.0, 20.0, 0.0), 0.0);
        assert_eq!(floats.right_distance(0.0, 20.0, 300.0), 0.0);
    }

    #[test]
    fn same_side_floats_stack_horizontally() {
        let mut floats = FloatManager::new();
        let a = floats.place_float(id(1), Float::Left, Clear::None, 100.0, 50.0, 0.0, CONTAINER);
        let b = floats.place_float(id(2), Float::Left, Clear::None, 100.0, 30.0, 0.0, CONTAINER);
        assert_eq!((a.x, a.y), (0.0, 0.0));
        assert_eq!((b.x, b.y), (100.0, 0.0));
    }

    #[test]
    fn float_that_does_not_fit_moves_below() {
        let mut floats = FloatManager::new();
        floats.place_float(id(1), Float::Left, Clear::None, 200.0, 50.0, 0.0, CONTAINER);
        let b = floats.place_float(id(2), Float::Left, Clear::None, 150.0, 30.0, 0.0, CONTAINER);
        assert_eq!((b.x, b.y), (0.0, 50.0));
    }

    #[test]
    fn right_float_moves_below_colliding_left_float() {
        let mut floats = FloatManager::new();
        floats.place_float(id(1), Float::Left, Clear::None, 200.0, 50.0, 0.0, CONTAINER);
        let r = floats.place_float(id(2), Float::Right, Clear::None, 150.0, 30.0, 0.0, CONTAINER);
        assert_eq!((r.x, r.y), (150.0, 50.0));
        let r2 = floats.place_float(id(3), Float::Right, Clear::None, 50.0, 30.0, 0.0, CONTAINER);
        // Not above the last right float.
        assert!(r2.y >= 50.0);
    }

    #[test]
    fn explicit_clear_goes_below_named_side() {
        let mut floats = FloatManager::new();
        floats.place_float(id(1), Float::Left, Clear::None, 50.0, 80.0, 0.0, CONTAINER);
        let r = floats.place_float(id(2), Float::Right, Clear::Left, 50.0, 10.0, 0.0, CONTAINER);
        assert_eq!((r.x, r.y), (250.0, 80.0));
    }

    #[test]
    fn same_side_floats_never_overlap() {
        let mut floats = FloatManager::new();
        let sizes = [(120.0, 40.0), (90.0, 70.0), (150.0, 20.0), (60.0, 90.0), (200.0, 10.0)];
        for (i, (w, h)) in sizes.iter().enumerate() {
            floats.place_float(id(i), Float::Left, Clear::None, *w, *h, 5.0 * i as f32, CONTAINER);
            floats.place_float(id(100 + i), Float::Right, Clear::None, *w / 2.0, *h, 0.0, CONTAINER);
        }
        for list in [floats.left_floats(), floats.right_floats()] {
            for (i, a) in list.iter().enumerate() {
                for b in &list[i + 1..] {
                    assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn clear_and_next_line_deltas() {
        let mut floats = FloatManager::new();
        floats.place_float(id(1), Float::Left, Clear::None, 50.0, 40.0, 0.0, CONTAINER);
        floats.place_float(id(2), Float::Right, Clear::None, 50.0, 70.0, 0.0, CONTAINER);
        assert_eq!(floats.clear_delta(10.0, Clear::Left), 30.0);
        assert_eq!(floats.clear_delta(10.0, Clear::Both), 60.0);
        assert_eq!(floats.clear_delta(100.0, Clear::Both), 0.0);
        assert_eq!(floats.next_line_delta(10.0), 30.0);
        assert_eq!(floats.next_line_delta(40.0), 30.0);
        assert_eq!(floats.next_line_delta(70.0), 0.0);
        floats.remove_float(id(2));
        assert_eq!(floats.lowest_float_bottom(), 40.0);
    }
}
