//! Per-node record and the small arithmetic helpers every other module
//! builds on: reciprocal-depth interpolation and AVL height/balance.

/// Index into a [`crate::Buffer`]'s span arena. Never reused within a
/// buffer's lifetime, so no generation counter is needed.
pub type SpanIdx = u32;

/// A half-open screen-space interval `[x0, x1)` with its reciprocal
/// view-space depths at each endpoint, plus the two child links of the
/// ordered tree it lives in.
#[derive(Clone, Copy, Debug)]
pub struct SpanNode {
    pub x0: f32,
    pub x1: f32,
    pub w0: f32,
    pub w1: f32,
    pub height: i32,
    pub id: u8,
    /// Strictly-left subtree: every span here has `x1 <= self.x0`.
    pub prev: Option<SpanIdx>,
    /// Strictly-right subtree: every span here has `x0 >= self.x1`.
    pub next: Option<SpanIdx>,
}

impl SpanNode {
    pub fn leaf(x0: f32, x1: f32, w0: f32, w1: f32, id: u8) -> Self {
        Self {
            x0,
            x1,
            w0,
            w1,
            height: 0,
            id,
            prev: None,
            next: None,
        }
    }
}

/// Linear interpolation of reciprocal depth along a span:
/// `w0 + (w1 - w0) * p / span`. Every endpoint adjustment anywhere in the
/// engine must go through this so depth stays consistent with the
/// original geometry it was derived from.
#[inline]
pub fn lerp_w(w0: f32, w1: f32, p: f32, span: f32) -> f32 {
    w0 + (w1 - w0) * p / span
}

/// `h(nil) = -1`, `h(leaf) = 0`.
#[inline]
pub fn child_height(h: Option<i32>) -> i32 {
    h.map_or(-1, |h| h)
}

/// `1 + max(h(prev), h(next))`.
#[inline]
pub fn recompute_height(prev_h: Option<i32>, next_h: Option<i32>) -> i32 {
    1 + child_height(prev_h).max(child_height(next_h))
}

/// `h(next) - h(prev)`. Positive means right-heavy.
#[inline]
pub fn balance_factor(prev_h: Option<i32>, next_h: Option<i32>) -> i32 {
    child_height(next_h) - child_height(prev_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_w_matches_endpoints() {
        assert_eq!(lerp_w(1.0, 2.0, 0.0, 4.0), 1.0);
        assert_eq!(lerp_w(1.0, 2.0, 4.0, 4.0), 2.0);
        assert_eq!(lerp_w(1.0, 3.0, 2.0, 4.0), 2.0);
    }

    #[test]
    fn height_of_leaf_is_zero() {
        assert_eq!(recompute_height(None, None), 0);
    }

    #[test]
    fn balance_factor_signs() {
        assert_eq!(balance_factor(Some(0), Some(1)), 1);
        assert_eq!(balance_factor(Some(1), Some(0)), -1);
        assert_eq!(balance_factor(None, None), 0);
    }
}
