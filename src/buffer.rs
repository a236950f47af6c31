//! The buffer itself: an arena of [`SpanNode`]s plus the handful of
//! low-level tree operations (height/balance lookups, rotations) shared
//! by the bisector and the insertion engine's rebalancing pass.

use crate::error::SBufferError;
use crate::span::{SpanIdx, SpanNode, balance_factor, recompute_height};

/// An S-Buffer: the set of currently visible screen-space spans for one
/// horizontal scan, together with their perspective-correct depths.
///
/// Spans are stored in a flat arena rather than as individually heap
/// allocated, doubly-owned nodes: `prev`/`next` are arena indices rather
/// than pointers. This keeps the self-balancing tree surgery in
/// [`crate::bisect`] and [`crate::push`] entirely within safe Rust, and
/// means dropping a `Buffer` is just dropping a `Vec` — no recursive
/// teardown, however deep the tree, can ever overflow the stack.
pub struct Buffer {
    pub(crate) arena: Vec<SpanNode>,
    pub(crate) root: Option<SpanIdx>,
    pub size: i32,
    pub z_near: f32,
    pub max_depth: usize,
}

impl Buffer {
    /// Create a new, empty buffer. `size` is the raster width in
    /// columns, `z_near` the view-space near-plane distance, and
    /// `max_depth` bounds the descent/traversal stacks `push` and
    /// `iterate` use.
    pub fn new(size: i32, z_near: f32, max_depth: usize) -> Result<Self, SBufferError> {
        if size <= 0 {
            return Err(SBufferError::NonPositiveSize(size));
        }
        if !(z_near > 0.0) {
            return Err(SBufferError::NonPositiveZNear(z_near));
        }
        if max_depth == 0 {
            return Err(SBufferError::ZeroMaxDepth(max_depth));
        }
        Ok(Self {
            arena: Vec::new(),
            root: None,
            size,
            z_near,
            max_depth,
        })
    }

    /// `size` as a float, since every geometric computation works in
    /// screen-space floats.
    #[inline]
    pub(crate) fn size_f(&self) -> f32 {
        self.size as f32
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub(crate) fn node(&self, idx: SpanIdx) -> &SpanNode {
        &self.arena[idx as usize]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, idx: SpanIdx) -> &mut SpanNode {
        &mut self.arena[idx as usize]
    }

    pub(crate) fn height_of(&self, idx: Option<SpanIdx>) -> i32 {
        match idx {
            Some(i) => self.node(i).height,
            None => -1,
        }
    }

    pub(crate) fn bf_of(&self, idx: SpanIdx) -> i32 {
        let n = self.node(idx);
        balance_factor(Some(self.height_of(n.prev)), Some(self.height_of(n.next)))
    }

    pub(crate) fn update_height(&mut self, idx: SpanIdx) {
        let (prev, next) = {
            let n = self.node(idx);
            (n.prev, n.next)
        };
        let h = recompute_height(Some(self.height_of(prev)), Some(self.height_of(next)));
        self.node_mut(idx).height = h;
    }

    pub(crate) fn alloc(&mut self, node: SpanNode) -> SpanIdx {
        let idx = self.arena.len() as SpanIdx;
        self.arena.push(node);
        idx
    }

    /// Single left rotation around `old_parent` (its `next` child becomes
    /// the new subtree root). Returns the new subtree root.
    pub(crate) fn rotate_left(&mut self, old_parent: SpanIdx) -> SpanIdx {
        let new_parent = self.node(old_parent).next.expect("rotate_left needs a right child");
        let moved = self.node(new_parent).prev;
        self.node_mut(old_parent).next = moved;
        self.node_mut(new_parent).prev = Some(old_parent);
        self.update_height(old_parent);
        self.update_height(new_parent);
        new_parent
    }

    /// Single right rotation around `old_parent` (its `prev` child
    /// becomes the new subtree root). Returns the new subtree root.
    pub(crate) fn rotate_right(&mut self, old_parent: SpanIdx) -> SpanIdx {
        let new_parent = self.node(old_parent).prev.expect("rotate_right needs a left child");
        let moved = self.node(new_parent).next;
        self.node_mut(old_parent).prev = moved;
        self.node_mut(new_parent).next = Some(old_parent);
        self.update_height(old_parent);
        self.update_height(new_parent);
        new_parent
    }

    /// Restore balance at `old_parent`, whose balance factor is known to
    /// lie outside `{-1, 0, 1}`. Returns the new root of this subtree.
    pub(crate) fn rebalance_subtree(&mut self, old_parent: SpanIdx) -> SpanIdx {
        let bf = self.bf_of(old_parent);
        if bf < 0 {
            let left = self.node(old_parent).prev.expect("left-heavy needs a left child");
            if self.bf_of(left) > 0 {
                // left-right case: rotate the left child left first.
                let new_left = self.rotate_left(left);
                self.node_mut(old_parent).prev = Some(new_left);
            }
            self.rotate_right(old_parent)
        } else {
            let right = self.node(old_parent).next.expect("right-heavy needs a right child");
            if self.bf_of(right) < 0 {
                // right-left case: rotate the right child right first.
                let new_right = self.rotate_right(right);
                self.node_mut(old_parent).next = Some(new_right);
            }
            self.rotate_left(old_parent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_size() {
        assert!(matches!(
            Buffer::new(0, 1.0, 8),
            Err(SBufferError::NonPositiveSize(0))
        ));
    }

    #[test]
    fn rejects_non_positive_z_near() {
        assert!(matches!(
            Buffer::new(16, 0.0, 8),
            Err(SBufferError::NonPositiveZNear(_))
        ));
    }

    #[test]
    fn rejects_zero_max_depth() {
        assert!(matches!(
            Buffer::new(16, 1.0, 0),
            Err(SBufferError::ZeroMaxDepth(0))
        ));
    }

    #[test]
    fn fresh_buffer_is_empty() {
        let buf = Buffer::new(16, 4.0, 16).unwrap();
        assert!(buf.is_empty());
    }
}
