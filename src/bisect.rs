//! Splitting a partially-obscured span into three fragments.

use crate::buffer::Buffer;
use crate::span::{SpanIdx, SpanNode, lerp_w};

/// `parent` (an existing span `[p0,p1)` with depths `[q0,q1]`) is
/// partially obscured by incoming span `I = ([x0,x1), [w0,w1])` along
/// `[visx0, visx1) ⊂ [p0,p1)`. Replace `parent` in place with the
/// visible middle fragment (now carrying `id`), and link a left and a
/// right remainder fragment (both keeping `parent`'s old id) as its
/// immediate children.
pub(crate) fn bisect_parent(
    buf: &mut Buffer,
    parent: SpanIdx,
    x0: f32,
    x1: f32,
    w0: f32,
    w1: f32,
    visx0: f32,
    visx1: f32,
    id: u8,
) {
    let incoming_span = x1 - x0;
    let old = *buf.node(parent);
    let old_span = old.x1 - old.x0;

    {
        let p = buf.node_mut(parent);
        p.x0 = visx0;
        p.x1 = visx1;
        p.w0 = lerp_w(w0, w1, visx0 - x0, incoming_span);
        p.w1 = lerp_w(w0, w1, visx1 - x0, incoming_span);
        p.id = id;
    }

    // Left remainder: [old.x0, visx0), inherits old.w0 on its left edge
    // and the lerped depth at visx0 on its right edge.
    let left_w1 = lerp_w(old.w0, old.w1, visx0 - old.x0, old_span);
    let mut left_frag = SpanNode::leaf(old.x0, visx0, old.w0, left_w1, old.id);
    left_frag.prev = old.prev;
    let left_idx = buf.alloc(left_frag);
    buf.node_mut(parent).prev = Some(left_idx);

    if buf.bf_of(left_idx) < -1 {
        let new_root = buf.rebalance_subtree(left_idx);
        buf.node_mut(parent).prev = Some(new_root);
    } else {
        buf.update_height(left_idx);
    }

    // Right remainder: [visx1, old.x1), inherits the lerped depth at
    // visx1 on its left edge and old.w1 on its right edge.
    let right_w0 = lerp_w(old.w0, old.w1, visx1 - old.x0, old_span);
    let mut right_frag = SpanNode::leaf(visx1, old.x1, right_w0, old.w1, old.id);
    right_frag.next = old.next;
    let right_idx = buf.alloc(right_frag);
    buf.node_mut(parent).next = Some(right_idx);
    buf.update_height(right_idx);

    buf.update_height(parent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanNode;

    #[test]
    fn bisect_conserves_flanks_and_installs_middle() {
        let mut buf = Buffer::new(8, 4.0, 8).unwrap();
        let root = buf.alloc(SpanNode::leaf(0.0, 4.0, 1.0, 1.0, b'A'));
        buf.root = Some(root);

        bisect_parent(&mut buf, root, 1.0, 3.0, 2.0, 2.0, 1.0, 3.0, b'B');

        let mid = *buf.node(root);
        assert_eq!((mid.x0, mid.x1, mid.id), (1.0, 3.0, b'B'));
        assert_eq!(mid.w0, 2.0);
        assert_eq!(mid.w1, 2.0);

        let left = *buf.node(mid.prev.unwrap());
        assert_eq!((left.x0, left.x1, left.id), (0.0, 1.0, b'A'));
        assert_eq!(left.w0, 1.0);
        assert_eq!(left.w1, 1.0);

        let right = *buf.node(mid.next.unwrap());
        assert_eq!((right.x0, right.x1, right.id), (3.0, 4.0, b'A'));
        assert_eq!(right.w0, 1.0);
        assert_eq!(right.w1, 1.0);
    }
}
