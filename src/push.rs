//! The insertion engine: `push` walks the tree once per outstanding
//! sub-segment of the candidate span, resolving visibility against every
//! node it visits, then rebalances the single deepest imbalance the
//! insertion produced.

use smallvec::SmallVec;

use crate::bisect::bisect_parent;
use crate::buffer::Buffer;
use crate::geometry::{CrossKind, depth_fixed, span_intersect};
use crate::span::{SpanIdx, SpanNode, lerp_w};

/// Result of a single [`Buffer::push`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    /// At least part of the candidate span is now visible in the buffer.
    Inserted,
    /// The candidate was entirely behind existing geometry, or clipped
    /// to an empty interval; the buffer is unchanged.
    Occluded,
    /// `max_depth` was reached mid-descent. The buffer is left in a
    /// well-formed state reflecting whatever partial work had already
    /// committed; retry with a larger `max_depth` on a fresh buffer.
    DepthExhausted,
}

#[derive(Clone, Copy)]
struct Frame {
    span: SpanIdx,
    left: f32,
    right: f32,
}

impl Buffer {
    /// Push a candidate span `[x0, x1)` with reciprocal depths `w0` at
    /// `x0` and `w1` at `x1` onto the buffer, resolving visibility
    /// against everything already there. `x0 < x1` and `w0, w1 > 0` are
    /// the caller's contract; debug builds assert them.
    pub fn push(&mut self, x0: f32, x1: f32, w0: f32, w1: f32, id: u8) -> PushOutcome {
        debug_assert!(x0 < x1, "push requires x0 < x1");
        debug_assert!(w0 > 0.0 && w1 > 0.0, "push requires positive depths");

        let cand_span = x1 - x0;

        if self.is_empty() {
            return self.push_into_empty(x0, x1, w0, w1, cand_span, id);
        }

        let size = self.size_f();
        let mut left = 0.0f32;
        let mut right = size;
        let mut x = x0;
        let mut remaining = cand_span;
        let mut pushed = false;
        let mut cursor = self.root;

        let mut stack: SmallVec<[Frame; 32]> = SmallVec::new();

        while remaining > 0.0 {
            'descend: while let Some(p_idx) = cursor {
                if stack.len() == self.max_depth {
                    tracing::warn!(max_depth = self.max_depth, "s-buffer: maximum depth reached");
                    return PushOutcome::DepthExhausted;
                }
                stack.push(Frame {
                    span: p_idx,
                    left,
                    right,
                });

                let p = *self.node(p_idx);
                let p_size = p.x1 - p.x0;
                let w = lerp_w(w0, w1, x - x0, cand_span);
                let si = span_intersect(x, w, x1, w1, p.x0, p.w0, p.x1, p.w1, size, self.z_near);
                let intersecting = si.kind == CrossKind::Intersecting;

                if x < p.x0 {
                    if x1 > p.x0 {
                        if intersecting {
                            let isect = si.x.expect("intersecting yields an x");
                            if si.leftness > 0.0 {
                                if x1 < p.x1 {
                                    // L1
                                    bisect_parent(self, p_idx, x0, x1, w0, w1, isect, x1, id);
                                } else {
                                    // L2
                                    let n = self.node_mut(p_idx);
                                    n.w1 = lerp_w(n.w0, n.w1, isect - n.x0, p_size);
                                    n.x1 = isect;
                                }
                            } else {
                                // L3
                                let n = self.node_mut(p_idx);
                                n.w0 = lerp_w(n.w0, n.w1, isect - n.x0, p_size);
                                n.x0 = isect;
                            }
                            if x1 < p.x1 && si.leftness > 0.0 {
                                pushed = true;
                            }
                        } else {
                            let w_at_p_x0 = lerp_w(w0, w1, p.x0 - x0, cand_span);
                            let p_behind = depth_fixed(p.w0) < depth_fixed(w_at_p_x0);
                            let tied_but_in_front =
                                depth_fixed(p.w0) == depth_fixed(w_at_p_x0) && si.leftness > 0.0;
                            if p_behind || tied_but_in_front {
                                if x1 < p.x1 {
                                    // L4
                                    let n = self.node_mut(p_idx);
                                    n.w0 = lerp_w(n.w0, n.w1, x1 - n.x0, p_size);
                                    n.x0 = x1;
                                } else {
                                    // L5
                                    let n = self.node_mut(p_idx);
                                    n.w0 = w_at_p_x0;
                                    n.w1 = lerp_w(w0, w1, n.x1 - x0, cand_span);
                                    n.id = id;
                                    pushed = true;
                                }
                            }
                        }
                    }
                    // Re-read from the live node: a bisect above may just
                    // have rewired p_idx's bounds and children out from
                    // under the `p` snapshot taken at loop entry.
                    right = self.node(p_idx).x0;
                    cursor = self.node(p_idx).prev;
                } else {
                    if x < p.x1 {
                        if intersecting {
                            let isect = si.x.expect("intersecting yields an x");
                            if si.leftness > 0.0 {
                                if x1 < p.x1 {
                                    // R1
                                    bisect_parent(self, p_idx, x0, x1, w0, w1, isect, x1, id);
                                } else {
                                    // R2
                                    let n = self.node_mut(p_idx);
                                    n.w1 = lerp_w(n.w0, n.w1, isect - n.x0, p_size);
                                    n.x1 = isect;
                                }
                                if x1 < p.x1 {
                                    pushed = true;
                                }
                            } else if x > p.x0 {
                                // R3
                                bisect_parent(self, p_idx, x0, x1, w0, w1, x, isect, id);
                                pushed = true;
                            } else {
                                // R4: x == p.x0, redirect left.
                                let n = self.node_mut(p_idx);
                                n.w0 = lerp_w(n.w0, n.w1, isect - n.x0, p_size);
                                n.x0 = isect;
                                right = n.x0;
                                cursor = p.prev;
                                continue 'descend;
                            }
                        } else {
                            let p_w_at_x = lerp_w(p.w0, p.w1, x - p.x0, p_size);
                            let p_behind = depth_fixed(p_w_at_x) < depth_fixed(w);
                            let tied_but_in_front =
                                depth_fixed(p_w_at_x) == depth_fixed(w) && si.leftness > 0.0;
                            if p_behind || tied_but_in_front {
                                if x > p.x0 {
                                    if x1 < p.x1 {
                                        // R5
                                        bisect_parent(self, p_idx, x0, x1, w0, w1, x, x1, id);
                                        pushed = true;
                                    } else {
                                        // R6
                                        let n = self.node_mut(p_idx);
                                        n.w1 = lerp_w(n.w0, n.w1, x - n.x0, p_size);
                                        n.x1 = x;
                                    }
                                } else if x1 < p.x1 {
                                    // R7: x == p.x0, redirect left.
                                    let n = self.node_mut(p_idx);
                                    n.w0 = lerp_w(n.w0, n.w1, x1 - n.x0, p_size);
                                    n.x0 = x1;
                                    right = n.x0;
                                    cursor = p.prev;
                                    continue 'descend;
                                } else {
                                    // R8
                                    let n = self.node_mut(p_idx);
                                    n.w0 = w;
                                    n.w1 = lerp_w(w0, w1, n.x1 - x0, cand_span);
                                    n.id = id;
                                    pushed = true;
                                }
                            }
                        }
                    }
                    // Same as above: re-read live, a bisect above may have
                    // rewired p_idx's bounds and children.
                    left = self.node(p_idx).x1;
                    cursor = self.node(p_idx).next;
                }
            }

            // Fell off the tree: try to attach whatever remains of this
            // round's sub-segment within the inherited [left, right) window.
            let clip_left = (left - x).max(0.0);
            let clip_right = (x + remaining - right).max(0.0);
            let clipped = remaining - clip_left - clip_right;
            let mut attached = None;
            if clipped > 0.0 {
                let nx0 = x + clip_left;
                let nx1 = nx0 + clipped;
                let nw0 = lerp_w(w0, w1, nx0 - x0, cand_span);
                let nw1 = lerp_w(w0, w1, nx1 - x0, cand_span);
                let new_idx = self.alloc(SpanNode::leaf(nx0, nx1, nw0, nw1, id));
                let last = stack.last().copied().expect("tree is non-empty");
                if x < self.node(last.span).x0 {
                    self.node_mut(last.span).prev = Some(new_idx);
                } else {
                    self.node_mut(last.span).next = Some(new_idx);
                }
                pushed = true;
                attached = Some(new_idx);
            }

            let depth = stack.len();
            let mut tmp_x = x;
            let mut insertion_bookmark: Option<usize> = None;
            let mut imbalance_bookmark: Option<usize> = None;

            for stack_depth in (0..depth).rev() {
                if insertion_bookmark.is_some() && imbalance_bookmark.is_some() {
                    break;
                }
                let parent_span = stack[stack_depth].span;
                if insertion_bookmark.is_none() && tmp_x < self.node(parent_span).x0 {
                    insertion_bookmark = Some(stack_depth);
                }
                tmp_x = self.node(parent_span).x0;

                if imbalance_bookmark.is_none() {
                    let bf = self.bf_of(parent_span);
                    if !(-1..=1).contains(&bf) {
                        imbalance_bookmark = Some(stack_depth);
                    } else if attached.is_some() {
                        let grown = self.node(parent_span).height.max((depth - stack_depth) as i32);
                        self.node_mut(parent_span).height = grown;
                    }
                }
            }

            let clip_right_leftover = clip_right;

            if let Some(ib) = insertion_bookmark {
                let frame = stack[ib];
                let target = frame.span;
                left = frame.left;
                right = frame.right;
                x = self.node(target).x0;
                remaining = clip_right_leftover;
                cursor = Some(target);
            } else {
                cursor = None;
                remaining = 0.0;
            }

            if let Some(bal) = imbalance_bookmark {
                let imbalance_parent = if bal > 0 {
                    Some(stack[bal - 1].span)
                } else {
                    None
                };
                let old_parent = stack[bal].span;
                let new_root = self.rebalance_subtree(old_parent);

                match imbalance_parent {
                    Some(ip) => {
                        if self.node(new_root).x0 < self.node(ip).x0 {
                            self.node_mut(ip).prev = Some(new_root);
                        } else {
                            self.node_mut(ip).next = Some(new_root);
                        }
                    }
                    None => self.root = Some(new_root),
                }

                let repair = match insertion_bookmark {
                    Some(ib) => bal <= ib,
                    None => false,
                };

                if repair {
                    let ib = insertion_bookmark.expect("repair implies insertion bookmark");
                    let target = stack[ib].span;

                    let mut new_left = 0.0f32;
                    let mut new_right = size;
                    if bal > 0 {
                        let parent_scope = stack[bal - 1];
                        new_left = parent_scope.left;
                        new_right = parent_scope.right;
                        if self.node(new_root).x0 < self.node(parent_scope.span).x0 {
                            new_right = self.node(parent_scope.span).x0;
                        } else {
                            new_left = self.node(parent_scope.span).x1;
                        }
                    }

                    let mut i = bal;
                    let mut walk = Some(new_root);
                    loop {
                        let s = match walk {
                            Some(s) => s,
                            None => break,
                        };
                        if i < stack.len() {
                            stack[i] = Frame {
                                span: s,
                                left: new_left,
                                right: new_right,
                            };
                        } else {
                            stack.push(Frame {
                                span: s,
                                left: new_left,
                                right: new_right,
                            });
                        }
                        if s == target {
                            break;
                        }
                        if x < self.node(s).x0 {
                            new_right = self.node(s).x0;
                            walk = self.node(s).prev;
                        } else {
                            new_left = self.node(s).x1;
                            walk = self.node(s).next;
                        }
                        i += 1;
                    }

                    left = new_left;
                    right = new_right;
                    stack.truncate(i);
                } else if let Some(ib) = insertion_bookmark {
                    stack.truncate(ib);
                }
            } else if let Some(ib) = insertion_bookmark {
                stack.truncate(ib);
            }
        }

        if pushed {
            PushOutcome::Inserted
        } else {
            PushOutcome::Occluded
        }
    }

    fn push_into_empty(
        &mut self,
        x0: f32,
        x1: f32,
        w0: f32,
        w1: f32,
        cand_span: f32,
        id: u8,
    ) -> PushOutcome {
        let clip_left = (-x0).max(0.0);
        let clip_right = (x1 - self.size_f()).max(0.0);
        let clipped = cand_span - clip_left - clip_right;
        if clipped <= 0.0 {
            return PushOutcome::Occluded;
        }
        let nx0 = x0 + clip_left;
        let nx1 = nx0 + clipped;
        let nw0 = lerp_w(w0, w1, nx0 - x0, cand_span);
        let nw1 = lerp_w(w0, w1, nx1 - x0, cand_span);
        let idx = self.alloc(SpanNode::leaf(nx0, nx1, nw0, nw1, id));
        self.root = Some(idx);
        PushOutcome::Inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;

    #[test]
    fn single_push_into_empty_buffer() {
        let mut buf = Buffer::new(8, 4.0, 8).unwrap();
        assert_eq!(buf.push(0.0, 8.0, 1.0, 1.0, b'X'), PushOutcome::Inserted);

        let root = buf.root.unwrap();
        let n = buf.node(root);
        assert_eq!((n.x0, n.x1, n.id, n.height), (0.0, 8.0, b'X', 0));
    }

    #[test]
    fn nearer_span_overwrites_half_of_farther_one() {
        let mut buf = Buffer::new(8, 4.0, 8).unwrap();
        assert_eq!(buf.push(0.0, 4.0, 1.0, 1.0, b'A'), PushOutcome::Inserted);
        assert_eq!(buf.push(2.0, 6.0, 2.0, 2.0, b'B'), PushOutcome::Inserted);

        let mut spans = Vec::new();
        buf.iterate(|s| spans.push((s.x0, s.x1, s.id)));
        assert_eq!(spans, vec![(0.0, 2.0, b'A'), (2.0, 6.0, b'B')]);
    }

    #[test]
    fn nearer_span_in_the_middle_bisects_the_farther_one() {
        let mut buf = Buffer::new(8, 4.0, 8).unwrap();
        assert_eq!(buf.push(0.0, 4.0, 1.0, 1.0, b'A'), PushOutcome::Inserted);
        assert_eq!(buf.push(1.0, 3.0, 2.0, 2.0, b'B'), PushOutcome::Inserted);

        let mut spans = Vec::new();
        buf.iterate(|s| spans.push((s.x0, s.x1, s.id)));
        assert_eq!(
            spans,
            vec![(0.0, 1.0, b'A'), (1.0, 3.0, b'B'), (3.0, 4.0, b'A')]
        );
    }

    #[test]
    fn farther_span_fully_inside_a_nearer_one_is_occluded() {
        let mut buf = Buffer::new(8, 4.0, 8).unwrap();
        assert_eq!(buf.push(0.0, 6.0, 2.0, 2.0, b'A'), PushOutcome::Inserted);
        assert_eq!(buf.push(1.0, 4.0, 1.0, 1.0, b'B'), PushOutcome::Occluded);

        let mut spans = Vec::new();
        buf.iterate(|s| spans.push((s.x0, s.x1, s.id)));
        assert_eq!(spans, vec![(0.0, 6.0, b'A')]);
    }

    #[test]
    fn disjoint_chain_of_equal_depth_spans_stays_balanced() {
        let mut buf = Buffer::new(8, 4.0, 16).unwrap();
        for i in 0..7 {
            let id = b'A' + i as u8;
            assert_eq!(
                buf.push(i as f32, (i + 1) as f32, 1.0, 1.0, id),
                PushOutcome::Inserted
            );
        }

        let root = buf.root.expect("buffer is non-empty");
        assert!(buf.node(root).height <= 3, "tree should stay balanced");

        let mut spans = Vec::new();
        buf.iterate(|s| spans.push((s.x0, s.x1)));
        assert_eq!(
            spans,
            vec![
                (0.0, 1.0),
                (1.0, 2.0),
                (2.0, 3.0),
                (3.0, 4.0),
                (4.0, 5.0),
                (5.0, 6.0),
                (6.0, 7.0),
            ]
        );
    }

    /// Ported from the original project's own smoke test: nine overlapping,
    /// equal-depth pushes onto a width-6 buffer, exercising overwrite and
    /// bisection paths back to back through repeated rebalancing.
    #[test]
    fn original_nine_push_scenario_fully_covers_width() {
        let mut buf = Buffer::new(6, 4.0, 16).unwrap();
        let pushes: [(f32, f32, u8); 9] = [
            (5.0, 6.0, b'A'),
            (1.0, 2.0, b'B'),
            (3.0, 4.0, b'C'),
            (3.0, 6.0, b'D'),
            (3.0, 7.0, b'E'),
            (0.0, 7.0, b'F'),
            (3.0, 4.0, b'G'),
            (0.0, 3.0, b'H'),
            (0.0, 5.0, b'I'),
        ];
        for (x0, x1, id) in pushes {
            let x1 = x1.min(6.0);
            buf.push(x0, x1, 1.0, 1.0, id);
        }

        let mut spans = Vec::new();
        buf.iterate(|s| spans.push((s.x0, s.x1)));

        assert!(!spans.is_empty());
        assert_eq!(spans.first().unwrap().0, 0.0);
        assert_eq!(spans.last().unwrap().1, 6.0);
        for w in spans.windows(2) {
            assert_eq!(w[0].1, w[1].0, "no gaps or overlaps between consecutive spans");
        }

        let root = buf.root.expect("buffer is non-empty");
        assert!(buf.node(root).height <= 3, "tree should stay balanced");
    }

    #[test]
    fn depth_exhaustion_is_reported_and_does_not_panic() {
        let mut buf = Buffer::new(16, 4.0, 1).unwrap();
        assert_eq!(buf.push(0.0, 4.0, 1.0, 1.0, b'A'), PushOutcome::Inserted);
        // One hop (past the root) is all a depth-1 buffer can afford.
        assert_eq!(
            buf.push(8.0, 12.0, 1.0, 1.0, b'B'),
            PushOutcome::Inserted
        );
        // A third span must walk past both existing nodes to fall off the
        // tree, which the depth-1 buffer cannot afford.
        assert_eq!(
            buf.push(13.0, 14.0, 1.0, 1.0, b'C'),
            PushOutcome::DepthExhausted
        );
    }
}
