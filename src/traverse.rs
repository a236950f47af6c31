//! Read-only ways to get spans back out of a [`Buffer`]: an ascending-`x0`
//! callback walk, a tree-shaped debug dump, and an ASCII render of which id
//! is visible at each column.

use std::io::{self, Write};

use smallvec::SmallVec;

use crate::buffer::Buffer;
use crate::span::SpanIdx;

/// A read-only snapshot of one span, handed to [`Buffer::iterate`]'s
/// callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpanView {
    pub x0: f32,
    pub x1: f32,
    pub w0: f32,
    pub w1: f32,
    pub id: u8,
}

impl Buffer {
    /// Visit every live span in ascending `x0` order.
    pub fn iterate<F: FnMut(&SpanView)>(&self, mut f: F) {
        let mut stack: SmallVec<[SpanIdx; 32]> = SmallVec::new();
        let mut cursor = self.root;
        while cursor.is_some() || !stack.is_empty() {
            while let Some(idx) = cursor {
                stack.push(idx);
                cursor = self.node(idx).prev;
            }
            let idx = stack.pop().expect("loop condition guarantees a frame");
            let n = self.node(idx);
            f(&SpanView {
                x0: n.x0,
                x1: n.x1,
                w0: n.w0,
                w1: n.w1,
                id: n.id,
            });
            cursor = self.node(idx).next;
        }
    }

    /// Dump the tree structure to `w`, one line per span, indented by
    /// depth. Format: `[id] [x0, x1)`.
    pub fn dump<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let Some(root) = self.root else {
            return writeln!(w, "[dump] empty buffer");
        };

        let mut stack: SmallVec<[(SpanIdx, u32); 32]> = SmallVec::new();
        stack.push((root, 0));
        while let Some((idx, depth)) = stack.pop() {
            let n = self.node(idx);
            let indent = (depth * 4) as usize;
            writeln!(
                w,
                "{:indent$}[{}] [{:.3}, {:.3})",
                "",
                n.id as char,
                n.x0,
                n.x1,
                indent = indent
            )?;
            if let Some(next) = n.next {
                stack.push((next, depth + 1));
            }
            if let Some(prev) = n.prev {
                stack.push((prev, depth + 1));
            }
        }
        Ok(())
    }

    /// Render the buffer as a `size`-wide ASCII strip, one character per
    /// column: the id of whichever span covers it, or `_` if none does.
    pub fn print<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut row = vec![b'_'; self.size as usize];

        if let Some(root) = self.root {
            let mut stack: SmallVec<[SpanIdx; 32]> = SmallVec::new();
            stack.push(root);
            while let Some(idx) = stack.pop() {
                let n = self.node(idx);
                let x0 = (n.x0 - 0.5).ceil() as i32;
                let x1 = (n.x1 - 0.5).ceil() as i32;
                for x in x0..x1 {
                    if x >= 0 && (x as usize) < row.len() {
                        row[x as usize] = n.id;
                    }
                }
                if let Some(next) = n.next {
                    stack.push(next);
                }
                if let Some(prev) = n.prev {
                    stack.push(prev);
                }
            }
        }

        w.write_all(&row)?;
        writeln!(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::PushOutcome;

    #[test]
    fn iterate_visits_in_ascending_order() {
        let mut buf = Buffer::new(10, 4.0, 16).unwrap();
        assert_eq!(buf.push(0.0, 3.0, 1.0, 1.0, b'A'), PushOutcome::Inserted);
        assert_eq!(buf.push(3.0, 6.0, 1.0, 1.0, b'B'), PushOutcome::Inserted);
        assert_eq!(buf.push(6.0, 10.0, 1.0, 1.0, b'C'), PushOutcome::Inserted);

        let mut seen = Vec::new();
        buf.iterate(|s| seen.push((s.id, s.x0, s.x1)));
        assert_eq!(seen, vec![(b'A', 0.0, 3.0), (b'B', 3.0, 6.0), (b'C', 6.0, 10.0)]);
    }

    #[test]
    fn print_renders_ids_by_column() {
        let mut buf = Buffer::new(6, 4.0, 16).unwrap();
        buf.push(0.0, 3.0, 1.0, 1.0, b'A');
        buf.push(3.0, 6.0, 1.0, 1.0, b'B');

        let mut out = Vec::new();
        buf.print(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "AAABBB\n");
    }

    #[test]
    fn dump_reports_empty_buffer() {
        let buf = Buffer::new(4, 4.0, 16).unwrap();
        let mut out = Vec::new();
        buf.dump(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[dump] empty buffer\n");
    }
}
