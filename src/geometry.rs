//! Floating-point predicates used to resolve visibility between two
//! screen-space spans: near-equality, 2-D segment intersection in the
//! reconstructed view plane, and the "leftness" tie-break.

use glam::Vec2;

/// How two segments in the view plane relate to one another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossKind {
    Intersecting,
    Parallel,
    Degenerate,
    NotIntersecting,
}

const EPS: f32 = 1e-6;

/// Intersection of segment `a->b` with segment `c->d`, expressed in
/// parameters `t` (along `ab`) and `q` (along `cd`). Both must land
/// strictly inside `(EPS, 1-EPS)` for the segments to count as crossing.
pub fn intersect2d(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> (CrossKind, Option<Vec2>) {
    let u = b - a;
    let v = d - c;
    let c_a = c - a;

    let numer_t = c_a.perp_dot(v);
    let numer_q = c_a.perp_dot(u);
    let denom = u.perp_dot(v);

    if numer_t != 0.0 && denom == 0.0 {
        return (CrossKind::Parallel, None);
    }
    if numer_t == 0.0 && denom == 0.0 {
        return (CrossKind::Degenerate, None);
    }

    let t = numer_t / denom;
    let q = numer_q / denom;
    if t <= EPS || t >= 1.0 - EPS || q <= EPS || q >= 1.0 - EPS {
        return (CrossKind::NotIntersecting, None);
    }

    (CrossKind::Intersecting, Some(a + u * t))
}

/// Screen `x` and reciprocal depth `w` reconstructed into a view-plane
/// point `(x_view, z_view)`: `z_view = 1/w`, `x_view = (x - size/2) *
/// z_view / z_near`.
#[inline]
pub fn to_view_plane(x: f32, w: f32, size: f32, z_near: f32) -> Vec2 {
    let z = 1.0 / w;
    let x_view = (x - size * 0.5) * z / z_near;
    Vec2::new(x_view, z)
}

/// Outcome of testing candidate span `U = (u_x0, u_w0)..(u_x1, u_w1)`
/// against existing span `V = (v_x0, v_w0)..(v_x1, v_w1)`.
pub struct SpanIntersection {
    pub kind: CrossKind,
    /// Screen-space x of the crossing, when `kind == Intersecting`.
    pub x: Option<f32>,
    /// Positive: `U`'s origin is nearer than `V` at the shared abscissa.
    /// Non-positive: behind, or on the line.
    pub leftness: f32,
}

/// The single oracle the insertion engine uses to choose among its
/// visibility cases. Reconstructs the view-plane points for both spans,
/// runs [`intersect2d`], and independently derives `leftness`.
#[allow(clippy::too_many_arguments)]
pub fn span_intersect(
    u_x0: f32,
    u_w0: f32,
    u_x1: f32,
    u_w1: f32,
    v_x0: f32,
    v_w0: f32,
    v_x1: f32,
    v_w1: f32,
    size: f32,
    z_near: f32,
) -> SpanIntersection {
    let a = to_view_plane(u_x0, u_w0, size, z_near);
    let b = to_view_plane(u_x1, u_w1, size, z_near);
    let c = to_view_plane(v_x0, v_w0, size, z_near);
    let d = to_view_plane(v_x1, v_w1, size, z_near);

    let (kind, point) = intersect2d(a, b, c, d);

    match kind {
        CrossKind::Intersecting => {
            let p = point.expect("Intersecting always yields a point");
            let x = p.x * z_near / p.y + size * 0.5;
            let leftness = (a - p).perp_dot(c - p);
            SpanIntersection {
                kind,
                x: Some(x),
                leftness,
            }
        }
        CrossKind::NotIntersecting => {
            // Tie-break for spans that only touch at an endpoint or run
            // collinear without a proper crossing: lean on U's far
            // endpoint relative to V's direction.
            let leftness = (b - c).perp_dot(d - c);
            SpanIntersection {
                kind,
                x: None,
                leftness,
            }
        }
        CrossKind::Parallel | CrossKind::Degenerate => SpanIntersection {
            kind,
            x: None,
            leftness: 0.0,
        },
    }
}

/// Depth ties are broken after rounding to `1e-6` fixed precision, i.e.
/// comparing `(w * 1e6) as i64`. Changing this precision silently flips
/// which surface wins at co-planar intersections; see the Open Question
/// in SPEC_FULL.md.
#[inline]
pub fn depth_fixed(w: f32) -> i64 {
    (w * 1_000_000.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect() {
        let (kind, pt) = intersect2d(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0),
        );
        assert_eq!(kind, CrossKind::Intersecting);
        let pt = pt.unwrap();
        assert!((pt.x - 1.0).abs() < 1e-4);
        assert!((pt.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn parallel_segments_do_not_cross() {
        let (kind, _) = intersect2d(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 2.0),
        );
        assert_eq!(kind, CrossKind::Parallel);
    }

    #[test]
    fn collinear_segments_are_degenerate() {
        let (kind, _) = intersect2d(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(3.0, 3.0),
        );
        assert_eq!(kind, CrossKind::Degenerate);
    }

    #[test]
    fn depth_fixed_rounds_toward_zero() {
        assert_eq!(depth_fixed(0.123_456_7), 123_456);
    }
}
