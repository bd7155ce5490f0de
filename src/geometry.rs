//! Segment-segment intersection and border reflection.
//!
//! Ported from the source's cross-product parameterization rather than a
//! from-scratch geometry library, so the degenerate-case ordering and the
//! epsilon slack match exactly what the property tests below expect.

use glam::Vec2;

const EPS: f32 = 1e-8;
const INF: f32 = 1e9;

#[inline]
fn is_same_point(p1: Vec2, p2: Vec2) -> bool {
    (p1.x - p2.x).abs() < EPS && (p1.y - p2.y).abs() < EPS
}

#[inline]
fn point_on_line(p: Vec2, p1: Vec2, p2: Vec2) -> bool {
    ((p2.x - p1.x) * (p.y - p1.y) - (p2.y - p1.y) * (p.x - p1.x)).abs() < EPS
}

#[inline]
fn point_in_rect(p: Vec2, r1: Vec2, r2: Vec2) -> bool {
    let (xlo, xhi) = (r1.x.min(r2.x) - EPS, r1.x.max(r2.x) + EPS);
    let (ylo, yhi) = (r1.y.min(r2.y) - EPS, r1.y.max(r2.y) + EPS);
    p.x >= xlo && p.x <= xhi && p.y >= ylo && p.y <= yhi
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Resolves the (possibly degenerate) line/segment intersection point, or
/// `(INF, INF)` when no such point exists. Mirrors `_line_intersection`.
fn line_intersection(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Vec2 {
    let first_degenerate = is_same_point(p1, p2);
    let second_degenerate = is_same_point(p3, p4);

    if first_degenerate && second_degenerate {
        return if is_same_point(p1, p3) {
            p1
        } else {
            Vec2::new(INF, INF)
        };
    }
    if first_degenerate {
        return if point_on_line(p1, p3, p4) {
            p1
        } else {
            Vec2::new(INF, INF)
        };
    }
    if second_degenerate {
        return if point_on_line(p3, p1, p2) {
            p3
        } else {
            Vec2::new(INF, INF)
        };
    }

    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let cross_d1_d2 = cross(d1, d2);
    if cross_d1_d2.abs() > EPS {
        let cross_p13_d2 = cross(p3 - p1, d2);
        let t = cross_p13_d2 / cross_d1_d2;
        p1 + d1 * t
    } else {
        // Parallel: colinear iff p3 lies on the line through p1,p2.
        let cross_p13_d1 = cross(d1, p3 - p1);
        if cross_p13_d1.abs() < EPS {
            p3
        } else {
            Vec2::new(INF, INF)
        }
    }
}

/// `segments_intersect(a1,a2, b1,b2)`. Treats both pairs as closed segments,
/// inclusive of endpoints.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let inter = line_intersection(a1, a2, b1, b2);
    (inter.x != INF || inter.y != INF)
        && point_in_rect(inter, a1, a2)
        && point_in_rect(inter, b1, b2)
}

#[inline]
fn angle_between(a: Vec2, b: Vec2) -> f32 {
    let dot = a.dot(b);
    let (u, v) = (a.length(), b.length());
    if u == 0.0 || v == 0.0 {
        INF
    } else {
        (dot / (u * v)).clamp(-1.0, 1.0).acos()
    }
}

#[inline]
fn rotate(v: Vec2, alpha: f32) -> Vec2 {
    let (sin_a, cos_a) = alpha.sin_cos();
    Vec2::new(v.x * cos_a - v.y * sin_a, v.x * sin_a + v.y * cos_a)
}

/// `reflect(last_pos, new_pos, b1, b2, v)`. Mirrors `get_rotated_vector`.
pub fn reflect(last_pos: Vec2, new_pos: Vec2, border1: Vec2, border2: Vec2, v: Vec2) -> Vec2 {
    let line = border1 - border2;
    let mut perp = Vec2::new(-line.y, line.x);
    let s1_p = border1 - last_pos;
    if perp.dot(s1_p) < 0.0 {
        perp = -perp;
    }

    let p_vec = new_pos - last_pos;
    let mut angle = angle_between(p_vec, perp);
    if cross(p_vec, perp) < 0.0 {
        angle = -angle;
    }

    rotate(-v, angle * 2.0)
}
