// Chord-frame conversions shared by edges, darts and curve fits
use super::tolerance::{EPS_LEN, EPS_DENOM};
use crate::model::Vec2;

/// Point given as (fraction along chord, fraction of chord length to the left)
/// mapped into world coordinates.
pub fn rel_to_abs(start: Vec2, end: Vec2, rel: Vec2) -> Vec2 {
    let chord = end - start;
    start + chord * rel.x + chord.perp() * rel.y
}

/// Inverse of [`rel_to_abs`]. A degenerate chord maps everything to the origin.
pub fn abs_to_rel(start: Vec2, end: Vec2, point: Vec2) -> Vec2 {
    let chord = end - start;
    let len2 = chord.dot(chord);
    if len2 <= EPS_DENOM {
        return Vec2::ZERO;
    }
    let v = point - start;
    Vec2 {
        x: v.dot(chord) / len2,
        y: chord.cross(v) / len2,
    }
}

/// Point given in absolute units in the orthonormal frame of the chord
/// (x along `start -> end`, y to the left) mapped into world coordinates.
pub fn local_to_world(start: Vec2, end: Vec2, local: Vec2) -> Vec2 {
    let dir = (end - start).normalized().unwrap_or(Vec2::new(1.0, 0.0));
    start + dir * local.x + dir.perp() * local.y
}

pub fn world_to_local(start: Vec2, end: Vec2, point: Vec2) -> Vec2 {
    let dir = (end - start).normalized().unwrap_or(Vec2::new(1.0, 0.0));
    let v = point - start;
    Vec2 { x: v.dot(dir), y: dir.cross(v) }
}

/// Signed angle rotating `a` onto `b`, counter-clockwise positive.
pub fn vector_angle(a: Vec2, b: Vec2) -> f64 {
    let la = a.norm();
    let lb = b.norm();
    if la <= EPS_LEN || lb <= EPS_LEN {
        return 0.0;
    }
    let cos = (a.dot(b) / (la * lb)).clamp(-1.0, 1.0);
    let angle = cos.acos();
    if a.cross(b) < 0.0 { -angle } else { angle }
}

pub fn rotate_about(p: Vec2, pivot: Vec2, angle: f64) -> Vec2 {
    pivot + (p - pivot).rotated(angle)
}

/// Mirror `p` across the infinite line through `a` and `b`.
pub fn reflect_point(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let Some(dir) = (b - a).normalized() else {
        return p;
    };
    let v = p - a;
    let along = dir * v.dot(dir);
    a + along * 2.0 - v
}

/// Intersections of two circles, ordered by the sign of the offset from the
/// center line (left of `c0 -> c1` first). `None` if they do not meet.
pub fn circle_intersections(c0: Vec2, r0: f64, c1: Vec2, r1: f64) -> Option<(Vec2, Vec2)> {
    let d = c0.distance(c1);
    if d <= EPS_LEN || d > r0 + r1 || d < (r0 - r1).abs() {
        return None;
    }
    let a = (r0 * r0 - r1 * r1 + d * d) / (2.0 * d);
    let h = (r0 * r0 - a * a).max(0.0).sqrt();
    let dir = (c1 - c0) * (1.0 / d);
    let base = c0 + dir * a;
    Some((base + dir.perp() * h, base - dir.perp() * h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_abs_roundtrip_on_rotated_chord() {
        let s = Vec2::new(1.0, 2.0);
        let e = Vec2::new(4.0, 6.0);
        let p = rel_to_abs(s, e, Vec2::new(0.3, 0.2));
        let back = abs_to_rel(s, e, p);
        assert!((back.x - 0.3).abs() < 1e-12);
        assert!((back.y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn positive_offset_is_left_of_edge() {
        let p = rel_to_abs(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.5, 0.1));
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn signed_angle() {
        let a = vector_angle(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!((a - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        let b = vector_angle(Vec2::new(1.0, 0.0), Vec2::new(0.0, -1.0));
        assert!((b + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn reflect_across_diagonal() {
        let p = reflect_point(Vec2::new(1.0, 0.0), Vec2::ZERO, Vec2::new(1.0, 1.0));
        assert!((p.x - 0.0).abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn circles_meet_symmetrically() {
        let (l, r) = circle_intersections(Vec2::ZERO, 5.0, Vec2::new(8.0, 0.0), 5.0).unwrap();
        assert!((l.x - 4.0).abs() < 1e-12 && (l.y - 3.0).abs() < 1e-12);
        assert!((r.x - 4.0).abs() < 1e-12 && (r.y + 3.0).abs() < 1e-12);
        assert!(circle_intersections(Vec2::ZERO, 1.0, Vec2::new(8.0, 0.0), 1.0).is_none());
    }
}
