//! Constructors for common edge-sequence shapes.
//!
//! Every constructor is a pure function of its inputs. Darts and fitted
//! curves are solved in the chord frame of their base edge and mapped back
//! to world coordinates afterwards, so the same parameters always give the
//! same relative shape wherever the base edge sits.

use tracing::{debug, warn};

use crate::algorithms::minimize::{golden_section, levenberg_marquardt, nelder_mead};
use crate::edge::EdgeSequence;
use crate::error::{PatternError, Result};
use crate::geometry::bezier::CubicBezier;
use crate::geometry::math::{abs_to_rel, circle_intersections, local_to_world, vector_angle};
use crate::geometry::tolerance::{points_coincide, EPS_CHAIN, EPS_FRACTION, EPS_LEN, FIT_RESIDUAL};
use crate::model::{Edge, Vec2};

/// Straight edges between consecutive vertices, closed back to the first
/// vertex when `closed` is set.
pub fn from_verts(verts: &[Vec2], closed: bool) -> Result<EdgeSequence> {
    if verts.len() < 2 {
        return Err(PatternError::constraint(
            "from_verts",
            format!("need at least 2 vertices, got {}", verts.len()),
        ));
    }
    let mut seq = EdgeSequence::new();
    for (i, w) in verts.windows(2).enumerate() {
        if points_coincide(w[0], w[1], EPS_CHAIN) {
            return Err(PatternError::constraint(
                "from_verts",
                format!("vertices {} and {} coincide", i, i + 1),
            ));
        }
        seq.push(Edge::line(w[0], w[1]));
    }
    if closed {
        seq.close_loop();
    }
    seq.is_chained(EPS_CHAIN)?;
    Ok(seq)
}

/// Every fraction in (0, 1] and the total equal to 1 within `eps`.
pub fn check_fractions(fracs: &[f64], eps: f64) -> Result<()> {
    let sum: f64 = fracs.iter().sum();
    let in_range = fracs.iter().all(|&f| f.is_finite() && f > 0.0 && f <= 1.0);
    if fracs.is_empty() || !in_range || (sum - 1.0).abs() > eps {
        return Err(PatternError::FractionError { sum });
    }
    Ok(())
}

/// Subdivide the straight segment `start -> end` into pieces whose lengths
/// are `fracs[i] * |end - start|`.
pub fn from_fractions(start: Vec2, end: Vec2, fracs: &[f64]) -> Result<EdgeSequence> {
    from_fractions_within(start, end, fracs, EPS_FRACTION)
}

/// [`from_fractions`] with the fraction total allowed to miss 1 by `eps`.
/// The last vertex is always `end`.
pub fn from_fractions_within(start: Vec2, end: Vec2, fracs: &[f64], eps: f64) -> Result<EdgeSequence> {
    check_fractions(fracs, eps)?;
    let chord = end - start;
    // Vertices from absolute prefix sums; the last one is exactly `end`
    let mut verts = Vec::with_capacity(fracs.len() + 1);
    verts.push(start);
    let mut acc = 0.0;
    for f in &fracs[..fracs.len() - 1] {
        acc += f;
        verts.push(start + chord * acc);
    }
    verts.push(end);
    from_verts(&verts, false)
}

/// Side with extra vertices at `start_cut` and `end_cut` fractions from
/// each end, so only the middle part can be stitched.
pub fn side_with_cut(start: Vec2, end: Vec2, start_cut: f64, end_cut: f64) -> Result<EdgeSequence> {
    let valid = |c: f64| (0.0..1.0).contains(&c);
    if !valid(start_cut) || !valid(end_cut) || start_cut + end_cut >= 1.0 {
        return Err(PatternError::constraint(
            "side_with_cut",
            format!("cuts {} and {} must be in [0, 1) with sum below 1", start_cut, end_cut),
        ));
    }
    let chord = end - start;
    let mut verts = vec![start];
    if start_cut > 0.0 {
        verts.push(start + chord * start_cut);
    }
    if end_cut > 0.0 {
        verts.push(end - chord * end_cut);
    }
    verts.push(end);
    from_verts(&verts, false)
}

/// Symmetric triangular dart opening along +x from the origin, apex below.
pub fn dart_shape(width: f64, depth: f64) -> Result<EdgeSequence> {
    if !(width > 0.0) {
        return Err(PatternError::constraint("dart_shape", format!("width {} must be positive", width)));
    }
    let half = width / 2.0;
    if !(depth >= half) {
        return Err(PatternError::constraint(
            "dart_shape",
            format!("depth {} is less than half the opening width {}", depth, width),
        ));
    }
    let depth_perp = (depth * depth - half * half).sqrt();
    from_verts(
        &[Vec2::ZERO, Vec2::new(half, -depth_perp), Vec2::new(width, 0.0)],
        false,
    )
}

/// A side with a dart inserted: `[outer0, leg0, leg1, outer1]`.
#[derive(Clone, Debug)]
pub struct DartedSide {
    pub side: EdgeSequence,
}

impl DartedSide {
    /// Index range of the dart legs inside [`DartedSide::side`].
    pub const LEGS: std::ops::Range<usize> = 1..3;

    pub fn dart_legs(&self) -> &[Edge] {
        &self.side.edges()[Self::LEGS]
    }

    /// The two non-dart edges. Not chained to each other.
    pub fn outer_edges(&self) -> EdgeSequence {
        EdgeSequence::from_edges(vec![self.side[0].clone(), self.side[3].clone()])
    }

    pub fn into_side(self) -> EdgeSequence {
        self.side
    }
}

/// Which end of the base edge absorbs the length change of a dart by width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DartModify {
    Start,
    End,
    #[default]
    Both,
}

#[derive(Clone, Copy, Debug)]
pub struct DartByWidth {
    /// Opening of the dart.
    pub width: f64,
    /// Leg length from the opening to the tip.
    pub depth: f64,
    /// Distance of the opening from the start vertex.
    pub position: f64,
    /// Angle in degrees between the outer edges once the dart is closed.
    pub opening_angle: f64,
    /// Dart on the right of the edge direction.
    pub right: bool,
    pub modify: DartModify,
}

impl Default for DartByWidth {
    fn default() -> Self {
        DartByWidth {
            width: 5.0,
            depth: 10.0,
            position: 50.0,
            opening_angle: 180.0,
            right: true,
            modify: DartModify::Both,
        }
    }
}

/// Insert a dart of fixed opening into `start -> end`. The outer edges keep
/// lengths `position` and `|end - start| - position`, so one or both end
/// vertices move (see [`DartModify`]).
pub fn side_with_dart_by_width(start: Vec2, end: Vec2, p: &DartByWidth) -> Result<DartedSide> {
    let l = start.distance(end);
    let (d0, d1) = (p.position, l - p.position);
    if !(p.width > 0.0) || !(p.depth > p.width / 2.0) {
        return Err(PatternError::constraint(
            "side_with_dart_by_width",
            format!("depth {} must exceed half the width {}", p.depth, p.width),
        ));
    }
    if !(d0 > 0.0) || !(d1 > 0.0) {
        return Err(PatternError::constraint(
            "side_with_dart_by_width",
            format!("dart position {} out of edge length {}", d0, l),
        ));
    }

    let depth_perp = (p.depth * p.depth - (p.width / 2.0).powi(2)).sqrt();
    // Extended triangle (start, imaginary apex, new end)
    let delta_l = p.depth * p.width / (2.0 * depth_perp);
    let (side0, side1) = (d0 + delta_l, d1 + delta_l);
    let alpha = (p.width / 2.0 / depth_perp).atan();
    let top_angle = std::f64::consts::PI - 2.0 * alpha;
    let long_side = (side0 * side0 + side1 * side1 - 2.0 * side0 * side1 * top_angle.cos()).sqrt();
    let sin0 = side1 * top_angle.sin() / long_side;
    let sin1 = side0 * top_angle.sin() / long_side;
    let (angle0, angle1) = (sin0.asin(), sin1.asin());

    let p1 = local_to_world(start, end, Vec2::new(d0 * angle0.cos(), d0 * sin0));
    let p2 = local_to_world(start, end, Vec2::new(long_side - d1 * angle1.cos(), d1 * sin1));
    let p_vec = p2 - p1;
    let p_perp = p_vec.normalized().map(Vec2::perp).ok_or_else(|| {
        PatternError::constraint("side_with_dart_by_width", "dart opening collapsed to a point")
    })?;
    let tip = p1 + p_vec * 0.5 - p_perp * depth_perp;
    let new_end = local_to_world(start, end, Vec2::new(long_side, 0.0));
    let shift = new_end - end;

    let mut seq = from_verts(&[start, p1, tip, p2, new_end], false)?;
    if !p.right {
        seq.reflect(start, new_end);
    }

    let mut angle_diff = (180.0 - p.opening_angle).to_radians();
    if !p.right {
        angle_diff = -angle_diff;
    }
    let chord = end - start;
    match p.modify {
        DartModify::Both => {
            seq.translate_by(-(shift * 0.5));
            seq[0].reverse().rotate(-angle_diff / 2.0).reverse();
            seq[3].rotate(angle_diff / 2.0);
        }
        DartModify::End => {
            let first_leg = seq[0].end;
            seq.rotate(vector_angle(first_leg - start, chord));
            seq[3].rotate(angle_diff);
        }
        DartModify::Start => {
            let (last_leg, far) = (seq[3].start, seq[3].end);
            seq.translate_by(-shift);
            seq.reverse();
            seq.rotate(vector_angle(last_leg - far, -chord));
            seq[3].rotate(-angle_diff);
            seq.reverse();
        }
    }
    debug!(
        width = p.width,
        depth = p.depth,
        shift = shift.norm(),
        "dart inserted by width"
    );
    Ok(DartedSide { side: seq })
}

#[derive(Clone, Copy, Debug)]
pub struct DartByLen {
    /// Length of the side once the dart is closed.
    pub target_len: f64,
    /// Leg length from the opening to the tip.
    pub depth: f64,
    /// Distance of the first dart point from the start vertex.
    pub position: f64,
    /// Angle in degrees between the first outer edge and the first leg.
    pub dart_angle: f64,
    pub right: bool,
}

impl Default for DartByLen {
    fn default() -> Self {
        DartByLen {
            target_len: 35.0,
            depth: 10.0,
            position: 25.0,
            dart_angle: 90.0,
            right: true,
        }
    }
}

/// Dart that shortens `start -> end` to `target_len` without moving either
/// end vertex. Solved by least squares; anything short of an exact fit is an
/// error.
pub fn side_with_dart_by_len(start: Vec2, end: Vec2, p: &DartByLen) -> Result<DartedSide> {
    side_with_dart_by_len_within(start, end, p, FIT_RESIDUAL)
}

/// [`side_with_dart_by_len`] accepting any fit whose squared residual is
/// below `fit_residual`.
pub fn side_with_dart_by_len_within(start: Vec2, end: Vec2, p: &DartByLen, fit_residual: f64) -> Result<DartedSide> {
    let l = start.distance(end);
    let (d0, d1, depth) = (p.position, p.target_len - p.position, p.depth);
    if !(d0 > 0.0) || !(d1 > 0.0) || !(depth > 0.0) {
        return Err(PatternError::constraint(
            "side_with_dart_by_len",
            format!("position {}, remaining length {} and depth {} must be positive", d0, d1, depth),
        ));
    }
    if d0 + d1 >= l {
        return Err(PatternError::constraint(
            "side_with_dart_by_len",
            format!("target length {} does not fit into edge of length {}", d0 + d1, l),
        ));
    }

    // Chord frame: start at the origin, end on +x
    let v0 = Vec2::ZERO;
    let v1 = Vec2::new(l, 0.0);
    let theta = p.dart_angle.to_radians();
    let guess = dart_guess(v0, v1, d0, d1, depth, theta);

    let residuals = |x: &[f64]| -> Vec<f64> {
        let p0 = Vec2::new(x[0], x[1]);
        let tip = Vec2::new(x[2], x[3]);
        let p1 = Vec2::new(x[4], x[5]);
        let base = v1 - v0;
        vec![
            p0.distance(v0) - d0,
            p1.distance(v1) - d1,
            p0.distance(tip) - depth,
            p1.distance(tip) - depth,
            (tip - p0).dot(v0 - p0) - theta.cos() * d0 * depth,
            (tip - p1).dot(v1 - p1) + theta.cos() * d1 * depth,
            // Zero whenever both dart points sit on the same side of the base
            (softsign(base.cross(p0 - v0)) * softsign(base.cross(p1 - v0))).min(0.0),
        ]
    };
    let fit = levenberg_marquardt(residuals, &guess, fit_residual);
    debug!(
        residual = fit.value,
        iterations = fit.iterations,
        "dart by length solved"
    );
    if !fit.converged || fit.value >= fit_residual {
        return Err(PatternError::ConvergenceFailure {
            solver: "side_with_dart_by_len",
            residual: fit.value,
            iterations: fit.iterations,
        });
    }

    let mut p0 = Vec2::new(fit.x[0], fit.x[1]);
    let mut tip = Vec2::new(fit.x[2], fit.x[3]);
    let mut p1 = Vec2::new(fit.x[4], fit.x[5]);
    if (v1 - v0).cross(p0 - v0) * (v1 - v0).cross(p1 - v0) < 0.0 {
        return Err(PatternError::constraint(
            "side_with_dart_by_len",
            "dart points fall on opposite sides of the base edge",
        ));
    }
    let is_right = (v1 - v0).cross(tip - v0) < 0.0;
    if is_right != p.right {
        for q in [&mut p0, &mut tip, &mut p1] {
            q.y = -q.y;
        }
    }

    let world = |q: Vec2| local_to_world(start, end, q);
    let seq = from_verts(&[start, world(p0), world(tip), world(p1), end], false)?;
    Ok(DartedSide { side: seq })
}

/// Exact solution for a right dart when the two tip circles meet, otherwise
/// both dart points at the proportional split of the chord.
fn dart_guess(v0: Vec2, v1: Vec2, d0: f64, d1: f64, depth: f64, theta: f64) -> Vec<f64> {
    let r0 = (d0 * d0 + depth * depth - 2.0 * d0 * depth * theta.cos()).max(0.0).sqrt();
    let r1 = (d1 * d1 + depth * depth + 2.0 * d1 * depth * theta.cos()).max(0.0).sqrt();
    let exact = circle_intersections(v0, r0, v1, r1).and_then(|(_, tip)| {
        let (p0, _) = circle_intersections(v0, d0, tip, depth)?;
        let (_, p1) = circle_intersections(v1, d1, tip, depth)?;
        Some([p0, tip, p1])
    });
    let [p0, tip, p1] = exact.unwrap_or_else(|| {
        let dir = (v1 - v0) * (1.0 / v0.distance(v1));
        let p = v0 + dir * (v0.distance(v1) * d0 / (d0 + d1));
        [p, p - dir.perp() * depth, p]
    });
    vec![p0.x, p0.y, tip.x, tip.y, p1.x, p1.y]
}

fn softsign(x: f64) -> f64 {
    x / (x.abs() + 1.0)
}

/// Quadratic edge whose end tangents follow the given directions. At least
/// one target is required; `initial_guess` is the chord-relative control
/// point to start from.
pub fn curve_from_tangents(
    start: Vec2,
    end: Vec2,
    target_tan0: Option<Vec2>,
    target_tan1: Option<Vec2>,
    initial_guess: Option<Vec2>,
) -> Result<Edge> {
    curve_from_tangents_within(start, end, target_tan0, target_tan1, initial_guess, FIT_RESIDUAL)
}

/// [`curve_from_tangents`] with an explicit bound on the squared tangent error.
pub fn curve_from_tangents_within(
    start: Vec2,
    end: Vec2,
    target_tan0: Option<Vec2>,
    target_tan1: Option<Vec2>,
    initial_guess: Option<Vec2>,
    fit_residual: f64,
) -> Result<Edge> {
    if target_tan0.is_none() && target_tan1.is_none() {
        return Err(PatternError::constraint("curve_from_tangents", "no target tangent given"));
    }
    if start.distance(end) <= EPS_LEN {
        return Err(PatternError::constraint("curve_from_tangents", "start and end coincide"));
    }
    let unit = |t: Option<Vec2>| -> Result<Option<Vec2>> {
        t.map(|v| {
            v.normalized()
                .ok_or_else(|| PatternError::constraint("curve_from_tangents", "zero target tangent"))
        })
        .transpose()
    };
    let (t0, t1) = (unit(target_tan0)?, unit(target_tan1)?);
    let guess = initial_guess.unwrap_or(Vec2::new(0.5, 0.0));

    let tangent_error = |cp: &[f64]| -> f64 {
        let e = Edge::quadratic(start, end, Vec2::new(cp[0], cp[1]));
        let mut err = 0.0;
        if let Some(t) = t0 {
            let d = e.unit_tangent_at(0.0) - t;
            err += d.dot(d);
        }
        if let Some(t) = t1 {
            let d = e.unit_tangent_at(1.0) - t;
            err += d.dot(d);
        }
        err
    };
    // Small pull towards the guess picks one point on the line of solutions
    // when only one end is constrained
    let regularized = |cp: &[f64]| -> f64 {
        let d = Vec2::new(cp[0], cp[1]) - guess;
        tangent_error(cp) + 1e-4 * d.dot(d)
    };
    let coarse = nelder_mead(&regularized, &[guess.x, guess.y], 0.1, 1e-18);
    let fine = nelder_mead(&tangent_error, &coarse.x, 0.01, 1e-24);
    let residual = tangent_error(&fine.x);
    debug!(residual, iterations = coarse.iterations + fine.iterations, "tangent fit");
    if residual >= fit_residual {
        return Err(PatternError::ConvergenceFailure {
            solver: "curve_from_tangents",
            residual,
            iterations: coarse.iterations + fine.iterations,
        });
    }
    Ok(Edge::quadratic(start, end, Vec2::new(fine.x[0], fine.x[1])))
}

/// Quadratic edge whose y-extremum in the chord frame lands as close as
/// possible to `target_extreme`.
pub fn curve_from_extreme(start: Vec2, end: Vec2, target_extreme: Vec2) -> Result<Edge> {
    if start.distance(end) <= EPS_LEN {
        return Err(PatternError::constraint("curve_from_extreme", "start and end coincide"));
    }
    let rel = abs_to_rel(start, end, target_extreme);
    if rel.y.abs() <= EPS_LEN {
        return Err(PatternError::constraint(
            "curve_from_extreme",
            "target lies on the chord, no curve has an interior extremum there",
        ));
    }

    let distance_to_target = |cp_y: f64| -> f64 {
        let curve = CubicBezier::from_quadratic(Vec2::ZERO, Vec2::new(rel.x, cp_y), Vec2::new(1.0, 0.0));
        curve
            .extrema_params(false, true)
            .into_iter()
            .map(|t| curve.eval(t).distance(rel))
            .fold(f64::INFINITY, f64::min)
    };
    let (lo, hi) = if rel.y > 0.0 { (rel.y * 1e-6, 4.0 * rel.y) } else { (4.0 * rel.y, rel.y * 1e-6) };
    let fit = golden_section(distance_to_target, lo, hi, 1e-12);
    if !fit.converged {
        return Err(PatternError::ConvergenceFailure {
            solver: "curve_from_extreme",
            residual: fit.value,
            iterations: fit.iterations,
        });
    }
    if fit.value > 1e-3 {
        warn!(
            distance = fit.value,
            "curve extremum cannot reach its target exactly"
        );
    }
    Ok(Edge::quadratic(start, end, Vec2::new(rel.x, fit.x[0])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::math::world_to_local;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn closed_square_from_verts() {
        let sq = from_verts(&[v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)], true).unwrap();
        assert_eq!(sq.len(), 4);
        assert!(sq.is_closed(EPS_CHAIN));
        assert!((sq.length() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_vertices_rejected() {
        assert!(from_verts(&[v(0.0, 0.0), v(0.0, 0.0), v(1.0, 0.0)], false).is_err());
        assert!(from_verts(&[v(0.0, 0.0)], false).is_err());
    }

    #[test]
    fn fractions_split_proportionally() {
        let seq = from_fractions(v(0.0, 0.0), v(10.0, 0.0), &[0.4, 0.6]).unwrap();
        let lens = seq.lengths();
        assert!((lens[0] - 4.0).abs() < 1e-12);
        assert!((lens[1] - 6.0).abs() < 1e-12);
        assert_eq!(seq.end(), Some(v(10.0, 0.0)));
    }

    #[test]
    fn bad_fractions_fail() {
        for fracs in [&[0.5, 0.4][..], &[1.2, -0.2][..], &[0.0, 1.0][..], &[][..]] {
            match from_fractions(v(0.0, 0.0), v(1.0, 0.0), fracs) {
                Err(PatternError::FractionError { .. }) => {}
                other => panic!("{:?} accepted: {:?}", fracs, other),
            }
        }
    }

    #[test]
    fn cut_side_vertices() {
        let seq = side_with_cut(v(0.0, 0.0), v(10.0, 0.0), 0.2, 0.3).unwrap();
        let lens = seq.lengths();
        assert_eq!(lens.len(), 3);
        assert!((lens[0] - 2.0).abs() < 1e-12);
        assert!((lens[1] - 5.0).abs() < 1e-12);
        assert!((lens[2] - 3.0).abs() < 1e-12);
        assert_eq!(side_with_cut(v(0.0, 0.0), v(1.0, 0.0), 0.0, 0.0).unwrap().len(), 1);
        assert!(side_with_cut(v(0.0, 0.0), v(1.0, 0.0), 0.6, 0.4).is_err());
    }

    #[test]
    fn dart_apex() {
        let d = dart_shape(6.0, 5.0).unwrap();
        assert_eq!(d.len(), 2);
        assert!(d[0].end.distance(v(3.0, -4.0)) < 1e-12);
        assert!(matches!(dart_shape(10.0, 3.0), Err(PatternError::ConstraintViolation { .. })));
        assert!(matches!(dart_shape(6.0, f64::NAN), Err(PatternError::ConstraintViolation { .. })));
    }

    #[test]
    fn dart_by_width_keeps_leg_and_side_lengths() {
        let p = DartByWidth { modify: DartModify::End, ..Default::default() };
        let darted = side_with_dart_by_width(v(0.0, 0.0), v(100.0, 0.0), &p).unwrap();
        let s = &darted.side;
        assert_eq!(s.len(), 4);
        assert!(s.is_chained(EPS_CHAIN).is_ok());
        assert_eq!(s.start(), Some(v(0.0, 0.0)));
        assert!((s[0].length() - 50.0).abs() < 1e-9);
        assert!((s[3].length() - 50.0).abs() < 1e-9);
        assert!((s[1].length() - 10.0).abs() < 1e-9);
        assert!((s[2].length() - 10.0).abs() < 1e-9);
        assert!((s[1].start.distance(s[2].end) - 5.0).abs() < 1e-9);
        // First outer edge now lies on the original direction
        assert!(s[0].end.y.abs() < 1e-9);
        let (p1, tip, p2) = (s[1].start, s[1].end, s[2].end);
        assert!((p2 - p1).cross(tip - p1) < 0.0);
    }

    #[test]
    fn left_dart_by_width_mirrors_right() {
        let right = side_with_dart_by_width(v(0.0, 0.0), v(100.0, 0.0), &DartByWidth::default()).unwrap();
        let left = side_with_dart_by_width(
            v(0.0, 0.0),
            v(100.0, 0.0),
            &DartByWidth { right: false, ..Default::default() },
        )
        .unwrap();
        for (a, b) in right.side.verts().iter().zip(left.side.verts()) {
            assert!((a.x - b.x).abs() < 1e-9 && (a.y + b.y).abs() < 1e-9);
        }
    }

    #[test]
    fn dart_by_width_rejects_shallow_dart() {
        let p = DartByWidth { width: 10.0, depth: 5.0, ..Default::default() };
        assert!(side_with_dart_by_width(v(0.0, 0.0), v(100.0, 0.0), &p).is_err());
        let p = DartByWidth { position: 120.0, ..Default::default() };
        assert!(side_with_dart_by_width(v(0.0, 0.0), v(100.0, 0.0), &p).is_err());
    }

    fn small_dart() -> DartByLen {
        DartByLen { target_len: 16.0, depth: 10.0, position: 8.0, dart_angle: 90.0, right: true }
    }

    #[test]
    fn dart_by_len_meets_constraints() {
        let darted = side_with_dart_by_len(v(0.0, 0.0), v(20.0, 0.0), &small_dart()).unwrap();
        let s = &darted.side;
        let (v0, p0, tip, p1, v1) = (s[0].start, s[1].start, s[1].end, s[2].end, s[3].end);
        assert_eq!(v1, v(20.0, 0.0));
        assert!((v0.distance(p0) - 8.0).abs() < 1e-4);
        assert!((v1.distance(p1) - 8.0).abs() < 1e-4);
        assert!((p0.distance(tip) - 10.0).abs() < 1e-4);
        assert!((p1.distance(tip) - 10.0).abs() < 1e-4);
        assert!((tip - p0).dot(v0 - p0).abs() < 1e-3);
        assert!((v1 - v0).cross(tip - v0) < 0.0);
        assert_eq!(darted.dart_legs().len(), 2);
    }

    #[test]
    fn dart_by_len_at_oblique_angles() {
        let (v0, v1) = (v(0.0, 0.0), v(20.0, 0.0));
        for angle in [45.0, 60.0, 120.0, 135.0] {
            for right in [true, false] {
                let p = DartByLen { dart_angle: angle, right, ..small_dart() };
                let darted = side_with_dart_by_len(v0, v1, &p)
                    .unwrap_or_else(|e| panic!("angle {angle} right {right}: {e}"));
                let s = &darted.side;
                let (p0, tip, p1) = (s[1].start, s[1].end, s[2].end);
                assert!((v0.distance(p0) - 8.0).abs() < 1e-4);
                assert!((v1.distance(p1) - 8.0).abs() < 1e-4);
                assert!((p0.distance(tip) - 10.0).abs() < 1e-4);
                assert!((p1.distance(tip) - 10.0).abs() < 1e-4);
                let base = v1 - v0;
                assert!(base.cross(p0 - v0) * base.cross(p1 - v0) >= 0.0, "angle {angle}");
                assert_eq!(base.cross(tip - v0) < 0.0, right, "angle {angle}");
                let cos = (tip - p0).dot(v0 - p0) / (8.0 * 10.0);
                assert!((cos - angle.to_radians().cos()).abs() < 1e-3, "angle {angle}: cos {cos}");
            }
        }
    }

    #[test]
    fn dart_by_len_respects_fit_residual() {
        let (v0, v1) = (v(0.0, 0.0), v(20.0, 0.0));
        let p = DartByLen { dart_angle: 60.0, ..small_dart() };
        assert!(side_with_dart_by_len_within(v0, v1, &p, 1e-6).is_ok());
        // No fit can have a negative squared residual
        assert!(matches!(
            side_with_dart_by_len_within(v0, v1, &p, 0.0),
            Err(PatternError::ConvergenceFailure { .. })
        ));
    }

    #[test]
    fn dart_by_len_shape_ignores_placement() {
        let a = side_with_dart_by_len(v(0.0, 0.0), v(20.0, 0.0), &small_dart()).unwrap();
        let (s, e) = (v(3.0, 4.0), v(3.0, 4.0) + v(20.0, 0.0).rotated(1.1));
        let b = side_with_dart_by_len(s, e, &small_dart()).unwrap();
        for (pa, pb) in a.side.verts().iter().zip(b.side.verts()) {
            assert!(pa.distance(world_to_local(s, e, pb)) < 1e-6);
        }
    }

    #[test]
    fn dart_by_len_errors() {
        let too_long = DartByLen { target_len: 25.0, ..small_dart() };
        assert!(matches!(
            side_with_dart_by_len(v(0.0, 0.0), v(20.0, 0.0), &too_long),
            Err(PatternError::ConstraintViolation { .. })
        ));
        // Legs cannot reach across a 50 unit base
        assert!(matches!(
            side_with_dart_by_len(v(0.0, 0.0), v(50.0, 0.0), &DartByLen::default()),
            Err(PatternError::ConvergenceFailure { .. })
        ));
    }

    #[test]
    fn tangent_fit_matches_both_ends() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let e = curve_from_tangents(v(0.0, 0.0), v(10.0, 0.0), Some(v(s, s)), Some(v(s, -s)), None).unwrap();
        assert!(e.unit_tangent_at(0.0).distance(v(s, s)) < 1e-4);
        assert!(e.unit_tangent_at(1.0).distance(v(s, -s)) < 1e-4);
        assert!(e.point_at(0.5).y > 0.0);
    }

    #[test]
    fn tangent_fit_single_end() {
        let e = curve_from_tangents(v(0.0, 0.0), v(0.0, 10.0), Some(v(0.0, 1.0)), None, Some(v(0.5, 0.2))).unwrap();
        assert!(e.unit_tangent_at(0.0).distance(v(0.0, 1.0)) < 1e-4);
        assert!(curve_from_tangents(v(0.0, 0.0), v(1.0, 0.0), None, None, None).is_err());
    }

    #[test]
    fn extreme_fit_hits_reachable_target() {
        let e = curve_from_extreme(v(0.0, 0.0), v(10.0, 0.0), v(5.0, 3.0)).unwrap();
        let ext = e.extreme_points(false, true);
        assert_eq!(ext.len(), 1);
        assert!(ext[0].distance(v(5.0, 3.0)) < 1e-6, "{:?}", ext);
        assert!(curve_from_extreme(v(0.0, 0.0), v(10.0, 0.0), v(4.0, 0.0)).is_err());
    }
}
