//! World-space cubic curves behind curved panel edges.
//!
//! Edges store their control points relative to the chord; this module works
//! on absolute points. Quadratic edges are degree-elevated on the way in so
//! length, splitting and extrema only exist once.

use super::tolerance::{EPS_LEN, MAX_ARC_DEPTH};
use crate::model::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub start: Vec2,
    pub c1: Vec2,
    pub c2: Vec2,
    pub end: Vec2,
}

impl CubicBezier {
    pub fn new(start: Vec2, c1: Vec2, c2: Vec2, end: Vec2) -> Self {
        Self { start, c1, c2, end }
    }

    /// Exact cubic form of the quadratic through `start`, `c`, `end`.
    pub fn from_quadratic(start: Vec2, c: Vec2, end: Vec2) -> Self {
        Self::new(start, start.lerp(c, 2.0 / 3.0), end.lerp(c, 2.0 / 3.0), end)
    }

    fn hull(&self) -> [Vec2; 4] {
        [self.start, self.c1, self.c2, self.end]
    }

    /// Point at parameter `t`, taken from the de Casteljau ladder.
    pub fn eval(&self, t: f64) -> Vec2 {
        self.subdivide(t).0.end
    }

    /// First derivative, read off the hodograph (a quadratic in the control
    /// point differences).
    pub fn derivative(&self, t: f64) -> Vec2 {
        let [a, b, c, d] = self.hull();
        let (d0, d1, d2) = (b - a, c - b, d - c);
        let u = 1.0 - t;
        (d0 * (u * u) + d1 * (2.0 * u * t) + d2 * (t * t)) * 3.0
    }

    /// Unit tangent. Where the derivative vanishes (a control point sitting on
    /// its endpoint) the chord direction stands in.
    pub fn unit_tangent(&self, t: f64) -> Vec2 {
        self.derivative(t)
            .normalized()
            .or_else(|| (self.end - self.start).normalized())
            .unwrap_or(Vec2::new(1.0, 0.0))
    }

    /// The pieces over `[0, t]` and `[t, 1]`.
    pub fn subdivide(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let [a, b, c, d] = self.hull();
        let (ab, bc, cd) = (a.lerp(b, t), b.lerp(c, t), c.lerp(d, t));
        let (abc, bcd) = (ab.lerp(bc, t), bc.lerp(cd, t));
        let mid = abc.lerp(bcd, t);
        (CubicBezier::new(a, ab, abc, mid), CubicBezier::new(mid, bcd, cd, d))
    }

    /// Cut at increasing global parameters `ts`; yields `ts.len() + 1` pieces.
    pub fn split_many(&self, ts: &[f64]) -> Vec<CubicBezier> {
        let mut pieces = Vec::with_capacity(ts.len() + 1);
        let mut rest = *self;
        let mut done = 0.0;
        for &t in ts {
            let span = 1.0 - done;
            let local = if span > EPS_LEN { (t - done) / span } else { 1.0 };
            let (head, tail) = rest.subdivide(local.clamp(0.0, 1.0));
            pieces.push(head);
            rest = tail;
            done = t;
        }
        pieces.push(rest);
        pieces
    }

    /// Chord length and control polygon length.
    fn slack(&self) -> (f64, f64) {
        let chord = self.start.distance(self.end);
        let hull = self.start.distance(self.c1) + self.c1.distance(self.c2) + self.c2.distance(self.end);
        (chord, hull)
    }

    /// Arc length, halving until each piece's hull hugs its chord within `tol`.
    pub fn arc_length(&self, tol: f64) -> f64 {
        self.arc_length_at_depth(tol, 0)
    }

    fn arc_length_at_depth(&self, tol: f64, depth: u32) -> f64 {
        let (chord, hull) = self.slack();
        if depth >= MAX_ARC_DEPTH || hull - chord < tol {
            return 0.5 * (chord + hull);
        }
        let (left, right) = self.subdivide(0.5);
        left.arc_length_at_depth(tol, depth + 1) + right.arc_length_at_depth(tol, depth + 1)
    }

    /// Interior parameters where the x (`on_x`) or y (`on_y`) derivative is
    /// zero, ascending.
    pub fn extrema_params(&self, on_x: bool, on_y: bool) -> Vec<f64> {
        let [a, b, c, d] = self.hull();
        let mut roots = Vec::new();
        if on_x {
            hodograph_roots([a.x, b.x, c.x, d.x], &mut roots);
        }
        if on_y {
            hodograph_roots([a.y, b.y, c.y, d.y], &mut roots);
        }
        roots.sort_by(f64::total_cmp);
        roots
    }
}

/// Roots in (0, 1) of one coordinate of the hodograph.
fn hodograph_roots(q: [f64; 4], out: &mut Vec<f64>) {
    let (d0, d1, d2) = (q[1] - q[0], q[2] - q[1], q[3] - q[2]);
    // d0 (1-t)^2 + 2 d1 t (1-t) + d2 t^2 in power form
    let a = d0 - 2.0 * d1 + d2;
    let b = 2.0 * (d1 - d0);
    let c = d0;
    let candidates: Vec<f64> = if a.abs() <= 1e-12 {
        if b.abs() > 1e-12 { vec![-c / b] } else { Vec::new() }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            Vec::new()
        } else if disc == 0.0 {
            vec![-b / (2.0 * a)]
        } else {
            let s = disc.sqrt();
            vec![(-b + s) / (2.0 * a), (-b - s) / (2.0 * a)]
        }
    };
    out.extend(candidates.into_iter().filter(|t| *t > 0.0 && *t < 1.0));
}
