//! Edge behaviour and ordered edge chains.
//!
//! Curved edges keep their control points in the chord frame, so moving,
//! rotating or reversing an edge never needs to recompute its curvature.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::error::{PatternError, Result};
use crate::factory;
use crate::geometry::bezier::CubicBezier;
use crate::geometry::math::{abs_to_rel, reflect_point, rel_to_abs, rotate_about};
use crate::geometry::tolerance::{points_coincide, ARC_TOL, EPS_CHAIN, EPS_FRACTION, EPS_LEN};
use crate::model::{CurveControl, Edge, EdgeKind, GeometricId, Vec2};

#[inline]
fn flip_control(c: Vec2) -> Vec2 {
    Vec2 { x: 1.0 - c.x, y: -c.y }
}

impl Edge {
    pub fn line(start: impl Into<Vec2>, end: impl Into<Vec2>) -> Self {
        Edge {
            start: start.into(),
            end: end.into(),
            kind: EdgeKind::Line,
            geometric_id: None,
        }
    }

    /// Quadratic curve with its control point in chord-relative coordinates.
    pub fn quadratic(start: impl Into<Vec2>, end: impl Into<Vec2>, c: impl Into<Vec2>) -> Self {
        Edge {
            start: start.into(),
            end: end.into(),
            kind: EdgeKind::Curve {
                control: CurveControl::Quadratic { c: c.into() },
            },
            geometric_id: None,
        }
    }

    /// Cubic curve with both control points in chord-relative coordinates.
    pub fn cubic(
        start: impl Into<Vec2>,
        end: impl Into<Vec2>,
        c1: impl Into<Vec2>,
        c2: impl Into<Vec2>,
    ) -> Self {
        Edge {
            start: start.into(),
            end: end.into(),
            kind: EdgeKind::Curve {
                control: CurveControl::Cubic {
                    c1: c1.into(),
                    c2: c2.into(),
                },
            },
            geometric_id: None,
        }
    }

    pub(crate) fn with_geometric_id(mut self, id: Option<GeometricId>) -> Self {
        self.geometric_id = id;
        self
    }

    pub fn is_curve(&self) -> bool {
        matches!(self.kind, EdgeKind::Curve { .. })
    }

    /// World-space Bézier of a curved edge; `None` for straight edges.
    pub fn bezier(&self) -> Option<CubicBezier> {
        match self.kind {
            EdgeKind::Line => None,
            EdgeKind::Curve { control } => Some(match control {
                CurveControl::Quadratic { c } => {
                    CubicBezier::from_quadratic(self.start, rel_to_abs(self.start, self.end, c), self.end)
                }
                CurveControl::Cubic { c1, c2 } => CubicBezier::new(
                    self.start,
                    rel_to_abs(self.start, self.end, c1),
                    rel_to_abs(self.start, self.end, c2),
                    self.end,
                ),
            }),
        }
    }

    pub fn chord(&self) -> Vec2 {
        self.end - self.start
    }

    pub fn chord_length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Physical length: Euclidean for lines, adaptive arc length for curves.
    pub fn length(&self) -> f64 {
        match self.bezier() {
            None => self.chord_length(),
            Some(b) => b.arc_length(ARC_TOL),
        }
    }

    /// Length of this edge's chord projected on the unit direction `dir`.
    pub fn projected_length(&self, dir: Vec2) -> f64 {
        self.chord().dot(dir).abs()
    }

    pub fn point_at(&self, t: f64) -> Vec2 {
        match self.bezier() {
            None => self.start.lerp(self.end, t),
            Some(b) => b.eval(t),
        }
    }

    pub fn unit_tangent_at(&self, t: f64) -> Vec2 {
        match self.bezier() {
            None => self.chord().normalized().unwrap_or(Vec2::new(1.0, 0.0)),
            Some(b) => b.unit_tangent(t),
        }
    }

    /// Interior points where the curve reaches an x or y extremum. Endpoints
    /// are not included; straight edges have none.
    pub fn extreme_points(&self, on_x: bool, on_y: bool) -> Vec<Vec2> {
        match self.bezier() {
            None => Vec::new(),
            Some(b) => b.extrema_params(on_x, on_y).into_iter().map(|t| b.eval(t)).collect(),
        }
    }

    /// Swap the endpoints while keeping the physical curve.
    pub fn reverse(&mut self) -> &mut Self {
        std::mem::swap(&mut self.start, &mut self.end);
        if let EdgeKind::Curve { control } = &mut self.kind {
            *control = match *control {
                CurveControl::Quadratic { c } => CurveControl::Quadratic { c: flip_control(c) },
                CurveControl::Cubic { c1, c2 } => CurveControl::Cubic {
                    c1: flip_control(c2),
                    c2: flip_control(c1),
                },
            };
        }
        self
    }

    pub fn reversed(&self) -> Edge {
        let mut e = self.clone();
        e.reverse();
        e
    }

    pub fn translate_by(&mut self, shift: Vec2) -> &mut Self {
        self.start += shift;
        self.end += shift;
        self
    }

    /// Rotate counter-clockwise around the start vertex.
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        self.end = rotate_about(self.end, self.start, angle);
        self
    }

    pub fn rotate_about(&mut self, pivot: Vec2, angle: f64) -> &mut Self {
        self.start = rotate_about(self.start, pivot, angle);
        self.end = rotate_about(self.end, pivot, angle);
        self
    }

    /// Mirror across the line through `a` and `b`.
    pub fn reflect(&mut self, a: Vec2, b: Vec2) -> &mut Self {
        self.start = reflect_point(self.start, a, b);
        self.end = reflect_point(self.end, a, b);
        if let EdgeKind::Curve { control } = &mut self.kind {
            *control = match *control {
                CurveControl::Quadratic { c } => CurveControl::Quadratic { c: Vec2::new(c.x, -c.y) },
                CurveControl::Cubic { c1, c2 } => CurveControl::Cubic {
                    c1: Vec2::new(c1.x, -c1.y),
                    c2: Vec2::new(c2.x, -c2.y),
                },
            };
        }
        self
    }

    /// Subdivide into consecutive pieces whose chord-projected lengths follow
    /// `fracs`. Lines are split with [`factory::from_fractions`]; curves are
    /// split exactly, so the pieces trace the same physical curve. Every piece
    /// keeps this edge's geometric id.
    pub fn split(&self, fracs: &[f64]) -> Result<EdgeSequence> {
        self.split_within(fracs, EPS_FRACTION)
    }

    /// [`Edge::split`] with the fraction total allowed to miss 1 by `eps`.
    pub fn split_within(&self, fracs: &[f64], eps: f64) -> Result<EdgeSequence> {
        factory::check_fractions(fracs, eps)?;
        let Some(curve) = self.bezier() else {
            let mut seq = factory::from_fractions_within(self.start, self.end, fracs, eps)?;
            for e in seq.iter_mut() {
                e.geometric_id = self.geometric_id;
            }
            return Ok(seq);
        };

        let chord = self.chord();
        let chord_len2 = chord.dot(chord);
        if chord_len2 <= EPS_LEN {
            return Err(PatternError::constraint("Edge::split", "curve with coincident endpoints"));
        }
        let mut ts = Vec::with_capacity(fracs.len().saturating_sub(1));
        let mut acc = 0.0;
        for f in &fracs[..fracs.len() - 1] {
            acc += f;
            ts.push(param_at_chord_fraction(&curve, self.start, chord, chord_len2, acc));
        }
        let edges = curve
            .split_many(&ts)
            .into_iter()
            .map(|piece| {
                let c1 = abs_to_rel(piece.start, piece.end, piece.c1);
                let c2 = abs_to_rel(piece.start, piece.end, piece.c2);
                Edge::cubic(piece.start, piece.end, c1, c2).with_geometric_id(self.geometric_id)
            })
            .collect();
        Ok(EdgeSequence::from_edges(edges))
    }
}

/// Bisection for the parameter whose projection on the chord reaches `frac`.
fn param_at_chord_fraction(curve: &CubicBezier, start: Vec2, chord: Vec2, chord_len2: f64, frac: f64) -> f64 {
    let proj = |t: f64| (curve.eval(t) - start).dot(chord) / chord_len2;
    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        if proj(mid) < frac {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Ordered chain of edges where each edge starts where the previous ends.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSequence {
    edges: Vec<Edge>,
}

impl EdgeSequence {
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    pub fn from_edges(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    pub fn single(edge: Edge) -> Self {
        Self { edges: vec![edge] }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.edges.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Edge> {
        self.edges.iter_mut()
    }

    pub fn first(&self) -> Option<&Edge> {
        self.edges.first()
    }

    pub fn last(&self) -> Option<&Edge> {
        self.edges.last()
    }

    pub fn start(&self) -> Option<Vec2> {
        self.edges.first().map(|e| e.start)
    }

    pub fn end(&self) -> Option<Vec2> {
        self.edges.last().map(|e| e.end)
    }

    pub fn push(&mut self, edge: Edge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    pub fn append(&mut self, other: EdgeSequence) -> &mut Self {
        self.edges.extend(other.edges);
        self
    }

    pub fn insert(&mut self, index: usize, edge: Edge) -> &mut Self {
        self.edges.insert(index, edge);
        self
    }

    /// Check that consecutive edges share endpoints within `eps`. Never reorders.
    pub fn is_chained(&self, eps: f64) -> Result<()> {
        for (i, w) in self.edges.windows(2).enumerate() {
            if !points_coincide(w[0].end, w[1].start, eps) {
                return Err(PatternError::BrokenChain {
                    index: i,
                    gap: w[0].end.distance(w[1].start),
                });
            }
        }
        Ok(())
    }

    pub fn is_closed(&self, eps: f64) -> bool {
        match (self.start(), self.end()) {
            (Some(s), Some(e)) => self.edges.len() > 1 && points_coincide(s, e, eps),
            _ => false,
        }
    }

    /// Append a straight edge back to the first vertex unless already closed.
    pub fn close_loop(&mut self) -> &mut Self {
        if let (Some(s), Some(e)) = (self.start(), self.end()) {
            if !points_coincide(s, e, EPS_CHAIN) {
                self.edges.push(Edge::line(e, s));
            }
        }
        self
    }

    /// Flip traversal: reverse the order and every edge's direction.
    pub fn reverse(&mut self) -> &mut Self {
        self.edges.reverse();
        for e in &mut self.edges {
            e.reverse();
        }
        self
    }

    /// Replace the edge at `index` by `chain`, which must span the same
    /// endpoints. Pieces without a geometric id inherit the replaced edge's.
    pub fn substitute(&mut self, index: usize, chain: EdgeSequence) -> Result<()> {
        let old = self.edges.get(index).ok_or_else(|| {
            PatternError::constraint("EdgeSequence::substitute", format!("index {} out of range", index))
        })?;
        check_same_span(old, &chain)?;
        let lineage = old.geometric_id;
        let pieces = chain.edges.into_iter().map(|mut e| {
            if e.geometric_id.is_none() {
                e.geometric_id = lineage;
            }
            e
        });
        self.edges.splice(index..=index, pieces);
        Ok(())
    }

    pub fn translate_by(&mut self, shift: Vec2) -> &mut Self {
        for e in &mut self.edges {
            e.translate_by(shift);
        }
        self
    }

    /// Rotate counter-clockwise around the first vertex.
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        if let Some(pivot) = self.start() {
            for e in &mut self.edges {
                e.rotate_about(pivot, angle);
            }
        }
        self
    }

    pub fn reflect(&mut self, a: Vec2, b: Vec2) -> &mut Self {
        for e in &mut self.edges {
            e.reflect(a, b);
        }
        self
    }

    pub fn verts(&self) -> Vec<Vec2> {
        let mut out: Vec<Vec2> = self.edges.iter().map(|e| e.start).collect();
        if let Some(e) = self.end() {
            out.push(e);
        }
        out
    }

    pub fn lengths(&self) -> Vec<f64> {
        self.edges.iter().map(Edge::length).collect()
    }

    pub fn length(&self) -> f64 {
        self.edges.iter().map(Edge::length).sum()
    }
}

pub(crate) fn check_same_span(old: &Edge, chain: &EdgeSequence) -> Result<()> {
    let (Some(s), Some(e)) = (chain.start(), chain.end()) else {
        return Err(PatternError::constraint("substitute", "empty replacement chain"));
    };
    if !points_coincide(s, old.start, EPS_CHAIN) || !points_coincide(e, old.end, EPS_CHAIN) {
        return Err(PatternError::constraint(
            "substitute",
            format!(
                "replacement spans ({:.4}, {:.4})-({:.4}, {:.4}), edge spans ({:.4}, {:.4})-({:.4}, {:.4})",
                s.x, s.y, e.x, e.y, old.start.x, old.start.y, old.end.x, old.end.y
            ),
        ));
    }
    chain.is_chained(EPS_CHAIN)
}

impl Index<usize> for EdgeSequence {
    type Output = Edge;
    fn index(&self, i: usize) -> &Edge {
        &self.edges[i]
    }
}

impl IndexMut<usize> for EdgeSequence {
    fn index_mut(&mut self, i: usize) -> &mut Edge {
        &mut self.edges[i]
    }
}

impl<'a> IntoIterator for &'a EdgeSequence {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;
    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

impl From<Edge> for EdgeSequence {
    fn from(e: Edge) -> Self {
        EdgeSequence::single(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> Edge {
        Edge::quadratic([0.0, 0.0], [10.0, 0.0], [0.5, 0.4])
    }

    #[test]
    fn reversed_curve_traces_same_points() {
        let e = arch();
        let r = e.reversed();
        for i in 0..=8 {
            let t = i as f64 / 8.0;
            assert!(e.point_at(t).distance(r.point_at(1.0 - t)) < 1e-9);
        }
        assert!((e.length() - r.length()).abs() < 1e-6);
    }

    #[test]
    fn curvature_follows_translation_and_rotation() {
        let mut e = arch();
        let before = e.length();
        let sag = e.point_at(0.5).distance(e.start.lerp(e.end, 0.5));
        e.translate_by(Vec2::new(3.0, -7.0)).rotate(0.7);
        assert!((e.length() - before).abs() < 1e-6);
        let moved_sag = e.point_at(0.5).distance(e.start.lerp(e.end, 0.5));
        assert!((sag - moved_sag).abs() < 1e-9);
    }

    #[test]
    fn line_length_is_euclidean() {
        let e = Edge::line([0.0, 0.0], [3.0, 4.0]);
        assert!((e.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn split_curve_keeps_shape_and_lineage() {
        let e = arch().with_geometric_id(Some(GeometricId(7)));
        let parts = e.split(&[0.25, 0.75]).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.is_chained(EPS_CHAIN).is_ok());
        assert!((parts[0].end.x - 2.5).abs() < 1e-6);
        assert!((parts.length() - e.length()).abs() < 1e-4);
        assert!(parts.iter().all(|p| p.geometric_id == Some(GeometricId(7))));
    }

    #[test]
    fn broken_chain_is_reported_not_reordered() {
        let seq = EdgeSequence::from_edges(vec![
            Edge::line([0.0, 0.0], [1.0, 0.0]),
            Edge::line([2.0, 0.0], [3.0, 0.0]),
        ]);
        match seq.is_chained(EPS_CHAIN) {
            Err(PatternError::BrokenChain { index, gap }) => {
                assert_eq!(index, 0);
                assert!((gap - 1.0).abs() < 1e-12);
            }
            other => panic!("expected broken chain, got {:?}", other),
        }
        assert_eq!(seq[1].start, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn substitute_requires_same_span() {
        let mut seq = EdgeSequence::from_edges(vec![Edge::line([0.0, 0.0], [4.0, 0.0])]);
        let bad = EdgeSequence::single(Edge::line([0.0, 0.0], [3.0, 0.0]));
        assert!(seq.substitute(0, bad).is_err());
        let good = EdgeSequence::from_edges(vec![
            Edge::line([0.0, 0.0], [1.0, 0.0]),
            Edge::line([1.0, 0.0], [4.0, 0.0]),
        ]);
        seq.substitute(0, good).unwrap();
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn double_reverse_is_identity() {
        let mut seq = EdgeSequence::from_edges(vec![
            Edge::line([0.0, 0.0], [1.0, 0.0]),
            Edge::cubic([1.0, 0.0], [2.0, 1.0], [0.2, 0.1], [0.7, -0.3]),
        ]);
        let orig = seq.clone();
        seq.reverse();
        assert_eq!(seq[0].start, Vec2::new(2.0, 1.0));
        seq.reverse();
        for (a, b) in seq.iter().zip(orig.iter()) {
            for i in 0..=4 {
                let t = i as f64 / 4.0;
                assert!(a.point_at(t).distance(b.point_at(t)) < 1e-12);
            }
        }
    }
}
