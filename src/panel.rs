use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::edge::{check_same_span, EdgeSequence};
use crate::error::{PatternError, Result};
use crate::geometry::placement::Placement;
use crate::interface::Interface;
use crate::model::{Edge, EdgeId, GeometricId, PanelId, Vec2};

/// One flat pattern piece: a closed boundary stored in an edge arena, the
/// named interfaces it exposes and its placement in the 3-D scene.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Panel {
    pub name: String,
    id: PanelId,
    edges: Vec<Option<Edge>>, // id is index
    boundary: Vec<EdgeId>,
    interfaces: BTreeMap<String, Interface>,
    pub placement: Placement,
}

impl Panel {
    pub(crate) fn new(id: PanelId, name: String, boundary: EdgeSequence, chain_eps: f64) -> Result<Self> {
        if boundary.is_empty() {
            return Err(PatternError::constraint("Panel::new", format!("panel '{}' has no edges", name)));
        }
        boundary.is_chained(chain_eps)?;
        if !boundary.is_closed(chain_eps) {
            return Err(PatternError::constraint(
                "Panel::new",
                format!("boundary of panel '{}' is not a closed loop", name),
            ));
        }
        let mut panel = Panel {
            name,
            id,
            edges: Vec::with_capacity(boundary.len()),
            boundary: Vec::with_capacity(boundary.len()),
            interfaces: BTreeMap::new(),
            placement: Placement::default(),
        };
        for e in boundary.into_edges() {
            let id = panel.insert_edge(e);
            panel.boundary.push(id);
        }
        Ok(panel)
    }

    fn insert_edge(&mut self, mut edge: Edge) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        if edge.geometric_id.is_none() {
            edge.geometric_id = Some(GeometricId(id.0));
        }
        self.edges.push(Some(edge));
        id
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges
            .get(id.0 as usize)
            .and_then(|e| e.as_ref())
            .ok_or_else(|| PatternError::UnknownEdge { panel: self.name.clone(), edge: id })
    }

    /// Boundary edge ids in loop order.
    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.boundary
    }

    pub fn edge_count(&self) -> usize {
        self.boundary.len()
    }

    pub fn boundary(&self) -> EdgeSequence {
        EdgeSequence::from_edges(
            self.boundary
                .iter()
                .filter_map(|id| self.edges.get(id.0 as usize).and_then(|e| e.clone()))
                .collect(),
        )
    }

    pub fn interface(&self, name: &str) -> Result<&Interface> {
        self.interfaces.get(name).ok_or_else(|| PatternError::UnknownInterface {
            panel: self.name.clone(),
            name: name.to_string(),
        })
    }

    pub fn interfaces(&self) -> impl Iterator<Item = (&String, &Interface)> {
        self.interfaces.iter()
    }

    /// Expose `edges` of this panel, in the given order, as interface `name`.
    pub fn add_interface(&mut self, name: impl Into<String>, edges: &[EdgeId]) -> Result<()> {
        for &e in edges {
            self.edge(e)?;
        }
        self.interfaces.insert(name.into(), Interface::new(self.id, edges));
        Ok(())
    }

    pub fn set_interface(&mut self, name: impl Into<String>, interface: Interface) {
        self.interfaces.insert(name.into(), interface);
    }

    pub(crate) fn interfaces_mut(&mut self) -> impl Iterator<Item = &mut Interface> {
        self.interfaces.values_mut()
    }

    /// Swap the boundary edge `old` for `chain`, which must span the same
    /// endpoints. Returns the ids of the new edges in boundary order.
    pub(crate) fn replace_edge(&mut self, old: EdgeId, chain: EdgeSequence) -> Result<Vec<EdgeId>> {
        let edge = self.edge(old)?;
        check_same_span(edge, &chain)?;
        let lineage = edge.geometric_id;
        let pos = self.boundary.iter().position(|&id| id == old).ok_or_else(|| {
            PatternError::UnknownEdge { panel: self.name.clone(), edge: old }
        })?;
        let mut ids = Vec::with_capacity(chain.len());
        for mut e in chain.into_edges() {
            if e.geometric_id.is_none() {
                e.geometric_id = lineage;
            }
            ids.push(self.insert_edge(e));
        }
        self.edges[old.0 as usize] = None;
        self.boundary.splice(pos..=pos, ids.iter().copied());
        Ok(ids)
    }

    /// Single-edge interfaces for the two legs of a dart, ready to be
    /// stitched to each other.
    pub fn dart_stitch(&self, legs: [EdgeId; 2]) -> Result<(Interface, Interface)> {
        self.edge(legs[0])?;
        self.edge(legs[1])?;
        Ok((Interface::single(self.id, legs[0]), Interface::single(self.id, legs[1])))
    }

    /// Axis-aligned bounds of the boundary vertices in the panel frame.
    pub fn bbox(&self) -> (Vec2, Vec2) {
        let mut lo = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut hi = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in self.boundary().verts() {
            lo = Vec2::new(lo.x.min(v.x), lo.y.min(v.y));
            hi = Vec2::new(hi.x.max(v.x), hi.y.max(v.y));
        }
        (lo, hi)
    }

    pub fn point_to_3d(&self, p: Vec2) -> Point3<f64> {
        self.placement.point_to_3d(p)
    }

    pub fn set_pivot(&mut self, pivot: Vec2) -> &mut Self {
        self.placement.pivot = pivot;
        self
    }

    /// Pivot at the middle of the top of the bounding box.
    pub fn top_center_pivot(&mut self) -> &mut Self {
        let (lo, hi) = self.bbox();
        self.set_pivot(Vec2::new((lo.x + hi.x) / 2.0, hi.y))
    }

    /// Shift along world x so the panel is centered on the YZ plane.
    pub fn center_x(&mut self) -> &mut Self {
        let verts = self.boundary().verts();
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in verts {
            let x = self.placement.point_to_3d(v).x;
            lo = lo.min(x);
            hi = hi.max(x);
        }
        if lo.is_finite() && hi.is_finite() {
            self.placement.translation.x -= (lo + hi) / 2.0;
        }
        self
    }

    pub fn translate_to(&mut self, t: [f64; 3]) -> &mut Self {
        self.placement.translation = Vector3::from(t);
        self
    }

    pub fn translate_by(&mut self, t: [f64; 3]) -> &mut Self {
        self.placement.translation += Vector3::from(t);
        self
    }

    /// Compose a rotation given as XYZ Euler angles in degrees.
    pub fn rotate_by(&mut self, x: f64, y: f64, z: f64) -> &mut Self {
        self.placement.rotate_by_euler_deg(x, y, z);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::geometry::tolerance::EPS_CHAIN;

    fn rect() -> Panel {
        let seq = factory::from_verts(
            &[Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 2.0), Vec2::new(0.0, 2.0)],
            true,
        )
        .unwrap();
        Panel::new(PanelId(0), "rect".to_string(), seq, EPS_CHAIN).unwrap()
    }

    #[test]
    fn open_boundary_rejected() {
        let seq = factory::from_verts(&[Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 2.0)], false).unwrap();
        assert!(Panel::new(PanelId(0), "open".to_string(), seq, EPS_CHAIN).is_err());
    }

    #[test]
    fn edges_get_lineage_on_entry() {
        let p = rect();
        assert_eq!(p.edge_count(), 4);
        for &id in p.edge_ids() {
            assert_eq!(p.edge(id).unwrap().geometric_id, Some(GeometricId(id.0)));
        }
    }

    #[test]
    fn replaced_edge_is_retired() {
        let mut p = rect();
        let chain = p.edge(EdgeId(0)).unwrap().split(&[0.5, 0.5]).unwrap();
        let ids = p.replace_edge(EdgeId(0), chain).unwrap();
        assert_eq!(ids, vec![EdgeId(4), EdgeId(5)]);
        assert!(matches!(p.edge(EdgeId(0)), Err(PatternError::UnknownEdge { .. })));
        assert_eq!(&p.edge_ids()[..2], &ids[..]);
        assert!(p.boundary().is_closed(EPS_CHAIN));
        assert_eq!(p.edge(EdgeId(5)).unwrap().geometric_id, Some(GeometricId(0)));
    }

    #[test]
    fn top_center_pivot_lands_on_translation() {
        let mut p = rect();
        p.top_center_pivot().translate_to([1.0, 2.0, 3.0]);
        let top_mid = p.point_to_3d(Vec2::new(2.0, 2.0));
        assert!((top_mid - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
        p.center_x();
        assert!(p.point_to_3d(Vec2::new(2.0, 2.0)).x.abs() < 1e-12);
    }
}
