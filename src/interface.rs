//! Interfaces: ordered references to boundary edges that take part in a seam.
//!
//! An interface never owns geometry. It lists `(panel, edge)` ids and reads
//! the edges through a [`Pattern`] whenever a length or position is needed,
//! so a split only has to rewrite id lists.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{PatternError, Result};
use crate::model::{Edge, EdgeId, PanelId};
use crate::pattern::{EdgeSplit, Pattern};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterfaceEdge {
    pub panel: PanelId,
    pub edge: EdgeId,
    /// Traversed from the edge's end to its start.
    pub flipped: bool,
    /// Gather ratio: physical length per unit of seam length.
    pub ruffle: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    edges: Vec<InterfaceEdge>,
}

impl Interface {
    pub fn new(panel: PanelId, edges: &[EdgeId]) -> Self {
        Interface {
            edges: edges
                .iter()
                .map(|&edge| InterfaceEdge { panel, edge, flipped: false, ruffle: 1.0 })
                .collect(),
        }
    }

    pub fn single(panel: PanelId, edge: EdgeId) -> Self {
        Self::new(panel, &[edge])
    }

    pub fn with_ruffle(mut self, ruffle: f64) -> Self {
        for e in &mut self.edges {
            e.ruffle = ruffle;
        }
        self
    }

    /// Concatenate interfaces in the given order.
    pub fn from_multiple<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Interface>,
    {
        Interface {
            edges: parts.into_iter().flat_map(|p| p.edges).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn entries(&self) -> &[InterfaceEdge] {
        &self.edges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InterfaceEdge> {
        self.edges.iter()
    }

    pub fn contains(&self, panel: PanelId, edge: EdgeId) -> bool {
        self.edges.iter().any(|e| e.panel == panel && e.edge == edge)
    }

    /// Flip traversal direction. Panel edges are left untouched.
    pub fn reverse(&mut self) -> &mut Self {
        self.edges.reverse();
        for e in &mut self.edges {
            e.flipped = !e.flipped;
        }
        self
    }

    pub fn reversed(&self) -> Self {
        let mut r = self.clone();
        r.reverse();
        r
    }

    /// Replace references to a split edge by its pieces in traversal order.
    /// Returns whether anything changed.
    pub(crate) fn apply_split(&mut self, split: &EdgeSplit) -> bool {
        let Some(pos) = self
            .edges
            .iter()
            .position(|e| e.panel == split.panel && e.edge == split.old)
        else {
            return false;
        };
        let old = self.edges[pos].clone();
        let mut pieces: Vec<InterfaceEdge> = split
            .new
            .iter()
            .map(|&edge| InterfaceEdge { edge, ..old.clone() })
            .collect();
        if old.flipped {
            pieces.reverse();
        }
        self.edges.splice(pos..=pos, pieces);
        // An edge may be listed more than once
        self.apply_split(split);
        true
    }

    /// Edges as traversed: flipped entries are returned reversed.
    pub fn oriented_edges(&self, pattern: &Pattern) -> Result<Vec<Edge>> {
        self.edges
            .iter()
            .map(|e| {
                let edge = pattern.edge(e.panel, e.edge)?;
                Ok(if e.flipped { edge.reversed() } else { edge.clone() })
            })
            .collect()
    }

    pub fn lengths(&self, pattern: &Pattern) -> Result<Vec<f64>> {
        self.edges
            .iter()
            .map(|e| Ok(pattern.edge(e.panel, e.edge)?.length()))
            .collect()
    }

    /// Length of each edge projected on the chord of its run, divided by the
    /// edge's ruffle.
    ///
    /// A run is a maximal stretch of consecutive entries on the same panel;
    /// its chord goes from the first traversed start to the last traversed
    /// end. Edges of a run whose chord is degenerate (a closed loop) fall
    /// back to their own length.
    pub fn projecting_edges(&self, pattern: &Pattern) -> Result<Vec<f64>> {
        let oriented = self.oriented_edges(pattern)?;
        let mut out = Vec::with_capacity(oriented.len());
        let mut run_start = 0;
        while run_start < self.edges.len() {
            let panel = self.edges[run_start].panel;
            let run_end = self.edges[run_start..]
                .iter()
                .position(|e| e.panel != panel)
                .map_or(self.edges.len(), |off| run_start + off);
            let run = &oriented[run_start..run_end];
            let chord = run[run.len() - 1].end - run[0].start;
            let dir = chord.normalized();
            for (edge, entry) in run.iter().zip(&self.edges[run_start..run_end]) {
                if !(entry.ruffle > 0.0) {
                    return Err(PatternError::constraint(
                        "Interface::projecting_edges",
                        format!("ruffle {} must be positive", entry.ruffle),
                    ));
                }
                let projected = match dir {
                    Some(d) => edge.projected_length(d),
                    None => edge.length(),
                };
                out.push(projected / entry.ruffle);
            }
            run_start = run_end;
        }
        Ok(out)
    }

    /// First traversed start and last traversed end in the shared 3-D frame.
    pub fn corners_3d(&self, pattern: &Pattern) -> Result<(Point3<f64>, Point3<f64>)> {
        let (Some(first), Some(last)) = (self.edges.first(), self.edges.last()) else {
            return Err(PatternError::topology("empty interface has no corners"));
        };
        let start = {
            let e = pattern.edge(first.panel, first.edge)?;
            let p = if first.flipped { e.end } else { e.start };
            pattern.panel(first.panel)?.placement.point_to_3d(p)
        };
        let end = {
            let e = pattern.edge(last.panel, last.edge)?;
            let p = if last.flipped { e.start } else { e.end };
            pattern.panel(last.panel)?.placement.point_to_3d(p)
        };
        Ok((start, end))
    }
}

impl<'a> IntoIterator for &'a Interface {
    type Item = &'a InterfaceEdge;
    type IntoIter = std::slice::Iter<'a, InterfaceEdge>;
    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}
