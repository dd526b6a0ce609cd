//! The set of panels a garment is built from.
//!
//! Every boundary change goes through [`Pattern::substitute_edge`], which
//! rewrites the owning panel and every interface stored on any panel in one
//! step, then hands back an [`EdgeSplit`] so holders of other interfaces
//! (stitching rules, components) can apply the same rewrite to their id lists.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Tolerances;
use crate::edge::EdgeSequence;
use crate::error::{PatternError, Result};
use crate::interface::Interface;
use crate::model::{Edge, EdgeId, PanelId};
use crate::panel::Panel;
use crate::stitch::StitchEnd;

/// One boundary edge of `panel` replaced by a chain of new edges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSplit {
    pub panel: PanelId,
    pub old: EdgeId,
    /// Replacement ids in the direction of the old edge.
    pub new: Vec<EdgeId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Pattern {
    panels: Vec<Panel>, // id is index
    tolerances: Tolerances,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerances(tolerances: Tolerances) -> Self {
        Pattern { panels: Vec::new(), tolerances }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Add a panel with the closed loop `boundary`. Names are unique.
    pub fn add_panel(&mut self, name: impl Into<String>, boundary: EdgeSequence) -> Result<PanelId> {
        let name = name.into();
        if self.panels.iter().any(|p| p.name == name) {
            return Err(PatternError::constraint(
                "Pattern::add_panel",
                format!("panel '{}' already exists", name),
            ));
        }
        let id = PanelId(self.panels.len() as u32);
        self.panels.push(Panel::new(id, name, boundary, self.tolerances.chain)?);
        Ok(id)
    }

    pub fn panel(&self, id: PanelId) -> Result<&Panel> {
        self.panels.get(id.0 as usize).ok_or(PatternError::UnknownPanel(id))
    }

    pub fn panel_mut(&mut self, id: PanelId) -> Result<&mut Panel> {
        self.panels.get_mut(id.0 as usize).ok_or(PatternError::UnknownPanel(id))
    }

    pub fn panel_by_name(&self, name: &str) -> Option<PanelId> {
        self.panels.iter().find(|p| p.name == name).map(Panel::id)
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn edge(&self, panel: PanelId, edge: EdgeId) -> Result<&Edge> {
        self.panel(panel)?.edge(edge)
    }

    /// Copy of a named interface of a panel.
    pub fn interface(&self, panel: PanelId, name: &str) -> Result<Interface> {
        self.panel(panel)?.interface(name).cloned()
    }

    /// Replace a boundary edge by `chain` spanning the same endpoints and
    /// update every panel's interfaces to the new ids.
    pub fn substitute_edge(&mut self, panel: PanelId, edge: EdgeId, chain: EdgeSequence) -> Result<EdgeSplit> {
        let new = self.panel_mut(panel)?.replace_edge(edge, chain)?;
        let split = EdgeSplit { panel, old: edge, new };
        for p in &mut self.panels {
            for interface in p.interfaces_mut() {
                interface.apply_split(&split);
            }
        }
        debug!(
            panel = %panel,
            old = %split.old,
            pieces = split.new.len(),
            "edge replaced"
        );
        Ok(split)
    }

    /// Subdivide a boundary edge by length fractions (see [`Edge::split`]).
    pub fn split_edge(&mut self, panel: PanelId, edge: EdgeId, fracs: &[f64]) -> Result<EdgeSplit> {
        let eps = self.tolerances.fraction_sum;
        let chain = self.edge(panel, edge)?.split_within(fracs, eps)?;
        self.substitute_edge(panel, edge, chain)
    }

    pub fn stitch_end(&self, panel: PanelId, edge: EdgeId) -> Result<StitchEnd> {
        let p = self.panel(panel)?;
        let e = p.edge(edge)?;
        Ok(StitchEnd {
            panel: p.name.clone(),
            edge,
            geometric_id: e.geometric_id,
        })
    }
}
