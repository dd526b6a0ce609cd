//! Seam matching and assembly.
//!
//! A [`StitchingRule`] joins two interfaces. Before it can emit stitches both
//! sides must have the same number of edges, so matching cuts edges until the
//! two partitions of the seam coincide. [`Stitches::finalize`] runs matching
//! for every rule first and only then lets any rule assemble.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::algorithms::refine::{plan_cuts, refined_count, EdgeCuts};
use crate::error::{PatternError, Result};
use crate::interface::Interface;
use crate::model::{EdgeId, GeometricId};
use crate::pattern::{EdgeSplit, Pattern};

/// One side of a stitch as handed to a serializer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchEnd {
    pub panel: String,
    pub edge: EdgeId,
    pub geometric_id: Option<GeometricId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchRecord {
    pub a: StitchEnd,
    pub b: StitchEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleState {
    Unmatched,
    Matched,
    Assembled,
}

#[derive(Clone, Debug)]
pub struct StitchingRule {
    side1: Interface,
    side2: Interface,
    state: RuleState,
    records: Vec<StitchRecord>,
}

impl StitchingRule {
    pub fn new(side1: Interface, side2: Interface) -> Self {
        StitchingRule {
            side1,
            side2,
            state: RuleState::Unmatched,
            records: Vec::new(),
        }
    }

    pub fn sides(&self) -> (&Interface, &Interface) {
        (&self.side1, &self.side2)
    }

    pub fn state(&self) -> RuleState {
        self.state
    }

    /// Both sides have the same number of edges.
    pub fn is_matching(&self) -> bool {
        self.side1.len() == self.side2.len()
    }

    /// Whether the declared pairing of corners (start with start, end with
    /// end) is at least as close in 3-D as the crossed pairing.
    pub fn is_traversal_matching(&self, pattern: &Pattern) -> Result<bool> {
        let (s1, e1) = self.side1.corners_3d(pattern)?;
        let (s2, e2) = self.side2.corners_3d(pattern)?;
        let declared = (s1 - s2).norm() + (e1 - e2).norm();
        let crossed = (s1 - e2).norm() + (e1 - s2).norm();
        Ok(!(crossed < declared))
    }

    /// Cut edges on both sides until they form the same partition of the
    /// seam. The whole plan is checked before any edge is touched, so on
    /// error neither side has changed. Returns the splits applied, which the
    /// caller must forward to every other holder of interfaces.
    pub fn match_edge_count(&mut self, pattern: &mut Pattern, tol: f64) -> Result<Vec<EdgeSplit>> {
        if self.state == RuleState::Assembled {
            return Err(PatternError::RuleFrozen);
        }
        // Equal counts pair edge by edge whatever their lengths
        if self.is_matching() {
            self.state = RuleState::Matched;
            return Ok(Vec::new());
        }
        let lens1 = self.side1.projecting_edges(pattern)?;
        let lens2 = self.side2.projecting_edges(pattern)?;
        let (total1, total2): (f64, f64) = (lens1.iter().sum(), lens2.iter().sum());
        if (total1 - total2).abs() > tol {
            return Err(PatternError::topology(format!(
                "seam sides have projected lengths {:.4} and {:.4} (tolerance {})",
                total1, total2, tol
            )));
        }

        let swap = !self.is_traversal_matching(pattern)?;
        let aligned = |lens: &[f64]| -> Vec<f64> {
            if swap {
                lens.iter().rev().copied().collect()
            } else {
                lens.to_vec()
            }
        };
        let plan1 = plan_cuts(&lens1, &aligned(&lens2), tol);
        let plan2 = plan_cuts(&lens2, &aligned(&lens1), tol);
        let (n1, n2) = (refined_count(lens1.len(), &plan1), refined_count(lens2.len(), &plan2));
        if n1 != n2 {
            return Err(PatternError::topology(format!(
                "common refinement gives {} and {} edges; vertices closer than {} cannot be told apart",
                n1, n2, tol
            )));
        }
        debug!(
            before = ?(lens1.len(), lens2.len()),
            after = n1,
            swap,
            "matching seam edge counts"
        );

        let mut splits = self.apply_plan(pattern, Side::First, &plan1)?;
        splits.extend(self.apply_plan(pattern, Side::Second, &plan2)?);
        self.state = RuleState::Matched;
        Ok(splits)
    }

    fn apply_plan(&mut self, pattern: &mut Pattern, side: Side, plan: &[EdgeCuts]) -> Result<Vec<EdgeSplit>> {
        // Resolve entries first; indices shift as soon as the first split lands
        let targets: Vec<_> = {
            let interface = match side {
                Side::First => &self.side1,
                Side::Second => &self.side2,
            };
            plan.iter()
                .map(|cuts| (interface.entries()[cuts.index].clone(), &cuts.fractions))
                .collect()
        };
        let mut splits = Vec::with_capacity(targets.len());
        for (entry, fractions) in targets {
            // Fractions follow traversal; a flipped entry runs against its edge
            let fracs: Vec<f64> = if entry.flipped {
                fractions.iter().rev().copied().collect()
            } else {
                fractions.clone()
            };
            let split = pattern.split_edge(entry.panel, entry.edge, &fracs)?;
            trace!(panel = %split.panel, old = %split.old, "seam edge split");
            self.side1.apply_split(&split);
            self.side2.apply_split(&split);
            splits.push(split);
        }
        Ok(splits)
    }

    /// Rewrite this rule's interfaces after a split made elsewhere. A rule
    /// whose edge count changes has to be matched again.
    pub fn apply_split(&mut self, split: &EdgeSplit) -> Result<bool> {
        let touched = self.side1.contains(split.panel, split.old) || self.side2.contains(split.panel, split.old);
        if !touched {
            return Ok(false);
        }
        if self.state == RuleState::Assembled {
            return Err(PatternError::RuleFrozen);
        }
        self.side1.apply_split(split);
        self.side2.apply_split(split);
        self.state = RuleState::Unmatched;
        Ok(true)
    }

    /// Pair the edges of both sides, reversing the second side when the
    /// traversal directions disagree. Freezes the rule.
    pub fn assembly(&mut self, pattern: &Pattern) -> Result<Vec<StitchRecord>> {
        if self.state == RuleState::Assembled {
            return Ok(self.records.clone());
        }
        if !self.is_matching() {
            return Err(PatternError::topology(format!(
                "cannot assemble {} edges against {}",
                self.side1.len(),
                self.side2.len()
            )));
        }
        let swap = !self.is_traversal_matching(pattern)?;
        let n = self.side1.len();
        let mut records = Vec::with_capacity(n);
        for (i, a) in self.side1.iter().enumerate() {
            let j = if swap { n - 1 - i } else { i };
            let b = &self.side2.entries()[j];
            records.push(StitchRecord {
                a: pattern.stitch_end(a.panel, a.edge)?,
                b: pattern.stitch_end(b.panel, b.edge)?,
            });
        }
        self.records = records.clone();
        self.state = RuleState::Assembled;
        Ok(records)
    }
}

#[derive(Clone, Copy)]
enum Side {
    First,
    Second,
}

/// Passes over all rules before giving up on settling the seams.
const MAX_FINALIZE_PASSES: usize = 16;

/// Stitching rules of a garment in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Stitches {
    rules: Vec<StitchingRule>,
}

impl Stitches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: StitchingRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn add(&mut self, side1: Interface, side2: Interface) -> &mut Self {
        self.push(StitchingRule::new(side1, side2))
    }

    pub fn extend(&mut self, other: Stitches) -> &mut Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[StitchingRule] {
        &self.rules
    }

    /// Match every rule. Splits made for one rule are forwarded to all the
    /// others, which are matched again if their counts changed.
    pub fn finalize(&mut self, pattern: &mut Pattern) -> Result<()> {
        let tol = pattern.tolerances().seam_match;
        for pass in 0..MAX_FINALIZE_PASSES {
            let mut settled = true;
            for i in 0..self.rules.len() {
                if self.rules[i].state() != RuleState::Unmatched {
                    continue;
                }
                settled = false;
                let splits = self.rules[i].match_edge_count(pattern, tol)?;
                for split in &splits {
                    for (k, rule) in self.rules.iter_mut().enumerate() {
                        if k != i {
                            rule.apply_split(split)?;
                        }
                    }
                }
            }
            if settled {
                debug!(passes = pass, rules = self.rules.len(), "stitches finalized");
                return Ok(());
            }
        }
        if self.rules.iter().all(|r| r.state() != RuleState::Unmatched) {
            return Ok(());
        }
        Err(PatternError::topology(format!(
            "seam matching did not settle after {} passes",
            MAX_FINALIZE_PASSES
        )))
    }

    /// Finalize, then concatenate each rule's stitches in declaration order.
    pub fn assembly(&mut self, pattern: &mut Pattern) -> Result<Vec<StitchRecord>> {
        self.finalize(pattern)?;
        let mut out = Vec::new();
        for rule in &mut self.rules {
            out.extend(rule.assembly(pattern)?);
        }
        Ok(out)
    }
}
