//! Common refinement of two partitions of the same 1-D span.
//!
//! Given the edge lengths on both sides of a seam, work out where each side
//! has to be cut so that every vertex of one side has a partner on the other.
//! Nothing here touches geometry; the result is a plan that the caller can
//! check in full before mutating any panel.

/// Cuts planned for one edge, as length fractions summing to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCuts {
    pub index: usize,
    pub fractions: Vec<f64>,
}

/// Interior vertex positions of a partition, as absolute prefix sums.
fn interior_boundaries(lengths: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    let mut out = Vec::with_capacity(lengths.len().saturating_sub(1));
    for l in &lengths[..lengths.len().saturating_sub(1)] {
        acc += l;
        out.push(acc);
    }
    out
}

/// Plan the cuts `own` needs to contain every interior boundary of `other`.
///
/// `other` is rescaled to the total of `own` so both describe the same span.
/// A boundary closer than `tol` to an existing vertex of `own` is treated as
/// that vertex; since positions come from absolute prefix sums, the offset
/// this introduces is at most `tol` at every vertex and never accumulates.
pub fn plan_cuts(own: &[f64], other: &[f64], tol: f64) -> Vec<EdgeCuts> {
    let own_total: f64 = own.iter().sum();
    let other_total: f64 = other.iter().sum();
    if own.is_empty() || other.is_empty() || own_total <= 0.0 || other_total <= 0.0 {
        return Vec::new();
    }
    let scale = own_total / other_total;
    let targets: Vec<f64> = interior_boundaries(other).into_iter().map(|c| c * scale).collect();

    let mut plan = Vec::new();
    let mut a = 0.0;
    for (index, &len) in own.iter().enumerate() {
        let b = a + len;
        let inside: Vec<f64> = targets
            .iter()
            .copied()
            .filter(|&c| c > a + tol && c < b - tol)
            .collect();
        if !inside.is_empty() {
            let mut fractions = Vec::with_capacity(inside.len() + 1);
            let mut prev = a;
            for c in inside {
                fractions.push((c - prev) / len);
                prev = c;
            }
            fractions.push((b - prev) / len);
            plan.push(EdgeCuts { index, fractions });
        }
        a = b;
    }
    plan
}

/// Edge count after applying `plan` to a side of `edge_count` edges.
pub fn refined_count(edge_count: usize, plan: &[EdgeCuts]) -> usize {
    edge_count + plan.iter().map(|c| c.fractions.len() - 1).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_edge_against_two() {
        let plan = plan_cuts(&[10.0], &[4.0, 6.0], 0.1);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].index, 0);
        assert!((plan[0].fractions[0] - 0.4).abs() < 1e-12);
        assert!((plan[0].fractions[1] - 0.6).abs() < 1e-12);
        assert!(plan_cuts(&[4.0, 6.0], &[10.0], 0.1).is_empty());
    }

    #[test]
    fn interleaved_partitions() {
        let a = plan_cuts(&[3.0, 7.0], &[5.0, 5.0], 0.1);
        let b = plan_cuts(&[5.0, 5.0], &[3.0, 7.0], 0.1);
        assert_eq!(refined_count(2, &a), 3);
        assert_eq!(refined_count(2, &b), 3);
        assert_eq!(a[0].index, 1);
        assert!((a[0].fractions[0] - 2.0 / 7.0).abs() < 1e-12);
        assert_eq!(b[0].index, 0);
        assert!((b[0].fractions[0] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn near_vertices_are_shared() {
        let plan = plan_cuts(&[5.0, 5.0], &[5.05, 4.95], 0.1);
        assert!(plan.is_empty());
    }

    #[test]
    fn fractions_partition_each_edge() {
        let plan = plan_cuts(&[2.0, 5.0, 3.0], &[1.0, 1.0, 1.5, 2.5, 4.0], 0.01);
        for cuts in &plan {
            let sum: f64 = cuts.fractions.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
            assert!(cuts.fractions.iter().all(|&f| f > 0.0 && f <= 1.0));
        }
        assert_eq!(refined_count(3, &plan), 6);
    }
}
