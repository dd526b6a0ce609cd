//! Error types for pattern construction.
//!
//! Every failure here is fatal for the configuration being built: nothing is
//! retried and no approximate shape is returned in place of a refused one.

use thiserror::Error;

use crate::model::{EdgeId, PanelId};

#[derive(Error, Debug)]
pub enum PatternError {
    /// Requested geometry cannot exist with the given parameters
    #[error("Constraint violated in {what}: {detail}")]
    ConstraintViolation {
        /// Constructor or operation that rejected its input.
        what: &'static str,
        /// Human readable description of the violated constraint.
        detail: String,
    },

    /// Length fractions are not a partition of the unit interval
    #[error("Invalid length fractions: sum {sum} (each fraction must be in (0, 1], total 1)")]
    FractionError {
        /// Sum of the supplied fractions.
        sum: f64,
    },

    /// Consecutive edges do not share an endpoint
    #[error("Edge chain broken after edge {index}: gap of {gap}")]
    BrokenChain {
        /// Index of the edge whose end does not meet the next start.
        index: usize,
        /// Distance between the two vertices.
        gap: f64,
    },

    /// Iterative fit stopped before reaching its tolerance
    #[error("{solver} did not converge after {iterations} iterations (best residual {residual:e})")]
    ConvergenceFailure {
        /// Name of the fit.
        solver: &'static str,
        /// Best residual reached.
        residual: f64,
        /// Iterations spent.
        iterations: usize,
    },

    /// Two interfaces cannot be stitched into one seam
    #[error("Topology mismatch: {detail}")]
    TopologyMismatch {
        /// What did not match.
        detail: String,
    },

    #[error("Unknown panel {0}")]
    UnknownPanel(PanelId),

    #[error("Unknown edge {edge} on panel '{panel}'")]
    UnknownEdge { panel: String, edge: EdgeId },

    #[error("Unknown interface '{name}' on panel '{panel}'")]
    UnknownInterface { panel: String, name: String },

    /// Stitching rule already produced its stitches
    #[error("Stitching rule is assembled and can no longer change")]
    RuleFrozen,

    #[error("Unknown component '{name}'")]
    UnknownComponent { name: String },

    #[error("Invalid configuration value for '{field}': {detail}")]
    InvalidConfig { field: String, detail: String },

    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PatternError {
    pub(crate) fn constraint(what: &'static str, detail: impl Into<String>) -> Self {
        PatternError::ConstraintViolation {
            what,
            detail: detail.into(),
        }
    }

    pub(crate) fn topology(detail: impl Into<String>) -> Self {
        PatternError::TopologyMismatch {
            detail: detail.into(),
        }
    }

    pub(crate) fn config(field: &str, detail: impl Into<String>) -> Self {
        PatternError::InvalidConfig {
            field: field.to_string(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PatternError>;
