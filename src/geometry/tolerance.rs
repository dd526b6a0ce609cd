// Centralized tolerances and helpers for pattern geometry (lengths in cm)

pub const EPS_CHAIN: f64 = 1e-4;          // shared-endpoint threshold, relative to coordinate scale
pub const EPS_FRACTION: f64 = 1e-4;       // length fractions must sum to 1 within this
pub const SEAM_MATCH_TOL: f64 = 0.1;      // projected seam lengths compare within this
pub const FIT_RESIDUAL: f64 = 1e-8;       // squared residual accepted by constrained fits
pub const EPS_LEN: f64 = 1e-9;            // zero-length vector threshold
pub const EPS_DENOM: f64 = 1e-12;         // denominator guard
pub const ARC_TOL: f64 = 1e-5;            // adaptive arc-length flatness threshold

// Adaptive subdivision cap
pub const MAX_ARC_DEPTH: u32 = 18;

/// Endpoint coincidence scaled by the magnitude of the coordinates involved.
#[inline]
pub fn points_coincide(a: crate::model::Vec2, b: crate::model::Vec2, eps: f64) -> bool {
    let scale = 1.0 + a.norm().max(b.norm());
    a.distance(b) <= eps * scale
}
