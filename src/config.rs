//! Typed configuration records.
//!
//! Each design option is a plain field with a documented range. A
//! [`DesignConfig`] is validated once, when it is loaded, and geometry code
//! reads the fields directly afterwards.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PatternError, Result};
use crate::geometry::tolerance::{EPS_CHAIN, EPS_FRACTION, FIT_RESIDUAL, SEAM_MATCH_TOL};
use crate::registry::ComponentKind;

/// Accept `value` when `ok`, warning when it sits exactly on a closed bound.
fn check(field: &str, value: f64, ok: bool, expected: &str, bounds: &[f64]) -> Result<()> {
    if !value.is_finite() || !ok {
        return Err(PatternError::config(field, format!("{} is outside {}", value, expected)));
    }
    if bounds.iter().any(|&b| value == b) {
        warn!(field, value, "configuration value on the edge of its range");
    }
    Ok(())
}

/// Numeric tolerances used while building and stitching panels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Largest accepted difference between the two sides of a seam.
    pub seam_match: f64,
    /// Largest accepted deviation of a fraction list from summing to 1.
    pub fraction_sum: f64,
    /// Largest gap between consecutive edges of a chain.
    pub chain: f64,
    /// Squared residual a constrained fit has to reach.
    pub fit_residual: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            seam_match: SEAM_MATCH_TOL,
            fraction_sum: EPS_FRACTION,
            chain: EPS_CHAIN,
            fit_residual: FIT_RESIDUAL,
        }
    }
}

impl Tolerances {
    pub fn validate(&self) -> Result<()> {
        for (field, v) in [
            ("tolerances.seam_match", self.seam_match),
            ("tolerances.fraction_sum", self.fraction_sum),
            ("tolerances.chain", self.chain),
            ("tolerances.fit_residual", self.fit_residual),
        ] {
            check(field, v, v > 0.0, "(0, inf)", &[])?;
        }
        Ok(())
    }
}

/// Body measurements in centimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyMeasurements {
    /// Waist circumference.
    pub waist: f64,
    /// Hip circumference.
    pub hips: f64,
    /// Height of the waist line above the floor.
    pub waist_level: f64,
    /// Vertical distance from the waist to the hip line.
    pub hips_line: f64,
    /// Vertical distance from the hip line to the floor.
    pub leg_length: f64,
}

impl Default for BodyMeasurements {
    fn default() -> Self {
        BodyMeasurements {
            waist: 70.0,
            hips: 100.0,
            waist_level: 105.0,
            hips_line: 20.0,
            leg_length: 85.0,
        }
    }
}

impl BodyMeasurements {
    pub fn validate(&self) -> Result<()> {
        for (field, v) in [
            ("body.waist", self.waist),
            ("body.hips", self.hips),
            ("body.waist_level", self.waist_level),
            ("body.hips_line", self.hips_line),
            ("body.leg_length", self.leg_length),
        ] {
            check(field, v, v > 0.0, "(0, inf)", &[])?;
        }
        if self.hips < self.waist {
            return Err(PatternError::config("body.hips", "hips must not be smaller than the waist"));
        }
        Ok(())
    }
}

/// Two-panel skirt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkirtDesign {
    /// Panel length in cm, [5, 200].
    pub length: f64,
    /// Gather ratio of the waist edge, [1, 3].
    pub ruffle: f64,
    /// Extra hem width on each side in cm, [0, 100].
    pub flare: f64,
    /// Unstitched part of the side seams, as a fraction of the length, [0, 0.9).
    pub bottom_cut: f64,
}

impl Default for SkirtDesign {
    fn default() -> Self {
        SkirtDesign { length: 50.0, ruffle: 1.3, flare: 10.0, bottom_cut: 0.0 }
    }
}

impl SkirtDesign {
    pub fn validate(&self) -> Result<()> {
        check("skirt.length", self.length, (5.0..=200.0).contains(&self.length), "[5, 200]", &[5.0, 200.0])?;
        check("skirt.ruffle", self.ruffle, (1.0..=3.0).contains(&self.ruffle), "[1, 3]", &[3.0])?;
        check("skirt.flare", self.flare, (0.0..=100.0).contains(&self.flare), "[0, 100]", &[100.0])?;
        check("skirt.bottom_cut", self.bottom_cut, (0.0..0.9).contains(&self.bottom_cut), "[0, 0.9)", &[])
    }
}

/// Skirt made of many thin flared panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlareSkirtDesign {
    /// Number of panels, [2, 40].
    pub n_panels: u32,
    /// Length below the hip line as a fraction of the leg length, [0.05, 1.5].
    pub length: f64,
    /// Fullness of the hem in full circles, (0, 1.95].
    pub suns: f64,
}

impl Default for FlareSkirtDesign {
    fn default() -> Self {
        FlareSkirtDesign { n_panels: 8, length: 0.5, suns: 0.75 }
    }
}

impl FlareSkirtDesign {
    pub fn validate(&self) -> Result<()> {
        let n = f64::from(self.n_panels);
        check("flare_skirt.n_panels", n, (2..=40).contains(&self.n_panels), "[2, 40]", &[40.0])?;
        check("flare_skirt.length", self.length, (0.05..=1.5).contains(&self.length), "[0.05, 1.5]", &[1.5])?;
        check("flare_skirt.suns", self.suns, self.suns > 0.0 && self.suns <= 1.95, "(0, 1.95]", &[1.95])
    }
}

/// Fitted skirt with a waist dart on each panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PencilSkirtDesign {
    /// Length below the hip line as a fraction of the leg length, [0.1, 1.5].
    pub length: f64,
    /// Dart leg length as a fraction of the hip line depth, (0, 1].
    pub dart_depth: f64,
    /// Angle in degrees between the waist edge and the dart legs, [45, 135].
    pub dart_angle: f64,
}

impl Default for PencilSkirtDesign {
    fn default() -> Self {
        PencilSkirtDesign { length: 0.5, dart_depth: 0.9, dart_angle: 90.0 }
    }
}

impl PencilSkirtDesign {
    pub fn validate(&self) -> Result<()> {
        check("pencil_skirt.length", self.length, (0.1..=1.5).contains(&self.length), "[0.1, 1.5]", &[1.5])?;
        check(
            "pencil_skirt.dart_depth",
            self.dart_depth,
            self.dart_depth > 0.0 && self.dart_depth <= 1.0,
            "(0, 1]",
            &[],
        )?;
        check(
            "pencil_skirt.dart_angle",
            self.dart_angle,
            (45.0..=135.0).contains(&self.dart_angle),
            "[45, 135]",
            &[45.0, 135.0],
        )
    }
}

/// Which registered component makes up the garment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaDesign {
    pub bottom: Option<String>,
}

/// Complete design input: body, tolerances and every design option.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    pub body: BodyMeasurements,
    pub tolerances: Tolerances,
    pub meta: MetaDesign,
    pub skirt: SkirtDesign,
    #[serde(rename = "flare-skirt")]
    pub flare_skirt: FlareSkirtDesign,
    #[serde(rename = "pencil-skirt")]
    pub pencil_skirt: PencilSkirtDesign,
    #[serde(skip)]
    bottom: Option<ComponentKind>,
}

impl DesignConfig {
    /// Parse, validate every record and resolve the component name.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let mut config: DesignConfig = serde_json::from_str(s)?;
        config.resolve()?;
        Ok(config)
    }

    /// Validate and resolve a config assembled in code.
    pub fn resolve(&mut self) -> Result<()> {
        self.validate()?;
        self.bottom = self.meta.bottom.as_deref().map(ComponentKind::from_name).transpose()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.tolerances.validate()?;
        self.body.validate()?;
        self.skirt.validate()?;
        self.flare_skirt.validate()?;
        self.pencil_skirt.validate()
    }

    /// Component chosen by `meta.bottom`, once resolved.
    pub fn bottom(&self) -> Option<ComponentKind> {
        self.bottom
    }
}
