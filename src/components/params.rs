//! Parameter records for the jewelry components.
//!
//! Records are plain values. Builders return them alongside the solid so the
//! caller can persist the record and rebuild later; the geometry carries no
//! attached state.

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Vec3};
use crate::pipeline::{BuildError, BuildResult};

/// Density used to normalize [`GemMetrics::weight`] (diamond, g/cm³).
pub const REFERENCE_DENSITY: f64 = 3.52;

// ────────────────────────────────────────────────────────────────────────────
// Gem
// ────────────────────────────────────────────────────────────────────────────

/// Gem proportions. Ratios are fractions of `size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GemMetrics {
    /// Characteristic width (girdle diameter for round stones), in mm.
    pub size: f64,
    /// Material density in g/cm³.
    pub density: f64,
    /// Carat estimation factor for the cut.
    pub shape_factor: f64,
    pub crown_ratio: f64,
    pub girdle_ratio: f64,
    pub pavilion_ratio: f64,
}

impl Default for GemMetrics {
    fn default() -> Self {
        Self {
            size: 6.5,
            density: REFERENCE_DENSITY,
            shape_factor: 0.0061,
            crown_ratio: 0.16,
            girdle_ratio: 0.03,
            pavilion_ratio: 0.43,
        }
    }
}

impl GemMetrics {
    #[must_use]
    pub fn with_size(self, size: f64) -> Self {
        Self { size, ..self }
    }

    #[must_use]
    pub fn crown_height(&self) -> f64 {
        self.size * self.crown_ratio
    }

    #[must_use]
    pub fn girdle_thickness(&self) -> f64 {
        self.size * self.girdle_ratio
    }

    #[must_use]
    pub fn pavilion_depth(&self) -> f64 {
        self.size * self.pavilion_ratio
    }

    #[must_use]
    pub fn total_depth(&self) -> f64 {
        self.crown_height() + self.girdle_thickness() + self.pavilion_depth()
    }

    /// Estimated weight in carats: `size² · depth · shape_factor`, scaled by
    /// density relative to diamond.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.size * self.size * self.total_depth() * self.shape_factor * self.density / REFERENCE_DENSITY
    }

    pub fn validate(&self) -> BuildResult<()> {
        positive("gem.size", self.size)?;
        positive("gem.density", self.density)?;
        non_negative("gem.crown_ratio", self.crown_ratio)?;
        non_negative("gem.girdle_ratio", self.girdle_ratio)?;
        positive("gem.pavilion_ratio", self.pavilion_ratio)?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bezel
// ────────────────────────────────────────────────────────────────────────────

/// Bezel setting around a stone outline. Lengths in model units.
///
/// Z levels in the local frame: the seat at 0, the top at `seat_depth`, the
/// bottom at `seat_depth - height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BezelParams {
    pub height: f64,
    pub top_thickness: f64,
    pub bottom_thickness: f64,
    /// Gap between the stone outline and the inner wall.
    pub offset: f64,
    /// Width of the ledge the stone rests on.
    pub seat_ledge: f64,
    /// Distance from the seat up to the top rim.
    pub seat_depth: f64,
    /// Inward taper of the outer wall towards the bottom.
    pub chamfer: f64,
    /// Outward bulge of the outer wall half way down.
    pub bombing: f64,
    /// Subtract the seat cutter from the assembled solid.
    pub cut_seat: bool,
}

impl Default for BezelParams {
    fn default() -> Self {
        Self {
            height: 2.0,
            top_thickness: 0.8,
            bottom_thickness: 0.8,
            offset: 0.1,
            seat_ledge: 0.2,
            seat_depth: 0.6,
            chamfer: 0.0,
            bombing: 0.0,
            cut_seat: true,
        }
    }
}

impl BezelParams {
    #[must_use]
    pub fn top_z(&self) -> f64 {
        self.seat_depth
    }

    #[must_use]
    pub fn bottom_z(&self) -> f64 {
        self.seat_depth - self.height
    }

    #[must_use]
    pub fn mid_z(&self) -> f64 {
        0.5 * (self.top_z() + self.bottom_z())
    }

    pub fn validate(&self) -> BuildResult<()> {
        positive("height", self.height)?;
        positive("top_thickness", self.top_thickness)?;
        positive("bottom_thickness", self.bottom_thickness)?;
        non_negative("offset", self.offset)?;
        non_negative("seat_ledge", self.seat_ledge)?;
        non_negative("chamfer", self.chamfer)?;
        non_negative("bombing", self.bombing)?;
        non_negative("seat_depth", self.seat_depth)?;
        if self.seat_depth > self.height {
            return Err(BuildError::InvalidParameter {
                name: "seat_depth",
                value: self.seat_depth,
            });
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gem cutter
// ────────────────────────────────────────────────────────────────────────────

/// Void shaped like the stone, used to drill seats into metal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GemCutterParams {
    pub gem: GemMetrics,
    /// Offset applied to the outline before scaling.
    pub clearance: f64,
    /// Uniform scale applied to the offset outline.
    pub scale: f64,
    /// Extra height of the opening above the crown.
    pub top_extension: f64,
    /// Width of the tip section as a fraction of the gem size.
    pub bottom_diameter_pct: f64,
    /// Library profile used for the tip section instead of a circle.
    pub head_profile: Option<String>,
    /// Rotation of the tip section about the local Z axis, in degrees.
    pub profile_rotation: f64,
}

impl Default for GemCutterParams {
    fn default() -> Self {
        Self {
            gem: GemMetrics::default(),
            clearance: 0.05,
            scale: 1.0,
            top_extension: 0.5,
            bottom_diameter_pct: 0.3,
            head_profile: None,
            profile_rotation: 0.0,
        }
    }
}

impl GemCutterParams {
    pub fn validate(&self) -> BuildResult<()> {
        self.gem.validate()?;
        non_negative("clearance", self.clearance)?;
        positive("scale", self.scale)?;
        non_negative("top_extension", self.top_extension)?;
        positive("bottom_diameter_pct", self.bottom_diameter_pct)?;
        finite("profile_rotation", self.profile_rotation)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Head
// ────────────────────────────────────────────────────────────────────────────

/// Solid rail swept along a head's support path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadRailParams {
    pub profile: String,
    pub width: f64,
    pub height: f64,
    /// Rotation of the section about the rail tangent, in degrees.
    pub rotation: f64,
    /// Offset of the rail path in its plane before sampling; positive moves outward.
    pub rail_offset: f64,
    /// Up direction of the rail frames; the rail's own normal when absent.
    pub up: Option<Vec3>,
}

impl Default for HeadRailParams {
    fn default() -> Self {
        Self {
            profile: "round".into(),
            width: 0.8,
            height: 0.8,
            rotation: 0.0,
            rail_offset: 0.0,
            up: None,
        }
    }
}

impl HeadRailParams {
    pub fn validate(&self) -> BuildResult<()> {
        positive("rail.width", self.width)?;
        positive("rail.height", self.height)?;
        finite("rail.rotation", self.rotation)?;
        finite("rail.rail_offset", self.rail_offset)
    }
}

/// Prongs stationed along the head rail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProngParams {
    /// Rail parameters of the prongs. Empty means `count` evenly spaced prongs.
    pub positions: Vec<f64>,
    pub count: usize,
    /// Rail parameter of the first evenly spaced prong.
    pub start: f64,
    pub profile: String,
    pub diameter: f64,
    /// Fraction of the diameter that overlaps the rail towards the center.
    pub inside_fraction: f64,
    /// Height of the top point above the rail.
    pub top_height: f64,
    /// Height of the mid point above the rail (near the girdle).
    pub mid_height: f64,
    /// Depth of the bottom point below the rail.
    pub bottom_depth: f64,
    /// Extra radial shift for the top, mid and bottom points.
    pub level_offsets: [f64; 3],
    /// Point the prongs radiate from; the rail's bounding box center when absent.
    pub center: Option<Point3>,
}

impl Default for ProngParams {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            count: 4,
            start: 0.125,
            profile: "round".into(),
            diameter: 0.8,
            inside_fraction: 0.3,
            top_height: 2.0,
            mid_height: 0.8,
            bottom_depth: 1.0,
            level_offsets: [0.0; 3],
            center: None,
        }
    }
}

impl ProngParams {
    /// Radial shift of the prong axis from the rail: radius minus the overlap.
    #[must_use]
    pub fn shift(&self) -> f64 {
        self.diameter / 2.0 - self.diameter * self.inside_fraction
    }

    /// Rail parameters the prongs stand at.
    #[must_use]
    pub fn parameters(&self) -> Vec<f64> {
        if !self.positions.is_empty() {
            return self.positions.clone();
        }
        (0..self.count)
            .map(|i| (self.start + i as f64 / self.count as f64).rem_euclid(1.0))
            .collect()
    }

    pub fn validate(&self) -> BuildResult<()> {
        positive("prong.diameter", self.diameter)?;
        finite("prong.inside_fraction", self.inside_fraction)?;
        finite("prong.top_height", self.top_height)?;
        finite("prong.mid_height", self.mid_height)?;
        non_negative("prong.bottom_depth", self.bottom_depth)?;
        if self.top_height <= self.mid_height {
            return Err(BuildError::InvalidParameter {
                name: "prong.top_height",
                value: self.top_height,
            });
        }
        for &t in &self.positions {
            if !(0.0..=1.0).contains(&t) {
                return Err(BuildError::InvalidParameter {
                    name: "prong.positions",
                    value: t,
                });
            }
        }
        self.level_offsets.iter().try_for_each(|&o| finite("prong.level_offsets", o))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validation helpers
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn finite(name: &'static str, value: f64) -> BuildResult<()> {
    if value.is_finite() { Ok(()) } else { Err(BuildError::InvalidParameter { name, value }) }
}

pub(crate) fn positive(name: &'static str, value: f64) -> BuildResult<()> {
    if value.is_finite() && value > 0.0 { Ok(()) } else { Err(BuildError::InvalidParameter { name, value }) }
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> BuildResult<()> {
    if value.is_finite() && value >= 0.0 { Ok(()) } else { Err(BuildError::InvalidParameter { name, value }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_brilliant_weight() {
        // A 6.5 mm round brilliant is close to one carat.
        let gem = GemMetrics::default();
        assert!((gem.weight() - 1.0).abs() < 0.1, "{}", gem.weight());
        let ruby = GemMetrics { density: 4.0, ..gem };
        assert!(ruby.weight() > gem.weight());
    }

    #[test]
    fn test_prong_shift() {
        let prong = ProngParams {
            diameter: 1.0,
            inside_fraction: 0.3,
            ..ProngParams::default()
        };
        assert!((prong.shift() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_even_prong_parameters_wrap() {
        let prong = ProngParams {
            count: 4,
            start: 0.9,
            ..ProngParams::default()
        };
        let t = prong.parameters();
        assert_eq!(t.len(), 4);
        assert!((t[0] - 0.9).abs() < 1e-12);
        assert!((t[1] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_bezel_levels_and_validation() {
        let params = BezelParams::default();
        assert!(params.validate().is_ok());
        assert!((params.bottom_z() + 1.4).abs() < 1e-12);
        assert!((params.mid_z() + 0.4).abs() < 1e-12);
        let bad = BezelParams {
            seat_depth: 3.0,
            ..params
        };
        assert_eq!(
            bad.validate(),
            Err(BuildError::InvalidParameter {
                name: "seat_depth",
                value: 3.0
            })
        );
        let bad = BezelParams { height: f64::NAN, ..params };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: BezelParams = serde_json::from_str(r#"{"height": 3.0}"#).unwrap();
        assert_eq!(params.height, 3.0);
        assert_eq!(params.top_thickness, BezelParams::default().top_thickness);
    }
}
