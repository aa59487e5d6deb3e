//! Numerical policy defaults and the context every builder receives.

use serde::{Deserialize, Serialize};

use crate::geom::Tolerance;
use crate::kernel::GeometryKernel;
use crate::library::ProfileLibrary;

/// Policy constants for the construction pipeline.
///
/// None of these are geometric laws. They are the defaults the fallback
/// chains use and may be tuned per document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Model tolerance for offsets, joins, caps and closing.
    pub tolerance: f64,
    /// Parameter distance under which two rail samples are merged.
    pub parameter_tolerance: f64,
    /// Turning angle in degrees treated as a kink.
    pub kink_angle: f64,
    /// Scale applied to a duplicated outer-bottom when the inner-bottom offset fails.
    pub inner_bottom_fallback_scale: f64,
    /// Second-chance seat ledge distance when the requested ledge offset fails.
    pub seat_ledge_fallback: f64,
    pub min_rail_samples: usize,
    pub max_rail_samples: usize,
    /// Evenly spaced rail samples per model unit of rail length.
    pub rail_sample_density: f64,
    /// Point count of the rebuild of a kink-free slot curve.
    pub smooth_rebuild_points: usize,
    pub segment_points_min: usize,
    pub segment_points_max: usize,
    /// Rebuild points per model unit of a continuous segment.
    pub segment_points_per_unit: f64,
    /// Height of the cutter void above the top face.
    pub cutter_lift: f64,
    /// Scale of the cutter void at its tip.
    pub cutter_tip_scale: f64,
    /// Depth the cutter void reaches below the bottom face.
    pub cutter_overshoot: f64,
    /// Minimum distance of a prong mid section from the axis ends, in axis parameter.
    pub prong_mid_margin: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::MODEL.eps,
            parameter_tolerance: Tolerance::PARAMETER.eps,
            kink_angle: 20.0,
            inner_bottom_fallback_scale: 0.9,
            seat_ledge_fallback: 0.1,
            min_rail_samples: 4,
            max_rail_samples: 60,
            rail_sample_density: 2.0,
            smooth_rebuild_points: 32,
            segment_points_min: 4,
            segment_points_max: 12,
            segment_points_per_unit: 4.0,
            cutter_lift: 0.05,
            cutter_tip_scale: 0.01,
            cutter_overshoot: 0.5,
            prong_mid_margin: 0.05,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn tol(&self) -> Tolerance {
        Tolerance::new(self.tolerance)
    }

    #[must_use]
    pub fn kink_radians(&self) -> f64 {
        self.kink_angle.to_radians()
    }

    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub const fn with_inner_bottom_fallback_scale(mut self, scale: f64) -> Self {
        self.inner_bottom_fallback_scale = scale;
        self
    }

    #[must_use]
    pub const fn with_seat_ledge_fallback(mut self, distance: f64) -> Self {
        self.seat_ledge_fallback = distance;
        self
    }

    #[must_use]
    pub const fn with_rail_samples(mut self, min: usize, max: usize) -> Self {
        self.min_rail_samples = min;
        self.max_rail_samples = max;
        self
    }
}

/// Collaborators shared by every stage of one build.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub kernel: &'a dyn GeometryKernel,
    pub library: &'a dyn ProfileLibrary,
    pub config: PipelineConfig,
}

impl<'a> BuildContext<'a> {
    #[must_use]
    pub fn new(kernel: &'a dyn GeometryKernel, library: &'a dyn ProfileLibrary) -> Self {
        Self {
            kernel,
            library,
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(self, config: PipelineConfig) -> Self {
        Self { config, ..self }
    }

    #[must_use]
    pub fn tol(&self) -> Tolerance {
        self.config.tol()
    }
}

impl std::fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("library", &self.library.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
