//! Geometry kernel service.
//!
//! The construction pipeline never evaluates offsets, lofts, sweeps or
//! booleans itself; it calls a [`GeometryKernel`]. Every primitive reports
//! infeasibility as `None` rather than an error, and the pipeline decides
//! which fallback to take.
//!
//! [`PolylineKernel`] is the in-process reference implementation working on
//! polyline curves and polygon Breps. [`InstrumentedKernel`] wraps any kernel
//! and counts calls per primitive.

mod instrumented;
mod polyline;

pub use instrumented::{InstrumentedKernel, KernelCallCounts};
pub use polyline::PolylineKernel;

use serde::{Deserialize, Serialize};

use crate::geom::{Brep, Curve, Plane, Tolerance};

/// Corner treatment for curve offsets, in the order the pipeline tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerStyle {
    Sharp,
    Round,
    Smooth,
}

impl CornerStyle {
    /// Retry order used by the robust offsetter.
    pub const FALLBACK_ORDER: [CornerStyle; 3] = [CornerStyle::Sharp, CornerStyle::Round, CornerStyle::Smooth];
}

/// Loft interpolation between sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoftStyle {
    /// Ruled bands between consecutive sections.
    Straight,
    /// Tangent-continuous interpolation through the sections.
    Smooth,
}

/// In-process geometry service consumed by the pipeline.
///
/// Implementations must be side-effect free from the caller's point of view:
/// inputs are borrowed, results are new values. `Sync` lets independent
/// builds (prongs of one head) run in parallel.
pub trait GeometryKernel: Sync {
    /// Offset of a planar curve in its plane. Positive distances go to the
    /// right of the travel direction seen from the plane normal, which is
    /// outward for counter-clockwise curves.
    fn offset(&self, curve: &Curve, distance: f64, tol: Tolerance, style: CornerStyle) -> Option<Curve>;

    /// Geometric validity: finite, non-degenerate and free of self-intersections.
    fn is_valid_curve(&self, curve: &Curve) -> bool;

    /// Whether two curves run the same way round (closed) or the same way along (open).
    fn directions_match(&self, a: &Curve, b: &Curve) -> bool;

    /// Surface through the ordered `curves`. `closed` lofts the last section back to the first.
    fn loft(&self, curves: &[Curve], style: LoftStyle, closed: bool) -> Option<Vec<Brep>>;

    /// Section of a lofted patch at normalized lofting parameter `v`.
    fn iso_curve(&self, patch: &Brep, v: f64) -> Option<Curve>;

    /// One-rail sweep through `sections`, each positioned on the rail at the matching entry of `params`.
    fn sweep_along_rail(&self, rail: &Curve, sections: &[Curve], params: &[f64], closed: bool) -> Option<Vec<Brep>>;

    fn boolean_difference(&self, targets: &[Brep], cutters: &[Brep], tol: Tolerance) -> Option<Vec<Brep>>;

    /// Closes every planar naked boundary loop with a cap face.
    fn cap_planar_holes(&self, brep: &Brep, tol: Tolerance) -> Option<Brep>;

    /// Joins patches along coincident edges into connected Breps.
    fn join_surfaces(&self, patches: &[Brep], tol: Tolerance) -> Option<Vec<Brep>>;

    fn best_fit_plane(&self, curve: &Curve) -> Option<Plane>;

    /// Parameters of tangent discontinuities (kinks).
    fn discontinuities(&self, curve: &Curve) -> Vec<f64>;

    /// Removes degenerate geometry and merges coincident vertices.
    fn standardize(&self, brep: &Brep, tol: Tolerance) -> Brep;

    /// Regroups polygons into faces, breaking at edges sharper than `angle` radians.
    fn split_kinky_faces(&self, brep: &Brep, angle: f64) -> Brep;

    /// Rejoins naked edges that coincide within `tol`.
    fn join_naked_edges(&self, brep: &Brep, tol: Tolerance) -> Brep;
}
