//! Fault-injecting kernel wrapper shared by the pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::geom::{Brep, Curve, Plane, Tolerance};
use crate::kernel::{CornerStyle, GeometryKernel, LoftStyle, PolylineKernel};

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Faults {
    /// Sharp offsets come back with two vertices swapped (a bowtie).
    pub sharp_bowtie: bool,
    /// Every offset comes back open.
    pub open_offsets: bool,
    /// Offsets with a negative distance return nothing.
    pub failing_inward_offsets: bool,
    pub failing_loft: bool,
    pub failing_cap: bool,
    pub failing_sweep: bool,
    /// Boolean differences succeed by merging the reversed cutters into the targets.
    pub boolean_merges: bool,
}

#[derive(Debug, Default)]
pub(crate) struct FaultyKernel {
    pub inner: PolylineKernel,
    pub faults: Faults,
    offsets: AtomicUsize,
}

impl FaultyKernel {
    pub fn new(faults: Faults) -> Self {
        Self {
            inner: PolylineKernel::default(),
            faults,
            offsets: AtomicUsize::new(0),
        }
    }

    pub fn offset_calls(&self) -> usize {
        self.offsets.load(Ordering::Relaxed)
    }
}

impl GeometryKernel for FaultyKernel {
    fn offset(&self, curve: &Curve, distance: f64, tol: Tolerance, style: CornerStyle) -> Option<Curve> {
        self.offsets.fetch_add(1, Ordering::Relaxed);
        if self.faults.failing_inward_offsets && distance < 0.0 {
            return None;
        }
        let result = self.inner.offset(curve, distance, tol, style)?;
        if self.faults.open_offsets {
            return Curve::polyline(result.into_points(), false);
        }
        if self.faults.sharp_bowtie && style == CornerStyle::Sharp {
            let mut points = result.into_points();
            points.swap(0, 1);
            return Curve::polyline(points, true);
        }
        Some(result)
    }

    fn is_valid_curve(&self, curve: &Curve) -> bool {
        self.inner.is_valid_curve(curve)
    }

    fn directions_match(&self, a: &Curve, b: &Curve) -> bool {
        self.inner.directions_match(a, b)
    }

    fn loft(&self, curves: &[Curve], style: LoftStyle, closed: bool) -> Option<Vec<Brep>> {
        if self.faults.failing_loft {
            return None;
        }
        self.inner.loft(curves, style, closed)
    }

    fn iso_curve(&self, patch: &Brep, v: f64) -> Option<Curve> {
        self.inner.iso_curve(patch, v)
    }

    fn sweep_along_rail(&self, rail: &Curve, sections: &[Curve], params: &[f64], closed: bool) -> Option<Vec<Brep>> {
        if self.faults.failing_sweep {
            return None;
        }
        self.inner.sweep_along_rail(rail, sections, params, closed)
    }

    fn boolean_difference(&self, targets: &[Brep], cutters: &[Brep], tol: Tolerance) -> Option<Vec<Brep>> {
        if !self.faults.boolean_merges {
            return self.inner.boolean_difference(targets, cutters, tol);
        }
        let mut parts = targets.to_vec();
        parts.extend(cutters.iter().map(Brep::flipped));
        Some(vec![Brep::merged(&parts)])
    }

    fn cap_planar_holes(&self, brep: &Brep, tol: Tolerance) -> Option<Brep> {
        if self.faults.failing_cap {
            return None;
        }
        self.inner.cap_planar_holes(brep, tol)
    }

    fn join_surfaces(&self, patches: &[Brep], tol: Tolerance) -> Option<Vec<Brep>> {
        self.inner.join_surfaces(patches, tol)
    }

    fn best_fit_plane(&self, curve: &Curve) -> Option<Plane> {
        self.inner.best_fit_plane(curve)
    }

    fn discontinuities(&self, curve: &Curve) -> Vec<f64> {
        self.inner.discontinuities(curve)
    }

    fn standardize(&self, brep: &Brep, tol: Tolerance) -> Brep {
        self.inner.standardize(brep, tol)
    }

    fn split_kinky_faces(&self, brep: &Brep, angle: f64) -> Brep {
        self.inner.split_kinky_faces(brep, angle)
    }

    fn join_naked_edges(&self, brep: &Brep, tol: Tolerance) -> Brep {
        self.inner.join_naked_edges(brep, tol)
    }
}
