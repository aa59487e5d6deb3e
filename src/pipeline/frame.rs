//! Canonical working frames for profile curves.
//!
//! Every component is built in a local frame where the source profile lies in
//! XY, is closed and runs counter-clockwise about +Z. Results are mapped back
//! with the inverse transform at the end of the build.

use crate::geom::{Brep, Curve, Plane, Point3, Tolerance, Transform, Vec3};
use crate::kernel::GeometryKernel;

use super::error::{BuildError, BuildResult};

/// A profile expressed in its canonical frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProfile {
    /// World placement of the local frame.
    pub frame: Plane,
    /// The profile in local coordinates.
    pub curve: Curve,
    /// The source was not planar and has been projected onto the frame.
    pub projected: bool,
    /// The source was open and has been closed.
    pub closed: bool,
    /// The source ran clockwise and has been reversed.
    pub reversed: bool,
}

impl NormalizedProfile {
    #[must_use]
    pub fn to_local(&self) -> Transform {
        self.frame.to_local()
    }

    #[must_use]
    pub fn to_world(&self) -> Transform {
        self.frame.to_world()
    }

    #[must_use]
    pub fn curve_to_world(&self, curve: &Curve) -> Curve {
        curve.transformed(&self.to_world())
    }

    #[must_use]
    pub fn brep_to_world(&self, brep: &Brep) -> Brep {
        brep.transformed(&self.to_world())
    }
}

/// Maps `curve` and its supporting `plane` into a canonical frame.
///
/// A missing plane is replaced by the curve's best-fit plane, turned to face
/// world +Z. A supplied plane with a skewed basis is re-orthogonalized. The
/// frame origin is moved to the center of the curve's extent in the plane.
///
/// Fails only when the curve holds non-finite coordinates or no usable plane
/// exists.
pub fn normalize_profile(
    kernel: &dyn GeometryKernel,
    curve: &Curve,
    plane: Option<&Plane>,
    tol: Tolerance,
) -> BuildResult<NormalizedProfile> {
    if !curve.is_finite() {
        return Err(BuildError::InvalidGeometry("profile curve has non-finite coordinates".into()));
    }

    let plane = match plane {
        Some(p) => repair_plane(p)?,
        None => {
            let source = curve.closed_copy(tol).unwrap_or_else(|| curve.clone());
            let fitted = kernel
                .best_fit_plane(&source)
                .ok_or_else(|| BuildError::InvalidGeometry("profile curve has no best-fit plane".into()))?;
            if fitted.z_axis.z < 0.0 { fitted.flipped() } else { fitted }
        }
    };

    let local = curve.transformed(&plane.to_local());
    let extent = local.bbox().center();
    let frame = plane.with_origin(plane.point_at(extent.x, extent.y, 0.0));
    let local = curve.transformed(&frame.to_local());

    let projected = local.max_deviation_from_plane(&Plane::WORLD_XY) > tol.eps;
    let flat = local
        .projected(&Plane::WORLD_XY)
        .ok_or_else(|| BuildError::InvalidGeometry("profile collapses onto its plane".into()))?;
    if projected {
        log::debug!("profile is not planar, projected onto its frame");
    }

    let closed = !flat.is_closed();
    let flat = flat
        .closed_copy(tol)
        .ok_or_else(|| BuildError::InvalidGeometry("profile cannot be closed".into()))?;
    if closed {
        log::debug!("profile closed automatically");
    }

    let reversed = flat.signed_area(Vec3::Z) < 0.0;
    let curve = if reversed { flat.reversed() } else { flat };

    Ok(NormalizedProfile {
        frame,
        curve,
        projected,
        closed,
        reversed,
    })
}

fn repair_plane(plane: &Plane) -> BuildResult<Plane> {
    if plane.origin.is_finite() && plane.is_orthonormal() {
        return Ok(*plane);
    }
    let origin = if plane.origin.is_finite() { plane.origin } else { Point3::ORIGIN };
    Plane::new(origin, plane.x_axis, plane.y_axis)
        .filter(Plane::is_orthonormal)
        .ok_or_else(|| BuildError::InvalidGeometry("supporting plane is degenerate".into()))
}
