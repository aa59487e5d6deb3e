//! Seam and direction alignment before lofting.

use crate::geom::{Curve, Point3, Tolerance};
use crate::kernel::GeometryKernel;

/// What [`align_profiles`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentReport {
    /// Indices of curves that were reversed.
    pub reversed: Vec<usize>,
    /// Indices of curves whose seam was moved.
    pub reseamed: Vec<usize>,
}

impl AlignmentReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.reversed.is_empty() && self.reseamed.is_empty()
    }
}

/// Forces every curve to run the same way as `curves[0]` and to start at the
/// point closest to `curves[0]`'s start.
///
/// Open curves are only reversed; they have no seam to move. Aligning an
/// already aligned list changes nothing.
#[must_use]
pub fn align_profiles(kernel: &dyn GeometryKernel, curves: &[Curve], tol: Tolerance) -> (Vec<Curve>, AlignmentReport) {
    align_with(kernel, curves, tol, |aligned| &aligned[0])
}

/// Like [`align_profiles`], but each curve is aligned to its aligned
/// predecessor. Suited to sections spread along a rail, where the first
/// section is far from the last.
#[must_use]
pub fn align_chain(kernel: &dyn GeometryKernel, curves: &[Curve], tol: Tolerance) -> (Vec<Curve>, AlignmentReport) {
    align_with(kernel, curves, tol, |aligned| &aligned[aligned.len() - 1])
}

fn align_with(
    kernel: &dyn GeometryKernel,
    curves: &[Curve],
    tol: Tolerance,
    reference: impl Fn(&[Curve]) -> &Curve,
) -> (Vec<Curve>, AlignmentReport) {
    let mut report = AlignmentReport::default();
    let Some(first) = curves.first() else {
        return (Vec::new(), report);
    };
    let mut aligned = Vec::with_capacity(curves.len());
    aligned.push(first.clone());

    for (i, curve) in curves.iter().enumerate().skip(1) {
        let target = reference(&aligned);
        let mut curve = if kernel.directions_match(target, curve) {
            curve.clone()
        } else {
            report.reversed.push(i);
            curve.reversed()
        };
        if let Some(t) = seam_towards(&curve, target.start(), tol) {
            curve = curve.with_seam_at(t, tol);
            report.reseamed.push(i);
        }
        aligned.push(curve);
    }

    if !report.is_noop() {
        log::debug!(
            "aligned {} profiles: reversed {:?}, re-seamed {:?}",
            curves.len(),
            report.reversed,
            report.reseamed
        );
    }
    (aligned, report)
}

/// Share of the adjacent segment length a point between vertices must gain
/// over the nearest vertex before a seam vertex is inserted there.
const SEAM_SNAP: f64 = 0.05;

/// Parameter of the new seam of closed `curve` nearest to `target`, or `None`
/// when the current start is already the best seam.
///
/// The closest point of a polygon often lies on a chord a hair closer than
/// the nearest vertex. Such points snap to that vertex so sections that
/// already correspond keep their seams.
fn seam_towards(curve: &Curve, target: Point3, tol: Tolerance) -> Option<f64> {
    if !curve.is_closed() {
        return None;
    }
    let points = curve.points();
    let distance = |i: usize| points[i].distance_to(target);
    let mut nearest = (0..points.len())
        .min_by(|&a, &b| distance(a).total_cmp(&distance(b)))
        .unwrap_or(0);
    if distance(0) - distance(nearest) <= tol.eps {
        nearest = 0;
    }

    let t = curve.closest_parameter(target);
    let gain = distance(nearest) - curve.point_at(t).distance_to(target);
    let n = points.len();
    let span = points[nearest]
        .distance_to(points[(nearest + 1) % n])
        .max(points[nearest].distance_to(points[(nearest + n - 1) % n]));
    if gain > tol.eps.max(SEAM_SNAP * span) {
        Some(t)
    } else {
        (nearest != 0).then(|| curve.vertex_parameter(nearest))
    }
}
