//! Offsets with a corner-style retry chain and a validity screen.

use crate::geom::{Curve, Tolerance};
use crate::kernel::{CornerStyle, GeometryKernel};

/// Distances below this return a duplicate of the source.
pub const ZERO_OFFSET_EPS: f64 = 1e-3;

/// Outcome of an accepted offset.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetOutcome {
    pub curve: Curve,
    /// Corner style that produced the curve; `None` for the zero-distance duplicate.
    pub style: Option<CornerStyle>,
}

/// Offsets closed planar curves, trying corner styles from sharp to smooth.
#[derive(Clone, Copy)]
pub struct RobustOffsetter<'a> {
    kernel: &'a dyn GeometryKernel,
    tol: Tolerance,
}

impl<'a> RobustOffsetter<'a> {
    #[must_use]
    pub fn new(kernel: &'a dyn GeometryKernel, tol: Tolerance) -> Self {
        Self { kernel, tol }
    }

    /// Offset of `curve` by `distance`, or `None` when no corner style yields
    /// a valid closed curve running the same way as the source.
    #[must_use]
    pub fn offset(&self, curve: &Curve, distance: f64) -> Option<Curve> {
        self.offset_with_style(curve, distance).map(|o| o.curve)
    }

    /// Like [`RobustOffsetter::offset`], also reporting the corner style used.
    #[must_use]
    pub fn offset_with_style(&self, curve: &Curve, distance: f64) -> Option<OffsetOutcome> {
        if !distance.is_finite() {
            return None;
        }
        if distance.abs() < ZERO_OFFSET_EPS {
            return Some(OffsetOutcome {
                curve: curve.clone(),
                style: None,
            });
        }
        for style in CornerStyle::FALLBACK_ORDER {
            match self.kernel.offset(curve, distance, self.tol, style) {
                Some(candidate) if self.accepts(curve, &candidate) => {
                    if style != CornerStyle::Sharp {
                        log::debug!("offset by {distance} accepted with {style:?} corners");
                    }
                    return Some(OffsetOutcome {
                        curve: candidate,
                        style: Some(style),
                    });
                }
                Some(_) => log::debug!("{style:?} offset by {distance} rejected by validity screen"),
                None => log::debug!("{style:?} offset by {distance} returned no curve"),
            }
        }
        log::debug!("offset by {distance} failed for every corner style");
        None
    }

    fn accepts(&self, source: &Curve, candidate: &Curve) -> bool {
        candidate.is_closed_within(self.tol)
            && self.kernel.is_valid_curve(candidate)
            && self.kernel.directions_match(source, candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Plane;
    use crate::kernel::{InstrumentedKernel, PolylineKernel};
    use crate::pipeline::tests::support::{Faults, FaultyKernel};

    #[test]
    fn test_zero_distance_duplicates_without_kernel_call() {
        let kernel = InstrumentedKernel::new(PolylineKernel::default());
        let offsetter = RobustOffsetter::new(&kernel, Tolerance::MODEL);
        let circle = Curve::circle(&Plane::WORLD_XY, 1.0, 24).unwrap();
        let outcome = offsetter.offset_with_style(&circle, 0.0005).unwrap();
        assert_eq!(outcome.curve, circle);
        assert_eq!(outcome.style, None);
        assert_eq!(kernel.counts().offset, 0);
    }

    #[test]
    fn test_square_offset_keeps_sharp_corners() {
        let kernel = PolylineKernel::default();
        let offsetter = RobustOffsetter::new(&kernel, Tolerance::MODEL);
        let square = Curve::rectangle(&Plane::WORLD_XY, 2.0, 2.0).unwrap();
        let outcome = offsetter.offset_with_style(&square, 0.25).unwrap();
        assert_eq!(outcome.style, Some(CornerStyle::Sharp));
        assert!((outcome.curve.bbox().size().x - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_collapsed_offset_returns_none() {
        let kernel = PolylineKernel::default();
        let offsetter = RobustOffsetter::new(&kernel, Tolerance::MODEL);
        let circle = Curve::circle(&Plane::WORLD_XY, 1.0, 32).unwrap();
        assert!(offsetter.offset(&circle, -2.0).is_none());
        assert!(offsetter.offset(&circle, f64::NAN).is_none());
    }

    #[test]
    fn test_open_result_is_rejected() {
        let kernel = FaultyKernel::new(Faults {
            open_offsets: true,
            ..Faults::default()
        });
        let offsetter = RobustOffsetter::new(&kernel, Tolerance::MODEL);
        let square = Curve::rectangle(&Plane::WORLD_XY, 4.0, 4.0).unwrap();
        assert!(offsetter.offset(&square, 0.5).is_none());
        assert_eq!(kernel.offset_calls(), 3);
    }

    #[test]
    fn test_self_intersecting_sharp_result_falls_through_to_round() {
        let kernel = FaultyKernel::new(Faults {
            sharp_bowtie: true,
            ..Faults::default()
        });
        let offsetter = RobustOffsetter::new(&kernel, Tolerance::MODEL);
        let square = Curve::rectangle(&Plane::WORLD_XY, 4.0, 4.0).unwrap();
        let outcome = offsetter.offset_with_style(&square, 0.5).unwrap();
        assert_eq!(outcome.style, Some(CornerStyle::Round));
        assert!(!outcome.curve.is_self_intersecting());
    }
}
