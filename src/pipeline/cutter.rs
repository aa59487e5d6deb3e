//! Seat cutter: a void built from the seat profile and subtracted from the
//! assembled solid.
//!
//! Subtraction is best effort. An uncut solid is still a usable part, so any
//! failure here is recorded as a warning and the input solid comes back.

use crate::geom::{Brep, Curve, Vec3};
use crate::kernel::LoftStyle;

use super::config::BuildContext;
use super::error::Diagnostics;
use super::seam::align_profiles;
use super::shell::{ShellRepair, close_shell};

/// Smallest perimeter of the void's tip, in multiples of the model tolerance.
/// Keeps tip vertices apart when the shell is welded.
const MIN_TIP_PERIMETER: f64 = 500.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CutOutcome {
    pub solid: Brep,
    /// Whether the void was actually subtracted.
    pub cut: bool,
}

/// Closed, outward void from `seat` (flat, local z = 0), starting `cutter_lift`
/// above `top` and narrowing to a tip `cutter_overshoot` below `bottom`.
#[must_use]
pub fn build_void(ctx: &BuildContext<'_>, seat: &Curve, top: f64, bottom: f64) -> Option<Brep> {
    let config = &ctx.config;
    let perimeter = seat.length();
    if perimeter <= 0.0 {
        return None;
    }
    let tip_scale = config.cutter_tip_scale.max(MIN_TIP_PERIMETER * ctx.tol().eps / perimeter).min(1.0);
    let upper = seat.translated(Vec3::new(0.0, 0.0, top + config.cutter_lift));
    let tip = seat
        .scaled_about_center(tip_scale)
        .translated(Vec3::new(0.0, 0.0, bottom - config.cutter_overshoot));

    let (sections, _) = align_profiles(ctx.kernel, &[upper, tip], ctx.tol());
    let patches = ctx.kernel.loft(&sections, LoftStyle::Straight, false)?;
    let mut scratch = Diagnostics::new();
    match close_shell(ctx, patches, &mut scratch) {
        Ok((void, ShellRepair::Joined | ShellRepair::Capped)) => Some(void),
        _ => {
            log::debug!("seat void could not be closed");
            None
        }
    }
}

/// Subtracts the seat void from `solid`, or returns `solid` unchanged with a
/// warning when the void cannot be built or the difference has no result.
#[must_use]
pub fn subtract_seat(
    ctx: &BuildContext<'_>,
    solid: &Brep,
    seat: &Curve,
    top: f64,
    bottom: f64,
    diagnostics: &mut Diagnostics,
) -> CutOutcome {
    let uncut = |diagnostics: &mut Diagnostics, reason: &str| {
        diagnostics.warn(format!("seat cutter skipped: {reason}"));
        CutOutcome {
            solid: solid.clone(),
            cut: false,
        }
    };

    let Some(void) = build_void(ctx, seat, top, bottom) else {
        return uncut(diagnostics, "void could not be capped");
    };
    match ctx.kernel.boolean_difference(std::slice::from_ref(solid), &[void], ctx.tol()) {
        Some(pieces) if !pieces.is_empty() => {
            log::debug!("seat cutter produced {} pieces", pieces.len());
            CutOutcome {
                solid: Brep::merged(&pieces),
                cut: true,
            }
        }
        _ => uncut(diagnostics, "boolean difference returned no result"),
    }
}
