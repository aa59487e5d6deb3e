//! Bezel: a collar around a stone outline with a seat ledge and an optional
//! seat cut.

use crate::geom::{Brep, Curve, Plane};
use crate::pipeline::{
    BuildContext, BuildResult, Diagnostics, ProfileRole, ShellRepair, assemble_stack, build_bezel_stack,
    normalize_profile, subtract_seat,
};

use super::params::BezelParams;

#[derive(Debug, Clone, PartialEq)]
pub struct BezelBuild {
    /// Solid in world space.
    pub solid: Brep,
    pub params: BezelParams,
    /// Working frame the bezel was built in.
    pub frame: Plane,
    pub repair: ShellRepair,
    /// Whether the seat void was actually subtracted.
    pub seat_cut: bool,
    pub diagnostics: Diagnostics,
}

/// Builds a bezel around `outline`, lying in `plane` or in its best-fit plane.
pub fn build_bezel(ctx: &BuildContext<'_>, outline: &Curve, plane: Option<&Plane>, params: &BezelParams) -> BuildResult<BezelBuild> {
    let profile = normalize_profile(ctx.kernel, outline, plane, ctx.tol())?;
    let mut diagnostics = Diagnostics::new();
    let stack = build_bezel_stack(ctx, &profile.curve, params, &mut diagnostics)?;
    let shell = assemble_stack(ctx, &stack, &mut diagnostics)?;

    let (local, seat_cut) = match stack.get(ProfileRole::SeatInner) {
        Some(seat) if params.cut_seat => {
            let outcome = subtract_seat(ctx, &shell.brep, &seat.curve, params.top_z(), params.bottom_z(), &mut diagnostics);
            (outcome.solid, outcome.cut)
        }
        _ => (shell.brep, false),
    };

    crate::debug_log!(
        "bezel built: {} patches, {:?}, seat cut {seat_cut}, {} warnings",
        shell.patch_count,
        shell.repair,
        diagnostics.warnings.len()
    );
    Ok(BezelBuild {
        solid: profile.brep_to_world(&local),
        params: params.clone(),
        frame: profile.frame,
        repair: shell.repair,
        seat_cut,
        diagnostics,
    })
}
