//! Gem cutter: the drill body that opens the seat for a stone in a setting.

use crate::geom::{Brep, Curve, Plane};
use crate::pipeline::{
    BuildContext, BuildError, BuildResult, Diagnostics, ShellRepair, assemble_stack, build_cutter_stack,
    normalize_profile,
};

use super::params::GemCutterParams;

#[derive(Debug, Clone, PartialEq)]
pub struct GemCutterBuild {
    pub solid: Brep,
    pub params: GemCutterParams,
    pub frame: Plane,
    pub repair: ShellRepair,
    /// Estimated stone weight in carats, for reporting.
    pub weight: f64,
    pub diagnostics: Diagnostics,
}

/// Builds the cutter for the stone whose girdle outline is `outline`.
///
/// The cutter is a tool body; a result that could not be closed is refused
/// rather than handed out as a best-effort fragment.
pub fn build_gem_cutter(
    ctx: &BuildContext<'_>,
    outline: &Curve,
    plane: Option<&Plane>,
    params: &GemCutterParams,
) -> BuildResult<GemCutterBuild> {
    let profile = normalize_profile(ctx.kernel, outline, plane, ctx.tol())?;
    let mut diagnostics = Diagnostics::new();
    let stack = build_cutter_stack(ctx, &profile.curve, params, &mut diagnostics)?;
    let shell = assemble_stack(ctx, &stack, &mut diagnostics)?;
    if shell.repair == ShellRepair::LargestFragment {
        return Err(BuildError::NotSolid);
    }

    log::debug!("gem cutter: {} sections, {:?}", stack.len(), shell.repair);
    Ok(GemCutterBuild {
        solid: profile.brep_to_world(&shell.brep),
        params: params.clone(),
        frame: profile.frame,
        repair: shell.repair,
        weight: params.gem.weight(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PolylineKernel;
    use crate::library::ProfileCatalog;

    #[test]
    fn test_round_cutter_spans_the_stone_depth() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let params = GemCutterParams::default();
        let outline = Curve::circle(&Plane::WORLD_XY, params.gem.size / 2.0, 64).unwrap();
        let build = build_gem_cutter(&ctx, &outline, None, &params).unwrap();
        assert!(build.solid.is_solid());
        assert_eq!(build.repair, ShellRepair::Capped);

        let gem = &params.gem;
        let bbox = build.solid.bbox().unwrap();
        assert!((bbox.max.z - (gem.crown_height() + params.top_extension)).abs() < 1e-9);
        assert!((bbox.min.z + gem.girdle_thickness() + gem.pavilion_depth()).abs() < 1e-9);
        assert!((build.weight - gem.weight()).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_head_profile_is_reported_with_suggestion() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let params = GemCutterParams {
            head_profile: Some("sqare".into()),
            ..GemCutterParams::default()
        };
        let outline = Curve::circle(&Plane::WORLD_XY, 3.0, 64).unwrap();
        let err = build_gem_cutter(&ctx, &outline, None, &params).unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingProfile {
                name: "sqare".into(),
                suggestion: Some("square".into()),
            }
        );
    }
}
