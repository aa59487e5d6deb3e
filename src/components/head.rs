//! Head: the support rail of a setting plus the prongs standing on it.

use serde::{Deserialize, Serialize};

use crate::geom::{Brep, Curve};
use crate::pipeline::{BuildContext, BuildResult, Diagnostics, ShellRepair, build_prongs, build_rail_solid};

use super::params::{HeadRailParams, ProngParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadParams {
    pub rail: HeadRailParams,
    /// Prongs to place on the rail; `None` builds the rail only.
    pub prongs: Option<ProngParams>,
}

impl Default for HeadParams {
    fn default() -> Self {
        Self {
            rail: HeadRailParams::default(),
            prongs: Some(ProngParams::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadBuild {
    pub rail: Brep,
    pub rail_repair: ShellRepair,
    /// One solid per prong that built, in rail parameter order of the input.
    pub prongs: Vec<Brep>,
    /// Rail parameters of the prongs that could not be built.
    pub failed_prongs: Vec<f64>,
    pub params: HeadParams,
    pub diagnostics: Diagnostics,
}

impl HeadBuild {
    /// Rail first, then the prongs.
    #[must_use]
    pub fn solids(&self) -> Vec<&Brep> {
        std::iter::once(&self.rail).chain(&self.prongs).collect()
    }
}

/// Builds the head rail along `rail` and its prongs.
///
/// Prongs stand on the rail path itself, not on the offset path the rail
/// solid may have been swept along. A prong that fails is recorded and its
/// siblings are still built; only a rail failure fails the head.
pub fn build_head(ctx: &BuildContext<'_>, rail: &Curve, params: &HeadParams) -> BuildResult<HeadBuild> {
    let mut diagnostics = Diagnostics::new();
    let rail_solid = build_rail_solid(ctx, rail, &params.rail, &mut diagnostics)?;

    let mut prongs = Vec::new();
    let mut failed_prongs = Vec::new();
    if let Some(prong_params) = &params.prongs {
        for outcome in build_prongs(ctx, rail, prong_params, params.rail.up)? {
            diagnostics.extend(outcome.diagnostics);
            match outcome.result {
                Ok(prong) => prongs.push(prong.brep),
                Err(err) => {
                    diagnostics.warn(format!("prong at t = {:.4} skipped: {err}", outcome.t));
                    failed_prongs.push(outcome.t);
                }
            }
        }
    }

    crate::debug_log!(
        "head built: {} rail frames, {} prongs, {} failed",
        rail_solid.frames.len(),
        prongs.len(),
        failed_prongs.len()
    );
    Ok(HeadBuild {
        rail: rail_solid.brep,
        rail_repair: rail_solid.repair,
        prongs,
        failed_prongs,
        params: params.clone(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Plane;
    use crate::kernel::PolylineKernel;
    use crate::library::ProfileCatalog;
    use crate::pipeline::BuildError;

    #[test]
    fn test_round_head_builds_rail_and_four_prongs() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let rail = Curve::circle(&Plane::WORLD_XY, 3.0, 96).unwrap();
        let build = build_head(&ctx, &rail, &HeadParams::default()).unwrap();
        assert!(build.rail.is_solid());
        assert_eq!(build.prongs.len(), 4);
        assert!(build.failed_prongs.is_empty());
        assert!(build.prongs.iter().all(Brep::is_solid));
        assert_eq!(build.solids().len(), 5);
    }

    #[test]
    fn test_rail_only_head() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let rail = Curve::circle(&Plane::WORLD_XY, 3.0, 96).unwrap();
        let params = HeadParams {
            prongs: None,
            ..HeadParams::default()
        };
        let build = build_head(&ctx, &rail, &params).unwrap();
        assert!(build.prongs.is_empty());
        assert!(build.diagnostics.is_clean());
    }

    #[test]
    fn test_unknown_rail_profile_fails_the_head() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let rail = Curve::circle(&Plane::WORLD_XY, 3.0, 96).unwrap();
        let params = HeadParams {
            rail: HeadRailParams {
                profile: "rouund".into(),
                ..HeadRailParams::default()
            },
            ..HeadParams::default()
        };
        let err = build_head(&ctx, &rail, &params).unwrap_err();
        assert!(matches!(err, BuildError::MissingProfile { suggestion: Some(ref s), .. } if s == "round"));
    }
}
