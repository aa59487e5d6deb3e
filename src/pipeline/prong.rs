//! Prong axes radiating from a head rail, and the prong solids lofted along them.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::components::ProngParams;
use crate::geom::{Brep, Curve, Plane, Point3, Vec3};
use crate::kernel::LoftStyle;
use crate::library::require_profile;

use super::config::BuildContext;
use super::error::{BuildError, BuildResult, Diagnostics};
use super::rail::{fit_section, resolve_up};
use super::seam::align_chain;
use super::shell::{ShellRepair, close_shell};

/// Spatial axis of one prong, running from the bottom point up to the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ProngAxis {
    /// Rail parameter the prong stands at.
    pub t: f64,
    pub rail_point: Point3,
    /// Horizontal direction from the center through the rail point.
    pub radial: Vec3,
    pub top: Point3,
    pub mid: Point3,
    pub bottom: Point3,
    pub curve: Curve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProngSolid {
    pub brep: Brep,
    pub axis: ProngAxis,
    /// Number of lofted sections, 2 or 3.
    pub section_count: usize,
}

/// Result of one prong of a batch. A failed prong never affects its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProngOutcome {
    pub t: f64,
    pub result: BuildResult<ProngSolid>,
    pub diagnostics: Diagnostics,
}

/// Axis for the prong at rail parameter `t`.
///
/// Every level point sits `params.shift()` plus its level offset outward from
/// the rail point, at its height along `up`. `None` when the rail point and
/// tangent give no horizontal direction.
#[must_use]
pub fn prong_axis(rail: &Curve, t: f64, params: &ProngParams, center: Point3, up: Vec3) -> Option<ProngAxis> {
    let rail_point = rail.point_at(t);
    let radial = (rail_point - center)
        .reject_from(up)
        .normalized()
        .or_else(|| rail.tangent_at(t).and_then(|tangent| tangent.cross(up).normalized()))?;

    let shift = params.shift();
    let [top_offset, mid_offset, bottom_offset] = params.level_offsets;
    let level = |offset: f64, height: f64| rail_point + radial * (shift + offset) + up * height;
    let top = level(top_offset, params.top_height);
    let mid = level(mid_offset, params.mid_height);
    let bottom = level(bottom_offset, -params.bottom_depth);

    let curve = match Curve::interpolate(&[bottom, mid, top], 3) {
        Some(curve) => curve,
        None => {
            log::debug!("prong axis at t = {t} could not be interpolated, using a line");
            Curve::line(bottom, top)?
        }
    };
    Some(ProngAxis {
        t,
        rail_point,
        radial,
        top,
        mid,
        bottom,
        curve,
    })
}

/// Section plane at axis parameter `s`: normal along the axis, X as close to
/// `radial` as the tangent allows.
fn section_plane(axis: &ProngAxis, s: f64) -> Option<Plane> {
    let tangent = axis.curve.tangent_at(s)?;
    let x = axis
        .radial
        .reject_from(tangent)
        .normalized()
        .or_else(|| tangent.any_perpendicular())?;
    Some(Plane::from_frame(axis.curve.point_at(s), x, tangent.cross(x), tangent))
}

/// Builds the prong at rail parameter `t`: sections at both axis ends, plus
/// one at the mid point when it lies clear of the ends, lofted and capped.
pub fn build_prong(
    ctx: &BuildContext<'_>,
    rail: &Curve,
    t: f64,
    params: &ProngParams,
    center: Point3,
    up: Vec3,
    diagnostics: &mut Diagnostics,
) -> BuildResult<ProngSolid> {
    let axis = prong_axis(rail, t, params, center, up)
        .ok_or_else(|| BuildError::InvalidGeometry(format!("no prong direction at t = {t}")))?;
    let profile = require_profile(ctx.library, &params.profile)?;
    let section = fit_section(&profile, params.diameter, params.diameter, 0.0)
        .ok_or_else(|| BuildError::InvalidGeometry(format!("profile `{}` has no extent", params.profile)))?;

    let margin = ctx.config.prong_mid_margin;
    let s_mid = axis.curve.closest_parameter(axis.mid);
    let mut stations = vec![0.0];
    if s_mid > margin && s_mid < 1.0 - margin {
        stations.push(s_mid);
    } else {
        log::debug!("prong mid point at s = {s_mid} is too close to the axis ends, skipped");
    }
    stations.push(1.0);

    let placed = stations
        .iter()
        .map(|&s| section_plane(&axis, s).map(|plane| section.transformed(&plane.to_world())))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| BuildError::InvalidGeometry(format!("prong axis at t = {t} has no tangent")))?;
    let (sections, _) = align_chain(ctx.kernel, &placed, ctx.tol());
    let style = if sections.len() > 2 { LoftStyle::Smooth } else { LoftStyle::Straight };
    let patches = ctx
        .kernel
        .loft(&sections, style, false)
        .ok_or(BuildError::LoftFailed { stage: "prong" })?;

    match close_shell(ctx, patches, diagnostics)? {
        (brep, ShellRepair::Joined | ShellRepair::Capped) => Ok(ProngSolid {
            brep,
            axis,
            section_count: sections.len(),
        }),
        (_, ShellRepair::LargestFragment) => Err(BuildError::NotSolid),
    }
}

/// Builds every prong of `params` independently.
///
/// Prongs radiate from `params.center`, or from the center of the rail's
/// bounding box. With the `parallel` feature the prongs are built on the
/// rayon pool; the output keeps the order of `params.parameters()` either way.
pub fn build_prongs(ctx: &BuildContext<'_>, rail: &Curve, params: &ProngParams, up: Option<Vec3>) -> BuildResult<Vec<ProngOutcome>> {
    params.validate()?;
    let up = resolve_up(ctx, rail, up)?;
    let center = params.center.unwrap_or_else(|| rail.bbox().center());
    let outcomes = build_all(ctx, rail, params, center, up, params.parameters());
    for outcome in &outcomes {
        if let Err(err) = &outcome.result {
            log::warn!("prong at t = {} failed: {err}", outcome.t);
        }
    }
    Ok(outcomes)
}

fn build_one(ctx: &BuildContext<'_>, rail: &Curve, params: &ProngParams, center: Point3, up: Vec3, t: f64) -> ProngOutcome {
    let mut diagnostics = Diagnostics::new();
    let result = build_prong(ctx, rail, t, params, center, up, &mut diagnostics);
    ProngOutcome { t, result, diagnostics }
}

#[cfg(feature = "parallel")]
fn build_all(ctx: &BuildContext<'_>, rail: &Curve, params: &ProngParams, center: Point3, up: Vec3, ts: Vec<f64>) -> Vec<ProngOutcome> {
    ts.into_par_iter()
        .map(|t| build_one(ctx, rail, params, center, up, t))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn build_all(ctx: &BuildContext<'_>, rail: &Curve, params: &ProngParams, center: Point3, up: Vec3, ts: Vec<f64>) -> Vec<ProngOutcome> {
    ts.into_iter()
        .map(|t| build_one(ctx, rail, params, center, up, t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PolylineKernel;
    use crate::library::ProfileCatalog;
    use crate::pipeline::tests::support::{Faults, FaultyKernel};

    fn rail() -> Curve {
        Curve::circle(&Plane::WORLD_XY, 3.0, 64).unwrap()
    }

    fn params() -> ProngParams {
        ProngParams {
            diameter: 1.0,
            inside_fraction: 0.3,
            ..ProngParams::default()
        }
    }

    #[test]
    fn test_axis_points_sit_at_the_shift() {
        let prong = params();
        let axis = prong_axis(&rail(), 0.0, &prong, Point3::ORIGIN, Vec3::Z).unwrap();
        assert!((axis.radial - Vec3::X).length() < 1e-12);
        for (point, height) in [(axis.top, 2.0), (axis.mid, 0.8), (axis.bottom, -1.0)] {
            assert!((point.x - 3.2).abs() < 1e-12, "{point:?}");
            assert!((point.z - height).abs() < 1e-12);
        }
        assert!(axis.curve.start().distance_to(axis.bottom) < 1e-12);
        assert!(axis.curve.end().distance_to(axis.top) < 1e-12);
    }

    #[test]
    fn test_level_offsets_add_to_the_shift() {
        let prong = ProngParams {
            level_offsets: [0.3, 0.0, -0.1],
            ..params()
        };
        let axis = prong_axis(&rail(), 0.0, &prong, Point3::ORIGIN, Vec3::Z).unwrap();
        assert!((axis.top.x - 3.5).abs() < 1e-12);
        assert!((axis.mid.x - 3.2).abs() < 1e-12);
        assert!((axis.bottom.x - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_prong_is_a_capped_solid_with_mid_section() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let mut diagnostics = Diagnostics::new();
        let prong = build_prong(&ctx, &rail(), 0.25, &params(), Point3::ORIGIN, Vec3::Z, &mut diagnostics).unwrap();
        assert_eq!(prong.section_count, 3);
        assert!(prong.brep.is_solid());
        assert!(prong.brep.volume() > 0.0);
    }

    #[test]
    fn test_mid_at_the_end_is_skipped() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let prong = ProngParams {
            mid_height: -0.99,
            ..params()
        };
        let solid = build_prong(&ctx, &rail(), 0.0, &prong, Point3::ORIGIN, Vec3::Z, &mut Diagnostics::new()).unwrap();
        assert_eq!(solid.section_count, 2);
    }

    #[test]
    fn test_one_failing_prong_leaves_siblings() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        // The first prong stands on a vertical stretch right above the center,
        // where neither the center nor the tangent gives a direction.
        let rail = Curve::polyline(
            vec![Point3::ORIGIN, Point3::new(0.0, 0.0, 2.0), Point3::new(2.0, 0.0, 2.0)],
            false,
        )
        .unwrap();
        let prong = ProngParams {
            positions: vec![0.25, 0.75],
            center: Some(Point3::ORIGIN),
            ..params()
        };
        let outcomes = build_prongs(&ctx, &rail, &prong, Some(Vec3::Z)).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].result, Err(BuildError::InvalidGeometry(_))));
        assert!(outcomes[1].result.is_ok());
        assert!((outcomes[1].t - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_failing_loft_fails_each_prong() {
        let kernel = FaultyKernel::new(Faults {
            failing_loft: true,
            ..Faults::default()
        });
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let outcomes = build_prongs(&ctx, &rail(), &params(), None).unwrap();
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.result == Err(BuildError::LoftFailed { stage: "prong" })));
    }

    #[test]
    fn test_degenerate_direction_falls_back_to_tangent() {
        let line = Curve::line(Point3::ORIGIN, Point3::new(0.0, 4.0, 0.0)).unwrap();
        // Center on the rail point: direction comes from tangent × up.
        let axis = prong_axis(&line, 0.0, &params(), Point3::ORIGIN, Vec3::Z).unwrap();
        assert!((axis.radial - Vec3::X).length() < 1e-12);
    }
}
