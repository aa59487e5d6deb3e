//! Rail sampling and mitered section frames for head rails.

use crate::components::HeadRailParams;
use crate::geom::{Brep, Curve, Plane, Point3, Transform, Vec3};
use crate::kernel::LoftStyle;
use crate::library::require_profile;

use super::config::BuildContext;
use super::error::{BuildError, BuildResult, Diagnostics};
use super::offset::{RobustOffsetter, ZERO_OFFSET_EPS};
use super::seam::align_chain;
use super::shell::{ShellRepair, close_shell};

/// Section frame at one rail sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailFrame {
    /// Rail parameter of the sample.
    pub t: f64,
    /// Point on the rail.
    pub origin: Point3,
    /// Mitered tangent: the average of the inbound and outbound directions.
    pub tangent: Vec3,
    /// `tangent × up`, outward for a counter-clockwise rail.
    pub radial: Vec3,
    /// Up direction with its tangent component removed.
    pub up: Vec3,
    /// Manual shift along `radial`, used when the rail itself could not be offset.
    pub lateral_shift: f64,
}

impl RailFrame {
    /// Where the section center sits.
    #[must_use]
    pub fn position(&self) -> Point3 {
        self.origin + self.radial * self.lateral_shift
    }

    /// Section plane with X along `radial` and Y along `up`.
    ///
    /// Its normal is `radial × up`, which points back along the tangent.
    #[must_use]
    pub fn section_plane(&self) -> Plane {
        Plane::from_frame(self.position(), self.radial, self.up, self.radial.cross(self.up))
    }

    /// Places a local XY section (counter-clockwise) so that it runs
    /// counter-clockwise about the tangent.
    #[must_use]
    pub fn place(&self, section: &Curve) -> Curve {
        section.transformed(&self.section_plane().to_world()).reversed()
    }
}

/// Rail lofted from mitered cross-sections.
#[derive(Debug, Clone, PartialEq)]
pub struct RailSolid {
    pub brep: Brep,
    pub frames: Vec<RailFrame>,
    /// Placed sections, one per frame, as they were lofted.
    pub sections: Vec<Curve>,
    pub repair: ShellRepair,
}

/// Sample parameters on `rail`: the ends, every kink and an even spread whose
/// count grows with the rail length.
///
/// Sorted, with samples closer than the parameter tolerance merged. A closed
/// rail has no sample at 1, which coincides with 0.
#[must_use]
pub fn sample_parameters(ctx: &BuildContext<'_>, rail: &Curve) -> Vec<f64> {
    let config = &ctx.config;
    let closed = rail.is_closed();
    let count = ((rail.length() * config.rail_sample_density).ceil() as usize)
        .clamp(config.min_rail_samples, config.max_rail_samples.max(config.min_rail_samples));

    let mut params = vec![0.0];
    if !closed {
        params.push(1.0);
    }
    params.extend(ctx.kernel.discontinuities(rail));
    if closed {
        params.extend((1..count).map(|i| i as f64 / count as f64));
    } else if count > 1 {
        params.extend((1..count - 1).map(|i| i as f64 / (count - 1) as f64));
    }

    params.sort_by(f64::total_cmp);
    params.dedup_by(|a, b| (*a - *b).abs() <= config.parameter_tolerance);
    if closed {
        params.retain(|&t| t < 1.0 - config.parameter_tolerance);
    }
    params
}

/// Mitered frame at each of `params`. Samples without a tangent are dropped.
#[must_use]
pub fn rail_frames(rail: &Curve, up: Vec3, params: &[f64], lateral_shift: f64) -> Vec<RailFrame> {
    params
        .iter()
        .filter_map(|&t| frame_at(rail, up, t, lateral_shift))
        .collect()
}

fn frame_at(rail: &Curve, up: Vec3, t: f64, lateral_shift: f64) -> Option<RailFrame> {
    let tangent = match rail.tangents_at(t) {
        (Some(inbound), Some(outbound)) => (inbound + outbound).normalized().unwrap_or(inbound),
        (Some(single), None) | (None, Some(single)) => single,
        (None, None) => return None,
    };
    let up = up.reject_from(tangent).normalized().or_else(|| tangent.any_perpendicular())?;
    Some(RailFrame {
        t,
        origin: rail.point_at(t),
        tangent,
        radial: tangent.cross(up),
        up,
        lateral_shift,
    })
}

/// Centers `profile` on the origin, stretches it to `width` by `height` and
/// rotates it by `rotation` degrees about local Z.
#[must_use]
pub fn fit_section(profile: &Curve, width: f64, height: f64, rotation: f64) -> Option<Curve> {
    let bbox = profile.bbox();
    let size = bbox.size();
    if size.x <= f64::EPSILON || size.y <= f64::EPSILON {
        return None;
    }
    let center = bbox.center().to_vec3();
    let fit = Transform::rotate_z(rotation.to_radians())
        * Transform::scale(width / size.x, height / size.y, 1.0)
        * Transform::translate(-center);
    Some(profile.transformed(&fit))
}

/// Up direction for `rail`: the requested one, else the rail's plane normal
/// turned towards world +Z, else world +Z.
pub(crate) fn resolve_up(ctx: &BuildContext<'_>, rail: &Curve, requested: Option<Vec3>) -> BuildResult<Vec3> {
    if let Some(up) = requested {
        return up
            .normalized()
            .ok_or_else(|| BuildError::InvalidGeometry("rail up direction has zero length".into()));
    }
    Ok(ctx
        .kernel
        .best_fit_plane(rail)
        .map(|plane| if plane.z_axis.z < 0.0 { -plane.z_axis } else { plane.z_axis })
        .unwrap_or(Vec3::Z))
}

/// Offsets a closed rail in the plane normal to `up`. Returns the rail and the
/// lateral shift still to apply to the frames.
fn offset_rail(ctx: &BuildContext<'_>, rail: &Curve, up: Vec3, distance: f64, diagnostics: &mut Diagnostics) -> (Curve, f64) {
    if distance.abs() < ZERO_OFFSET_EPS {
        return (rail.clone(), 0.0);
    }
    let offset = rail
        .is_closed()
        .then(|| Plane::from_normal(rail.bbox().center(), up))
        .flatten()
        .and_then(|plane| {
            let local = rail.transformed(&plane.to_local());
            RobustOffsetter::new(ctx.kernel, ctx.tol())
                .offset(&local, distance)
                .map(|curve| curve.transformed(&plane.to_world()))
        });
    match offset {
        Some(path) => (path, 0.0),
        None => {
            if rail.is_closed() {
                diagnostics.warn(format!("rail offset of {distance} failed, shifting sections instead"));
            } else {
                log::debug!("open rail, offset of {distance} applied as a section shift");
            }
            (rail.clone(), distance)
        }
    }
}

/// Lofts the rail profile along `rail` through mitered frames.
///
/// A closed rail gives a closed loft that joins into a ring solid; an open
/// rail is capped at both ends.
pub fn build_rail_solid(
    ctx: &BuildContext<'_>,
    rail: &Curve,
    params: &HeadRailParams,
    diagnostics: &mut Diagnostics,
) -> BuildResult<RailSolid> {
    params.validate()?;
    if !rail.is_finite() {
        return Err(BuildError::InvalidGeometry("rail has non-finite coordinates".into()));
    }
    let up = resolve_up(ctx, rail, params.up)?;
    let profile = require_profile(ctx.library, &params.profile)?;
    let section = fit_section(&profile, params.width, params.height, params.rotation)
        .ok_or_else(|| BuildError::InvalidGeometry(format!("profile `{}` has no extent", params.profile)))?;

    let (path, lateral_shift) = offset_rail(ctx, rail, up, params.rail_offset, diagnostics);
    let frames = rail_frames(&path, up, &sample_parameters(ctx, &path), lateral_shift);
    if frames.len() < 2 {
        return Err(BuildError::InsufficientSamples { count: frames.len() });
    }
    log::debug!("rail sampled at {} frames", frames.len());

    let placed: Vec<Curve> = frames.iter().map(|frame| frame.place(&section)).collect();
    let (sections, _) = align_chain(ctx.kernel, &placed, ctx.tol());
    let patches = ctx
        .kernel
        .loft(&sections, LoftStyle::Straight, path.is_closed())
        .ok_or(BuildError::LoftFailed { stage: "rail" })?;
    let (brep, repair) = close_shell(ctx, patches, diagnostics)?;

    Ok(RailSolid {
        brep,
        frames,
        sections,
        repair,
    })
}
