//! Ring slots: independently shaped sections placed around a circular rail
//! and swept into the ring band.

use std::f64::consts::TAU;

use crate::geom::{Brep, Curve, Plane, Vec3};

use super::config::BuildContext;
use super::error::{BuildError, BuildResult, Diagnostics};
use super::rail::{fit_section, rail_frames};
use super::seam::align_profiles;
use super::shell::{ShellRepair, outward};

/// Vertices of the circular rail.
const RAIL_SEGMENTS: usize = 128;

/// Alternate tolerance factor for rejoining naked edges of a closed band.
const RELAXED_JOIN_FACTOR: f64 = 10.0;

/// One slot ready for mapping: a raw library profile and how to fit it.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSection {
    /// Angle on the rail in radians, measured from the bottom.
    pub angle: f64,
    pub profile: Curve,
    /// Extent along the finger axis.
    pub width: f64,
    /// Extent outward from the rail.
    pub height: f64,
    /// Degrees about the section normal.
    pub rotation: f64,
    /// Shift along the finger axis.
    pub lateral_offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweptRing {
    pub brep: Brep,
    pub rail: Curve,
    /// Sections in world space, in sweep order.
    pub sections: Vec<Curve>,
    /// Rail parameter of each section (`angle / 2π`).
    pub params: Vec<f64>,
    pub closed: bool,
    pub repair: ShellRepair,
}

/// Regularizes a slot profile before sweeping.
///
/// A curve without kinks is rebuilt at a fixed resolution. Otherwise every
/// continuous segment is rebuilt on its own, with a point count that grows
/// with its length, so corners survive for face splitting.
#[must_use]
pub fn smart_rebuild(ctx: &BuildContext<'_>, curve: &Curve) -> Curve {
    let config = &ctx.config;
    let tol = ctx.tol();
    let simplified = curve.simplified(tol);
    let kinks = ctx.kernel.discontinuities(&simplified);
    if kinks.is_empty() {
        return simplified.rebuilt(config.smooth_rebuild_points, 3);
    }

    let segments: Vec<Curve> = simplified
        .split_at(&kinks, tol)
        .iter()
        .map(|segment| {
            let count = ((segment.length() * config.segment_points_per_unit).ceil() as usize)
                .clamp(config.segment_points_min, config.segment_points_max);
            segment.rebuilt(count, 3)
        })
        .collect();
    match Curve::join(&segments, tol) {
        Some(joined) if joined.is_closed() == simplified.is_closed() => joined,
        _ => {
            log::debug!("rebuilt segments did not rejoin, keeping the simplified profile");
            simplified
        }
    }
}

/// Slot profile in section coordinates: X along the finger axis, Y outward,
/// with its lowest point on the rail.
fn slot_profile(ctx: &BuildContext<'_>, slot: &SlotSection) -> BuildResult<Curve> {
    let rebuilt = smart_rebuild(ctx, &slot.profile);
    let fitted = fit_section(&rebuilt, slot.width, slot.height, slot.rotation)
        .ok_or_else(|| BuildError::InvalidGeometry(format!("slot profile at {:.3} rad has no extent", slot.angle)))?;
    let floor = fitted.bbox().min.y;
    Ok(fitted.translated(Vec3::new(slot.lateral_offset, -floor, 0.0)))
}

/// Maps every slot onto a circle of `inner_radius` in `plane` and sweeps them.
///
/// `plane.x_axis` points at the bottom of the ring and the normal is the
/// finger axis; the rail starts at the bottom and runs counter-clockwise. A
/// closed sweep wraps round; an open one is capped at both ends.
pub fn sweep_ring(
    ctx: &BuildContext<'_>,
    plane: &Plane,
    inner_radius: f64,
    slots: &[SlotSection],
    closed: bool,
    diagnostics: &mut Diagnostics,
) -> BuildResult<SweptRing> {
    if !(inner_radius.is_finite() && inner_radius > 0.0) {
        return Err(BuildError::InvalidParameter {
            name: "inner_radius",
            value: inner_radius,
        });
    }
    if slots.is_empty() {
        return Err(BuildError::InsufficientSamples { count: 0 });
    }
    let rail = Curve::circle(plane, inner_radius, RAIL_SEGMENTS)
        .ok_or_else(|| BuildError::InvalidGeometry("ring rail is degenerate".into()))?;
    let finger_axis = plane.normal();

    let mut ordered: Vec<(f64, &SlotSection)> = slots
        .iter()
        .map(|slot| {
            let t = slot.angle / TAU;
            (if closed { t.rem_euclid(1.0) } else { t.clamp(0.0, 1.0) }, slot)
        })
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut params: Vec<f64> = Vec::with_capacity(ordered.len());
    let mut local = Vec::with_capacity(ordered.len());
    for (t, slot) in ordered {
        if params.last().is_some_and(|last| (t - last).abs() <= ctx.config.parameter_tolerance) {
            diagnostics.warn(format!("slot at {:.3} rad coincides with its neighbour, skipped", slot.angle));
            continue;
        }
        params.push(t);
        local.push(slot_profile(ctx, slot)?);
    }
    let (local, _) = align_profiles(ctx.kernel, &local, ctx.tol());

    let frames = rail_frames(&rail, finger_axis, &params, 0.0);
    if frames.len() != local.len() {
        return Err(BuildError::InvalidGeometry("ring rail has no tangent at a slot".into()));
    }
    let sections: Vec<Curve> = frames
        .iter()
        .zip(&local)
        .map(|(frame, profile)| {
            let section_plane = Plane::from_frame(frame.position(), frame.up, frame.radial, frame.tangent);
            profile.transformed(&section_plane.to_world())
        })
        .collect();
    log::debug!("sweeping {} ring sections, closed = {closed}", sections.len());

    let swept = ctx
        .kernel
        .sweep_along_rail(&rail, &sections, &params, closed)
        .ok_or(BuildError::SweepFailed)?;
    let (brep, repair) = finish_sweep(ctx, &Brep::merged(&swept), closed)?;

    Ok(SweptRing {
        brep,
        rail,
        sections,
        params,
        closed,
        repair,
    })
}

/// Standardizes the swept band, splits faces at kinks and rejoins naked edges.
/// A band that is still open gets one more chance: a looser join when it wraps
/// round, planar caps when it does not.
fn finish_sweep(ctx: &BuildContext<'_>, swept: &Brep, closed: bool) -> BuildResult<(Brep, ShellRepair)> {
    let tol = ctx.tol();
    let kernel = ctx.kernel;
    let brep = kernel.standardize(swept, tol);
    let brep = kernel.split_kinky_faces(&brep, ctx.config.kink_radians());
    let brep = kernel.join_naked_edges(&brep, tol);
    if brep.is_closed() {
        return Ok((outward(brep), ShellRepair::Joined));
    }

    if closed {
        log::debug!("swept band is open, rejoining naked edges at {}x tolerance", RELAXED_JOIN_FACTOR);
        let relaxed = kernel.join_naked_edges(&brep, tol.scaled(RELAXED_JOIN_FACTOR));
        if relaxed.is_closed() {
            return Ok((outward(relaxed), ShellRepair::Joined));
        }
    } else {
        log::debug!("capping the ends of the open band");
        if let Some(capped) = kernel.cap_planar_holes(&brep, tol).filter(Brep::is_closed) {
            return Ok((outward(capped), ShellRepair::Capped));
        }
    }
    Err(BuildError::NotSolid)
}
