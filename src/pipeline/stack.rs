//! Profile stacks for the bezel and gem cutter family.
//!
//! A stack is the ordered list of profiles a component is lofted through.
//! Every profile is kept flat at local z = 0 together with the height it is
//! placed at, so offsets always run in the frame's XY plane.

use std::fmt;

use crate::components::{BezelParams, GemCutterParams};
use crate::geom::{Curve, Plane, Transform, Vec3};
use crate::kernel::LoftStyle;
use crate::library::require_profile;

use super::config::BuildContext;
use super::error::{BuildError, BuildResult, Diagnostics};
use super::offset::RobustOffsetter;

/// Vertex count of generated circles.
const CIRCLE_SEGMENTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileRole {
    OuterBottom,
    OuterMid,
    OuterTop,
    InnerTop,
    Gap,
    SeatInner,
    InnerBottom,
    CutterTop,
    Girdle,
    SeatEnd,
    Tip,
}

impl fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OuterBottom => "outer-bottom",
            Self::OuterMid => "outer-mid",
            Self::OuterTop => "outer-top",
            Self::InnerTop => "inner-top",
            Self::Gap => "gap",
            Self::SeatInner => "seat-inner",
            Self::InnerBottom => "inner-bottom",
            Self::CutterTop => "cutter-top",
            Self::Girdle => "girdle",
            Self::SeatEnd => "seat-end",
            Self::Tip => "tip",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackEntry {
    pub role: ProfileRole,
    /// Flat profile at local z = 0.
    pub curve: Curve,
    pub z: f64,
}

impl StackEntry {
    /// The profile lifted to its height.
    #[must_use]
    pub fn placed(&self) -> Curve {
        self.curve.translated(Vec3::new(0.0, 0.0, self.z))
    }
}

/// Ordered profiles of one component. A closed stack lofts its last entry
/// back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStack {
    pub entries: Vec<StackEntry>,
    pub closed: bool,
    pub style: LoftStyle,
}

impl ProfileStack {
    #[must_use]
    pub fn new(closed: bool) -> Self {
        Self {
            entries: Vec::new(),
            closed,
            style: LoftStyle::Straight,
        }
    }

    pub fn push(&mut self, role: ProfileRole, curve: Curve, z: f64) {
        self.entries.push(StackEntry { role, curve, z });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, role: ProfileRole) -> Option<&StackEntry> {
        self.entries.iter().find(|e| e.role == role)
    }

    #[must_use]
    pub fn placed_curves(&self) -> Vec<Curve> {
        self.entries.iter().map(StackEntry::placed).collect()
    }

    /// Number of lofted transitions between consecutive entries.
    #[must_use]
    pub fn transition_count(&self) -> usize {
        match self.entries.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// Copy without entries that coincide with their predecessor, so no
    /// transition lofts a curve onto itself.
    #[must_use]
    pub fn without_coincident(&self, tol: f64) -> Self {
        let coincide = |a: &StackEntry, b: &StackEntry| {
            (a.z - b.z).abs() <= tol && a.curve.max_deviation_from(&b.curve) <= tol && b.curve.max_deviation_from(&a.curve) <= tol
        };
        let mut entries: Vec<StackEntry> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entries.last().is_some_and(|last| coincide(last, entry)) {
                log::debug!("dropping {} profile, it coincides with its predecessor", entry.role);
                continue;
            }
            entries.push(entry.clone());
        }
        if self.closed && entries.len() > 2 && coincide(&entries[entries.len() - 1], &entries[0]) {
            entries.pop();
        }
        Self {
            entries,
            closed: self.closed,
            style: self.style,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bezel
// ────────────────────────────────────────────────────────────────────────────

/// Derives the bezel stack from a canonical outline (local XY, counter-clockwise).
///
/// The stack is a closed cycle running up the outer wall, across the top rim,
/// down the inner wall to the seat ledge, down the bore and back across the
/// bottom, so consecutive lofts face outward.
pub fn build_bezel_stack(
    ctx: &BuildContext<'_>,
    outline: &Curve,
    params: &BezelParams,
    diagnostics: &mut Diagnostics,
) -> BuildResult<ProfileStack> {
    params.validate()?;
    let config = &ctx.config;
    let offsetter = RobustOffsetter::new(ctx.kernel, ctx.tol());

    let gap = offsetter
        .offset(outline, params.offset)
        .ok_or(BuildError::OffsetFailed { stage: "gap" })?;

    let outer_top = offsetter.offset(&gap, params.top_thickness).unwrap_or_else(|| {
        diagnostics.warn("outer-top offset failed, reusing the gap profile");
        gap.clone()
    });

    let outer_bottom = offsetter.offset(&outer_top, -params.chamfer).unwrap_or_else(|| {
        diagnostics.warn("chamfer offset failed, reusing the outer-top profile");
        outer_top.clone()
    });

    let seat_inner = match offsetter.offset(&gap, -params.seat_ledge) {
        Some(curve) => curve,
        None => match offsetter.offset(&gap, -config.seat_ledge_fallback) {
            Some(curve) => {
                diagnostics.warn(format!(
                    "seat ledge offset of {} failed, used {}",
                    params.seat_ledge, config.seat_ledge_fallback
                ));
                curve
            }
            None => {
                diagnostics.warn("seat ledge offset failed, reusing the gap profile");
                gap.clone()
            }
        },
    };

    let inner_bottom = offsetter.offset(&outer_bottom, -params.bottom_thickness).unwrap_or_else(|| {
        diagnostics.warn(format!(
            "inner-bottom offset failed, scaled outer-bottom by {}",
            config.inner_bottom_fallback_scale
        ));
        outer_bottom.scaled_about_center(config.inner_bottom_fallback_scale)
    });

    let (top, bottom) = (params.top_z(), params.bottom_z());
    let outer_mid = if params.bombing >= super::offset::ZERO_OFFSET_EPS {
        Some(bombing_profile(ctx, &outer_top, &outer_bottom, top, bottom, params.bombing)?)
    } else {
        None
    };

    let mut stack = ProfileStack::new(true);
    stack.push(ProfileRole::OuterBottom, outer_bottom, bottom);
    if let Some(mid) = outer_mid {
        stack.push(ProfileRole::OuterMid, mid, params.mid_z());
        stack.style = LoftStyle::Smooth;
    }
    stack.push(ProfileRole::OuterTop, outer_top, top);
    stack.push(ProfileRole::InnerTop, gap.clone(), top);
    stack.push(ProfileRole::Gap, gap, 0.0);
    stack.push(ProfileRole::SeatInner, seat_inner, 0.0);
    stack.push(ProfileRole::InnerBottom, inner_bottom, bottom);
    Ok(stack)
}

/// Outer-mid profile: the curve half way between outer-top and outer-bottom,
/// offset outward by the bombing distance.
fn bombing_profile(
    ctx: &BuildContext<'_>,
    outer_top: &Curve,
    outer_bottom: &Curve,
    top: f64,
    bottom: f64,
    bombing: f64,
) -> BuildResult<Curve> {
    let placed = [
        outer_bottom.translated(Vec3::new(0.0, 0.0, bottom)),
        outer_top.translated(Vec3::new(0.0, 0.0, top)),
    ];
    let (placed, _) = super::seam::align_profiles(ctx.kernel, &placed, ctx.tol());
    let patch = ctx
        .kernel
        .loft(&placed, LoftStyle::Straight, false)
        .and_then(|patches| patches.into_iter().next())
        .ok_or(BuildError::LoftFailed { stage: "bombing" })?;
    let tween = ctx
        .kernel
        .iso_curve(&patch, 0.5)
        .ok_or(BuildError::LoftFailed { stage: "bombing" })?;
    let flat = tween
        .projected(&Plane::WORLD_XY)
        .ok_or(BuildError::LoftFailed { stage: "bombing" })?;
    RobustOffsetter::new(ctx.kernel, ctx.tol())
        .offset(&flat, bombing)
        .ok_or(BuildError::OffsetFailed { stage: "outer-mid" })
}

// ────────────────────────────────────────────────────────────────────────────
// Gem cutter
// ────────────────────────────────────────────────────────────────────────────

/// Derives the four cutter sections from a canonical outline: the opening
/// above the crown, the girdle, the end of the seat and the pavilion tip.
pub fn build_cutter_stack(
    ctx: &BuildContext<'_>,
    outline: &Curve,
    params: &GemCutterParams,
    diagnostics: &mut Diagnostics,
) -> BuildResult<ProfileStack> {
    params.validate()?;
    let offsetter = RobustOffsetter::new(ctx.kernel, ctx.tol());
    let girdle = offsetter
        .offset(outline, params.clearance)
        .ok_or(BuildError::OffsetFailed { stage: "clearance" })?;
    let girdle = if (params.scale - 1.0).abs() > f64::EPSILON {
        girdle.transformed(&Transform::scale_about(outline.bbox().center(), params.scale, params.scale, 1.0))
    } else {
        girdle
    };

    let gem = &params.gem;
    let tip_width = params.bottom_diameter_pct * gem.size * params.scale;
    let tip = match params.head_profile.as_deref() {
        Some(name) => {
            let profile = require_profile(ctx.library, name)?;
            fit_width(&profile, tip_width).ok_or(BuildError::InvalidGeometry(format!("head profile `{name}` has no width")))?
        }
        None => Curve::circle(&Plane::WORLD_XY, tip_width * 0.5, CIRCLE_SEGMENTS)
            .ok_or(BuildError::InvalidParameter {
                name: "bottom_diameter_pct",
                value: params.bottom_diameter_pct,
            })?,
    };
    let tip = if params.profile_rotation.abs() > f64::EPSILON {
        tip.transformed(&Transform::rotate_z(params.profile_rotation.to_radians()))
    } else {
        tip
    };
    if gem.girdle_thickness() <= ctx.tol().eps {
        diagnostics.warn("girdle thickness is below tolerance, seat-end coincides with the girdle");
    }

    let mut stack = ProfileStack::new(false);
    stack.push(
        ProfileRole::CutterTop,
        girdle.clone(),
        gem.crown_height() + params.top_extension,
    );
    stack.push(ProfileRole::Girdle, girdle.clone(), 0.0);
    stack.push(ProfileRole::SeatEnd, girdle, -gem.girdle_thickness());
    stack.push(ProfileRole::Tip, tip, -(gem.girdle_thickness() + gem.pavilion_depth()));
    Ok(stack)
}

/// Uniform scale about the bounding box center so the larger of the X and Y
/// extents becomes `width`, recentered on the local origin.
fn fit_width(profile: &Curve, width: f64) -> Option<Curve> {
    let bbox = profile.bbox();
    let size = bbox.size();
    let extent = size.x.max(size.y);
    if extent <= f64::EPSILON {
        return None;
    }
    let factor = width / extent;
    let center = bbox.center();
    let moved = profile.translated(Vec3::new(-center.x, -center.y, -center.z));
    Some(moved.transformed(&Transform::scale(factor, factor, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point3;
    use crate::kernel::PolylineKernel;
    use crate::library::ProfileCatalog;
    use crate::pipeline::tests::support::{Faults, FaultyKernel};

    fn outline() -> Curve {
        Curve::circle(&Plane::WORLD_XY, 2.5, 96).unwrap()
    }

    fn radius(curve: &Curve) -> f64 {
        curve.bbox().size().x * 0.5
    }

    #[test]
    fn test_bezel_stack_radii_and_levels() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let mut diagnostics = Diagnostics::new();
        let params = BezelParams::default();
        let stack = build_bezel_stack(&ctx, &outline(), &params, &mut diagnostics).unwrap();
        assert!(diagnostics.is_clean(), "{diagnostics}");
        assert_eq!(stack.len(), 6);
        assert!(stack.closed);

        let r = |role| radius(&stack.get(role).unwrap().curve);
        assert!((r(ProfileRole::Gap) - 2.6).abs() < 1e-2);
        assert!((r(ProfileRole::OuterTop) - 3.4).abs() < 1e-2);
        assert!((r(ProfileRole::OuterBottom) - 3.4).abs() < 1e-2);
        assert!((r(ProfileRole::SeatInner) - 2.4).abs() < 1e-2);
        assert!((r(ProfileRole::InnerBottom) - 2.6).abs() < 1e-2);

        let z = |role| stack.get(role).unwrap().z;
        assert!((z(ProfileRole::OuterTop) - 0.6).abs() < 1e-12);
        assert!((z(ProfileRole::OuterBottom) + 1.4).abs() < 1e-12);
        assert_eq!(z(ProfileRole::SeatInner), 0.0);
    }

    #[test]
    fn test_bombing_inserts_outer_mid() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let params = BezelParams {
            chamfer: 0.2,
            bombing: 0.15,
            ..BezelParams::default()
        };
        let stack = build_bezel_stack(&ctx, &outline(), &params, &mut Diagnostics::new()).unwrap();
        assert_eq!(stack.len(), 7);
        let mid = stack.get(ProfileRole::OuterMid).unwrap();
        assert!((mid.z - params.mid_z()).abs() < 1e-12);
        // Half way between 3.4 and 3.2, pushed out by the bombing distance.
        assert!((radius(&mid.curve) - 3.45).abs() < 1e-2);
        assert_eq!(stack.style, LoftStyle::Smooth);
    }

    #[test]
    fn test_inner_bottom_falls_back_to_scaled_duplicate() {
        let kernel = FaultyKernel::new(Faults {
            failing_inward_offsets: true,
            ..Faults::default()
        });
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let mut diagnostics = Diagnostics::new();
        let stack = build_bezel_stack(&ctx, &outline(), &BezelParams::default(), &mut diagnostics).unwrap();
        let outer_bottom = radius(&stack.get(ProfileRole::OuterBottom).unwrap().curve);
        let inner_bottom = radius(&stack.get(ProfileRole::InnerBottom).unwrap().curve);
        assert!((inner_bottom - outer_bottom * 0.9).abs() < 1e-9);
        // The seat ledge ends up on the gap profile after both retries fail.
        let gap = &stack.get(ProfileRole::Gap).unwrap().curve;
        assert_eq!(&stack.get(ProfileRole::SeatInner).unwrap().curve, gap);
        assert_eq!(diagnostics.warnings.len(), 2);
    }

    #[test]
    fn test_failed_gap_offset_fails_the_build() {
        let kernel = FaultyKernel::new(Faults {
            open_offsets: true,
            ..Faults::default()
        });
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        assert_eq!(
            build_bezel_stack(&ctx, &outline(), &BezelParams::default(), &mut Diagnostics::new()),
            Err(BuildError::OffsetFailed { stage: "gap" })
        );

        let kernel = PolylineKernel::default();
        let ctx = BuildContext::new(&kernel, &library);
        let bad = BezelParams {
            top_thickness: 0.0,
            ..BezelParams::default()
        };
        assert!(matches!(
            build_bezel_stack(&ctx, &outline(), &bad, &mut Diagnostics::new()),
            Err(BuildError::InvalidParameter { name: "top_thickness", .. })
        ));
    }

    #[test]
    fn test_cutter_stack_depths() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let params = GemCutterParams::default();
        let outline = Curve::circle(&Plane::WORLD_XY, params.gem.size * 0.5, 96).unwrap();
        let stack = build_cutter_stack(&ctx, &outline, &params, &mut Diagnostics::new()).unwrap();
        assert_eq!(stack.len(), 4);
        assert!(!stack.closed);
        let gem = params.gem;
        let tip = stack.get(ProfileRole::Tip).unwrap();
        assert!((tip.z + gem.girdle_thickness() + gem.pavilion_depth()).abs() < 1e-12);
        assert!((tip.curve.bbox().size().x - 0.3 * gem.size).abs() < 1e-2);
        let girdle = stack.get(ProfileRole::Girdle).unwrap();
        assert!((radius(&girdle.curve) - (gem.size * 0.5 + params.clearance)).abs() < 1e-2);
    }

    #[test]
    fn test_cutter_tip_uses_library_profile() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let params = GemCutterParams {
            head_profile: Some("Square".into()),
            profile_rotation: 45.0,
            ..GemCutterParams::default()
        };
        let outline = Curve::circle(&Plane::WORLD_XY, 3.0, 96).unwrap();
        let stack = build_cutter_stack(&ctx, &outline, &params, &mut Diagnostics::new()).unwrap();
        let tip = &stack.get(ProfileRole::Tip).unwrap().curve;
        let side = 0.3 * params.gem.size;
        // A square rotated by 45 degrees spans its diagonal.
        assert!((tip.bbox().size().x - side * 2f64.sqrt()).abs() < 1e-9);

        let missing = GemCutterParams {
            head_profile: Some("sqare".into()),
            ..GemCutterParams::default()
        };
        assert!(matches!(
            build_cutter_stack(&ctx, &outline, &missing, &mut Diagnostics::new()),
            Err(BuildError::MissingProfile { .. })
        ));
    }

    #[test]
    fn test_fit_width_scales_the_larger_extent() {
        let tall = Curve::rectangle(&Plane::WORLD_XY.with_origin(Point3::new(3.0, 1.0, 0.0)), 1.0, 2.0).unwrap();
        let fitted = fit_width(&tall, 4.0).unwrap();
        let bbox = fitted.bbox();
        assert!((bbox.size().x - 2.0).abs() < 1e-9);
        assert!((bbox.size().y - 4.0).abs() < 1e-9);
        assert!(bbox.center().distance_to(Point3::ORIGIN) < 1e-9);
    }

    #[test]
    fn test_coincident_entries_are_dropped() {
        let mut stack = ProfileStack::new(true);
        let c = outline();
        stack.push(ProfileRole::OuterBottom, c.clone(), -1.0);
        stack.push(ProfileRole::OuterTop, c.clone(), 1.0);
        stack.push(ProfileRole::InnerTop, c.scaled_about_center(0.5), 1.0);
        stack.push(ProfileRole::Gap, c.scaled_about_center(0.5), 1.0);
        stack.push(ProfileRole::InnerBottom, c.clone(), -1.0);
        let cleaned = stack.without_coincident(1e-3);
        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned.transition_count(), 3);
    }
}
