//! Ring shank: the ring design's slots swept round the finger.

use crate::geom::{Brep, Plane};
use crate::library::require_profile;
use crate::pipeline::{BuildContext, BuildResult, Diagnostics, ShellRepair, SlotSection, sweep_ring};

use super::ring_design::{RingDesign, SlotPosition};

#[derive(Debug, Clone, PartialEq)]
pub struct RingBuild {
    pub solid: Brep,
    pub design: RingDesign,
    pub frame: Plane,
    pub closed: bool,
    pub repair: ShellRepair,
    pub diagnostics: Diagnostics,
}

/// Builds the shank of `design`.
///
/// A closed design wraps round from `BottomStart`, whose section also closes
/// the loop, so `BottomEnd` is not swept separately. An open design sweeps
/// from bottom to bottom and is capped.
pub fn build_ring(ctx: &BuildContext<'_>, design: &RingDesign) -> BuildResult<RingBuild> {
    design.validate()?;
    let closed = design.is_closed();

    let mut slots = Vec::new();
    for (position, slot) in design.active_slots() {
        if closed && position == SlotPosition::BottomEnd {
            continue;
        }
        slots.push(SlotSection {
            angle: slot.angle,
            profile: require_profile(ctx.library, &slot.profile)?,
            width: slot.width,
            height: slot.height,
            rotation: slot.rotation,
            lateral_offset: slot.lateral_offset,
        });
    }

    let mut diagnostics = Diagnostics::new();
    let swept = sweep_ring(ctx, &design.plane, design.inner_radius, &slots, closed, &mut diagnostics)?;
    log::debug!("ring swept through {} slots, {:?}", swept.params.len(), swept.repair);

    Ok(RingBuild {
        solid: swept.brep,
        design: design.clone(),
        frame: design.plane,
        closed,
        repair: swept.repair,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ring_design::SlotUpdate;
    use crate::kernel::PolylineKernel;
    use crate::library::ProfileCatalog;
    use crate::pipeline::BuildError;

    #[test]
    fn test_default_ring_wraps_round_the_finger() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let design = RingDesign::default();
        let build = build_ring(&ctx, &design).unwrap();
        assert!(build.closed);
        assert_eq!(build.repair, ShellRepair::Joined);
        assert!(build.solid.is_solid());

        // Nothing reaches inside the finger beyond the chord sag of the rail.
        let to_local = design.plane.to_local();
        let nearest = build
            .solid
            .vertices
            .iter()
            .map(|p| {
                let local = to_local.apply_point(*p);
                local.x.hypot(local.y)
            })
            .fold(f64::INFINITY, f64::min);
        assert!(nearest > design.inner_radius - 1e-2, "{nearest}");
    }

    #[test]
    fn test_missing_slot_profile_is_an_error() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let mut design = RingDesign::default();
        design
            .update_section(
                SlotPosition::Top,
                &SlotUpdate {
                    profile: Some("comfrot".into()),
                    ..SlotUpdate::default()
                },
            )
            .unwrap();
        let err = build_ring(&ctx, &design).unwrap_err();
        assert!(matches!(err, BuildError::MissingProfile { .. }));
    }

    #[test]
    fn test_inactive_bottom_end_opens_the_ring() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::with_builtins();
        let ctx = BuildContext::new(&kernel, &library);
        let mut design = RingDesign::default();
        design
            .update_section(
                SlotPosition::BottomEnd,
                &SlotUpdate {
                    active: Some(false),
                    ..SlotUpdate::default()
                },
            )
            .unwrap();
        assert!(!design.is_closed());
        let build = build_ring(&ctx, &design).unwrap();
        assert!(!build.closed);
        assert_eq!(build.repair, ShellRepair::Capped);
        assert!(build.solid.is_solid());
    }
}
