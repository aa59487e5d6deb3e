//! Lofting profile stacks into shells and closing them into solids.

use crate::geom::Brep;

use super::config::BuildContext;
use super::error::{BuildError, BuildResult, Diagnostics};
use super::seam::align_chain;
use super::stack::ProfileStack;

/// How the assembled Brep was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellRepair {
    /// Joining the patches produced a solid.
    Joined,
    /// Planar capping closed the joined shell.
    Capped,
    /// Nothing closed; the largest fragment by area was kept.
    LargestFragment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledShell {
    pub brep: Brep,
    pub repair: ShellRepair,
    /// Lofted transitions that made it into the shell.
    pub patch_count: usize,
}

impl AssembledShell {
    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.brep.is_solid()
    }
}

/// Lofts every transition of `stack` and closes the result.
///
/// The whole stack is seam-aligned once, up front, and every transition lofts
/// those curves as they are: the closing transition of a cycle reuses the
/// first profile's seam, so lofts sharing a profile share its vertices. A failed transition is skipped with a warning; only a stack
/// where every loft fails is an error.
pub fn assemble_stack(ctx: &BuildContext<'_>, stack: &ProfileStack, diagnostics: &mut Diagnostics) -> BuildResult<AssembledShell> {
    let stack = stack.without_coincident(ctx.tol().eps);
    if stack.len() < 2 {
        return Err(BuildError::LoftFailed { stage: "stack" });
    }
    let (curves, _) = align_chain(ctx.kernel, &stack.placed_curves(), ctx.tol());

    let pairs = (0..stack.transition_count()).map(|i| (i, (i + 1) % curves.len()));
    let mut patches = Vec::with_capacity(stack.transition_count());
    for (a, b) in pairs {
        match ctx.kernel.loft(&[curves[a].clone(), curves[b].clone()], stack.style, false) {
            Some(mut lofted) => patches.append(&mut lofted),
            None => diagnostics.warn(format!(
                "loft between {} and {} failed, transition skipped",
                stack.entries[a].role, stack.entries[b].role
            )),
        }
    }
    if patches.is_empty() {
        return Err(BuildError::LoftFailed { stage: "transition" });
    }
    let patch_count = patches.len();
    close_shell(ctx, patches, diagnostics).map(|(brep, repair)| AssembledShell {
        brep,
        repair,
        patch_count,
    })
}

/// Joins `patches`, caps planar holes when the join is open and falls back to
/// the largest fragment. Closed results are turned outward.
pub fn close_shell(
    ctx: &BuildContext<'_>,
    patches: Vec<Brep>,
    diagnostics: &mut Diagnostics,
) -> BuildResult<(Brep, ShellRepair)> {
    let tol = ctx.tol();
    let fragments = match ctx.kernel.join_surfaces(&patches, tol) {
        Some(joined) => joined,
        None => {
            diagnostics.warn("joining shell patches failed, using the patches as they are");
            patches
        }
    };

    if let Some(solid) = largest_by_volume(fragments.iter().filter(|b| is_closed_volume(b)).cloned()) {
        return Ok((outward(solid), ShellRepair::Joined));
    }

    log::debug!("joined shell is open, capping planar holes of {} fragments", fragments.len());
    let capped = fragments.iter().filter_map(|b| ctx.kernel.cap_planar_holes(b, tol));
    if let Some(solid) = largest_by_volume(capped.filter(is_closed_volume)) {
        return Ok((outward(solid), ShellRepair::Capped));
    }

    let best = fragments
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .ok_or(BuildError::NotSolid)?;
    diagnostics.warn("shell could not be closed, kept the largest fragment");
    Ok((best, ShellRepair::LargestFragment))
}

fn is_closed_volume(brep: &Brep) -> bool {
    brep.is_closed() && brep.volume().abs() > 0.0
}

fn largest_by_volume(breps: impl Iterator<Item = Brep>) -> Option<Brep> {
    breps.max_by(|a, b| a.volume().abs().total_cmp(&b.volume().abs()))
}

pub(super) fn outward(brep: Brep) -> Brep {
    if brep.volume() < 0.0 {
        log::debug!("solid is inside out, flipping");
        brep.flipped()
    } else {
        brep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Curve, Plane, Transform, Vec3};
    use crate::kernel::{GeometryKernel, LoftStyle, PolylineKernel};
    use crate::library::ProfileCatalog;
    use crate::pipeline::stack::ProfileRole;
    use crate::pipeline::tests::support::{Faults, FaultyKernel};

    fn ring_stack() -> ProfileStack {
        let outer = Curve::circle(&Plane::WORLD_XY, 2.0, 48).unwrap();
        let inner = Curve::circle(&Plane::WORLD_XY, 1.0, 48).unwrap();
        let mut stack = ProfileStack::new(true);
        stack.push(ProfileRole::OuterBottom, outer.clone(), 0.0);
        stack.push(ProfileRole::OuterTop, outer, 1.0);
        stack.push(ProfileRole::InnerTop, inner.clone(), 1.0);
        stack.push(ProfileRole::InnerBottom, inner, 0.0);
        stack
    }

    #[test]
    fn test_closed_cycle_joins_into_outward_solid() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::default();
        let ctx = BuildContext::new(&kernel, &library);
        let mut diagnostics = Diagnostics::new();
        let shell = assemble_stack(&ctx, &ring_stack(), &mut diagnostics).unwrap();
        assert_eq!(shell.repair, ShellRepair::Joined);
        assert_eq!(shell.patch_count, 4);
        assert!(shell.is_solid());
        // Annulus of radii 2 and 1, one unit tall, polygonal.
        let expected = std::f64::consts::PI * 3.0;
        assert!((shell.brep.volume() - expected).abs() / expected < 0.01);
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn test_differently_sampled_walls_still_join() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::default();
        let ctx = BuildContext::new(&kernel, &library);
        // Inner wall with its own sampling, turned half a segment: its start
        // sits on no outer radius, so the closing transition only joins when
        // it keeps the outer wall's seam.
        let outer = Curve::circle(&Plane::WORLD_XY, 2.0, 64).unwrap();
        let inner = Curve::circle(&Plane::WORLD_XY, 1.6, 40)
            .unwrap()
            .transformed(&Transform::rotate_z(std::f64::consts::TAU / 80.0));
        let mut stack = ProfileStack::new(true);
        stack.push(ProfileRole::OuterBottom, outer.clone(), 0.0);
        stack.push(ProfileRole::OuterTop, outer, 1.0);
        stack.push(ProfileRole::InnerTop, inner.clone(), 1.0);
        stack.push(ProfileRole::InnerBottom, inner, 0.0);

        let mut diagnostics = Diagnostics::new();
        let shell = assemble_stack(&ctx, &stack, &mut diagnostics).unwrap();
        assert_eq!(shell.repair, ShellRepair::Joined);
        assert!(shell.brep.is_closed());
        assert!(shell.is_solid());
        let expected = std::f64::consts::PI * (4.0 - 1.6 * 1.6);
        assert!((shell.brep.volume() - expected).abs() / expected < 0.01);
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn test_open_chain_is_capped_and_flipped() {
        let kernel = PolylineKernel::default();
        let library = ProfileCatalog::default();
        let ctx = BuildContext::new(&kernel, &library);
        let top = Curve::circle(&Plane::WORLD_XY, 1.0, 32).unwrap();
        let mut stack = ProfileStack::new(false);
        stack.push(ProfileRole::Girdle, top.clone(), 1.0);
        stack.push(ProfileRole::Tip, top.scaled_about_center(0.5), 0.0);
        let shell = assemble_stack(&ctx, &stack, &mut Diagnostics::new()).unwrap();
        assert_eq!(shell.repair, ShellRepair::Capped);
        assert!(shell.is_solid());
    }

    #[test]
    fn test_open_shell_keeps_largest_fragment() {
        let kernel = FaultyKernel::new(Faults {
            failing_cap: true,
            ..Faults::default()
        });
        let library = ProfileCatalog::default();
        let ctx = BuildContext::new(&kernel, &library);
        let c = Curve::circle(&Plane::WORLD_XY, 1.0, 32).unwrap();
        let big = kernel
            .loft(&[c.clone(), c.translated(Vec3::new(0.0, 0.0, 3.0))], LoftStyle::Straight, false)
            .unwrap();
        let small = kernel
            .loft(
                &[c.translated(Vec3::new(5.0, 0.0, 0.0)), c.translated(Vec3::new(5.0, 0.0, 1.0))],
                LoftStyle::Straight,
                false,
            )
            .unwrap();
        let mut diagnostics = Diagnostics::new();
        let (brep, repair) = close_shell(&ctx, [small, big.clone()].concat(), &mut diagnostics).unwrap();
        assert_eq!(repair, ShellRepair::LargestFragment);
        assert!((brep.area() - big[0].area()).abs() < 1e-9);
        assert_eq!(diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_failing_lofts_fail_the_assembly() {
        let kernel = FaultyKernel::new(Faults {
            failing_loft: true,
            ..Faults::default()
        });
        let library = ProfileCatalog::default();
        let ctx = BuildContext::new(&kernel, &library);
        assert_eq!(
            assemble_stack(&ctx, &ring_stack(), &mut Diagnostics::new()),
            Err(BuildError::LoftFailed { stage: "transition" })
        );
    }
}
