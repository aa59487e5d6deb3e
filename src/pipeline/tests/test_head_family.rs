use crate::components::{HeadParams, HeadRailParams, ProngParams, build_head};
use crate::geom::{Curve, Plane, Point3};
use crate::kernel::{GeometryKernel, PolylineKernel};
use crate::library::ProfileCatalog;
use crate::pipeline::{BuildContext, BuildError, Diagnostics, ShellRepair, build_rail_solid, sample_parameters};

use super::support::{Faults, FaultyKernel};

fn rectangle() -> Curve {
    Curve::rectangle(&Plane::WORLD_XY, 8.0, 6.0).unwrap()
}

#[test]
fn rectangular_rail_samples_every_corner() {
    let kernel = PolylineKernel::default();
    let library = ProfileCatalog::with_builtins();
    let ctx = BuildContext::new(&kernel, &library);
    let rail = rectangle();
    let params = sample_parameters(&ctx, &rail);
    let corners = kernel.discontinuities(&rail);
    assert_eq!(corners.len(), 4);
    for corner in corners {
        assert!(params.iter().any(|t| (t - corner).abs() < 1e-9), "corner {corner} not sampled");
    }
    assert!(params.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn rectangular_head_builds_rail_and_prongs() {
    let kernel = PolylineKernel::default();
    let library = ProfileCatalog::with_builtins();
    let ctx = BuildContext::new(&kernel, &library);
    let build = build_head(&ctx, &rectangle(), &HeadParams::default()).unwrap();
    assert!(build.rail.is_solid());
    assert_eq!(build.rail_repair, ShellRepair::Joined);
    assert_eq!(build.prongs.len(), 4);
    assert!(build.failed_prongs.is_empty());
}

#[test]
fn rail_offset_moves_the_rail_outward() {
    let kernel = PolylineKernel::default();
    let library = ProfileCatalog::with_builtins();
    let ctx = BuildContext::new(&kernel, &library);
    let params = HeadRailParams {
        rail_offset: 0.5,
        ..HeadRailParams::default()
    };
    let solid = build_rail_solid(&ctx, &rectangle(), &params, &mut Diagnostics::new()).unwrap();
    let bbox = solid.brep.bbox().unwrap();
    // Offset path half way plus half the section width.
    assert!((bbox.max.x - 4.9).abs() < 1e-2, "{}", bbox.max.x);
    assert!((bbox.max.y - 3.9).abs() < 1e-2, "{}", bbox.max.y);
}

#[test]
fn open_arc_head_is_capped() {
    let kernel = PolylineKernel::default();
    let library = ProfileCatalog::with_builtins();
    let ctx = BuildContext::new(&kernel, &library);
    let arc: Vec<Point3> = (0..=32)
        .map(|i| {
            let a = std::f64::consts::PI * f64::from(i) / 32.0;
            Point3::new(3.0 * a.cos(), 3.0 * a.sin(), 0.0)
        })
        .collect();
    let rail = Curve::polyline(arc, false).unwrap();
    let params = HeadParams {
        prongs: Some(ProngParams {
            positions: vec![0.25, 0.5, 0.75],
            ..ProngParams::default()
        }),
        ..HeadParams::default()
    };
    let build = build_head(&ctx, &rail, &params).unwrap();
    assert_eq!(build.rail_repair, ShellRepair::Capped);
    assert!(build.rail.is_solid());
    assert_eq!(build.prongs.len(), 3);
}

#[test]
fn failing_loft_fails_the_head_at_the_rail() {
    let kernel = FaultyKernel::new(Faults {
        failing_loft: true,
        ..Faults::default()
    });
    let library = ProfileCatalog::with_builtins();
    let ctx = BuildContext::new(&kernel, &library);
    let err = build_head(&ctx, &rectangle(), &HeadParams::default()).unwrap_err();
    assert_eq!(err, BuildError::LoftFailed { stage: "rail" });
}
