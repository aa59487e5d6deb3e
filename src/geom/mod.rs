mod brep;
mod core;
mod curve;
mod plane;

pub use brep::{Brep, BrepFace, EdgeKey};
pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use curve::Curve;
pub use plane::Plane;

pub(crate) use brep::polygon_edges;
pub(crate) use curve::catmull_rom;
