//! Oriented planes used as local working frames.
//!
//! A [`Plane`] is an origin plus a right-handed orthonormal basis. The Z axis
//! is the plane normal; it is the "up" direction for offsetting and stacking.

use serde::{Deserialize, Serialize};

use super::core::{Point3, Transform, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
}

impl Plane {
    /// World XY plane at the origin.
    pub const WORLD_XY: Self = Self {
        origin: Point3::ORIGIN,
        x_axis: Vec3::X,
        y_axis: Vec3::Y,
        z_axis: Vec3::Z,
    };

    /// Builds a plane from an origin and two in-plane directions.
    ///
    /// `y_hint` only needs to be non-parallel to `x_axis`; it is
    /// re-orthogonalized. Returns `None` for zero-length or parallel inputs.
    #[must_use]
    pub fn new(origin: Point3, x_axis: Vec3, y_hint: Vec3) -> Option<Self> {
        let x = x_axis.normalized()?;
        let z = x.cross(y_hint).normalized()?;
        let y = z.cross(x);
        Some(Self {
            origin,
            x_axis: x,
            y_axis: y,
            z_axis: z,
        })
    }

    /// Plane through `origin` with the given normal and an arbitrary X axis.
    #[must_use]
    pub fn from_normal(origin: Point3, normal: Vec3) -> Option<Self> {
        let z = normal.normalized()?;
        let x = z.any_perpendicular()?;
        Some(Self {
            origin,
            x_axis: x,
            y_axis: z.cross(x),
            z_axis: z,
        })
    }

    /// Plane with explicit, already orthonormal axes.
    #[must_use]
    pub const fn from_frame(origin: Point3, x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        }
    }

    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.z_axis
    }

    #[must_use]
    pub fn with_origin(self, origin: Point3) -> Self {
        Self { origin, ..self }
    }

    /// Same plane seen from the other side (X kept, Y and Z reversed).
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            y_axis: -self.y_axis,
            z_axis: -self.z_axis,
            ..self
        }
    }

    /// Local plane coordinates to world coordinates.
    #[must_use]
    pub fn to_world(&self) -> Transform {
        Transform::from_axes(self.origin, self.x_axis, self.y_axis, self.z_axis)
    }

    /// World coordinates to local plane coordinates.
    ///
    /// The basis is orthonormal, so this is the transpose of [`Plane::to_world`].
    #[must_use]
    pub fn to_local(&self) -> Transform {
        let o = self.origin.to_vec3();
        let (x, y, z) = (self.x_axis, self.y_axis, self.z_axis);
        Transform::from_axes(
            Point3::new(-x.dot(o), -y.dot(o), -z.dot(o)),
            Vec3::new(x.x, y.x, z.x),
            Vec3::new(x.y, y.y, z.y),
            Vec3::new(x.z, y.z, z.z),
        )
    }

    /// World point from local `(u, v, w)`.
    #[must_use]
    pub fn point_at(&self, u: f64, v: f64, w: f64) -> Point3 {
        self.origin + self.x_axis * u + self.y_axis * v + self.z_axis * w
    }

    #[must_use]
    pub fn signed_distance(&self, p: Point3) -> f64 {
        (p - self.origin).dot(self.z_axis)
    }

    #[must_use]
    pub fn project(&self, p: Point3) -> Point3 {
        p - self.z_axis * self.signed_distance(p)
    }

    /// Whether the basis is finite, unit length and mutually perpendicular.
    #[must_use]
    pub fn is_orthonormal(&self) -> bool {
        let axes = [self.x_axis, self.y_axis, self.z_axis];
        axes.iter().all(|a| a.is_finite() && (a.length() - 1.0).abs() < 1e-9)
            && self.x_axis.dot(self.y_axis).abs() < 1e-9
            && self.x_axis.cross(self.y_axis).dot(self.z_axis) > 0.0
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::WORLD_XY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orthonormalizes() {
        let plane = Plane::new(Point3::ORIGIN, Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)).unwrap();
        assert!(plane.is_orthonormal());
        assert!((plane.z_axis.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_new_rejects_parallel_axes() {
        assert!(Plane::new(Point3::ORIGIN, Vec3::X, Vec3::X * 3.0).is_none());
        assert!(Plane::new(Point3::ORIGIN, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_local_world_round_trip() {
        let plane = Plane::new(Point3::new(1.0, -2.0, 5.0), Vec3::new(0.0, 1.0, 1.0), Vec3::X).unwrap();
        let p = Point3::new(0.3, 0.7, -1.1);
        let back = plane.to_world().apply_point(plane.to_local().apply_point(p));
        assert!(back.distance_to(p) < 1e-12);
        assert!(plane.to_local().apply_point(plane.origin).distance_to(Point3::ORIGIN) < 1e-12);
    }

    #[test]
    fn test_project_onto_plane() {
        let plane = Plane::WORLD_XY.with_origin(Point3::new(0.0, 0.0, 2.0));
        let p = plane.project(Point3::new(1.0, 1.0, 7.0));
        assert_eq!(p, Point3::new(1.0, 1.0, 2.0));
    }
}
