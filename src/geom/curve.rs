//! Polyline-backed curves.
//!
//! A [`Curve`] is an ordered list of vertices, open or closed. Closed curves
//! never repeat their first vertex; the closing segment is implicit. Curve
//! parameters run over `[0, 1]` by normalized arc length, so `t = 0` is the
//! seam of a closed curve and `t = 1` wraps back onto it.
//!
//! The pipeline treats curves as values: every operation returns a new
//! curve and never mutates its receiver.

use std::f64::consts::TAU;

use super::core::{BBox, Point3, Tolerance, Transform, Vec3};
use super::plane::Plane;

/// Vertices closer than this are merged on construction.
const DUPLICATE_EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    points: Vec<Point3>,
    closed: bool,
}

impl Curve {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Builds a polyline curve.
    ///
    /// Consecutive duplicate vertices are dropped, as is a repeated closing
    /// vertex on closed input. Returns `None` for non-finite input or when
    /// fewer than two (open) or three (closed) distinct vertices remain.
    #[must_use]
    pub fn polyline(points: Vec<Point3>, closed: bool) -> Option<Self> {
        if points.iter().any(|p| !p.is_finite()) {
            return None;
        }
        let mut cleaned: Vec<Point3> = Vec::with_capacity(points.len());
        for p in points {
            if cleaned.last().is_none_or(|last| last.distance_to(p) > DUPLICATE_EPS) {
                cleaned.push(p);
            }
        }
        if closed && cleaned.len() > 1 && cleaned[0].distance_to(cleaned[cleaned.len() - 1]) <= DUPLICATE_EPS {
            cleaned.pop();
        }
        let min = if closed { 3 } else { 2 };
        (cleaned.len() >= min).then_some(Self { points: cleaned, closed })
    }

    #[must_use]
    pub fn line(a: Point3, b: Point3) -> Option<Self> {
        Self::polyline(vec![a, b], false)
    }

    /// Closed circle in `plane`, starting on the plane's X axis and running
    /// counter-clockwise about its normal.
    #[must_use]
    pub fn circle(plane: &Plane, radius: f64, segments: usize) -> Option<Self> {
        if !(radius.is_finite() && radius > 0.0) || segments < 3 {
            return None;
        }
        let points = (0..segments)
            .map(|i| {
                let angle = TAU * i as f64 / segments as f64;
                plane.point_at(radius * angle.cos(), radius * angle.sin(), 0.0)
            })
            .collect();
        Self::polyline(points, true)
    }

    /// Closed axis-aligned rectangle centered on the plane origin.
    /// The seam sits at the middle of the +X edge.
    #[must_use]
    pub fn rectangle(plane: &Plane, width: f64, height: f64) -> Option<Self> {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let corners = [(hw, 0.0), (hw, hh), (-hw, hh), (-hw, -hh), (hw, -hh)];
        Self::polyline(corners.iter().map(|&(u, v)| plane.point_at(u, v, 0.0)).collect(), true)
    }

    /// Open curve passing through `points`.
    ///
    /// Degree 3 or higher interpolates a centripetal Catmull-Rom spline
    /// through the points, which neither overshoots nor loops on unevenly
    /// spaced points; lower degrees connect them with straight segments.
    #[must_use]
    pub fn interpolate(points: &[Point3], degree: usize) -> Option<Self> {
        const SUBDIVISIONS: usize = 16;
        let through = Self::polyline(points.to_vec(), false)?;
        let n = through.points.len();
        if degree < 3 || n < 3 {
            return Some(through);
        }
        let p = &through.points;
        // Phantom ends mirror the neighbouring vertex.
        let at = |i: isize| -> Point3 {
            match i {
                -1 => p[0] + (p[0] - p[1]),
                i if i as usize >= n => p[n - 1] + (p[n - 1] - p[n - 2]),
                i => p[i as usize],
            }
        };
        let mut smooth = Vec::with_capacity((n - 1) * SUBDIVISIONS + 1);
        for i in 0..n as isize - 1 {
            let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
            for k in 0..SUBDIVISIONS {
                smooth.push(centripetal_catmull_rom(p0, p1, p2, p3, k as f64 / SUBDIVISIONS as f64));
            }
        }
        smooth.push(p[n - 1]);
        Self::polyline(smooth, false).or(Some(through))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn into_points(self) -> Vec<Point3> {
        self.points
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn start(&self) -> Point3 {
        self.points[0]
    }

    #[must_use]
    pub fn end(&self) -> Point3 {
        if self.closed { self.points[0] } else { self.points[self.points.len() - 1] }
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        if self.closed { self.points.len() } else { self.points.len() - 1 }
    }

    /// Segment `i` as `(start, end)`; the closing segment of a closed curve is last.
    #[must_use]
    pub fn segment(&self, i: usize) -> (Point3, Point3) {
        (self.points[i], self.points[(i + 1) % self.points.len()])
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        (0..self.segment_count()).map(|i| self.segment(i))
    }

    /// Distance between the end points of an open curve, zero when closed.
    #[must_use]
    pub fn gap(&self) -> f64 {
        if self.closed { 0.0 } else { self.start().distance_to(self.end()) }
    }

    #[must_use]
    pub fn bbox(&self) -> BBox {
        // `polyline` guarantees at least two vertices.
        BBox::from_points(&self.points).unwrap_or(BBox {
            min: Point3::ORIGIN,
            max: Point3::ORIGIN,
        })
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    // ========================================================================
    // Arc length and evaluation
    // ========================================================================

    /// Cumulative arc length at each vertex, plus the total at the end.
    #[must_use]
    pub fn cumulative_lengths(&self) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(self.segment_count() + 1);
        let mut total = 0.0;
        lengths.push(0.0);
        for (a, b) in self.segments() {
            total += a.distance_to(b);
            lengths.push(total);
        }
        lengths
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(b)).sum()
    }

    /// Parameter of vertex `index`.
    #[must_use]
    pub fn vertex_parameter(&self, index: usize) -> f64 {
        let lengths = self.cumulative_lengths();
        let total = lengths[lengths.len() - 1];
        if total <= 0.0 { 0.0 } else { lengths[index.min(lengths.len() - 1)] / total }
    }

    /// Segment index and local segment fraction for parameter `t`.
    fn locate(&self, lengths: &[f64], t: f64) -> (usize, f64) {
        let total = lengths[lengths.len() - 1];
        let segment_count = lengths.len() - 1;
        let target = clamp_parameter(t, self.closed) * total;
        let index = lengths
            .partition_point(|&l| l <= target)
            .saturating_sub(1)
            .min(segment_count - 1);
        let span = lengths[index + 1] - lengths[index];
        let local = if span > 0.0 { ((target - lengths[index]) / span).clamp(0.0, 1.0) } else { 0.0 };
        (index, local)
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        let lengths = self.cumulative_lengths();
        let (index, local) = self.locate(&lengths, t);
        let (a, b) = self.segment(index);
        a.lerp(b, local)
    }

    /// Unit tangent at `t`. At a vertex the two sides may differ; see [`Curve::tangents_at`].
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.tangents_at(t).1
    }

    /// Inbound and outbound unit tangents at `t`.
    ///
    /// Away from vertices both are the segment direction. At a vertex they are
    /// the directions of the segments before and after it. The ends of an open
    /// curve report their single adjacent segment on both sides.
    #[must_use]
    pub fn tangents_at(&self, t: f64) -> (Option<Vec3>, Option<Vec3>) {
        let lengths = self.cumulative_lengths();
        let total = lengths[lengths.len() - 1];
        let segment_count = self.segment_count();
        let direction = |i: usize| {
            let (a, b) = self.segment(i);
            (b - a).normalized()
        };

        let target = clamp_parameter(t, self.closed) * total;
        let vertex_eps = total * 1e-9;
        let vertex = lengths.iter().position(|&l| (l - target).abs() <= vertex_eps);

        match vertex {
            Some(v) => {
                let (inbound, outbound) = if self.closed {
                    let v = v % segment_count;
                    ((v + segment_count - 1) % segment_count, v)
                } else if v == 0 {
                    (0, 0)
                } else if v >= segment_count {
                    (segment_count - 1, segment_count - 1)
                } else {
                    (v - 1, v)
                };
                (direction(inbound), direction(outbound))
            }
            None => {
                let (index, _) = self.locate(&lengths, t);
                let d = direction(index);
                (d, d)
            }
        }
    }

    /// Parameter of the point on the curve closest to `p`.
    #[must_use]
    pub fn closest_parameter(&self, p: Point3) -> f64 {
        let lengths = self.cumulative_lengths();
        let total = lengths[lengths.len() - 1];
        if total <= 0.0 {
            return 0.0;
        }
        let mut best = (f64::INFINITY, 0.0);
        for (i, (a, b)) in self.segments().enumerate() {
            let (q, local) = closest_on_segment(p, a, b);
            let d = q.distance_to(p);
            if d < best.0 {
                best = (d, (lengths[i] + local * (lengths[i + 1] - lengths[i])) / total);
            }
        }
        best.1
    }

    #[must_use]
    pub fn closest_point(&self, p: Point3) -> Point3 {
        self.point_at(self.closest_parameter(p))
    }

    #[must_use]
    pub fn distance_to_point(&self, p: Point3) -> f64 {
        self.segments()
            .map(|(a, b)| closest_on_segment(p, a, b).0.distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Largest distance from any vertex of `self` to `other`.
    #[must_use]
    pub fn max_deviation_from(&self, other: &Curve) -> f64 {
        self.points.iter().map(|p| other.distance_to_point(*p)).fold(0.0, f64::max)
    }

    // ========================================================================
    // Planarity and orientation
    // ========================================================================

    /// Newell area vector: normal direction times twice the enclosed area.
    #[must_use]
    pub fn newell_vector(&self) -> Vec3 {
        let n = self.points.len();
        let mut v = Vec3::ZERO;
        for i in 0..n {
            let p1 = self.points[i];
            let p2 = self.points[(i + 1) % n];
            v.x += (p1.y - p2.y) * (p1.z + p2.z);
            v.y += (p1.z - p2.z) * (p1.x + p2.x);
            v.z += (p1.x - p2.x) * (p1.y + p2.y);
        }
        v
    }

    /// Signed enclosed area seen from `normal`; positive for counter-clockwise.
    #[must_use]
    pub fn signed_area(&self, normal: Vec3) -> f64 {
        0.5 * self.newell_vector().dot(normal)
    }

    #[must_use]
    pub fn vertex_centroid(&self) -> Point3 {
        let sum = self.points.iter().fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
        let c = sum / self.points.len() as f64;
        Point3::new(c.x, c.y, c.z)
    }

    #[must_use]
    pub fn max_deviation_from_plane(&self, plane: &Plane) -> f64 {
        self.points.iter().map(|p| plane.signed_distance(*p).abs()).fold(0.0, f64::max)
    }

    /// True if both endpoints coincide within `tol` or the curve is closed.
    #[must_use]
    pub fn is_closed_within(&self, tol: Tolerance) -> bool {
        self.closed || self.gap() <= tol.eps
    }

    /// Closed copy of this curve.
    ///
    /// A gap within `tol` is collapsed onto the start vertex; a wider gap is
    /// bridged by the implicit closing segment.
    #[must_use]
    pub fn closed_copy(&self, tol: Tolerance) -> Option<Self> {
        if self.closed {
            return Some(self.clone());
        }
        let mut points = self.points.clone();
        if self.gap() <= tol.eps {
            points.pop();
        }
        Self::polyline(points, true)
    }

    /// Self-intersection test in the curve's own plane.
    ///
    /// Collinear folds between adjacent segments count as intersections. A
    /// closed curve without a usable normal encloses no area and is reported
    /// as self-intersecting.
    #[must_use]
    pub fn is_self_intersecting(&self) -> bool {
        let Some(normal) = self.newell_vector().normalized() else {
            return self.closed || self.has_fold();
        };
        let Some(plane) = Plane::from_normal(self.points[0], normal) else {
            return true;
        };
        let to_local = plane.to_local();
        let uv: Vec<(f64, f64)> = self
            .points
            .iter()
            .map(|p| {
                let q = to_local.apply_point(*p);
                (q.x, q.y)
            })
            .collect();

        if self.has_fold() {
            return true;
        }

        let count = self.segment_count();
        let n = uv.len();
        let seg = |i: usize| (uv[i], uv[(i + 1) % n]);
        for i in 0..count {
            for j in (i + 1)..count {
                let adjacent = j == i + 1 || (self.closed && i == 0 && j == count - 1);
                if adjacent {
                    continue;
                }
                let (a, b) = seg(i);
                let (c, d) = seg(j);
                if segments_intersect_2d(a, b, c, d) {
                    return true;
                }
            }
        }
        false
    }

    fn has_fold(&self) -> bool {
        let count = self.segment_count();
        let pairs = if self.closed { count } else { count.saturating_sub(1) };
        (0..pairs).any(|i| {
            let (a, b) = self.segment(i);
            let (c, d) = self.segment((i + 1) % count);
            match ((b - a).normalized(), (d - c).normalized()) {
                (Some(u), Some(v)) => u.dot(v) < -1.0 + 1e-9,
                _ => false,
            }
        })
    }

    /// Turning angle (radians) at vertex `i`, zero at open ends.
    #[must_use]
    pub fn turning_angle(&self, i: usize) -> f64 {
        let n = self.points.len();
        if !self.closed && (i == 0 || i + 1 >= n) {
            return 0.0;
        }
        let prev = self.points[(i + n - 1) % n];
        let next = self.points[(i + 1) % n];
        (self.points[i] - prev).angle_to(next - self.points[i]).unwrap_or(0.0)
    }

    /// Parameters of vertices whose turning angle exceeds `angle` radians.
    #[must_use]
    pub fn kink_parameters(&self, angle: f64) -> Vec<f64> {
        let lengths = self.cumulative_lengths();
        let total = lengths[lengths.len() - 1];
        if total <= 0.0 {
            return Vec::new();
        }
        (0..self.points.len())
            .filter(|&i| self.turning_angle(i) > angle)
            .map(|i| lengths[i] / total)
            .collect()
    }

    // ========================================================================
    // Derived curves
    // ========================================================================

    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| transform.apply_point(*p)).collect(),
            closed: self.closed,
        }
    }

    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        self.transformed(&Transform::translate(offset))
    }

    /// Uniform in-plane scale about the bounding box center.
    #[must_use]
    pub fn scaled_about_center(&self, factor: f64) -> Self {
        self.transformed(&Transform::scale_about(self.bbox().center(), factor, factor, factor))
    }

    #[must_use]
    pub fn projected(&self, plane: &Plane) -> Option<Self> {
        Self::polyline(self.points.iter().map(|p| plane.project(*p)).collect(), self.closed)
    }

    /// Reversed traversal. A closed curve keeps its seam vertex.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        if self.closed {
            points[1..].reverse();
        } else {
            points.reverse();
        }
        Self {
            points,
            closed: self.closed,
        }
    }

    /// Moves the seam of a closed curve to parameter `t`.
    ///
    /// A vertex within `tol` of the new seam becomes the start; otherwise a
    /// vertex is inserted there. Open curves are returned unchanged.
    #[must_use]
    pub fn with_seam_at(&self, t: f64, tol: Tolerance) -> Self {
        if !self.closed {
            return self.clone();
        }
        let Some((curve, index)) = self.with_vertex_at(t, tol) else {
            return self.clone();
        };
        let mut points = curve.points;
        points.rotate_left(index);
        Self { points, closed: true }
    }

    /// Copy with a vertex at `t`, plus that vertex's index.
    fn with_vertex_at(&self, t: f64, tol: Tolerance) -> Option<(Self, usize)> {
        let lengths = self.cumulative_lengths();
        let (segment, local) = self.locate(&lengths, t);
        let (a, b) = self.segment(segment);
        let p = a.lerp(b, local);
        let n = self.points.len();
        if p.distance_to(a) <= tol.eps {
            return Some((self.clone(), segment % n));
        }
        if p.distance_to(b) <= tol.eps {
            return Some((self.clone(), (segment + 1) % n));
        }
        let mut points = self.points.clone();
        points.insert(segment + 1, p);
        Some((
            Self {
                points,
                closed: self.closed,
            },
            segment + 1,
        ))
    }

    /// Splits at `params` into open pieces, in traversal order.
    ///
    /// A closed curve split at one parameter yields one open piece that
    /// starts and ends there.
    #[must_use]
    pub fn split_at(&self, params: &[f64], tol: Tolerance) -> Vec<Self> {
        let mut sorted: Vec<f64> = params.iter().map(|&t| clamp_parameter(t, self.closed)).collect();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup_by(|a, b| (*a - *b).abs() <= Tolerance::PARAMETER.eps);

        let mut curve = self.clone();
        let mut cut_points = Vec::with_capacity(sorted.len());
        for &t in &sorted {
            if let Some((next, index)) = curve.with_vertex_at(t, tol) {
                cut_points.push(next.points[index]);
                curve = next;
            }
        }
        let mut cuts: Vec<usize> = cut_points
            .iter()
            .filter_map(|p| curve.points.iter().position(|q| q.distance_to(*p) <= DUPLICATE_EPS))
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        if self.closed {
            let Some(&first) = cuts.first() else {
                return vec![curve.opened()];
            };
            let n = curve.points.len();
            let mut points = curve.points.clone();
            points.rotate_left(first);
            let mut shifted: Vec<usize> = cuts.iter().map(|c| (c + n - first) % n).collect();
            shifted.push(n);
            points.push(points[0]);
            shifted
                .windows(2)
                .filter_map(|w| Self::polyline(points[w[0]..=w[1]].to_vec(), false))
                .collect()
        } else {
            let last = curve.points.len() - 1;
            let mut bounds = vec![0];
            bounds.extend(cuts.into_iter().filter(|&c| c > 0 && c < last));
            bounds.push(last);
            bounds
                .windows(2)
                .filter_map(|w| Self::polyline(curve.points[w[0]..=w[1]].to_vec(), false))
                .collect()
        }
    }

    /// Open copy of a closed curve with the seam vertex repeated at the end.
    fn opened(&self) -> Self {
        let mut points = self.points.clone();
        if self.closed {
            points.push(points[0]);
        }
        Self { points, closed: false }
    }

    /// Joins ordered pieces end to start. The result is closed when the last
    /// piece ends on the first piece's start.
    #[must_use]
    pub fn join(pieces: &[Self], tol: Tolerance) -> Option<Self> {
        let (first, rest) = pieces.split_first()?;
        let mut points = first.opened().points;
        for piece in rest {
            let piece = piece.opened();
            let last = points[points.len() - 1];
            if last.distance_to(piece.start()) > tol.eps {
                return None;
            }
            points.extend_from_slice(&piece.points[1..]);
        }
        let closed = points.len() > 3 && points[0].distance_to(points[points.len() - 1]) <= tol.eps;
        if closed {
            points.pop();
        }
        Self::polyline(points, closed)
    }

    /// Ramer-Douglas-Peucker simplification. Closed curves keep their seam vertex.
    #[must_use]
    pub fn simplified(&self, tol: Tolerance) -> Self {
        let mut chain = self.points.clone();
        if self.closed {
            chain.push(chain[0]);
        }
        if chain.len() <= 2 {
            return self.clone();
        }
        let mut keep = vec![false; chain.len()];
        keep[0] = true;
        let last = chain.len() - 1;
        keep[last] = true;
        rdp_mark(&chain, tol.eps.max(0.0), 0, last, &mut keep);

        let mut points: Vec<Point3> = chain.iter().zip(&keep).filter(|(_, k)| **k).map(|(p, _)| *p).collect();
        if self.closed {
            points.pop();
        }
        Self::polyline(points, self.closed).unwrap_or_else(|| self.clone())
    }

    /// `count` vertices evenly spaced by arc length from the seam. Open curves
    /// keep both end points.
    #[must_use]
    pub fn resampled(&self, count: usize) -> Self {
        let min = if self.closed { 3 } else { 2 };
        let count = count.max(min);
        let lengths = self.cumulative_lengths();
        let total = lengths[lengths.len() - 1];
        if total <= 0.0 {
            return self.clone();
        }
        let divisor = if self.closed { count } else { count - 1 } as f64;
        let points = (0..count)
            .map(|i| {
                let (index, local) = self.locate(&lengths, i as f64 / divisor);
                let (a, b) = self.segment(index);
                a.lerp(b, local)
            })
            .collect();
        Self {
            points,
            closed: self.closed,
        }
    }

    /// Catmull-Rom subdivision through the existing vertices.
    #[must_use]
    pub fn smoothed(&self, subdivisions: usize) -> Self {
        let n = self.points.len();
        let subdivisions = subdivisions.max(1);
        if n < 3 {
            return self.clone();
        }
        let at = |i: isize| -> Point3 {
            if self.closed {
                self.points[i.rem_euclid(n as isize) as usize]
            } else {
                self.points[i.clamp(0, n as isize - 1) as usize]
            }
        };
        let mut points = Vec::with_capacity(self.segment_count() * subdivisions + 1);
        for i in 0..self.segment_count() as isize {
            let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
            for k in 0..subdivisions {
                points.push(catmull_rom(p0, p1, p2, p3, k as f64 / subdivisions as f64));
            }
        }
        if !self.closed {
            points.push(self.points[n - 1]);
        }
        Self::polyline(points, self.closed).unwrap_or_else(|| self.clone())
    }

    /// Fixed-resolution rebuild: `point_count` control vertices by arc
    /// length, smoothed for degree 2 and higher.
    #[must_use]
    pub fn rebuilt(&self, point_count: usize, degree: usize) -> Self {
        let control = self.resampled(point_count);
        if degree < 2 { control } else { control.smoothed(4) }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn clamp_parameter(t: f64, closed: bool) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    if closed && !(0.0..=1.0).contains(&t) { t.rem_euclid(1.0) } else { t.clamp(0.0, 1.0) }
}

fn closest_on_segment(p: Point3, a: Point3, b: Point3) -> (Point3, f64) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= Tolerance::ZERO_LENGTH.eps {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

fn rdp_mark(points: &[Point3], tolerance: f64, start: usize, end: usize, keep: &mut [bool]) {
    if end <= start + 1 {
        return;
    }
    let (a, b) = (points[start], points[end]);
    let (index, distance) = (start + 1..end)
        .map(|i| (i, closest_on_segment(points[i], a, b).0.distance_to(points[i])))
        .fold((start, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if distance > tolerance {
        keep[index] = true;
        rdp_mark(points, tolerance, start, index, keep);
        rdp_mark(points, tolerance, index, end, keep);
    }
}

/// Uniform Catmull-Rom segment between `p1` and `p2`.
pub(crate) fn catmull_rom(p0: Point3, p1: Point3, p2: Point3, p3: Point3, t: f64) -> Point3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let b0 = -0.5 * t3 + t2 - 0.5 * t;
    let b1 = 1.5 * t3 - 2.5 * t2 + 1.0;
    let b2 = -1.5 * t3 + 2.0 * t2 + 0.5 * t;
    let b3 = 0.5 * t3 - 0.5 * t2;
    Point3::new(
        b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
        b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
        b0 * p0.z + b1 * p1.z + b2 * p2.z + b3 * p3.z,
    )
}

/// Centripetal (alpha 0.5) Catmull-Rom segment between `p1` and `p2`.
fn centripetal_catmull_rom(p0: Point3, p1: Point3, p2: Point3, p3: Point3, t: f64) -> Point3 {
    let knot = |a: Point3, b: Point3| a.distance_to(b).sqrt();
    let t1 = knot(p0, p1);
    let t2 = t1 + knot(p1, p2);
    let t3 = t2 + knot(p2, p3);
    let u = t1 + (t2 - t1) * t;
    let blend = |a: Point3, b: Point3, ta: f64, tb: f64| {
        if tb - ta <= 0.0 { a } else { a.lerp(b, (u - ta) / (tb - ta)) }
    };
    let a1 = blend(p0, p1, 0.0, t1);
    let a2 = blend(p1, p2, t1, t2);
    let a3 = blend(p2, p3, t2, t3);
    let b1 = blend(a1, a2, 0.0, t2);
    let b2 = blend(a2, a3, t1, t3);
    blend(b1, b2, t1, t2)
}

fn orient(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) - 1e-12 && p.0 <= a.0.max(b.0) + 1e-12 && p.1 >= a.1.min(b.1) - 1e-12 && p.1 <= a.1.max(b.1) + 1e-12
}

fn segments_intersect_2d(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    const EPS: f64 = 1e-12;
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);

    if ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS)) && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS)) {
        return true;
    }
    (d1.abs() <= EPS && on_segment(c, d, a))
        || (d2.abs() <= EPS && on_segment(c, d, b))
        || (d3.abs() <= EPS && on_segment(a, b, c))
        || (d4.abs() <= EPS && on_segment(a, b, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Curve {
        Curve::polyline(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_polyline_drops_repeated_closing_vertex() {
        let curve = Curve::polyline(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
            true,
        )
        .unwrap();
        assert_eq!(curve.point_count(), 3);
        assert!(Curve::polyline(vec![Point3::ORIGIN, Point3::ORIGIN], false).is_none());
    }

    #[test]
    fn test_length_and_point_at() {
        let square = unit_square();
        assert!((square.length() - 4.0).abs() < 1e-12);
        assert!(square.point_at(0.25).distance_to(Point3::new(1.0, 0.0, 0.0)) < 1e-12);
        assert!(square.point_at(0.375).distance_to(Point3::new(1.0, 0.5, 0.0)) < 1e-12);
        assert!(square.point_at(1.0).distance_to(square.start()) < 1e-12);
    }

    #[test]
    fn test_tangents_at_corner() {
        let square = unit_square();
        let (inbound, outbound) = square.tangents_at(0.25);
        assert!((inbound.unwrap() - Vec3::X).length() < 1e-12);
        assert!((outbound.unwrap() - Vec3::Y).length() < 1e-12);

        let (inbound, outbound) = square.tangents_at(0.0);
        assert!((inbound.unwrap() + Vec3::Y).length() < 1e-12);
        assert!((outbound.unwrap() - Vec3::X).length() < 1e-12);
    }

    #[test]
    fn test_signed_area_orientation() {
        let square = unit_square();
        assert!((square.signed_area(Vec3::Z) - 1.0).abs() < 1e-12);
        assert!((square.reversed().signed_area(Vec3::Z) + 1.0).abs() < 1e-12);
        assert_eq!(square.reversed().start(), square.start());
    }

    #[test]
    fn test_closest_parameter() {
        let square = unit_square();
        let t = square.closest_parameter(Point3::new(2.0, 0.5, 0.0));
        assert!((t - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_with_seam_inserts_vertex() {
        let square = unit_square();
        let moved = square.with_seam_at(0.375, Tolerance::MODEL);
        assert_eq!(moved.point_count(), 5);
        assert!(moved.start().distance_to(Point3::new(1.0, 0.5, 0.0)) < 1e-12);
        assert!((moved.length() - 4.0).abs() < 1e-12);

        let snapped = square.with_seam_at(0.5, Tolerance::MODEL);
        assert_eq!(snapped.point_count(), 4);
        assert_eq!(snapped.start(), Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_closed_copy_collapses_small_gap() {
        let open = Curve::polyline(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0005, 0.0, 0.0),
            ],
            false,
        )
        .unwrap();
        assert!(open.is_closed_within(Tolerance::MODEL));
        let closed = open.closed_copy(Tolerance::MODEL).unwrap();
        assert!(closed.is_closed());
        assert_eq!(closed.point_count(), 3);

        let wide = Curve::polyline(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            false,
        )
        .unwrap();
        assert_eq!(wide.closed_copy(Tolerance::MODEL).unwrap().point_count(), 3);
    }

    #[test]
    fn test_self_intersection() {
        let bowtie = Curve::polyline(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        )
        .unwrap();
        assert!(bowtie.is_self_intersecting());
        assert!(!unit_square().is_self_intersecting());
        let circle = Curve::circle(&Plane::WORLD_XY, 2.0, 64).unwrap();
        assert!(!circle.is_self_intersecting());
    }

    #[test]
    fn test_kinks_on_square_and_circle() {
        assert_eq!(unit_square().kink_parameters(20f64.to_radians()).len(), 4);
        let circle = Curve::circle(&Plane::WORLD_XY, 1.0, 96).unwrap();
        assert!(circle.kink_parameters(20f64.to_radians()).is_empty());
    }

    #[test]
    fn test_split_and_join_closed() {
        let square = unit_square();
        let kinks = square.kink_parameters(20f64.to_radians());
        let pieces = square.split_at(&kinks, Tolerance::MODEL);
        assert_eq!(pieces.len(), 4);
        assert!(pieces.iter().all(|p| !p.is_closed() && p.point_count() == 2));
        let joined = Curve::join(&pieces, Tolerance::MODEL).unwrap();
        assert!(joined.is_closed());
        assert!((joined.length() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_split_open_curve_mid_segment() {
        let line = Curve::line(Point3::ORIGIN, Point3::new(2.0, 0.0, 0.0)).unwrap();
        let pieces = line.split_at(&[0.5], Tolerance::MODEL);
        assert_eq!(pieces.len(), 2);
        assert!((pieces[0].length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_simplify_removes_collinear_vertices() {
        let curve = Curve::polyline(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.5, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        )
        .unwrap();
        assert_eq!(curve.simplified(Tolerance::MODEL).point_count(), 4);
    }

    #[test]
    fn test_resampled_counts() {
        let square = unit_square();
        let resampled = square.resampled(16);
        assert_eq!(resampled.point_count(), 16);
        assert_eq!(resampled.start(), square.start());
        let line = Curve::line(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)).unwrap();
        let resampled = line.resampled(5);
        assert_eq!(resampled.end(), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_interpolate_passes_through_points() {
        let pts = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 1.0), Point3::new(2.0, 0.0, 3.0)];
        let curve = Curve::interpolate(&pts, 3).unwrap();
        for p in pts {
            assert!(curve.distance_to_point(p) < 1e-9);
        }
        assert_eq!(curve.start(), pts[0]);
        assert_eq!(curve.end(), pts[2]);
    }

    #[test]
    fn test_interpolate_uneven_collinear_points_stays_on_the_span() {
        let pts = [Point3::new(0.0, 0.0, -1.0), Point3::new(0.0, 0.0, -0.99), Point3::new(0.0, 0.0, 2.0)];
        let curve = Curve::interpolate(&pts, 3).unwrap();
        assert!((curve.length() - 3.0).abs() < 1e-9, "length {}", curve.length());
        assert!(curve.points().windows(2).all(|w| w[1].z >= w[0].z));
        let s = curve.closest_parameter(pts[1]);
        assert!((s - 0.01 / 3.0).abs() < 1e-9, "mid at {s}");
    }
}
