//! Reference kernel over polyline curves and polygon Breps.
//!
//! # Offsets
//! Curves are offset in their best-fit plane (normal turned towards world +Z
//! when it has a Z component). `Sharp` joins neighbouring offset edges with
//! true miters, `Round` inserts arcs wherever the offset edges separate, and
//! `Smooth` subdivides the source curve before a round offset. An offset with
//! a vertex nearer to the source than the offset distance has collapsed and
//! is not returned; other defects are left to the caller's validity screen.
//!
//! # Lofts and sweeps
//! Every section is resampled by arc length to the same vertex count, starting
//! at its seam. Two lofts sharing a section therefore produce coincident
//! vertices along the shared boundary and weld without gaps.
//!
//! # Booleans
//! Solid booleans are not evaluated; `boolean_difference` always reports no
//! result.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::f64::consts::PI;

use crate::geom::{Brep, BrepFace, Curve, EdgeKey, Plane, Point3, Tolerance, Vec3, polygon_edges};

use super::{CornerStyle, GeometryKernel, LoftStyle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineKernel {
    /// Vertices per section in lofts and sweeps.
    pub section_samples: usize,
    /// Interpolated rows per span for smooth lofts.
    pub smooth_rows: usize,
    /// Rail stations per full rail length in sweeps.
    pub sweep_stations: usize,
    /// Turning angle (radians) reported as a discontinuity.
    pub kink_angle: f64,
    /// Maximum angle (radians) per segment of a round offset join.
    pub arc_step: f64,
}

impl Default for PolylineKernel {
    fn default() -> Self {
        Self {
            section_samples: 96,
            smooth_rows: 4,
            sweep_stations: 96,
            kink_angle: 20f64.to_radians(),
            arc_step: 15f64.to_radians(),
        }
    }
}

impl PolylineKernel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_section_samples(mut self, samples: usize) -> Self {
        self.section_samples = samples;
        self
    }

    #[must_use]
    pub const fn with_sweep_stations(mut self, stations: usize) -> Self {
        self.sweep_stations = stations;
        self
    }

    #[must_use]
    pub const fn with_kink_angle(mut self, radians: f64) -> Self {
        self.kink_angle = radians;
        self
    }

    /// Plane an offset is measured in.
    fn offset_plane(&self, curve: &Curve) -> Option<Plane> {
        let plane = self.best_fit_plane(curve)?;
        Some(if plane.z_axis.z < -1e-9 { plane.flipped() } else { plane })
    }

    fn offset_2d(&self, points: &[(f64, f64)], closed: bool, distance: f64, style: CornerStyle) -> Option<Vec<(f64, f64)>> {
        let n = points.len();
        let segment_count = if closed { n } else { n - 1 };
        let normals: Vec<(f64, f64)> = (0..segment_count)
            .map(|i| {
                let (a, b) = (points[i], points[(i + 1) % n]);
                let (dx, dy) = (b.0 - a.0, b.1 - a.1);
                let len = dx.hypot(dy);
                (len > Tolerance::ZERO_LENGTH.eps).then(|| (dy / len, -dx / len))
            })
            .collect::<Option<_>>()?;

        let round = !matches!(style, CornerStyle::Sharp);
        let mut out = Vec::with_capacity(n * 2);
        for i in 0..n {
            let q = points[i];
            let (prev, next) = if closed {
                (normals[(i + segment_count - 1) % segment_count], normals[i % segment_count])
            } else if i == 0 {
                (normals[0], normals[0])
            } else if i == n - 1 {
                (normals[segment_count - 1], normals[segment_count - 1])
            } else {
                (normals[i - 1], normals[i])
            };

            // Offset edges separate where the turn direction matches the offset side.
            let turn = prev.0 * next.1 - prev.1 * next.0;
            let separates = turn * distance > 0.0;

            if round && separates {
                let a0 = prev.1.atan2(prev.0);
                let a1 = next.1.atan2(next.0);
                let mut delta = a1 - a0;
                while delta > PI {
                    delta -= 2.0 * PI;
                }
                while delta <= -PI {
                    delta += 2.0 * PI;
                }
                let steps = ((delta.abs() / self.arc_step).ceil() as usize).max(1);
                for k in 0..=steps {
                    let a = a0 + delta * k as f64 / steps as f64;
                    out.push((q.0 + distance * a.cos(), q.1 + distance * a.sin()));
                }
            } else {
                let denom = 1.0 + prev.0 * next.0 + prev.1 * next.1;
                if denom < 1e-9 {
                    return None;
                }
                let scale = distance / denom;
                out.push((q.0 + (prev.0 + next.0) * scale, q.1 + (prev.1 + next.1) * scale));
            }
        }
        Some(out)
    }

    /// Frame at rail parameter `t`: X along `up`, Z along the averaged tangent.
    fn rail_frame(rail: &Curve, up: Vec3, t: f64) -> Option<Plane> {
        let (inbound, outbound) = rail.tangents_at(t);
        let tangent = match (inbound, outbound) {
            (Some(a), Some(b)) => (a + b).normalized().unwrap_or(a),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return None,
        };
        let x = up.reject_from(tangent).normalized().or_else(|| tangent.any_perpendicular())?;
        let y = tangent.cross(x);
        Some(Plane::from_frame(rail.point_at(t), x, y, tangent))
    }
}

impl GeometryKernel for PolylineKernel {
    fn offset(&self, curve: &Curve, distance: f64, tol: Tolerance, style: CornerStyle) -> Option<Curve> {
        let plane = self.offset_plane(curve)?;
        let source = match style {
            CornerStyle::Smooth => curve.smoothed(2),
            CornerStyle::Sharp | CornerStyle::Round => curve.clone(),
        };
        let to_local = plane.to_local();
        let uv: Vec<(f64, f64)> = source
            .points()
            .iter()
            .map(|p| {
                let q = to_local.apply_point(*p);
                (q.x, q.y)
            })
            .collect();

        let offset = self.offset_2d(&uv, source.is_closed(), distance, style)?;
        let points: Vec<Point3> = offset.into_iter().map(|(u, v)| plane.point_at(u, v, 0.0)).collect();

        // A vertex nearer to the source than the distance means the offset folded over itself.
        let projected = source.projected(&plane)?;
        if points.iter().any(|p| projected.distance_to_point(*p) < distance.abs() - tol.eps) {
            log::debug!("{style:?} offset by {distance} collapsed");
            return None;
        }
        Curve::polyline(points, source.is_closed())
    }

    fn is_valid_curve(&self, curve: &Curve) -> bool {
        if !curve.is_finite() || curve.length() <= Tolerance::ZERO_LENGTH.eps {
            return false;
        }
        if curve.is_closed() && curve.newell_vector().length() <= Tolerance::ZERO_LENGTH.eps {
            return false;
        }
        !curve.is_self_intersecting()
    }

    fn directions_match(&self, a: &Curve, b: &Curve) -> bool {
        if a.is_closed() && b.is_closed() {
            let Some(normal) = a.newell_vector().normalized().or_else(|| b.newell_vector().normalized()) else {
                return true;
            };
            (a.signed_area(normal) >= 0.0) == (b.signed_area(normal) >= 0.0)
        } else {
            (a.end() - a.start()).dot(b.end() - b.start()) >= 0.0
        }
    }

    fn loft(&self, curves: &[Curve], style: LoftStyle, closed: bool) -> Option<Vec<Brep>> {
        let first = curves.first()?;
        if curves.len() < 2 || curves.iter().any(|c| c.is_closed() != first.is_closed()) {
            log::debug!("loft rejected: {} sections, mixed closedness", curves.len());
            return None;
        }
        let sections: Vec<Vec<Point3>> = curves
            .iter()
            .map(|c| c.resampled(self.section_samples).into_points())
            .collect();

        let rows = match style {
            LoftStyle::Straight => sections,
            LoftStyle::Smooth if sections.len() < 3 => sections,
            LoftStyle::Smooth => interpolate_rows(&sections, self.smooth_rows, closed),
        };
        Brep::from_grid(&rows, first.is_closed(), closed).map(|b| vec![b])
    }

    fn iso_curve(&self, patch: &Brep, v: f64) -> Option<Curve> {
        let rows = patch.faces.iter().find_map(|f| f.rows.as_ref())?;
        let last = rows.len().checked_sub(1)?;
        let f = v.clamp(0.0, 1.0) * last as f64;
        let i = (f.floor() as usize).min(last.saturating_sub(1));
        let local = f - i as f64;
        let (a, b) = (&rows[i], &rows[(i + 1).min(last)]);
        if a.point_count() != b.point_count() {
            return None;
        }
        let points = a.points().iter().zip(b.points()).map(|(p, q)| p.lerp(*q, local)).collect();
        Curve::polyline(points, a.is_closed())
    }

    fn sweep_along_rail(&self, rail: &Curve, sections: &[Curve], params: &[f64], closed: bool) -> Option<Vec<Brep>> {
        if sections.is_empty() || sections.len() != params.len() {
            return None;
        }
        let up = rail
            .newell_vector()
            .normalized()
            .or_else(|| rail.tangent_at(0.0).and_then(Vec3::any_perpendicular))?;

        let mut stations: Vec<(f64, Vec<Point3>)> = Vec::with_capacity(sections.len());
        for (section, &t) in sections.iter().zip(params) {
            let frame = Self::rail_frame(rail, up, t)?;
            let local = section.resampled(self.section_samples).transformed(&frame.to_local());
            stations.push((t, local.into_points()));
        }
        stations.sort_by(|a, b| a.0.total_cmp(&b.0));
        let wrap_rows = sections[0].is_closed();

        let (t_min, t_max) = (stations[0].0, stations[stations.len() - 1].0);
        let mut samples: Vec<f64> = if closed {
            (0..self.sweep_stations).map(|i| i as f64 / self.sweep_stations as f64).collect()
        } else {
            let count = ((t_max - t_min) * self.sweep_stations as f64).ceil().max(1.0) as usize;
            (0..=count).map(|i| t_min + (t_max - t_min) * i as f64 / count as f64).collect()
        };
        samples.extend(stations.iter().map(|s| s.0));
        samples.sort_by(f64::total_cmp);
        samples.dedup_by(|a, b| (*a - *b).abs() <= Tolerance::PARAMETER.eps);
        if closed {
            samples.retain(|&t| t < 1.0 - Tolerance::PARAMETER.eps);
        }

        let mut rows = Vec::with_capacity(samples.len());
        for &s in &samples {
            let local = blend_stations(&stations, s, closed)?;
            let frame = Self::rail_frame(rail, up, s)?;
            let world = frame.to_world();
            rows.push(local.iter().map(|p| world.apply_point(*p)).collect::<Vec<_>>());
        }
        Brep::from_grid(&rows, wrap_rows, closed).map(|b| vec![b])
    }

    fn boolean_difference(&self, targets: &[Brep], cutters: &[Brep], _tol: Tolerance) -> Option<Vec<Brep>> {
        log::debug!(
            "boolean difference of {} targets by {} cutters is not evaluated by the polyline kernel",
            targets.len(),
            cutters.len()
        );
        None
    }

    fn cap_planar_holes(&self, brep: &Brep, tol: Tolerance) -> Option<Brep> {
        let (mut capped, _) = brep.welded(tol);
        let loops = capped.boundary_loops();
        if loops.is_empty() {
            return capped.is_closed().then_some(capped);
        }

        let mut cap_count = 0;
        for chain in loops {
            let points = capped.polygon_points(&chain);
            let Some(outline) = Curve::polyline(points, true) else {
                continue;
            };
            let Some(plane) = self.best_fit_plane(&outline) else {
                continue;
            };
            if outline.max_deviation_from_plane(&plane) > tol.eps {
                log::debug!("skipping non-planar hole with {} vertices", chain.len());
                continue;
            }
            let mut cap = chain;
            cap.reverse();
            capped.faces.push(BrepFace::new(vec![cap]));
            cap_count += 1;
        }
        log::debug!("capped {cap_count} planar holes");
        (cap_count > 0).then_some(capped)
    }

    fn join_surfaces(&self, patches: &[Brep], tol: Tolerance) -> Option<Vec<Brep>> {
        if patches.is_empty() {
            return None;
        }
        let (joined, merged) = Brep::merged(patches).welded(tol);
        let components = joined.connected_components();
        log::debug!(
            "joined {} patches into {} breps ({merged} vertices welded)",
            patches.len(),
            components.len()
        );
        (!components.is_empty()).then_some(components)
    }

    fn best_fit_plane(&self, curve: &Curve) -> Option<Plane> {
        let normal = curve.newell_vector().normalized()?;
        let origin = curve.vertex_centroid();
        let x = (curve.start() - origin)
            .reject_from(normal)
            .normalized()
            .or_else(|| normal.any_perpendicular())?;
        Some(Plane::from_frame(origin, x, normal.cross(x), normal))
    }

    fn discontinuities(&self, curve: &Curve) -> Vec<f64> {
        curve.kink_parameters(self.kink_angle)
    }

    fn standardize(&self, brep: &Brep, tol: Tolerance) -> Brep {
        let (welded, _) = brep.welded(tol);
        let min_area = tol.eps * tol.eps;
        let faces = welded
            .faces
            .iter()
            .map(|f| BrepFace {
                polygons: f
                    .polygons
                    .iter()
                    .filter(|p| welded.polygon_area_vector(p).length() * 0.5 > min_area)
                    .cloned()
                    .collect(),
                rows: f.rows.clone(),
            })
            .filter(|f| !f.polygons.is_empty())
            .collect();
        Brep::new(welded.vertices.clone(), faces).compacted()
    }

    fn split_kinky_faces(&self, brep: &Brep, angle: f64) -> Brep {
        let polygons: Vec<Vec<u32>> = brep.polygons().cloned().collect();
        let normals: Vec<Option<Vec3>> = polygons
            .iter()
            .map(|p| brep.polygon_area_vector(p).normalized())
            .collect();
        let mut owners: BTreeMap<EdgeKey, Vec<usize>> = BTreeMap::new();
        for (pi, polygon) in polygons.iter().enumerate() {
            for (a, b) in polygon_edges(polygon) {
                owners.entry(EdgeKey::new(a, b)).or_default().push(pi);
            }
        }
        let kinks: BTreeSet<EdgeKey> = owners
            .iter()
            .filter(|(_, pair)| match pair.as_slice() {
                [a, b] => match (normals[*a], normals[*b]) {
                    (Some(na), Some(nb)) => na.angle_to(nb).is_none_or(|phi| phi > angle),
                    _ => true,
                },
                _ => false,
            })
            .map(|(edge, _)| *edge)
            .collect();
        let boundaries = extend_kink_chains(&owners, kinks);

        let mut region = vec![usize::MAX; polygons.len()];
        let mut faces = Vec::new();
        for seed in 0..polygons.len() {
            if region[seed] != usize::MAX {
                continue;
            }
            let id = faces.len();
            region[seed] = id;
            let mut members = Vec::new();
            let mut queue = VecDeque::from([seed]);
            while let Some(current) = queue.pop_front() {
                members.push(polygons[current].clone());
                for (a, b) in polygon_edges(&polygons[current]) {
                    let edge = EdgeKey::new(a, b);
                    if boundaries.contains(&edge) {
                        continue;
                    }
                    for &neighbour in owners.get(&edge).into_iter().flatten() {
                        if region[neighbour] == usize::MAX {
                            region[neighbour] = id;
                            queue.push_back(neighbour);
                        }
                    }
                }
            }
            faces.push(BrepFace::new(members));
        }
        Brep::new(brep.vertices.clone(), faces)
    }

    fn join_naked_edges(&self, brep: &Brep, tol: Tolerance) -> Brep {
        brep.welded(tol).0
    }
}

/// Continues every kink edge chain that dies out inside the mesh.
///
/// Where a sharp edge fades between sweep stations the chain would stop at
/// an interior vertex and leave its faces connected round the end. At a
/// vertex of four edges the chain goes on along the edge sharing no polygon
/// with the incoming one, until it meets another boundary edge, a vertex of
/// other valence or itself.
fn extend_kink_chains(owners: &BTreeMap<EdgeKey, Vec<usize>>, kinks: BTreeSet<EdgeKey>) -> BTreeSet<EdgeKey> {
    let mut incident: BTreeMap<u32, Vec<EdgeKey>> = BTreeMap::new();
    for edge in owners.keys() {
        incident.entry(edge.0).or_default().push(*edge);
        incident.entry(edge.1).or_default().push(*edge);
    }
    let ends: Vec<(EdgeKey, u32)> = kinks.iter().flat_map(|e| [(*e, e.0), (*e, e.1)]).collect();
    let mut boundaries = kinks;
    for (mut edge, mut vertex) in ends {
        for _ in 0..owners.len() {
            let around = &incident[&vertex];
            if around.len() != 4 || around.iter().any(|e| *e != edge && boundaries.contains(e)) {
                break;
            }
            let shares_polygon = |e: &EdgeKey| owners[e].iter().any(|p| owners[&edge].contains(p));
            let Some(next) = around.iter().copied().find(|e| *e != edge && !shares_polygon(e)) else {
                break;
            };
            boundaries.insert(next);
            vertex = if next.0 == vertex { next.1 } else { next.0 };
            edge = next;
        }
    }
    boundaries
}

/// Catmull-Rom interpolated rows through the section rows.
fn interpolate_rows(sections: &[Vec<Point3>], subdivisions: usize, closed: bool) -> Vec<Vec<Point3>> {
    let n = sections.len() as isize;
    let width = sections[0].len();
    let at = |i: isize| -> &Vec<Point3> {
        if closed { &sections[i.rem_euclid(n) as usize] } else { &sections[i.clamp(0, n - 1) as usize] }
    };
    let spans = if closed { n } else { n - 1 };
    let subdivisions = subdivisions.max(1);
    let mut rows = Vec::new();
    for i in 0..spans {
        let (s0, s1, s2, s3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
        for k in 0..subdivisions {
            let t = k as f64 / subdivisions as f64;
            rows.push(
                (0..width)
                    .map(|j| crate::geom::catmull_rom(s0[j], s1[j], s2[j], s3[j], t))
                    .collect(),
            );
        }
    }
    if !closed {
        rows.push(sections[sections.len() - 1].clone());
    }
    rows
}

/// Linear blend of the local station shapes bracketing rail parameter `s`.
fn blend_stations(stations: &[(f64, Vec<Point3>)], s: f64, closed: bool) -> Option<Vec<Point3>> {
    let count = stations.len();
    if count == 1 {
        return Some(stations[0].1.clone());
    }
    let upper = stations.partition_point(|st| st.0 <= s);
    let (i, j, span, offset) = if upper == 0 || upper == count {
        if !closed {
            let k = if upper == 0 { 0 } else { count - 1 };
            return Some(stations[k].1.clone());
        }
        // Wrap segment from the last station through the seam to the first.
        let (last, first) = (&stations[count - 1], &stations[0]);
        let span = first.0 + 1.0 - last.0;
        let offset = if s >= last.0 { s - last.0 } else { s + 1.0 - last.0 };
        (count - 1, 0, span, offset)
    } else {
        let (a, b) = (&stations[upper - 1], &stations[upper]);
        (upper - 1, upper, b.0 - a.0, s - a.0)
    };
    let w = if span > 0.0 { (offset / span).clamp(0.0, 1.0) } else { 0.0 };
    let (a, b) = (&stations[i].1, &stations[j].1);
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(p, q)| p.lerp(*q, w)).collect())
}
