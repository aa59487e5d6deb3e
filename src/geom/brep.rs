//! Boundary representation for assembled shells and solids.
//!
//! A [`Brep`] is an indexed polygon soup grouped into faces. Polygons share
//! vertices by index, so topology (naked edges, closedness) is read from
//! index pairs once coincident vertices have been welded. Polygons are wound
//! counter-clockwise seen from outside; a closed, consistently wound Brep has
//! positive volume.

use std::collections::HashMap;

use super::core::{BBox, Point3, Tolerance, Transform, Vec3};
use super::curve::Curve;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrepFace {
    pub polygons: Vec<Vec<u32>>,
    /// Section rows of a lofted or swept patch, in lofting order.
    pub rows: Option<Vec<Curve>>,
}

impl BrepFace {
    #[must_use]
    pub fn new(polygons: Vec<Vec<u32>>) -> Self {
        Self { polygons, rows: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Brep {
    pub vertices: Vec<Point3>,
    pub faces: Vec<BrepFace>,
}

/// Undirected edge key with the smaller index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    #[must_use]
    pub fn new(a: u32, b: u32) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }
}

impl Brep {
    #[must_use]
    pub fn new(vertices: Vec<Point3>, faces: Vec<BrepFace>) -> Self {
        Self { vertices, faces }
    }

    /// Single-face patch from a grid of rows of equal length.
    ///
    /// `wrap_rows` connects the last column back to the first (closed
    /// sections); `wrap_columns` connects the last row back to the first
    /// (closed loft). Quads are wound so that rows running counter-clockwise
    /// about the lofting direction produce outward normals.
    #[must_use]
    pub fn from_grid(rows: &[Vec<Point3>], wrap_rows: bool, wrap_columns: bool) -> Option<Self> {
        let width = rows.first()?.len();
        if rows.len() < 2 || width < 2 || rows.iter().any(|r| r.len() != width) {
            return None;
        }
        let vertices: Vec<Point3> = rows.iter().flatten().copied().collect();
        let index = |r: usize, j: usize| (r * width + j) as u32;

        let row_spans = if wrap_columns { rows.len() } else { rows.len() - 1 };
        let col_spans = if wrap_rows { width } else { width - 1 };
        let mut polygons = Vec::with_capacity(row_spans * col_spans);
        for r in 0..row_spans {
            let r1 = (r + 1) % rows.len();
            for j in 0..col_spans {
                let j1 = (j + 1) % width;
                polygons.push(vec![index(r, j), index(r, j1), index(r1, j1), index(r1, j)]);
            }
        }

        let curves: Vec<Curve> = rows.iter().filter_map(|r| Curve::polyline(r.clone(), wrap_rows)).collect();
        let rows = (curves.len() == rows.len()).then_some(curves);
        Some(Self::new(vertices, vec![BrepFace { polygons, rows }]))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.iter().all(|f| f.polygons.is_empty())
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.faces.iter().map(|f| f.polygons.len()).sum()
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Vec<u32>> {
        self.faces.iter().flat_map(|f| f.polygons.iter())
    }

    #[must_use]
    pub fn polygon_points(&self, polygon: &[u32]) -> Vec<Point3> {
        polygon.iter().map(|&i| self.vertices[i as usize]).collect()
    }

    // ========================================================================
    // Topology
    // ========================================================================

    /// Number of polygon sides using each undirected edge.
    #[must_use]
    pub fn edge_uses(&self) -> HashMap<EdgeKey, usize> {
        let mut uses = HashMap::new();
        for polygon in self.polygons() {
            for (a, b) in polygon_edges(polygon) {
                *uses.entry(EdgeKey::new(a, b)).or_insert(0) += 1;
            }
        }
        uses
    }

    #[must_use]
    pub fn naked_edge_count(&self) -> usize {
        self.edge_uses().values().filter(|&&n| n == 1).count()
    }

    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_uses().values().filter(|&&n| n > 2).count()
    }

    /// Closed two-manifold: every edge shared by exactly two polygons.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.is_empty() && self.edge_uses().values().all(|&n| n == 2)
    }

    /// Closed with a positive enclosed volume.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.is_closed() && self.volume() > 0.0
    }

    /// Naked boundary loops as vertex index chains, following polygon winding.
    ///
    /// Chains that cannot be closed (non-manifold boundaries) are dropped.
    #[must_use]
    pub fn boundary_loops(&self) -> Vec<Vec<u32>> {
        let uses = self.edge_uses();
        let mut next: HashMap<u32, u32> = HashMap::new();
        for polygon in self.polygons() {
            for (a, b) in polygon_edges(polygon) {
                if uses.get(&EdgeKey::new(a, b)) == Some(&1) {
                    next.insert(a, b);
                }
            }
        }

        let mut starts: Vec<u32> = next.keys().copied().collect();
        starts.sort_unstable();
        let mut loops = Vec::new();
        for start in starts {
            if !next.contains_key(&start) {
                continue;
            }
            let mut chain = vec![start];
            let mut current = start;
            let closed = loop {
                let Some(following) = next.remove(&current) else {
                    break false;
                };
                if following == start {
                    break true;
                }
                chain.push(following);
                current = following;
            };
            if closed && chain.len() >= 3 {
                loops.push(chain);
            }
        }
        loops
    }

    /// Polygon adjacency through shared edges.
    #[must_use]
    pub fn polygon_adjacency(&self) -> Vec<Vec<usize>> {
        let polygons: Vec<&Vec<u32>> = self.polygons().collect();
        let mut by_edge: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
        for (pi, polygon) in polygons.iter().enumerate() {
            for (a, b) in polygon_edges(polygon) {
                by_edge.entry(EdgeKey::new(a, b)).or_default().push(pi);
            }
        }
        let mut adjacency = vec![Vec::new(); polygons.len()];
        for owners in by_edge.values() {
            for &i in owners {
                for &j in owners {
                    if i != j && !adjacency[i].contains(&j) {
                        adjacency[i].push(j);
                    }
                }
            }
        }
        adjacency
    }

    // ========================================================================
    // Measures
    // ========================================================================

    /// Signed enclosed volume by the divergence theorem.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let mut six_v = 0.0;
        for polygon in self.polygons() {
            let p0 = self.vertices[polygon[0] as usize].to_vec3();
            for w in polygon[1..].windows(2) {
                let p1 = self.vertices[w[0] as usize].to_vec3();
                let p2 = self.vertices[w[1] as usize].to_vec3();
                six_v += p0.dot(p1.cross(p2));
            }
        }
        six_v / 6.0
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygons().map(|p| self.polygon_area_vector(p).length() * 0.5).sum()
    }

    /// Newell vector of a polygon: normal times twice its area.
    #[must_use]
    pub fn polygon_area_vector(&self, polygon: &[u32]) -> Vec3 {
        let n = polygon.len();
        let mut v = Vec3::ZERO;
        for i in 0..n {
            let p1 = self.vertices[polygon[i] as usize];
            let p2 = self.vertices[polygon[(i + 1) % n] as usize];
            v.x += (p1.y - p2.y) * (p1.z + p2.z);
            v.y += (p1.z - p2.z) * (p1.x + p2.x);
            v.z += (p1.x - p2.x) * (p1.y + p2.y);
        }
        v
    }

    #[must_use]
    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.vertices)
    }

    // ========================================================================
    // Derived Breps
    // ========================================================================

    /// Reversed polygon winding. Section rows are kept.
    #[must_use]
    pub fn flipped(&self) -> Self {
        let mut out = self.clone();
        for face in &mut out.faces {
            for polygon in &mut face.polygons {
                polygon.reverse();
            }
        }
        out
    }

    /// Transformed copy; mirroring transforms reverse winding to stay outward.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let mut out = Self {
            vertices: self.vertices.iter().map(|p| transform.apply_point(*p)).collect(),
            faces: self
                .faces
                .iter()
                .map(|f| BrepFace {
                    polygons: f.polygons.clone(),
                    rows: f.rows.as_ref().map(|rows| rows.iter().map(|r| r.transformed(transform)).collect()),
                })
                .collect(),
        };
        if transform.linear_determinant() < 0.0 {
            out = out.flipped();
        }
        out
    }

    /// Concatenation without welding.
    #[must_use]
    pub fn merged(breps: &[Brep]) -> Self {
        let mut out = Self::default();
        for brep in breps {
            let base = out.vertices.len() as u32;
            out.vertices.extend_from_slice(&brep.vertices);
            out.faces.extend(brep.faces.iter().map(|f| BrepFace {
                polygons: f.polygons.iter().map(|p| p.iter().map(|i| i + base).collect()).collect(),
                rows: f.rows.clone(),
            }));
        }
        out
    }

    /// Merges vertices closer than `tol` and drops polygons that collapse.
    ///
    /// Returns the welded Brep and the number of merged vertices.
    #[must_use]
    pub fn welded(&self, tol: Tolerance) -> (Self, usize) {
        let cell = tol.eps.max(Tolerance::ZERO_LENGTH.eps);
        let key = |p: Point3| {
            (
                (p.x / cell).floor() as i64,
                (p.y / cell).floor() as i64,
                (p.z / cell).floor() as i64,
            )
        };
        let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
        let mut vertices: Vec<Point3> = Vec::with_capacity(self.vertices.len());
        let mut remap: Vec<u32> = Vec::with_capacity(self.vertices.len());
        let mut merged_count = 0;

        for p in &self.vertices {
            let (kx, ky, kz) = key(*p);
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if let Some(bucket) = grid.get(&(kx + dx, ky + dy, kz + dz)) {
                            if let Some(&idx) = bucket.iter().find(|&&i| vertices[i as usize].distance_to(*p) <= tol.eps) {
                                found = Some(idx);
                                break 'search;
                            }
                        }
                    }
                }
            }
            match found {
                Some(idx) => {
                    remap.push(idx);
                    merged_count += 1;
                }
                None => {
                    let idx = vertices.len() as u32;
                    vertices.push(*p);
                    grid.entry((kx, ky, kz)).or_default().push(idx);
                    remap.push(idx);
                }
            }
        }

        let faces = self
            .faces
            .iter()
            .map(|f| BrepFace {
                polygons: f
                    .polygons
                    .iter()
                    .filter_map(|polygon| {
                        let mut out: Vec<u32> = Vec::with_capacity(polygon.len());
                        for &i in polygon {
                            let mapped = remap[i as usize];
                            if out.last() != Some(&mapped) {
                                out.push(mapped);
                            }
                        }
                        if out.len() > 1 && out.first() == out.last() {
                            out.pop();
                        }
                        (out.len() >= 3).then_some(out)
                    })
                    .collect(),
                rows: f.rows.clone(),
            })
            .filter(|f| !f.polygons.is_empty())
            .collect();

        (Self { vertices, faces }, merged_count)
    }

    /// Splits into edge-connected components, each keeping its own faces.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Self> {
        let face_count = self.faces.len();
        let mut parent: Vec<usize> = (0..face_count).collect();

        fn find(parent: &mut [usize], i: usize) -> usize {
            if parent[i] != i {
                parent[i] = find(parent, parent[i]);
            }
            parent[i]
        }

        fn union(parent: &mut [usize], i: usize, j: usize) {
            let pi = find(parent, i);
            let pj = find(parent, j);
            if pi != pj {
                parent[pi] = pj;
            }
        }

        let mut owner: HashMap<EdgeKey, usize> = HashMap::new();
        for (fi, face) in self.faces.iter().enumerate() {
            for polygon in &face.polygons {
                for (a, b) in polygon_edges(polygon) {
                    match owner.get(&EdgeKey::new(a, b)) {
                        Some(&other) => union(&mut parent, fi, other),
                        None => {
                            owner.insert(EdgeKey::new(a, b), fi);
                        }
                    }
                }
            }
        }

        let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
        for fi in 0..face_count {
            let root = find(&mut parent, fi);
            match groups.iter_mut().find(|(r, _)| *r == root) {
                Some((_, members)) => members.push(fi),
                None => groups.push((root, vec![fi])),
            }
        }

        groups
            .into_iter()
            .map(|(_, members)| {
                let faces = members.into_iter().map(|fi| self.faces[fi].clone()).collect();
                Self::new(self.vertices.clone(), faces).compacted()
            })
            .collect()
    }

    /// Drops vertices no polygon references.
    #[must_use]
    pub fn compacted(&self) -> Self {
        let mut remap: Vec<Option<u32>> = vec![None; self.vertices.len()];
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            let mut polygons = Vec::with_capacity(face.polygons.len());
            for polygon in &face.polygons {
                let mut mapped = Vec::with_capacity(polygon.len());
                for &i in polygon {
                    let index = match remap[i as usize] {
                        Some(index) => index,
                        None => {
                            let index = vertices.len() as u32;
                            vertices.push(self.vertices[i as usize]);
                            remap[i as usize] = Some(index);
                            index
                        }
                    };
                    mapped.push(index);
                }
                polygons.push(mapped);
            }
            faces.push(BrepFace {
                polygons,
                rows: face.rows.clone(),
            });
        }
        Self { vertices, faces }
    }
}

pub(crate) fn polygon_edges(polygon: &[u32]) -> impl Iterator<Item = (u32, u32)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}
