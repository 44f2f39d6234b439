//! Triangle mesh storage.
//!
//! [`TriMesh`] is the only place topology is physically stored: an
//! arena of vertex positions plus an arena of triangle index triples.
//! Triangles are removed by tombstoning and physically dropped by
//! [`TriMesh::compact`], so handles stay stable between compactions.
//!
//! Edges are never stored here; they are derived from triangle sides
//! by the topology queries in [`crate::topology`].

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::index::{TriId, VertexId};
use crate::error::{FloeError, Result};

/// Distance below which two vertices are considered coincident.
pub const WELD_EPS: f64 = 1e-4;

/// Area below which a triangle is considered degenerate.
pub const AREA_EPS: f64 = 1e-9;

/// A triangle mesh stored as flat vertex and index arenas.
///
/// Vertex `y` is the only position component mutated after creation
/// (by height coercion); everything else changes through welding,
/// triangle insertion/removal, and compaction.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    positions: Vec<Point3<f64>>,
    tris: Vec<[VertexId; 3]>,
    dead: Vec<bool>,
    num_dead: usize,
}

impl TriMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(num_vertices),
            tris: Vec::with_capacity(num_triangles),
            dead: Vec::with_capacity(num_triangles),
            num_dead: 0,
        }
    }

    /// Build a mesh from a face-vertex list.
    ///
    /// Validates that every triangle references existing, pairwise
    /// distinct vertices, in the same way meshes from external
    /// sources are usually checked before use.
    pub fn from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<Self> {
        if faces.is_empty() {
            return Err(FloeError::EmptyMesh);
        }

        for (ti, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= vertices.len() {
                    return Err(FloeError::InvalidVertexIndex {
                        triangle: ti,
                        vertex: vi,
                    });
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(FloeError::DegenerateTriangle { triangle: ti });
            }
        }

        let mut mesh = Self::with_capacity(vertices.len(), faces.len());
        for &pos in vertices {
            mesh.add_vertex(pos);
        }
        for face in faces {
            mesh.add_triangle([
                VertexId::new(face[0]),
                VertexId::new(face[1]),
                VertexId::new(face[2]),
            ]);
        }
        Ok(mesh)
    }

    /// Build a mesh from raw position triples, one triangle per
    /// triple, without any shared vertex identity.
    ///
    /// Callers that need shared vertices (outlines, skirts) should
    /// [`weld`](Self::weld) afterwards.
    pub fn from_position_triples(triples: &[[Point3<f64>; 3]]) -> Self {
        let mut mesh = Self::with_capacity(triples.len() * 3, triples.len());
        for tri in triples {
            let a = mesh.add_vertex(tri[0]);
            let b = mesh.add_vertex(tri[1]);
            let c = mesh.add_vertex(tri[2]);
            mesh.add_triangle([a, b, c]);
        }
        mesh
    }

    // ==================== Accessors ====================

    /// Get the number of vertices (including ones no live triangle
    /// references; compaction drops those).
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of live triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.tris.len() - self.num_dead
    }

    /// Check whether the mesh has no live triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_triangles() == 0
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.positions[v.index()] = pos;
    }

    /// Get the vertex triple of a triangle.
    #[inline]
    pub fn triangle(&self, t: TriId) -> [VertexId; 3] {
        self.tris[t.index()]
    }

    /// Check whether a triangle handle refers to a live triangle.
    #[inline]
    pub fn is_live(&self, t: TriId) -> bool {
        !self.dead[t.index()]
    }

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.positions.len()).map(VertexId::new)
    }

    /// Iterate over all live triangle IDs.
    pub fn tri_ids(&self) -> impl Iterator<Item = TriId> + '_ {
        (0..self.tris.len())
            .filter(move |&i| !self.dead[i])
            .map(TriId::new)
    }

    /// Get the positions of a triangle's three vertices.
    pub fn tri_positions(&self, t: TriId) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangle(t);
        [*self.position(a), *self.position(b), *self.position(c)]
    }

    // ==================== Geometry ====================

    /// Compute the centroid of a triangle.
    pub fn tri_centroid(&self, t: TriId) -> Point3<f64> {
        let [p0, p1, p2] = self.tri_positions(t);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Compute the (normalized) face normal of a triangle.
    ///
    /// Degenerate triangles yield a non-finite or zero vector; callers
    /// filter those through [`drop_degenerate`](Self::drop_degenerate).
    pub fn tri_normal(&self, t: TriId) -> Vector3<f64> {
        let [p0, p1, p2] = self.tri_positions(t);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Compute the area of a triangle.
    pub fn tri_area(&self, t: TriId) -> f64 {
        let [p0, p1, p2] = self.tri_positions(t);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the centroid of all vertex positions.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.positions.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / self.positions.len() as f64))
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.positions.is_empty() {
            return None;
        }

        let mut min = self.positions[0];
        let mut max = self.positions[0];
        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        let id = VertexId::new(self.positions.len());
        self.positions.push(position);
        id
    }

    /// Add a new triangle and return its ID.
    ///
    /// The triple defines the winding; no adjacency or duplicate
    /// checks happen here.
    pub fn add_triangle(&mut self, verts: [VertexId; 3]) -> TriId {
        debug_assert!(
            verts[0] != verts[1] && verts[1] != verts[2] && verts[0] != verts[2],
            "degenerate triangle {:?}",
            verts
        );
        let id = TriId::new(self.tris.len());
        self.tris.push(verts);
        self.dead.push(false);
        id
    }

    /// Tombstone a triangle. The slot is reclaimed by
    /// [`compact`](Self::compact).
    pub fn remove_triangle(&mut self, t: TriId) {
        if !self.dead[t.index()] {
            self.dead[t.index()] = true;
            self.num_dead += 1;
        }
    }

    /// Check whether a live triangle with the same vertex set already
    /// exists, in any winding.
    pub fn contains_triangle(&self, verts: [VertexId; 3]) -> bool {
        let key = sorted(verts);
        self.tri_ids().any(|t| sorted(self.triangle(t)) == key)
    }

    // ==================== Structural cleanup ====================

    /// Merge geometrically coincident vertices (within `eps`) into one
    /// shared vertex, rewriting triangle references.
    ///
    /// Triangles collapsed to fewer than three distinct vertices are
    /// tombstoned. Orphaned vertex slots remain until compaction.
    /// Returns the number of vertices merged away.
    pub fn weld(&mut self, eps: f64) -> usize {
        // Hash grid keyed on quantized coordinates; the 27-cell probe
        // catches pairs straddling a cell boundary.
        let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        let mut remap: Vec<usize> = (0..self.positions.len()).collect();
        let mut merged = 0usize;

        let key_of = |p: &Point3<f64>| {
            (
                (p.x / eps).floor() as i64,
                (p.y / eps).floor() as i64,
                (p.z / eps).floor() as i64,
            )
        };

        for i in 0..self.positions.len() {
            let p = self.positions[i];
            let (kx, ky, kz) = key_of(&p);
            let mut found = None;

            'probe: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if let Some(cell) = grid.get(&(kx + dx, ky + dy, kz + dz)) {
                            for &j in cell {
                                if (self.positions[j] - p).norm() <= eps {
                                    found = Some(j);
                                    break 'probe;
                                }
                            }
                        }
                    }
                }
            }

            match found {
                Some(j) => {
                    remap[i] = j;
                    merged += 1;
                }
                None => {
                    grid.entry((kx, ky, kz)).or_default().push(i);
                }
            }
        }

        if merged == 0 {
            return 0;
        }

        for ti in 0..self.tris.len() {
            if self.dead[ti] {
                continue;
            }
            let mut verts = self.tris[ti];
            for v in &mut verts {
                *v = VertexId::new(remap[v.index()]);
            }
            if verts[0] == verts[1] || verts[1] == verts[2] || verts[0] == verts[2] {
                self.dead[ti] = true;
                self.num_dead += 1;
            } else {
                self.tris[ti] = verts;
            }
        }

        merged
    }

    /// Tombstone every live triangle with area below `eps_area`.
    /// Returns the number of triangles dropped.
    pub fn drop_degenerate(&mut self, eps_area: f64) -> usize {
        let mut dropped = 0usize;
        for ti in 0..self.tris.len() {
            if self.dead[ti] {
                continue;
            }
            if self.tri_area(TriId::new(ti)) < eps_area {
                self.dead[ti] = true;
                self.num_dead += 1;
                dropped += 1;
            }
        }
        dropped
    }

    /// Tombstone duplicate triangles (same vertex set, any winding),
    /// keeping the first occurrence. Returns the number dropped.
    pub fn dedup_triangles(&mut self) -> usize {
        let mut seen: HashMap<[VertexId; 3], ()> = HashMap::new();
        let mut dropped = 0usize;
        for ti in 0..self.tris.len() {
            if self.dead[ti] {
                continue;
            }
            let key = sorted(self.tris[ti]);
            if seen.insert(key, ()).is_some() {
                self.dead[ti] = true;
                self.num_dead += 1;
                dropped += 1;
            }
        }
        dropped
    }

    /// Drop tombstoned triangles and unreferenced vertices, compacting
    /// both arenas.
    ///
    /// All previously held [`VertexId`]/[`TriId`] handles are
    /// invalidated.
    pub fn compact(&mut self) {
        let mut vertex_used = vec![false; self.positions.len()];
        for ti in 0..self.tris.len() {
            if self.dead[ti] {
                continue;
            }
            for v in self.tris[ti] {
                vertex_used[v.index()] = true;
            }
        }

        let mut vertex_map = vec![usize::MAX; self.positions.len()];
        let mut new_positions = Vec::with_capacity(self.positions.len());
        for (i, used) in vertex_used.iter().enumerate() {
            if *used {
                vertex_map[i] = new_positions.len();
                new_positions.push(self.positions[i]);
            }
        }

        let mut new_tris = Vec::with_capacity(self.num_triangles());
        for ti in 0..self.tris.len() {
            if self.dead[ti] {
                continue;
            }
            let [a, b, c] = self.tris[ti];
            new_tris.push([
                VertexId::new(vertex_map[a.index()]),
                VertexId::new(vertex_map[b.index()]),
                VertexId::new(vertex_map[c.index()]),
            ]);
        }

        self.positions = new_positions;
        self.dead = vec![false; new_tris.len()];
        self.tris = new_tris;
        self.num_dead = 0;
    }

    // ==================== Snapshots ====================

    /// Copy out the mesh as a face-vertex snapshot: positions plus
    /// live triangle index triples.
    ///
    /// This is the buffer handed to render/collision consumers; it is
    /// an immutable copy, so later mesh mutations re-derive it rather
    /// than patch it.
    pub fn buffers(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let faces = self
            .tri_ids()
            .map(|t| {
                let [a, b, c] = self.triangle(t);
                [a.index(), b.index(), c.index()]
            })
            .collect();
        (self.positions.clone(), faces)
    }
}

#[inline]
fn sorted(mut verts: [VertexId; 3]) -> [VertexId; 3] {
    verts.sort_unstable();
    verts
}
