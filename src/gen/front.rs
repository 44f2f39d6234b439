//! Advancing-front mesh growth.
//!
//! The front is the working set of boundary edges of the growing
//! sheet. Every edge is directed the way its owning triangle traverses
//! it, so for an up-facing sheet the outward direction of a front edge
//! is `dir × up`. Growth extends the sheet one triangle per call,
//! either by stitching two existing front edges together or by
//! expanding outward with a fresh vertex.

use nalgebra::{Point3, Vector3};
use rand::Rng;
use tracing::trace;

use crate::mesh::{TriMesh, VertexId};
use crate::topology::Selection;

/// Minimum direction difference between two front edges for an
/// angle-stitch, in degrees.
const ANGLE_STITCH_MIN_DEG: f64 = 130.0;

/// Cone half-angle around `up` inside which a stitch candidate's
/// cross product marks it as a fold-over, in degrees.
const FOLD_REJECT_DEG: f64 = 30.0;

/// The sheet's nominal up direction.
#[inline]
pub(crate) fn up() -> Vector3<f64> {
    Vector3::y()
}

/// What a single growth call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// The front was empty; the seed triangle was spawned.
    Seeded,
    /// Two front edges were closed with a triangle over existing
    /// vertices (+1 triangle, -1 front edge).
    Stitched,
    /// A new vertex was created outward of a front edge
    /// (+1 vertex, +1 triangle, +1 front edge).
    Expanded,
}

/// A directed edge on the growing boundary, owned by exactly one
/// triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontEdge {
    /// Start vertex.
    pub a: VertexId,
    /// End vertex.
    pub b: VertexId,
}

/// How a stitch candidate connects to the picked edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sharing {
    /// Candidate starts where the picked edge ends.
    Follower,
    /// Candidate ends where the picked edge starts.
    Preceder,
}

/// Advancing-front generator state.
///
/// Holds only the open front edges; all topology lives in the
/// [`TriMesh`] being grown. The front always forms one or more closed
/// loops with no dangling edges.
#[derive(Debug, Default)]
pub struct AdvancingFront {
    edges: Vec<FrontEdge>,
}

impl AdvancingFront {
    /// Create a generator with an empty front.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current number of front edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check whether the front is empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The current front edges, in no particular order.
    pub fn edges(&self) -> &[FrontEdge] {
        &self.edges
    }

    /// Spawn the seed triangle: three vertices at 120°-apart
    /// directions scaled by `radius * [0.9, 1.1]` jitter, wound to
    /// face up, with all three sides registered as front edges.
    ///
    /// Precondition: the front is empty. `radius` must be positive;
    /// results for non-positive radii are undefined.
    pub fn spawn_first(&mut self, mesh: &mut TriMesh, radius: f64, rng: &mut impl Rng) {
        debug_assert!(self.edges.is_empty(), "seed requires an empty front");

        let mut verts = [VertexId::invalid(); 3];
        for (i, vert) in verts.iter_mut().enumerate() {
            // Clockwise from above, so the triangle faces up.
            let theta = -(i as f64) * 120.0_f64.to_radians();
            let r = radius * rng.random_range(0.9..1.1);
            let pos = Point3::new(theta.cos() * r, 0.0, theta.sin() * r);
            *vert = mesh.add_vertex(pos);
        }

        mesh.add_triangle(verts);
        self.edges.push(FrontEdge {
            a: verts[0],
            b: verts[1],
        });
        self.edges.push(FrontEdge {
            a: verts[1],
            b: verts[2],
        });
        self.edges.push(FrontEdge {
            a: verts[2],
            b: verts[0],
        });

        trace!(radius, "spawned seed triangle");
    }

    /// Grow the mesh by one triangle.
    ///
    /// Picks a front edge uniformly at random and tries, in order: an
    /// angle-stitch, a distance-stitch within `stitch_radius`, and
    /// finally an outward expansion scaled by `gen_radius`. An empty
    /// front spawns the seed instead.
    ///
    /// Radii must be positive; results for non-positive radii are
    /// undefined.
    pub fn grow_once(
        &mut self,
        mesh: &mut TriMesh,
        gen_radius: f64,
        stitch_radius: f64,
        rng: &mut impl Rng,
    ) -> Growth {
        if self.edges.is_empty() {
            self.spawn_first(mesh, gen_radius, rng);
            return Growth::Seeded;
        }

        let picked = rng.random_range(0..self.edges.len());

        // A three-edge front can only stitch into a second cover of
        // the disk it bounds; expansion is the only valid move.
        if self.edges.len() > 3 {
            if let Some(other) = self.find_angle_stitch(mesh, picked) {
                self.stitch(mesh, picked, other);
                return Growth::Stitched;
            }
            if let Some(other) = self.find_distance_stitch(mesh, picked, stitch_radius) {
                self.stitch(mesh, picked, other);
                return Growth::Stitched;
            }
        }

        self.expand(mesh, picked, gen_radius, rng);
        Growth::Expanded
    }

    /// Re-derive the front from the mesh's current boundary.
    ///
    /// Used after structural cleanup passes (welding, coercion,
    /// splitting) that invalidate the bookkeeping built up during
    /// growth.
    pub fn rebuild_from(&mut self, mesh: &TriMesh) {
        self.edges = Selection::all(mesh)
            .boundary_edges()
            .into_iter()
            .map(|(a, b)| FrontEdge { a, b })
            .collect();
    }

    // ==================== Stitching ====================

    /// How `candidate` shares a vertex with `picked`, if it shares
    /// exactly one and can be glued with consistent winding.
    fn sharing(picked: FrontEdge, candidate: FrontEdge) -> Option<Sharing> {
        let shares_start = candidate.a == picked.a || candidate.a == picked.b;
        let shares_end = candidate.b == picked.a || candidate.b == picked.b;
        if shares_start && shares_end {
            return None;
        }
        if candidate.a == picked.b {
            return Some(Sharing::Follower);
        }
        if candidate.b == picked.a {
            return Some(Sharing::Preceder);
        }
        // Same-direction sharing (a pinched front); no consistent glue.
        None
    }

    /// The vertex of `candidate` not shared with the picked edge.
    fn free_vertex(candidate: FrontEdge, sharing: Sharing) -> VertexId {
        match sharing {
            Sharing::Follower => candidate.b,
            Sharing::Preceder => candidate.a,
        }
    }

    /// Scan for the first candidate whose direction differs from the
    /// picked edge's by more than the stitch angle and whose implied
    /// triangle is new.
    fn find_angle_stitch(&self, mesh: &TriMesh, picked: usize) -> Option<usize> {
        let e = self.edges[picked];
        let e_dir = self.direction(mesh, e);
        let threshold = ANGLE_STITCH_MIN_DEG.to_radians();

        for (j, &f) in self.edges.iter().enumerate() {
            if j == picked {
                continue;
            }
            let Some(sharing) = Self::sharing(e, f) else {
                continue;
            };
            let f_dir = self.direction(mesh, f);
            if e_dir.angle(&f_dir) <= threshold {
                continue;
            }
            let w = Self::free_vertex(f, sharing);
            if mesh.contains_triangle([e.a, e.b, w]) {
                continue;
            }
            return Some(j);
        }
        None
    }

    /// Among candidates sharing one vertex with the picked edge, drop
    /// fold-over cases and pick the nearest free vertex within
    /// `stitch_radius` of the picked edge's midpoint.
    fn find_distance_stitch(
        &self,
        mesh: &TriMesh,
        picked: usize,
        stitch_radius: f64,
    ) -> Option<usize> {
        let e = self.edges[picked];
        let e_dir = self.direction(mesh, e);
        let mid = self.midpoint(mesh, e);
        let fold_cone = FOLD_REJECT_DEG.to_radians();

        let mut best: Option<(usize, f64)> = None;
        for (j, &f) in self.edges.iter().enumerate() {
            if j == picked {
                continue;
            }
            let Some(sharing) = Self::sharing(e, f) else {
                continue;
            };
            let w = Self::free_vertex(f, sharing);
            let to_w = mesh.position(w) - mid;

            // Near-vertical cross means the candidate sits over the
            // sheet interior (or edge-on); stitching there folds the
            // front back over itself.
            let cross = e_dir.cross(&to_w);
            if cross.norm() < 1e-9 || cross.angle(&up()) < fold_cone {
                continue;
            }

            let dist = to_w.norm();
            if dist > stitch_radius {
                continue;
            }
            if mesh.contains_triangle([e.a, e.b, w]) {
                continue;
            }
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((j, dist));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Close the gap between two front edges with one triangle over
    /// existing vertices.
    ///
    /// The emitted triangle traverses both consumed edges opposite to
    /// their stored direction, which keeps its normal consistent with
    /// the rest of the sheet regardless of which endpoint is shared.
    fn stitch(&mut self, mesh: &mut TriMesh, picked: usize, other: usize) {
        let e = self.edges[picked];
        let f = self.edges[other];
        let sharing = Self::sharing(e, f).expect("stitch candidates share one vertex");

        let glued = match sharing {
            Sharing::Follower => {
                // e: a->b, f: b->c  =>  triangle (c, b, a), new edge a->c.
                mesh.add_triangle([f.b, e.b, e.a]);
                FrontEdge { a: e.a, b: f.b }
            }
            Sharing::Preceder => {
                // f: c->a, e: a->b  =>  triangle (b, a, c), new edge c->b.
                mesh.add_triangle([e.b, e.a, f.a]);
                FrontEdge { a: f.a, b: e.b }
            }
        };

        let (hi, lo) = if picked > other {
            (picked, other)
        } else {
            (other, picked)
        };
        self.edges.swap_remove(hi);
        self.edges.swap_remove(lo);
        self.edges.push(glued);

        trace!(?glued, "stitched front edges");
    }

    // ==================== Expansion ====================

    /// Synthesize a new vertex outward of the picked edge and emit the
    /// triangle connecting it to the edge's endpoints.
    fn expand(&mut self, mesh: &mut TriMesh, picked: usize, gen_radius: f64, rng: &mut impl Rng) {
        let e = self.edges[picked];
        let pa = *mesh.position(e.a);
        let pb = *mesh.position(e.b);
        let edge_vec = pb - pa;
        let dir = edge_vec.normalize();
        let mid = Point3::from((pa.coords + pb.coords) * 0.5);
        let outward = dir.cross(&up());

        let reach = gen_radius * rng.random_range(0.8..2.0);
        let lateral = edge_vec * rng.random_range(-0.25..0.25);
        let pos = mid + outward * reach + lateral;

        let v = mesh.add_vertex(pos);
        mesh.add_triangle([e.b, e.a, v]);

        self.edges[picked] = FrontEdge { a: e.a, b: v };
        self.edges.push(FrontEdge { a: v, b: e.b });

        trace!(vertex = ?v, "expanded front");
    }

    // ==================== Helpers ====================

    fn direction(&self, mesh: &TriMesh, e: FrontEdge) -> Vector3<f64> {
        (mesh.position(e.b) - mesh.position(e.a)).normalize()
    }

    fn midpoint(&self, mesh: &TriMesh, e: FrontEdge) -> Point3<f64> {
        Point3::from((mesh.position(e.a).coords + mesh.position(e.b).coords) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Every front edge must be a boundary edge of the mesh, and every
    /// boundary edge must be on the front.
    fn assert_front_matches_boundary(front: &AdvancingFront, mesh: &TriMesh) {
        let boundary: HashSet<(VertexId, VertexId)> =
            Selection::all(mesh).boundary_edges().into_iter().collect();
        let front_set: HashSet<(VertexId, VertexId)> =
            front.edges().iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(front_set, boundary);
    }

    #[test]
    fn test_seed_invariant() {
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        front.spawn_first(&mut mesh, 3.0, &mut rng(1));

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(front.len(), 3);

        // Vertices pairwise distinct and jitter within bounds.
        let positions: Vec<_> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
        for i in 0..3 {
            for j in (i + 1)..3 {
                assert!((positions[i] - positions[j]).norm() > 1e-6);
            }
            let r = positions[i].coords.norm();
            assert!(r >= 3.0 * 0.9 && r <= 3.0 * 1.1);
        }
        assert_front_matches_boundary(&front, &mesh);
    }

    #[test]
    fn test_grow_on_empty_front_seeds() {
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        let growth = front.grow_once(&mut mesh, 3.0, 5.0, &mut rng(2));
        assert_eq!(growth, Growth::Seeded);
        assert_eq!(mesh.num_triangles(), 1);
    }

    #[test]
    fn test_single_growth_without_stitch() {
        // Stitch radius far too small to ever match: the one growth
        // step must be an expansion.
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        front.spawn_first(&mut mesh, 3.0, &mut rng(3));

        let growth = front.grow_once(&mut mesh, 3.0, 0.01, &mut rng(4));
        assert_eq!(growth, Growth::Expanded);
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(front.len(), 4);
        assert_front_matches_boundary(&front, &mesh);
    }

    #[test]
    fn test_growth_conservation() {
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        let mut r = rng(42);
        front.spawn_first(&mut mesh, 3.0, &mut r);

        for _ in 0..60 {
            let before = (mesh.num_vertices(), mesh.num_triangles(), front.len());
            let growth = front.grow_once(&mut mesh, 3.0, 5.0, &mut r);
            let after = (mesh.num_vertices(), mesh.num_triangles(), front.len());

            match growth {
                Growth::Expanded => {
                    assert_eq!(after.0, before.0 + 1);
                    assert_eq!(after.1, before.1 + 1);
                    assert_eq!(after.2, before.2 + 1);
                }
                Growth::Stitched => {
                    assert_eq!(after.0, before.0);
                    assert_eq!(after.1, before.1 + 1);
                    assert_eq!(after.2, before.2 - 1);
                }
                Growth::Seeded => panic!("front was not empty"),
            }
        }
        assert_front_matches_boundary(&front, &mesh);
    }

    #[test]
    fn test_growth_produces_no_degenerates() {
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        let mut r = rng(7);
        for _ in 0..50 {
            front.grow_once(&mut mesh, 3.0, 5.0, &mut r);
        }
        for t in mesh.tri_ids() {
            assert!(mesh.tri_area(t) > crate::mesh::AREA_EPS);
        }
    }

    #[test]
    fn test_growth_no_duplicate_triangles() {
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        let mut r = rng(11);
        for _ in 0..50 {
            front.grow_once(&mut mesh, 3.0, 5.0, &mut r);
        }
        assert_eq!(mesh.dedup_triangles(), 0);
    }

    #[test]
    fn test_consistent_winding() {
        // All face normals of the planar growth phase point up.
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        let mut r = rng(13);
        for _ in 0..50 {
            front.grow_once(&mut mesh, 3.0, 5.0, &mut r);
        }
        for t in mesh.tri_ids() {
            assert!(
                mesh.tri_normal(t).y > 0.99,
                "triangle {:?} flipped",
                mesh.triangle(t)
            );
        }
    }

    #[test]
    fn test_rebuild_from_mesh() {
        let mut mesh = TriMesh::new();
        let mut front = AdvancingFront::new();
        let mut r = rng(17);
        for _ in 0..20 {
            front.grow_once(&mut mesh, 3.0, 5.0, &mut r);
        }

        let mut rebuilt = AdvancingFront::new();
        rebuilt.rebuild_from(&mesh);

        let a: HashSet<_> = front.edges().iter().map(|e| (e.a, e.b)).collect();
        let b: HashSet<_> = rebuilt.edges().iter().map(|e| (e.a, e.b)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let grow = |seed: u64| {
            let mut mesh = TriMesh::new();
            let mut front = AdvancingFront::new();
            let mut r = rng(seed);
            for _ in 0..10 {
                front.grow_once(&mut mesh, 3.0, 5.0, &mut r);
            }
            mesh.vertex_ids()
                .map(|v| *mesh.position(v))
                .collect::<Vec<_>>()
        };
        assert_ne!(grow(1), grow(2));
    }
}
