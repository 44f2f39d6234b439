//! Plane splitting: cracking a sheet into a remaining and a drift
//! mesh.
//!
//! The splitter partitions a mesh's triangles by a vertical cutting
//! plane. A seed triangle straddling the plane is located nearest the
//! requested point, the crack is propagated outward through adjacent
//! straddling triangles with an explicit work stack, and every
//! triangle ends up wholesale in exactly one of the two meshes:
//! crack triangles go to the side holding the majority of their
//! subdivided area, all others to the side their centroid lies on.
//! Triangle count is therefore conserved across a split.
//!
//! Both resulting meshes must be re-skirted afterwards; the skirt is
//! a pure function of the boundary and is never patched.

mod plane;

use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::mesh::{TriId, TriMesh, VertexId, AREA_EPS, WELD_EPS};

pub use plane::{split_triangle, SplitPlane, TriangleSplit, PLANE_EPS};

use plane::triple_area;

/// Split `mesh` by the vertical plane through `point` along
/// `direction`, detaching the drift side into a new independent mesh.
///
/// Returns `None` when no triangle straddles the plane or nothing
/// lands on the drift side; the source mesh is then left unmodified
/// (a defined no-op, not an error). `direction` must be non-zero with
/// a non-vertical component; callers validate this precondition.
///
/// On success the source keeps the remaining triangles (welded,
/// cleaned, compacted — all prior handles are invalidated) and the
/// returned drift mesh is packaged from raw position triples, then
/// welded so it carries shared vertex identity for re-skirting.
pub fn split_mesh(
    mesh: &mut TriMesh,
    point: Point3<f64>,
    direction: Vector3<f64>,
) -> Option<TriMesh> {
    let cut = SplitPlane::new(point, direction);

    // Clean shared vertices first so the crack walks over real
    // adjacency instead of duplicated seams.
    mesh.weld(WELD_EPS);

    let Some(seed) = find_seed(mesh, &cut, &point) else {
        debug!("split found no straddling triangle; no-op");
        return None;
    };

    let edge_tris = edge_adjacency(mesh);

    // Crack propagation: iterative, with an explicit work stack.
    let mut visited: HashSet<TriId> = HashSet::new();
    let mut crack_side: HashMap<TriId, i8> = HashMap::new();
    let mut sections: Vec<Point3<f64>> = Vec::new();
    let mut stack = vec![seed];

    while let Some(t) = stack.pop() {
        if !visited.insert(t) {
            continue;
        }
        let tri = mesh.tri_positions(t);
        let Some(split) = split_triangle(&cut, &tri) else {
            // The crack no longer crosses here; propagation dies.
            continue;
        };

        // The replacement pieces are merged back into their parent,
        // which transfers wholesale to its majority-area side.
        let pos_area: f64 = split.positive.iter().map(triple_area).sum();
        let neg_area: f64 = split.negative.iter().map(triple_area).sum();
        crack_side.insert(t, if pos_area >= neg_area { 1 } else { -1 });
        sections.extend_from_slice(&split.sections);

        let [a, b, c] = mesh.triangle(t);
        for (u, v) in [(a, b), (b, c), (c, a)] {
            let key = edge_key(u, v);
            if let Some(owners) = edge_tris.get(&key) {
                for &n in owners {
                    if n != t && !visited.contains(&n) {
                        stack.push(n);
                    }
                }
            }
        }
    }

    // Everything the crack never touched classifies purely by side.
    let mut drifters: Vec<TriId> = Vec::new();
    for t in mesh.tri_ids() {
        let side = match crack_side.get(&t) {
            Some(&s) => s,
            None => {
                if cut.signed_distance(&mesh.tri_centroid(t)) < 0.0 {
                    -1
                } else {
                    1
                }
            }
        };
        if side < 0 {
            drifters.push(t);
        }
    }

    if drifters.is_empty() {
        debug!("split crack left nothing on the drift side; no-op");
        return None;
    }

    debug!(
        crack = crack_side.len(),
        sections = sections.len(),
        drifters = drifters.len(),
        "split propagated"
    );

    // Detach: drift triangles leave as raw position triples.
    let triples: Vec<[Point3<f64>; 3]> = drifters.iter().map(|&t| mesh.tri_positions(t)).collect();
    for &t in &drifters {
        mesh.remove_triangle(t);
    }

    // Re-optimize the remainder and rebuild its boundary state.
    mesh.drop_degenerate(AREA_EPS);
    mesh.weld(WELD_EPS);
    mesh.dedup_triangles();
    mesh.compact();

    let mut drift = TriMesh::from_position_triples(&triples);
    drift.weld(WELD_EPS);
    drift.compact();

    Some(drift)
}

/// The triangle straddling the plane whose centroid's tangential
/// projection lies nearest the requested point's.
fn find_seed(mesh: &TriMesh, cut: &SplitPlane, point: &Point3<f64>) -> Option<TriId> {
    let ideal = cut.tangential(point);
    let mut best: Option<(TriId, f64)> = None;

    for t in mesh.tri_ids() {
        if cut.side_of(&mesh.tri_positions(t)) != 0 {
            continue;
        }
        let dist = (cut.tangential(&mesh.tri_centroid(t)) - ideal).abs();
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((t, dist));
        }
    }
    best.map(|(t, _)| t)
}

/// Map each undirected edge to the live triangles owning it.
fn edge_adjacency(mesh: &TriMesh) -> HashMap<(VertexId, VertexId), Vec<TriId>> {
    let mut map: HashMap<(VertexId, VertexId), Vec<TriId>> = HashMap::new();
    for t in mesh.tri_ids() {
        let [a, b, c] = mesh.triangle(t);
        for (u, v) in [(a, b), (b, c), (c, a)] {
            map.entry(edge_key(u, v)).or_default().push(t);
        }
    }
    map
}

#[inline]
fn edge_key(u: VertexId, v: VertexId) -> (VertexId, VertexId) {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}
