//! Height coercion: randomized per-vertex elevation perturbation.
//!
//! Large height deltas between adjacent vertices can push face
//! normals past the "roughly horizontal" assumption that skirt
//! detection and split-plane classification rely on, so coercion is a
//! structural pass, not just a position write: it perturbs, then
//! drops degenerate triangles, welds coincident vertices, removes
//! duplicates, and compacts. Callers re-derive the front/outline
//! afterwards (handles are invalidated by compaction).

use rand::Rng;
use tracing::debug;

use crate::mesh::{TriMesh, AREA_EPS, WELD_EPS};

/// Add `uniform(min, max)` to every vertex's height independently,
/// then run the structural cleanup pass.
///
/// Returns the number of triangles dropped by cleanup.
pub fn coerce(mesh: &mut TriMesh, min: f64, max: f64, rng: &mut impl Rng) -> usize {
    for v in mesh.vertex_ids().collect::<Vec<_>>() {
        let delta = if max > min {
            rng.random_range(min..max)
        } else {
            min
        };
        let mut pos = *mesh.position(v);
        pos.y += delta;
        mesh.set_position(v, pos);
    }

    let before = mesh.num_triangles();
    mesh.drop_degenerate(AREA_EPS);
    mesh.weld(WELD_EPS);
    mesh.dedup_triangles();
    let dropped = before - mesh.num_triangles();
    mesh.compact();

    debug!(min, max, dropped, "coerced vertex heights");
    dropped
}
