//! Skirt walls: the vertical faces that make a floating sheet read as
//! a solid slab.
//!
//! The skirt is a pure function of the surface's current boundary
//! loop. It is fully recomputed after every operation that changes the
//! top-surface topology (growth completion, coercion, splitting) and
//! never patched incrementally. The surface and its skirt live in
//! disjoint meshes; [`unskirt`] exists for adopting combined buffers
//! where wall faces were baked into the surface.

use std::collections::HashMap;

use nalgebra::Vector3;
use tracing::debug;

use crate::error::Result;
use crate::mesh::{TriMesh, VertexId};
use crate::topology::Selection;

/// Face normals deviating from the nominal up by more than this are
/// treated as wall faces, in degrees.
const SKIRT_ANGLE_DEG: f64 = 60.0;

/// Remove every triangle whose face normal deviates from
/// `nominal_up` by more than 60°.
///
/// Strips previously generated wall faces (and anything degenerate
/// enough to have lost a finite normal) so they don't pollute outline
/// computation. Returns the number of triangles removed; tombstones
/// are left for the caller to compact.
pub fn unskirt(mesh: &mut TriMesh, nominal_up: &Vector3<f64>) -> usize {
    let threshold = SKIRT_ANGLE_DEG.to_radians();
    let mut removed = 0usize;

    for t in mesh.tri_ids().collect::<Vec<_>>() {
        let n = mesh.tri_normal(t);
        if !n.x.is_finite() || n.angle(nominal_up) > threshold {
            mesh.remove_triangle(t);
            removed += 1;
        }
    }

    debug!(removed, "stripped skirt faces");
    removed
}

/// Build a fresh skirt mesh from the surface's boundary loop.
///
/// For every directed boundary edge A→B a vertical quad connects the
/// top edge to its copy shifted down by `skirt_vector`, as two
/// outward-facing triangles. With `double_sided`, each triangle is
/// also emitted in the opposite winding so the wall is visible from
/// both sides.
///
/// Fails with [`FloeError::OpenOutline`](crate::FloeError) when the
/// surface boundary is not a single closed loop.
pub fn build_skirt(surface: &TriMesh, skirt_vector: Vector3<f64>, double_sided: bool) -> Result<TriMesh> {
    let outline = Selection::all(surface).outline()?;
    let mut skirt = TriMesh::with_capacity(outline.len() * 2, outline.len() * 4);

    if outline.is_empty() {
        return Ok(skirt);
    }

    // One top and one bottom copy per boundary vertex, shared between
    // adjacent quads.
    let mut corners: HashMap<VertexId, (VertexId, VertexId)> = HashMap::new();
    let mut corner = |skirt: &mut TriMesh, v: VertexId| -> (VertexId, VertexId) {
        *corners.entry(v).or_insert_with(|| {
            let top = *surface.position(v);
            let t = skirt.add_vertex(top);
            let b = skirt.add_vertex(top - skirt_vector);
            (t, b)
        })
    };

    for &(a, b) in &outline {
        let (top_a, bot_a) = corner(&mut skirt, a);
        let (top_b, bot_b) = corner(&mut skirt, b);

        // Outward-facing for an up-wound surface: the boundary edge
        // direction crossed with up points away from the sheet.
        let quad = [[top_a, bot_b, top_b], [top_a, bot_a, bot_b]];
        for tri in quad {
            skirt.add_triangle(tri);
            if double_sided {
                skirt.add_triangle([tri[0], tri[2], tri[1]]);
            }
        }
    }

    debug!(
        boundary_edges = outline.len(),
        triangles = skirt.num_triangles(),
        "rebuilt skirt"
    );
    Ok(skirt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn quad_surface() -> TriMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        TriMesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_skirt_triangle_count() {
        let surface = quad_surface();
        let skirt = build_skirt(&surface, Vector3::y() * 2.0, false).unwrap();
        // 4 boundary edges, one quad (2 triangles) each.
        assert_eq!(skirt.num_triangles(), 8);

        let doubled = build_skirt(&surface, Vector3::y() * 2.0, true).unwrap();
        assert_eq!(doubled.num_triangles(), 16);
    }

    #[test]
    fn test_skirt_closure() {
        // Double-sided: every boundary edge is covered by exactly two
        // wall triangles whose top edge coincides with it.
        let surface = quad_surface();
        let skirt = build_skirt(&surface, Vector3::y() * 2.0, true).unwrap();

        let outline = Selection::all(&surface).outline().unwrap();
        for &(a, b) in &outline {
            let pa = *surface.position(a);
            let pb = *surface.position(b);

            let covering = skirt
                .tri_ids()
                .filter(|&t| {
                    let ps = skirt.tri_positions(t);
                    let has_a = ps.iter().any(|p| (p - pa).norm() < 1e-9);
                    let has_b = ps.iter().any(|p| (p - pb).norm() < 1e-9);
                    has_a && has_b
                })
                .count();
            assert_eq!(covering, 2, "edge {:?} -> {:?}", a, b);
        }
    }

    #[test]
    fn test_skirt_walls_are_vertical_and_outward() {
        let surface = quad_surface();
        let skirt = build_skirt(&surface, Vector3::y() * 2.0, false).unwrap();

        let center = surface.centroid().unwrap();
        for t in skirt.tri_ids() {
            let n = skirt.tri_normal(t);
            assert!(n.y.abs() < 1e-9, "wall face is not vertical: {:?}", n);

            let away = skirt.tri_centroid(t) - center;
            assert!(
                n.dot(&Vector3::new(away.x, 0.0, away.z)) > 0.0,
                "wall face points inward"
            );
        }
    }

    #[test]
    fn test_skirt_spans_vector() {
        let surface = quad_surface();
        let skirt = build_skirt(&surface, Vector3::y() * 3.0, false).unwrap();
        let (min, max) = skirt.bounding_box().unwrap();
        assert_eq!(max.y, 0.0);
        assert_eq!(min.y, -3.0);
    }

    #[test]
    fn test_unskirt_strips_walls() {
        let surface = quad_surface();
        let skirt = build_skirt(&surface, Vector3::y() * 2.0, false).unwrap();

        // Bake surface + skirt into one combined mesh, then strip.
        let mut triples: Vec<[Point3<f64>; 3]> = Vec::new();
        for t in surface.tri_ids() {
            triples.push(surface.tri_positions(t));
        }
        for t in skirt.tri_ids() {
            triples.push(skirt.tri_positions(t));
        }
        let mut combined = TriMesh::from_position_triples(&triples);

        let removed = unskirt(&mut combined, &Vector3::y());
        assert_eq!(removed, 8);
        combined.compact();
        assert_eq!(combined.num_triangles(), 2);
    }

    #[test]
    fn test_empty_surface_gives_empty_skirt() {
        let surface = TriMesh::new();
        let skirt = build_skirt(&surface, Vector3::y() * 2.0, false).unwrap();
        assert!(skirt.is_empty());
    }
}
