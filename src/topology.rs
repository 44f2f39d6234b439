//! Boundary-outline queries over triangle subsets.
//!
//! Edges are derived from triangle sides on demand: within a
//! [`Selection`], an edge owned by exactly one triangle is a boundary
//! edge, and an edge owned by two is interior. Boundary edges keep the
//! direction in which their owning triangle traverses them, so a
//! consistently wound surface yields a consistently oriented outline.

use std::collections::HashMap;

use crate::error::{FloeError, Result};
use crate::mesh::{TriId, TriMesh, VertexId};

/// A read-only view of a subset of a mesh's triangles.
///
/// Selections are transient: they are built, queried for an outline,
/// and dropped. Nothing here is persisted in the mesh.
pub struct Selection<'a> {
    mesh: &'a TriMesh,
    tris: Vec<TriId>,
}

impl<'a> Selection<'a> {
    /// Create a selection over an explicit triangle subset.
    pub fn new(mesh: &'a TriMesh, tris: impl IntoIterator<Item = TriId>) -> Self {
        Self {
            mesh,
            tris: tris.into_iter().collect(),
        }
    }

    /// Create a selection over every live triangle of the mesh.
    pub fn all(mesh: &'a TriMesh) -> Self {
        let tris = mesh.tri_ids().collect();
        Self { mesh, tris }
    }

    /// The number of triangles in the selection.
    pub fn len(&self) -> usize {
        self.tris.len()
    }

    /// Check whether the selection is empty.
    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    /// The selected triangle IDs.
    pub fn tris(&self) -> &[TriId] {
        &self.tris
    }

    /// Collect the directed boundary edges of the selection.
    ///
    /// Counts ownership of each undirected edge within the subset;
    /// edges with exactly one owner are boundary edges, reported in
    /// the direction their owning triangle traverses them. Order is
    /// arbitrary; see [`sequentialize`] for loop assembly.
    pub fn boundary_edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut owners: HashMap<(VertexId, VertexId), (usize, (VertexId, VertexId))> =
            HashMap::new();

        for &t in &self.tris {
            let [a, b, c] = self.mesh.triangle(t);
            for (u, v) in [(a, b), (b, c), (c, a)] {
                let key = if u < v { (u, v) } else { (v, u) };
                let entry = owners.entry(key).or_insert((0, (u, v)));
                entry.0 += 1;
            }
        }

        owners
            .into_values()
            .filter(|(count, _)| *count == 1)
            .map(|(_, directed)| directed)
            .collect()
    }

    /// Compute the ordered boundary loop of the selection.
    ///
    /// Equivalent to [`boundary_edges`](Self::boundary_edges) followed
    /// by [`sequentialize`].
    pub fn outline(&self) -> Result<Vec<(VertexId, VertexId)>> {
        sequentialize(self.boundary_edges())
    }
}

/// Chain boundary edges into one ordered cyclic loop.
///
/// Repeatedly appends the edge whose start vertex equals the previous
/// edge's end vertex. The input must form exactly one simple closed
/// loop; dangling edges or multiple disjoint loops produce
/// [`FloeError::OpenOutline`].
pub fn sequentialize(edges: Vec<(VertexId, VertexId)>) -> Result<Vec<(VertexId, VertexId)>> {
    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let total = edges.len();
    let mut by_start: HashMap<VertexId, Vec<usize>> = HashMap::new();
    for (i, &(start, _)) in edges.iter().enumerate() {
        by_start.entry(start).or_default().push(i);
    }

    let mut used = vec![false; total];
    let mut chain = Vec::with_capacity(total);

    let first = edges[0];
    used[0] = true;
    chain.push(first);

    let mut cursor = first.1;
    while cursor != first.0 {
        let next = by_start
            .get(&cursor)
            .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));

        match next {
            Some(i) => {
                used[i] = true;
                chain.push(edges[i]);
                cursor = edges[i].1;
            }
            None => {
                return Err(FloeError::OpenOutline {
                    chained: chain.len(),
                    total,
                });
            }
        }
    }

    if chain.len() != total {
        // Closed early: a second disjoint loop is left over.
        return Err(FloeError::OpenOutline {
            chained: chain.len(),
            total,
        });
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn quad_mesh() -> TriMesh {
        // A unit quad in the y=0 plane, two up-facing triangles.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        TriMesh::from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_boundary_edges_of_quad() {
        let mesh = quad_mesh();
        let selection = Selection::all(&mesh);
        let edges = selection.boundary_edges();

        // The diagonal (0, 2) is interior; the four rim edges remain.
        assert_eq!(edges.len(), 4);
        for &(u, v) in &edges {
            assert!(!(u.index() == 0 && v.index() == 2));
            assert!(!(u.index() == 2 && v.index() == 0));
        }
    }

    #[test]
    fn test_outline_chains_into_loop() {
        let mesh = quad_mesh();
        let outline = Selection::all(&mesh).outline().unwrap();

        assert_eq!(outline.len(), 4);
        for window in outline.windows(2) {
            assert_eq!(window[0].1, window[1].0);
        }
        assert_eq!(outline.last().unwrap().1, outline[0].0);
    }

    #[test]
    fn test_subset_selection_outline() {
        let mesh = quad_mesh();
        let first = mesh.tri_ids().next().unwrap();
        let outline = Selection::new(&mesh, [first]).outline().unwrap();

        // A single triangle's outline is its three sides.
        assert_eq!(outline.len(), 3);
    }

    #[test]
    fn test_disjoint_loops_rejected() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(11.0, 0.0, 0.0),
            Point3::new(10.5, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [3, 4, 5]];
        let mesh = TriMesh::from_triangles(&vertices, &faces).unwrap();

        let result = Selection::all(&mesh).outline();
        assert!(matches!(result, Err(FloeError::OpenOutline { .. })));
    }

    #[test]
    fn test_empty_selection() {
        let mesh = quad_mesh();
        let selection = Selection::new(&mesh, []);
        assert!(selection.is_empty());
        assert!(selection.outline().unwrap().is_empty());
    }
}
