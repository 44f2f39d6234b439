//! Core mesh data structures.
//!
//! The primary type is [`TriMesh`], a flat arena of vertex positions
//! and triangle index triples. Mesh elements are identified by the
//! type-safe handles [`VertexId`] and [`TriId`]; comparisons are by
//! index, and removal tombstones the slot until the next
//! [`TriMesh::compact`].
//!
//! ```
//! use floe::mesh::TriMesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 0.0, 1.0),
//! ];
//! let mesh = TriMesh::from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! assert_eq!(mesh.num_triangles(), 1);
//! ```

mod index;
mod store;

pub use index::{TriId, VertexId};
pub use store::{TriMesh, AREA_EPS, WELD_EPS};
