//! # Floe
//!
//! A procedural generator for floating ice-sheet meshes.
//!
//! Floe grows a triangulated sheet outward from a seed triangle with an
//! advancing front, roughens it with randomized height coercion, walls
//! it in with a skirt, and can crack it into independent pieces along
//! vertical planes.
//!
//! ## Features
//!
//! - **Advancing-front growth**: one triangle per step, by stitching
//!   existing boundary edges or expanding outward with a new vertex
//! - **Deterministic**: every randomized operation takes an explicit
//!   seeded RNG; a seed maps to exactly one sheet
//! - **Plane splitting**: crack a sheet into a remaining and a drift
//!   mesh with triangle counts conserved
//! - **Skirt walls**: vertical faces rebuilt from the boundary outline,
//!   so sheets read as solid slabs from the side
//!
//! ## Quick Start
//!
//! ```
//! use floe::prelude::*;
//!
//! // Generate a sheet: seed, 50 growth steps, coercion, skirt.
//! let mut generator = FloeGenerator::new(FloeConfig::default(), 42);
//! let mut floe = generator.generate(50).unwrap();
//!
//! println!("surface triangles: {}", floe.surface().num_triangles());
//! println!("skirt triangles:   {}", floe.skirt().num_triangles());
//!
//! // Crack it through the middle.
//! let center = floe.surface().centroid().unwrap();
//! if let Some(drift) = generator
//!     .split(&mut floe, center, nalgebra::Vector3::x())
//!     .unwrap()
//! {
//!     println!("drift triangles: {}", drift.surface().num_triangles());
//! }
//!
//! // Hand the combined buffers to a renderer or collision system.
//! let (positions, faces) = floe.combined_buffers();
//! assert!(!faces.is_empty());
//! # let _ = positions;
//! ```
//!
//! ## Driving the Pipeline by Hand
//!
//! ```
//! use floe::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut floe = Floe::seeded(3.0, &mut rng);
//! for _ in 0..20 {
//!     floe.grow(3.0, 5.0, &mut rng);
//! }
//! floe.coerce(0.0, 0.5, &mut rng);
//! floe.rebuild_skirt(nalgebra::Vector3::y() * 10.0, true).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod floe;
pub mod gen;
pub mod mesh;
pub mod skirt;
pub mod split;
pub mod topology;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use floe::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{FloeError, Result};
    pub use crate::floe::{Floe, FloeConfig, FloeGenerator};
    pub use crate::gen::{AdvancingFront, FrontEdge, Growth};
    pub use crate::mesh::{TriId, TriMesh, VertexId};
    pub use crate::skirt::{build_skirt, unskirt};
    pub use crate::split::{split_mesh, SplitPlane};
    pub use crate::topology::Selection;
}

pub use crate::error::{FloeError, Result};
pub use crate::floe::{Floe, FloeConfig, FloeGenerator};

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_manual_pipeline() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut floe = Floe::seeded(3.0, &mut rng);
        for _ in 0..30 {
            floe.grow(3.0, 5.0, &mut rng);
        }
        floe.coerce(0.0, 0.5, &mut rng);
        floe.rebuild_skirt(nalgebra::Vector3::y() * 10.0, true)
            .unwrap();

        assert!(floe.surface().num_triangles() > 0);
        assert!(floe.skirt().num_triangles() > 0);
        assert!(!floe.front().is_empty());
    }
}
