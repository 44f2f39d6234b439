//! Error types for floe.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`FloeError`].
pub type Result<T> = std::result::Result<T, FloeError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum FloeError {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// A triangle references an invalid vertex index.
    #[error("triangle {triangle} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        triangle: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A triangle has duplicate vertex indices.
    #[error("triangle {triangle} is degenerate (has duplicate vertices)")]
    DegenerateTriangle {
        /// The triangle index.
        triangle: usize,
    },

    /// Boundary edges did not chain into a single closed loop.
    ///
    /// Outline assembly requires exactly one simple boundary loop;
    /// disjoint loops or dangling edges produce this error.
    #[error("boundary edges do not form a single closed loop ({chained} of {total} chained)")]
    OpenOutline {
        /// How many edges were chained before the loop broke.
        chained: usize,
        /// Total number of boundary edges found.
        total: usize,
    },
}
