//! Mesh generation: advancing-front growth and height coercion.
//!
//! Growth is randomized but fully reproducible: every operation takes
//! an explicit RNG, so two runs with the same seed produce the same
//! sheet and two runs with different seeds never do.

mod coerce;
mod front;

pub use coerce::coerce;
pub use front::{AdvancingFront, FrontEdge, Growth};

pub(crate) use front::up;
