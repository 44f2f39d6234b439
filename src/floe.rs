//! The ice-sheet aggregate and the generation service driving it.
//!
//! A [`Floe`] owns the three pieces of sheet state: the top-surface
//! mesh, its skirt mesh, and the advancing front. The surface and the
//! skirt are disjoint meshes; the skirt is a pure function of the
//! surface boundary and is cleared (not patched) by every operation
//! that changes it.
//!
//! [`FloeGenerator`] packages the whole pipeline behind a config and a
//! seeded RNG, so a world seed maps to exactly one sheet.

use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::Result;
use crate::gen::{coerce, up, AdvancingFront, Growth};
use crate::mesh::{TriMesh, WELD_EPS};
use crate::skirt::{build_skirt, unskirt};
use crate::split::split_mesh;

/// Generation parameters.
///
/// Defaults match the tuning the generator ships with; all radii are
/// in world units.
#[derive(Debug, Clone)]
pub struct FloeConfig {
    /// Seed radius and outward expansion scale.
    pub gen_radius: f64,
    /// Maximum gap closed by a distance-stitch.
    pub stitch_radius: f64,
    /// Height coercion range `(min, max)` added to each vertex.
    pub coercion: (f64, f64),
    /// Downward extent of the skirt walls.
    pub skirt: Vector3<f64>,
    /// Emit skirt walls in both winding orders.
    pub double_sided_skirt: bool,
}

impl Default for FloeConfig {
    fn default() -> Self {
        Self {
            gen_radius: 3.0,
            stitch_radius: 5.0,
            coercion: (0.0, 0.5),
            skirt: up() * 10.0,
            double_sided_skirt: true,
        }
    }
}

/// An ice sheet: top surface, skirt, and the growth front.
#[derive(Debug, Default)]
pub struct Floe {
    surface: TriMesh,
    skirt: TriMesh,
    front: AdvancingFront,
}

impl Floe {
    /// Create a sheet holding just the seed triangle.
    pub fn seeded(radius: f64, rng: &mut impl Rng) -> Self {
        let mut floe = Self::default();
        floe.front.spawn_first(&mut floe.surface, radius, rng);
        floe
    }

    /// Adopt an externally produced face-vertex snapshot, typically
    /// one written out by [`combined_buffers`](Self::combined_buffers).
    ///
    /// The input is welded, baked-in skirt faces are stripped, the
    /// front is re-derived from the surviving boundary and a fresh
    /// skirt is built from it.
    pub fn from_buffers(
        vertices: &[Point3<f64>],
        faces: &[[usize; 3]],
        skirt_vector: Vector3<f64>,
        double_sided: bool,
    ) -> Result<Self> {
        let mut surface = TriMesh::from_triangles(vertices, faces)?;
        surface.weld(WELD_EPS);
        let stripped = unskirt(&mut surface, &up());
        surface.dedup_triangles();
        surface.compact();
        debug!(
            stripped,
            triangles = surface.num_triangles(),
            "adopted external buffers"
        );

        let mut floe = Self {
            surface,
            skirt: TriMesh::new(),
            front: AdvancingFront::new(),
        };
        floe.front.rebuild_from(&floe.surface);
        floe.rebuild_skirt(skirt_vector, double_sided)?;
        Ok(floe)
    }

    /// Grow the surface by one triangle. See
    /// [`AdvancingFront::grow_once`].
    ///
    /// The skirt goes stale; rebuild it once growth is done.
    pub fn grow(&mut self, gen_radius: f64, stitch_radius: f64, rng: &mut impl Rng) -> Growth {
        self.front
            .grow_once(&mut self.surface, gen_radius, stitch_radius, rng)
    }

    /// Randomize vertex heights within `[min, max)` and run structural
    /// cleanup, then re-derive the front. Returns the number of
    /// triangles dropped by cleanup.
    ///
    /// The skirt goes stale; rebuild it afterwards.
    pub fn coerce(&mut self, min: f64, max: f64, rng: &mut impl Rng) -> usize {
        let dropped = coerce(&mut self.surface, min, max, rng);
        self.front.rebuild_from(&self.surface);
        dropped
    }

    /// Crack the sheet by the vertical plane through `point` along
    /// `direction`, detaching the drift side as a new sheet.
    ///
    /// `None` means nothing straddled the plane or nothing drifted;
    /// the sheet is then unchanged. On a successful split both sheets
    /// carry re-derived fronts and cleared skirts; rebuild the skirts
    /// before handing buffers out.
    pub fn split(&mut self, point: Point3<f64>, direction: Vector3<f64>) -> Option<Floe> {
        let drift_surface = split_mesh(&mut self.surface, point, direction)?;
        self.front.rebuild_from(&self.surface);
        self.skirt = TriMesh::new();

        let mut drift = Floe {
            surface: drift_surface,
            skirt: TriMesh::new(),
            front: AdvancingFront::new(),
        };
        drift.front.rebuild_from(&drift.surface);
        Some(drift)
    }

    /// Rebuild the skirt from the surface's current boundary loop.
    pub fn rebuild_skirt(&mut self, skirt_vector: Vector3<f64>, double_sided: bool) -> Result<()> {
        self.skirt = build_skirt(&self.surface, skirt_vector, double_sided)?;
        Ok(())
    }

    /// The top-surface mesh.
    pub fn surface(&self) -> &TriMesh {
        &self.surface
    }

    /// The skirt mesh (empty until [`rebuild_skirt`](Self::rebuild_skirt)).
    pub fn skirt(&self) -> &TriMesh {
        &self.skirt
    }

    /// The advancing front tracking the surface boundary.
    pub fn front(&self) -> &AdvancingFront {
        &self.front
    }

    /// Snapshot of the surface buffers. See [`TriMesh::buffers`].
    pub fn surface_buffers(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        self.surface.buffers()
    }

    /// Snapshot of the skirt buffers. See [`TriMesh::buffers`].
    pub fn skirt_buffers(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        self.skirt.buffers()
    }

    /// Single combined surface + skirt snapshot, the shape render and
    /// collision consumers want. Skirt indices are offset past the
    /// surface vertices.
    pub fn combined_buffers(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let (mut positions, mut faces) = self.surface.buffers();
        let (skirt_positions, skirt_faces) = self.skirt.buffers();
        let base = positions.len();
        positions.extend(skirt_positions);
        faces.extend(
            skirt_faces
                .into_iter()
                .map(|[a, b, c]| [a + base, b + base, c + base]),
        );
        (positions, faces)
    }
}

/// The full generation pipeline behind one config and one seed.
#[derive(Debug)]
pub struct FloeGenerator {
    config: FloeConfig,
    rng: StdRng,
}

impl FloeGenerator {
    /// Create a generator. The same `(config, seed)` pair always
    /// produces the same sheets, in the same order.
    pub fn new(config: FloeConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The generation parameters in use.
    pub fn config(&self) -> &FloeConfig {
        &self.config
    }

    /// Run the whole pipeline: seed, `iterations` growth steps, height
    /// coercion, skirt.
    pub fn generate(&mut self, iterations: usize) -> Result<Floe> {
        let mut floe = Floe::seeded(self.config.gen_radius, &mut self.rng);
        for _ in 0..iterations {
            floe.grow(
                self.config.gen_radius,
                self.config.stitch_radius,
                &mut self.rng,
            );
        }
        let (min, max) = self.config.coercion;
        floe.coerce(min, max, &mut self.rng);
        floe.rebuild_skirt(self.config.skirt, self.config.double_sided_skirt)?;

        debug!(
            iterations,
            triangles = floe.surface().num_triangles(),
            skirt_triangles = floe.skirt().num_triangles(),
            "generated floe"
        );
        Ok(floe)
    }

    /// Split a sheet and re-skirt both halves with the configured
    /// skirt. `None` is the same no-op as [`Floe::split`].
    pub fn split(
        &mut self,
        floe: &mut Floe,
        point: Point3<f64>,
        direction: Vector3<f64>,
    ) -> Result<Option<Floe>> {
        let Some(mut drift) = floe.split(point, direction) else {
            return Ok(None);
        };
        floe.rebuild_skirt(self.config.skirt, self.config.double_sided_skirt)?;
        drift.rebuild_skirt(self.config.skirt, self.config.double_sided_skirt)?;
        Ok(Some(drift))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_seeded_floe() {
        let floe = Floe::seeded(3.0, &mut rng(1));
        assert_eq!(floe.surface().num_triangles(), 1);
        assert_eq!(floe.front().len(), 3);
        assert!(floe.skirt().is_empty());
    }

    #[test]
    fn test_grow_then_split_conserves_triangles() {
        // Seed plus 20 growth steps, then crack through the middle:
        // both halves non-empty, triangle counts summing to 21.
        let mut r = rng(42);
        let mut floe = Floe::seeded(3.0, &mut r);
        for _ in 0..20 {
            floe.grow(3.0, 5.0, &mut r);
        }
        assert_eq!(floe.surface().num_triangles(), 21);

        let center = floe.surface().centroid().unwrap();
        let drift = floe
            .split(center, Vector3::x())
            .expect("a cut through the centroid detaches something");

        let kept = floe.surface().num_triangles();
        let gone = drift.surface().num_triangles();
        assert!(kept > 0);
        assert!(gone > 0);
        assert_eq!(kept + gone, 21);
    }

    #[test]
    fn test_split_rebuilds_fronts() {
        let mut r = rng(42);
        let mut floe = Floe::seeded(3.0, &mut r);
        for _ in 0..20 {
            floe.grow(3.0, 5.0, &mut r);
        }
        let center = floe.surface().centroid().unwrap();
        let drift = floe.split(center, Vector3::x()).unwrap();

        // Both fronts must match their mesh's boundary again.
        for f in [&floe, &drift] {
            let mut rebuilt = AdvancingFront::new();
            rebuilt.rebuild_from(f.surface());
            assert_eq!(rebuilt.len(), f.front().len());
            assert!(!f.front().is_empty());
        }
        assert!(floe.skirt().is_empty());
        assert!(drift.skirt().is_empty());
    }

    #[test]
    fn test_generate_pipeline() {
        let mut generator = FloeGenerator::new(FloeConfig::default(), 7);
        let floe = generator.generate(25).unwrap();

        assert!(!floe.surface().is_empty());
        assert!(!floe.skirt().is_empty());

        // Coercion defaults keep every height in [0, 0.5).
        for v in floe.surface().vertex_ids() {
            let y = floe.surface().position(v).y;
            assert!((0.0..0.5).contains(&y));
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let gen_once = || {
            let mut generator = FloeGenerator::new(FloeConfig::default(), 99);
            let floe = generator.generate(15).unwrap();
            floe.combined_buffers()
        };
        let (pos_a, faces_a) = gen_once();
        let (pos_b, faces_b) = gen_once();
        assert_eq!(pos_a, pos_b);
        assert_eq!(faces_a, faces_b);
    }

    #[test]
    fn test_combined_buffers_layout() {
        let mut generator = FloeGenerator::new(FloeConfig::default(), 3);
        let floe = generator.generate(10).unwrap();

        let (positions, faces) = floe.combined_buffers();
        let (surface_positions, surface_faces) = floe.surface_buffers();
        let (skirt_positions, skirt_faces) = floe.skirt_buffers();

        assert_eq!(positions.len(), surface_positions.len() + skirt_positions.len());
        assert_eq!(faces.len(), surface_faces.len() + skirt_faces.len());
        for face in &faces {
            for &i in face {
                assert!(i < positions.len());
            }
        }
    }

    #[test]
    fn test_from_buffers_roundtrip() {
        // Adopting a combined snapshot recovers the same surface and
        // an equivalent skirt.
        let mut r = rng(9);
        let mut floe = Floe::seeded(3.0, &mut r);
        for _ in 0..10 {
            floe.grow(3.0, 5.0, &mut r);
        }
        floe.rebuild_skirt(up() * 10.0, true).unwrap();

        let (positions, faces) = floe.combined_buffers();
        let adopted = Floe::from_buffers(&positions, &faces, up() * 10.0, true).unwrap();

        assert_eq!(
            adopted.surface().num_triangles(),
            floe.surface().num_triangles()
        );
        assert_eq!(adopted.skirt().num_triangles(), floe.skirt().num_triangles());
        assert_eq!(adopted.front().len(), floe.front().len());
    }

    #[test]
    fn test_generator_split_reskirts() {
        let mut generator = FloeGenerator::new(FloeConfig::default(), 21);
        let mut floe = generator.generate(20).unwrap();

        let center = floe.surface().centroid().unwrap();
        let drift = generator
            .split(&mut floe, center, Vector3::x())
            .unwrap()
            .expect("centroid cut detaches something");

        assert!(!floe.skirt().is_empty());
        assert!(!drift.skirt().is_empty());
    }

    #[test]
    fn test_split_noop_keeps_sheet() {
        let mut r = rng(4);
        let mut floe = Floe::seeded(3.0, &mut r);
        for _ in 0..10 {
            floe.grow(3.0, 5.0, &mut r);
        }
        let before = floe.surface().num_triangles();

        let drift = floe.split(Point3::new(1e4, 0.0, 0.0), Vector3::z());
        assert!(drift.is_none());
        assert_eq!(floe.surface().num_triangles(), before);
    }
}
