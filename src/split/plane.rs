//! Vertical cut-plane geometry.
//!
//! A [`SplitPlane`] is built from a world point and a direction: the
//! plane is vertical and contains the line through the point along the
//! direction's horizontal projection. Side classification carries an
//! inversion flag so that a point lying "before the origin" along the
//! direction still yields a consistent positive side.

use nalgebra::{Point3, Vector3};

use crate::gen::up;

/// Tolerance for on-plane classification of vertices and centroids.
pub const PLANE_EPS: f64 = 1e-6;

/// A vertical cutting plane with a consistent positive side.
#[derive(Debug, Clone)]
pub struct SplitPlane {
    normal: Vector3<f64>,
    offset: f64,
    tangent: Vector3<f64>,
    inverted: bool,
}

impl SplitPlane {
    /// Build the vertical plane through `point` along `direction`.
    ///
    /// `direction` need not be normalized but must have a non-zero
    /// horizontal projection; a zero or vertical direction is a
    /// documented precondition violation with undefined results.
    pub fn new(point: Point3<f64>, direction: Vector3<f64>) -> Self {
        let flat = Vector3::new(direction.x, 0.0, direction.z);
        let tangent = flat.normalize();
        let normal = up().cross(&tangent);
        let offset = normal.dot(&point.coords);

        // Projecting the point onto the direction: an angle above 90°
        // between projection and direction means the point sits before
        // the origin along the cut, so the side sign flips.
        let inverted = point.coords.dot(&direction) < 0.0;

        Self {
            normal,
            offset,
            tangent,
            inverted,
        }
    }

    /// Signed distance from the plane, inversion applied. Positive is
    /// the "remains" side, negative the "drift" side.
    #[inline]
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        let d = self.normal.dot(&p.coords) - self.offset;
        if self.inverted {
            -d
        } else {
            d
        }
    }

    /// Scalar projection of a point along the plane's horizontal
    /// tangent (the crack direction).
    #[inline]
    pub fn tangential(&self, p: &Point3<f64>) -> f64 {
        self.tangent.dot(&p.coords)
    }

    /// Classify a triangle: `0` when it genuinely straddles the
    /// plane, otherwise `+1`/`-1` for the side it lies on.
    pub fn side_of(&self, tri: &[Point3<f64>; 3]) -> i8 {
        let mut has_pos = false;
        let mut has_neg = false;
        for p in tri {
            let d = self.signed_distance(p);
            if d > PLANE_EPS {
                has_pos = true;
            } else if d < -PLANE_EPS {
                has_neg = true;
            }
        }
        match (has_pos, has_neg) {
            (true, true) => 0,
            (false, true) => -1,
            // All-on-plane triangles count as remaining.
            _ => 1,
        }
    }
}

/// The result of subdividing one triangle by a plane.
#[derive(Debug, Clone)]
pub struct TriangleSplit {
    /// Replacement pieces on the positive side, winding preserved.
    pub positive: Vec<[Point3<f64>; 3]>,
    /// Replacement pieces on the negative side, winding preserved.
    pub negative: Vec<[Point3<f64>; 3]>,
    /// The two points where the plane crosses the triangle boundary.
    pub sections: [Point3<f64>; 2],
}

/// Area of a raw position triple.
pub(crate) fn triple_area(tri: &[Point3<f64>; 3]) -> f64 {
    0.5 * (tri[1] - tri[0]).cross(&(tri[2] - tri[0])).norm()
}

/// Subdivide a triangle by the plane, recording the two section
/// points where the plane crosses its boundary.
///
/// Returns `None` when the triangle does not genuinely straddle the
/// plane. The subdivision follows the classic one-lone-vertex case
/// analysis: the lone vertex keeps a single corner piece and the far
/// pair keeps the quad, split into two triangles with the original
/// winding.
pub fn split_triangle(plane: &SplitPlane, tri: &[Point3<f64>; 3]) -> Option<TriangleSplit> {
    if plane.side_of(tri) != 0 {
        return None;
    }

    let d = [
        plane.signed_distance(&tri[0]),
        plane.signed_distance(&tri[1]),
        plane.signed_distance(&tri[2]),
    ];

    // A vertex sitting on the plane leaves only one crossed edge.
    for i in 0..3 {
        if d[i].abs() <= PLANE_EPS {
            let (a, b, c) = (tri[i], tri[(i + 1) % 3], tri[(i + 2) % 3]);
            let (db, dc) = (d[(i + 1) % 3], d[(i + 2) % 3]);
            let q = cross_point(&b, db, &c, dc);
            let (b_side, c_side) = ([a, b, q], [a, q, c]);
            let (positive, negative) = if db > 0.0 {
                (vec![b_side], vec![c_side])
            } else {
                (vec![c_side], vec![b_side])
            };
            return Some(TriangleSplit {
                positive,
                negative,
                sections: [a, q],
            });
        }
    }

    // Generic case: rotate so the lone vertex comes first.
    let lone = (0..3)
        .find(|&i| {
            let s = d[i] > 0.0;
            s != (d[(i + 1) % 3] > 0.0) && s != (d[(i + 2) % 3] > 0.0)
        })
        .expect("straddling triangle has a lone vertex");

    let (a, b, c) = (tri[lone], tri[(lone + 1) % 3], tri[(lone + 2) % 3]);
    let (da, db, dc) = (d[lone], d[(lone + 1) % 3], d[(lone + 2) % 3]);

    let q_ab = cross_point(&a, da, &b, db);
    let q_ca = cross_point(&c, dc, &a, da);

    let lone_piece = vec![[a, q_ab, q_ca]];
    let pair_pieces = vec![[q_ab, b, c], [q_ab, c, q_ca]];

    let (positive, negative) = if da > 0.0 {
        (lone_piece, pair_pieces)
    } else {
        (pair_pieces, lone_piece)
    };

    Some(TriangleSplit {
        positive,
        negative,
        sections: [q_ab, q_ca],
    })
}

/// Point where the segment `p`–`q` crosses the plane, given the two
/// signed distances.
fn cross_point(p: &Point3<f64>, dp: f64, q: &Point3<f64>, dq: f64) -> Point3<f64> {
    let t = dp / (dp - dq);
    p + (q - p) * t
}
