//! Facial landmark sets.
//!
//! A landmark set is the output of a face-mesh detector for one face in one
//! frame. Point indices follow the 468-point face mesh topology, optionally
//! extended with ten iris points (478 total).

use serde::{Deserialize, Serialize};

/// Well-known indices into the face mesh.
pub mod mesh {
    /// Points in the base face mesh.
    pub const FACE_MESH_POINTS: usize = 468;
    /// Points when iris refinement is enabled.
    pub const FACE_MESH_WITH_IRIS_POINTS: usize = 478;

    pub const NOSE_TIP: usize = 1;
    pub const NOSE_BRIDGE: usize = 6;
    pub const FOREHEAD: usize = 10;
    pub const CHIN: usize = 152;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;

    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const LEFT_EYE_UPPER: usize = 159;
    pub const LEFT_EYE_LOWER: usize = 145;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_UPPER: usize = 386;
    pub const RIGHT_EYE_LOWER: usize = 374;

    pub const LEFT_IRIS_CENTER: usize = 468;
    pub const RIGHT_IRIS_CENTER: usize = 473;
}

/// A point in normalized image space. `x`/`y` are in `[0.0, 1.0]` relative
/// to frame width/height; `z` is relative depth (smaller = closer).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance in the image plane, ignoring depth.
    pub fn planar_distance(&self, other: &Point3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point3D) -> Point3D {
        Point3D::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Point3D {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3D> for [f64; 3] {
    fn from(p: Point3D) -> Self {
        [p.x, p.y, p.z]
    }
}

/// Landmarks for the single face detected in a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Point3D>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at a mesh index, if the set is large enough and the point is finite.
    pub fn point(&self, index: usize) -> Option<Point3D> {
        self.points.get(index).copied().filter(Point3D::is_finite)
    }

    /// Whether iris refinement points are present.
    pub fn has_iris(&self) -> bool {
        self.points.len() >= mesh::FACE_MESH_WITH_IRIS_POINTS
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serializes_as_triple() {
        let p = Point3D::new(0.5, 0.25, -0.01);
        assert_eq!(serde_json::to_string(&p).unwrap(), "[0.5,0.25,-0.01]");
        let parsed: Point3D = serde_json::from_str("[0.1,0.2,0.3]").unwrap();
        assert_eq!(parsed, Point3D::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_point_lookup_rejects_missing_and_non_finite() {
        let set = LandmarkSet::new(vec![Point3D::new(0.1, 0.1, 0.0), Point3D::new(f64::NAN, 0.0, 0.0)]);
        assert!(set.point(0).is_some());
        assert!(set.point(1).is_none());
        assert!(set.point(mesh::CHIN).is_none());
        assert!(!set.has_iris());
    }

    #[test]
    fn test_planar_distance_ignores_depth() {
        let a = Point3D::new(0.0, 0.0, 5.0);
        let b = Point3D::new(0.3, 0.4, -5.0);
        assert!((a.planar_distance(&b) - 0.5).abs() < 1e-12);
    }
}
