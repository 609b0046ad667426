//! Geometric scoring of facial landmarks.
//!
//! Two pure functions map a landmark set to scores in `[0.0, 1.0]`:
//!
//! - **Eye contact** combines where the irises sit inside the eye openings
//!   with how far the face is from the frame center. With no iris points the
//!   gaze term falls back to head orientation.
//! - **Posture** measures how far the head is rotated (yaw, pitch, roll)
//!   from a neutral forward-facing pose.
//!
//! Degenerate landmark sets (missing points, collapsed eyes, non-finite
//! coordinates) score 0.0.

use poise_model::landmarks::{mesh, Point3D};
use poise_model::LandmarkSet;

/// A frame counts as good eye contact when its score is strictly above this.
pub const EYE_CONTACT_THRESHOLD: f64 = 0.7;

/// A frame counts as good posture when its score is strictly above this.
pub const GOOD_POSTURE_THRESHOLD: f64 = 0.6;

/// Horizontal iris offset from the eye center (fraction of eye width) at which
/// the gaze term saturates.
const MAX_IRIS_HORIZONTAL_OFFSET: f64 = 0.2;
/// Vertical iris offset from the lid midpoint (fraction of eye width) at which
/// the gaze term saturates.
const MAX_IRIS_VERTICAL_OFFSET: f64 = 0.15;
/// Head angles at which the gaze fallback saturates (degrees).
const MAX_GAZE_YAW_DEG: f64 = 20.0;
const MAX_GAZE_PITCH_DEG: f64 = 15.0;
const GAZE_WEIGHT: f64 = 0.8;
const CENTERING_WEIGHT: f64 = 0.2;

/// Head angles at which the posture term saturates (degrees).
const MAX_POSTURE_YAW_DEG: f64 = 30.0;
const MAX_POSTURE_PITCH_DEG: f64 = 25.0;
const MAX_POSTURE_ROLL_DEG: f64 = 20.0;

/// Yaw in degrees when the nose sits on one cheek.
const YAW_FULL_SCALE_DEG: f64 = 45.0;
/// Nose-tip drop between eye line and chin for a level head.
const NEUTRAL_NOSE_DROP: f64 = 0.34;
/// Pitch in degrees per unit deviation of the nose-drop ratio.
const PITCH_DEG_PER_DROP: f64 = 150.0;
/// Below this, distances are treated as collapsed geometry.
const MIN_SPAN: f64 = 1e-3;

/// Scores a landmark set. Implementations must be pure and return values in
/// `[0.0, 1.0]`.
pub trait FrameScorer: Send {
    fn eye_contact(&self, landmarks: &LandmarkSet) -> f64;
    fn posture(&self, landmarks: &LandmarkSet) -> f64;
}

/// The geometric scorer used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricScorer;

impl FrameScorer for GeometricScorer {
    fn eye_contact(&self, landmarks: &LandmarkSet) -> f64 {
        eye_contact_score(landmarks)
    }

    fn posture(&self, landmarks: &LandmarkSet) -> f64 {
        posture_score(landmarks)
    }
}

/// Head orientation relative to the camera, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadPose {
    /// Positive = turned toward the image right.
    pub yaw_deg: f64,
    /// Positive = tilted down.
    pub pitch_deg: f64,
    /// Positive = clockwise in the image.
    pub roll_deg: f64,
}

impl HeadPose {
    /// Estimate head orientation from landmark geometry.
    pub fn estimate(landmarks: &LandmarkSet) -> Option<Self> {
        let nose = landmarks.point(mesh::NOSE_TIP)?;
        let chin = landmarks.point(mesh::CHIN)?;
        let left_cheek = landmarks.point(mesh::LEFT_CHEEK)?;
        let right_cheek = landmarks.point(mesh::RIGHT_CHEEK)?;
        let left_outer = landmarks.point(mesh::LEFT_EYE_OUTER)?;
        let right_outer = landmarks.point(mesh::RIGHT_EYE_OUTER)?;

        let left_dist = nose.planar_distance(&left_cheek);
        let right_dist = nose.planar_distance(&right_cheek);
        if left_dist + right_dist < MIN_SPAN {
            return None;
        }
        let yaw_deg = (left_dist - right_dist) / (left_dist + right_dist) * YAW_FULL_SCALE_DEG;

        let eye_line = left_outer.midpoint(&right_outer);
        let face_height = chin.y - eye_line.y;
        if face_height < MIN_SPAN {
            return None;
        }
        let nose_drop = (nose.y - eye_line.y) / face_height;
        let pitch_deg = (nose_drop - NEUTRAL_NOSE_DROP) * PITCH_DEG_PER_DROP;

        let dx = right_outer.x - left_outer.x;
        let dy = right_outer.y - left_outer.y;
        if dx.abs() < MIN_SPAN && dy.abs() < MIN_SPAN {
            return None;
        }
        let roll_deg = dy.atan2(dx).to_degrees();

        Some(Self {
            yaw_deg,
            pitch_deg,
            roll_deg,
        })
    }
}

/// Eye-contact score in `[0.0, 1.0]`; above [`EYE_CONTACT_THRESHOLD`] is good.
pub fn eye_contact_score(landmarks: &LandmarkSet) -> f64 {
    let Some(nose) = landmarks.point(mesh::NOSE_TIP) else {
        return 0.0;
    };

    let gaze_deviation = if landmarks.has_iris() {
        iris_deviation(landmarks)
    } else {
        HeadPose::estimate(landmarks).map(|pose| {
            ((pose.yaw_deg / MAX_GAZE_YAW_DEG).powi(2)
                + (pose.pitch_deg / MAX_GAZE_PITCH_DEG).powi(2))
            .sqrt()
        })
    };
    let Some(gaze_deviation) = gaze_deviation else {
        return 0.0;
    };

    let frame_center = Point3D::new(0.5, 0.5, 0.0);
    let centering_deviation = nose.planar_distance(&frame_center) / 0.5;

    let deviation = GAZE_WEIGHT * gaze_deviation.min(1.0)
        + CENTERING_WEIGHT * centering_deviation.min(1.0);
    unit_interval(1.0 - deviation)
}

/// Posture score in `[0.0, 1.0]`; above [`GOOD_POSTURE_THRESHOLD`] is good.
pub fn posture_score(landmarks: &LandmarkSet) -> f64 {
    let Some(pose) = HeadPose::estimate(landmarks) else {
        return 0.0;
    };

    let yaw = (pose.yaw_deg.abs() / MAX_POSTURE_YAW_DEG).min(1.0);
    let pitch = (pose.pitch_deg.abs() / MAX_POSTURE_PITCH_DEG).min(1.0);
    let roll = (pose.roll_deg.abs() / MAX_POSTURE_ROLL_DEG).min(1.0);
    let deviation = ((yaw.powi(2) + pitch.powi(2) + roll.powi(2)) / 3.0).sqrt();
    unit_interval(1.0 - deviation)
}

/// Normalized distance of both irises from the centers of their eye openings.
fn iris_deviation(landmarks: &LandmarkSet) -> Option<f64> {
    let left = eye_offset(
        landmarks,
        mesh::LEFT_EYE_OUTER,
        mesh::LEFT_EYE_INNER,
        mesh::LEFT_EYE_UPPER,
        mesh::LEFT_EYE_LOWER,
        mesh::LEFT_IRIS_CENTER,
    )?;
    let right = eye_offset(
        landmarks,
        mesh::RIGHT_EYE_INNER,
        mesh::RIGHT_EYE_OUTER,
        mesh::RIGHT_EYE_UPPER,
        mesh::RIGHT_EYE_LOWER,
        mesh::RIGHT_IRIS_CENTER,
    )?;

    let horizontal = (left.0 + right.0) / 2.0;
    let vertical = (left.1 + right.1) / 2.0;
    Some(
        ((horizontal / MAX_IRIS_HORIZONTAL_OFFSET).powi(2)
            + (vertical / MAX_IRIS_VERTICAL_OFFSET).powi(2))
        .sqrt(),
    )
}

/// Iris offset from the center of one eye opening, as fractions of eye width.
/// `image_left`/`image_right` are the corners nearer the image left and right.
fn eye_offset(
    landmarks: &LandmarkSet,
    image_left: usize,
    image_right: usize,
    upper: usize,
    lower: usize,
    iris: usize,
) -> Option<(f64, f64)> {
    let left = landmarks.point(image_left)?;
    let right = landmarks.point(image_right)?;
    let upper = landmarks.point(upper)?;
    let lower = landmarks.point(lower)?;
    let iris = landmarks.point(iris)?;

    let width = right.x - left.x;
    if width.abs() < MIN_SPAN {
        return None;
    }
    let horizontal = (iris.x - left.x) / width - 0.5;
    let vertical = (iris.y - upper.midpoint(&lower).y) / width.abs();
    Some((horizontal, vertical))
}

fn unit_interval(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// A level, centered face looking straight into the camera.
    fn frontal_face() -> Vec<Point3D> {
        let mut points = vec![Point3D::new(0.5, 0.5, 0.0); mesh::FACE_MESH_WITH_IRIS_POINTS];
        let mut set = |index: usize, x: f64, y: f64| points[index] = Point3D::new(x, y, 0.0);
        set(mesh::LEFT_EYE_OUTER, 0.40, 0.45);
        set(mesh::LEFT_EYE_INNER, 0.46, 0.45);
        set(mesh::LEFT_EYE_UPPER, 0.43, 0.44);
        set(mesh::LEFT_EYE_LOWER, 0.43, 0.46);
        set(mesh::RIGHT_EYE_INNER, 0.54, 0.45);
        set(mesh::RIGHT_EYE_OUTER, 0.60, 0.45);
        set(mesh::RIGHT_EYE_UPPER, 0.57, 0.44);
        set(mesh::RIGHT_EYE_LOWER, 0.57, 0.46);
        set(mesh::LEFT_IRIS_CENTER, 0.43, 0.45);
        set(mesh::RIGHT_IRIS_CENTER, 0.57, 0.45);
        set(mesh::NOSE_TIP, 0.50, 0.52);
        set(mesh::NOSE_BRIDGE, 0.50, 0.45);
        set(mesh::FOREHEAD, 0.50, 0.33);
        set(mesh::CHIN, 0.50, 0.66);
        set(mesh::LEFT_CHEEK, 0.36, 0.50);
        set(mesh::RIGHT_CHEEK, 0.64, 0.50);
        points
    }

    fn with(mut points: Vec<Point3D>, index: usize, x: f64, y: f64) -> Vec<Point3D> {
        points[index] = Point3D::new(x, y, 0.0);
        points
    }

    #[test]
    fn test_frontal_face_scores_well() {
        let face = LandmarkSet::new(frontal_face());
        assert!(eye_contact_score(&face) > 0.95);
        assert!(posture_score(&face) > 0.95);
    }

    #[test]
    fn test_frontal_pose_is_near_neutral() {
        let pose = HeadPose::estimate(&LandmarkSet::new(frontal_face())).unwrap();
        assert!(pose.yaw_deg.abs() < 1e-9);
        assert!(pose.roll_deg.abs() < 1e-9);
        assert!(pose.pitch_deg.abs() < 2.0);
    }

    #[test]
    fn test_averted_irises_break_eye_contact() {
        let points = with(frontal_face(), mesh::LEFT_IRIS_CENTER, 0.405, 0.45);
        let points = with(points, mesh::RIGHT_IRIS_CENTER, 0.545, 0.45);
        let face = LandmarkSet::new(points);
        assert!(eye_contact_score(&face) < EYE_CONTACT_THRESHOLD);
        // Head pose is untouched.
        assert!(posture_score(&face) > GOOD_POSTURE_THRESHOLD);
    }

    #[test]
    fn test_turned_head_breaks_posture() {
        let face = LandmarkSet::new(with(frontal_face(), mesh::NOSE_TIP, 0.58, 0.52));
        let pose = HeadPose::estimate(&face).unwrap();
        assert!(pose.yaw_deg > 20.0);
        assert!(posture_score(&face) < GOOD_POSTURE_THRESHOLD);
    }

    #[test]
    fn test_tilted_head_rolls() {
        let points = with(frontal_face(), mesh::RIGHT_EYE_OUTER, 0.60, 0.60);
        let pose = HeadPose::estimate(&LandmarkSet::new(points)).unwrap();
        assert!(pose.roll_deg > 30.0);
    }

    #[test]
    fn test_off_center_face_loses_some_eye_contact() {
        let centered = eye_contact_score(&LandmarkSet::new(frontal_face()));
        let shifted: Vec<Point3D> = frontal_face()
            .into_iter()
            .map(|p| Point3D::new(p.x - 0.3, p.y, p.z))
            .collect();
        let off_center = eye_contact_score(&LandmarkSet::new(shifted));
        assert!(off_center < centered);
        assert!(off_center > EYE_CONTACT_THRESHOLD);
    }

    #[test]
    fn test_base_mesh_without_iris_falls_back_to_head_pose() {
        let mut points = frontal_face();
        points.truncate(mesh::FACE_MESH_POINTS);
        let face = LandmarkSet::new(points);
        assert!(!face.has_iris());
        assert!(eye_contact_score(&face) > 0.9);

        let turned = LandmarkSet::new(with(face.points().to_vec(), mesh::NOSE_TIP, 0.58, 0.52));
        assert!(eye_contact_score(&turned) < EYE_CONTACT_THRESHOLD);
    }

    #[test]
    fn test_degenerate_sets_score_zero() {
        let empty = LandmarkSet::default();
        assert_eq!(eye_contact_score(&empty), 0.0);
        assert_eq!(posture_score(&empty), 0.0);

        let collapsed = LandmarkSet::new(vec![Point3D::new(0.5, 0.5, 0.0); 478]);
        assert_eq!(eye_contact_score(&collapsed), 0.0);
        assert_eq!(posture_score(&collapsed), 0.0);

        let nan_nose = LandmarkSet::new(with(frontal_face(), mesh::NOSE_TIP, f64::NAN, 0.5));
        assert_eq!(eye_contact_score(&nan_nose), 0.0);
        assert_eq!(posture_score(&nan_nose), 0.0);
    }

    proptest! {
        #[test]
        fn test_scores_stay_in_unit_interval(
            coords in proptest::collection::vec((-2.0f64..3.0, -2.0f64..3.0, -1.0f64..1.0), 0..480)
        ) {
            let face = LandmarkSet::new(
                coords.into_iter().map(|(x, y, z)| Point3D::new(x, y, z)).collect(),
            );
            let eye = eye_contact_score(&face);
            let posture = posture_score(&face);
            prop_assert!((0.0..=1.0).contains(&eye));
            prop_assert!((0.0..=1.0).contains(&posture));
        }
    }
}
