// Data models for body pose landmarks and posture classification

use serde::{Deserialize, Serialize};

// ==============================================================================
// Pose Detection (Model Output)
// ==============================================================================

/// Landmarks for every person found in a single image.
///
/// Skeletons are kept in the order the model reported them. Only the first
/// one is used for posture classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseDetection {
    pub pose_landmarks: Vec<Vec<Landmark>>,
}

impl PoseDetection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The skeleton used for classification, if anyone was detected
    pub fn first_skeleton(&self) -> Option<&[Landmark]> {
        self.pose_landmarks.first().map(Vec::as_slice)
    }

    pub fn people_detected(&self) -> usize {
        self.pose_landmarks.len()
    }
}

// ==============================================================================
// Landmarks (33 keypoints)
// ==============================================================================

/// A single body landmark as produced by the pose model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // Normalized [0, 1] relative to image width
    pub y: f32, // Normalized [0, 1] relative to image height
    #[serde(default)]
    pub z: f32, // Depth relative to the hip midpoint
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    /// Landmark at a normalized image position with full visibility
    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0, 1.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Pixel position for an image of the given size, truncated toward zero
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.x * width as f32) as i32,
            (self.y * height as f32) as i32,
        )
    }
}

/// MediaPipe Pose Landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    /// Total number of landmarks in a full MediaPipe skeleton
    pub const COUNT: usize = 33;

    /// Joints read by the posture classifier
    pub const LEGS: [BodyLandmark; 6] = [
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
        BodyLandmark::LeftKnee,
        BodyLandmark::RightKnee,
        BodyLandmark::LeftAnkle,
        BodyLandmark::RightAnkle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Smallest skeleton length that still contains every leg joint
    pub fn min_required() -> usize {
        BodyLandmark::RightAnkle.index() + 1
    }
}

// ==============================================================================
// Posture Result
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureResult {
    pub knees_bent: bool,
    pub on_toes: bool,
}

/// Knee angles in degrees (180 = straight leg)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KneeAngles {
    pub left_deg: f64,
    pub right_deg: f64,
}

// ==============================================================================
// Configuration
// ==============================================================================

pub const DEFAULT_KNEE_THRESHOLD_DEG: f64 = 160.0;
pub const DEFAULT_ANKLE_HEIGHT_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// A knee angle strictly below this many degrees counts as bent
    pub knee_threshold_deg: f64,
    /// Both ankles with a normalized y strictly below this (higher in frame) count as on toes
    pub ankle_height_threshold: f64,
    /// Radius in pixels of the marker drawn at every landmark
    pub marker_radius: i32,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            knee_threshold_deg: DEFAULT_KNEE_THRESHOLD_DEG,
            ankle_height_threshold: DEFAULT_ANKLE_HEIGHT_THRESHOLD,
            marker_radius: 3,
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Invalid landmarks: {0}")]
    Validation(String),

    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Landmark file error: {0}")]
    LandmarkFile(String),
}

pub type PoseResult<T> = Result<T, PoseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_indices() {
        assert_eq!(BodyLandmark::LeftHip.index(), 23);
        assert_eq!(BodyLandmark::RightHip.index(), 24);
        assert_eq!(BodyLandmark::LeftKnee.index(), 25);
        assert_eq!(BodyLandmark::RightKnee.index(), 26);
        assert_eq!(BodyLandmark::LeftAnkle.index(), 27);
        assert_eq!(BodyLandmark::RightAnkle.index(), 28);
        assert_eq!(BodyLandmark::min_required(), 29);
    }

    #[test]
    fn test_landmark_to_pixel() {
        let landmark = Landmark::at(0.5, 0.25);
        assert_eq!(landmark.to_pixel(200, 100), (100, 25));

        let edge = Landmark::at(0.999, 0.999);
        assert_eq!(edge.to_pixel(10, 10), (9, 9));
    }

    #[test]
    fn test_detection_deserializes_without_depth() {
        let json = r#"{"pose_landmarks": [[{"x": 0.1, "y": 0.2}], [{"x": 0.3, "y": 0.4, "z": -0.1, "visibility": 0.9}]]}"#;
        let detection: PoseDetection = serde_json::from_str(json).unwrap();

        assert_eq!(detection.people_detected(), 2);
        let first = detection.first_skeleton().unwrap();
        assert_eq!(first[0].x, 0.1);
        assert_eq!(first[0].z, 0.0);
        assert_eq!(detection.pose_landmarks[1][0].visibility, 0.9);
    }

    #[test]
    fn test_empty_detection() {
        let detection = PoseDetection::empty();
        assert_eq!(detection.people_detected(), 0);
        assert!(detection.first_skeleton().is_none());
    }

    #[test]
    fn test_posture_config_default() {
        let config = PostureConfig::default();
        assert_eq!(config.knee_threshold_deg, 160.0);
        assert_eq!(config.ankle_height_threshold, 0.01);
        assert_eq!(config.marker_radius, 3);
    }
}
