// Posture classification from body landmarks
// Detects bent knees (hip-knee-ankle angle) and standing on toes (ankle height)

use crate::models::pose::{
    BodyLandmark, KneeAngles, Landmark, PoseDetection, PoseError, PoseResult, PostureConfig,
    PostureResult,
};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use std::f64::consts::PI;

const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Full output of classifying one skeleton
#[derive(Debug, Clone)]
pub struct PostureAnalysis {
    pub result: PostureResult,
    /// `None` when nobody was detected
    pub knee_angles: Option<KneeAngles>,
    pub annotated: RgbImage,
}

pub struct PostureChecker {
    config: PostureConfig,
}

impl PostureChecker {
    pub fn new(config: PostureConfig) -> Self {
        Self { config }
    }

    pub fn with_default() -> Self {
        Self::new(PostureConfig::default())
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    /// Classify the first detected person.
    ///
    /// Additional skeletons are ignored. An empty detection is not an error:
    /// both flags are false and the image comes back unchanged.
    pub fn analyze_posture(
        &self,
        image: &RgbImage,
        detection: &PoseDetection,
    ) -> PoseResult<PostureAnalysis> {
        if detection.people_detected() > 1 {
            tracing::debug!(
                "{} people detected, classifying the first one",
                detection.people_detected()
            );
        }

        self.analyze_skeleton(image, detection.first_skeleton().unwrap_or(&[]))
    }

    /// Classify a single skeleton and return the flags with an annotated copy
    pub fn classify_posture(
        &self,
        image: &RgbImage,
        landmarks: &[Landmark],
    ) -> PoseResult<(PostureResult, RgbImage)> {
        let analysis = self.analyze_skeleton(image, landmarks)?;
        Ok((analysis.result, analysis.annotated))
    }

    fn analyze_skeleton(
        &self,
        image: &RgbImage,
        landmarks: &[Landmark],
    ) -> PoseResult<PostureAnalysis> {
        if landmarks.is_empty() {
            tracing::info!("No person detected; reporting neutral posture");
            return Ok(PostureAnalysis {
                result: PostureResult::default(),
                knee_angles: None,
                annotated: image.clone(),
            });
        }

        validate_landmarks(landmarks)?;

        let joint = |landmark: BodyLandmark| landmarks[landmark.index()];

        let knee_angles = KneeAngles {
            left_deg: calculate_angle(
                joint(BodyLandmark::LeftHip),
                joint(BodyLandmark::LeftKnee),
                joint(BodyLandmark::LeftAnkle),
            ),
            right_deg: calculate_angle(
                joint(BodyLandmark::RightHip),
                joint(BodyLandmark::RightKnee),
                joint(BodyLandmark::RightAnkle),
            ),
        };

        let result = PostureResult {
            knees_bent: self.knees_bent(&knee_angles),
            on_toes: self.on_toes(
                joint(BodyLandmark::LeftAnkle).y as f64,
                joint(BodyLandmark::RightAnkle).y as f64,
            ),
        };

        tracing::debug!(
            "Knee angles: left {:.1}°, right {:.1}° -> {:?}",
            knee_angles.left_deg,
            knee_angles.right_deg,
            result
        );

        Ok(PostureAnalysis {
            result,
            knee_angles: Some(knee_angles),
            annotated: self.draw_landmarks(image, landmarks),
        })
    }

    /// Either knee below the threshold counts as bent
    pub fn knees_bent(&self, angles: &KneeAngles) -> bool {
        angles.left_deg < self.config.knee_threshold_deg
            || angles.right_deg < self.config.knee_threshold_deg
    }

    /// Both ankles must be raised above the threshold line
    pub fn on_toes(&self, left_ankle_y: f64, right_ankle_y: f64) -> bool {
        left_ankle_y < self.config.ankle_height_threshold
            && right_ankle_y < self.config.ankle_height_threshold
    }

    /// Copy of `image` with a filled marker at every landmark
    pub fn draw_landmarks(&self, image: &RgbImage, landmarks: &[Landmark]) -> RgbImage {
        let mut annotated = image.clone();
        let (width, height) = image.dimensions();
        let radius = self.config.marker_radius;

        for landmark in landmarks.iter().filter(|l| l.is_finite()) {
            let center = landmark.to_pixel(width, height);
            // Markers that cannot reach the image are skipped
            if !marker_overlaps(center, radius, width, height) {
                continue;
            }
            draw_filled_circle_mut(&mut annotated, center, radius, MARKER_COLOR);
        }

        annotated
    }
}

fn marker_overlaps(center: (i32, i32), radius: i32, width: u32, height: u32) -> bool {
    let (x, y) = (center.0 as i64, center.1 as i64);
    let r = radius as i64;
    x >= -r && y >= -r && x <= width as i64 + r && y <= height as i64 + r
}

/// Angle in degrees at `point2` between the rays to `point1` and `point3`, in [0, 180]
pub fn calculate_angle(point1: Landmark, point2: Landmark, point3: Landmark) -> f64 {
    let (dx1, dy1) = (
        point1.x as f64 - point2.x as f64,
        point1.y as f64 - point2.y as f64,
    );
    let (dx2, dy2) = (
        point3.x as f64 - point2.x as f64,
        point3.y as f64 - point2.y as f64,
    );

    let mut angle = (dy1.atan2(dx1) - dy2.atan2(dx2)).abs();
    if angle > PI {
        angle = 2.0 * PI - angle;
    }

    angle.to_degrees()
}

fn validate_landmarks(landmarks: &[Landmark]) -> PoseResult<()> {
    let required = BodyLandmark::min_required();
    if landmarks.len() < required {
        return Err(PoseError::Validation(format!(
            "expected at least {} landmarks, got {}",
            required,
            landmarks.len()
        )));
    }

    for joint in BodyLandmark::LEGS {
        if !landmarks[joint.index()].is_finite() {
            return Err(PoseError::Validation(format!(
                "{:?} has non-finite coordinates",
                joint
            )));
        }
    }

    Ok(())
}
