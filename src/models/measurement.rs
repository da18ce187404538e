// Data models for the ruler-based length estimate and the combined report

use crate::models::pose::{KneeAngles, PostureResult};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Length Estimate
// ==============================================================================

pub const DEFAULT_MIN_BOX_AREA: f64 = 2000.0;
pub const DEFAULT_POSTER_LENGTH: i64 = 200;
pub const DEFAULT_BRIGHTNESS_THRESHOLD: u8 = 100;

/// Tuning for the contour-counting length estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthConfig {
    /// Contours enclosing less area than this (in square pixels) are treated as noise
    pub min_box_area: f64,
    /// Length of the reference poster in centimeters; one box covers one centimeter
    pub poster_length: i64,
    /// Gray level at or above which a pixel is foreground
    pub brightness_threshold: u8,
    /// Stroke width in pixels of the drawn contour outlines
    pub outline_thickness: u32,
}

impl Default for LengthConfig {
    fn default() -> Self {
        Self {
            min_box_area: DEFAULT_MIN_BOX_AREA,
            poster_length: DEFAULT_POSTER_LENGTH,
            brightness_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
            outline_thickness: 2,
        }
    }
}

/// Result of counting visible ruler boxes.
///
/// The boxes hidden behind the person are the ones not counted, so
/// `child_length = poster_length - number_of_boxes`. Nothing clamps the
/// value: more boxes than the poster length yields a negative length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthResult {
    pub child_length: i64,
    pub number_of_boxes: usize,
}

// ==============================================================================
// Measurement Report
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub child_length: i64,
    pub number_of_boxes: usize,
    pub knees_bent: bool,
    pub on_toes: bool,
    pub knee_angles: Option<KneeAngles>,
    pub people_detected: usize,
}

impl MeasurementReport {
    pub fn new(
        length: LengthResult,
        posture: PostureResult,
        knee_angles: Option<KneeAngles>,
        people_detected: usize,
    ) -> Self {
        Self {
            child_length: length.child_length,
            number_of_boxes: length.number_of_boxes,
            knees_bent: posture.knees_bent,
            on_toes: posture.on_toes,
            knee_angles,
            people_detected,
        }
    }

    pub fn posture(&self) -> PostureResult {
        PostureResult {
            knees_bent: self.knees_bent,
            on_toes: self.on_toes,
        }
    }

    /// Human-readable summary, one statement per line
    pub fn to_text(&self) -> String {
        format!(
            "The client is {}cm tall\nThe client is standing with knees bent: {}\nThe client is standing on their toes: {}",
            self.child_length, self.knees_bent, self.on_toes
        )
    }
}
