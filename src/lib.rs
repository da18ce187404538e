pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::config::Config;
pub use crate::core::length_measurer::LengthMeasurer;
pub use crate::core::measurement::{
    prepare_bridge, provision_model, MeasureError, MeasureResult, Measurement,
};
pub use crate::core::ml_models::{ensure_model, ModelChoice, ModelManager};
pub use crate::core::posture_checker::{calculate_angle, PostureChecker};
pub use crate::models::measurement::{LengthConfig, LengthResult, MeasurementReport};
pub use crate::models::pose::{
    BodyLandmark, Landmark, PoseDetection, PoseError, PostureConfig, PostureResult,
};
