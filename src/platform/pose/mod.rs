// Pose estimation platform integration
// Provides MediaPipe bridge and backend selection

pub mod mediapipe_bridge;

pub use mediapipe_bridge::{DefaultMediaPipe, LandmarkFileBridge, MediaPipeBridge};

use crate::models::pose::PoseResult;
use std::path::Path;

/// Pick the inference backend: stored landmarks win over the model
pub fn create_bridge(
    landmarks: Option<&Path>,
    model_path: &Path,
) -> PoseResult<Box<dyn MediaPipeBridge>> {
    let bridge: Box<dyn MediaPipeBridge> = match landmarks {
        Some(path) => Box::new(LandmarkFileBridge::from_file(path)?),
        None => Box::new(DefaultMediaPipe::new(model_path)?),
    };

    tracing::info!("Pose backend: {}", bridge.get_model_info());
    if !bridge.is_initialized() {
        tracing::warn!("Pose backend has no model loaded; no person will be detected");
    }
    Ok(bridge)
}

/// Whether the default backend runs the provisioned model
pub fn model_backend_available() -> bool {
    cfg!(feature = "ml-pyo3")
}
