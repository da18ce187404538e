// Measurement pipeline: image -> pose inference -> length + posture report

use crate::core::config::Config;
use crate::core::length_measurer::LengthMeasurer;
use crate::core::ml_models::{ModelConfig, ModelError, ModelManager};
use crate::core::posture_checker::PostureChecker;
use crate::models::measurement::MeasurementReport;
use crate::models::pose::PoseError;
use crate::platform::pose::{create_bridge, model_backend_available, MediaPipeBridge};
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("Image not found or could not be loaded: {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Pose(#[from] PoseError),
}

pub type MeasureResult<T> = Result<T, MeasureError>;

/// Make sure the configured pose model is available locally
pub fn provision_model(config: &ModelConfig) -> MeasureResult<PathBuf> {
    let manager = ModelManager::new(config.cache_dir.clone())?;
    Ok(manager.ensure_model(&config.model_info())?)
}

/// Build the pose backend, provisioning the model only when it will be loaded.
///
/// Stored landmarks replace inference entirely. Without a model backend the
/// download is skipped and the dummy bridge detects nobody.
pub fn prepare_bridge(
    landmarks: Option<&Path>,
    config: &ModelConfig,
) -> MeasureResult<Box<dyn MediaPipeBridge>> {
    let model_path = match landmarks {
        Some(_) => config.cache_dir.join(config.model_info().name),
        None if model_backend_available() => provision_model(config)?,
        None => {
            tracing::warn!("Built without the 'ml-pyo3' feature; skipping model download");
            config.cache_dir.join(config.model_info().name)
        }
    };

    Ok(create_bridge(landmarks, &model_path)?)
}

pub struct Measurement {
    length: LengthMeasurer,
    posture: PostureChecker,
}

impl Measurement {
    pub fn new(config: &Config) -> Self {
        Self {
            length: LengthMeasurer::new(config.length.clone()),
            posture: PostureChecker::new(config.posture.clone()),
        }
    }

    pub fn load_image(path: &Path) -> MeasureResult<RgbImage> {
        let image = image::open(path).map_err(|source| MeasureError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded {:?} ({}x{})", path, image.width(), image.height());
        Ok(image.to_rgb8())
    }

    /// Measure the person in `image`.
    ///
    /// Pose inference sees the unannotated image. The returned image carries
    /// both the box outlines and the landmark markers.
    pub fn measure(
        &self,
        image: &RgbImage,
        bridge: &dyn MediaPipeBridge,
    ) -> MeasureResult<(MeasurementReport, RgbImage)> {
        let detection = bridge.detect(image)?;

        let (length, annotated) = self.length.calc_length(image);
        let posture = self.posture.analyze_posture(&annotated, &detection)?;

        let report = MeasurementReport::new(
            length,
            posture.result,
            posture.knee_angles,
            detection.people_detected(),
        );

        tracing::info!(
            "Measurement complete: {}cm, knees bent: {}, on toes: {}",
            report.child_length,
            report.knees_bent,
            report.on_toes
        );

        Ok((report, posture.annotated))
    }

    pub fn measure_file(
        &self,
        path: &Path,
        bridge: &dyn MediaPipeBridge,
    ) -> MeasureResult<(MeasurementReport, RgbImage)> {
        let image = Self::load_image(path)?;
        self.measure(&image, bridge)
    }
}
