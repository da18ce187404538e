// MediaPipe integration bridge
// Provides an abstraction over the pose landmark model
// Can be implemented using PyO3 (Python) or replayed from stored detections

use crate::models::pose::{PoseDetection, PoseError, PoseResult};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// MediaPipe bridge trait
/// Implement this for each inference backend
pub trait MediaPipeBridge {
    /// Run pose landmark detection on a single image
    fn detect(&self, image: &RgbImage) -> PoseResult<PoseDetection>;

    /// Check if a model is loaded
    fn is_initialized(&self) -> bool;

    /// Get model info
    fn get_model_info(&self) -> String;
}

// ==============================================================================
// Stored Detections (JSON)
// ==============================================================================

/// Replays a detection saved as JSON, e.g. exported from another MediaPipe run.
///
/// Expected layout: `{"pose_landmarks": [[{"x": .., "y": .., "z": .., "visibility": ..}, ...]]}`
pub struct LandmarkFileBridge {
    source: PathBuf,
    detection: PoseDetection,
}

impl LandmarkFileBridge {
    pub fn from_file(path: &Path) -> PoseResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PoseError::LandmarkFile(format!("{}: {}", path.display(), e)))?;
        let detection = Self::parse(&contents)
            .map_err(|e| PoseError::LandmarkFile(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            "Loaded {} skeleton(s) from {:?}",
            detection.people_detected(),
            path
        );

        Ok(Self {
            source: path.to_path_buf(),
            detection,
        })
    }

    pub fn parse(json: &str) -> Result<PoseDetection, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl MediaPipeBridge for LandmarkFileBridge {
    fn detect(&self, _image: &RgbImage) -> PoseResult<PoseDetection> {
        Ok(self.detection.clone())
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn get_model_info(&self) -> String {
        format!("Stored landmarks from {}", self.source.display())
    }
}

// ==============================================================================
// PyO3 Implementation (Python MediaPipe)
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub mod pyo3_backend {
    use super::*;
    use crate::models::pose::Landmark;
    use pyo3::prelude::*;
    use pyo3::types::{PyBytes, PyDict};

    /// Runs the MediaPipe `PoseLandmarker` task in IMAGE mode
    pub struct PyO3MediaPipe {
        landmarker: PyObject,
        model_path: PathBuf,
    }

    impl PyO3MediaPipe {
        pub fn new(model_path: &Path) -> PoseResult<Self> {
            let model_str = model_path
                .to_str()
                .ok_or_else(|| PoseError::ModelLoadFailed(format!("Invalid model path: {:?}", model_path)))?;

            let landmarker = Python::with_gil(|py| Self::create_landmarker(py, model_str))
                .map_err(|e| PoseError::ModelLoadFailed(format!(
                    "Failed to create PoseLandmarker: {}. Make sure mediapipe is installed (pip install mediapipe)",
                    e
                )))?;

            tracing::info!("PyO3MediaPipe initialized with model {:?}", model_path);

            Ok(Self {
                landmarker,
                model_path: model_path.to_path_buf(),
            })
        }

        fn create_landmarker(py: Python<'_>, model_path: &str) -> PyResult<PyObject> {
            let tasks = py.import_bound("mediapipe.tasks.python")?;
            let vision = py.import_bound("mediapipe.tasks.python.vision")?;

            let base_kwargs = PyDict::new_bound(py);
            base_kwargs.set_item("model_asset_path", model_path)?;
            let base_options = tasks.getattr("BaseOptions")?.call((), Some(&base_kwargs))?;

            let option_kwargs = PyDict::new_bound(py);
            option_kwargs.set_item("base_options", base_options)?;
            option_kwargs.set_item("running_mode", vision.getattr("RunningMode")?.getattr("IMAGE")?)?;
            let options = vision
                .getattr("PoseLandmarkerOptions")?
                .call((), Some(&option_kwargs))?;

            let landmarker = vision
                .getattr("PoseLandmarker")?
                .call_method1("create_from_options", (options,))?;

            Ok(landmarker.unbind())
        }

        fn run_detection(&self, py: Python<'_>, image: &RgbImage) -> PyResult<PoseDetection> {
            let numpy = py.import_bound("numpy")?;
            let mediapipe = py.import_bound("mediapipe")?;

            // HxWx3 uint8 array over the raw RGB buffer
            let buffer_kwargs = PyDict::new_bound(py);
            buffer_kwargs.set_item("dtype", numpy.getattr("uint8")?)?;
            let pixels = numpy
                .call_method("frombuffer", (PyBytes::new_bound(py, image.as_raw()),), Some(&buffer_kwargs))?
                .call_method1("reshape", ((image.height() as usize, image.width() as usize, 3usize),))?;

            let image_kwargs = PyDict::new_bound(py);
            image_kwargs.set_item("image_format", mediapipe.getattr("ImageFormat")?.getattr("SRGB")?)?;
            image_kwargs.set_item("data", pixels)?;
            let mp_image = mediapipe.getattr("Image")?.call((), Some(&image_kwargs))?;

            let result = self.landmarker.bind(py).call_method1("detect", (mp_image,))?;

            let mut pose_landmarks = Vec::new();
            for pose in result.getattr("pose_landmarks")?.iter()? {
                let mut skeleton = Vec::new();
                for landmark in pose?.iter()? {
                    let landmark = landmark?;
                    skeleton.push(Landmark {
                        x: landmark.getattr("x")?.extract()?,
                        y: landmark.getattr("y")?.extract()?,
                        z: landmark.getattr("z")?.extract::<Option<f32>>()?.unwrap_or(0.0),
                        visibility: landmark
                            .getattr("visibility")?
                            .extract::<Option<f32>>()?
                            .unwrap_or(0.0),
                    });
                }
                pose_landmarks.push(skeleton);
            }

            Ok(PoseDetection { pose_landmarks })
        }
    }

    impl MediaPipeBridge for PyO3MediaPipe {
        fn detect(&self, image: &RgbImage) -> PoseResult<PoseDetection> {
            let start_time = std::time::Instant::now();

            let detection = Python::with_gil(|py| self.run_detection(py, image))
                .map_err(|e| PoseError::InferenceFailed(format!("MediaPipe inference failed: {}", e)))?;

            tracing::debug!(
                "Pose inference took {} ms, {} people detected",
                start_time.elapsed().as_millis(),
                detection.people_detected()
            );

            Ok(detection)
        }

        fn is_initialized(&self) -> bool {
            true
        }

        fn get_model_info(&self) -> String {
            format!(
                "PyO3 MediaPipe Bridge (Python backend) - model: {}",
                self.model_path.display()
            )
        }
    }
}

// ==============================================================================
// Dummy Implementation (for compilation without features)
// ==============================================================================

#[cfg(not(feature = "ml-pyo3"))]
pub struct DummyMediaPipe {
    model_path: PathBuf,
}

#[cfg(not(feature = "ml-pyo3"))]
impl DummyMediaPipe {
    pub fn new(model_path: &Path) -> PoseResult<Self> {
        tracing::warn!("Using dummy MediaPipe implementation (no inference)");
        tracing::warn!("Enable the 'ml-pyo3' feature or pass stored landmarks for posture results");
        Ok(Self {
            model_path: model_path.to_path_buf(),
        })
    }
}

#[cfg(not(feature = "ml-pyo3"))]
impl MediaPipeBridge for DummyMediaPipe {
    fn detect(&self, _image: &RgbImage) -> PoseResult<PoseDetection> {
        Ok(PoseDetection::empty())
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn get_model_info(&self) -> String {
        format!(
            "Dummy MediaPipe (no ML inference, model {} unused - enable 'ml-pyo3' feature)",
            self.model_path.display()
        )
    }
}

// ==============================================================================
// Default Backend Selection
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub type DefaultMediaPipe = pyo3_backend::PyO3MediaPipe;

#[cfg(not(feature = "ml-pyo3"))]
pub type DefaultMediaPipe = DummyMediaPipe;
