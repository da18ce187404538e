// ML Model loader and manager utilities
// Handles pose model downloading and caching

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Model source configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Local file path
    LocalFile(PathBuf),
    /// Direct URL
    Url(String),
}

/// ML model metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// File name of the model inside the cache directory
    pub name: String,
    pub source: ModelSource,
}

/// Model manager for caching and loading ML models
pub struct ModelManager {
    cache_dir: PathBuf,
}

impl ModelManager {
    /// Create a new model manager with cache directory
    pub fn new(cache_dir: PathBuf) -> ModelResult<Self> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Check if a model is cached
    pub fn is_cached(&self, model: &ModelInfo) -> bool {
        self.get_model_path(&model.name).exists()
    }

    /// Get the local path for a model
    pub fn get_model_path(&self, model_name: &str) -> PathBuf {
        self.cache_dir.join(model_name)
    }

    /// Fetch a model into the cache unless it is already there
    pub fn ensure_model(&self, model: &ModelInfo) -> ModelResult<PathBuf> {
        let model_path = self.get_model_path(&model.name);

        if self.is_cached(model) {
            tracing::info!("Model already exists at {:?}. Skipping download.", model_path);
            return Ok(model_path);
        }

        match &model.source {
            ModelSource::LocalFile(path) => {
                tracing::info!("Copying model {} from {:?}", model.name, path);
                copy_into_place(path, &model_path)?;
            }
            ModelSource::Url(url) => {
                tracing::info!("Downloading model: {} ...", model.name);
                download(url, &model_path)?;
                tracing::info!("Model downloaded successfully!");
            }
        }

        Ok(model_path)
    }
}

/// Download `url` to `path` if nothing is there yet
pub fn ensure_model(path: &Path, url: &str) -> ModelResult<PathBuf> {
    if path.exists() {
        tracing::info!("Model already exists at {:?}. Skipping download.", path);
        return Ok(path.to_path_buf());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    download(url, path)?;
    Ok(path.to_path_buf())
}

/// Stream the response body into `<path>.part`, then move it into place.
/// A failed transfer never leaves a file at `path`.
fn download(url: &str, path: &Path) -> ModelResult<()> {
    let mut response = reqwest::blocking::get(url)
        .map_err(|e| ModelError::Download(format!("{}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ModelError::Download(format!(
            "{} returned HTTP {}",
            url, status
        )));
    }

    let partial = partial_path(path);
    let mut file = fs::File::create(&partial)?;

    let copied = response.copy_to(&mut file);
    drop(file);

    match copied {
        Ok(bytes) => {
            tracing::debug!("Received {} bytes from {}", bytes, url);
            fs::rename(&partial, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(ModelError::Download(format!("{}: {}", url, e)))
        }
    }
}

/// Copy `source` to `<path>.part`, then move it into place
fn copy_into_place(source: &Path, path: &Path) -> ModelResult<()> {
    let partial = partial_path(path);

    if let Err(e) = fs::copy(source, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }

    fs::rename(&partial, path)?;
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

// ==============================================================================
// Predefined Model Configurations
// ==============================================================================

/// Published variants of the MediaPipe pose landmarker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    /// Fastest, least accurate
    #[default]
    Lite,
    Full,
    /// Slowest, most accurate
    Heavy,
}

impl ModelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Lite => "lite",
            ModelChoice::Full => "full",
            ModelChoice::Heavy => "heavy",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lite" | "light" => Ok(ModelChoice::Lite),
            "full" => Ok(ModelChoice::Full),
            "heavy" => Ok(ModelChoice::Heavy),
            other => Err(format!(
                "Invalid model choice: {}. Must be one of: lite, full, heavy",
                other
            )),
        }
    }
}

/// Which pose model to use and where to keep it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub choice: ModelChoice,
    pub cache_dir: PathBuf,
    /// Overrides the published URL for the chosen variant
    pub url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            choice: ModelChoice::Lite,
            cache_dir: PathBuf::from("models"),
            url: None,
        }
    }
}

impl ModelConfig {
    pub fn model_info(&self) -> ModelInfo {
        let mut info = mediapipe::pose_landmarker(self.choice);
        if let Some(url) = &self.url {
            info.source = ModelSource::Url(url.clone());
        }
        info
    }
}

/// MediaPipe task bundle configurations
pub mod mediapipe {
    use super::*;

    pub fn pose_landmarker(choice: ModelChoice) -> ModelInfo {
        let variant = match choice {
            ModelChoice::Lite => "pose_landmarker_lite",
            ModelChoice::Full => "pose_landmarker_full",
            ModelChoice::Heavy => "pose_landmarker_heavy",
        };

        ModelInfo {
            name: format!("{}.task", variant),
            source: ModelSource::Url(format!(
                "https://storage.googleapis.com/mediapipe-models/pose_landmarker/{0}/float16/1/{0}.task",
                variant
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Nothing listens on the discard port, so the connection is refused
    const UNREACHABLE_URL: &str = "http://127.0.0.1:9/pose_landmarker_lite.task";

    #[test]
    fn test_model_manager_creation() {
        let temp_dir = tempdir().unwrap();
        let cache_dir = temp_dir.path().join("models");
        let manager = ModelManager::new(cache_dir.clone()).unwrap();

        assert_eq!(manager.cache_dir(), cache_dir.as_path());
        assert!(cache_dir.is_dir());
    }

    #[test]
    fn test_cached_model_skips_download() {
        let temp_dir = tempdir().unwrap();
        let manager = ModelManager::new(temp_dir.path().to_path_buf()).unwrap();
        let model = ModelInfo {
            name: "pose.task".to_string(),
            source: ModelSource::Url(UNREACHABLE_URL.to_string()),
        };
        fs::write(manager.get_model_path("pose.task"), b"cached").unwrap();

        let path = manager.ensure_model(&model).unwrap();

        assert_eq!(fs::read(path).unwrap(), b"cached");
    }

    #[test]
    fn test_local_file_source_is_copied() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source.task");
        fs::write(&source, b"weights").unwrap();

        let manager = ModelManager::new(temp_dir.path().join("cache")).unwrap();
        let model = ModelInfo {
            name: "pose.task".to_string(),
            source: ModelSource::LocalFile(source),
        };

        let path = manager.ensure_model(&model).unwrap();

        assert!(manager.is_cached(&model));
        assert_eq!(fs::read(&path).unwrap(), b"weights");
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_failed_copy_leaves_nothing_cached() {
        let temp_dir = tempdir().unwrap();
        let manager = ModelManager::new(temp_dir.path().to_path_buf()).unwrap();
        let model = ModelInfo {
            name: "pose.task".to_string(),
            source: ModelSource::LocalFile(temp_dir.path().join("missing.task")),
        };

        let result = manager.ensure_model(&model);

        assert!(matches!(result, Err(ModelError::Io(_))));
        assert!(!manager.is_cached(&model));
        assert!(!partial_path(&manager.get_model_path("pose.task")).exists());
    }

    #[test]
    fn test_failed_download_reports_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("pose.task");

        let result = ensure_model(&path, UNREACHABLE_URL);

        assert!(matches!(result, Err(ModelError::Download(_))));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_ensure_model_existing_path() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("pose.task");
        fs::write(&path, b"cached").unwrap();

        assert_eq!(ensure_model(&path, UNREACHABLE_URL).unwrap(), path);
    }

    #[test]
    fn test_partial_path() {
        let path = Path::new("/tmp/models/pose.task");
        assert_eq!(partial_path(path), PathBuf::from("/tmp/models/pose.task.part"));
    }

    #[test]
    fn test_mediapipe_models() {
        let lite = mediapipe::pose_landmarker(ModelChoice::Lite);
        assert_eq!(lite.name, "pose_landmarker_lite.task");
        assert!(matches!(&lite.source, ModelSource::Url(url) if url.ends_with("/pose_landmarker_lite.task")));

        let heavy = mediapipe::pose_landmarker(ModelChoice::Heavy);
        assert_eq!(heavy.name, "pose_landmarker_heavy.task");
        assert!(matches!(&heavy.source, ModelSource::Url(url) if url.contains("/pose_landmarker_heavy/")));
    }

    #[test]
    fn test_model_config_url_override() {
        let config = ModelConfig {
            url: Some("https://example.com/custom.task".to_string()),
            ..Default::default()
        };

        let info = config.model_info();
        assert_eq!(info.name, "pose_landmarker_lite.task");
        assert_eq!(
            info.source,
            ModelSource::Url("https://example.com/custom.task".to_string())
        );
    }

    #[test]
    fn test_model_choice_parsing() {
        assert_eq!("lite".parse::<ModelChoice>().unwrap(), ModelChoice::Lite);
        assert_eq!("light".parse::<ModelChoice>().unwrap(), ModelChoice::Lite);
        assert_eq!("HEAVY".parse::<ModelChoice>().unwrap(), ModelChoice::Heavy);
        assert!("medium".parse::<ModelChoice>().is_err());
        assert_eq!(ModelChoice::Full.to_string(), "full");
    }
}
