//! Dataset configuration

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use ns_core::{Category, Kind};

/// Errors that can occur while loading or saving a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration of a dataset to browse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Local path, `file://` URL or remote lake URL (`s3://`, `s3a://`, `sqlite://`)
    pub url: String,

    /// Root of the on-disk cache used by remote sources
    pub cache_dir: PathBuf,

    /// Category opened first
    pub category: Category,

    /// Fetch a missing local dataset through the configured fetcher
    pub download_if_not_exists: bool,

    /// Extension of front camera frames
    pub camera_ext: String,

    /// Extension of top lidar sweeps
    pub lidar_ext: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            url: "./data/nuscenes".to_string(),
            cache_dir: PathBuf::from("./cache"),
            category: Category::Samples,
            download_if_not_exists: false,
            camera_ext: Kind::CamFront.default_ext().to_string(),
            lidar_ext: Kind::LidarTop.default_ext().to_string(),
        }
    }
}

impl DatasetConfig {
    /// Create a configuration for `url` with defaults elsewhere
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save as pretty-printed JSON
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn extensions(&self) -> ChannelExtensions {
        ChannelExtensions {
            camera: self.camera_ext.clone(),
            lidar: self.lidar_ext.clone(),
        }
    }
}

/// File extensions of the indexed channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelExtensions {
    pub camera: String,
    pub lidar: String,
}

impl ChannelExtensions {
    pub fn get(&self, kind: Kind) -> &str {
        match kind {
            Kind::CamFront => &self.camera,
            Kind::LidarTop => &self.lidar,
        }
    }
}

impl Default for ChannelExtensions {
    fn default() -> Self {
        DatasetConfig::default().extensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        std::fs::write(&path, r#"{ "url": "s3://bucket/nuscenes", "category": "sweeps" }"#).unwrap();

        let config = DatasetConfig::from_file(&path).unwrap();
        assert_eq!(config.url, "s3://bucket/nuscenes");
        assert_eq!(config.category, Category::Sweeps);
        assert_eq!(config.cache_dir, PathBuf::from("./cache"));
        assert_eq!(config.extensions().get(Kind::LidarTop), ".usd");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        let mut config = DatasetConfig::new("/data/nuscenes");
        config.lidar_ext = ".pcd.usd".to_string();
        config.to_file(&path).unwrap();

        assert_eq!(DatasetConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        std::fs::write(&path, "{ url: ").unwrap();
        assert!(matches!(DatasetConfig::from_file(&path), Err(ConfigError::Json(_))));
    }
}
