//! Dataset vocabulary: categories, sensor kinds and source locators

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::error::DatasetError;

/// Top-level partition of a nuScenes dataset root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Curated keyframes
    #[default]
    Samples,
    /// Full-rate capture
    Sweeps,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Samples, Category::Sweeps];

    /// Directory name of this category under the dataset root
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Samples => "samples",
            Category::Sweeps => "sweeps",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "samples" => Ok(Category::Samples),
            "sweeps" => Ok(Category::Sweeps),
            other => Err(DatasetError::UnknownName {
                what: "category",
                value: other.to_string(),
            }),
        }
    }
}

/// Sensor channel embedded in dataset filenames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    CamFront,
    LidarTop,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::CamFront, Kind::LidarTop];

    /// Channel name as it appears in directory and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::CamFront => "CAM_FRONT",
            Kind::LidarTop => "LIDAR_TOP",
        }
    }

    /// Default file extension of this channel
    pub fn default_ext(&self) -> &'static str {
        match self {
            Kind::CamFront => ".jpg",
            Kind::LidarTop => ".usd",
        }
    }

    /// The `__KIND__` separator between scene token and timestamp
    pub fn marker(&self) -> String {
        format!("__{}__", self.as_str())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CAM_FRONT" | "CAM" | "CAMERA" => Ok(Kind::CamFront),
            "LIDAR_TOP" | "LIDAR" => Ok(Kind::LidarTop),
            _ => Err(DatasetError::UnknownName {
                what: "sensor kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Source-specific base location of a directory of dataset files.
///
/// For the local filesystem this is an absolute directory path, for the
/// remote lake it is the `parent` column value (e.g. `/samples/LIDAR_TOP`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
