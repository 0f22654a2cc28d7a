//! Internal navigator state
//!
//! Each level is resolved completely before it replaces the previous one,
//! so a failed checkout never leaves a half-updated navigator behind.

use std::ops::Range;

use crate::catalog::SceneCatalog;
use crate::dataset::{Category, Kind, Locator};
use crate::index::TimestampIndex;

/// One sensor channel of the current scene
#[derive(Debug, Clone)]
pub(crate) struct Channel {
    pub base: Locator,
    pub index: TimestampIndex,
}

#[derive(Debug, Clone)]
pub(crate) struct LoadedCategory {
    pub category: Category,
    pub root: Locator,
    pub catalog: SceneCatalog,
}

#[derive(Debug, Clone)]
pub(crate) struct LoadedScene {
    pub index: usize,
    pub name: String,
    pub camera: Channel,
    pub lidar: Channel,
    /// `[first, last)` over the lidar channel
    pub range: Range<i64>,
}

impl LoadedScene {
    pub fn channel(&self, kind: Kind) -> &Channel {
        match kind {
            Kind::CamFront => &self.camera,
            Kind::LidarTop => &self.lidar,
        }
    }

    /// Clamp a requested timestamp into `[range.start, range.end]`
    pub fn clamp(&self, timestamp: i64) -> i64 {
        timestamp.clamp(self.range.start, self.range.end)
    }
}

/// Current timestamp and the files it resolves to
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    pub timestamp: i64,
    pub cam_front: String,
    pub lidar_top: String,
}

impl Cursor {
    pub fn uri(&self, kind: Kind) -> &str {
        match kind {
            Kind::CamFront => &self.cam_front,
            Kind::LidarTop => &self.lidar_top,
        }
    }
}

/// Everything a loaded navigator holds
#[derive(Debug, Clone)]
pub(crate) struct Loaded {
    pub category: LoadedCategory,
    pub scene: LoadedScene,
    pub cursor: Cursor,
}
