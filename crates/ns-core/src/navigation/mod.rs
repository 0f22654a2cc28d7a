//! Stateful browsing over a dataset source
//!
//! The navigator is driven either directly through its checkout/seek
//! methods or through [`NavigatorCommand`]s; interested parties subscribe
//! to state changes instead of reaching into navigator internals.

use std::ops::Range;
use serde::{Serialize, Deserialize};

use crate::dataset::Category;

mod navigator;
mod prefetch;
mod state;
mod subscriber;

pub use navigator::DatasetNavigator;
pub use subscriber::NavigatorSubscriber;

/// Selection commands a viewer sends into the navigator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigatorCommand {
    /// Load the dataset if it is not loaded yet
    Load,
    SelectCategory(Category),
    /// Select a scene by its position in the scene list
    SelectScene(usize),
    /// Seek to a timestamp in milliseconds
    SelectTimestamp(i64),
    SeekNext,
    SeekToStart,
    SeekToEnd,
}

/// Read model of the navigator handed to subscribers and viewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorSnapshot {
    pub source: String,
    pub loaded: bool,
    pub category: Category,
    pub scene: Option<String>,
    pub scene_index: Option<usize>,
    pub scene_count: usize,
    pub timestamp: Option<i64>,
    /// Half-open range of browsable timestamps
    pub timestamps: Option<Range<i64>>,
    pub cam_front: Option<String>,
    pub lidar_top: Option<String>,
}
