//! Core of the nuScenes dataset browser
//!
//! This crate provides the dataset vocabulary, timestamp indexing, scene
//! discovery, the [`DatasetSource`] abstraction and the stateful
//! [`DatasetNavigator`] built on top of it.

pub mod catalog;
pub mod dataset;
pub mod error;
pub mod index;
pub mod navigation;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use catalog::SceneCatalog;
pub use dataset::{Category, Kind, Locator};
pub use error::{DatasetError, Result};
pub use index::{TimestampIndex, TimestampedFile};
pub use navigation::{DatasetNavigator, NavigatorCommand, NavigatorSnapshot, NavigatorSubscriber};
pub use source::{file_uri, DatasetSource};
