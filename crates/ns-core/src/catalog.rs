//! Scene discovery over a category's reference channel

use std::collections::BTreeSet;

use crate::dataset::Kind;
use crate::error::{DatasetError, Result};

/// Leading character shared by every nuScenes scene token
pub const SCENE_PREFIX: char = 'n';

/// Sorted, deduplicated scene tokens of one category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneCatalog {
    scenes: Vec<String>,
}

impl SceneCatalog {
    /// Create a catalog from arbitrary scene tokens.
    /// Empty tokens are dropped; the rest are sorted and deduplicated.
    pub fn new<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scenes: BTreeSet<String> = scenes
            .into_iter()
            .map(Into::into)
            .filter(|scene: &String| !scene.is_empty())
            .collect();
        Self {
            scenes: scenes.into_iter().collect(),
        }
    }

    /// Discover scenes from the filenames of one channel directory
    pub fn from_filenames<I, S>(filenames: I, kind: Kind, ext: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            filenames
                .into_iter()
                .filter_map(|name| scene_of(name.as_ref(), kind, ext).map(str::to_string)),
        )
    }

    pub fn scenes(&self) -> &[String] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene at `index`, or `InvalidState` when out of range
    pub fn get(&self, index: usize) -> Result<&str> {
        self.scenes.get(index).map(String::as_str).ok_or_else(|| {
            if self.scenes.is_empty() {
                DatasetError::InvalidState("Empty dataset".to_string())
            } else {
                DatasetError::InvalidState(format!(
                    "Scene index {} out of bounds (max: {})",
                    index,
                    self.scenes.len() - 1
                ))
            }
        })
    }
}

/// Scene token of a `<scene>__<KIND>__<timestamp><ext>` filename
pub fn scene_of<'a>(filename: &'a str, kind: Kind, ext: &str) -> Option<&'a str> {
    if !filename.starts_with(SCENE_PREFIX) || !filename.ends_with(ext) {
        return None;
    }
    let end = filename.find(&kind.marker())?;
    Some(&filename[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_of() {
        assert_eq!(scene_of("n001__LIDAR_TOP__100.usd", Kind::LidarTop, ".usd"), Some("n001"));
        assert_eq!(scene_of("x001__LIDAR_TOP__100.usd", Kind::LidarTop, ".usd"), None);
        assert_eq!(scene_of("n001__CAM_FRONT__100.jpg", Kind::LidarTop, ".jpg"), None);
        assert_eq!(scene_of("n001__LIDAR_TOP__100.bin", Kind::LidarTop, ".usd"), None);
    }

    #[test]
    fn test_catalog_sorted_and_deduplicated() {
        let catalog = SceneCatalog::from_filenames(
            [
                "n2__LIDAR_TOP__5.usd",
                "n1__LIDAR_TOP__9.usd",
                "n2__LIDAR_TOP__1.usd",
                ".DS_Store",
                "n1__LIDAR_TOP__3.usd",
            ],
            Kind::LidarTop,
            ".usd",
        );
        assert_eq!(catalog.scenes(), &["n1".to_string(), "n2".to_string()]);
        assert_eq!(catalog.get(0).unwrap(), "n1");
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = SceneCatalog::new(Vec::<String>::new());
        assert!(catalog.is_empty());
        assert!(matches!(catalog.get(0), Err(DatasetError::InvalidState(_))));

        let catalog = SceneCatalog::new(["n1", ""]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(3).is_err());
    }
}
