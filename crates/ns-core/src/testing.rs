//! In-memory dataset source for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::catalog::SceneCatalog;
use crate::dataset::{Category, Kind, Locator};
use crate::error::{DatasetError, Result};
use crate::index::TimestampIndex;
use crate::source::DatasetSource;

#[derive(Default)]
pub(crate) struct MemorySource {
    files: HashMap<(Category, Kind), Vec<String>>,
    missing: bool,
    pub materialized: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    pub fn with_files(mut self, category: Category, kind: Kind, names: &[&str]) -> Self {
        self.files
            .entry((category, kind))
            .or_default()
            .extend(names.iter().map(|name| name.to_string()));
        self
    }

    fn names(&self, category: Category, kind: Kind) -> &[String] {
        self.files
            .get(&(category, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl DatasetSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self) -> Result<()> {
        if self.missing {
            return Err(DatasetError::DatasetNotFound("memory".to_string()));
        }
        Ok(())
    }

    fn category_root(&self, category: Category) -> Locator {
        Locator::new(category.as_str())
    }

    fn list_scenes(&self, category: Category) -> Result<SceneCatalog> {
        Ok(SceneCatalog::from_filenames(
            self.names(category, Kind::LidarTop),
            Kind::LidarTop,
            Kind::LidarTop.default_ext(),
        ))
    }

    fn list_timestamps(
        &self,
        category: Category,
        kind: Kind,
        scene: &str,
        ext: &str,
    ) -> Result<(Locator, TimestampIndex)> {
        let base = Locator::new(format!("{}/{}", category, kind));
        let index = TimestampIndex::from_filenames(self.names(category, kind), scene, kind, ext)?;
        Ok((base, index))
    }

    fn materialize(&self, base: &Locator, filename: &str) -> Result<String> {
        self.materialized.fetch_add(1, Ordering::SeqCst);
        Ok(format!("mem://{}/{}", base, filename))
    }
}
