//! Local filesystem dataset source

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use ns_core::{
    file_uri, Category, DatasetError, DatasetSource, Kind, Locator, Result, SceneCatalog,
    TimestampIndex,
};
use crate::config::ChannelExtensions;

/// Supplies a local copy of a dataset that is not on disk yet
pub trait DatasetFetcher: Send + Sync {
    /// Download and extract the dataset expected at `path`, returning its root
    fn fetch(&self, path: &Path) -> Result<PathBuf>;
}

/// Dataset laid out as `root/{samples|sweeps}/{CAM_FRONT|LIDAR_TOP}/<files>`
pub struct FileSystemSource {
    path: PathBuf,
    name: String,
    extensions: ChannelExtensions,
    fetcher: Option<Box<dyn DatasetFetcher>>,
}

impl FileSystemSource {
    /// Create a source rooted at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            name: path.display().to_string(),
            path,
            extensions: ChannelExtensions::default(),
            fetcher: None,
        }
    }

    /// Use custom channel extensions
    pub fn with_extensions(mut self, extensions: ChannelExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Fetch the dataset on open when the root does not exist
    pub fn with_fetcher(mut self, fetcher: Box<dyn DatasetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn channel_dir(&self, category: Category, kind: Kind) -> PathBuf {
        self.path.join(category.as_str()).join(kind.as_str())
    }
}

impl DatasetSource for FileSystemSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if !self.path.exists() {
            if let Some(fetcher) = &self.fetcher {
                info!("Fetching nuScenes dataset into {}", self.path.display());
                self.path = fetcher.fetch(&self.path)?;
            }
        }
        if !self.path.exists() {
            return Err(DatasetError::DatasetNotFound(self.path.display().to_string()));
        }

        self.path = std::fs::canonicalize(&self.path)?;
        self.name = self.path.display().to_string();
        Ok(())
    }

    fn category_root(&self, category: Category) -> Locator {
        Locator::new(self.path.join(category.as_str()).display().to_string())
    }

    fn list_scenes(&self, category: Category) -> Result<SceneCatalog> {
        let kind = Kind::LidarTop;
        let names = list_dir(&self.channel_dir(category, kind))?;
        Ok(SceneCatalog::from_filenames(names, kind, self.extensions.get(kind)))
    }

    fn list_timestamps(
        &self,
        category: Category,
        kind: Kind,
        scene: &str,
        ext: &str,
    ) -> Result<(Locator, TimestampIndex)> {
        let dir = self.channel_dir(category, kind);
        let index = TimestampIndex::from_filenames(list_dir(&dir)?, scene, kind, ext)?;
        Ok((Locator::new(dir.display().to_string()), index))
    }

    fn materialize(&self, base: &Locator, filename: &str) -> Result<String> {
        Ok(file_uri(&Path::new(base.as_str()).join(filename)))
    }

    fn extension(&self, kind: Kind) -> &str {
        self.extensions.get(kind)
    }
}

/// File names of a channel directory
fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::DatasetNotFound(dir.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => warn!("Skipping non UTF-8 file name: {:?}", name),
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::write_dataset;

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileSystemSource::new(dir.path().join("nuscenes"));
        let err = source.open().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_listing_and_uris() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_dataset(dir.path());
        let mut source = FileSystemSource::new(&root);
        source.open().unwrap();

        let catalog = source.list_scenes(Category::Samples).unwrap();
        assert_eq!(catalog.scenes(), &["n001".to_string(), "n002".to_string()]);

        let (base, index) = source
            .list_timestamps(Category::Samples, Kind::CamFront, "n001", ".jpg")
            .unwrap();
        assert_eq!(index.timestamps(), &[100, 200]);

        let uri = source.materialize(&base, index.seek_by(150).unwrap()).unwrap();
        let expected = std::fs::canonicalize(&root)
            .unwrap()
            .join("samples/CAM_FRONT/n001__CAM_FRONT__100.jpg");
        assert_eq!(uri, format!("file://{}", expected.display()));
    }

    #[test]
    fn test_missing_category_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_dataset(dir.path());
        let mut source = FileSystemSource::new(&root);
        source.open().unwrap();
        assert!(source.list_scenes(Category::Sweeps).unwrap_err().is_not_found());
    }

    struct CopyFetcher {
        from: PathBuf,
    }

    impl DatasetFetcher for CopyFetcher {
        fn fetch(&self, _path: &Path) -> Result<PathBuf> {
            Ok(self.from.clone())
        }
    }

    #[test]
    fn test_fetcher_runs_only_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_dataset(dir.path());

        let mut source = FileSystemSource::new(dir.path().join("not-there"))
            .with_fetcher(Box::new(CopyFetcher { from: root.clone() }));
        source.open().unwrap();
        assert_eq!(source.path(), std::fs::canonicalize(&root).unwrap());
        assert_eq!(source.list_scenes(Category::Samples).unwrap().len(), 2);
    }
}
