//! The dataset source abstraction navigators browse through

use crate::catalog::SceneCatalog;
use crate::dataset::{Category, Kind, Locator};
use crate::error::Result;
use crate::index::TimestampIndex;

/// Trait for dataset backends (local filesystem, remote lake, ...)
///
/// Implementations must tolerate concurrent `materialize` calls for the
/// same file: navigators issue read-only lookups from worker threads.
pub trait DatasetSource: Send + Sync {
    /// Identity of this source, used for logging and cache keys
    fn name(&self) -> &str;

    /// Validate that the dataset is reachable, preparing it if needed
    fn open(&mut self) -> Result<()>;

    /// Root locator of one category
    fn category_root(&self, category: Category) -> Locator;

    /// All scenes of a category, discovered from the lidar channel
    fn list_scenes(&self, category: Category) -> Result<SceneCatalog>;

    /// Base locator and timestamp index of one scene's channel
    fn list_timestamps(
        &self,
        category: Category,
        kind: Kind,
        scene: &str,
        ext: &str,
    ) -> Result<(Locator, TimestampIndex)>;

    /// A `file://` URI for `filename` under `base`, fetching it if necessary
    fn materialize(&self, base: &Locator, filename: &str) -> Result<String>;

    /// File extension used for a channel
    fn extension(&self, kind: Kind) -> &str {
        kind.default_ext()
    }
}

/// Format an absolute path as the URI handed to viewers
pub fn file_uri(path: &std::path::Path) -> String {
    format!("file://{}", path.display())
}
