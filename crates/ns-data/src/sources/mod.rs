//! Dataset source implementations and the source factory

use tracing::info;

use ns_core::{DatasetSource, Result};
use crate::config::DatasetConfig;
use crate::lake::{is_remote, LakeConnector};

pub mod filesystem;
pub mod lake;

pub use filesystem::{DatasetFetcher, FileSystemSource};
pub use lake::LakeSource;

/// Where a dataset URL points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation<'a> {
    /// A local directory, `file://` scheme stripped
    Local(&'a str),
    /// A lake URL
    Remote(&'a str),
}

impl<'a> SourceLocation<'a> {
    pub fn parse(url: &'a str) -> Self {
        if is_remote(url) {
            SourceLocation::Remote(url)
        } else {
            SourceLocation::Local(url.strip_prefix("file://").unwrap_or(url))
        }
    }
}

/// Build the source selected by the configured URL.
///
/// Lake URLs are opened through `connector`. `fetcher` is attached to local
/// sources only, and only when `download_if_not_exists` is set.
pub fn load_dataset(
    config: &DatasetConfig,
    connector: &dyn LakeConnector,
    fetcher: Option<Box<dyn DatasetFetcher>>,
) -> Result<Box<dyn DatasetSource>> {
    match SourceLocation::parse(&config.url) {
        SourceLocation::Remote(url) => {
            info!("Loading nuScenes lake source: {}", url);
            let client = connector.connect(url)?;
            let source = LakeSource::new(url, client, &config.cache_dir)
                .with_extensions(config.extensions());
            Ok(Box::new(source))
        }
        SourceLocation::Local(path) => {
            info!("Loading nuScenes filesystem source: {}", path);
            let mut source = FileSystemSource::new(path).with_extensions(config.extensions());
            if config.download_if_not_exists {
                if let Some(fetcher) = fetcher {
                    source = source.with_fetcher(fetcher);
                }
            }
            Ok(Box::new(source))
        }
    }
}
