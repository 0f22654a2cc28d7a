//! Dataset sources for the nuScenes browser
//!
//! Two backends implement [`ns_core::DatasetSource`]: a local filesystem
//! tree and a SQL-queryable data lake whose listings and files are cached
//! on disk. [`load_dataset`] picks one from the configured URL.

pub mod cache;
pub mod config;
pub mod lake;
pub mod sources;

// Re-exports
pub use cache::SourceCache;
pub use config::{ChannelExtensions, ConfigError, DatasetConfig};
pub use lake::{LakeClient, LakeConnector, SqliteLake, SqliteLakeConnector};
pub use sources::{load_dataset, DatasetFetcher, FileSystemSource, LakeSource, SourceLocation};
