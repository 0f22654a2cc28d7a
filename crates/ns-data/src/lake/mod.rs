//! Transport seam to content-addressed data lakes
//!
//! A lake exposes a single `rootfs(parent, name, data)` relation that is
//! queried with SQL. Remote object stores plug in through [`LakeConnector`];
//! [`SqliteLake`] is the built-in, file-backed implementation.

use std::sync::Arc;
use arrow::record_batch::RecordBatch;

use ns_core::{DatasetError, Result};

mod sqlite;

pub use sqlite::{SqliteLake, SqliteLakeConnector};

/// URL prefixes that select a lake-backed source
pub const REMOTE_SCHEMES: [&str; 3] = ["s3://", "s3a://", "sqlite://"];

/// A queryable lake
pub trait LakeClient: Send + Sync {
    /// Run a query against `rootfs`; failures surface as `Transport` errors
    fn sql(&self, query: &str) -> Result<RecordBatch>;
}

/// Opens lake clients for URLs
pub trait LakeConnector: Send + Sync {
    fn connect(&self, url: &str) -> Result<Arc<dyn LakeClient>>;
}

/// Whether `url` carries a lake scheme
pub fn is_remote(url: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// Quote a string as an SQL literal
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(crate) fn unsupported(url: &str) -> DatasetError {
    DatasetError::transport(format!("No lake connector for {url}"))
}
