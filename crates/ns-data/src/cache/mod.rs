//! On-disk cache for remote sources
//!
//! Layout under `cache_dir/<sha256 of the source identity>/`:
//! - `<column>/<key>.parquet` listing query snapshots
//! - `<category>/<KIND>/<filename>` materialized file bodies
//!
//! Entries are never invalidated. Every write lands in a unique temp file
//! that is renamed into place, so concurrent writers of the same entry
//! simply replace each other.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use arrow::array::{Array, BinaryArray, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use ns_core::{DatasetError, Result};

/// Cache directory of one dataset source
#[derive(Debug, Clone)]
pub struct SourceCache {
    root: PathBuf,
}

impl SourceCache {
    /// Create the cache of the source identified by `identity` (its URL)
    pub fn new(cache_dir: impl AsRef<Path>, identity: &str) -> Self {
        let cache_dir = cache_dir.as_ref();
        let cache_dir = std::path::absolute(cache_dir).unwrap_or_else(|_| cache_dir.to_path_buf());
        Self {
            root: cache_dir.join(source_uid(identity)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a listing snapshot
    pub fn listing_path(&self, column: &str, key: &str) -> PathBuf {
        self.root.join(column).join(format!("{key}.parquet"))
    }

    /// Location of a materialized file under a remote `parent` directory
    pub fn file_path(&self, parent: &str, filename: &str) -> PathBuf {
        self.root.join(parent.trim_start_matches('/')).join(filename)
    }

    /// Read a listing snapshot, `None` if it was never written
    pub fn read_listing(&self, column: &str, key: &str) -> Result<Option<Vec<RecordBatch>>> {
        let path = self.listing_path(column, key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .and_then(|builder| builder.build())
            .map_err(|e| DatasetError::Cache(format!("Failed to open {}: {}", path.display(), e)))?;

        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DatasetError::Cache(format!("Failed to read {}: {}", path.display(), e)))?;

        debug!("Listing cache hit: {}", path.display());
        Ok(Some(batches))
    }

    /// Store a listing query result
    pub fn write_listing(&self, column: &str, key: &str, batch: &RecordBatch) -> Result<()> {
        let path = self.listing_path(column, key);
        write_atomic(&path, |file| {
            let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
                .map_err(|e| DatasetError::Cache(format!("Failed to create parquet writer: {}", e)))?;
            writer
                .write(batch)
                .map_err(|e| DatasetError::Cache(format!("Failed to write parquet: {}", e)))?;
            writer
                .close()
                .map_err(|e| DatasetError::Cache(format!("Failed to finish parquet: {}", e)))?;
            Ok(())
        })
    }

    /// Store a file body
    pub fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        write_atomic(path, |mut file| {
            file.write_all(data)?;
            file.sync_all()?;
            Ok(())
        })
    }
}

/// Hex SHA-256 of a source identity
pub fn source_uid(identity: &str) -> String {
    format!("{:x}", Sha256::digest(identity.as_bytes()))
}

/// All non-null values of a UTF-8 column across batches
pub fn string_column(batches: &[RecordBatch], column: &str) -> Result<Vec<String>> {
    let mut values = Vec::new();
    for batch in batches {
        let array = batch
            .column_by_name(column)
            .ok_or_else(|| DatasetError::Cache(format!("Missing column '{}'", column)))?;
        let array = array
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| DatasetError::Cache(format!("Column '{}' is not UTF-8", column)))?;
        values.extend(array.iter().flatten().map(str::to_string));
    }
    Ok(values)
}

/// First non-null value of a binary column
pub fn first_binary(batch: &RecordBatch, column: &str) -> Option<Vec<u8>> {
    let array = batch.column_by_name(column)?;
    let array = array.as_any().downcast_ref::<BinaryArray>()?;
    (0..array.len())
        .find(|&i| array.is_valid(i))
        .map(|i| array.value(i).to_vec())
}

fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let parent = path
        .parent()
        .ok_or_else(|| DatasetError::Cache(format!("No parent directory for {}", path.display())))?;
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{}.{}.part", file_name, Uuid::new_v4()));

    let written = File::create(&temp)
        .map_err(DatasetError::from)
        .and_then(write);
    if let Err(error) = written {
        let _ = fs::remove_file(&temp);
        return Err(error);
    }

    fs::rename(&temp, path)?;
    Ok(())
}
