//! Timestamp indexing for one (scene, kind) channel
//!
//! An index is built once from a directory listing and never mutated;
//! switching scenes replaces the whole index.

use std::ops::Range;

use crate::dataset::Kind;
use crate::error::{DatasetError, Result};

/// A single dataset file and the capture time encoded in its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedFile {
    /// Capture timestamp in milliseconds
    pub timestamp: i64,
    pub filename: String,
}

/// Sorted timestamp -> filename mapping for one scene and sensor kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampIndex {
    timestamps: Vec<i64>,
    filenames: Vec<String>,
}

impl TimestampIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a directory listing.
    ///
    /// Only names of the form `<scene>__<KIND>__<timestamp><ext>` are kept.
    /// Entries end up strictly ascending by timestamp; a repeated timestamp
    /// keeps the lexicographically first filename.
    pub fn from_filenames<I, S>(filenames: I, scene: &str, kind: Kind, ext: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = format!("{}{}", scene, kind.marker());

        let mut entries = Vec::new();
        for filename in filenames {
            let filename = filename.as_ref();
            if !filename.starts_with(&prefix) || !filename.ends_with(ext) {
                continue;
            }
            let timestamp = parse_timestamp(&filename[prefix.len()..]).ok_or_else(|| {
                DatasetError::MalformedFilename {
                    filename: filename.to_string(),
                    kind: kind.as_str().to_string(),
                }
            })?;
            entries.push(TimestampedFile {
                timestamp,
                filename: filename.to_string(),
            });
        }

        Ok(Self::from_entries(entries))
    }

    /// Build an index from already parsed entries
    pub fn from_entries(mut entries: Vec<TimestampedFile>) -> Self {
        entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        entries.dedup_by_key(|entry| entry.timestamp);

        let (timestamps, filenames) = entries
            .into_iter()
            .map(|entry| (entry.timestamp, entry.filename))
            .unzip();

        Self { timestamps, filenames }
    }

    /// All indexed timestamps, ascending
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// Filenames aligned with [`Self::timestamps`]
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Half-open range `[first, last)` of the indexed timestamps.
    ///
    /// The exclusive upper bound is part of the navigation contract:
    /// `seek_to_end` seeks to `range.end`.
    pub fn range(&self) -> Option<Range<i64>> {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(&first), Some(&last)) => Some(first..last),
            _ => None,
        }
    }

    /// Position of the nearest entry at or below `timestamp`.
    ///
    /// The binary search runs over `timestamps[..len - 1]`; its insertion
    /// point is then stepped back by one when the entry there is later than
    /// the query. Queries before the first entry clamp to index 0.
    pub fn seek_position(&self, timestamp: i64) -> Result<usize> {
        if self.timestamps.is_empty() {
            return Err(DatasetError::InvalidState(
                "Cannot seek an empty timestamp index".to_string(),
            ));
        }

        let hi = self.timestamps.len() - 1;
        let mut index = self.timestamps[..hi].partition_point(|&t| t < timestamp);
        if timestamp < self.timestamps[index] {
            index = index.saturating_sub(1);
        }
        Ok(index)
    }

    /// Filename of the nearest entry at or below `timestamp`
    pub fn seek_by(&self, timestamp: i64) -> Result<&str> {
        let index = self.seek_position(timestamp)?;
        Ok(&self.filenames[index])
    }
}

/// Parse the decimal timestamp that starts `rest` and runs up to the first `.`
fn parse_timestamp(rest: &str) -> Option<i64> {
    let digits = rest.split('.').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
