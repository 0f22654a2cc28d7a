//! Read-only bulk lookups for warming source caches

use rayon::prelude::*;

use super::DatasetNavigator;
use crate::dataset::Kind;
use crate::error::{DatasetError, Result};

impl DatasetNavigator {
    /// Resolve many timestamps of one channel on the rayon pool.
    ///
    /// Results come back in the order of `timestamps`; navigator state is
    /// left untouched.
    pub fn prefetch(&self, kind: Kind, timestamps: &[i64]) -> Vec<Result<String>> {
        timestamps
            .par_iter()
            .map(|&timestamp| self.lookup(kind, timestamp))
            .collect()
    }

    /// Resolve `count` timestamps ahead of the current one, `step`
    /// milliseconds apart, stopping at the end of the range.
    pub fn prefetch_window(&self, kind: Kind, count: usize, step: i64) -> Result<Vec<String>> {
        if step <= 0 {
            return Err(DatasetError::InvalidState(format!(
                "Prefetch step must be positive, got {step}"
            )));
        }
        let current = self
            .timestamp()
            .ok_or_else(|| DatasetError::InvalidState("Dataset is not loaded".to_string()))?;
        let end = self.timestamps().map(|range| range.end).unwrap_or(current);

        let mut window: Vec<i64> = (1..=count as i64)
            .map(|k| current.saturating_add(step.saturating_mul(k)).min(end))
            .collect();
        window.dedup();

        self.prefetch(kind, &window).into_iter().collect()
    }
}
