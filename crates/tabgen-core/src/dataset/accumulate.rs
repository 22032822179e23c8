use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{BatchResult, Row};

/// Merges a batch into previously accumulated rows and sources.
///
/// Rows are appended after the prior rows in the order the batch returned
/// them. Sources are a set union on exact string equality. Nothing prior is
/// removed or reordered.
pub fn accumulate(
    prior_rows: &[Row],
    prior_sources: &BTreeSet<String>,
    result: &BatchResult,
) -> (Vec<Row>, BTreeSet<String>) {
    let mut rows = Vec::with_capacity(prior_rows.len() + result.rows.len());
    rows.extend_from_slice(prior_rows);
    rows.extend(result.rows.iter().cloned());

    let sources = prior_sources.union(&result.sources).cloned().collect();

    (rows, sources)
}

/// The running dataset a caller builds up across batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub sources: BTreeSet<String>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new dataset with `result` merged in.
    pub fn absorb(&self, result: &BatchResult) -> Self {
        let (rows, sources) = accumulate(&self.rows, &self.sources, result);
        Self { rows, sources }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
