//! In-memory adapters for embedding the aggregator without workbooks.

use std::collections::{BTreeMap, HashMap};

use crate::campus::rollup::error::{Result, RollupError};
use crate::campus::rollup::model::{Level, RowRange, SourceRecord};
use crate::campus::rollup::ports::{DestinationStore, SourceReader};

/// Source reader serving fixed records per level.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: HashMap<Level, Vec<SourceRecord>>,
    failures: HashMap<Level, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, level: Level, records: Vec<SourceRecord>) -> Self {
        self.records.entry(level).or_default().extend(records);
        self
    }

    /// Makes `read` fail for the level with the given message.
    pub fn with_failure(mut self, level: Level, message: impl Into<String>) -> Self {
        self.failures.insert(level, message.into());
        self
    }
}

impl SourceReader for MemorySource {
    fn read(&self, level: Level) -> Result<Vec<SourceRecord>> {
        if let Some(message) = self.failures.get(&level) {
            return Err(RollupError::InvalidWorkbook(message.clone()));
        }
        Ok(self.records.get(&level).cloned().unwrap_or_default())
    }
}

/// Report sheet kept as row → label and row → count maps.
///
/// Every batch passed to `write_counts` is also logged so callers can check
/// how the aggregator wrote.
#[derive(Debug, Clone)]
pub struct MemoryDestination {
    sheet: String,
    present: bool,
    labels: BTreeMap<u32, String>,
    counts: BTreeMap<u32, u64>,
    batches: Vec<(RowRange, Vec<u64>)>,
}

impl MemoryDestination {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            present: true,
            labels: BTreeMap::new(),
            counts: BTreeMap::new(),
            batches: Vec::new(),
        }
    }

    /// A destination whose report sheet does not exist.
    pub fn missing(sheet: impl Into<String>) -> Self {
        Self {
            present: false,
            ..Self::new(sheet)
        }
    }

    pub fn with_label(mut self, row: u32, label: impl Into<String>) -> Self {
        self.labels.insert(row, label.into());
        self
    }

    pub fn with_count(mut self, row: u32, count: u64) -> Self {
        self.counts.insert(row, count);
        self
    }

    pub fn count(&self, row: u32) -> Option<u64> {
        self.counts.get(&row).copied()
    }

    pub fn batches(&self) -> &[(RowRange, Vec<u64>)] {
        &self.batches
    }
}

impl DestinationStore for MemoryDestination {
    fn sheet_name(&self) -> &str {
        &self.sheet
    }

    fn has_sheet(&self) -> bool {
        self.present
    }

    fn read_labels(&self, range: RowRange) -> Result<Vec<(u32, String)>> {
        Ok(range
            .rows()
            .map(|row| (row, self.labels.get(&row).cloned().unwrap_or_default()))
            .collect())
    }

    fn write_counts(&mut self, range: RowRange, counts: &[u64]) -> Result<()> {
        if !self.present {
            return Err(RollupError::DestinationMissing {
                sheet: self.sheet.clone(),
            });
        }
        if counts.len() != range.len() {
            return Err(RollupError::InvalidWorkbook(format!(
                "{} counts supplied for row range {range}",
                counts.len()
            )));
        }
        for (row, &count) in range.rows().zip(counts) {
            self.counts.insert(row, count);
        }
        self.batches.push((range, counts.to_vec()));
        Ok(())
    }
}
