use std::fmt;

use serde::{Deserialize, Serialize};

/// Schooling tier. Selects the row ranges, identity map, and source used
/// during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Elementary school.
    Es,
    /// Middle school.
    Ms,
    /// High school.
    Hs,
}

impl Level {
    /// All levels in report order.
    pub const ALL: [Level; 3] = [Level::Es, Level::Ms, Level::Hs];

    /// Short upper-case code, also used as the counts workbook sheet name.
    pub fn code(self) -> &'static str {
        match self {
            Level::Es => "ES",
            Level::Ms => "MS",
            Level::Hs => "HS",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Inclusive block of 1-based destination rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub start: u32,
    pub end: u32,
}

impl RowRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn overlaps(&self, other: &RowRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Observation supplied by a source reader, before identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// Opaque external id of the source spreadsheet.
    pub campus_identifier: String,
    /// Campus label as it appeared in the source, kept for diagnostics.
    pub raw_name: String,
    pub count: u64,
}

impl SourceRecord {
    pub fn new(
        campus_identifier: impl Into<String>,
        raw_name: impl Into<String>,
        count: u64,
    ) -> Self {
        Self {
            campus_identifier: campus_identifier.into(),
            raw_name: raw_name.into(),
            count,
        }
    }
}

/// A source record whose identifier resolved to a canonical campus name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRecord {
    pub campus_identifier: String,
    pub source_name: String,
    pub count: u64,
}

/// A labelled report row and the total accumulated for it during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRow {
    pub row_number: u32,
    pub campus_label: String,
    pub accumulated_count: u64,
    pub matched_any_source: bool,
}

impl DestinationRow {
    pub fn new(row_number: u32, campus_label: impl Into<String>) -> Self {
        Self {
            row_number,
            campus_label: campus_label.into(),
            accumulated_count: 0,
            matched_any_source: false,
        }
    }

    /// Adds a record's count to the running total.
    pub fn accumulate(&mut self, count: u64) {
        self.accumulated_count = self.accumulated_count.saturating_add(count);
        self.matched_any_source = true;
    }
}

/// Outcome of a rollup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSummary {
    /// Report rows in the processed ranges whose final total is positive.
    pub updated_count: usize,
    /// Campuses of the requested level that received no count.
    pub missing_campuses: Vec<String>,
    /// Source records skipped because they could not be placed on a row.
    pub unresolved_records: usize,
    /// Levels whose source yielded nothing.
    pub skipped_levels: Vec<Level>,
}

impl AggregationSummary {
    /// Renders the user-visible summary message.
    pub fn message(&self) -> String {
        let mut message = format!("Updated enrollment for {} campuses.", self.updated_count);
        if !self.missing_campuses.is_empty() {
            message.push_str("\nMissing data for: ");
            message.push_str(&self.missing_campuses.join(", "));
        }
        message
    }
}
