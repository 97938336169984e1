//! Contracts the aggregator needs from its surroundings.

use crate::campus::rollup::error::Result;
use crate::campus::rollup::model::{Level, RowRange, SourceRecord};

/// Supplies already-extracted counts for a level.
///
/// Implementations turn missing or non-numeric counts into 0 before returning
/// and yield an empty list when the level's source is absent. An `Err` is
/// treated by the aggregator like an absent source.
pub trait SourceReader {
    fn read(&self, level: Level) -> Result<Vec<SourceRecord>>;
}

/// The report sheet that receives totals.
pub trait DestinationStore {
    /// Name of the report sheet, used in error messages.
    fn sheet_name(&self) -> &str;

    /// Whether the report sheet is present.
    fn has_sheet(&self) -> bool;

    /// Reads `(row_number, label)` for every row of the range, blank labels
    /// included, in row order.
    fn read_labels(&self, range: RowRange) -> Result<Vec<(u32, String)>>;

    /// Writes one count per row of the range in a single batch.
    fn write_counts(&mut self, range: RowRange, counts: &[u64]) -> Result<()>;
}

/// Fire-and-forget user feedback.
pub trait Notifier {
    fn summary(&self, message: &str);
    fn warn(&self, message: &str);
}
