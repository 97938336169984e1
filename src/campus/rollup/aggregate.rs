//! Accumulates per-campus counts into the report rows.
//!
//! A run reads the labels of every processed row range once, resolves each
//! source record to a canonical campus through the [`IdentityMap`], sums the
//! counts per report row in memory, and writes one batch per range. Only a
//! missing report sheet or an unusable row range aborts a run, before
//! anything is written; every other problem becomes a [`RunWarning`] and
//! processing continues.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::campus::rollup::error::{Result, RollupError, RunWarning};
use crate::campus::rollup::identity::IdentityMap;
use crate::campus::rollup::layout::RowLayout;
use crate::campus::rollup::model::{
    AggregationSummary, CountRecord, DestinationRow, Level, RowRange, SourceRecord,
};
use crate::campus::rollup::normalize::normalize;
use crate::campus::rollup::ports::{DestinationStore, Notifier, SourceReader};

/// Runs rollups against a fixed identity map and row layout.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    identities: &'a IdentityMap,
    layout: &'a RowLayout,
}

impl<'a> Aggregator<'a> {
    pub fn new(identities: &'a IdentityMap, layout: &'a RowLayout) -> Self {
        Self { identities, layout }
    }

    /// Aggregates one level, or every level when `level` is `None`, and
    /// rewrites the count column of the processed ranges.
    #[instrument(
        level = "info",
        skip_all,
        fields(level = ?level, sheet = destination.sheet_name())
    )]
    pub fn aggregate<S, D, N>(
        &self,
        level: Option<Level>,
        source: &S,
        destination: &mut D,
        notifier: &N,
    ) -> Result<AggregationSummary>
    where
        S: SourceReader + ?Sized,
        D: DestinationStore + ?Sized,
        N: Notifier + ?Sized,
    {
        if !destination.has_sheet() {
            return Err(RollupError::DestinationMissing {
                sheet: destination.sheet_name().to_string(),
            });
        }

        let ranges = self.layout.ranges_for(level);
        if let Some(range) = ranges
            .iter()
            .find(|range| range.start == 0 || range.end < range.start)
        {
            return Err(RollupError::InvalidConfig(format!(
                "row range {range} is not a valid 1-based block"
            )));
        }
        let mut index = RowIndex::build(&*destination, &ranges)?;
        debug!(
            ranges = ranges.len(),
            labelled_rows = index.rows.len(),
            "indexed report rows"
        );

        let mut summary = AggregationSummary::default();
        let levels = match level {
            Some(level) => vec![level],
            None => Level::ALL.to_vec(),
        };

        for current in levels {
            let records = match source.read(current) {
                Ok(records) if records.is_empty() => {
                    summary.skipped_levels.push(current);
                    report(
                        notifier,
                        RunWarning::SourceUnavailable {
                            level: current,
                            reason: "no records".to_string(),
                        },
                    );
                    continue;
                }
                Ok(records) => records,
                Err(error) => {
                    summary.skipped_levels.push(current);
                    report(
                        notifier,
                        RunWarning::SourceUnavailable {
                            level: current,
                            reason: error.to_string(),
                        },
                    );
                    continue;
                }
            };

            debug!(level = %current, records = records.len(), "read source records");
            for record in records {
                if !self.apply(current, record, &mut index, notifier) {
                    summary.unresolved_records += 1;
                }
            }
        }

        if let Some(level) = level {
            summary.missing_campuses = self.missing_campuses(level, &index);
        }

        for &range in &ranges {
            let counts = index.counts_for(range);
            destination.write_counts(range, &counts)?;
        }

        summary.updated_count = index
            .rows
            .iter()
            .filter(|row| row.accumulated_count > 0)
            .count();
        if summary.updated_count == 0 {
            report(notifier, RunWarning::NoMatches);
        }

        info!(
            updated = summary.updated_count,
            missing = summary.missing_campuses.len(),
            unresolved = summary.unresolved_records,
            "rollup complete"
        );
        notifier.summary(&summary.message());
        Ok(summary)
    }

    /// Adds a record to its report row. Returns `false` when the record could
    /// not be placed.
    fn apply<N: Notifier + ?Sized>(
        &self,
        level: Level,
        record: SourceRecord,
        index: &mut RowIndex,
        notifier: &N,
    ) -> bool {
        let Some(name) = self.identities.resolve(level, &record.campus_identifier) else {
            report(
                notifier,
                RunWarning::UnresolvedIdentifier {
                    level,
                    identifier: record.campus_identifier,
                    raw_name: record.raw_name,
                },
            );
            return false;
        };

        let resolved = CountRecord {
            campus_identifier: record.campus_identifier,
            source_name: name.to_string(),
            count: record.count,
        };

        match index.lookup_mut(&resolved.source_name) {
            Some(row) => {
                row.accumulate(resolved.count);
                debug!(
                    campus = %resolved.source_name,
                    row = row.row_number,
                    count = resolved.count,
                    total = row.accumulated_count,
                    "accumulated count"
                );
                true
            }
            None => {
                report(
                    notifier,
                    RunWarning::UnmatchedCampus {
                        level,
                        campus: resolved.source_name,
                        identifier: resolved.campus_identifier,
                    },
                );
                false
            }
        }
    }

    fn missing_campuses(&self, level: Level, index: &RowIndex) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for campus in self.identities.campuses(level) {
            let matched = index
                .lookup(&campus.name)
                .is_some_and(|row| row.matched_any_source);
            if !matched && !missing.contains(&campus.name) {
                missing.push(campus.name.clone());
            }
        }
        missing
    }
}

fn report<N: Notifier + ?Sized>(notifier: &N, warning: RunWarning) {
    notifier.warn(&warning.to_string());
}

/// Labelled report rows of the processed ranges.
#[derive(Debug, Default)]
struct RowIndex {
    rows: Vec<DestinationRow>,
    by_row: HashMap<u32, usize>,
    by_label: HashMap<String, usize>,
    by_key: HashMap<String, usize>,
}

impl RowIndex {
    fn build<D: DestinationStore + ?Sized>(destination: &D, ranges: &[RowRange]) -> Result<Self> {
        let mut index = RowIndex::default();
        for &range in ranges {
            for (row_number, label) in destination.read_labels(range)? {
                let label = label.trim();
                if label.is_empty() || index.by_row.contains_key(&row_number) {
                    continue;
                }
                let position = index.rows.len();
                // A repeated label re-points the lookup at the later row.
                index.by_label.insert(label.to_string(), position);
                index.by_key.insert(normalize(label), position);
                index.by_row.insert(row_number, position);
                index.rows.push(DestinationRow::new(row_number, label));
            }
        }
        Ok(index)
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.by_label
            .get(name)
            .or_else(|| self.by_key.get(&normalize(name)))
            .copied()
    }

    fn lookup(&self, name: &str) -> Option<&DestinationRow> {
        self.position(name).map(|position| &self.rows[position])
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut DestinationRow> {
        self.position(name).map(|position| &mut self.rows[position])
    }

    fn counts_for(&self, range: RowRange) -> Vec<u64> {
        range
            .rows()
            .map(|row_number| {
                self.by_row
                    .get(&row_number)
                    .map(|&position| self.rows[position].accumulated_count)
                    .unwrap_or(0)
            })
            .collect()
    }
}
