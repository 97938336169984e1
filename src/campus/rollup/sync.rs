use std::path::Path;

use tracing::{info, instrument};

use crate::campus::rollup::aggregate::Aggregator;
use crate::campus::rollup::config::RollupConfig;
use crate::campus::rollup::error::Result;
use crate::campus::rollup::io::destination::WorkbookDestination;
use crate::campus::rollup::io::excel_read::WorkbookSource;
use crate::campus::rollup::model::{AggregationSummary, Level};
use crate::campus::rollup::ports::Notifier;

/// Rolls the counts workbook up into the report workbook and saves the result
/// to `output`.
///
/// The report is written only when aggregation succeeds, so a missing report
/// sheet leaves `output` untouched.
#[instrument(
    level = "info",
    skip_all,
    fields(
        sources = %sources.display(),
        report = %report.display(),
        output = %output.display(),
        ?level
    )
)]
pub fn rollup_workbook(
    config: &RollupConfig,
    sources: &Path,
    report: &Path,
    output: &Path,
    level: Option<Level>,
    notifier: &dyn Notifier,
) -> Result<AggregationSummary> {
    let identities = config.identity_map();
    let layout = config.row_layout();
    let source = WorkbookSource::new(sources);
    let mut destination = WorkbookDestination::open(report, config.destination.clone())?;

    let summary = Aggregator::new(&identities, &layout).aggregate(
        level,
        &source,
        &mut destination,
        notifier,
    )?;

    destination.save(output)?;
    info!(updated = summary.updated_count, "report workbook saved");
    Ok(summary)
}

/// Loads the configuration file and rolls up in one step.
pub fn rollup_with_config_file(
    config_path: &Path,
    sources: &Path,
    report: &Path,
    output: &Path,
    level: Option<Level>,
    notifier: &dyn Notifier,
) -> Result<AggregationSummary> {
    let config = RollupConfig::load(config_path)?;
    rollup_workbook(&config, sources, report, output, level, notifier)
}
