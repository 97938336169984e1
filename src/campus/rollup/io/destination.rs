use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::campus::rollup::config::DestinationSettings;
use crate::campus::rollup::error::{Result, RollupError};
use crate::campus::rollup::io::excel_read::read_grid;
use crate::campus::rollup::io::excel_write::write_grid;
use crate::campus::rollup::io::grid::{CellValue, WorkbookGrid};
use crate::campus::rollup::model::RowRange;
use crate::campus::rollup::ports::DestinationStore;

/// Report workbook held in memory.
///
/// Batched writes only touch the in-memory grid; nothing reaches disk until
/// [`WorkbookDestination::save`] is called.
#[derive(Debug, Clone)]
pub struct WorkbookDestination {
    path: PathBuf,
    grid: WorkbookGrid,
    settings: DestinationSettings,
}

impl WorkbookDestination {
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path, settings: DestinationSettings) -> Result<Self> {
        if !path.exists() {
            return Err(RollupError::MissingInput(path.to_path_buf()));
        }
        let grid = read_grid(path)?;
        debug!(sheets = grid.sheets.len(), "read report workbook");
        Ok(Self {
            path: path.to_path_buf(),
            grid,
            settings,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grid(&self) -> &WorkbookGrid {
        &self.grid
    }

    /// Writes the workbook, including untouched sheets, to `output`.
    pub fn save(&self, output: &Path) -> Result<()> {
        write_grid(output, &self.grid)
    }

    fn label_column(&self) -> u16 {
        self.settings.label_column - 1
    }

    fn count_column(&self) -> u16 {
        self.settings.count_column - 1
    }
}

impl DestinationStore for WorkbookDestination {
    fn sheet_name(&self) -> &str {
        &self.settings.sheet
    }

    fn has_sheet(&self) -> bool {
        self.grid.sheet(&self.settings.sheet).is_some()
    }

    fn read_labels(&self, range: RowRange) -> Result<Vec<(u32, String)>> {
        let sheet = self
            .grid
            .sheet(&self.settings.sheet)
            .ok_or_else(|| RollupError::DestinationMissing {
                sheet: self.settings.sheet.clone(),
            })?;
        let column = self.label_column();
        range
            .rows()
            .map(|row_number| Ok((row_number, sheet.text(row_index(row_number)?, column))))
            .collect()
    }

    fn write_counts(&mut self, range: RowRange, counts: &[u64]) -> Result<()> {
        if counts.len() != range.len() {
            return Err(RollupError::InvalidWorkbook(format!(
                "{} counts supplied for row range {range}",
                counts.len()
            )));
        }
        let column = self.count_column();
        let sheet_name = self.settings.sheet.clone();
        let sheet = self
            .grid
            .sheet_mut(&sheet_name)
            .ok_or_else(|| RollupError::DestinationMissing {
                sheet: sheet_name.clone(),
            })?;
        for (row_number, &count) in range.rows().zip(counts) {
            sheet.set(row_index(row_number)?, column, CellValue::Number(count as f64));
        }
        Ok(())
    }
}

/// 0-based grid row of a 1-based sheet row.
fn row_index(row_number: u32) -> Result<u32> {
    row_number
        .checked_sub(1)
        .ok_or_else(|| RollupError::InvalidConfig("row numbers are 1-based".to_string()))
}
