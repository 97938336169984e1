use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::{debug, instrument, warn};

use crate::campus::rollup::error::{Result, RollupError};
use crate::campus::rollup::io::grid::{CellValue, SheetGrid, WorkbookGrid};
use crate::campus::rollup::model::{Level, SourceRecord};
use crate::campus::rollup::ports::SourceReader;

/// Header of the counts workbook column holding source identifiers.
pub const IDENTIFIER_HEADER: &str = "identifier";
/// Header of the counts workbook column holding campus labels.
pub const CAMPUS_HEADER: &str = "campus";
/// Header of the counts workbook column holding counts.
pub const COUNT_HEADER: &str = "count";

/// Reads every worksheet of a workbook into memory.
///
/// Formula cells keep their formula text, with the cached value as result.
pub fn read_grid(path: &Path) -> Result<WorkbookGrid> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names = workbook.sheet_names().to_owned();

    let mut grid = WorkbookGrid::default();
    for name in names {
        let range = read_required_sheet(&mut workbook, &name)?;
        let mut sheet = SheetGrid::new(name);
        let (row_offset, column_offset) = range.start().unwrap_or((0, 0));

        for (row, column, cell) in range.cells() {
            if let Some(value) = cell_to_value(cell) {
                sheet.set(
                    row_offset + row as u32,
                    (column_offset as usize + column) as u16,
                    value,
                );
            }
        }
        ingest_formulas(&mut workbook, &mut sheet)?;
        grid.sheets.push(sheet);
    }

    Ok(grid)
}

fn ingest_formulas<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    sheet: &mut SheetGrid,
) -> Result<()> {
    let Some(formulas) = workbook.worksheet_formula(&sheet.name) else {
        return Ok(());
    };
    let formulas = formulas.map_err(RollupError::from)?;
    let (row_offset, column_offset) = formulas.start().unwrap_or((0, 0));

    for (row, column, formula) in formulas.cells() {
        let formula = formula.trim().trim_start_matches('=');
        if formula.is_empty() {
            continue;
        }
        let position = (
            row_offset + row as u32,
            (column_offset as usize + column) as u16,
        );
        let result = sheet
            .cells
            .remove(&position)
            .map(|cached| cached.to_string())
            .unwrap_or_default();
        sheet.set(
            position.0,
            position.1,
            CellValue::Formula {
                formula: formula.to_string(),
                result,
            },
        );
    }
    Ok(())
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| RollupError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(RollupError::from)?;
    Ok(range)
}

/// Level sheets of a counts workbook, read once.
type LevelSheets = HashMap<Level, calamine::Range<DataType>>;

/// Source reader backed by a counts workbook holding one sheet per level
/// (`ES`, `MS`, `HS`) with `identifier`, `campus`, and `count` columns.
///
/// The workbook is opened on the first `read` and its level sheets are kept
/// for later levels. A failed load is kept too, so every level reports it.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
    sheets: OnceCell<std::result::Result<LevelSheets, String>>,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheets: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheets(&self) -> Result<&LevelSheets> {
        self.sheets
            .get_or_init(|| load_level_sheets(&self.path).map_err(|error| error.to_string()))
            .as_ref()
            .map_err(|message| RollupError::SourceUnavailable(message.clone()))
    }
}

#[instrument(level = "debug", fields(path = %path.display()))]
fn load_level_sheets(path: &Path) -> Result<LevelSheets> {
    if !path.exists() {
        return Err(RollupError::MissingInput(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names = workbook.sheet_names().to_owned();
    let mut sheets = LevelSheets::new();
    for level in Level::ALL {
        let Some(name) = names
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(level.code()))
        else {
            continue;
        };
        sheets.insert(level, read_required_sheet(&mut workbook, name)?);
    }
    debug!(levels = sheets.len(), "read counts workbook");
    Ok(sheets)
}

impl SourceReader for WorkbookSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn read(&self, level: Level) -> Result<Vec<SourceRecord>> {
        let Some(range) = self.sheets()?.get(&level) else {
            warn!(%level, "counts workbook has no sheet for level");
            return Ok(Vec::new());
        };

        let records = ingest_count_sheet(range, level);
        debug!(%level, records = records.len(), "read counts sheet");
        Ok(records)
    }
}

fn ingest_count_sheet(range: &calamine::Range<DataType>, level: Level) -> Vec<SourceRecord> {
    let headers: Vec<String> = match range.rows().next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)).trim().to_ascii_lowercase())
            .collect(),
        None => return Vec::new(),
    };
    let column = |header: &str, fallback: usize| {
        headers
            .iter()
            .position(|candidate| candidate == header)
            .unwrap_or(fallback)
    };
    let identifier_column = column(IDENTIFIER_HEADER, 0);
    let campus_column = column(CAMPUS_HEADER, 1);
    let count_column = column(COUNT_HEADER, 2);

    let mut records = Vec::new();
    for row in range.rows().skip(1) {
        let identifier = cell_to_string(row.get(identifier_column));
        let identifier = identifier.trim();
        if identifier.is_empty() {
            continue;
        }
        let raw_name = cell_to_string(row.get(campus_column));
        let count = match parse_count(row.get(count_column)) {
            Ok(count) => count,
            Err(value) => {
                warn!(%level, identifier, campus = %raw_name, %value, "invalid count, using 0");
                0
            }
        };
        records.push(SourceRecord::new(identifier, raw_name.trim(), count));
    }
    records
}

/// Converts a count cell into a non-negative integer.
///
/// Empty cells count as 0. Fractional counts are truncated. Anything else that
/// is not a non-negative finite number is returned as the offending text.
pub fn parse_count(cell: Option<&DataType>) -> std::result::Result<u64, String> {
    match cell {
        None | Some(DataType::Empty) => Ok(0),
        Some(DataType::Int(value)) => u64::try_from(*value).map_err(|_| value.to_string()),
        Some(DataType::Float(value)) => count_from_f64(*value).ok_or_else(|| value.to_string()),
        Some(DataType::String(value)) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .and_then(count_from_f64)
                .ok_or_else(|| trimmed.to_string())
        }
        Some(other) => Err(other.to_string()),
    }
}

fn count_from_f64(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}

fn cell_to_value(cell: &DataType) -> Option<CellValue> {
    match cell {
        DataType::Empty => None,
        DataType::String(value) => Some(CellValue::Text(value.clone())),
        DataType::Float(value) => Some(CellValue::Number(*value)),
        DataType::Int(value) => Some(CellValue::Number(*value as f64)),
        DataType::Bool(value) => Some(CellValue::Bool(*value)),
        other => Some(CellValue::Text(other.to_string())),
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_textual_counts() {
        assert_eq!(parse_count(Some(&DataType::Int(17))), Ok(17));
        assert_eq!(parse_count(Some(&DataType::Float(9.0))), Ok(9));
        assert_eq!(parse_count(Some(&DataType::Float(4.8))), Ok(4));
        assert_eq!(parse_count(Some(&DataType::String(" 1,204 ".into()))), Ok(1204));
    }

    #[test]
    fn missing_counts_are_zero() {
        assert_eq!(parse_count(None), Ok(0));
        assert_eq!(parse_count(Some(&DataType::Empty)), Ok(0));
        assert_eq!(parse_count(Some(&DataType::String("  ".into()))), Ok(0));
    }

    #[test]
    fn invalid_counts_are_reported() {
        assert_eq!(parse_count(Some(&DataType::Int(-3))), Err("-3".to_string()));
        assert_eq!(parse_count(Some(&DataType::Float(f64::NAN))), Err("NaN".to_string()));
        assert_eq!(
            parse_count(Some(&DataType::String("n/a".into()))),
            Err("n/a".to_string())
        );
        assert!(parse_count(Some(&DataType::Bool(true))).is_err());
    }
}
