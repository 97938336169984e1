use std::path::Path;

use rust_xlsxwriter::{Formula, Workbook};

use crate::campus::rollup::error::Result;
use crate::campus::rollup::io::grid::{CellValue, WorkbookGrid};

/// Writes the cell values of every sheet in the grid to the given path.
///
/// Values and formulas are written; formatting of a workbook read with
/// [`read_grid`](crate::io::excel_read::read_grid) is not carried over.
pub fn write_grid(path: &Path, grid: &WorkbookGrid) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for sheet in &grid.sheets {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (&(row, column), value) in &sheet.cells {
            match value {
                CellValue::Text(text) => {
                    worksheet.write_string(row, column, text)?;
                }
                CellValue::Number(number) => {
                    worksheet.write_number(row, column, *number)?;
                }
                CellValue::Bool(flag) => {
                    worksheet.write_boolean(row, column, *flag)?;
                }
                CellValue::Formula { formula, result } => {
                    let formula = Formula::new(formula.as_str()).set_result(result.as_str());
                    worksheet.write_formula(row, column, formula)?;
                }
            }
        }
    }

    workbook_writer.save(path)?;
    Ok(())
}
