use std::collections::BTreeMap;
use std::fmt;

/// Value held by a single spreadsheet cell. Empty cells are not stored.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Formula text without the leading `=`, and its last computed result.
    Formula { formula: String, result: String },
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(value) => f.write_str(value),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Formula { result, .. } => f.write_str(result),
        }
    }
}

/// Cell values of one worksheet keyed by 0-based `(row, column)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub cells: BTreeMap<(u32, u16), CellValue>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn get(&self, row: u32, column: u16) -> Option<&CellValue> {
        self.cells.get(&(row, column))
    }

    pub fn set(&mut self, row: u32, column: u16, value: CellValue) {
        self.cells.insert((row, column), value);
    }

    /// Cell rendered as text; empty cells yield an empty string.
    pub fn text(&self, row: u32, column: u16) -> String {
        self.get(row, column)
            .map(CellValue::to_string)
            .unwrap_or_default()
    }
}

/// Cell values of every worksheet of a workbook, in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookGrid {
    pub sheets: Vec<SheetGrid>,
}

impl WorkbookGrid {
    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetGrid> {
        self.sheets.iter_mut().find(|sheet| sheet.name == name)
    }
}
