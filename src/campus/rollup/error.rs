use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::campus::rollup::model::Level;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, RollupError>;

/// Error type covering the failures that abort a rollup run or prevent it
/// from starting.
///
/// Per-record and per-level problems never surface here; they are reported as
/// [`RunWarning`]s and processing continues.
#[derive(Debug, Error)]
pub enum RollupError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the JSON summary could not be serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the configuration file is not valid TOML for the schema.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Raised when the configuration parses but describes an unusable layout.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the report sheet is absent. Nothing is written.
    #[error("destination sheet '{sheet}' not found")]
    DestinationMissing { sheet: String },

    /// Raised when a counts workbook could not be loaded.
    #[error("counts workbook unavailable: {0}")]
    SourceUnavailable(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Non-fatal conditions recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// A level's source was absent, empty, or failed to load.
    SourceUnavailable { level: Level, reason: String },
    /// A source record's identifier is not in the level's identity map.
    UnresolvedIdentifier {
        level: Level,
        identifier: String,
        raw_name: String,
    },
    /// The identifier resolved, but the campus has no destination row.
    UnmatchedCampus {
        level: Level,
        campus: String,
        identifier: String,
    },
    /// No destination row ended the run with a positive total.
    NoMatches,
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable { level, reason } => {
                write!(f, "{level} source unavailable: {reason}")
            }
            Self::UnresolvedIdentifier {
                level,
                identifier,
                raw_name,
            } => write!(
                f,
                "{level}: no campus mapped to source '{identifier}' ('{raw_name}')"
            ),
            Self::UnmatchedCampus {
                level,
                campus,
                identifier,
            } => write!(
                f,
                "{level}: campus '{campus}' (source '{identifier}') has no report row"
            ),
            Self::NoMatches => write!(f, "no report rows received a positive count"),
        }
    }
}
