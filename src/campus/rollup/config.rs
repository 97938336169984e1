use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::campus::rollup::error::{Result, RollupError};
use crate::campus::rollup::identity::IdentityMap;
use crate::campus::rollup::layout::RowLayout;
use crate::campus::rollup::model::Level;

/// Sheet name used when the configuration does not name one.
pub const DEFAULT_DESTINATION_SHEET: &str = "Enrollment";

/// Rollup configuration as read from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollupConfig {
    #[serde(default)]
    pub destination: DestinationSettings,
    /// Overrides the built-in row layout when present.
    #[serde(default)]
    pub layout: Option<RowLayout>,
    #[serde(default)]
    pub campuses: CampusTables,
}

/// Where totals land in the report workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSettings {
    #[serde(default = "default_sheet")]
    pub sheet: String,
    /// 1-based column holding campus labels.
    #[serde(default = "default_label_column")]
    pub label_column: u16,
    /// 1-based column receiving totals.
    #[serde(default = "default_count_column")]
    pub count_column: u16,
}

impl Default for DestinationSettings {
    fn default() -> Self {
        Self {
            sheet: default_sheet(),
            label_column: default_label_column(),
            count_column: default_count_column(),
        }
    }
}

fn default_sheet() -> String {
    DEFAULT_DESTINATION_SHEET.to_string()
}

fn default_label_column() -> u16 {
    1
}

fn default_count_column() -> u16 {
    2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampusTables {
    #[serde(default)]
    pub es: Vec<CampusConfig>,
    #[serde(default)]
    pub ms: Vec<CampusConfig>,
    #[serde(default)]
    pub hs: Vec<CampusConfig>,
}

impl CampusTables {
    fn level(&self, level: Level) -> &[CampusConfig] {
        match level {
            Level::Es => &self.es,
            Level::Ms => &self.ms,
            Level::Hs => &self.hs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusConfig {
    /// Canonical campus name as it appears on the report.
    pub name: String,
    /// Identifier of the spreadsheet that reports the campus.
    pub source: String,
}

impl RollupConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: RollupConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RollupError::MissingInput(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml(&source)?;
        debug!(
            path = %path.display(),
            campuses = config.identity_map().len(),
            "loaded rollup configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.destination.sheet.trim().is_empty() {
            return Err(RollupError::InvalidConfig(
                "destination sheet name is empty".to_string(),
            ));
        }
        if self.destination.label_column == 0 || self.destination.count_column == 0 {
            return Err(RollupError::InvalidConfig(
                "destination columns are 1-based".to_string(),
            ));
        }
        if self.destination.label_column == self.destination.count_column {
            return Err(RollupError::InvalidConfig(
                "label and count columns must differ".to_string(),
            ));
        }
        for level in Level::ALL {
            if let Some(campus) = self
                .campuses
                .level(level)
                .iter()
                .find(|campus| campus.name.trim().is_empty() || campus.source.trim().is_empty())
            {
                return Err(RollupError::InvalidConfig(format!(
                    "{level} campus entry {campus:?} needs both a name and a source"
                )));
            }
        }
        self.row_layout().validate()?;

        for conflict in self.identity_map().conflicts() {
            warn!(
                level = %conflict.level,
                source = %conflict.source,
                names = ?conflict.names,
                "source identifier mapped to several campuses; the last entry wins"
            );
        }
        Ok(())
    }

    /// Builds the immutable identity lookup for all levels.
    pub fn identity_map(&self) -> IdentityMap {
        IdentityMap::from_entries(Level::ALL.into_iter().flat_map(|level| {
            self.campuses
                .level(level)
                .iter()
                .map(move |campus| (level, campus.name.trim(), campus.source.trim()))
        }))
    }

    pub fn row_layout(&self) -> RowLayout {
        self.layout.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campus::rollup::model::RowRange;

    const SAMPLE: &str = r#"
[destination]
sheet = "Totals"
count_column = 3

[layout]
es = [{ start = 4, end = 5 }]
ms = [{ start = 8, end = 9 }]

[[campuses.es]]
name = "Bernal #1"
source = "es-bernal"

[[campuses.es]]
name = "Holmgreen"
source = "es-holmgreen"

[[campuses.ms]]
name = "Holmgreen"
source = "ms-holmgreen"
"#;

    #[test]
    fn parses_destination_layout_and_campuses() {
        let config = RollupConfig::from_toml(SAMPLE).expect("config parsed");
        assert_eq!(config.destination.sheet, "Totals");
        assert_eq!(config.destination.label_column, 1);
        assert_eq!(config.destination.count_column, 3);

        let layout = config.row_layout();
        assert_eq!(layout.es, [RowRange::new(4, 5)]);
        assert!(layout.hs.is_empty());

        let identities = config.identity_map();
        assert_eq!(identities.resolve(Level::Es, "es-holmgreen"), Some("Holmgreen"));
        assert_eq!(identities.resolve(Level::Ms, "ms-holmgreen"), Some("Holmgreen"));
        assert_eq!(identities.len(), 3);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = RollupConfig::from_toml("").expect("config parsed");
        assert_eq!(config.destination, DestinationSettings::default());
        assert_eq!(config.row_layout(), RowLayout::default());
        assert!(config.identity_map().is_empty());
    }

    #[test]
    fn rejects_same_label_and_count_column() {
        let error = RollupConfig::from_toml("[destination]\ncount_column = 1\n")
            .expect_err("columns must differ");
        assert!(matches!(error, RollupError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_campus_without_source() {
        let error = RollupConfig::from_toml("[[campuses.hs]]\nname = \"Lanier\"\nsource = \" \"\n")
            .expect_err("blank source rejected");
        assert!(matches!(error, RollupError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let error = RollupConfig::from_toml("[destination\n").expect_err("syntax error");
        assert!(matches!(error, RollupError::ConfigParse(_)));
    }
}
