use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::campus::rollup::error::{Result, RollupError};
use crate::campus::rollup::model::{Level, RowRange};

/// Built-in report layout: each level owns a primary block followed by a
/// small special-programs block. Row numbers are 1-based.
pub const DEFAULT_LAYOUT: &[(Level, RowRange)] = &[
    (Level::Es, RowRange::new(4, 47)),
    (Level::Es, RowRange::new(49, 51)),
    (Level::Ms, RowRange::new(54, 67)),
    (Level::Ms, RowRange::new(69, 70)),
    (Level::Hs, RowRange::new(73, 84)),
    (Level::Hs, RowRange::new(86, 87)),
];

/// Which destination rows belong to which level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLayout {
    #[serde(default)]
    pub es: Vec<RowRange>,
    #[serde(default)]
    pub ms: Vec<RowRange>,
    #[serde(default)]
    pub hs: Vec<RowRange>,
}

impl Default for RowLayout {
    fn default() -> Self {
        let mut layout = RowLayout {
            es: Vec::new(),
            ms: Vec::new(),
            hs: Vec::new(),
        };
        for &(level, range) in DEFAULT_LAYOUT {
            layout.level_mut(level).push(range);
        }
        layout
    }
}

impl RowLayout {
    pub fn level(&self, level: Level) -> &[RowRange] {
        match level {
            Level::Es => &self.es,
            Level::Ms => &self.ms,
            Level::Hs => &self.hs,
        }
    }

    fn level_mut(&mut self, level: Level) -> &mut Vec<RowRange> {
        match level {
            Level::Es => &mut self.es,
            Level::Ms => &mut self.ms,
            Level::Hs => &mut self.hs,
        }
    }

    /// Single range spanning every configured block of every level.
    pub fn full_range(&self) -> Option<RowRange> {
        let ranges = Level::ALL.iter().flat_map(|&level| self.level(level));
        let (start, end) = ranges.fold((u32::MAX, 0), |(start, end), range| {
            (start.min(range.start), end.max(range.end))
        });
        (start <= end).then(|| RowRange::new(start, end))
    }

    /// Ranges processed for a run: the level's own blocks, or the full span
    /// when no level is requested.
    pub fn ranges_for(&self, level: Option<Level>) -> Vec<RowRange> {
        match level {
            Some(level) => self.level(level).to_vec(),
            None => self.full_range().into_iter().collect(),
        }
    }

    /// Rejects inverted, zero-based, or overlapping blocks.
    pub fn validate(&self) -> Result<()> {
        let mut owners: BTreeMap<u32, (Level, RowRange)> = BTreeMap::new();
        for level in Level::ALL {
            for &range in self.level(level) {
                if range.start == 0 || range.end < range.start {
                    return Err(RollupError::InvalidConfig(format!(
                        "{level} row range {range} is not a valid 1-based block"
                    )));
                }
                if let Some((other_level, other)) = owners
                    .values()
                    .find(|(_, other)| other.overlaps(&range))
                {
                    return Err(RollupError::InvalidConfig(format!(
                        "{level} row range {range} overlaps {other_level} row range {other}"
                    )));
                }
                owners.insert(range.start, (level, range));
            }
        }
        if owners.is_empty() {
            return Err(RollupError::InvalidConfig(
                "row layout has no ranges".to_string(),
            ));
        }
        Ok(())
    }
}
