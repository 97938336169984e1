use std::collections::{BTreeMap, HashMap};

use crate::campus::rollup::model::Level;

/// Canonical campus name paired with the source spreadsheet that reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampusEntry {
    pub name: String,
    pub source: String,
}

/// An identifier that more than one campus claims within a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConflict {
    pub level: Level,
    pub source: String,
    /// Names in insertion order. The last one wins at lookup time.
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct LevelIdentities {
    entries: Vec<CampusEntry>,
    by_source: HashMap<String, usize>,
}

/// Per-level mapping between canonical campus names and source identifiers.
///
/// Built once from configuration and read-only afterwards. When an identifier
/// is listed under several names, the entry inserted last is the one
/// [`IdentityMap::resolve`] returns; [`IdentityMap::conflicts`] reports those
/// identifiers so they can be fixed in configuration.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    levels: BTreeMap<Level, LevelIdentities>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `(level, name, source)` triples in order.
    pub fn from_entries<I, N, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Level, N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (level, name, source) in entries {
            map.insert(level, name, source);
        }
        map
    }

    pub fn insert(&mut self, level: Level, name: impl Into<String>, source: impl Into<String>) {
        let identities = self.levels.entry(level).or_default();
        let entry = CampusEntry {
            name: name.into(),
            source: source.into(),
        };
        identities
            .by_source
            .insert(entry.source.clone(), identities.entries.len());
        identities.entries.push(entry);
    }

    /// Returns the canonical campus name for a source identifier, if mapped.
    pub fn resolve(&self, level: Level, source: &str) -> Option<&str> {
        let identities = self.levels.get(&level)?;
        identities
            .by_source
            .get(source)
            .map(|&index| identities.entries[index].name.as_str())
    }

    /// Configured campuses of a level in configuration order.
    pub fn campuses(&self, level: Level) -> &[CampusEntry] {
        self.levels
            .get(&level)
            .map(|identities| identities.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.levels.values().map(|level| level.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers mapped to more than one distinct name within a level.
    pub fn conflicts(&self) -> Vec<IdentityConflict> {
        let mut conflicts = Vec::new();
        for (&level, identities) in &self.levels {
            let mut names_by_source: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for entry in &identities.entries {
                let names = names_by_source.entry(entry.source.as_str()).or_default();
                if !names.contains(&entry.name) {
                    names.push(entry.name.clone());
                }
            }
            conflicts.extend(
                names_by_source
                    .into_iter()
                    .filter(|(_, names)| names.len() > 1)
                    .map(|(source, names)| IdentityConflict {
                        level,
                        source: source.to_string(),
                        names,
                    }),
            );
        }
        conflicts
    }
}
