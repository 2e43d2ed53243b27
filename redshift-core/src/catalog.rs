//! The confirmed-planet catalog: an owned, append-only collection of records.

use crate::normalize::normalize;
use crate::record::{PlanetRecord, RawRow};

/// Confirmed planets used as the comparison set.
///
/// Records are only ever appended. Callers that share a catalog across
/// requests own the synchronization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfirmedCatalog {
    records: Vec<PlanetRecord>,
}

impl ConfirmedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<PlanetRecord>) -> Self {
        Self { records }
    }

    /// Normalize every row into a record, keeping row order.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        Self {
            records: rows.iter().map(normalize).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanetRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PlanetRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&PlanetRecord> {
        self.records.get(index)
    }

    /// First record whose name equals `name` (trimmed, case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&PlanetRecord> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.name_key().as_deref() == Some(key.as_str()))
    }

    /// Records whose name contains `term`, case-insensitively. A blank term matches all.
    pub fn search_by_name(&self, term: &str) -> Vec<&PlanetRecord> {
        let term = term.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                term.is_empty()
                    || r.name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Add a newly confirmed planet at the end of the catalog.
    pub fn append(&mut self, record: PlanetRecord) {
        tracing::debug!(name = record.display_name(), "appending confirmed planet");
        self.records.push(record);
    }
}

impl<'a> IntoIterator for &'a ConfirmedCatalog {
    type Item = &'a PlanetRecord;
    type IntoIter = std::slice::Iter<'a, PlanetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<PlanetRecord> for ConfirmedCatalog {
    fn from_iter<I: IntoIterator<Item = PlanetRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
