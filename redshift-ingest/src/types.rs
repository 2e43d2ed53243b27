use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Locations of the two datasets the app reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPaths {
    /// Confirmed planets; the comparison catalog.
    pub confirmed: PathBuf,
    /// Unverified candidates saved from the search page.
    pub candidates: PathBuf,
    /// Model-ranked export of the most likely planets, best first.
    pub top10: PathBuf,
}

impl DatasetPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            confirmed: dir.join("Confirmed.csv"),
            candidates: dir.join("Candidates.csv"),
            top10: dir.join("top10_likely_planets.csv"),
        }
    }
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self::in_dir("data")
    }
}
