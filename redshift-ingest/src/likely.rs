//! The ranked "most likely planets" export produced by the classifier.
//!
//! Rows are in rank order. Besides the usual planet columns each row carries
//! the model's confirmed-planet likelihood in a `P_CP` column.

use anyhow::Result;
use redshift_core::{PlanetRecord, RawRow, canonical_header, normalize, parse_number};
use serde::Serialize;
use std::path::Path;

use crate::reader::read_rows;

/// Accepted spellings of the likelihood column, in canonical key form.
const LIKELIHOOD_ALIASES: &[&str] = &["p_cp", "likelihood"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikelyPlanet {
    /// 1-based position in the export.
    pub rank: usize,
    /// Likelihood as exported (percent), `None` when blank.
    pub likelihood: Option<f64>,
    #[serde(flatten)]
    pub record: PlanetRecord,
}

fn likelihood(row: &RawRow) -> Option<f64> {
    LIKELIHOOD_ALIASES.iter().find_map(|alias| {
        row.cells()
            .find(|(h, _)| canonical_header(h) == *alias)
            .map(|(_, v)| parse_number(v))
    })?
}

/// Rank rows in file order.
pub fn rank_rows(rows: &[RawRow]) -> Vec<LikelyPlanet> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| LikelyPlanet {
            rank: i + 1,
            likelihood: likelihood(row),
            record: normalize(row),
        })
        .collect()
}

/// Load the ranked export. A missing file is an empty list.
pub fn load_likely_planets(path: impl AsRef<Path>) -> Result<Vec<LikelyPlanet>> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "likely-planets export not found");
        return Ok(Vec::new());
    }
    let planets = rank_rows(&read_rows(path)?);
    tracing::info!(path = %path.display(), planets = planets.len(), "loaded likely planets");
    Ok(planets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_rows_reads_likelihood() {
        let rows = vec![
            RawRow::new().with("Planet Name", "KOI-1").with(" p_cp ", "91.5"),
            RawRow::new().with("Planet Name", "KOI-2").with("P_CP", ""),
        ];
        let ranked = rank_rows(&rows);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].likelihood, Some(91.5));
        assert_eq!(ranked[0].record.display_name(), "KOI-1");
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[1].likelihood, None);
    }

    #[test]
    fn test_missing_export_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_likely_planets(dir.path().join("top10.csv")).unwrap().is_empty());
    }

    #[test]
    fn test_json_shape_flattens_record() {
        let ranked = rank_rows(&[RawRow::new().with("Planet_name", "KOI-1").with("P_CP", "90")]);
        let v = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(v["rank"], 1);
        assert_eq!(v["likelihood"], 90.0);
        assert_eq!(v["Planet_name"], "KOI-1");
    }
}
