//! Matching engine: does a candidate already exist in the confirmed catalog?
//!
//! Rules, in order (each scans the whole catalog before the next is tried):
//! 1) exact name, trimmed and case-insensitive
//! 2) sky position, both RA and Dec within an absolute tolerance
//! 3) orbital period and planet radius, both within a relative tolerance
//!
//! A candidate missing the fields a rule needs skips that rule. Missing or
//! ill-defined comparisons resolve to `NoMatch`, never to a match.

use crate::catalog::ConfirmedCatalog;
use crate::record::PlanetRecord;

/// Absolute tolerance on RA/Dec, in degrees.
pub const POSITION_TOLERANCE_DEG: f64 = 0.01;
/// Relative tolerance on orbital period and planet radius.
pub const RELATIVE_TOLERANCE: f64 = 0.05;

/// Tolerances used by the position and parameter rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchTolerances {
    pub position_deg: f64,
    pub relative: f64,
}

impl Default for MatchTolerances {
    fn default() -> Self {
        Self {
            position_deg: POSITION_TOLERANCE_DEG,
            relative: RELATIVE_TOLERANCE,
        }
    }
}

/// Which similarity rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityBasis {
    Position,
    Parameters,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult<'a> {
    ExactName(&'a PlanetRecord),
    Similar {
        record: &'a PlanetRecord,
        basis: SimilarityBasis,
    },
    NoMatch,
}

impl<'a> MatchResult<'a> {
    pub fn record(&self) -> Option<&'a PlanetRecord> {
        match *self {
            MatchResult::ExactName(r) => Some(r),
            MatchResult::Similar { record, .. } => Some(record),
            MatchResult::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, MatchResult::NoMatch)
    }
}

/// Find a catalog record matching `candidate` using the default tolerances.
pub fn find_match<'a>(candidate: &PlanetRecord, catalog: &'a ConfirmedCatalog) -> MatchResult<'a> {
    find_match_with(candidate, catalog, MatchTolerances::default())
}

pub fn find_match_with<'a>(
    candidate: &PlanetRecord,
    catalog: &'a ConfirmedCatalog,
    tol: MatchTolerances,
) -> MatchResult<'a> {
    if let Some(key) = candidate.name_key() {
        if let Some(r) = catalog
            .iter()
            .find(|r| r.name_key().as_deref() == Some(key.as_str()))
        {
            return MatchResult::ExactName(r);
        }
    }

    if let (Some(ra), Some(dec)) = (candidate.right_ascension, candidate.declination) {
        if let Some(r) = catalog.iter().find(|r| same_position(ra, dec, r, tol.position_deg)) {
            return MatchResult::Similar {
                record: r,
                basis: SimilarityBasis::Position,
            };
        }
    }

    if let (Some(period), Some(radius)) = (candidate.orbital_period_days, candidate.planet_radius_earth) {
        if let Some(r) = catalog
            .iter()
            .find(|r| same_parameters(period, radius, r, tol.relative))
        {
            return MatchResult::Similar {
                record: r,
                basis: SimilarityBasis::Parameters,
            };
        }
    }

    MatchResult::NoMatch
}

fn same_position(ra: f64, dec: f64, r: &PlanetRecord, tol: f64) -> bool {
    match (r.right_ascension, r.declination) {
        (Some(r_ra), Some(r_dec)) => (r_ra - ra).abs() < tol && (r_dec - dec).abs() < tol,
        _ => false,
    }
}

fn same_parameters(period: f64, radius: f64, r: &PlanetRecord, tol: f64) -> bool {
    match (r.orbital_period_days, r.planet_radius_earth) {
        (Some(r_period), Some(r_radius)) => {
            within_relative(period, r_period, tol) && within_relative(radius, r_radius, tol)
        }
        _ => false,
    }
}

/// `|candidate - other| / |candidate| < tol`. A zero candidate never matches.
fn within_relative(candidate: f64, other: f64, tol: f64) -> bool {
    if candidate == 0.0 {
        return false;
    }
    let diff = (candidate - other).abs() / candidate.abs();
    diff.is_finite() && diff < tol
}
