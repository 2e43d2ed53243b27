//! Batch reconciler: split an uploaded batch into already-known planets and new candidates.

use serde::{Deserialize, Serialize};

use crate::catalog::ConfirmedCatalog;
use crate::matching::{MatchResult, SimilarityBasis, find_match};
use crate::normalize::normalize;
use crate::record::{PlanetRecord, RawRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    ExactName,
    Position,
    Parameters,
}

impl MatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::ExactName => "name",
            MatchKind::Position => "position",
            MatchKind::Parameters => "period+radius",
        }
    }
}

impl From<SimilarityBasis> for MatchKind {
    fn from(basis: SimilarityBasis) -> Self {
        match basis {
            SimilarityBasis::Position => MatchKind::Position,
            SimilarityBasis::Parameters => MatchKind::Parameters,
        }
    }
}

/// An uploaded candidate together with the catalog record it matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedCandidate {
    pub candidate: PlanetRecord,
    pub matched: PlanetRecord,
    pub kind: MatchKind,
}

/// Outcome of one reconciliation. Input order is preserved within each partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub matched: Vec<MatchedCandidate>,
    pub unmatched: Vec<PlanetRecord>,
}

/// Outbound batch payload for the AI verification service: `{"planets": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationRequest<'a> {
    pub planets: &'a [PlanetRecord],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub matched: usize,
    pub new_candidates: usize,
}

impl ReconciliationReport {
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            total: self.total(),
            matched: self.matched.len(),
            new_candidates: self.unmatched.len(),
        }
    }

    /// The unmatched records, shaped as the batch verification request.
    pub fn verification_request(&self) -> VerificationRequest<'_> {
        VerificationRequest {
            planets: &self.unmatched,
        }
    }
}

/// Normalize each uploaded row and match it against `catalog`.
///
/// The catalog is only read. Appending confirmed planets is a separate step.
pub fn reconcile(candidates: &[RawRow], catalog: &ConfirmedCatalog) -> ReconciliationReport {
    let mut report = ReconciliationReport::default();

    for (i, row) in candidates.iter().enumerate() {
        let candidate = normalize(row);
        let hit = match find_match(&candidate, catalog) {
            MatchResult::ExactName(r) => Some((MatchKind::ExactName, r)),
            MatchResult::Similar { record, basis } => Some((MatchKind::from(basis), record)),
            MatchResult::NoMatch => None,
        };

        match hit {
            Some((kind, matched)) => {
                tracing::debug!(
                    row = i,
                    candidate = candidate.display_name(),
                    matched_with = matched.display_name(),
                    kind = kind.label(),
                    "candidate matched"
                );
                report.matched.push(MatchedCandidate {
                    candidate,
                    matched: matched.clone(),
                    kind,
                });
            }
            None => {
                tracing::debug!(row = i, candidate = candidate.display_name(), "new candidate");
                report.unmatched.push(candidate);
            }
        }
    }

    tracing::info!(
        total = report.total(),
        matched = report.matched.len(),
        new_candidates = report.unmatched.len(),
        "reconciled upload"
    );

    report
}
