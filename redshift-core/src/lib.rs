//! redshift-core: canonical planet records, header normalization, and candidate matching
//!
//! Everything in this crate is pure and total: no I/O, no error type. Loading
//! datasets and talking to the verification service live in `redshift-ingest`
//! and `redshift-verify`.

pub mod catalog;
pub mod matching;
pub mod normalize;
pub mod reconcile;
pub mod record;

pub use catalog::ConfirmedCatalog;
pub use matching::{
    MatchResult, MatchTolerances, POSITION_TOLERANCE_DEG, RELATIVE_TOLERANCE, SimilarityBasis,
    find_match, find_match_with,
};
pub use normalize::{
    FIELD_ALIASES, Field, canonical_header, field_for_header, field_text, normalize, parse_number,
};
pub use reconcile::{
    MatchKind, MatchedCandidate, ReconciliationReport, ReportSummary, VerificationRequest,
    reconcile,
};
pub use record::{CANONICAL_COLUMNS, PlanetRecord, RawRow};
