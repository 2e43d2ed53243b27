//! redshift-ingest: reading planet exports into raw rows, persisting the confirmed and candidate datasets, and loading the ranked likely-planets export.

pub mod likely;
pub mod reader;
pub mod store;
pub mod types;

pub use likely::{LikelyPlanet, load_likely_planets, rank_rows};
pub use reader::{decode_field, read_rows, read_rows_from_reader};
pub use store::{append_confirmed, load_catalog, save_candidate, write_catalog};
pub use types::DatasetPaths;
