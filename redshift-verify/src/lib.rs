//! redshift-verify: I/O collaborators around the matching core
//!
//! - AI verification service client
//! - light-curve rendering through an external script
//! - NASA image search

pub mod client;
pub mod lightcurve;
pub mod nasa;

pub use client::{BatchVerdict, DEFAULT_PLANET_LABELS, Verdict, VerifierClient};
pub use lightcurve::{LightCurveRenderer, sanitize_planet_name, select_dataset};
pub use nasa::{ImageHit, NasaImages};
