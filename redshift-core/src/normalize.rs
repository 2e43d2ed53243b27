//! Record normalizer: raw rows with inconsistent headers into canonical [`PlanetRecord`]s.
//!
//! Header lookup is a static table from canonical field to an ordered list of
//! accepted spellings. Every spelling is stored in canonical key form (see
//! [`canonical_header`]), so `Planet_Name`, ` planet_name ` and
//! `Stellar_temperatureÃ‚Â` all resolve without runtime probing.
//!
//! Normalization never fails. Unknown headers are ignored, unparseable cells
//! become `None`.

use std::collections::HashMap;

use crate::record::{PlanetRecord, RawRow, non_blank};

/// Canonical fields a raw row can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Disposition,
    RightAscension,
    Declination,
    TransitEpoch,
    OrbitalPeriod,
    TransitDuration,
    TransitDepth,
    PlanetRadius,
    InsolationFlux,
    EquilibriumTemp,
    Magnitude,
    StellarTemp,
    StellarSurfaceGravity,
    StellarRadius,
}

/// Accepted header spellings per field, in priority order.
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Name, &["planet_name", "planet name", "name", "kepler_name", "pl_name"]),
    (Field::Disposition, &["disposition", "koi_disposition", "tfopwg_disp"]),
    (Field::RightAscension, &["right_ascension", "right ascension", "ra"]),
    (Field::Declination, &["declination", "dec"]),
    (Field::TransitEpoch, &["transit_epoch", "transit epoch", "koi_time0bk"]),
    (
        Field::OrbitalPeriod,
        &["orbital_period", "orbital period (days)", "orbital period", "koi_period"],
    ),
    (
        Field::TransitDuration,
        &["transit_duration", "transit duration (hours)", "transit duration", "koi_duration"],
    ),
    (
        Field::TransitDepth,
        &["transit_depth", "transit depth (ppm)", "transit depth", "koi_depth"],
    ),
    (
        Field::PlanetRadius,
        &[
            "planet_radius",
            "planet radius (rearth)",
            "planet radius (r)",
            "planet radius",
            "koi_prad",
        ],
    ),
    (Field::InsolationFlux, &["insolation_flux", "insolation flux", "koi_insol"]),
    (
        Field::EquilibriumTemp,
        &["equilibrium_temp", "equilibrium temp (k)", "equilibrium temp", "koi_teq"],
    ),
    (Field::Magnitude, &["magnitude", "koi_kepmag"]),
    (
        Field::StellarTemp,
        &["stellar_temperature", "stellar temp (k)", "stellar temp", "koi_steff"],
    ),
    (
        Field::StellarSurfaceGravity,
        &[
            "stellar_surface_gravity",
            "stellar_surface_ gravity",
            "stellar surface gravity",
            "koi_slogg",
        ],
    ),
    (Field::StellarRadius, &["stellar_radius", "stellar radius", "koi_srad"]),
];

/// Canonical key form of a header: ASCII only, lower-case, trimmed, single spaces.
///
/// Non-ASCII characters are dropped, which removes BOMs and mojibake such as `Ã‚Â`
/// left behind by latin-1 exports. `⊕` in `Planet Radius (R⊕)` is dropped too.
pub fn canonical_header(header: &str) -> String {
    let ascii: String = header.chars().filter(char::is_ascii).collect();
    ascii
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Parse a numeric cell. Blank, unparseable and non-finite text is `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let t = cell.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize one raw row into a canonical record.
pub fn normalize(row: &RawRow) -> PlanetRecord {
    // First column wins when two headers canonicalize to the same key.
    let mut by_key: HashMap<String, &str> = HashMap::with_capacity(row.len());
    for (header, value) in row.cells() {
        by_key.entry(canonical_header(header)).or_insert(value);
    }

    let mut rec = PlanetRecord::default();
    let mut used = 0usize;

    for (field, aliases) in FIELD_ALIASES {
        let Some(cell) = aliases.iter().find_map(|a| by_key.get(*a).copied()) else {
            continue;
        };
        used += 1;
        assign(&mut rec, *field, cell);
    }

    if used < by_key.len() {
        tracing::trace!(
            recognized = used,
            columns = by_key.len(),
            "ignoring unrecognized columns"
        );
    }

    rec
}

fn assign(rec: &mut PlanetRecord, field: Field, cell: &str) {
    match field {
        Field::Name => rec.name = non_blank(cell.to_string()),
        Field::Disposition => rec.disposition = non_blank(cell.to_string()),
        Field::RightAscension => rec.right_ascension = parse_number(cell),
        Field::Declination => rec.declination = parse_number(cell),
        Field::TransitEpoch => rec.transit_epoch = parse_number(cell),
        Field::OrbitalPeriod => rec.orbital_period_days = parse_number(cell),
        Field::TransitDuration => rec.transit_duration_hours = parse_number(cell),
        Field::TransitDepth => rec.transit_depth_ppm = parse_number(cell),
        Field::PlanetRadius => rec.planet_radius_earth = parse_number(cell),
        Field::InsolationFlux => rec.insolation_flux = parse_number(cell),
        Field::EquilibriumTemp => rec.equilibrium_temp_k = parse_number(cell),
        Field::Magnitude => rec.magnitude = parse_number(cell),
        Field::StellarTemp => rec.stellar_temp_k = parse_number(cell),
        Field::StellarSurfaceGravity => rec.stellar_surface_gravity = parse_number(cell),
        Field::StellarRadius => rec.stellar_radius_solar = parse_number(cell),
    }
}

/// The field a header spelling resolves to, if any.
pub fn field_for_header(header: &str) -> Option<Field> {
    let key = canonical_header(header);
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&key.as_str()))
        .map(|(field, _)| *field)
}

/// Cell text for `field`, as written to a dataset. `None` for an empty field.
pub fn field_text(rec: &PlanetRecord, field: Field) -> Option<String> {
    let num = |v: Option<f64>| v.map(|x| x.to_string());
    match field {
        Field::Name => rec.name.clone(),
        Field::Disposition => rec.disposition.clone(),
        Field::RightAscension => num(rec.right_ascension),
        Field::Declination => num(rec.declination),
        Field::TransitEpoch => num(rec.transit_epoch),
        Field::OrbitalPeriod => num(rec.orbital_period_days),
        Field::TransitDuration => num(rec.transit_duration_hours),
        Field::TransitDepth => num(rec.transit_depth_ppm),
        Field::PlanetRadius => num(rec.planet_radius_earth),
        Field::InsolationFlux => num(rec.insolation_flux),
        Field::EquilibriumTemp => num(rec.equilibrium_temp_k),
        Field::Magnitude => num(rec.magnitude),
        Field::StellarTemp => num(rec.stellar_temp_k),
        Field::StellarSurfaceGravity => num(rec.stellar_surface_gravity),
        Field::StellarRadius => num(rec.stellar_radius_solar),
    }
}
