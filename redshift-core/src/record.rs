//! Planet record types: raw tabular rows and the canonical record they normalize into.

use serde::{Deserialize, Serialize};

/// One row of tabular input, as parsed from CSV or a spreadsheet.
///
/// Headers keep their original spelling; cells keep their original text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair a header record with a value record.
    ///
    /// Missing trailing cells become empty strings; surplus cells are dropped.
    pub fn from_record<H, V>(headers: &[H], values: &[V]) -> Self
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let cells = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let v = values.get(i).map(|v| v.as_ref()).unwrap_or("");
                (h.as_ref().to_string(), v.to_string())
            })
            .collect();
        Self { cells }
    }

    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    pub fn with(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(header, value);
        self
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

impl<H, V> FromIterator<(H, V)> for RawRow
where
    H: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(h, v)| (h.into(), v.into())).collect(),
        }
    }
}

/// Canonical planet record: the unit of comparison and storage.
///
/// Serializes to the dataset's column names, in dataset column order.
/// Empty fields stay `None`; a blank cell is never read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanetRecord {
    #[serde(rename = "Disposition")]
    pub disposition: Option<String>,
    /// Degrees
    #[serde(rename = "Right_ascension")]
    pub right_ascension: Option<f64>,
    /// Degrees
    #[serde(rename = "Declination")]
    pub declination: Option<f64>,
    #[serde(rename = "Transit_epoch")]
    pub transit_epoch: Option<f64>,
    #[serde(rename = "orbital_period")]
    pub orbital_period_days: Option<f64>,
    #[serde(rename = "Transit_duration")]
    pub transit_duration_hours: Option<f64>,
    #[serde(rename = "Transit_depth")]
    pub transit_depth_ppm: Option<f64>,
    /// Earth radii
    #[serde(rename = "Planet_radius")]
    pub planet_radius_earth: Option<f64>,
    #[serde(rename = "Insolation_flux")]
    pub insolation_flux: Option<f64>,
    #[serde(rename = "Equilibrium_temp")]
    pub equilibrium_temp_k: Option<f64>,
    #[serde(rename = "Magnitude")]
    pub magnitude: Option<f64>,
    #[serde(rename = "Stellar_temperature")]
    pub stellar_temp_k: Option<f64>,
    /// log(g)
    #[serde(rename = "Stellar_surface_gravity")]
    pub stellar_surface_gravity: Option<f64>,
    /// Solar radii
    #[serde(rename = "Stellar_radius")]
    pub stellar_radius_solar: Option<f64>,
    #[serde(rename = "Planet_name")]
    pub name: Option<String>,
}

/// Column order used when writing records back out.
pub const CANONICAL_COLUMNS: [&str; 15] = [
    "Disposition",
    "Right_ascension",
    "Declination",
    "Transit_epoch",
    "orbital_period",
    "Transit_duration",
    "Transit_depth",
    "Planet_radius",
    "Insolation_flux",
    "Equilibrium_temp",
    "Magnitude",
    "Stellar_temperature",
    "Stellar_surface_gravity",
    "Stellar_radius",
    "Planet_name",
];

impl PlanetRecord {
    /// A record with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: non_blank(name.into()),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, ra: f64, dec: f64) -> Self {
        self.right_ascension = Some(ra);
        self.declination = Some(dec);
        self
    }

    pub fn with_orbit(mut self, period_days: f64, radius_earth: f64) -> Self {
        self.orbital_period_days = Some(period_days);
        self.planet_radius_earth = Some(radius_earth);
        self
    }

    pub fn with_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = non_blank(disposition.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }

    /// Trimmed, lower-cased name used for identity comparisons.
    pub fn name_key(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
    }
}

pub(crate) fn non_blank(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else if t.len() == s.len() {
        Some(s)
    } else {
        Some(t.to_string())
    }
}
