use anyhow::{Context, Result, bail};
use clap::Args;
use redshift_core::{PlanetRecord, RawRow, normalize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Planet fields accepted on the command line. Each flag overrides the JSON input.
#[derive(Args, Debug, Clone, Default)]
pub struct CandidateArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Right ascension (degrees)
    #[arg(long, allow_negative_numbers = true)]
    pub ra: Option<f64>,

    /// Declination (degrees)
    #[arg(long, allow_negative_numbers = true)]
    pub dec: Option<f64>,

    /// Orbital period (days)
    #[arg(long)]
    pub period: Option<f64>,

    /// Planet radius (Earth radii)
    #[arg(long)]
    pub radius: Option<f64>,

    #[arg(long)]
    pub disposition: Option<String>,

    #[arg(long)]
    pub transit_epoch: Option<f64>,

    /// Transit duration (hours)
    #[arg(long)]
    pub transit_duration: Option<f64>,

    /// Transit depth (ppm)
    #[arg(long)]
    pub transit_depth: Option<f64>,

    #[arg(long)]
    pub insolation: Option<f64>,

    /// Equilibrium temperature (K)
    #[arg(long)]
    pub eq_temp: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub magnitude: Option<f64>,

    /// Stellar effective temperature (K)
    #[arg(long)]
    pub stellar_temp: Option<f64>,

    /// Stellar surface gravity (log g)
    #[arg(long)]
    pub stellar_gravity: Option<f64>,

    /// Stellar radius (solar radii)
    #[arg(long)]
    pub stellar_radius: Option<f64>,
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn set_text(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        let v = v.trim();
        *slot = if v.is_empty() { None } else { Some(v.to_string()) };
    }
}

impl CandidateArgs {
    /// Overlay the flags that were given onto `rec`.
    pub fn apply(self, mut rec: PlanetRecord) -> PlanetRecord {
        set_text(&mut rec.name, self.name);
        set_text(&mut rec.disposition, self.disposition);
        set(&mut rec.right_ascension, self.ra);
        set(&mut rec.declination, self.dec);
        set(&mut rec.orbital_period_days, self.period);
        set(&mut rec.planet_radius_earth, self.radius);
        set(&mut rec.transit_epoch, self.transit_epoch);
        set(&mut rec.transit_duration_hours, self.transit_duration);
        set(&mut rec.transit_depth_ppm, self.transit_depth);
        set(&mut rec.insolation_flux, self.insolation);
        set(&mut rec.equilibrium_temp_k, self.eq_temp);
        set(&mut rec.magnitude, self.magnitude);
        set(&mut rec.stellar_temp_k, self.stellar_temp);
        set(&mut rec.stellar_surface_gravity, self.stellar_gravity);
        set(&mut rec.stellar_radius_solar, self.stellar_radius);
        rec
    }
}

/// Turn a JSON object into a raw row so it goes through the same header normalization as CSV.
pub fn raw_row_from_json(value: &Value) -> Result<RawRow> {
    let Some(obj) = value.as_object() else {
        bail!("candidate JSON must be an object");
    };
    obj.iter()
        .map(|(k, v)| {
            let cell = match v {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => bail!("field {k:?} has unsupported value {other}"),
            };
            Ok((k.clone(), cell))
        })
        .collect()
}

/// Build the candidate from an optional JSON file and the command-line flags.
pub fn load_candidate(json_file: Option<&Path>, args: CandidateArgs) -> Result<PlanetRecord> {
    let base = match json_file {
        Some(p) => {
            let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
            let v: Value =
                serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
            normalize(&raw_row_from_json(&v)?)
        }
        None => PlanetRecord::default(),
    };
    Ok(args.apply(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_row_from_json_goes_through_normalizer() {
        let v = json!({
            "Planet Name": "KOI-7016.01",
            "Orbital Period (days)": 384.8,
            "Planet Radius (Rearth)": "1.6",
            "Declination": null
        });
        let rec = normalize(&raw_row_from_json(&v).unwrap());
        assert_eq!(rec.name.as_deref(), Some("KOI-7016.01"));
        assert_eq!(rec.orbital_period_days, Some(384.8));
        assert_eq!(rec.planet_radius_earth, Some(1.6));
        assert_eq!(rec.declination, None);
    }

    #[test]
    fn test_raw_row_from_json_rejects_non_objects() {
        assert!(raw_row_from_json(&json!([1, 2])).is_err());
        assert!(raw_row_from_json(&json!({"Planet_name": {"nested": true}})).is_err());
    }

    #[test]
    fn test_flags_override_json() {
        let base = PlanetRecord::named("From JSON").with_orbit(10.0, 2.0);
        let args = CandidateArgs {
            period: Some(11.0),
            dec: Some(-12.5),
            ..Default::default()
        };
        let rec = args.apply(base);
        assert_eq!(rec.name.as_deref(), Some("From JSON"));
        assert_eq!(rec.orbital_period_days, Some(11.0));
        assert_eq!(rec.planet_radius_earth, Some(2.0));
        assert_eq!(rec.declination, Some(-12.5));
    }

    #[test]
    fn test_blank_name_flag_clears_name() {
        let args = CandidateArgs {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(args.apply(PlanetRecord::named("x")).name, None);
    }

    #[test]
    fn test_load_candidate_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path().join("cand.json");
        fs::write(&p, r#"{"Planet_name": "Twin-62", "Right_ascension": 283.2}"#).unwrap();

        let rec = load_candidate(Some(&p), CandidateArgs::default()).unwrap();
        assert_eq!(rec.name.as_deref(), Some("Twin-62"));
        assert_eq!(rec.right_ascension, Some(283.2));

        assert!(load_candidate(Some(&dir.path().join("missing.json")), CandidateArgs::default()).is_err());
    }
}
