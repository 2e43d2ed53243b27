use anyhow::{Context, Result};
use redshift_verify::DEFAULT_PLANET_LABELS;
use redshift_verify::lightcurve::DEFAULT_RENDER_TIMEOUT;
use redshift_verify::nasa::DEFAULT_NASA_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::{ensure_redshift_home, redshift_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSection,
    pub verifier: VerifierSection,
    pub lightcurve: LightCurveSection,
    pub nasa: NasaSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub confirmed_csv: PathBuf,
    pub candidates_csv: PathBuf,
    /// Ranked likely-planets export shown by `top10`
    pub top10_csv: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierSection {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Class labels meaning "confirmed planet", in lookup order.
    pub planet_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightCurveSection {
    /// Interpreter used to run the script (default: "python")
    pub program: String,
    pub script: PathBuf,
    /// Scratch directory for rendered images
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NasaSection {
    pub base_url: String,
}

impl Default for DataSection {
    fn default() -> Self {
        let paths = redshift_ingest::DatasetPaths::default();
        Self {
            confirmed_csv: paths.confirmed,
            candidates_csv: paths.candidates,
            top10_csv: paths.top10,
        }
    }
}

impl Default for VerifierSection {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 30,
            planet_labels: DEFAULT_PLANET_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LightCurveSection {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            script: PathBuf::from("lightcurve.py"),
            output_dir: PathBuf::from("temp"),
            timeout_secs: DEFAULT_RENDER_TIMEOUT.as_secs(),
        }
    }
}

impl Default for NasaSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NASA_BASE_URL.to_string(),
        }
    }
}

impl VerifierSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl LightCurveSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(redshift_home()?.join("config.toml"))
}

/// Load config from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config_from(p),
        None => load_config_from(&default_config_path()?),
    }
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the default config unless one already exists.
pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => ensure_redshift_home()?.join("config.toml"),
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.data.confirmed_csv, PathBuf::from("data/Confirmed.csv"));
        assert_eq!(cfg.data.top10_csv, PathBuf::from("data/top10_likely_planets.csv"));
        assert_eq!(cfg.verifier.planet_labels, vec!["Confirmed Planet", "CP"]);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(
            &p,
            "[verifier]\nbase_url = \"http://ml.local:8000\"\n\n[data]\nconfirmed_csv = \"/srv/Confirmed.csv\"\n",
        )
        .unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.verifier.base_url, "http://ml.local:8000");
        assert_eq!(cfg.verifier.timeout_secs, 30);
        assert_eq!(cfg.data.confirmed_csv, PathBuf::from("/srv/Confirmed.csv"));
        assert_eq!(cfg.data.candidates_csv, PathBuf::from("data/Candidates.csv"));
        assert_eq!(cfg.lightcurve, LightCurveSection::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.lightcurve.program = "python3".to_string();
        save_config_to(&p, &cfg).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), cfg);
    }

    #[test]
    fn test_bad_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "[verifier\n").unwrap();
        assert!(load_config_from(&p).is_err());
    }
}
