use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$REDSHIFT_HOME`, or `~/.redshift` when unset.
pub fn redshift_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("REDSHIFT_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".redshift"))
}

pub fn ensure_redshift_home() -> Result<PathBuf> {
    let dir = redshift_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
