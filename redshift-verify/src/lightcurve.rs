//! Light-curve rendering by shelling out to the plotting script.
//!
//! The script is opaque: `<program> <script> <dataset.csv> <planet name> <output.png>`.
//! It either leaves an image at the output path or it failed.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Replace every non-alphanumeric character so the name is safe as a file stem.
pub fn sanitize_planet_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Prefer the candidates dataset, fall back to the confirmed one.
pub fn select_dataset(candidates: &Path, confirmed: &Path) -> Result<PathBuf> {
    if candidates.exists() {
        return Ok(candidates.to_path_buf());
    }
    if confirmed.exists() {
        return Ok(confirmed.to_path_buf());
    }
    bail!(
        "no dataset to plot from: neither {} nor {} exists",
        candidates.display(),
        confirmed.display()
    )
}

#[derive(Debug, Clone)]
pub struct LightCurveRenderer {
    pub program: String,
    pub script: PathBuf,
    pub output_dir: PathBuf,
    pub timeout: Duration,
}

impl LightCurveRenderer {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            output_dir: output_dir.into(),
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn output_path(&self, planet: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_curve.png", sanitize_planet_name(planet)))
    }

    /// Render the light curve for `planet` from `dataset` and return the image bytes.
    ///
    /// The temporary image is removed once read.
    pub async fn render(&self, dataset: &Path, planet: &str) -> Result<Vec<u8>> {
        if planet.trim().is_empty() {
            bail!("planet name required");
        }
        if !self.script.exists() {
            bail!("light-curve script not found: {}", self.script.display());
        }
        if !dataset.exists() {
            bail!("dataset not found: {}", dataset.display());
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("create {}", self.output_dir.display()))?;
        let output = self.output_path(planet);

        tracing::info!(planet, dataset = %dataset.display(), "rendering light curve");

        let child = tokio::process::Command::new(&self.program)
            .arg(&self.script)
            .arg(dataset)
            .arg(planet)
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let out = match tokio::time::timeout(self.timeout, child).await {
            Ok(res) => res.with_context(|| format!("running {}", self.program))?,
            Err(_) => bail!(
                "light-curve rendering for {planet:?} timed out after {:?}",
                self.timeout
            ),
        };

        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        if !stdout.trim().is_empty() {
            tracing::debug!(output = %stdout.trim(), "renderer stdout");
        }

        if !out.status.success() {
            bail!(
                "light-curve renderer exited with {}. stderr: {}",
                out.status,
                stderr.trim()
            );
        }
        if !stderr.trim().is_empty() {
            tracing::warn!(output = %stderr.trim(), "renderer stderr");
        }

        if !output.exists() {
            bail!("light-curve renderer produced no image for {planet:?}");
        }

        let bytes = tokio::fs::read(&output)
            .await
            .with_context(|| format!("read {}", output.display()))?;
        if let Err(e) = tokio::fs::remove_file(&output).await {
            tracing::warn!(path = %output.display(), error = %e, "could not remove rendered image");
        }

        Ok(bytes)
    }
}
