//! HTTP client for the AI verification service.
//!
//! The service is an opaque classifier. We send plain feature records (the
//! dataset column layout of [`PlanetRecord`]) and get back a predicted class,
//! a confidence, and per-class probabilities.
//!
//! Every transport or protocol failure is an error. A failed verification is
//! never reported as "not a planet".

use anyhow::{Context, Result, bail};
use redshift_core::{PlanetRecord, VerificationRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Class labels the service uses for a confirmed planet, in lookup order.
pub const DEFAULT_PLANET_LABELS: [&str; 2] = ["Confirmed Planet", "CP"];

/// Prediction for a single submitted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_planet: bool,
    pub predicted_class: String,
    pub confidence: f64,
    #[serde(rename = "all_probabilities", default)]
    pub probabilities: BTreeMap<String, f64>,
}

/// Prediction for one record of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchVerdict {
    #[serde(rename = "Planet_name", default)]
    pub planet_name: Option<String>,
    pub predicted_class: String,
    pub confidence: f64,
    #[serde(rename = "all_probabilities", default)]
    pub probabilities: BTreeMap<String, f64>,
}

fn planet_probability(probabilities: &BTreeMap<String, f64>, labels: &[String]) -> Option<f64> {
    labels.iter().find_map(|l| probabilities.get(l).copied())
}

impl Verdict {
    pub fn is_planet_probability(&self, labels: &[String]) -> Option<f64> {
        planet_probability(&self.probabilities, labels)
    }
}

impl BatchVerdict {
    pub fn is_planet_probability(&self, labels: &[String]) -> Option<f64> {
        planet_probability(&self.probabilities, labels)
    }

    pub fn is_planet(&self, labels: &[String]) -> bool {
        labels.iter().any(|l| *l == self.predicted_class)
    }
}

fn check_unit(what: &str, v: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&v) {
        bail!("verifier returned {what} outside [0, 1]: {v}");
    }
    Ok(())
}

fn check_probabilities(confidence: f64, probabilities: &BTreeMap<String, f64>) -> Result<()> {
    check_unit("confidence", confidence)?;
    for (class, p) in probabilities {
        check_unit(&format!("probability for {class:?}"), *p)?;
    }
    Ok(())
}

/// Reject error envelopes: `{"error": ...}` or `{"success": false}`.
fn check_envelope(body: &Value) -> Result<()> {
    if let Some(err) = body.get("error").and_then(Value::as_str) {
        bail!("verifier error: {err}");
    }
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        bail!("verifier reported success=false");
    }
    Ok(())
}

/// Decode a `/api/verify` response body.
pub fn parse_verdict(body: Value) -> Result<Verdict> {
    check_envelope(&body)?;
    let verdict: Verdict = serde_json::from_value(body).context("parse verify response")?;
    check_probabilities(verdict.confidence, &verdict.probabilities)?;
    Ok(verdict)
}

/// Decode a `/api/batch-verify` response body for `expected` submitted records.
pub fn parse_batch(body: Value, expected: usize) -> Result<Vec<BatchVerdict>> {
    check_envelope(&body)?;
    let results = body
        .get("results")
        .cloned()
        .context("batch response has no results")?;
    let verdicts: Vec<BatchVerdict> =
        serde_json::from_value(results).context("parse batch-verify results")?;
    if verdicts.len() != expected {
        bail!(
            "verifier returned {} results for {} planets",
            verdicts.len(),
            expected
        );
    }
    for v in &verdicts {
        check_probabilities(v.confidence, &v.probabilities)?;
    }
    Ok(verdicts)
}

#[derive(Debug, Clone)]
pub struct VerifierClient {
    http: reqwest::Client,
    base_url: String,
    planet_labels: Vec<String>,
}

impl VerifierClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build verifier http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            planet_labels: DEFAULT_PLANET_LABELS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn with_planet_labels(mut self, labels: Vec<String>) -> Self {
        if !labels.is_empty() {
            self.planet_labels = labels;
        }
        self
    }

    pub fn planet_labels(&self) -> &[String] {
        &self.planet_labels
    }

    async fn post_json<T: Serialize + ?Sized>(&self, route: &str, body: &T) -> Result<Value> {
        let url = format!("{}{}", self.base_url, route);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("verifier request to {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("verifier error: {status} {txt}");
        }

        resp.json().await.context("verifier response is not json")
    }

    /// Classify a single candidate.
    pub async fn verify(&self, record: &PlanetRecord) -> Result<Verdict> {
        tracing::info!(name = record.display_name(), "requesting AI verification");
        let body = self.post_json("/api/verify", record).await?;
        let verdict = parse_verdict(body)?;
        tracing::debug!(
            class = %verdict.predicted_class,
            confidence = verdict.confidence,
            "verification result"
        );
        Ok(verdict)
    }

    /// Classify a batch of unmatched candidates, one verdict per record in order.
    pub async fn batch_verify(&self, records: &[PlanetRecord]) -> Result<Vec<BatchVerdict>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        tracing::info!(planets = records.len(), "requesting batch AI verification");
        let request = VerificationRequest { planets: records };
        let body = self.post_json("/api/batch-verify", &request).await?;
        parse_batch(body, records.len())
    }
}
