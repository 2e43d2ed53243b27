//! NASA Image and Video Library lookups for planet pictures.

use anyhow::{Context, Result, bail};
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NASA_BASE_URL: &str = "https://images-api.nasa.gov";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHit {
    pub image_url: String,
    pub nasa_id: String,
    pub title: String,
    pub description: String,
}

/// `(nasa_id, title, description)` of the first search result, if any.
pub fn first_search_item(body: &Value) -> Option<(String, String, String)> {
    let data = body
        .pointer("/collection/items/0/data/0")?
        .as_object()?;
    let nasa_id = data.get("nasa_id")?.as_str()?.to_string();
    if nasa_id.is_empty() {
        return None;
    }
    let text = |k: &str| {
        data.get(k)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some((nasa_id, text("title"), text("description")))
}

/// First `.jpg` or `.png` href in an asset manifest.
pub fn first_image_href(body: &Value) -> Result<Option<String>> {
    let image_re = Regex::new(r"(?i)\.(jpg|png)$")?;
    let Some(items) = body.pointer("/collection/items").and_then(Value::as_array) else {
        return Ok(None);
    };
    Ok(items
        .iter()
        .filter_map(|i| i.get("href").and_then(Value::as_str))
        .find(|href| image_re.is_match(href))
        .map(str::to_string))
}

#[derive(Debug, Clone)]
pub struct NasaImages {
    http: reqwest::Client,
    base_url: String,
}

impl NasaImages {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("nasa request {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("nasa images error: {status} {txt}");
        }
        resp.json().await.context("parse nasa response")
    }

    /// Raw image search results for `query`.
    pub async fn search(&self, query: &str, page: u32) -> Result<Value> {
        let query = query.trim();
        if query.is_empty() {
            bail!("search query is required");
        }
        let page = page.max(1).to_string();
        let url = Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[("q", query), ("media_type", "image"), ("page", page.as_str())],
        )
        .context("build nasa search url")?;
        self.get_json(url).await
    }

    /// Asset manifest for one NASA id.
    pub async fn asset(&self, nasa_id: &str) -> Result<Value> {
        let mut url = Url::parse(&self.base_url).context("parse nasa base url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("nasa base url cannot take a path"))?
            .pop_if_empty()
            .extend(["asset", nasa_id]);
        self.get_json(url).await
    }

    /// The first image for `query`, or `None` when any step comes up empty.
    pub async fn first_image(&self, query: &str) -> Result<Option<ImageHit>> {
        let results = self.search(query, 1).await?;
        let Some((nasa_id, title, description)) = first_search_item(&results) else {
            tracing::debug!(query, "no nasa search results");
            return Ok(None);
        };

        let assets = self.asset(&nasa_id).await?;
        let Some(image_url) = first_image_href(&assets)? else {
            tracing::debug!(nasa_id = %nasa_id, "no image asset");
            return Ok(None);
        };

        Ok(Some(ImageHit {
            image_url,
            nasa_id,
            title,
            description,
        }))
    }
}

impl Default for NasaImages {
    fn default() -> Self {
        Self::new(DEFAULT_NASA_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_search_item() {
        let body = json!({"collection": {"items": [
            {"data": [{"nasa_id": "PIA21422", "title": "TRAPPIST-1", "description": "Seven planets"}]},
            {"data": [{"nasa_id": "other"}]}
        ]}});
        let (id, title, desc) = first_search_item(&body).unwrap();
        assert_eq!(id, "PIA21422");
        assert_eq!(title, "TRAPPIST-1");
        assert_eq!(desc, "Seven planets");

        assert!(first_search_item(&json!({"collection": {"items": []}})).is_none());
        assert!(first_search_item(&json!({"collection": {"items": [{"data": []}]}})).is_none());
    }

    #[test]
    fn test_first_image_href_skips_non_images() {
        let body = json!({"collection": {"items": [
            {"href": "https://images-assets.nasa.gov/image/x/metadata.json"},
            {"href": "https://images-assets.nasa.gov/image/x/x~orig.JPG"},
            {"href": "https://images-assets.nasa.gov/image/x/x~small.png"}
        ]}});
        assert_eq!(
            first_image_href(&body).unwrap().as_deref(),
            Some("https://images-assets.nasa.gov/image/x/x~orig.JPG")
        );
        assert_eq!(first_image_href(&json!({})).unwrap(), None);
    }
}
