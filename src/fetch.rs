//! fetch.rs - Conditional GET of the model CSV, keyed by a persisted ETag.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use tokio::fs;

/// File name of the ETag store inside a storage directory.
pub const ETAGS_FILE: &str = "etags.json";

/// Result of a conditional fetch.
#[derive(Debug)]
pub enum Fetch {
    /// Server answered 304 for the stored tag; nothing to do.
    Unchanged,
    /// Fresh content. The new tag (if any) is already persisted.
    Modified { body: String },
}

/// URL → last ETag seen. Read whole, written whole, last writer wins.
#[derive(Debug, Default)]
pub struct EtagStore {
    path: PathBuf,
    tags: BTreeMap<String, String>,
}

impl EtagStore {
    /// Load from `path`. Missing or corrupt files give an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tags = match fs::read_to_string(&path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "ignoring corrupt etag store: {e}");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, tags }
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.tags.get(url).map(String::as_str)
    }

    /// Record `tag` for `url` (`None` forgets it) and rewrite the file.
    pub async fn update(&mut self, url: &str, tag: Option<String>) -> Result<()> {
        match tag {
            Some(t) => self.tags.insert(url.to_string(), t),
            None => self.tags.remove(url),
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_vec_pretty(&self.tags).context("encoding etag store")?;
        fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing etag store {}", self.path.display()))
    }
}

/// GET `url`, sending `If-None-Match` with the tag stored under `base_dir`.
///
/// Network errors, non-2xx answers (other than 304) and store write failures
/// are returned as errors. No retry.
pub async fn fetch_if_modified(client: &Client, base_dir: &Path, url: &str) -> Result<Fetch> {
    let mut store = EtagStore::load(base_dir.join(ETAGS_FILE)).await;

    let mut req = client.get(url);
    if let Some(tag) = store.get(url) {
        req = req.header(header::IF_NONE_MATCH, tag);
    }

    let resp = req.send().await.with_context(|| format!("GET {url}"))?;
    if resp.status() == StatusCode::NOT_MODIFIED {
        tracing::info!(url, "not modified");
        return Ok(Fetch::Unchanged);
    }
    let resp = resp
        .error_for_status()
        .with_context(|| format!("GET {url}"))?;

    let etag = resp
        .headers()
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp
        .text()
        .await
        .with_context(|| format!("reading body of {url}"))?;

    tracing::info!(url, etag = etag.as_deref().unwrap_or("-"), bytes = body.len(), "fetched");
    store.update(url, etag).await?;

    Ok(Fetch::Modified { body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_round_trips_and_forgets() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(ETAGS_FILE);

        let mut store = EtagStore::load(&path).await;
        assert_eq!(store.get("http://a"), None);
        store.update("http://a", Some("\"v1\"".into())).await.unwrap();
        store.update("http://b", Some("\"w9\"".into())).await.unwrap();

        let store = EtagStore::load(&path).await;
        assert_eq!(store.get("http://a"), Some("\"v1\""));
        assert_eq!(store.get("http://b"), Some("\"w9\""));

        let mut store = store;
        store.update("http://a", None).await.unwrap();
        let store = EtagStore::load(&path).await;
        assert_eq!(store.get("http://a"), None);
        assert_eq!(store.get("http://b"), Some("\"w9\""));
    }

    #[tokio::test]
    async fn corrupt_store_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(ETAGS_FILE);
        std::fs::write(&path, "[1, 2").unwrap();
        let store = EtagStore::load(&path).await;
        assert_eq!(store.get("http://a"), None);
    }
}
