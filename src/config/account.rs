// src/config/account.rs
use serde::Deserialize;
use std::{fs, path::Path};

use anyhow::Context;

/// Credentials of the account statuses are posted from.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Instance base URL, e.g. `https://mastodon.social`.
    pub url: String,
    /// Access token with `write:statuses` scope.
    pub token: String,
}

impl AccountConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading account config {}", path.display()))?;
        let mut cfg: AccountConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing account config {}", path.display()))?;

        // Normalize URL
        cfg.url = cfg.url.trim().trim_end_matches('/').to_string();
        cfg.token = cfg.token.trim().to_string();

        if cfg.url.is_empty() {
            anyhow::bail!("account config {}: empty url", path.display());
        }
        if cfg.token.is_empty() {
            anyhow::bail!("account config {}: empty token", path.display());
        }

        Ok(cfg)
    }
}
