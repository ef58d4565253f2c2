// src/config/settings.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;

use crate::history::DEFAULT_SPAN_DAYS;

pub const ENV_BASE_DIR: &str = "N4A_BASE_DIR";
pub const ENV_HISTORY_DAYS: &str = "N4A_HISTORY_DAYS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "N4A_HTTP_TIMEOUT_SECS";
pub const ENV_ACCOUNT_PATH: &str = "N4A_ACCOUNT_PATH";

const DEFAULT_STATE_ROOT: &str = "state";
const DEFAULT_ACCOUNT_PATH: &str = "account.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Per-run settings: environment first, CLI flags layered on top.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Explicit storage directory. `None` means `state/<source>`.
    pub base_dir: Option<PathBuf>,
    pub history_days: i64,
    pub http_timeout: Duration,
    pub account_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: None,
            history_days: DEFAULT_SPAN_DAYS,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            account_path: PathBuf::from(DEFAULT_ACCOUNT_PATH),
        }
    }
}

impl Settings {
    /// Read `N4A_*` variables; unset or unparsable values keep defaults.
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Some(dir) = std::env::var_os(ENV_BASE_DIR).filter(|v| !v.is_empty()) {
            s.base_dir = Some(PathBuf::from(dir));
        }
        if let Some(days) = env_parse::<i64>(ENV_HISTORY_DAYS).filter(|d| *d > 0) {
            s.history_days = days;
        }
        if let Some(secs) = env_parse::<u64>(ENV_HTTP_TIMEOUT_SECS).filter(|s| *s > 0) {
            s.http_timeout = Duration::from_secs(secs);
        }
        if let Some(p) = std::env::var_os(ENV_ACCOUNT_PATH).filter(|v| !v.is_empty()) {
            s.account_path = PathBuf::from(p);
        }
        s
    }

    /// Where `etags.json` and `last_update.json` live for `source`.
    pub fn storage_dir(&self, source: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => Path::new(DEFAULT_STATE_ROOT).join(source),
        }
    }

    pub fn http_client(&self) -> anyhow::Result<Client> {
        Client::builder()
            .timeout(self.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
