use anyhow::{Context, Result};
use reqwest::Client;

use super::Notifier;
use crate::config::account::AccountConfig;

/// Posts a public status to a Mastodon-compatible instance.
pub struct MastodonNotifier {
    account: AccountConfig,
    client: Client,
}

impl MastodonNotifier {
    pub fn new(account: AccountConfig, client: Client) -> Self {
        Self { account, client }
    }

    fn statuses_url(&self) -> String {
        format!("{}/api/v1/statuses", self.account.url)
    }
}

#[async_trait::async_trait]
impl Notifier for MastodonNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let url = self.statuses_url();
        self.client
            .post(&url)
            .bearer_auth(&self.account.token)
            .form(&[("status", text)])
            .send()
            .await
            .with_context(|| format!("post status to {url}"))?
            .error_for_status()
            .context("status post non-2xx")?;
        tracing::info!(instance = %self.account.url, chars = text.chars().count(), "status posted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mastodon"
    }
}
