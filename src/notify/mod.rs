// src/notify/mod.rs
pub mod mastodon;

use anyhow::Result;

pub use mastodon::MastodonNotifier;

/// Delivers a finished report somewhere.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Print-only mode: the report goes to stdout, nothing is posted.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait::async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
