//! runner.rs - One check of one source: fetch, parse, compare, render.
//!
//! Two gates sit in front of a report: the ETag (payload bytes changed) and
//! the checkpoint (displayed numbers changed). Both are normal exits.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::checkpoint::{checkpoint, checkpoint_values, LAST_UPDATE_FILE};
use crate::fetch::{fetch_if_modified, Fetch};
use crate::history::{baseline, build_history};
use crate::notify::Notifier;
use crate::parse::{records, DataError};
use crate::report;
use crate::sources::SourceConfig;

/// How a run ended. Only `Report` carries something to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream answered 304 for the stored ETag.
    NotModified,
    /// New payload, but the reportable values match the last checkpoint.
    NoChange,
    Report(String),
}

impl Outcome {
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Report(text) => Some(text),
            _ => None,
        }
    }
}

/// Run the change-detection pipeline for `source` against `storage_dir`.
pub async fn check_source(
    client: &Client,
    source: &SourceConfig,
    storage_dir: &Path,
    span_days: i64,
) -> Result<Outcome> {
    let body = match fetch_if_modified(client, storage_dir, &source.csv_url).await? {
        Fetch::Unchanged => return Ok(Outcome::NotModified),
        Fetch::Modified { body } => body,
    };

    let mut rows = records(source, body.as_bytes())
        .with_context(|| format!("parsing {}", source.csv_url))?;
    let latest = rows.next().ok_or(DataError::NoRows)??;
    let history = build_history(latest, rows, span_days)?;
    let latest = &history[0];
    let prior = baseline(&history)?;

    let values = checkpoint_values(source, latest);
    let changed = checkpoint(&storage_dir.join(LAST_UPDATE_FILE), &values).await?;
    if !changed {
        tracing::info!(source = %source.name, date = %latest.date, "no reportable change");
        return Ok(Outcome::NoChange);
    }

    let text = report::render(source, latest, prior, &history)?;
    tracing::info!(
        source = %source.name,
        date = %latest.date,
        baseline = %prior.date,
        window = history.len(),
        "report ready"
    );
    Ok(Outcome::Report(text))
}

/// Hand a finished message to `notifier`.
pub async fn deliver(notifier: &dyn Notifier, text: &str) -> Result<()> {
    tracing::debug!(via = notifier.name(), "delivering");
    notifier
        .send(text)
        .await
        .with_context(|| format!("delivering via {}", notifier.name()))
}
