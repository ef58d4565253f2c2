//! checkpoint.rs - Remembers what was last reported, at display precision.
//!
//! The fetch layer already skips byte-identical payloads (ETag). This second
//! gate catches republished models whose rounded numbers did not move.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde_json::Value;
use tokio::fs;

use crate::parse::Record;
use crate::sources::SourceConfig;

/// File name of the checkpoint inside a storage directory.
pub const LAST_UPDATE_FILE: &str = "last_update.json";

/// Key holding the record date as a UNIX timestamp (UTC midnight).
pub const DATE_KEY: &str = "modeldate";

pub type CheckpointValues = BTreeMap<String, Value>;

/// Reportable fingerprint of `rec`: its date plus every metric as displayed.
pub fn checkpoint_values(source: &SourceConfig, rec: &Record) -> CheckpointValues {
    let mut values = CheckpointValues::new();
    let ts = rec.date.and_time(NaiveTime::MIN).and_utc().timestamp();
    values.insert(DATE_KEY.to_string(), Value::from(ts));
    for m in &source.metrics {
        if let Some(v) = rec.value(&m.name) {
            values.insert(m.name.clone(), Value::from(m.format.render(v)));
        }
    }
    values
}

async fn read_state(path: &Path) -> Option<CheckpointValues> {
    let raw = match fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(path = %path.display(), "no readable checkpoint: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring corrupt checkpoint: {e}");
            None
        }
    }
}

/// Compare `values` with the stored state, then store `values`.
///
/// Returns `true` when there was no readable prior state or any key differs.
/// The file is rewritten whatever the outcome.
pub async fn checkpoint(path: &Path, values: &CheckpointValues) -> Result<bool> {
    let changed = match read_state(path).await {
        None => true,
        Some(old) => values.iter().any(|(k, v)| old.get(k) != Some(v)),
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let body = serde_json::to_vec_pretty(values).context("encoding checkpoint")?;
    fs::write(path, body)
        .await
        .with_context(|| format!("writing checkpoint {}", path.display()))?;

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ValueFormat;
    use chrono::NaiveDate;

    fn values(approve: &str) -> CheckpointValues {
        CheckpointValues::from([
            (DATE_KEY.to_string(), Value::from(1_704_240_000_i64)),
            ("approve".to_string(), Value::from(approve)),
        ])
    }

    #[tokio::test]
    async fn first_call_changed_then_repeat_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(LAST_UPDATE_FILE);

        assert!(checkpoint(&path, &values("43.6%")).await.unwrap());
        assert!(!checkpoint(&path, &values("43.6%")).await.unwrap());
        assert!(checkpoint(&path, &values("43.7%")).await.unwrap());
    }

    #[tokio::test]
    async fn store_holds_the_latest_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(LAST_UPDATE_FILE);

        checkpoint(&path, &values("40.0%")).await.unwrap();
        checkpoint(&path, &values("41.0%")).await.unwrap();

        let stored: CheckpointValues =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored, values("41.0%"));
    }

    #[tokio::test]
    async fn corrupt_or_partial_state_counts_as_changed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(LAST_UPDATE_FILE);

        std::fs::write(&path, "{not json").unwrap();
        assert!(checkpoint(&path, &values("40.0%")).await.unwrap());

        // prior state lacking a key is a change too
        std::fs::write(&path, r#"{"modeldate": 1704240000}"#).unwrap();
        assert!(checkpoint(&path, &values("40.0%")).await.unwrap());
    }

    #[test]
    fn fingerprint_uses_display_precision() {
        let src = SourceConfig::new("t", "u", "l")
            .metric("approve", "a", ValueFormat::OneDecimalPercent);
        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let a = Record {
            date: day,
            values: BTreeMap::from([("approve".to_string(), 43.6012)]),
        };
        let b = Record {
            date: day,
            values: BTreeMap::from([("approve".to_string(), 43.5988)]),
        };
        assert_eq!(checkpoint_values(&src, &a), checkpoint_values(&src, &b));
        assert_eq!(checkpoint_values(&src, &a), values("43.6%"));
    }
}
