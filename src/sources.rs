//! sources.rs - Static registry of the published models we know how to read.
//!
//! Each source is one `SourceConfig` record: where the CSV lives, which rows
//! count (predicate), which columns become which metrics and how each metric
//! is displayed. Adding a source means adding one entry to `lookup`.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::report::round1;

/// Names accepted by `lookup`, in display order.
pub const SOURCE_NAMES: &[&str] = &["trump", "generic"];

/// Default source when the caller names none.
pub const DEFAULT_SOURCE: &str = "trump";

/// Raised for a source name missing from the registry.
#[derive(Debug, Error)]
#[error("unknown source '{name}' (known: {known})", known = SOURCE_NAMES.join(", "))]
pub struct UnknownSource {
    pub name: String,
}

/// How a metric value is rendered in the report and in the checkpoint.
///
/// Registry sources all publish tenths; `WholePercent` is for configs built
/// with `SourceConfig::new` around coarser models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// `43.6%`
    OneDecimalPercent,
    /// `44%`
    WholePercent,
}

impl ValueFormat {
    pub fn render(self, value: f64) -> String {
        match self {
            ValueFormat::OneDecimalPercent => format!("{:.1}%", round1(value)),
            ValueFormat::WholePercent => format!("{:.0}%", value.round()),
        }
    }
}

/// One reported metric: short display name, source column, display format.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub name: String,
    pub column: String,
    pub format: ValueFormat,
}

/// Everything needed to fetch, filter and describe one published model.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub name: String,
    /// CSV resource polled on every run.
    pub csv_url: String,
    /// Human-facing page appended to every report.
    pub link_url: String,
    /// Column → required value. Empty means every row matches.
    pub predicate: BTreeMap<String, String>,
    pub date_column: String,
    /// `chrono` strftime pattern for `date_column`.
    pub date_format: String,
    /// Reported metrics, in report order.
    pub metrics: Vec<MetricSpec>,
}

impl SourceConfig {
    pub fn new(
        name: impl Into<String>,
        csv_url: impl Into<String>,
        link_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            csv_url: csv_url.into(),
            link_url: link_url.into(),
            predicate: BTreeMap::new(),
            date_column: "date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            metrics: Vec::new(),
        }
    }

    /// Require `column == value` for a row to be selected (builder style).
    pub fn require(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicate.insert(column.into(), value.into());
        self
    }

    pub fn with_date(mut self, column: impl Into<String>, format: impl Into<String>) -> Self {
        self.date_column = column.into();
        self.date_format = format.into();
        self
    }

    pub fn metric(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        format: ValueFormat,
    ) -> Self {
        self.metrics.push(MetricSpec {
            name: name.into(),
            column: column.into(),
            format,
        });
        self
    }
}

/// Look up a registered source by name (case-insensitive).
pub fn lookup(name: &str) -> Result<SourceConfig, UnknownSource> {
    let cfg = match name.trim().to_ascii_lowercase().as_str() {
        "trump" => SourceConfig::new(
            "trump",
            "https://projects.fivethirtyeight.com/trump-approval-data/approval_topline.csv",
            "https://projects.fivethirtyeight.com/trump-approval-ratings/",
        )
        .require("subgroup", "All polls")
        .with_date("modeldate", "%m/%d/%Y")
        .metric("approve", "approve_estimate", ValueFormat::OneDecimalPercent)
        .metric("disapprove", "disapprove_estimate", ValueFormat::OneDecimalPercent),

        "generic" => SourceConfig::new(
            "generic",
            "https://projects.fivethirtyeight.com/generic-ballot-data/generic_topline.csv",
            "https://projects.fivethirtyeight.com/congress-generic-ballot-polls/",
        )
        .require("subgroup", "All polls")
        .with_date("modeldate", "%m/%d/%Y")
        .metric("democrats", "dem_estimate", ValueFormat::OneDecimalPercent)
        .metric("republicans", "rep_estimate", ValueFormat::OneDecimalPercent),

        _ => {
            return Err(UnknownSource {
                name: name.to_string(),
            })
        }
    };
    Ok(cfg)
}
