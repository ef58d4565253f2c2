//! parse.rs - Turns the published CSV into a lazy stream of `Record`s.
//!
//! Rows come out in file order (publishers put the newest model run first).
//! Only rows matching the source predicate are converted; anything malformed
//! in a selected row fails the run instead of being skipped.

use std::collections::BTreeMap;
use std::io::Read;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use thiserror::Error;

use crate::sources::SourceConfig;

/// Upstream data that cannot be trusted. Always fatal for the run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("line {line}: bad date {value:?} for format {format:?}")]
    BadDate {
        line: u64,
        value: String,
        format: String,
    },
    #[error("line {line}: non-numeric value {value:?} in column {column}")]
    BadNumber {
        line: u64,
        column: String,
        value: String,
    },
    #[error("no rows match the source predicate")]
    NoRows,
    #[error("only one distinct date published; nothing to compare against")]
    ShortHistory,
    #[error("dates out of order: {later} follows {earlier}")]
    OutOfOrder { earlier: NaiveDate, later: NaiveDate },
}

/// One model observation: a calendar day and its metric values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

impl Record {
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }
}

/// Forward-only iterator over the selected rows of one fetched body.
///
/// Consumed once; getting the rows again means fetching again.
pub struct Records<R: Read> {
    rows: csv::StringRecordsIntoIter<R>,
    filters: Vec<(usize, String)>,
    date_idx: usize,
    date_format: String,
    metrics: Vec<(String, String, usize)>,
}

/// Resolve the header row against `source` and return the row stream.
pub fn records<R: Read>(source: &SourceConfig, reader: R) -> Result<Records<R>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("reading csv header row")?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()).into())
    };

    let filters = source
        .predicate
        .iter()
        .map(|(col, want)| -> Result<(usize, String)> { Ok((column(col)?, want.clone())) })
        .collect::<Result<Vec<_>>>()?;
    let date_idx = column(&source.date_column)?;
    let metrics = source
        .metrics
        .iter()
        .map(|m| -> Result<(String, String, usize)> {
            Ok((m.name.clone(), m.column.clone(), column(&m.column)?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Records {
        rows: rdr.into_records(),
        filters,
        date_idx,
        date_format: source.date_format.clone(),
        metrics,
    })
}

impl<R: Read> Records<R> {
    fn selected(&self, row: &csv::StringRecord) -> bool {
        self.filters
            .iter()
            .all(|(idx, want)| row.get(*idx) == Some(want.as_str()))
    }

    fn convert(&self, row: &csv::StringRecord) -> Result<Record> {
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let raw_date = row.get(self.date_idx).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, &self.date_format).map_err(|_| {
            DataError::BadDate {
                line,
                value: raw_date.to_string(),
                format: self.date_format.clone(),
            }
        })?;

        let mut values = BTreeMap::new();
        for (name, column, idx) in &self.metrics {
            let raw = row.get(*idx).unwrap_or_default();
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DataError::BadNumber {
                    line,
                    column: column.clone(),
                    value: raw.to_string(),
                })?;
            values.insert(name.clone(), value);
        }

        Ok(Record { date, values })
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e).context("reading csv row")),
            };
            if self.selected(&row) {
                return Some(self.convert(&row));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ValueFormat;

    const TOPLINE: &str = "\
president,subgroup,modeldate,approve_estimate,disapprove_estimate
Trump,Voters,1/22/2018,40.1,55.2
Trump,All polls,1/22/2018,39.95,55.01
Trump,Adults,1/22/2018,38.3,56.9
Trump,All polls,1/21/2018,39.8,55.4
";

    fn topline_source() -> SourceConfig {
        SourceConfig::new("t", "http://x/t.csv", "http://x/")
            .require("subgroup", "All polls")
            .with_date("modeldate", "%m/%d/%Y")
            .metric("approve", "approve_estimate", ValueFormat::OneDecimalPercent)
            .metric("disapprove", "disapprove_estimate", ValueFormat::OneDecimalPercent)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn predicate_selects_only_matching_rows_in_file_order() {
        let recs: Vec<Record> = records(&topline_source(), TOPLINE.as_bytes())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].date, day(2018, 1, 22));
        assert_eq!(recs[0].value("approve"), Some(39.95));
        assert_eq!(recs[0].value("disapprove"), Some(55.01));
        assert_eq!(recs[1].date, day(2018, 1, 21));
    }

    #[test]
    fn empty_predicate_selects_every_row() {
        let mut src = topline_source();
        src.predicate.clear();
        let n = records(&src, TOPLINE.as_bytes()).unwrap().count();
        assert_eq!(n, 4);
    }

    #[test]
    fn stream_can_stop_after_first_record() {
        let mut it = records(&topline_source(), TOPLINE.as_bytes()).unwrap();
        let first = it.next().unwrap().unwrap();
        assert_eq!(first.date, day(2018, 1, 22));
        // the rest is still there for the history pass
        let second = it.next().unwrap().unwrap();
        assert_eq!(second.date, day(2018, 1, 21));
        assert!(it.next().is_none());
    }

    #[test]
    fn unselected_garbage_rows_are_never_parsed() {
        let csv = "\
subgroup,modeldate,approve_estimate,disapprove_estimate
Voters,not a date,x,y
All polls,1/2/2018,40,55
";
        let recs: Vec<Record> = records(&topline_source(), csv.as_bytes())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn malformed_date_fails() {
        let csv = "subgroup,modeldate,approve_estimate,disapprove_estimate\nAll polls,2018-01-02,40,55\n";
        let err = records(&topline_source(), csv.as_bytes())
            .unwrap()
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::BadDate { line: 2, .. })
        ));
    }

    #[test]
    fn non_numeric_metric_fails() {
        for bad in ["", "n/a", "NaN"] {
            let csv = format!(
                "subgroup,modeldate,approve_estimate,disapprove_estimate\nAll polls,1/2/2018,40,{bad}\n"
            );
            let err = records(&topline_source(), csv.as_bytes())
                .unwrap()
                .next()
                .unwrap()
                .unwrap_err();
            match err.downcast_ref::<DataError>() {
                Some(DataError::BadNumber { column, .. }) => {
                    assert_eq!(column, "disapprove_estimate")
                }
                other => panic!("expected BadNumber for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_column_is_reported_up_front() {
        let csv = "subgroup,modeldate,approve_estimate\nAll polls,1/2/2018,40\n";
        let err = records(&topline_source(), csv.as_bytes()).err().unwrap();
        match err.downcast_ref::<DataError>() {
            Some(DataError::MissingColumn(c)) => assert_eq!(c, "disapprove_estimate"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
