//! history.rs - Recent distinct-date window used for deltas and sparklines.

use anyhow::Result;

use crate::parse::{DataError, Record};

/// Default span covered by the window, in days.
pub const DEFAULT_SPAN_DAYS: i64 = 7;

/// Build `[latest, ...]` from the remaining records (newest first).
///
/// Consecutive records sharing a date keep only the first one seen. Pulling
/// stops right after the first record whose distance from `latest` reaches
/// `span_days`; that record is still included. Running out of records early
/// is fine.
pub fn build_history<I>(latest: Record, rest: I, span_days: i64) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let newest = latest.date;
    let mut history = vec![latest];

    for rec in rest {
        let rec = rec?;
        let last = history[history.len() - 1].date;
        if rec.date == last {
            continue;
        }
        if rec.date > last {
            return Err(DataError::OutOfOrder {
                earlier: last,
                later: rec.date,
            }
            .into());
        }

        let span = (newest - rec.date).num_days();
        history.push(rec);
        if span >= span_days {
            break;
        }
    }

    tracing::debug!(len = history.len(), "history window built");
    Ok(history)
}

/// The comparison record for deltas: the first distinct prior day.
pub fn baseline(history: &[Record]) -> Result<&Record> {
    history.get(1).ok_or_else(|| DataError::ShortHistory.into())
}
