use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::error::{Error, Result};
use crate::query::Period;

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Periods are labelled by their end time, so a day runs from the end of its
/// first period up to and including the following midnight.
pub(crate) fn day_window(d: NaiveDate, period: Period) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let midnight = d.and_time(NaiveTime::MIN).and_utc();
    let next = d
        .checked_add_days(Days::new(1))
        .ok_or_else(|| Error::InvalidRange {
            start: d.to_string(),
            end: "(out of range)".to_string(),
        })?
        .and_time(NaiveTime::MIN)
        .and_utc();
    Ok((midnight + period.duration(), next))
}
