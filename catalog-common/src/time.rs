//! Timestamp utilities

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current calendar date in server local time
///
/// Visit records are keyed by this date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
