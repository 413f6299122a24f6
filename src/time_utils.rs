use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};
use tracing::{debug, trace};

use crate::{AppError, AppResult};

pub(crate) const DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");

/// Resolve the local UTC offset, falling back to UTC.
///
/// Reading the offset is only sound while the process is single-threaded, so
/// this has to run before the runtime or the log layers start any threads.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or_else(|e| {
        debug!("Unable to determine the local UTC offset, using UTC: {}", e);
        UtcOffset::UTC
    })
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> AppResult<Date> {
    Date::parse(input.trim(), DATE_FORMAT).map_err(|e| {
        debug!("Rejected date {:?}: {}", input, e);
        AppError::InvalidDate {
            input: input.to_string(),
        }
    })
}

/// The calendar day before today, as seen at `offset`.
#[tracing::instrument(level = "trace")]
pub fn yesterday(offset: UtcOffset) -> Date {
    let today = OffsetDateTime::now_utc().to_offset(offset).date();
    let date = today.previous_day().unwrap_or(today);
    trace!("Calculated yesterday's date: {}", date);
    date
}

/// Convert a unix timestamp in seconds to a datetime at `offset`.
pub fn unix_seconds_to_datetime(secs: i64, offset: UtcOffset) -> AppResult<OffsetDateTime> {
    Ok(OffsetDateTime::from_unix_timestamp(secs)?.to_offset(offset))
}

/// `HH:MM` wall clock time of a timestamp.
pub fn clock(ts: &OffsetDateTime) -> String {
    format!("{:02}:{:02}", ts.hour(), ts.minute())
}

/// Half-open range `[date 00:00, date+1 00:00)` at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub date: Date,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DayWindow {
    pub fn new(date: Date, offset: UtcOffset) -> Self {
        let start = date.with_time(Time::MIDNIGHT).assume_offset(offset);
        Self {
            date,
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn contains(&self, ts: &OffsetDateTime) -> bool {
        self.start <= *ts && *ts < self.end
    }

    pub fn offset(&self) -> UtcOffset {
        self.start.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2024-06-01").unwrap(), date!(2024 - 06 - 01));
        assert_eq!(parse_date(" 2024-06-01\n").unwrap(), date!(2024 - 06 - 01));
    }

    #[test]
    fn rejects_malformed_dates() {
        for input in ["2024-13-45", "2024-02-30", "06/01/2024", "2024-6-1", "", "yesterday"] {
            match parse_date(input) {
                Err(AppError::InvalidDate { input: rejected }) => assert_eq!(rejected, input),
                other => panic!("expected InvalidDate for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn window_is_half_open() {
        let window = DayWindow::new(date!(2024 - 06 - 01), UtcOffset::UTC);
        assert!(window.contains(&datetime!(2024-06-01 00:00 UTC)));
        assert!(window.contains(&datetime!(2024-06-01 23:59:59 UTC)));
        assert!(!window.contains(&datetime!(2024-06-02 00:00 UTC)));
        assert!(!window.contains(&datetime!(2024-05-31 23:59:59 UTC)));
    }

    #[test]
    fn window_honours_offset() {
        let window = DayWindow::new(date!(2024 - 06 - 01), offset!(+2));
        assert_eq!(window.start, datetime!(2024-05-31 22:00 UTC));
        assert!(window.contains(&datetime!(2024-06-01 21:30 UTC)));
        assert!(!window.contains(&datetime!(2024-06-01 22:00 UTC)));
        assert_eq!(window.offset(), offset!(+2));
    }

    #[test]
    fn converts_unix_seconds_at_offset() {
        let ts = unix_seconds_to_datetime(1_717_236_000, offset!(+2)).unwrap();
        assert_eq!(ts, datetime!(2024-06-01 10:00 UTC));
        assert_eq!(clock(&ts), "12:00");
    }

    #[test]
    fn yesterday_is_one_day_back() {
        let today = OffsetDateTime::now_utc().date();
        let diff = today - yesterday(UtcOffset::UTC);
        assert!(diff == Duration::days(1) || diff == Duration::ZERO);
    }
}
