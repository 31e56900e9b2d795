//! Monthly billing-period boundaries.

use jiff::{Span, Timestamp, Zoned, tz::TimeZone};

/// The start of the calendar month (UTC) that `now` falls in.
pub fn current_period_start(now: Timestamp) -> Timestamp {
    let zoned: Zoned = now.to_zoned(TimeZone::UTC);
    let first_of_month = zoned.date().first_of_month();

    first_of_month.to_zoned(TimeZone::UTC).expect("first-of-month is always a valid civil datetime").timestamp()
}

/// One second before the start of the following calendar month — the last
/// instant covered by the period `period_start` opens.
pub fn period_end(period_start: Timestamp) -> Timestamp {
    let zoned: Zoned = period_start.to_zoned(TimeZone::UTC);
    let first_of_this_month = zoned.date().first_of_month();

    let first_of_next_month = first_of_this_month
        .checked_add(Span::new().months(1))
        .expect("adding one month to a first-of-month date never overflows the civil calendar");

    let next_period_start = first_of_next_month
        .to_zoned(TimeZone::UTC)
        .expect("first-of-month is always a valid civil datetime")
        .timestamp();

    next_period_start - jiff::SignedDuration::from_secs(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_start_truncates_to_first_of_month() {
        let now: Timestamp = "2026-03-17T12:34:56Z".parse().unwrap();
        let start = current_period_start(now);

        assert_eq!(start, "2026-03-01T00:00:00Z".parse().unwrap());
    }

    #[test]
    fn period_end_is_one_second_before_next_month() {
        let start: Timestamp = "2026-03-01T00:00:00Z".parse().unwrap();
        let end = period_end(start);

        assert_eq!(end, "2026-03-31T23:59:59Z".parse().unwrap());
    }

    #[test]
    fn period_end_handles_december_rollover() {
        let start: Timestamp = "2026-12-01T00:00:00Z".parse().unwrap();
        let end = period_end(start);

        assert_eq!(end, "2026-12-31T23:59:59Z".parse().unwrap());
    }
}
