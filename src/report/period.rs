//! Splitting a report's date range into period buckets.

use serde::Serialize;
use time::{Date, Duration};

use crate::calendar::{day_label, month_end, month_label, month_start, week_start};

use super::filter::{Granularity, ReportFilter};

/// One bucket of a period based report.
///
/// `start` and `end` are clamped to the report's date range, so the first
/// and last buckets may be shorter than a full week or month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    /// A short display label, e.g. "Jan 2026".
    pub label: String,
    pub start: Date,
    pub end: Date,
}

/// The first day of the bucket `date` falls in.
pub fn bucket_start(date: Date, granularity: Granularity) -> Date {
    match granularity {
        Granularity::Daily => date,
        Granularity::Weekly => week_start(date),
        Granularity::Monthly => month_start(date),
    }
}

fn bucket_end(start: Date, granularity: Granularity) -> Date {
    match granularity {
        Granularity::Daily => start,
        Granularity::Weekly => start.saturating_add(Duration::days(6)),
        Granularity::Monthly => month_end(start),
    }
}

fn bucket_label(start: Date, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => day_label(start),
        Granularity::Weekly => format!("Week of {}", day_label(start)),
        Granularity::Monthly => month_label(start),
    }
}

/// Every bucket in the filter's date range in chronological order, including
/// buckets that have no transactions.
pub fn period_buckets(filter: &ReportFilter) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut cursor = bucket_start(filter.start_date, filter.granularity);

    while cursor <= filter.end_date {
        let end = bucket_end(cursor, filter.granularity);

        periods.push(Period {
            label: bucket_label(cursor, filter.granularity),
            start: cursor.max(filter.start_date),
            end: end.min(filter.end_date),
        });

        match end.next_day() {
            Some(next) => cursor = next,
            None => break,
        }
    }

    periods
}

/// The index of the period that contains `date`, if any.
pub(crate) fn period_index(periods: &[Period], date: Date) -> Option<usize> {
    let index = periods.partition_point(|period| period.end < date);

    periods
        .get(index)
        .filter(|period| period.start <= date)
        .map(|_| index)
}
