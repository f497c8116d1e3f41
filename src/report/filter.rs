//! Parsing and validating the query parameters shared by every report.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::{month_end, month_start},
    database_id::DatabaseId,
};

/// The longest range, in days, that may be reported with daily buckets.
pub const MAX_DAILY_RANGE_DAYS: i64 = 366;

/// The size of the period buckets in a report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    /// Weeks start on Monday.
    Weekly,
    #[default]
    Monthly,
}

/// The accounting basis of a report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Transactions count on the date they were paid, or are due if unpaid.
    #[default]
    Cash,
    /// Transactions count on their competence date.
    Accrual,
}

/// The raw report query parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub granularity: Option<Granularity>,
    pub regime: Option<Regime>,
    pub include_unpaid: Option<bool>,
    /// Comma separated category IDs.
    pub category_ids: Option<String>,
    /// Comma separated account IDs.
    pub account_ids: Option<String>,
}

/// A validated report filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFilter {
    /// The first day of the report, inclusive.
    pub start_date: Date,
    /// The last day of the report, inclusive.
    pub end_date: Date,
    pub granularity: Granularity,
    pub regime: Regime,
    /// Whether unpaid transactions are counted.
    pub include_unpaid: bool,
    /// Only count transactions in these categories.
    pub category_ids: Option<Vec<DatabaseId>>,
    /// Only count transactions of these bank accounts.
    pub account_ids: Option<Vec<DatabaseId>>,
}

impl ReportFilter {
    /// Validate `query` and fill in defaults.
    ///
    /// Without dates the report covers the month of `today`. If only one of
    /// the dates is given, the other is the start or end of that date's month.
    ///
    /// # Errors
    /// Returns [Error::InvalidReportFilter] if the start date is after the end
    /// date, a daily report spans more than [MAX_DAILY_RANGE_DAYS] days, or an
    /// ID list contains something other than integers.
    pub fn from_query(query: ReportQuery, today: Date) -> Result<Self, Error> {
        let (start_date, end_date) = match (query.start_date, query.end_date) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, month_end(start)),
            (None, Some(end)) => (month_start(end), end),
            (None, None) => (month_start(today), month_end(today)),
        };

        if start_date > end_date {
            return Err(Error::InvalidReportFilter(format!(
                "start_date {start_date} is after end_date {end_date}"
            )));
        }

        let granularity = query.granularity.unwrap_or_default();
        let day_count = (end_date - start_date).whole_days() + 1;
        if granularity == Granularity::Daily && day_count > MAX_DAILY_RANGE_DAYS {
            return Err(Error::InvalidReportFilter(format!(
                "daily reports may cover at most {MAX_DAILY_RANGE_DAYS} days, got {day_count}"
            )));
        }

        Ok(Self {
            start_date,
            end_date,
            granularity,
            regime: query.regime.unwrap_or_default(),
            include_unpaid: query.include_unpaid.unwrap_or(false),
            category_ids: parse_ids("category_ids", query.category_ids.as_deref())?,
            account_ids: parse_ids("account_ids", query.account_ids.as_deref())?,
        })
    }
}

fn parse_ids(field: &str, raw: Option<&str>) -> Result<Option<Vec<DatabaseId>>, Error> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<DatabaseId>().map_err(|_| {
                Error::InvalidReportFilter(format!("{field} contains \"{part}\", expected an ID"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((!ids.is_empty()).then_some(ids))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{Granularity, Regime, ReportFilter, ReportQuery};

    const TODAY: time::Date = date!(2026 - 02 - 14);

    #[test]
    fn defaults_to_current_month() {
        let filter = ReportFilter::from_query(ReportQuery::default(), TODAY).unwrap();

        assert_eq!(filter.start_date, date!(2026 - 02 - 01));
        assert_eq!(filter.end_date, date!(2026 - 02 - 28));
        assert_eq!(filter.granularity, Granularity::Monthly);
        assert_eq!(filter.regime, Regime::Cash);
        assert!(!filter.include_unpaid);
        assert_eq!(filter.category_ids, None);
    }

    #[test]
    fn missing_end_date_is_end_of_start_month() {
        let query = ReportQuery {
            start_date: Some(date!(2025 - 12 - 10)),
            ..Default::default()
        };

        let filter = ReportFilter::from_query(query, TODAY).unwrap();

        assert_eq!(filter.end_date, date!(2025 - 12 - 31));
    }

    #[test]
    fn missing_start_date_is_start_of_end_month() {
        let query = ReportQuery {
            end_date: Some(date!(2025 - 12 - 10)),
            ..Default::default()
        };

        let filter = ReportFilter::from_query(query, TODAY).unwrap();

        assert_eq!(filter.start_date, date!(2025 - 12 - 01));
    }

    #[test]
    fn start_after_end_is_rejected() {
        let query = ReportQuery {
            start_date: Some(date!(2026 - 03 - 01)),
            end_date: Some(date!(2026 - 02 - 01)),
            ..Default::default()
        };

        assert!(matches!(
            ReportFilter::from_query(query, TODAY),
            Err(Error::InvalidReportFilter(_))
        ));
    }

    #[test]
    fn daily_range_is_limited() {
        let query = |end_date| ReportQuery {
            start_date: Some(date!(2024 - 01 - 01)),
            end_date: Some(end_date),
            granularity: Some(Granularity::Daily),
            ..Default::default()
        };

        // 2024 is a leap year, so it has exactly 366 days.
        assert!(ReportFilter::from_query(query(date!(2024 - 12 - 31)), TODAY).is_ok());
        assert!(ReportFilter::from_query(query(date!(2025 - 01 - 01)), TODAY).is_err());
    }

    #[test]
    fn long_monthly_range_is_allowed() {
        let query = ReportQuery {
            start_date: Some(date!(2020 - 01 - 01)),
            end_date: Some(date!(2026 - 12 - 31)),
            ..Default::default()
        };

        assert!(ReportFilter::from_query(query, TODAY).is_ok());
    }

    #[test]
    fn parses_id_lists() {
        let query = ReportQuery {
            category_ids: Some("1, 2,,3".to_owned()),
            account_ids: Some("".to_owned()),
            ..Default::default()
        };

        let filter = ReportFilter::from_query(query, TODAY).unwrap();

        assert_eq!(filter.category_ids, Some(vec![1, 2, 3]));
        assert_eq!(filter.account_ids, None);
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let query = ReportQuery {
            account_ids: Some("1,abc".to_owned()),
            ..Default::default()
        };

        assert!(matches!(
            ReportFilter::from_query(query, TODAY),
            Err(Error::InvalidReportFilter(_))
        ));
    }
}
