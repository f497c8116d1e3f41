//! How often recurring transactions happen and the dates they happen on.

use std::{collections::HashSet, fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{Error, calendar::add_months};

/// The most occurrences a single generate request may create.
pub const MAX_OCCURRENCES: usize = 1000;

/// How often a recurring transaction happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Fortnightly,
    /// A calendar month of variable length.
    Monthly,
    /// Every three calendar months.
    Quarterly,
    Yearly,
}

impl Frequency {
    fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Fortnightly => "fortnightly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The date of the `n`-th occurrence, counting the start date as the zeroth.
    ///
    /// Month based frequencies keep the day of `start`, clamped to the last
    /// day of shorter months. Returns `None` if the date is out of range.
    pub fn nth_occurrence(self, start: Date, n: i64) -> Option<Date> {
        let add_days = |days: i64| start.checked_add(Duration::days(days));

        match self {
            Frequency::Daily => add_days(n),
            Frequency::Weekly => add_days(7 * n),
            Frequency::Fortnightly => add_days(14 * n),
            Frequency::Monthly => add_months(start, n, start.day()),
            Frequency::Quarterly => add_months(start, 3 * n, start.day()),
            Frequency::Yearly => add_months(start, 12 * n, start.day()),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "fortnightly" => Ok(Frequency::Fortnightly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(format!("{s} is not a valid frequency")),
        }
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// Every occurrence from `start` up to and including `last` that is not in `existing`.
///
/// # Errors
/// Returns [Error::InvalidField] if there would be more than [MAX_OCCURRENCES]
/// occurrences missing from `existing`.
pub fn occurrences(
    frequency: Frequency,
    start: Date,
    last: Date,
    existing: &HashSet<Date>,
) -> Result<Vec<Date>, Error> {
    let mut dates = Vec::new();

    for n in 0.. {
        let Some(date) = frequency.nth_occurrence(start, n) else {
            break;
        };

        if date > last {
            break;
        }

        if existing.contains(&date) {
            continue;
        }

        if dates.len() == MAX_OCCURRENCES {
            return Err(Error::InvalidField {
                field: "until",
                reason: format!("would create more than {MAX_OCCURRENCES} transactions"),
            });
        }

        dates.push(date);
    }

    Ok(dates)
}
