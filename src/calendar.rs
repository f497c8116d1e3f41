//! Calendar arithmetic shared by the reports and recurring transactions.

use time::{Date, Duration, Month};

/// The number of days in `month` of `year`.
pub fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February if is_leap_year(year) => 29,
        Month::February => 28,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// The first day of the month `date` falls in.
pub fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// The last day of the month `date` falls in.
pub fn month_end(date: Date) -> Date {
    date.replace_day(last_day_of_month(date.year(), date.month()))
        .unwrap_or(date)
}

/// The Monday on or before `date`.
pub fn week_start(date: Date) -> Date {
    let days_since_monday = date.weekday().number_days_from_monday() as i64;

    date - Duration::days(days_since_monday)
}

/// The date `months` calendar months after the month of `date`, on `day`.
///
/// `day` is clamped to the last day of the target month, so the 31st of
/// January plus one month is the 28th (or 29th) of February.
/// Returns `None` if the result is outside the range `time` supports.
pub fn add_months(date: Date, months: i64, day: u8) -> Option<Date> {
    let month_index = date.year() as i64 * 12 + (date.month() as i64 - 1) + months;
    let year = i32::try_from(month_index.div_euclid(12)).ok()?;
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;
    let day = day.clamp(1, last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).ok()
}

/// A short label for a day, e.g. "5 Jan 2026".
pub fn day_label(date: Date) -> String {
    format!(
        "{} {} {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

/// A short label for a month, e.g. "Jan 2026".
pub fn month_label(date: Date) -> String {
    format!("{} {}", month_abbrev(date.month()), date.year())
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use super::{
        add_months, day_label, last_day_of_month, month_end, month_label, month_start, week_start,
    };

    #[test]
    fn february_has_29_days_in_leap_years() {
        assert_eq!(last_day_of_month(2024, Month::February), 29);
        assert_eq!(last_day_of_month(2025, Month::February), 28);
        assert_eq!(last_day_of_month(1900, Month::February), 28);
        assert_eq!(last_day_of_month(2000, Month::February), 29);
    }

    #[test]
    fn month_bounds() {
        assert_eq!(month_start(date!(2026 - 04 - 17)), date!(2026 - 04 - 01));
        assert_eq!(month_end(date!(2026 - 04 - 17)), date!(2026 - 04 - 30));
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2026-01-01 is a Thursday.
        assert_eq!(week_start(date!(2026 - 01 - 01)), date!(2025 - 12 - 29));
        assert_eq!(week_start(date!(2025 - 12 - 29)), date!(2025 - 12 - 29));
        assert_eq!(week_start(date!(2026 - 01 - 04)), date!(2025 - 12 - 29));
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        let start = date!(2026 - 01 - 31);

        assert_eq!(add_months(start, 1, 31), Some(date!(2026 - 02 - 28)));
        assert_eq!(add_months(start, 2, 31), Some(date!(2026 - 03 - 31)));
        assert_eq!(add_months(start, 3, 31), Some(date!(2026 - 04 - 30)));
    }

    #[test]
    fn add_months_crosses_years() {
        assert_eq!(
            add_months(date!(2025 - 11 - 15), 3, 15),
            Some(date!(2026 - 02 - 15))
        );
        assert_eq!(
            add_months(date!(2024 - 02 - 29), 12, 29),
            Some(date!(2025 - 02 - 28))
        );
    }

    #[test]
    fn labels() {
        assert_eq!(day_label(date!(2026 - 01 - 05)), "5 Jan 2026");
        assert_eq!(month_label(date!(2026 - 12 - 05)), "Dec 2026");
    }
}
