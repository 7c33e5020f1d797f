//! Calendar helpers: Friday-ending weeks, month ends and business days.
//!
//! Business days are Monday to Friday; exchange holidays are not modelled.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

/// The Friday closing the week `date` belongs to. Saturday and Sunday roll
/// into the following week.
pub fn week_ending_friday(date: NaiveDate) -> NaiveDate {
    let from_monday = date.weekday().num_days_from_monday() as i64;
    let until_friday = (4 - from_monday).rem_euclid(7);
    date + Duration::days(until_friday)
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// True on the last calendar day of a month.
pub fn is_calendar_month_end(date: NaiveDate) -> bool {
    date.succ_opt().is_none_or(|next| next.month() != date.month())
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// Last Monday-to-Friday day of `date`'s month.
pub fn last_business_day_of_month(date: NaiveDate) -> NaiveDate {
    let mut day = last_day_of_month(date);
    while !is_business_day(day) {
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    day
}

pub fn is_business_month_end(date: NaiveDate) -> bool {
    date == last_business_day_of_month(date)
}

/// The nearest business month end on or after `date`. A date after its
/// month's last business day rolls to the next month's.
pub fn business_month_end_on_or_after(date: NaiveDate) -> NaiveDate {
    let this_month = last_business_day_of_month(date);
    if date <= this_month {
        return this_month;
    }
    match date
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
    {
        Some(next_month) => last_business_day_of_month(next_month),
        None => this_month,
    }
}

/// Steps back `count` business days from `date`.
pub fn sub_business_days(date: NaiveDate, count: u32) -> NaiveDate {
    let mut day = date;
    let mut remaining = count;
    while remaining > 0 {
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
        if is_business_day(day) {
            remaining -= 1;
        }
    }
    day
}
