//! Daily sequential request identifiers.
//!
//! The next id is derived from the rows already in the ledger: count the ids
//! carrying today's `MMDDYY` prefix and add one. Two submissions racing on
//! the same day can read the same count and produce the same id.

use chrono::{Local, NaiveDate};

use crate::domain::RequestId;

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn date_prefix(today: NaiveDate) -> String {
    today.format("%m%d%y").to_string()
}

pub fn next_request_id<'a, I>(existing_ids: I, today: NaiveDate) -> RequestId
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = date_prefix(today);
    let count = existing_ids.into_iter().filter(|id| id.starts_with(&prefix)).count();
    RequestId(format!("{prefix}-{:02}", count + 1))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{date_prefix, next_request_id, Clock, FixedClock};

    fn day(year: i32, month: u32, date: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, date).expect("valid date")
    }

    #[test]
    fn prefix_is_month_day_two_digit_year() {
        assert_eq!(date_prefix(day(2025, 1, 1)), "010125");
        assert_eq!(date_prefix(day(2026, 10, 17)), "101726");
    }

    #[test]
    fn next_id_counts_only_todays_prefix() {
        let existing = ["010125-01", "010125-02", "010225-01"];
        let id = next_request_id(existing, day(2025, 1, 1));
        assert_eq!(id.as_str(), "010125-03");
    }

    #[test]
    fn first_id_of_the_day_starts_at_one() {
        let id = next_request_id(["123124-07", ""], day(2025, 1, 1));
        assert_eq!(id.as_str(), "010125-01");
    }

    #[test]
    fn counter_widens_past_ninety_nine() {
        let existing: Vec<String> = (1..=99).map(|n| format!("010125-{n:02}")).collect();
        let id = next_request_id(existing.iter().map(String::as_str), day(2025, 1, 1));
        assert_eq!(id.as_str(), "010125-100");
    }

    #[test]
    fn fixed_clock_reports_configured_day() {
        assert_eq!(FixedClock(day(2026, 10, 17)).today(), day(2026, 10, 17));
    }
}
