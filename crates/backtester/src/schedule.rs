//! The buy-schedule predicate that decides which calendar days qualify for a
//! scheduled purchase.

use chrono::{Datelike, NaiveDate};
use core_types::Frequency;

/// Whether `date` is a scheduled buy day for a plan anchored at `start`.
///
/// Monthly schedules buy on the start's day-of-month; when a month is too
/// short to contain that day, the buy happens on the month's last day
/// instead. The rollover applies only when the start day exceeds the current
/// month's length, so a plan anchored on the 15th never buys on the 28th.
pub fn should_buy(date: NaiveDate, start: NaiveDate, frequency: Frequency) -> bool {
    let elapsed_days = (date - start).num_days();

    match frequency {
        Frequency::Daily => true,
        Frequency::Weekly => elapsed_days % 7 == 0,
        Frequency::Biweekly => elapsed_days % 14 == 0,
        Frequency::Monthly => {
            let month_len = days_in_month(date.year(), date.month());
            date.day() == start.day() || (date.day() == month_len && start.day() > month_len)
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // The day before the first of the next month is the last of this one.
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_buys_every_day() {
        let start = date(2024, 1, 1);
        assert!(should_buy(start, start, Frequency::Daily));
        assert!(should_buy(date(2024, 1, 2), start, Frequency::Daily));
        assert!(should_buy(date(2024, 2, 29), start, Frequency::Daily));
    }

    #[test]
    fn weekly_buys_on_seven_day_offsets() {
        let start = date(2024, 1, 1);
        let expected = [
            date(2024, 1, 1),
            date(2024, 1, 8),
            date(2024, 1, 15),
            date(2024, 1, 22),
            date(2024, 1, 29),
        ];

        let mut actual = Vec::new();
        let mut current = start;
        while current <= date(2024, 1, 30) {
            if should_buy(current, start, Frequency::Weekly) {
                actual.push(current);
            }
            current = current.succ_opt().unwrap();
        }
        assert_eq!(actual, expected);
    }

    #[test]
    fn biweekly_buys_on_fourteen_day_offsets() {
        let start = date(2024, 1, 1);
        assert!(should_buy(date(2024, 1, 15), start, Frequency::Biweekly));
        assert!(!should_buy(date(2024, 1, 8), start, Frequency::Biweekly));
        assert!(should_buy(date(2024, 1, 29), start, Frequency::Biweekly));
    }

    #[test]
    fn monthly_buys_on_anchor_day() {
        let start = date(2024, 1, 15);
        assert!(should_buy(date(2024, 2, 15), start, Frequency::Monthly));
        assert!(!should_buy(date(2024, 2, 14), start, Frequency::Monthly));
        // A plan anchored mid-month never triggers the end-of-month rollover.
        assert!(!should_buy(date(2024, 2, 29), start, Frequency::Monthly));
    }

    #[test]
    fn monthly_rolls_over_when_month_is_short() {
        let start = date(2024, 1, 31);
        // February 2024 has 29 days, so the buy lands on the 29th.
        assert!(should_buy(date(2024, 2, 29), start, Frequency::Monthly));
        assert!(!should_buy(date(2024, 2, 28), start, Frequency::Monthly));
        // April has 30 days.
        assert!(should_buy(date(2024, 4, 30), start, Frequency::Monthly));
        // March has a 31st, so no rollover applies there.
        assert!(should_buy(date(2024, 3, 31), start, Frequency::Monthly));
        assert!(!should_buy(date(2024, 3, 30), start, Frequency::Monthly));
    }

    #[test]
    fn days_in_month_handles_leap_years_and_december() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
    }
}
