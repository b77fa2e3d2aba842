//! Streak statistics over sparse day marks.
//!
//! Only green days count. Runs are measured in calendar days, so an unmarked
//! or red day between two green days breaks the run. All arithmetic is on
//! [`NaiveDate`], which has no time-of-day or zone to drift across DST.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::data::{DayMap, DayState};

/// Derived streak counts for one habit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakStats {
    /// Consecutive green days ending at `last_green`
    pub current: u32,
    /// Longest run of consecutive green days ever recorded
    pub longest: u32,
    /// Most recent green day on or before today
    pub last_green: Option<NaiveDate>,
}

impl StreakStats {
    /// True if the current streak can still be extended today, i.e. its last
    /// green day is today or yesterday.
    pub fn is_alive(&self, today: NaiveDate) -> bool {
        self.last_green
            .is_some_and(|last| last == today || last + Duration::days(1) == today)
    }
}

/// Compute current and longest streaks.
///
/// The longest streak covers every green day, including days marked ahead of
/// `today`. The current streak is anchored at the latest green day on or
/// before `today`, not at `today` itself: a habit completed yesterday but not
/// yet today still reports its run.
pub fn compute_stats(data: &DayMap, today: NaiveDate) -> StreakStats {
    let greens: BTreeSet<NaiveDate> = data
        .iter()
        .filter(|(_, state)| **state == DayState::Green)
        .map(|(date, _)| *date)
        .collect();

    let mut longest = 0;
    let mut temp = 0;
    let mut prev: Option<NaiveDate> = None;
    for &date in &greens {
        temp = match prev {
            Some(p) if (date - p).num_days() == 1 => temp + 1,
            _ => 1,
        };
        longest = longest.max(temp);
        prev = Some(date);
    }

    let last_green = greens.range(..=today).next_back().copied();

    let mut current = 0;
    let mut cursor = last_green;
    while let Some(day) = cursor.filter(|d| greens.contains(d)) {
        current += 1;
        cursor = day.pred_opt();
    }

    StreakStats {
        current,
        longest,
        last_green,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::data::parse_date;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn marks(entries: &[(&str, DayState)]) -> DayMap {
        entries.iter().map(|(d, s)| (date(d), *s)).collect()
    }

    fn today() -> NaiveDate {
        date("2024-06-01")
    }

    #[test]
    fn test_empty() {
        let stats = compute_stats(&DayMap::new(), today());
        assert_eq!(stats, StreakStats::default());
        assert_eq!((stats.current, stats.longest), (0, 0));
    }

    #[test]
    fn test_three_consecutive() {
        let data = marks(&[
            ("2024-01-01", DayState::Green),
            ("2024-01-02", DayState::Green),
            ("2024-01-03", DayState::Green),
        ]);
        let stats = compute_stats(&data, date("2024-01-03"));
        assert_eq!((stats.current, stats.longest), (3, 3));
        assert_eq!(stats.last_green, Some(date("2024-01-03")));
    }

    #[test]
    fn test_gap_breaks_run() {
        let data = marks(&[
            ("2024-01-01", DayState::Green),
            ("2024-01-03", DayState::Green),
        ]);
        let stats = compute_stats(&data, today());
        assert_eq!((stats.current, stats.longest), (1, 1));
    }

    #[test]
    fn test_red_day_between_greens() {
        let data = marks(&[
            ("2024-01-01", DayState::Green),
            ("2024-01-02", DayState::Red),
            ("2024-01-03", DayState::Green),
            ("2024-01-04", DayState::Green),
        ]);
        let stats = compute_stats(&data, today());
        assert_eq!((stats.current, stats.longest), (2, 2));
    }

    #[test]
    fn test_current_shorter_than_longest() {
        let data = marks(&[
            ("2024-03-01", DayState::Green),
            ("2024-03-02", DayState::Green),
            ("2024-03-03", DayState::Green),
            ("2024-03-04", DayState::Green),
            ("2024-03-10", DayState::Green),
            ("2024-03-11", DayState::Green),
            ("2024-03-12", DayState::Red),
        ]);
        let stats = compute_stats(&data, today());
        assert_eq!(stats.longest, 4);
        assert_eq!(stats.current, 2);
        assert_eq!(stats.last_green, Some(date("2024-03-11")));
    }

    #[test]
    fn test_only_red_days() {
        let data = marks(&[
            ("2024-01-01", DayState::Red),
            ("2024-01-02", DayState::Red),
        ]);
        assert_eq!(compute_stats(&data, today()), StreakStats::default());
    }

    #[test]
    fn test_runs_across_month_and_leap_day() {
        let data = marks(&[
            ("2024-02-28", DayState::Green),
            ("2024-02-29", DayState::Green),
            ("2024-03-01", DayState::Green),
        ]);
        let stats = compute_stats(&data, today());
        assert_eq!((stats.current, stats.longest), (3, 3));
    }

    #[test]
    fn test_runs_across_year_boundary() {
        let data = marks(&[
            ("2023-12-30", DayState::Green),
            ("2023-12-31", DayState::Green),
            ("2024-01-01", DayState::Green),
        ]);
        assert_eq!(compute_stats(&data, today()).current, 3);
    }

    #[test]
    fn test_future_days_count_toward_longest_only() {
        let data = marks(&[
            ("2024-01-01", DayState::Green),
            ("2024-01-02", DayState::Green),
            ("2024-01-03", DayState::Green),
        ]);
        let stats = compute_stats(&data, date("2024-01-01"));
        assert_eq!(stats.longest, 3);
        assert_eq!(stats.current, 1);
        assert_eq!(stats.last_green, Some(date("2024-01-01")));
    }

    #[test]
    fn test_only_future_days() {
        let data = marks(&[
            ("2024-01-05", DayState::Green),
            ("2024-01-06", DayState::Green),
        ]);
        let stats = compute_stats(&data, date("2024-01-02"));
        assert_eq!((stats.current, stats.longest), (0, 2));
        assert_eq!(stats.last_green, None);
    }

    #[test]
    fn test_is_alive() {
        let data = marks(&[("2024-01-10", DayState::Green)]);
        let stats = compute_stats(&data, date("2024-01-11"));
        assert!(stats.is_alive(date("2024-01-10")));
        assert!(stats.is_alive(date("2024-01-11")));
        assert!(!stats.is_alive(date("2024-01-12")));
        assert!(!StreakStats::default().is_alive(date("2024-01-12")));
    }

    fn arb_marks() -> impl Strategy<Value = DayMap> {
        let base = date("2024-01-01");
        prop::collection::btree_map(
            (0i64..120).prop_map(move |offset| base + Duration::days(offset)),
            prop_oneof![Just(DayState::Green), Just(DayState::Red)],
            0..60,
        )
    }

    proptest! {
        #[test]
        fn prop_longest_ignores_today(data in arb_marks(), offset in 0i64..120) {
            let early = date("2024-01-01") + Duration::days(offset);
            prop_assert_eq!(
                compute_stats(&data, early).longest,
                compute_stats(&data, today()).longest
            );
        }

        #[test]
        fn prop_current_never_exceeds_longest(data in arb_marks()) {
            let stats = compute_stats(&data, today());
            prop_assert!(stats.current <= stats.longest);
        }

        #[test]
        fn prop_longest_bounded_by_green_count(data in arb_marks()) {
            let greens = data.values().filter(|s| **s == DayState::Green).count() as u32;
            let stats = compute_stats(&data, today());
            prop_assert!(stats.longest <= greens);
            prop_assert_eq!(stats.current > 0, greens > 0);
        }

        #[test]
        fn prop_red_days_do_not_change_stats(data in arb_marks()) {
            let greens_only: DayMap = data
                .iter()
                .filter(|(_, s)| **s == DayState::Green)
                .map(|(d, s)| (*d, *s))
                .collect();
            prop_assert_eq!(compute_stats(&data, today()), compute_stats(&greens_only, today()));
        }
    }
}
