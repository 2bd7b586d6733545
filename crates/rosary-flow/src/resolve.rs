// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Day-to-set resolver.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc, Weekday};
use rosary_core::{DayMatch, MysterySet};

/// The first set, by ascending id, whose day list matches `weekday`.
pub fn resolve<'a>(
    sets: &'a [MysterySet],
    weekday: &str,
    mode: DayMatch,
) -> Option<&'a MysterySet> {
    let weekday = weekday.trim().to_lowercase();
    if weekday.is_empty() {
        return None;
    }
    sets.iter()
        .filter(|set| day_matches(&set.days, &weekday, mode))
        .min_by_key(|set| set.id)
}

fn day_matches(days: &str, weekday: &str, mode: DayMatch) -> bool {
    let days = days.to_lowercase();
    match mode {
        DayMatch::Substring => days.contains(weekday),
        DayMatch::Exact => days.split(',').any(|token| token.trim() == weekday),
    }
}

/// English name of the weekday of `date`, e.g. `"Monday"`.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// The calendar date at `now` shifted by `utc_offset_minutes`.
pub fn today(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (now + TimeDelta::minutes(i64::from(utc_offset_minutes))).date_naive()
}
