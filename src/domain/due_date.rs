//! Due-date resolution from relative date phrases.
//!
//! Phrase rules run first, against the lowercased text. The first rule whose
//! trigger is present decides the outcome, even when it yields no date. DATE
//! entities are consulted only when the phrase rules produced nothing.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use super::nlp::Doc;

static IN_N_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"in (\d+) days").expect("valid in-N-days pattern"));

struct DateRule {
    name: &'static str,
    applies: fn(&str) -> bool,
    resolve: fn(&str, NaiveDate) -> Option<NaiveDate>,
}

/// Evaluated top to bottom, first applicable rule wins.
const DATE_RULES: &[DateRule] = &[
    DateRule {
        name: "today",
        applies: mentions_today,
        resolve: same_day,
    },
    DateRule {
        name: "tomorrow",
        applies: mentions_tomorrow,
        resolve: next_day,
    },
    DateRule {
        name: "next week",
        applies: mentions_next_week,
        resolve: one_week_later,
    },
    DateRule {
        name: "in N days",
        applies: mentions_in_days,
        resolve: in_n_days,
    },
    DateRule {
        name: "next monday",
        applies: mentions_next_monday,
        resolve: next_monday,
    },
    DateRule {
        name: "next tuesday",
        applies: mentions_next_tuesday,
        resolve: next_tuesday,
    },
];

fn mentions_today(text: &str) -> bool {
    text.contains("today") || text.contains("end of day")
}

fn mentions_tomorrow(text: &str) -> bool {
    text.contains("tomorrow")
}

fn mentions_next_week(text: &str) -> bool {
    text.contains("next week")
}

fn mentions_in_days(text: &str) -> bool {
    text.contains("in") && text.contains("days")
}

fn mentions_next_monday(text: &str) -> bool {
    text.contains("next monday")
}

fn mentions_next_tuesday(text: &str) -> bool {
    text.contains("next tuesday")
}

fn same_day(_: &str, today: NaiveDate) -> Option<NaiveDate> {
    Some(today)
}

fn next_day(_: &str, today: NaiveDate) -> Option<NaiveDate> {
    today.checked_add_days(Days::new(1))
}

fn one_week_later(_: &str, today: NaiveDate) -> Option<NaiveDate> {
    today.checked_add_days(Days::new(7))
}

fn in_n_days(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let days: u64 = IN_N_DAYS.captures(text)?.get(1)?.as_str().parse().ok()?;
    today.checked_add_days(Days::new(days))
}

fn next_monday(_: &str, today: NaiveDate) -> Option<NaiveDate> {
    next_weekday(today, Weekday::Mon)
}

fn next_tuesday(_: &str, today: NaiveDate) -> Option<NaiveDate> {
    next_weekday(today, Weekday::Tue)
}

/// Next occurrence of `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let current = today.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    let ahead = match (target + 7 - current) % 7 {
        0 => 7,
        n => n,
    };
    today.checked_add_days(Days::new(u64::from(ahead)))
}

/// Narrower match on a DATE entity's own text.
fn resolve_entity(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.contains("next") && text.contains("day") {
        next_day(text, today)
    } else if text.contains("today") {
        Some(today)
    } else if text.contains("tomorrow") {
        next_day(text, today)
    } else {
        None
    }
}

/// Resolve the due date of an analyzed task description relative to `today`.
pub fn resolve(doc: &Doc, today: NaiveDate) -> Option<NaiveDate> {
    let from_rules = DATE_RULES
        .iter()
        .find(|rule| (rule.applies)(&doc.text))
        .and_then(|rule| {
            let date = (rule.resolve)(&doc.text, today);
            tracing::trace!(rule = rule.name, ?date, "Due-date rule matched");
            date
        });

    from_rules.or_else(|| doc.dates().find_map(|entity| resolve_entity(&entity.text, today)))
}
