//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds), evaluated in UTC.
//! Per field: *, */N, N, A-B, A-B/N, and comma lists of those.
//! Example: "0 8 * * *" = every day at 8:00

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use keepalive_core::error::{KeepaliveError, Result};

/// How far ahead to search before giving up (covers Feb 29 schedules).
const SEARCH_DAYS: u32 = 366 * 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    minutes: Vec<u32>,
    hours: Vec<u32>,
    days: Vec<u32>,
    months: Vec<u32>,
    weekdays: Vec<u32>,
    any_day: bool,
    any_weekday: bool,
}

impl CronExpr {
    pub fn parse(expression: &str) -> Result<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(invalid(expression, "need 5 fields: MIN HOUR DOM MON DOW"));
        }

        let field = |i: usize, min: u32, max: u32| {
            parse_field(parts[i], min, max).ok_or_else(|| invalid(expression, parts[i]))
        };
        let mut weekdays = field(4, 0, 7)?;
        // 7 is Sunday too.
        for d in weekdays.iter_mut() {
            if *d == 7 {
                *d = 0;
            }
        }
        weekdays.sort_unstable();
        weekdays.dedup();

        Ok(Self {
            minutes: field(0, 0, 59)?,
            hours: field(1, 0, 23)?,
            days: field(2, 1, 31)?,
            months: field(3, 1, 12)?,
            weekdays,
            any_day: parts[2] == "*",
            any_weekday: parts[4] == "*",
        })
    }

    /// Classic cron rule: when both DOM and DOW are restricted, either may match.
    fn day_matches(&self, date: NaiveDate) -> bool {
        if !self.months.contains(&date.month()) {
            return false;
        }
        let dom = self.days.contains(&date.day());
        let dow = self.weekdays.contains(&date.weekday().num_days_from_sunday());
        match (self.any_day, self.any_weekday) {
            (true, true) => true,
            (true, false) => dow,
            (false, true) => dom,
            (false, false) => dom || dow,
        }
    }

    /// First matching minute strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after + Duration::minutes(1);
        let start = start.with_second(0)?.with_nanosecond(0)?;

        let mut date = start.date_naive();
        for _ in 0..SEARCH_DAYS {
            if self.day_matches(date) {
                for &h in &self.hours {
                    for &m in &self.minutes {
                        let candidate = date.and_hms_opt(h, m, 0)?.and_utc();
                        if candidate >= start {
                            return Some(candidate);
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }
        None
    }
}

fn invalid(expression: &str, reason: &str) -> KeepaliveError {
    KeepaliveError::Config(format!("Invalid cron expression '{expression}': {reason}"))
}

/// Parse a cron field into a sorted list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    let mut values = Vec::new();
    for item in field.split(',') {
        values.extend(parse_item(item.trim(), min, max)?);
    }
    values.sort_unstable();
    values.dedup();
    if values.is_empty() { None } else { Some(values) }
}

fn parse_item(item: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, step.parse::<usize>().ok().filter(|n| *n > 0)?),
        None => (item, 1),
    };

    let (lo, hi) = if range == "*" {
        (min, max)
    } else if let Some((a, b)) = range.split_once('-') {
        (a.parse().ok()?, b.parse().ok()?)
    } else {
        let n: u32 = range.parse().ok()?;
        // "N/step" means from N to the end of the range.
        if item.contains('/') { (n, max) } else { (n, n) }
    };

    if lo < min || hi > max || lo > hi {
        return None;
    }
    Some((lo..=hi).step_by(step).collect())
}
