//! Five-field cron expressions evaluated in UTC.
//!
//! Format: `minute hour day-of-month month day-of-week`. Each field accepts
//! `*`, single values, ranges (`1-5`), lists (`1,3,5`) and steps (`*/15`,
//! `10-40/10`, `5/20`). Months and weekdays also accept three-letter names,
//! and weekday `7` is Sunday like `0`.
//!
//! When both day-of-month and day-of-week are restricted (neither starts
//! with `*`), a day matches if *either* field matches.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use std::time::Duration;

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const WEEKDAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Any satisfiable day/month combination recurs within this many years
/// (Feb 29 skips 2100).
const SEARCH_YEARS: i32 = 9;

/// Set of allowed values of one field, one bit per value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet(u64);

impl FieldSet {
    fn contains(&self, value: u32) -> bool {
        value < 64 && self.0 & (1u64 << value) != 0
    }

    fn insert(&mut self, value: u32) {
        self.0 |= 1u64 << value;
    }
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    /// First value of `names`
    names_start: u32,
}

const MINUTE: FieldSpec = FieldSpec {
    name: "minute",
    min: 0,
    max: 59,
    names: &[],
    names_start: 0,
};
const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    min: 0,
    max: 23,
    names: &[],
    names_start: 0,
};
const DAY_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
    names_start: 0,
};
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &MONTH_NAMES,
    names_start: 1,
};
// 7 is accepted and folded onto 0 after parsing
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: &WEEKDAY_NAMES,
    names_start: 0,
};

impl FieldSpec {
    fn value(&self, token: &str) -> Result<u32> {
        let lower = token.to_ascii_lowercase();
        if let Some(pos) = self.names.iter().position(|n| *n == lower) {
            return Ok(self.names_start + pos as u32);
        }

        let value: u32 = token
            .parse()
            .with_context(|| format!("invalid {} value '{}'", self.name, token))?;
        if value < self.min || value > self.max {
            bail!("{} value {} outside {}-{}", self.name, value, self.min, self.max);
        }
        Ok(value)
    }

    fn parse(&self, field: &str) -> Result<FieldSet> {
        let mut set = FieldSet(0);

        for item in field.split(',') {
            let (base, step) = match item.split_once('/') {
                Some((base, step)) => {
                    let step: u32 = step
                        .parse()
                        .with_context(|| format!("invalid {} step '{}'", self.name, step))?;
                    if step == 0 {
                        bail!("{} step must be positive", self.name);
                    }
                    (base, Some(step))
                }
                None => (item, None),
            };

            let (start, end) = if base == "*" {
                (self.min, self.max)
            } else if let Some((lo, hi)) = base.split_once('-') {
                (self.value(lo)?, self.value(hi)?)
            } else {
                let value = self.value(base)?;
                // `5/20` means from 5 to the end of the range
                (value, if step.is_some() { self.max } else { value })
            };

            if start > end {
                bail!("{} range {}-{} is reversed", self.name, start, end);
            }

            let step = step.unwrap_or(1) as usize;
            for value in (start..=end).step_by(step) {
                set.insert(value);
            }
        }

        Ok(set)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CronFields {
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronFields {
    fn parse(expression: &str) -> Result<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            bail!("cron expression must have 5 fields: '{}'", expression);
        }

        let mut days_of_week = DAY_OF_WEEK.parse(parts[4])?;
        if days_of_week.contains(7) {
            days_of_week.insert(0);
        }

        Ok(Self {
            minutes: MINUTE.parse(parts[0])?,
            hours: HOUR.parse(parts[1])?,
            days_of_month: DAY_OF_MONTH.parse(parts[2])?,
            months: MONTH.parse(parts[3])?,
            days_of_week,
            dom_restricted: !parts[2].starts_with('*'),
            dow_restricted: !parts[4].starts_with('*'),
        })
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = self.days_of_month.contains(date.day());
        let dow = self.days_of_week.contains(date.weekday().num_days_from_sunday());

        match (self.dom_restricted, self.dow_restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }

    /// First matching minute strictly after `after`
    fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut t = after
            .date()
            .and_hms_opt(after.hour(), after.minute(), 0)?
            .checked_add_signed(TimeDelta::minutes(1))?;
        let limit = after.year() + SEARCH_YEARS;

        while t.year() <= limit {
            let date = t.date();

            if !self.months.contains(t.month()) {
                let (year, month) = if t.month() == 12 {
                    (t.year() + 1, 1)
                } else {
                    (t.year(), t.month() + 1)
                };
                t = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
                continue;
            }

            if !self.day_matches(date) {
                t = date.succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }

            if !self.hours.contains(t.hour()) {
                t = date.and_hms_opt(t.hour(), 0, 0)?.checked_add_signed(TimeDelta::hours(1))?;
                continue;
            }

            if !self.minutes.contains(t.minute()) {
                t = t.checked_add_signed(TimeDelta::minutes(1))?;
                continue;
            }

            return Some(t);
        }

        None
    }
}

/// A parsed cron expression plus the last fire instant it handed out
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    fields: CronFields,
    last_computed_fire: Option<DateTime<Utc>>,
}

impl CronSchedule {
    /// Parse `expression`, rejecting ones that can never fire (e.g. `0 0 30 2 *`)
    pub fn parse(expression: &str) -> Result<Self> {
        let fields = CronFields::parse(expression)?;

        let probe = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .context("invalid probe date")?;
        if fields.next_after(probe).is_none() {
            bail!("cron expression never fires: '{}'", expression);
        }

        Ok(Self {
            expression: expression.trim().to_string(),
            fields,
            last_computed_fire: None,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn last_computed_fire(&self) -> Option<DateTime<Utc>> {
        self.last_computed_fire
    }

    /// Smallest matching instant strictly after `now`. Pure.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.fields
            .next_after(now.naive_utc())
            .map(|t| t.and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Next fire instant after `now`, never earlier than or equal to the
    /// previously returned one. A clock that wakes slightly before the fire
    /// instant therefore cannot get the same instant twice.
    pub fn next_fire(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let reference = match self.last_computed_fire {
            Some(last) if last > now => last,
            _ => now,
        };
        let next = self.next_after(reference);
        self.last_computed_fire = Some(next);
        next
    }

    /// Time from `now` until [`Self::next_fire`]; always greater than zero
    pub fn seconds_until_next(&mut self, now: DateTime<Utc>) -> Duration {
        let next = self.next_fire(now);
        until(next, now)
    }
}

fn until(next: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (next - now)
        .to_std()
        .unwrap_or_default()
        .max(Duration::from_millis(1))
}

/// Next instant strictly after `now` matching `expression`
pub fn next_fire(expression: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    Ok(CronSchedule::parse(expression)?.next_after(now))
}

/// `next_fire(expression, now) - now`
pub fn seconds_until_next(expression: &str, now: DateTime<Utc>) -> Result<Duration> {
    let next = next_fire(expression, now)?;
    Ok(until(next, now))
}
