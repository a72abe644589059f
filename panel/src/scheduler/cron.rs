//! Cron due-calculator
//!
//! Pure functions over `(expression, reference instant)`. Expressions use the
//! crontab dialect: five fields (minute hour day-of-month month day-of-week,
//! day-of-week 0-7 with both 0 and 7 meaning Sunday) or the `@reboot`
//! sentinel. They are evaluated by the `cron` crate after prefixing a zero
//! seconds field and translating day-of-week numerals into names. When both
//! day fields are restricted a fire matches either one, as in crontab.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use ::cron::Schedule;
use std::str::FromStr;

use crate::constants::scheduler::REBOOT_SENTINEL;
use crate::errors::ScheduleError;

const DAY_NAMES: [&str; 8] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// Fire instants around a reference: `prev <= reference < next`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireWindow {
    pub prev: DateTime<Utc>,
    pub next: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum CronExpression {
    /// Fires once when the scheduler starts, never through polling
    Reboot,
    /// One schedule, or two when day-of-month and day-of-week are both
    /// restricted: crontab fires when either day field matches
    Recurring {
        expression: String,
        schedules: Vec<Schedule>,
    },
}

impl CronExpression {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let trimmed = expression.trim();
        if trimmed.eq_ignore_ascii_case(REBOOT_SENTINEL) {
            return Ok(CronExpression::Reboot);
        }

        let invalid = |reason: String| ScheduleError::InvalidExpression {
            expression: trimmed.to_string(),
            reason,
        };

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(format!(
                "expected 5 fields (minute hour day-of-month month day-of-week), got {}",
                fields.len()
            )));
        }

        let (minute, hour, day_of_month, month) = (fields[0], fields[1], fields[2], fields[3]);
        let day_of_week = translate_day_of_week(fields[4]).map_err(invalid)?;

        let day_fields = if is_unrestricted(day_of_month) || is_unrestricted(fields[4]) {
            vec![(day_of_month, day_of_week.as_str())]
        } else {
            vec![(day_of_month, "*"), ("*", day_of_week.as_str())]
        };

        let schedules = day_fields
            .into_iter()
            .map(|(dom, dow)| {
                let normalized = format!("0 {} {} {} {} {}", minute, hour, dom, month, dow);
                Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CronExpression::Recurring {
            expression: trimmed.to_string(),
            schedules,
        })
    }

    pub fn is_reboot(&self) -> bool {
        matches!(self, CronExpression::Reboot)
    }

    /// Previous and next fire instants around `reference`, evaluated in `tz`.
    /// `Ok(None)` for `@reboot`, which has no recurring window.
    pub fn fire_window(
        &self,
        reference: DateTime<Utc>,
        tz: Tz,
    ) -> Result<Option<FireWindow>, ScheduleError> {
        let (expression, schedules) = match self {
            CronExpression::Reboot => return Ok(None),
            CronExpression::Recurring {
                expression,
                schedules,
            } => (expression, schedules),
        };

        let local = reference.with_timezone(&tz);
        let prev = schedules.iter().filter_map(|s| prev_fire(s, local)).max();
        let next = schedules.iter().filter_map(|s| next_fire(s, local)).min();

        match (prev, next) {
            (Some(prev), Some(next)) => Ok(Some(FireWindow {
                prev: prev.with_timezone(&Utc),
                next: next.with_timezone(&Utc),
            })),
            _ => Err(ScheduleError::NoOccurrence {
                expression: expression.clone(),
            }),
        }
    }
}

/// Parse and evaluate in one step
pub fn fire_window(
    expression: &str,
    reference: DateTime<Utc>,
    tz: Tz,
) -> Result<Option<FireWindow>, ScheduleError> {
    CronExpression::parse(expression)?.fire_window(reference, tz)
}

/// Latest fire at or before `local`
fn prev_fire(schedule: &Schedule, local: DateTime<Tz>) -> Option<DateTime<Tz>> {
    // fire instants are whole seconds: searching backwards from the next
    // whole second finds the latest fire at or before the reference
    let search_from = local.with_nanosecond(0).unwrap_or(local) + Duration::seconds(1);
    schedule
        .after(&search_from)
        .rev()
        .find(|candidate| *candidate <= local)
}

/// Earliest fire strictly after `local`
fn next_fire(schedule: &Schedule, local: DateTime<Tz>) -> Option<DateTime<Tz>> {
    schedule.after(&local).find(|candidate| *candidate > local)
}

fn is_unrestricted(field: &str) -> bool {
    matches!(field.trim(), "*" | "?")
}

fn translate_day_of_week(field: &str) -> Result<String, String> {
    let items = field
        .split(',')
        .map(translate_day_of_week_item)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items.join(","))
}

fn translate_day_of_week_item(item: &str) -> Result<String, String> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };

    if let Some(step) = step {
        if let Some(days) = expand_numeric_step(range, step)? {
            return Ok(days.join(","));
        }
    }

    let range = if range == "*" || range == "?" {
        range.to_string()
    } else if let Some((start, end)) = range.split_once('-') {
        let start = day_name(start)?;
        if end.trim() == "7" && step.is_none() && start != "SUN" {
            // 5-7 means Friday through Sunday; the crate ranges cannot wrap
            return Ok(format!("{}-SAT,SUN", start));
        }
        let end = if end.trim() == "7" { "SAT" } else { day_name(end)? };
        format!("{}-{}", start, end)
    } else {
        day_name(range)?.to_string()
    };

    Ok(match step {
        Some(step) => format!("{}/{}", range, step),
        None => range,
    })
}

/// `1-7/2` or `3/2` as an explicit list of day names. `None` when the range
/// is `*` or uses names, which the crate steps through itself.
fn expand_numeric_step(range: &str, step: &str) -> Result<Option<Vec<&'static str>>, String> {
    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start.trim(), end.trim()),
        None => (range.trim(), "7"),
    };
    let (Ok(start), Ok(end)) = (start.parse::<usize>(), end.parse::<usize>()) else {
        return Ok(None);
    };

    let step = step
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|step| *step > 0)
        .ok_or_else(|| format!("invalid day-of-week step '{}'", step))?;
    if start > end || end >= DAY_NAMES.len() {
        return Err(format!("day-of-week range {}-{} is outside 0-7", start, end));
    }

    let mut days: Vec<&'static str> = Vec::new();
    for day in (start..=end).step_by(step) {
        let name = DAY_NAMES[day];
        if !days.contains(&name) {
            days.push(name);
        }
    }
    Ok(Some(days))
}

fn day_name(token: &str) -> Result<&str, String> {
    let token = token.trim();
    if let Ok(n) = token.parse::<usize>() {
        return DAY_NAMES
            .get(n)
            .copied()
            .ok_or_else(|| format!("day-of-week {} is outside 0-7", n));
    }
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(token);
    }
    Err(format!("invalid day-of-week '{}'", token))
}
