//! Dates, clock times and durations

use crate::format::{format_date, format_number, DisplayOptions};
use chrono::{NaiveDate, NaiveTime, Timelike};
use std::collections::BTreeMap;
use std::fmt;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Time zone attached to a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Zone {
    Utc,
    #[default]
    Local,
    /// Fixed offset east of UTC, in seconds
    Offset(i32),
}

/// A calendar date, optionally with a time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub zone: Zone,
}

impl DateValue {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            time: None,
            zone: Zone::Local,
        }
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    pub fn to_display(&self, options: &DisplayOptions) -> String {
        let mut out = format_date(self.date, options);
        if let Some(time) = self.time {
            out.push('T');
            if time.second() == 0 && time.nanosecond() == 0 {
                out.push_str(&time.format("%H:%M").to_string());
            } else {
                out.push_str(&time.format("%H:%M:%S").to_string());
            }
            match self.zone {
                Zone::Utc => out.push('Z'),
                Zone::Local => {}
                Zone::Offset(seconds) => {
                    let sign = if seconds < 0 { '-' } else { '+' };
                    let minutes = seconds.abs() / 60;
                    out.push_str(&format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60));
                }
            }
        }
        out
    }
}

/// A clock time, as seconds since midnight, plus how many days a shift
/// rolled it over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeOfDay {
    seconds: f64,
    day_offset: i64,
}

impl TimeOfDay {
    /// Create from seconds since midnight; values outside one day wrap and
    /// count as rollover.
    pub fn from_seconds(seconds: f64) -> Self {
        let days = (seconds / SECONDS_PER_DAY).floor();
        Self {
            seconds: seconds - days * SECONDS_PER_DAY,
            day_offset: days as i64,
        }
    }

    pub fn from_hms(hour: u32, minute: u32, second: f64) -> Self {
        Self::from_seconds(hour as f64 * 3600.0 + minute as f64 * 60.0 + second)
    }

    pub fn with_day_offset(mut self, day_offset: i64) -> Self {
        self.day_offset = day_offset;
        self
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn day_offset(&self) -> i64 {
        self.day_offset
    }

    /// Seconds since midnight of day zero, counting rollover
    pub fn absolute_seconds(&self) -> f64 {
        self.day_offset as f64 * SECONDS_PER_DAY + self.seconds
    }

    pub fn hour(&self) -> u32 {
        (self.seconds / 3600.0) as u32
    }

    pub fn minute(&self) -> u32 {
        ((self.seconds % 3600.0) / 60.0) as u32
    }

    pub fn second(&self) -> f64 {
        self.seconds % 60.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())?;
        let second = self.second();
        if second != 0.0 {
            write!(f, ":{:02}", second.round() as u32)?;
        }
        match self.day_offset {
            0 => Ok(()),
            1 => f.write_str(" (+1 day)"),
            -1 => f.write_str(" (-1 day)"),
            n => write!(f, " ({:+} days)", n),
        }
    }
}

/// Calendar and clock units a duration is made of, largest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DurationUnit {
    Years,
    Months,
    Weeks,
    Days,
    BusinessDays,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl DurationUnit {
    pub const ALL: [DurationUnit; 9] = [
        DurationUnit::Years,
        DurationUnit::Months,
        DurationUnit::Weeks,
        DurationUnit::Days,
        DurationUnit::BusinessDays,
        DurationUnit::Hours,
        DurationUnit::Minutes,
        DurationUnit::Seconds,
        DurationUnit::Milliseconds,
    ];

    /// Length in seconds; a year is 365.25 days and a business day counts as
    /// one day.
    pub fn seconds(&self) -> f64 {
        match self {
            DurationUnit::Years => 365.25 * SECONDS_PER_DAY,
            DurationUnit::Months => 365.25 * SECONDS_PER_DAY / 12.0,
            DurationUnit::Weeks => 7.0 * SECONDS_PER_DAY,
            DurationUnit::Days | DurationUnit::BusinessDays => SECONDS_PER_DAY,
            DurationUnit::Hours => 3600.0,
            DurationUnit::Minutes => 60.0,
            DurationUnit::Seconds => 1.0,
            DurationUnit::Milliseconds => 0.001,
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            DurationUnit::Years => "year",
            DurationUnit::Months => "month",
            DurationUnit::Weeks => "week",
            DurationUnit::Days => "day",
            DurationUnit::BusinessDays => "business day",
            DurationUnit::Hours => "hour",
            DurationUnit::Minutes => "minute",
            DurationUnit::Seconds => "second",
            DurationUnit::Milliseconds => "millisecond",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            DurationUnit::Years => "years",
            DurationUnit::Months => "months",
            DurationUnit::Weeks => "weeks",
            DurationUnit::Days => "days",
            DurationUnit::BusinessDays => "business days",
            DurationUnit::Hours => "hours",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Seconds => "seconds",
            DurationUnit::Milliseconds => "milliseconds",
        }
    }

    /// Parse a spelled-out unit word (`day`, `Hours`, `business days`)
    pub fn from_word(word: &str) -> Option<Self> {
        let word = word.trim().to_lowercase();
        let word = word.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|unit| unit.singular() == word || unit.plural() == word)
    }

    /// Check if the unit has a fixed length in seconds
    pub fn is_clock(&self) -> bool {
        matches!(
            self,
            DurationUnit::Hours
                | DurationUnit::Minutes
                | DurationUnit::Seconds
                | DurationUnit::Milliseconds
        )
    }
}

/// A span of time kept per unit (`1 month 2 days` is not folded into days)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Duration {
    parts: BTreeMap<DurationUnit, f64>,
}

impl Duration {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn of(unit: DurationUnit, amount: f64) -> Self {
        Self::zero().and(unit, amount)
    }

    /// Split a number of seconds into days, hours, minutes and seconds
    pub fn from_seconds(total: f64) -> Self {
        let sign = if total < 0.0 { -1.0 } else { 1.0 };
        let mut rest = total.abs();
        let mut duration = Self::zero();
        for unit in [DurationUnit::Days, DurationUnit::Hours, DurationUnit::Minutes] {
            let whole = (rest / unit.seconds()).floor();
            if whole > 0.0 {
                duration = duration.and(unit, sign * whole);
                rest -= whole * unit.seconds();
            }
        }
        // float noise below a microsecond is not worth a "seconds" part
        if rest > 1e-6 || duration.parts.is_empty() {
            duration = duration.and(DurationUnit::Seconds, sign * rest);
        }
        duration
    }

    /// Add `amount` of `unit` to this duration
    pub fn and(mut self, unit: DurationUnit, amount: f64) -> Self {
        let entry = self.parts.entry(unit).or_insert(0.0);
        *entry += amount;
        if *entry == 0.0 {
            self.parts.remove(&unit);
        }
        self
    }

    pub fn get(&self, unit: DurationUnit) -> f64 {
        self.parts.get(&unit).copied().unwrap_or(0.0)
    }

    pub fn parts(&self) -> impl Iterator<Item = (DurationUnit, f64)> + '_ {
        self.parts.iter().map(|(u, v)| (*u, *v))
    }

    pub fn is_zero(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total length in seconds
    pub fn total_seconds(&self) -> f64 {
        self.parts.iter().map(|(u, v)| u.seconds() * v).sum()
    }

    /// Componentwise sum
    pub fn plus(&self, other: &Duration) -> Duration {
        other
            .parts()
            .fold(self.clone(), |acc, (unit, amount)| acc.and(unit, amount))
    }

    pub fn negated(&self) -> Duration {
        self.scaled(-1.0)
    }

    /// Every component multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Duration {
        self.map(|v| v * factor)
    }

    /// Apply `f` to every component
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Duration {
        self.parts()
            .fold(Duration::zero(), |acc, (unit, amount)| acc.and(unit, f(amount)))
    }

    /// Check if every component has a fixed length in seconds
    pub fn is_clock_only(&self) -> bool {
        self.parts.keys().all(|u| u.is_clock())
    }

    pub fn to_display(&self, options: &DisplayOptions) -> String {
        if self.parts.is_empty() {
            return "0 seconds".to_string();
        }
        self.parts
            .iter()
            .map(|(unit, amount)| {
                let name = if *amount == 1.0 {
                    unit.singular()
                } else {
                    unit.plural()
                };
                format!("{} {}", format_number(*amount, options), name)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
