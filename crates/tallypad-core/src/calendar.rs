//! Calendar arithmetic
//!
//! Dates and clock times never go through the arithmetic rule table; the
//! expression evaluator and the range generator call these functions
//! instead.

use crate::error::ValueError;
use crate::value::{DateValue, Duration, DurationUnit, TimeOfDay, Value, Zone, SECONDS_PER_DAY};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

/// More days than any representable date span
const MAX_DAYS: f64 = 1.0e9;

fn whole(amount: f64, what: &str) -> Result<i64, ValueError> {
    if !amount.is_finite() || amount.abs() > MAX_DAYS {
        return Err(out_of_range());
    }
    if amount.fract() != 0.0 {
        return Err(ValueError::runtime(format!(
            "cannot add a fractional number of {} to a date",
            what
        )));
    }
    Ok(amount as i64)
}

fn out_of_range() -> ValueError {
    ValueError::runtime("date out of range")
}

fn shift_months(date: NaiveDate, months: i64) -> Result<NaiveDate, ValueError> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?);
    let shifted = if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    };
    shifted.ok_or_else(out_of_range)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate, ValueError> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(out_of_range)
}

fn shift_business_days(mut date: NaiveDate, days: i64) -> Result<NaiveDate, ValueError> {
    let step = if days >= 0 { 1 } else { -1 };
    let mut remaining = days.abs();
    while remaining > 0 && is_weekend(date) {
        date = shift_days(date, step)?;
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    // from a weekday, every five business days is one calendar week
    if remaining >= 5 {
        date = shift_days(date, remaining / 5 * 7 * step)?;
        remaining %= 5;
    }
    while remaining > 0 {
        date = shift_days(date, step)?;
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    Ok(date)
}

/// Shift a date by a duration.
///
/// Months and years move along the calendar (clamping to the end of the
/// month), business days skip Saturdays and Sundays, and clock units give
/// the date a time of day if it had none.
pub fn add_duration(date: &DateValue, duration: &Duration) -> Value {
    match try_add(date, duration) {
        Ok(shifted) => Value::Date(shifted),
        Err(e) => Value::Error(e),
    }
}

fn try_add(date: &DateValue, duration: &Duration) -> Result<DateValue, ValueError> {
    let months = duration.get(DurationUnit::Years) * 12.0 + duration.get(DurationUnit::Months);
    let mut day = shift_months(date.date, whole(months, "months")?)?;
    day = shift_business_days(day, whole(duration.get(DurationUnit::BusinessDays), "business days")?)?;

    let days = duration.get(DurationUnit::Weeks) * 7.0 + duration.get(DurationUnit::Days);
    let clock_seconds: f64 = duration
        .parts()
        .filter(|(unit, _)| unit.is_clock())
        .map(|(unit, amount)| unit.seconds() * amount)
        .sum::<f64>()
        + days.fract() * SECONDS_PER_DAY;
    day = shift_days(day, whole(days.trunc(), "days")?)?;

    if clock_seconds == 0.0 {
        return Ok(DateValue { date: day, ..*date });
    }

    let start = NaiveDateTime::new(day, date.time.unwrap_or(NaiveTime::MIN));
    let millis = (clock_seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() > MAX_DAYS * SECONDS_PER_DAY * 1000.0 {
        return Err(out_of_range());
    }
    let shifted = TimeDelta::try_milliseconds(millis as i64)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or_else(out_of_range)?;
    Ok(DateValue {
        date: shifted.date(),
        time: Some(shifted.time()),
        zone: date.zone,
    })
}

/// Shift a date back by a duration
pub fn subtract_duration(date: &DateValue, duration: &Duration) -> Value {
    add_duration(date, &duration.negated())
}

fn utc_instant(date: &DateValue) -> NaiveDateTime {
    let local = NaiveDateTime::new(date.date, date.time.unwrap_or(NaiveTime::MIN));
    match date.zone {
        Zone::Offset(seconds) => TimeDelta::try_seconds(seconds as i64)
            .and_then(|offset| local.checked_sub_signed(offset))
            .unwrap_or(local),
        Zone::Utc | Zone::Local => local,
    }
}

/// `a - b` as whole days plus a clock remainder
pub fn difference(a: &DateValue, b: &DateValue) -> Duration {
    let delta = utc_instant(a) - utc_instant(b);
    let days = delta.num_days();
    let remainder = delta - TimeDelta::days(days);
    let seconds = remainder.num_milliseconds() as f64 / 1000.0;

    let mut duration = Duration::zero().and(DurationUnit::Days, days as f64);
    if seconds != 0.0 {
        duration = duration.plus(&Duration::from_seconds(seconds));
    }
    duration
}

/// Move a clock time by a duration of fixed-length units, recording how
/// many days the result rolled over
pub fn shift_time(time: &TimeOfDay, duration: &Duration) -> Value {
    let calendar_only = duration.parts().any(|(unit, _)| {
        matches!(
            unit,
            DurationUnit::Years | DurationUnit::Months | DurationUnit::BusinessDays
        )
    });
    if calendar_only {
        return Value::Error(
            ValueError::type_mismatch("a clock duration", "calendar duration")
                .with_message("cannot shift a time of day by months, years or business days"),
        );
    }
    let total = time.absolute_seconds() + duration.total_seconds();
    if !total.is_finite() || total.abs() > MAX_DAYS * SECONDS_PER_DAY {
        return Value::Error(ValueError::runtime("time out of range"));
    }
    Value::Time(TimeOfDay::from_seconds(total))
}

/// Time between two clock times, counting rollover days
pub fn time_difference(a: &TimeOfDay, b: &TimeOfDay) -> Duration {
    Duration::from_seconds(a.absolute_seconds() - b.absolute_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> DateValue {
        DateValue::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn shifted(start: DateValue, duration: Duration) -> DateValue {
        match add_duration(&start, &duration) {
            Value::Date(d) => d,
            other => panic!("expected a date, got {:?}", other),
        }
    }

    #[test]
    fn test_add_days_and_months() {
        assert_eq!(
            shifted(date(2024, 1, 15), Duration::of(DurationUnit::Days, 20.0)),
            date(2024, 2, 4)
        );
        // clamps to the end of February
        assert_eq!(
            shifted(date(2024, 1, 31), Duration::of(DurationUnit::Months, 1.0)),
            date(2024, 2, 29)
        );
        assert_eq!(
            shifted(date(2024, 2, 29), Duration::of(DurationUnit::Years, 1.0)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_business_days_skip_weekends() {
        // 2024-01-12 is a Friday
        assert_eq!(
            shifted(date(2024, 1, 12), Duration::of(DurationUnit::BusinessDays, 1.0)),
            date(2024, 1, 15)
        );
        assert_eq!(
            shifted(date(2024, 1, 15), Duration::of(DurationUnit::BusinessDays, -1.0)),
            date(2024, 1, 12)
        );
    }

    #[test]
    fn test_business_days_across_weeks() {
        // 2024-01-10 is a Wednesday, 2024-01-13 a Saturday
        assert_eq!(
            shifted(date(2024, 1, 10), Duration::of(DurationUnit::BusinessDays, 5.0)),
            date(2024, 1, 17)
        );
        assert_eq!(
            shifted(date(2024, 1, 10), Duration::of(DurationUnit::BusinessDays, 12.0)),
            date(2024, 1, 26)
        );
        assert_eq!(
            shifted(date(2024, 1, 13), Duration::of(DurationUnit::BusinessDays, 6.0)),
            date(2024, 1, 22)
        );
        assert_eq!(
            shifted(date(2024, 1, 10), Duration::of(DurationUnit::BusinessDays, -7.0)),
            date(2024, 1, 1)
        );
    }

    #[test]
    fn test_huge_durations_are_out_of_range() {
        let start = date(2024, 1, 1);
        for unit in [
            DurationUnit::Days,
            DurationUnit::Weeks,
            DurationUnit::Hours,
            DurationUnit::Seconds,
            DurationUnit::Months,
            DurationUnit::BusinessDays,
        ] {
            let result = add_duration(&start, &Duration::of(unit, 1e15));
            let err = result.as_error().expect("out of range");
            assert_eq!(err.message(), "date out of range");
        }
        assert!(matches!(
            add_duration(&start, &Duration::of(DurationUnit::Days, 1e6)),
            Value::Date(_)
        ));
        assert!(add_duration(&start, &Duration::of(DurationUnit::Days, 2e8)).is_error());
        assert!(subtract_duration(&start, &Duration::of(DurationUnit::Days, 1e300)).is_error());

        let noon = TimeOfDay::from_hms(12, 0, 0.0);
        assert!(shift_time(&noon, &Duration::of(DurationUnit::Hours, f64::INFINITY)).is_error());
    }

    #[test]
    fn test_clock_units_add_a_time() {
        let result = shifted(date(2024, 1, 1), Duration::of(DurationUnit::Hours, 30.0));
        assert_eq!(result.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(result.time, NaiveTime::from_hms_opt(6, 0, 0));
    }

    #[test]
    fn test_fractional_months_rejected() {
        let result = add_duration(&date(2024, 1, 1), &Duration::of(DurationUnit::Months, 1.5));
        assert!(result.is_error());
    }

    #[test]
    fn test_difference() {
        let d = difference(&date(2024, 3, 1), &date(2024, 2, 1));
        assert_eq!(d.get(DurationUnit::Days), 29.0);
        let back = difference(&date(2024, 2, 1), &date(2024, 3, 1));
        assert_eq!(back.get(DurationUnit::Days), -29.0);
    }

    #[test]
    fn test_shift_time_rolls_over() {
        let late = TimeOfDay::from_hms(23, 0, 0.0);
        match shift_time(&late, &Duration::of(DurationUnit::Hours, 2.0)) {
            Value::Time(t) => {
                assert_eq!(t.hour(), 1);
                assert_eq!(t.day_offset(), 1);
            }
            other => panic!("expected a time, got {:?}", other),
        }
        assert!(shift_time(&late, &Duration::of(DurationUnit::Months, 1.0)).is_error());
    }
}
