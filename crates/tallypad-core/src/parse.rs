//! Literal value parsing
//!
//! [`parse`] reads a single literal: a number, percentage, amount of money,
//! price per unit, quantity, date, clock time, duration, or a bracketed
//! list of those. It never fails outright; unreadable text becomes a
//! `parse` error value.

use crate::error::ValueError;
use crate::quantity::Quantity;
use crate::units::CompoundUnit;
use crate::value::{
    CurrencyCode, CurrencyQuantity, DateValue, Duration, DurationUnit, Money, TimeOfDay, Value,
    Zone,
};
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

const NUMBER: &str = r"[-+]?(?:\d[\d_]*(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?";

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{}$", NUMBER)).unwrap());

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({})\s*%$", NUMBER)).unwrap());

static SYMBOL_MONEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(-)?\s*([$€£¥₹₩])\s*({})(?:\s*(/|\*|per\s)\s*(.+))?$",
        NUMBER
    ))
    .unwrap()
});

static CODE_PREFIX_MONEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(-)?\s*([A-Z]{{3}})\s+({})$", NUMBER)).unwrap());

static CODE_SUFFIX_MONEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({})\s*([A-Z]{{3}})$", NUMBER)).unwrap());

static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({})\s*([^\d\s.+\-].*)$", NUMBER)).unwrap());

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d+))?)?)?\s*(Z|[+-]\d{2}:\d{2})?$",
    )
    .unwrap()
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?\s*([aApP][mM])?$").unwrap()
});

static DURATION_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*({})\s*((?i:business\s+days?)|[A-Za-z]+)\s*",
        NUMBER
    ))
    .unwrap()
});

/// Read a number, allowing `_` digit separators
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if !NUMBER_RE.is_match(text) {
        return None;
    }
    text.replace('_', "")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parse a literal into a value, or a `parse` error value
pub fn parse(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Error(ValueError::parse("nothing to read"));
    }
    match try_parse(trimmed) {
        Some(value) => value,
        None => Value::Error(
            ValueError::parse(format!("can't read '{}' as a value", trimmed))
                .with_expression(trimmed),
        ),
    }
}

fn try_parse(text: &str) -> Option<Value> {
    if let Some(n) = parse_number(text) {
        return Some(Value::Number(n));
    }
    if let Some(caps) = PERCENT_RE.captures(text) {
        return parse_number(&caps[1]).map(Value::percentage);
    }
    if let Some(list) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return parse_list(list);
    }
    parse_money(text)
        .or_else(|| parse_date(text))
        .or_else(|| parse_time(text))
        .or_else(|| parse_duration(text))
        .or_else(|| parse_quantity(text))
}

fn signed(negative: bool, amount: f64) -> f64 {
    if negative {
        -amount
    } else {
        amount
    }
}

fn parse_money(text: &str) -> Option<Value> {
    if let Some(caps) = SYMBOL_MONEY_RE.captures(text) {
        let symbol = caps[2].chars().next()?;
        let code = CurrencyCode::from_symbol(symbol)?;
        let amount = signed(caps.get(1).is_some(), parse_number(&caps[3])?);
        return match (caps.get(4), caps.get(5)) {
            (Some(op), Some(unit)) => {
                let unit = CompoundUnit::parse(unit.as_str()).ok()?;
                if op.as_str() == "*" {
                    Some(CurrencyQuantity::from_effective(code, amount, unit))
                } else {
                    Some(CurrencyQuantity::from_effective(code, amount, unit.inverse()))
                }
            }
            _ => Some(Value::Currency(Money::new(code, amount))),
        };
    }
    if let Some(caps) = CODE_PREFIX_MONEY_RE.captures(text) {
        let code = CurrencyCode::from_code(&caps[2])?;
        let amount = signed(caps.get(1).is_some(), parse_number(&caps[3])?);
        return Some(Value::Currency(Money::new(code, amount)));
    }
    if let Some(caps) = CODE_SUFFIX_MONEY_RE.captures(text) {
        let code = CurrencyCode::from_code(&caps[2])?;
        return Some(Value::Currency(Money::new(code, parse_number(&caps[1])?)));
    }
    None
}

fn parse_zone(text: Option<&str>) -> Option<Zone> {
    match text {
        None => Some(Zone::Local),
        Some("Z") => Some(Zone::Utc),
        Some(offset) => {
            let sign = if offset.starts_with('-') { -1 } else { 1 };
            let (hours, minutes) = offset[1..].split_once(':')?;
            let seconds = hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60;
            Some(Zone::Offset(sign * seconds))
        }
    }
}

/// Read an ISO date, optionally with a time and zone
pub fn parse_date(text: &str) -> Option<Value> {
    let caps = DATE_RE.captures(text.trim())?;
    let date = NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    let mut value = DateValue::new(date).with_zone(parse_zone(caps.get(8).map(|m| m.as_str()))?);
    if let (Some(h), Some(m)) = (caps.get(4), caps.get(5)) {
        let second = caps.get(6).map_or(Some(0), |s| s.as_str().parse().ok())?;
        let millis = match caps.get(7) {
            Some(frac) => {
                let digits: String = frac.as_str().chars().chain("000".chars()).take(3).collect();
                digits.parse().ok()?
            }
            None => 0,
        };
        let time = NaiveTime::from_hms_milli_opt(
            h.as_str().parse().ok()?,
            m.as_str().parse().ok()?,
            second,
            millis,
        )?;
        value = value.with_time(time);
    }
    Some(Value::Date(value))
}

/// Read a clock time (`14:30`, `2:30 pm`, `09:15:30`)
pub fn parse_time(text: &str) -> Option<Value> {
    let caps = TIME_RE.captures(text.trim())?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = caps.get(3).map_or(Some(0), |s| s.as_str().parse().ok())?;
    if let Some(meridiem) = caps.get(4) {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    Some(Value::Time(TimeOfDay::from_hms(hour, minute, second as f64)))
}

/// Read a spelled-out duration (`2 hours 30 minutes`, `3 business days`)
pub fn parse_duration(text: &str) -> Option<Value> {
    let mut rest = text.trim();
    let mut duration = Duration::zero();
    let mut parts = 0;
    while !rest.is_empty() {
        let caps = DURATION_PART_RE.captures(rest)?;
        let amount = parse_number(&caps[1])?;
        let unit = DurationUnit::from_word(&caps[2])?;
        duration = duration.and(unit, amount);
        parts += 1;
        rest = &rest[caps[0].len()..];
    }
    (parts > 0).then_some(Value::Duration(duration))
}

fn parse_quantity(text: &str) -> Option<Value> {
    let caps = QUANTITY_RE.captures(text)?;
    let value = parse_number(&caps[1])?;
    let unit = CompoundUnit::parse(&caps[2]).ok()?;
    Some(Value::from_quantity(Quantity::with_unit(value, unit)))
}

/// Split on commas outside brackets
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_list(inner: &str) -> Option<Value> {
    if inner.trim().is_empty() {
        return Some(Value::list(vec![]));
    }
    let items = split_top_level(inner)
        .into_iter()
        .map(|part| try_parse(part.trim()))
        .collect::<Option<Vec<_>>>()?;
    Some(Value::list(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn q(v: f64, unit: &str) -> Value {
        Value::from_quantity(Quantity::new(v, unit).unwrap())
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("42"), Value::Number(42.0));
        assert_eq!(parse(" -2.5 "), Value::Number(-2.5));
        assert_eq!(parse("1_000"), Value::Number(1000.0));
        assert_eq!(parse("1.5e3"), Value::Number(1500.0));
        assert_eq!(parse(".5"), Value::Number(0.5));
    }

    #[test]
    fn test_percentages_and_money() {
        assert_eq!(parse("20%"), Value::percentage(20.0));
        assert_eq!(parse("$12.50"), Value::currency(CurrencyCode::Usd, 12.5));
        assert_eq!(parse("-€5"), Value::currency(CurrencyCode::Eur, -5.0));
        assert_eq!(parse("CHF 20"), Value::currency(CurrencyCode::Chf, 20.0));
        assert_eq!(parse("30 GBP"), Value::currency(CurrencyCode::Gbp, 30.0));
        assert!(parse("30 XYZ").is_error());
    }

    #[test]
    fn test_price_per_unit() {
        let price = parse("$5/kg");
        assert!(matches!(&price, Value::CurrencyQuantity(cq) if cq.per));
        assert_eq!(price.to_string(), "$5/kg");
        assert_eq!(parse("$5 per kg"), price);
    }

    #[test]
    fn test_quantities() {
        assert_eq!(parse("5 km"), q(5.0, "km"));
        assert_eq!(parse("9.8 m/s^2"), q(9.8, "m/s^2"));
        assert_eq!(parse("-3 °C"), q(-3.0, "°C"));
        assert_eq!(parse("12m²"), q(12.0, "m^2"));
    }

    #[test]
    fn test_dates_and_times() {
        let Value::Date(d) = parse("2024-01-15") else {
            panic!("expected a date");
        };
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(d.time, None);

        let Value::Date(d) = parse("2024-01-15T10:30Z") else {
            panic!("expected a date");
        };
        assert_eq!(d.zone, Zone::Utc);
        assert_eq!(d.time, NaiveTime::from_hms_opt(10, 30, 0));

        assert_eq!(parse("2:30 pm"), Value::Time(TimeOfDay::from_hms(14, 30, 0.0)));
        assert_eq!(parse("12:00 am"), Value::Time(TimeOfDay::from_hms(0, 0, 0.0)));
        assert!(parse("25:00").is_error());
        assert!(parse("2024-02-30").is_error());
    }

    #[test]
    fn test_durations() {
        let Value::Duration(d) = parse("2 hours 30 minutes") else {
            panic!("expected a duration");
        };
        assert_eq!(d.total_seconds(), 9000.0);

        let Value::Duration(d) = parse("3 business days") else {
            panic!("expected a duration");
        };
        assert_eq!(d.get(DurationUnit::BusinessDays), 3.0);

        // abbreviations are units, not durations
        assert_eq!(parse("90 min"), q(90.0, "min"));
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            parse("[$12, $15, $9]"),
            Value::list(vec![
                Value::currency(CurrencyCode::Usd, 12.0),
                Value::currency(CurrencyCode::Usd, 15.0),
                Value::currency(CurrencyCode::Usd, 9.0),
            ])
        );
        assert_eq!(parse("[]"), Value::list(vec![]));
    }

    #[test]
    fn test_unreadable() {
        let err = parse("twelve apples");
        assert_eq!(err.as_error().unwrap().kind(), ErrorKind::Parse);
        assert_eq!(parse("").as_error().unwrap().kind(), ErrorKind::Parse);
    }
}
