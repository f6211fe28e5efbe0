//! Display formatting for values
//!
//! Rendering is deliberately minimal: enough to show a result and to read
//! it back through [`crate::parse`] without losing precision.

use chrono::NaiveDate;

/// How scalars are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Notation {
    /// Fixed-point, switching to scientific outside the thresholds
    #[default]
    Standard,
    /// Always `m.mmme±x`
    Scientific,
    /// Scientific with exponents that are multiples of three
    Engineering,
}

/// How calendar dates are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DateFormat {
    /// `2024-01-15`
    #[default]
    Iso,
    /// Numeric day/month order picked from `date_locale`
    Locale,
}

/// Options for rendering values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayOptions {
    /// Significant decimal places (default: 10)
    pub precision: usize,
    pub notation: Notation,
    /// Magnitudes at or above this switch to scientific (default: 1e15)
    pub scientific_upper_threshold: f64,
    /// Non-zero magnitudes below this switch to scientific (default: 1e-6)
    pub scientific_lower_threshold: f64,
    /// Drop trailing zeros from scientific mantissas
    pub scientific_trim_trailing_zeros: bool,
    pub date_format: DateFormat,
    /// Locale tag used by [`DateFormat::Locale`] (default: "en-US")
    pub date_locale: String,
    /// Show quantities in the coherent SI unit of their dimension
    pub prefer_base_unit: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            precision: 10,
            notation: Notation::Standard,
            scientific_upper_threshold: 1e15,
            scientific_lower_threshold: 1e-6,
            scientific_trim_trailing_zeros: true,
            date_format: DateFormat::Iso,
            date_locale: "en-US".to_string(),
            prefer_base_unit: false,
        }
    }
}

impl DisplayOptions {
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_notation(mut self, notation: Notation) -> Self {
        self.notation = notation;
        self
    }
}

/// Format a finite scalar
pub fn format_number(value: f64, options: &DisplayOptions) -> String {
    if value == 0.0 || !value.is_finite() {
        return if value.is_finite() {
            "0".to_string()
        } else {
            value.to_string()
        };
    }

    let magnitude = value.abs();
    match options.notation {
        Notation::Scientific => scientific(value, options),
        Notation::Engineering => engineering(value, options),
        Notation::Standard
            if magnitude >= options.scientific_upper_threshold
                || magnitude < options.scientific_lower_threshold =>
        {
            scientific(value, options)
        }
        Notation::Standard => fixed(value, options.precision),
    }
}

/// Format a money amount: like [`format_number`], but a fractional amount
/// always shows at least two decimals (`12.50`).
pub fn format_amount(value: f64, options: &DisplayOptions) -> String {
    let text = format_number(value, options);
    if text.contains('e') {
        return text;
    }
    match text.split_once('.') {
        Some((_, decimals)) if decimals.len() == 1 => format!("{}0", text),
        _ => text,
    }
}

/// Format a date according to the options
pub fn format_date(date: NaiveDate, options: &DisplayOptions) -> String {
    let pattern = match options.date_format {
        DateFormat::Iso => "%Y-%m-%d",
        DateFormat::Locale => locale_pattern(&options.date_locale),
    };
    date.format(pattern).to_string()
}

fn locale_pattern(locale: &str) -> &'static str {
    let language = locale.split(['-', '_']).next().unwrap_or("");
    match (language, locale) {
        (_, "en-US") | (_, "en_US") => "%m/%d/%Y",
        ("de", _) | ("ru", _) | ("pl", _) => "%d.%m.%Y",
        ("ja", _) | ("zh", _) | ("ko", _) => "%Y/%m/%d",
        _ => "%d/%m/%Y",
    }
}

/// Fixed-point with `precision` significant decimals; small magnitudes get
/// extra places so that leading zeros don't eat the precision.
fn fixed(value: f64, precision: usize) -> String {
    let magnitude = value.abs();
    let decimals = if magnitude < 1.0 {
        let leading_zeros = (-magnitude.log10().floor()) as usize;
        precision + leading_zeros.saturating_sub(1)
    } else {
        precision
    };
    let text = trim_zeros(format!("{:.*}", decimals, value));
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

fn scientific(value: f64, options: &DisplayOptions) -> String {
    let text = format!("{:.*e}", options.precision, value);
    match text.split_once('e') {
        Some((mantissa, exponent)) if options.scientific_trim_trailing_zeros => {
            format!("{}e{}", trim_zeros(mantissa.to_string()), exponent)
        }
        _ => text,
    }
}

fn engineering(value: f64, options: &DisplayOptions) -> String {
    let mut exponent = (value.abs().log10() / 3.0).floor() as i32 * 3;
    let mut mantissa = value / 10f64.powi(exponent);
    // rounding can push the mantissa to 1000
    let rounded: f64 = format!("{:.*}", options.precision, mantissa)
        .parse()
        .unwrap_or(mantissa);
    if rounded.abs() >= 1000.0 {
        exponent += 3;
        mantissa /= 1000.0;
    }
    let mut text = format!("{:.*}", options.precision, mantissa);
    if options.scientific_trim_trailing_zeros {
        text = trim_zeros(text);
    }
    if exponent == 0 {
        text
    } else {
        format!("{}e{}", text, exponent)
    }
}

fn trim_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
