//! Display formatting shared by the dashboard and its chart configuration.

use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

/// Placeholder for timeline points that carry no date at all.
pub const MISSING_TIMELINE_DATE: &str = "N/A";

/// Narrow no-break space, the fr-FR digit group separator.
const GROUP_SEPARATOR: char = '\u{202f}';

/// Formats service dates for display in a configured locale.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    unavailable: String,
}

impl DateFormatter {
    pub fn new(locale: Locale, unavailable: impl Into<String>) -> Self {
        Self {
            locale,
            unavailable: unavailable.into(),
        }
    }

    pub fn unavailable(&self) -> &str {
        &self.unavailable
    }

    /// Day, long month name and year, e.g. `1 juillet 2003` for `fr_FR`.
    ///
    /// Absent or unparseable dates yield the unavailable label.
    pub fn long(&self, raw: Option<&str>) -> String {
        self.render(raw, "%-d %B %Y")
            .unwrap_or_else(|| self.unavailable.clone())
    }

    /// The locale's numeric date, e.g. `01/07/2003` for `fr_FR`.
    ///
    /// Absent or blank dates yield [`MISSING_TIMELINE_DATE`]; unparseable ones the
    /// unavailable label.
    pub fn short(&self, raw: Option<&str>) -> String {
        match raw.filter(|s| !s.trim().is_empty()) {
            None => MISSING_TIMELINE_DATE.to_string(),
            Some(_) => self
                .render(raw, "%x")
                .unwrap_or_else(|| self.unavailable.clone()),
        }
    }

    fn render(&self, raw: Option<&str>, fmt: &str) -> Option<String> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        let Some(at) = parse_service_date(raw) else {
            warn!(date = raw, "Unparseable date from statistics service");
            return None;
        };
        Some(at.format_localized(fmt, self.locale).to_string())
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Locale::fr_FR, "unavailable")
    }
}

/// Accepts the date shapes the service emits: plain dates, naive
/// timestamps, and RFC 3339 timestamps. Only the calendar date is kept.
fn parse_service_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        d
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.date()
    } else if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.date_naive()
    } else {
        return None;
    };
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Renders `value` with exactly `digits` decimals, rounding ties away from
/// zero on the exact binary value (`9.555` is below the tie and prints
/// `9.55`; `1.25` is a true tie and prints `1.3`).
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    // The extended expansion is exact, so a tie shows up as a 5 followed by
    // nothing but zeros.
    let extended = format!("{:.*}", digits + 30, magnitude);
    let point = extended.find('.').unwrap_or(extended.len());
    let tail = &extended[point + 1 + digits..];
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');

    let body = if is_tie {
        let end = if digits == 0 { point } else { point + 1 + digits };
        increment_last_digit(&extended[..end])
    } else {
        format!("{:.*}", digits, magnitude)
    };
    format!("{sign}{body}")
}

/// Adds one unit in the last place of a plain decimal string.
fn increment_last_digit(decimal: &str) -> String {
    let mut bytes = decimal.as_bytes().to_vec();
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'.' => continue,
            b'9' => bytes[i] = b'0',
            d => {
                bytes[i] = d + 1;
                return String::from_utf8_lossy(&bytes).into_owned();
            }
        }
    }
    format!("1{}", String::from_utf8_lossy(&bytes))
}

/// Renders a number the way a chart axis prints a raw value: integers without
/// a decimal point, other values in their shortest form.
fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Axis tick label with K/M/G abbreviation at 1e3/1e6/1e9.
///
/// ```
/// use pandemic_compare::format::tick_label;
/// assert_eq!(tick_label(999.0), "999");
/// assert_eq!(tick_label(1000.0), "1.0 K");
/// ```
pub fn tick_label(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{} G", to_fixed(value / 1_000_000_000.0, 1))
    } else if value >= 1_000_000.0 {
        format!("{} M", to_fixed(value / 1_000_000.0, 1))
    } else if value >= 1_000.0 {
        format!("{} K", to_fixed(value / 1_000.0, 1))
    } else {
        plain_number(value)
    }
}

/// fr-FR number formatting: digit groups split by a narrow no-break space,
/// decimal comma, at most three fraction digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return to_fixed(value, 0);
    }
    let fixed = to_fixed(value, 3);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }

    // "-0" after rounding prints as "0"
    let sign = if grouped == "0" && frac_part.is_empty() { "" } else { sign };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}

/// Tooltip line for bar charts: `"<dataset label>: <number>"`, or just the
/// number when the dataset has no label.
pub fn bar_tooltip_label(dataset_label: Option<&str>, raw: f64) -> String {
    match dataset_label.filter(|l| !l.is_empty()) {
        Some(label) => format!("{label}: {}", format_number(raw)),
        None => format_number(raw),
    }
}

/// Tooltip line for the mortality doughnut: `"<label>: <raw to 2 dp>%"`.
pub fn doughnut_tooltip_label(label: &str, raw: f64) -> String {
    format!("{label}: {}%", to_fixed(raw, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_label_thresholds() {
        assert_eq!(tick_label(0.0), "0");
        assert_eq!(tick_label(999.0), "999");
        assert_eq!(tick_label(1000.0), "1.0 K");
        assert_eq!(tick_label(1250.0), "1.3 K");
        assert_eq!(tick_label(999_999.0), "1000.0 K");
        assert_eq!(tick_label(1_000_000.0), "1.0 M");
        assert_eq!(tick_label(1_500_000.0), "1.5 M");
        assert_eq!(tick_label(999_999_999.0), "1000.0 M");
        assert_eq!(tick_label(2_000_000_000.0), "2.0 G");
    }

    #[test]
    fn test_tick_label_small_values() {
        assert_eq!(tick_label(0.5), "0.5");
        assert_eq!(tick_label(-5000.0), "-5000");
    }

    #[test]
    fn test_to_fixed_rounds_half_away_from_zero() {
        assert_eq!(to_fixed(1.25, 1), "1.3");
        assert_eq!(to_fixed(-1.25, 1), "-1.3");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(9.95, 1), "9.9");
        assert_eq!(to_fixed(99.95, 1), "100.0");
        assert_eq!(to_fixed(9.555, 2), "9.55");
        assert_eq!(to_fixed(0.98, 2), "0.98");
        assert_eq!(to_fixed(2.0, 2), "2.00");
        assert_eq!(to_fixed(7.6, 0), "8");
    }

    #[test]
    fn test_non_finite_values_do_not_panic() {
        assert_eq!(to_fixed(f64::NAN, 2), "NaN");
        assert_eq!(to_fixed(f64::NEG_INFINITY, 1), "-Infinity");
        assert_eq!(tick_label(f64::INFINITY), "Infinity G");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(doughnut_tooltip_label("X", f64::NAN), "X: NaN%");
        assert_eq!(bar_tooltip_label(Some("Cases"), f64::INFINITY), "Cases: Infinity");
        assert_eq!(tick_label(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(8096.0), "8\u{202f}096");
        assert_eq!(format_number(700_000_000.0), "700\u{202f}000\u{202f}000");
        assert_eq!(format_number(1234.5), "1\u{202f}234,5");
        assert_eq!(format_number(-6_900_000.0), "-6\u{202f}900\u{202f}000");
        assert_eq!(format_number(0.0000116), "0");
    }

    #[test]
    fn test_tooltip_labels() {
        assert_eq!(bar_tooltip_label(Some("Deaths"), 774.0), "Deaths: 774");
        assert_eq!(bar_tooltip_label(Some(""), 8096.0), "8\u{202f}096");
        assert_eq!(bar_tooltip_label(None, 12.0), "12");
        assert_eq!(doughnut_tooltip_label("SARS", 9.56), "SARS: 9.56%");
    }

    #[test]
    fn test_long_date_in_french() {
        let f = DateFormatter::default();
        assert_eq!(f.long(Some("2003-07-01")), "1 juillet 2003");
        assert_eq!(f.long(Some("2023-01-01")), "1 janvier 2023");
        assert_eq!(f.long(Some("2020-03-15T00:00:00")), "15 mars 2020");
    }

    #[test]
    fn test_long_date_unavailable() {
        let f = DateFormatter::default();
        assert_eq!(f.long(None), "unavailable");
        assert_eq!(f.long(Some("")), "unavailable");
        assert_eq!(f.long(Some("not a date")), "unavailable");
    }

    #[test]
    fn test_short_date() {
        let f = DateFormatter::default();
        assert_eq!(f.short(Some("2020-03-15")), "15/03/2020");
        assert_eq!(f.short(None), MISSING_TIMELINE_DATE);
        assert_eq!(f.short(Some("")), MISSING_TIMELINE_DATE);
        assert_eq!(f.short(Some("  ")), MISSING_TIMELINE_DATE);
        assert_eq!(f.short(Some("garbage")), "unavailable");
    }
}
