//! Attribute normalization
//!
//! One parsing and fallback policy for every raw field that reaches the
//! engine. Numeric fields may arrive as JSON numbers or as formatted
//! strings (`"$450,000"`, `"1,800 sqft"`, `"2.5 baths"`); they normalize to
//! [`Measure::Known`] or to [`Measure::Unknown`], never to a zero stand-in.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Placeholder shown for absent values. Only the presentation layer uses it.
pub const NOT_AVAILABLE: &str = "N/A";

/// Date layouts seen in appraisal exports, tried in order.
const DATE_FORMATS: [&str; 5] = [
    "%b/%d/%Y", // May/05/2025
    "%B/%d/%Y", // March/05/2025
    "%Y-%m-%d", // 2025-05-05
    "%m/%d/%Y", // 05/05/2025
    "%d-%b-%y", // 05-May-25
];

/// A non-negative quantity that may be unknown
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Measure {
    Known(f64),
    #[default]
    Unknown,
}

impl Measure {
    /// Build a measure from a raw number, rejecting negative and non-finite values
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value >= 0.0 {
            Measure::Known(value)
        } else {
            Measure::Unknown
        }
    }

    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            Measure::Known(v) => Some(*v),
            Measure::Unknown => None,
        }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        matches!(self, Measure::Known(_))
    }

    /// Re-apply the normalization policy. Normalized values come back unchanged.
    pub fn normalize(self) -> Self {
        match self {
            Measure::Known(v) => Measure::from_f64(v),
            Measure::Unknown => Measure::Unknown,
        }
    }

    /// Pair two measures, yielding values only when both sides are known
    pub fn zip(self, other: Measure) -> Option<(f64, f64)> {
        self.value().zip(other.value())
    }
}

impl From<f64> for Measure {
    fn from(value: f64) -> Self {
        Measure::from_f64(value)
    }
}

impl From<Option<f64>> for Measure {
    fn from(value: Option<f64>) -> Self {
        value.map(Measure::from_f64).unwrap_or(Measure::Unknown)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Known(v) => write!(f, "{}", v),
            Measure::Unknown => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measure::Known(v) => serializer.serialize_f64(*v),
            Measure::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Measure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(normalize_value(&raw))
    }
}

/// Parse a formatted numeric string.
///
/// The first numeric run is read; currency symbols, thousands separators,
/// abbreviations and unit suffixes around it are ignored. A `.` only counts
/// as a decimal point when a digit follows it, so `"Approx. 2,000 sqft"`
/// is 2000 and `"2.5 ba."` is 2.5. A string with no digits, a minus sign
/// right before the number or a second decimal point is unknown.
pub fn parse_numeric(raw: &str) -> Measure {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    let digit_at = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);

    let Some(start) = (0..bytes.len()).find(|&i| digit_at(i) || (bytes[i] == b'.' && digit_at(i + 1))) else {
        return Measure::Unknown;
    };
    let negative = bytes[..start]
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace() && **b != b'$')
        .is_some_and(|b| *b == b'-');
    if negative {
        return Measure::Unknown;
    }

    let mut end = start;
    let mut seen_point = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' | b',' => end += 1,
            b'.' if !seen_point && digit_at(end + 1) => {
                seen_point = true;
                end += 1;
            }
            _ => break,
        }
    }
    // "1.2.3" is a version or a typo, not a quantity
    if bytes.get(end) == Some(&b'.') && digit_at(end + 1) {
        return Measure::Unknown;
    }

    let cleaned: String = raw[start..end].chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .map(Measure::from_f64)
        .unwrap_or(Measure::Unknown)
}

/// Normalize an arbitrary JSON value into a measure
pub fn normalize_value(raw: &Value) -> Measure {
    match raw {
        Value::Number(n) => n.as_f64().map(Measure::from_f64).unwrap_or(Measure::Unknown),
        Value::String(s) => parse_numeric(s),
        _ => Measure::Unknown,
    }
}

/// Trim a text field. Absence is represented by the caller, not here.
#[inline]
pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parse a date in any of the known appraisal export layouts
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&compact, fmt).ok())
}

/// Parse a signed coordinate component. Range checks belong to the geo module.
pub fn parse_coordinate(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

/// Serde adapter for date fields: unparseable dates become `None`
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_date(&s),
        _ => None,
    })
}

/// Serde adapter for latitude/longitude fields
pub fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_coordinate))
}

/// Serde adapter for trimmed text fields; numbers are accepted and stringified
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => normalize_text(&s),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Serde adapter for optional identifiers
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(normalize_text(&s)).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_area_with_units() {
        assert_eq!(parse_numeric("1,800 sqft"), Measure::Known(1800.0));
        assert_eq!(parse_numeric("2,345"), Measure::Known(2345.0));
        assert_eq!(parse_numeric("  2.5 baths "), Measure::Known(2.5));
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_numeric("$450,000"), Measure::Known(450_000.0));
    }

    #[test]
    fn test_no_digits_is_unknown() {
        assert_eq!(parse_numeric(""), Measure::Unknown);
        assert_eq!(parse_numeric("n/a"), Measure::Unknown);
        assert_eq!(parse_numeric("."), Measure::Unknown);
        assert_eq!(parse_numeric("1.2.3"), Measure::Unknown);
    }

    #[test]
    fn test_dots_outside_the_number_are_ignored() {
        assert_eq!(parse_numeric("Approx. 2,000 sqft"), Measure::Known(2000.0));
        assert_eq!(parse_numeric("c. 1920"), Measure::Known(1920.0));
        assert_eq!(parse_numeric("2.5 ba."), Measure::Known(2.5));
        assert_eq!(parse_numeric("Est. $1,234.56 USD."), Measure::Known(1234.56));
        assert_eq!(parse_numeric(".5 ac"), Measure::Known(0.5));
        assert_eq!(parse_numeric("No. of baths: n/a."), Measure::Unknown);
    }

    #[test]
    fn test_quoted_zero_is_known() {
        assert_eq!(parse_numeric("0"), Measure::Known(0.0));
        assert_eq!(normalize_value(&json!(0)), Measure::Known(0.0));
    }

    #[test]
    fn test_negative_is_unknown() {
        assert_eq!(parse_numeric("-1,200"), Measure::Unknown);
        assert_eq!(normalize_value(&json!(-3.0)), Measure::Unknown);
    }

    #[test]
    fn test_normalize_value_types() {
        assert_eq!(normalize_value(&json!(1950)), Measure::Known(1950.0));
        assert_eq!(normalize_value(&json!("1950")), Measure::Known(1950.0));
        assert_eq!(normalize_value(&Value::Null), Measure::Unknown);
        assert_eq!(normalize_value(&json!(true)), Measure::Unknown);
        assert_eq!(normalize_value(&json!([1, 2])), Measure::Unknown);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["1,800 sqft", "$1,234.56", "", "0", "n/a"] {
            let once = parse_numeric(raw);
            assert_eq!(once.normalize(), once);
            let reparsed = match once {
                Measure::Known(v) => parse_numeric(&v.to_string()),
                Measure::Unknown => Measure::Unknown,
            };
            assert_eq!(reparsed, once);
        }
        assert_eq!(normalize_text(&normalize_text("  12 Oak St ")), "12 Oak St");
    }

    #[test]
    fn test_parse_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        assert_eq!(parse_date("May/05/2025"), Some(expected));
        assert_eq!(parse_date("2025-05-05"), Some(expected));
        assert_eq!(parse_date("05/05/2025"), Some(expected));
        assert_eq!(parse_date("05-May-25"), Some(expected));
        assert_eq!(parse_date(" May / 05 / 2025 "), Some(expected));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("N/A"), None);
    }

    #[test]
    fn test_coordinates_keep_sign() {
        assert_eq!(parse_coordinate(&json!(-74.0)), Some(-74.0));
        assert_eq!(parse_coordinate(&json!(" -74.25 ")), Some(-74.25));
        assert_eq!(parse_coordinate(&json!("")), None);
        assert_eq!(parse_coordinate(&Value::Null), None);
    }

    #[test]
    fn test_measure_serde() {
        let m: Measure = serde_json::from_value(json!("1,800 sqft")).unwrap();
        assert_eq!(m, Measure::Known(1800.0));
        assert_eq!(serde_json::to_value(m).unwrap(), json!(1800.0));
        assert_eq!(serde_json::to_value(Measure::Unknown).unwrap(), Value::Null);
    }
}
