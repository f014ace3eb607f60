//! Conversions between frontend values and SAP's external formats.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::portals::FieldKind;

const SAP_DATE: &str = "%Y%m%d";
const ISO_DATE: &str = "%Y-%m-%d";

/// Converts a request value into the representation SAP expects.
///
/// Returns a user-facing message when the value cannot be converted.
pub fn to_sap(kind: FieldKind, name: &str, value: &str) -> Result<String, String> {
    match kind {
        FieldKind::Secret => Ok(value.to_string()),
        FieldKind::Text | FieldKind::Amount => Ok(value.trim().to_string()),
        FieldKind::Date => {
            let value = value.trim();
            NaiveDate::parse_from_str(value, ISO_DATE)
                .or_else(|_| NaiveDate::parse_from_str(value, SAP_DATE))
                .map(|date| date.format(SAP_DATE).to_string())
                .map_err(|_| format!("{} must be a date in YYYY-MM-DD format", name))
        }
        FieldKind::Alpha(width) => Ok(alpha_in(value.trim(), width)),
    }
}

/// Converts a leaf value of an SAP reply into its output representation.
pub fn from_sap(kind: FieldKind, value: &Value) -> Value {
    match (kind, value) {
        (_, Value::Null) => Value::String(String::new()),
        (FieldKind::Text | FieldKind::Secret, Value::String(s)) => Value::String(s.trim().to_string()),
        (FieldKind::Date, Value::String(s)) => Value::String(normalize_date(s)),
        (FieldKind::Amount, Value::String(s)) => Value::String(normalize_amount(s)),
        (FieldKind::Amount, Value::Number(n)) => Value::String(normalize_amount(&n.to_string())),
        (FieldKind::Alpha(_), Value::String(s)) => Value::String(alpha_out(s)),
        (_, other) => other.clone(),
    }
}

/// Left-pads purely numeric keys with zeros; anything else passes through.
pub fn alpha_in(value: &str, width: usize) -> String {
    if !value.is_empty() && value.len() < width && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{:0>width$}", value, width = width)
    } else {
        value.to_string()
    }
}

/// Strips the zero padding of numeric keys, keeping a lone `0`.
pub fn alpha_out(value: &str) -> String {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = value.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        value.to_string()
    }
}

/// Normalizes SAP and OData date renderings to `YYYY-MM-DD`.
///
/// Initial dates (`00000000`) become empty strings; unrecognized values are
/// returned trimmed but otherwise untouched.
pub fn normalize_date(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() || value.bytes().all(|b| matches!(b, b'0' | b'-' | b'.')) {
        return String::new();
    }

    if let Some(millis) = odata_millis(value) {
        return DateTime::from_timestamp_millis(millis)
            .map(|ts| ts.date_naive().format(ISO_DATE).to_string())
            .unwrap_or_else(|| value.to_string());
    }

    if value.len() == 8 {
        if let Ok(date) = NaiveDate::parse_from_str(value, SAP_DATE) {
            return date.format(ISO_DATE).to_string();
        }
    }

    if let Some(prefix) = value.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, ISO_DATE) {
            return date.format(ISO_DATE).to_string();
        }
    }

    value.to_string()
}

/// Extracts the milliseconds of an OData v2 `/Date(1705276800000)/` literal.
fn odata_millis(value: &str) -> Option<i64> {
    let inner = value.strip_prefix("/Date(")?.strip_suffix(")/")?;
    let end = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(idx, _)| idx)
        .unwrap_or(inner.len());
    inner[..end].parse().ok()
}

/// Normalizes an SAP amount: trims padding and moves a trailing minus sign to the front.
pub fn normalize_amount(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }

    let signed = match value.strip_suffix('-') {
        Some(digits) => format!("-{}", digits.trim()),
        None => value.to_string(),
    };

    Decimal::from_str(&signed)
        .map(|amount| amount.to_string())
        .unwrap_or(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("20240115", "2024-01-15")]
    #[case("2024-01-15", "2024-01-15")]
    #[case("2024-01-15T00:00:00", "2024-01-15")]
    #[case("/Date(1705276800000)/", "2024-01-15")]
    #[case("/Date(1705276800000+0000)/", "2024-01-15")]
    #[case("00000000", "")]
    #[case("0000-00-00", "")]
    #[case("", "")]
    #[case("tomorrow", "tomorrow")]
    fn dates_are_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_date(raw), expected);
    }

    #[rstest]
    #[case("  1234.50", "1234.50")]
    #[case("1234.50-", "-1234.50")]
    #[case("0.000", "0.000")]
    #[case("", "")]
    #[case("n/a", "n/a")]
    fn amounts_are_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_amount(raw), expected);
    }

    #[test]
    fn alpha_conversion_pads_and_strips_numeric_keys() {
        assert_eq!(alpha_in("1000", 10), "0000001000");
        assert_eq!(alpha_in("C-1000", 10), "C-1000");
        assert_eq!(alpha_in("", 10), "");
        assert_eq!(alpha_out("0000001000"), "1000");
        assert_eq!(alpha_out("0000000000"), "0");
        assert_eq!(alpha_out("MAT-01"), "MAT-01");
    }

    #[test]
    fn request_dates_are_sent_in_sap_format() {
        assert_eq!(
            to_sap(FieldKind::Date, "startDate", "2024-03-01").unwrap(),
            "20240301"
        );
        let err = to_sap(FieldKind::Date, "startDate", "01/03/2024").unwrap_err();
        assert_eq!(err, "startDate must be a date in YYYY-MM-DD format");
    }

    #[test]
    fn secrets_are_sent_verbatim() {
        assert_eq!(to_sap(FieldKind::Secret, "password", "  pw  ").unwrap(), "  pw  ");
        assert_eq!(to_sap(FieldKind::Text, "plant", " 1000 ").unwrap(), "1000");
    }

    #[test]
    fn reply_values_keep_non_string_scalars() {
        assert_eq!(from_sap(FieldKind::Text, &json!(42)), json!(42));
        assert_eq!(from_sap(FieldKind::Text, &Value::Null), json!(""));
        assert_eq!(from_sap(FieldKind::Amount, &json!(12.5)), json!("12.5"));
        assert_eq!(from_sap(FieldKind::Text, &json!("  padded ")), json!("padded"));
    }
}
