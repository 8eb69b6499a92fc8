//! Maps arbitrary provider payloads to canonical [`Donation`] records.
//!
//! Pure and infallible: every field has a fallback chain and a default.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::donations_model::Donation;
use crate::constants::ANONYMOUS_DONOR;

const DONOR_FIELDS: &[&str] = &["supporter", "supporter_name", "name"];
const AMOUNT_FIELDS: &[&str] = &["amount", "amount_settled"];
const MESSAGE_FIELDS: &[&str] = &["message", "note"];
const EXTERNAL_ID_FIELD: &str = "id";

/// Normalizes a decoded JSON body. Non-object bodies normalize like `{}`.
pub fn normalize_value(payload: &Value, received_at: DateTime<Utc>) -> Donation {
    match payload {
        Value::Object(map) => normalize(map, received_at),
        _ => normalize(&Map::new(), received_at),
    }
}

pub fn normalize(payload: &Map<String, Value>, received_at: DateTime<Utc>) -> Donation {
    let external_id = first_text(payload, &[EXTERNAL_ID_FIELD])
        .unwrap_or_else(|| format!("donation_{}", received_at.timestamp_millis()));
    let donor_name =
        first_text(payload, DONOR_FIELDS).unwrap_or_else(|| ANONYMOUS_DONOR.to_string());
    let amount = first_present(payload, AMOUNT_FIELDS)
        .map(coerce_amount)
        .unwrap_or(0);
    let message = first_text(payload, MESSAGE_FIELDS).unwrap_or_default();
    let received_at = received_at.timestamp();

    Donation {
        id: assign_id(&external_id, received_at),
        external_id,
        donor_name,
        amount,
        message,
        received_at,
    }
}

/// Unique id for an ingested event: external id plus ingestion second.
pub fn assign_id(external_id: &str, received_at: i64) -> String {
    format!("{}_{}", external_id, received_at)
}

/// Null, `false`, empty strings and numeric zero do not count as present.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_present<'a>(payload: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| payload.get(*field))
        .find(|value| is_present(value))
}

fn first_text(payload: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| payload.get(*field))
        .filter(|value| is_present(value))
        .find_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Truncates numbers and reads the leading integer of strings. Anything
/// negative or unreadable becomes zero.
pub fn coerce_amount(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    };
    parsed.filter(|amount| *amount > 0).unwrap_or(0)
}

fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn normalized(payload: Value) -> Donation {
        normalize_value(&payload, at())
    }

    #[test]
    fn test_primary_fields_are_used() {
        let d = normalized(json!({
            "id": "d1",
            "supporter": "Alice",
            "amount": 5000,
            "message": "hi"
        }));
        assert_eq!(d.external_id, "d1");
        assert_eq!(d.id, format!("d1_{}", at().timestamp()));
        assert_eq!(d.donor_name, "Alice");
        assert_eq!(d.amount, 5000);
        assert_eq!(d.message, "hi");
        assert_eq!(d.received_at, at().timestamp());
    }

    #[test]
    fn test_fallback_chains() {
        let d = normalized(json!({
            "supporter": "",
            "supporter_name": null,
            "name": "Bob",
            "amount": 0,
            "amount_settled": "2500",
            "note": "thanks"
        }));
        assert_eq!(d.donor_name, "Bob");
        assert_eq!(d.amount, 2500);
        assert_eq!(d.message, "thanks");
    }

    #[test]
    fn test_defaults_for_empty_payload() {
        let d = normalized(json!({}));
        assert_eq!(d.donor_name, "Anonymous");
        assert_eq!(d.amount, 0);
        assert_eq!(d.message, "");
        assert_eq!(d.external_id, format!("donation_{}", at().timestamp_millis()));
    }

    #[test]
    fn test_non_object_body_normalizes_like_empty() {
        assert_eq!(normalized(json!("junk")), normalized(json!({})));
    }

    #[test]
    fn test_amount_coercion() {
        let cases = [
            (json!("5000.50"), 5000),
            (json!("  12abc"), 12),
            (json!(99.9), 99),
            (json!(-40), 0),
            (json!("-40"), 0),
            (json!("abc"), 0),
            (json!(true), 0),
        ];
        for (raw, expected) in cases {
            let d = normalized(json!({ "amount": raw }));
            assert_eq!(d.amount, expected, "amount {:?}", raw);
        }
    }

    #[test]
    fn test_numeric_external_id_is_stringified() {
        let d = normalized(json!({ "id": 12345 }));
        assert_eq!(d.external_id, "12345");
    }
}
