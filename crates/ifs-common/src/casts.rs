//! Declared field casts applied to records before deserialization.
//!
//! IFS projections are not consistent about scalar encodings: booleans show
//! up as `"TRUE"`, numbers as strings, dates with or without a time part.
//! Each typed record declares a table of `field → FieldCast`, and
//! [`cast_fields`] coerces the raw JSON object to match it.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

/// Target representation of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCast {
    /// JSON string; numbers and booleans are stringified.
    String,
    /// JSON number; numeric strings are parsed.
    Number,
    /// JSON boolean; accepts `true/false`, `"TRUE"/"FALSE"`, `"1"/"0"`, `1/0`.
    Boolean,
    /// Calendar date normalized to `YYYY-MM-DD`.
    Date,
    /// JSON array; `null` becomes `[]` and an OData `{"value": [...]}` wrapper
    /// is unwrapped.
    NestedList,
}

/// A declared cast table for one record type.
pub type CastTable = &'static [(&'static str, FieldCast)];

/// Coerces a single value to the given cast.
///
/// `null` passes through unchanged, except for [`FieldCast::NestedList`]
/// which turns it into an empty array.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as the target type.
pub fn cast_value(field: &str, value: Value, cast: FieldCast) -> Result<Value> {
    match (cast, value) {
        (FieldCast::NestedList, Value::Null) => Ok(Value::Array(Vec::new())),
        (_, Value::Null) => Ok(Value::Null),

        (FieldCast::String, v @ Value::String(_)) => Ok(v),
        (FieldCast::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (FieldCast::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

        (FieldCast::Number, v @ Value::Number(_)) => Ok(v),
        (FieldCast::Number, Value::String(s)) => parse_number(s.trim())
            .ok_or_else(|| anyhow!("field {field}: {s:?} is not a number")),

        (FieldCast::Boolean, v @ Value::Bool(_)) => Ok(v),
        (FieldCast::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => bail!("field {field}: {s:?} is not a boolean"),
        },
        (FieldCast::Boolean, Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => bail!("field {field}: {n} is not a boolean"),
        },

        (FieldCast::Date, Value::String(s)) => parse_date(s.trim())
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| anyhow!("field {field}: {s:?} is not a date")),

        (FieldCast::NestedList, v @ Value::Array(_)) => Ok(v),
        (FieldCast::NestedList, Value::Object(mut object)) => match object.remove("value") {
            Some(v @ Value::Array(_)) => Ok(v),
            _ => bail!("field {field}: expected a list"),
        },

        (cast, other) => bail!("field {field}: cannot cast {other} to {cast:?}"),
    }
}

/// Applies a cast table to a record in place.
///
/// Fields missing from the record are left missing. Fields present in the
/// record but absent from the table are returned so callers can log them.
///
/// # Errors
///
/// Returns the first cast failure.
pub fn cast_fields(record: &mut Map<String, Value>, table: CastTable) -> Result<Vec<String>> {
    for (field, cast) in table {
        if let Some(value) = record.remove(*field) {
            record.insert((*field).to_string(), cast_value(field, value, *cast)?);
        }
    }

    Ok(record
        .keys()
        .filter(|key| !key.starts_with('@') && !table.iter().any(|(field, _)| field == key))
        .cloned()
        .collect())
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_boolean_casts() {
        assert_eq!(cast_value("f", json!("TRUE"), FieldCast::Boolean).unwrap(), json!(true));
        assert_eq!(cast_value("f", json!("0"), FieldCast::Boolean).unwrap(), json!(false));
        assert_eq!(cast_value("f", json!(1), FieldCast::Boolean).unwrap(), json!(true));
        assert!(cast_value("f", json!("maybe"), FieldCast::Boolean).is_err());
        assert!(cast_value("f", json!(2), FieldCast::Boolean).is_err());
    }

    #[test]
    fn test_number_casts() {
        assert_eq!(cast_value("f", json!("12"), FieldCast::Number).unwrap(), json!(12));
        assert_eq!(cast_value("f", json!("12.5"), FieldCast::Number).unwrap(), json!(12.5));
        assert_eq!(cast_value("f", json!(3), FieldCast::Number).unwrap(), json!(3));
        assert!(cast_value("f", json!("abc"), FieldCast::Number).is_err());
        assert!(cast_value("f", json!(true), FieldCast::Number).is_err());
    }

    #[test]
    fn test_string_casts() {
        assert_eq!(cast_value("f", json!(42), FieldCast::String).unwrap(), json!("42"));
        assert_eq!(cast_value("f", json!(false), FieldCast::String).unwrap(), json!("false"));
        assert!(cast_value("f", json!([1]), FieldCast::String).is_err());
    }

    #[test]
    fn test_date_casts() {
        assert_eq!(
            cast_value("f", json!("2025-03-03"), FieldCast::Date).unwrap(),
            json!("2025-03-03")
        );
        assert_eq!(
            cast_value("f", json!("2025-03-03T10:15:00Z"), FieldCast::Date).unwrap(),
            json!("2025-03-03")
        );
        assert_eq!(
            cast_value("f", json!("2025-03-03T10:15:00"), FieldCast::Date).unwrap(),
            json!("2025-03-03")
        );
        assert!(cast_value("f", json!("03/03/2025"), FieldCast::Date).is_err());
    }

    #[test]
    fn test_nested_list_casts() {
        assert_eq!(cast_value("f", Value::Null, FieldCast::NestedList).unwrap(), json!([]));
        assert_eq!(
            cast_value("f", json!({"value": [{"a": 1}]}), FieldCast::NestedList).unwrap(),
            json!([{"a": 1}])
        );
        assert!(cast_value("f", json!("x"), FieldCast::NestedList).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(cast_value("f", Value::Null, FieldCast::Date).unwrap(), Value::Null);
    }

    #[test]
    fn test_cast_fields_reports_unknown() {
        const TABLE: CastTable = &[("Active", FieldCast::Boolean), ("Limit", FieldCast::Number)];

        let mut record = json!({
            "@odata.etag": "W/\"1\"",
            "Active": "TRUE",
            "Limit": "100",
            "Colour": "blue"
        })
        .as_object()
        .cloned()
        .unwrap();

        let unknown = cast_fields(&mut record, TABLE).unwrap();
        assert_eq!(unknown, vec!["Colour".to_string()]);
        assert_eq!(record["Active"], json!(true));
        assert_eq!(record["Limit"], json!(100));
    }

    #[test]
    fn test_cast_fields_error_names_field() {
        const TABLE: CastTable = &[("Active", FieldCast::Boolean)];
        let mut record = json!({"Active": "perhaps"}).as_object().cloned().unwrap();
        let err = cast_fields(&mut record, TABLE).unwrap_err();
        assert!(err.to_string().contains("Active"));
    }
}
