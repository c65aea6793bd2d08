//! Declared-type compatibility checks.
//!
//! Maps a column's declared type name onto a small set of type families and
//! tests whether a record value fits the family. Type names the checker does
//! not recognize are treated as compatible: the database still enforces
//! them, and blocking on an unfamiliar catalog type would reject valid
//! records. This is a known gap, covered by tests.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::trace;

use crate::value::Value;

/// Type families recognized by the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    /// `uuid`.
    Identifier,
    /// `text`, `varchar`, `char` and their long forms.
    Text,
    /// `integer`, `int`, `smallint`, `bigint`.
    Integer,
    /// `numeric`, `decimal`, `real`, `double precision`, `float`.
    Decimal,
    /// `boolean`.
    Boolean,
    /// `date`, `timestamp`, `timestamp with/without time zone`.
    Temporal,
    /// `json`, `jsonb`.
    Structured,
    /// Any type ending in `[]`.
    Array,
    /// Anything else. Always compatible.
    Unknown,
}

impl TypeFamily {
    /// Classify a declared type name.
    ///
    /// Matching is case-insensitive and ignores length/precision modifiers,
    /// so `VARCHAR(255)` and `numeric(10,2)` classify like their bare names.
    pub fn from_declared(declared: &str) -> Self {
        let normalized = normalize(declared);

        if normalized.ends_with("[]") || normalized == "array" {
            return TypeFamily::Array;
        }

        match normalized.as_str() {
            "uuid" => TypeFamily::Identifier,
            "text" | "varchar" | "char" | "character" | "character varying" | "bpchar"
            | "citext" => TypeFamily::Text,
            "integer" | "int" | "smallint" | "bigint" | "int2" | "int4" | "int8" => {
                TypeFamily::Integer
            }
            "numeric" | "decimal" | "real" | "double precision" | "float" | "float4"
            | "float8" => TypeFamily::Decimal,
            "boolean" | "bool" => TypeFamily::Boolean,
            "date" | "timestamp" | "timestamptz" | "timestamp with time zone"
            | "timestamp without time zone" => TypeFamily::Temporal,
            "json" | "jsonb" => TypeFamily::Structured,
            _ => TypeFamily::Unknown,
        }
    }

    /// Check if a non-null value belongs to this family.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeFamily::Identifier => matches!(value, Value::String(s) if is_canonical_uuid(s)),
            TypeFamily::Text => matches!(value, Value::String(_)),
            TypeFamily::Integer => match value {
                Value::Int(_) => true,
                Value::Float(f) => f.is_finite() && f.fract() == 0.0,
                _ => false,
            },
            TypeFamily::Decimal => matches!(value, Value::Int(_) | Value::Float(_)),
            TypeFamily::Boolean => matches!(value, Value::Bool(_)),
            TypeFamily::Temporal => match value {
                Value::Timestamp(_) => true,
                Value::String(s) => parses_as_datetime(s),
                _ => false,
            },
            TypeFamily::Structured => match value {
                Value::Object(_) | Value::Array(_) => true,
                Value::String(s) => serde_json::from_str::<serde_json::Value>(s).is_ok(),
                _ => false,
            },
            TypeFamily::Array => matches!(value, Value::Array(_)),
            TypeFamily::Unknown => true,
        }
    }
}

/// Check if a value is acceptable for a column of the given declared type.
///
/// Null is always compatible; nullability is the validator's concern.
pub fn is_compatible(value: &Value, declared_type: &str) -> bool {
    if value.is_null() {
        return true;
    }

    let family = TypeFamily::from_declared(declared_type);
    if family == TypeFamily::Unknown {
        trace!(declared_type, "unrecognized column type, accepting value");
    }
    family.accepts(value)
}

/// Lower-case, drop `(...)` modifiers and collapse whitespace.
fn normalize(declared: &str) -> String {
    let mut stripped = String::with_capacity(declared.len());
    let mut depth = 0usize;
    for c in declared.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical 8-4-4-4-12 hexadecimal grouping.
fn is_canonical_uuid(s: &str) -> bool {
    const DASHES: [usize; 4] = [8, 13, 18, 23];

    s.len() == 36
        && s.bytes().enumerate().all(|(i, b)| {
            if DASHES.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_hexdigit()
            }
        })
}

/// Date or date-time text, with or without an offset.
fn parses_as_datetime(s: &str) -> bool {
    const WITH_OFFSET: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];
    const NAIVE: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let s = s.trim();
    DateTime::parse_from_rfc3339(s).is_ok()
        || WITH_OFFSET
            .iter()
            .any(|fmt| DateTime::parse_from_str(s, fmt).is_ok())
        || NAIVE
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    #[test]
    fn test_uuid() {
        assert!(is_compatible(
            &"123e4567-e89b-12d3-a456-426614174000".into(),
            "uuid"
        ));
        assert!(is_compatible(
            &"123E4567-E89B-12D3-A456-426614174000".into(),
            "UUID"
        ));
        assert!(!is_compatible(&"not-a-uuid".into(), "uuid"));
        assert!(!is_compatible(
            &"123e4567e89b12d3a456426614174000".into(),
            "uuid"
        ));
        assert!(!is_compatible(
            &"123e4567-e89b-12d3-a456-42661417400g".into(),
            "uuid"
        ));
        assert!(!is_compatible(&Value::Int(1), "uuid"));
    }

    #[test]
    fn test_integer() {
        assert!(is_compatible(&Value::Int(5), "integer"));
        assert!(is_compatible(&Value::Float(5.0), "bigint"));
        assert!(!is_compatible(&Value::Float(5.5), "integer"));
        assert!(!is_compatible(&Value::Float(f64::INFINITY), "int"));
        assert!(!is_compatible(&"5".into(), "smallint"));
    }

    #[test]
    fn test_decimal() {
        assert!(is_compatible(&Value::Float(5.5), "numeric(10,2)"));
        assert!(is_compatible(&Value::Int(5), "double precision"));
        assert!(!is_compatible(&"5.5".into(), "real"));
        assert!(!is_compatible(&Value::Bool(true), "decimal"));
    }

    #[test]
    fn test_text() {
        assert!(is_compatible(&"hello".into(), "text"));
        assert!(is_compatible(&"hello".into(), "VARCHAR(255)"));
        assert!(is_compatible(&"hello".into(), "character varying"));
        assert!(!is_compatible(&Value::Int(1), "text"));
    }

    #[test]
    fn test_boolean() {
        assert!(is_compatible(&Value::Bool(false), "boolean"));
        assert!(!is_compatible(&"true".into(), "boolean"));
        assert!(!is_compatible(&Value::Int(1), "bool"));
    }

    #[test]
    fn test_temporal() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert!(is_compatible(&Value::Timestamp(ts), "timestamp with time zone"));
        assert!(is_compatible(&"2024-03-01".into(), "date"));
        assert!(is_compatible(&"2024-03-01T12:00:00Z".into(), "timestamptz"));
        assert!(is_compatible(&"2024-03-01T12:00:00.123+02:00".into(), "timestamp"));
        assert!(is_compatible(&"2024-03-01 12:00:00+00".into(), "timestamp"));
        assert!(is_compatible(
            &"2024-03-01 12:00:00.5".into(),
            "timestamp without time zone"
        ));
        assert!(!is_compatible(&"2024-02-30".into(), "date"));
        assert!(!is_compatible(&"yesterday".into(), "date"));
        assert!(!is_compatible(&Value::Int(1_700_000_000), "timestamp"));
    }

    #[test]
    fn test_structured() {
        assert!(is_compatible(&Value::Object(BTreeMap::new()), "jsonb"));
        assert!(is_compatible(&Value::Array(vec![]), "json"));
        assert!(is_compatible(&r#"{"a": 1}"#.into(), "jsonb"));
        assert!(!is_compatible(&"{not json".into(), "json"));
        assert!(!is_compatible(&Value::Bool(true), "json"));
    }

    #[test]
    fn test_array() {
        let tags = Value::from(vec!["a", "b"]);
        assert!(is_compatible(&tags, "text[]"));
        assert!(is_compatible(&tags, "ARRAY"));
        // Elements are not checked.
        assert!(is_compatible(&Value::from(vec![1i64, 2]), "text[]"));
        assert!(!is_compatible(&"a,b".into(), "text[]"));
    }

    #[test]
    fn test_null_always_compatible() {
        for declared in ["uuid", "integer", "boolean", "jsonb", "text[]", "geometry"] {
            assert!(is_compatible(&Value::Null, declared), "{declared}");
        }
    }

    #[test]
    fn test_unknown_type_fails_open() {
        assert_eq!(TypeFamily::from_declared("tsvector"), TypeFamily::Unknown);
        assert!(is_compatible(&Value::Int(1), "tsvector"));
        assert!(is_compatible(&"anything".into(), "USER-DEFINED"));
    }

    #[test]
    fn test_family_classification() {
        assert_eq!(TypeFamily::from_declared(" Integer "), TypeFamily::Integer);
        assert_eq!(
            TypeFamily::from_declared("timestamp(3)  with time zone"),
            TypeFamily::Temporal
        );
        assert_eq!(TypeFamily::from_declared("varchar(20)[]"), TypeFamily::Array);
        assert_eq!(TypeFamily::from_declared("character(2)"), TypeFamily::Text);
    }
}
