//! Loosely-typed remote rows

use serde_json::{Map, Number, Value};

/// A row as returned by a remote collection
pub type Record = Map<String, Value>;

/// Read `field` from a record as text
///
/// Strings are returned as-is and numbers in their JSON rendering, with
/// integral floats written without a fraction (`7.0` reads as `"7"`). Any
/// other value (null, bool, nested) counts as absent.
#[must_use]
pub fn record_field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        _ => None,
    }
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn strings_and_numbers_are_text() {
        let r = record(json!({ "areaNumber": "AREA-04", "seq": 7, "flag": true }));
        assert_eq!(record_field_text(&r, "areaNumber").as_deref(), Some("AREA-04"));
        assert_eq!(record_field_text(&r, "seq").as_deref(), Some("7"));
        assert_eq!(record_field_text(&r, "flag"), None);
        assert_eq!(record_field_text(&r, "missing"), None);
    }

    #[test]
    fn integral_floats_drop_the_fraction() {
        let r = record(json!({ "a": 7.0, "b": -12.0, "c": 7.5 }));
        assert_eq!(record_field_text(&r, "a").as_deref(), Some("7"));
        assert_eq!(record_field_text(&r, "b").as_deref(), Some("-12"));
        assert_eq!(record_field_text(&r, "c").as_deref(), Some("7.5"));
    }
}
