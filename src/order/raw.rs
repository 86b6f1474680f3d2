//! Untyped rows as they arrive from CSV cells or JSON objects

use super::validator::{EMAIL_KEYS, ORDER_ID_KEYS};
use serde_json::Value;
use std::collections::HashMap;

const UTF8_BOM: char = '\u{feff}';

/// One source row: column name to cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: HashMap<String, String>,
}

impl RawRow {
    /// Build a row by zipping header names with cell values.
    ///
    /// Header names are trimmed and a leading byte-order mark is dropped.
    /// Surplus values without a header are ignored.
    pub fn from_pairs<H, V>(headers: H, values: V) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let cells = headers
            .into_iter()
            .zip(values)
            .map(|(header, value)| {
                let name = header.as_ref().trim_start_matches(UTF8_BOM).trim();
                (name.to_string(), value.into())
            })
            .collect();
        Self { cells }
    }

    /// Convert a JSON element into a row; non-objects yield `None`.
    ///
    /// Strings are kept as-is, numbers and booleans are rendered as text,
    /// `null` drops the key, nested values become compact JSON text.
    /// `false` and `0` under an identifying key are dropped as well, so such
    /// records fail validation.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut cells = HashMap::with_capacity(object.len());
        for (key, value) in object {
            if is_identifying(key) && is_falsy(value) {
                continue;
            }
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            cells.insert(key.clone(), text);
        }
        Some(Self { cells })
    }

    /// Raw cell text for `key`, untouched.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells.get(key).map(String::as_str)
    }

    /// First non-blank value among `keys`, trimmed.
    pub fn first_present(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn is_identifying(key: &str) -> bool {
    ORDER_ID_KEYS.contains(&key) || EMAIL_KEYS.contains(&key)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_pairs_strips_bom_and_whitespace_from_headers() {
        let row = RawRow::from_pairs(
            ["\u{feff}orderId", " email "],
            ["A1".to_string(), "a@x.com".to_string()],
        );
        assert_eq!(row.get("orderId"), Some("A1"));
        assert_eq!(row.get("email"), Some("a@x.com"));
    }

    #[test]
    fn from_json_renders_scalars_and_drops_nulls() {
        let row = RawRow::from_json(&json!({
            "orderId": 123,
            "email": "a@x.com",
            "zip": null,
            "active": true
        }))
        .unwrap();

        assert_eq!(row.get("orderId"), Some("123"));
        assert_eq!(row.get("active"), Some("true"));
        assert_eq!(row.get("zip"), None);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn from_json_drops_falsy_identifying_values() {
        let row = RawRow::from_json(&json!({
            "orderId": 0,
            "email": false,
            "providerId": 0,
            "active": false
        }))
        .unwrap();

        assert_eq!(row.get("orderId"), None);
        assert_eq!(row.get("email"), None);
        assert_eq!(row.get("providerId"), Some("0"));
        assert_eq!(row.get("active"), Some("false"));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(RawRow::from_json(&json!("text")).is_none());
        assert!(RawRow::from_json(&json!([1, 2])).is_none());
        assert!(RawRow::from_json(&json!(null)).is_none());
    }

    #[test]
    fn first_present_skips_blank_values() {
        let row: RawRow = [("orderId", "  "), ("pwnOrderId", " B2 ")]
            .into_iter()
            .collect();
        assert_eq!(row.first_present(&["orderId", "pwnOrderId"]), Some("B2"));
        assert_eq!(row.first_present(&["missing"]), None);
    }
}
