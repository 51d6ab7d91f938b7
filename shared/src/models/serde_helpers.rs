//! Serde helpers for gateway rows
//!
//! The hosted backend does not guarantee the stored type of the medical
//! flag: historical rows carry booleans, numbers, or strings. Normalization
//! happens once here; every consumer works with a plain `bool`.

use serde::{Deserialize, Deserializer};

/// Tolerant truthiness for the medical-enrollment flag.
///
/// True for `true`, `1`, `"true"`, `"1"`, `"yes"`, `"y"` (case-insensitive);
/// false for everything else, including null and absent values.
pub fn medical_flag_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        serde_json::Value::String(s) => {
            let s = s.trim().to_lowercase();
            matches!(s.as_str(), "true" | "1" | "yes" | "y")
        }
        _ => false,
    }
}

/// Deserializer for `medical` columns: `#[serde(deserialize_with = ...)]`.
pub fn medical_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(medical_flag_value).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy_inputs() {
        for v in [json!(true), json!("true"), json!(1), json!("1"), json!("yes"), json!("YES"), json!("y")] {
            assert!(medical_flag_value(&v), "expected truthy: {v}");
        }
    }

    #[test]
    fn test_falsy_inputs() {
        for v in [json!(false), json!(0), json!(""), json!("no"), json!(null)] {
            assert!(!medical_flag_value(&v), "expected falsy: {v}");
        }
    }

    #[test]
    fn test_deserialize_missing_field() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "medical_flag")]
            medical: bool,
        }
        let row: Row = serde_json::from_str("{}").unwrap();
        assert!(!row.medical);
        let row: Row = serde_json::from_str(r#"{"medical":"Y"}"#).unwrap();
        assert!(row.medical);
    }
}
