//! Helpers for inspecting generic JSON values.

use serde_json::Value;

/// Render a scalar as a string: strings as-is, numbers and booleans in their
/// JSON spelling. Null, arrays and objects yield `None`.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Short name of a value's JSON type, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Describe an optional value for error messages, e.g. `"paragraph"` or `none`
pub fn describe(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => format!("{:?}", s),
        Some(other) => other.to_string(),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_string() {
        assert_eq!(scalar_string(&json!("x")), Some("x".to_string()));
        assert_eq!(scalar_string(&json!(12)), Some("12".to_string()));
        assert_eq!(scalar_string(&json!(true)), Some("true".to_string()));
        assert_eq!(scalar_string(&json!(null)), None);
        assert_eq!(scalar_string(&json!(["a"])), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(Some(&json!("paragraph"))), "\"paragraph\"");
        assert_eq!(describe(Some(&json!(3))), "3");
        assert_eq!(describe(None), "none");
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind(&json!([])), "an array");
        assert_eq!(value_kind(&json!({})), "an object");
    }
}
