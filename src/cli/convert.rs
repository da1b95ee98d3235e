//! JSON <-> exchange conversion utilities

use crate::{Exchange, Value};

const EXCHANGE_KEYS: &[&str] = &["body", "headers", "properties", "variables"];

/// Build an exchange from JSON input.
///
/// An object whose keys are all among `body`, `headers`, `properties` and
/// `variables` describes the exchange. Any other JSON becomes the body.
pub fn exchange_from_json(json: serde_json::Value) -> Exchange {
    let describes_exchange = matches!(
        &json,
        serde_json::Value::Object(obj)
            if !obj.is_empty() && obj.keys().all(|k| EXCHANGE_KEYS.contains(&k.as_str()))
    );
    if !describes_exchange {
        return Exchange::new(Value::from(json));
    }

    let mut exchange = Exchange::default();
    if let serde_json::Value::Object(obj) = json {
        for (key, value) in obj {
            match (key.as_str(), Value::from(value)) {
                ("body", body) => exchange.body = body,
                ("headers", Value::Object(map)) => exchange.headers = map,
                ("properties", Value::Object(map)) => exchange.properties = map,
                ("variables", Value::Object(map)) => exchange.variables = map,
                _ => {}
            }
        }
    }
    exchange
}

/// Convert a result value to JSON for printing.
pub fn value_to_json(value: Value) -> serde_json::Value {
    serde_json::Value::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exchange_object() {
        let exchange = exchange_from_json(json!({
            "body": "hi",
            "headers": {"age": 21}
        }));
        assert_eq!(exchange.body, Value::from("hi"));
        assert_eq!(exchange.header("age"), Some(&Value::Integer(21)));
    }

    #[test]
    fn test_other_json_is_body() {
        let exchange = exchange_from_json(json!({"name": "Ada"}));
        assert!(exchange.headers.is_empty());
        assert!(matches!(exchange.body, Value::Object(_)));
    }
}
