use crate::value::Value;

/// A segment in a navigation path into a body, header or variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Object field access by name
    ///
    /// # Examples
    /// - `body.user` → `Field("user")`
    /// - `body[user][email]` → `[Field("user"), Field("email")]`
    /// - `body['first name']` → `Field("first name")`
    Field(String),

    /// Array element access by index
    ///
    /// # Examples
    /// - `body.items[0]` → `[Field("items"), Index(0)]`
    /// - `body[-1]` → `Index(-1)` (counts from the end)
    ///
    /// # Note
    /// On objects an index falls back to the field of the same name, so
    /// `header.codes[0]` also works when `codes` is a map keyed by `"0"`.
    Index(i64),
}

/// A sequence of path segments, applied left to right.
pub type Path = Vec<PathSegment>;

/// Parse the remainder of a function after its name, such as `.user.name`,
/// `[0].price` or `?.address`.
///
/// A leading name without a dot is accepted as well, so `parse_path("a.b")`
/// equals `parse_path(".a.b")`. `?.` is treated like `.`: missing values
/// already navigate to null.
pub fn parse_path(text: &str) -> Result<Path, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut position = 0;

    while position < chars.len() {
        match chars[position] {
            '?' if chars.get(position + 1) == Some(&'.') => {
                position += 1;
            }
            '.' => {
                position += 1;
                let name = read_name(&chars, &mut position);
                if name.is_empty() {
                    return Err(format!("Empty field name in path: {}", text));
                }
                segments.push(PathSegment::Field(name));
            }
            '[' => {
                position += 1;
                let start = position;
                while position < chars.len() && chars[position] != ']' {
                    position += 1;
                }
                if position >= chars.len() {
                    return Err(format!("Missing ] in path: {}", text));
                }
                let key: String = chars[start..position].iter().collect();
                position += 1;
                segments.push(bracket_segment(key.trim()));
            }
            _ if segments.is_empty() && position == 0 => {
                let name = read_name(&chars, &mut position);
                if name.is_empty() {
                    return Err(format!("Invalid path: {}", text));
                }
                segments.push(PathSegment::Field(name));
            }
            ch => return Err(format!("Unexpected character '{}' in path: {}", ch, text)),
        }
    }

    Ok(segments)
}

fn read_name(chars: &[char], position: &mut usize) -> String {
    let mut name = String::new();
    while let Some(&ch) = chars.get(*position) {
        if ch == '.' || ch == '[' || ch == '?' {
            break;
        }
        name.push(ch);
        *position += 1;
    }
    name
}

fn bracket_segment(key: &str) -> PathSegment {
    let unquoted = key
        .strip_prefix('\'')
        .and_then(|k| k.strip_suffix('\''))
        .or_else(|| key.strip_prefix('"').and_then(|k| k.strip_suffix('"')));
    if let Some(field) = unquoted {
        return PathSegment::Field(field.to_string());
    }
    match key.parse::<i64>() {
        Ok(index) => PathSegment::Index(index),
        Err(_) => PathSegment::Field(key.to_string()),
    }
}

/// Follow `path` from `value`. Anything that cannot be navigated yields null.
///
/// `size` and `length` on arrays, maps and strings without a field of that
/// name return the element count.
pub fn navigate(value: &Value, path: &[PathSegment]) -> Value {
    let mut current = value;
    for (position, segment) in path.iter().enumerate() {
        let next = match (current, segment) {
            (Value::Object(map), PathSegment::Field(key)) => map.get(key),
            (Value::Object(map), PathSegment::Index(idx)) => map.get(&idx.to_string()),
            (Value::Array(arr), PathSegment::Index(idx)) => resolve_index(arr.len(), *idx)
                .and_then(|i| arr.get(i)),
            (Value::Array(arr), PathSegment::Field(key)) => match key.parse::<i64>() {
                Ok(idx) => resolve_index(arr.len(), idx).and_then(|i| arr.get(i)),
                Err(_) => None,
            },
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => {
                let is_last = position + 1 == path.len();
                return match segment {
                    PathSegment::Field(key) if is_last && (key == "size" || key == "length") => {
                        element_count(current).map(Value::Integer).unwrap_or(Value::Null)
                    }
                    _ => Value::Null,
                };
            }
        }
    }
    current.clone()
}

fn element_count(value: &Value) -> Option<i64> {
    match value {
        Value::Array(arr) => Some(arr.len() as i64),
        Value::Object(map) => Some(map.len() as i64),
        Value::String(s) => Some(s.chars().count() as i64),
        _ => None,
    }
}

fn resolve_index(len: usize, idx: i64) -> Option<usize> {
    if idx < 0 {
        let abs = idx.unsigned_abs() as usize;
        if abs > len { None } else { Some(len - abs) }
    } else {
        Some(idx as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn order() -> Value {
        let mut customer = HashMap::new();
        customer.insert("name".to_string(), Value::from("Ada"));
        let mut root = HashMap::new();
        root.insert("customer".to_string(), Value::Object(customer));
        root.insert(
            "items".to_string(),
            Value::Array(vec![Value::Integer(3), Value::Integer(7)]),
        );
        Value::Object(root)
    }

    #[test]
    fn test_parse_dotted_and_bracketed() {
        assert_eq!(
            parse_path(".items[0]").unwrap(),
            vec![PathSegment::Field("items".into()), PathSegment::Index(0)]
        );
        assert_eq!(
            parse_path("customer?.name").unwrap(),
            vec![
                PathSegment::Field("customer".into()),
                PathSegment::Field("name".into())
            ]
        );
        assert_eq!(
            parse_path("['first name']").unwrap(),
            vec![PathSegment::Field("first name".into())]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_path(".a..b").is_err());
        assert!(parse_path("[0").is_err());
    }

    #[test]
    fn test_navigate() {
        let doc = order();
        assert_eq!(
            navigate(&doc, &parse_path("customer.name").unwrap()),
            Value::from("Ada")
        );
        assert_eq!(navigate(&doc, &parse_path("items[-1]").unwrap()), Value::Integer(7));
        assert_eq!(navigate(&doc, &parse_path("items.size").unwrap()), Value::Integer(2));
        assert_eq!(navigate(&doc, &parse_path("missing.deeper").unwrap()), Value::Null);
    }
}
