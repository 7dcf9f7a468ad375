use serde_json::Value;
use std::cmp::Ordering;

/// One record of tabular data.
///
/// Rows are opaque to the table: every field is reached through a dotted
/// key path such as `"address.city"` or `"tags.0"`.
pub type Row = Value;

/// Resolve a dotted key path inside a row.
///
/// Object segments are matched by key, array segments by numeric index.
/// A missing segment or an explicit `null` both resolve to `None`, so callers
/// never have to distinguish "absent" from "null".
///
/// # Arguments
/// * `row` - The row to read from
/// * `path` - Dotted key path (e.g. `"owner.name"`)
///
/// # Returns
/// * `Option<&Value>` - The value at the path, or `None` if absent/null
///
/// # Examples
/// ```
/// use datatable::row::lookup;
/// use serde_json::json;
///
/// let row = json!({"owner": {"name": "Ada"}, "tags": ["x", "y"]});
/// assert_eq!(lookup(&row, "owner.name"), Some(&json!("Ada")));
/// assert_eq!(lookup(&row, "tags.1"), Some(&json!("y")));
/// assert_eq!(lookup(&row, "owner.email"), None);
/// ```
pub fn lookup<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    let mut current = row;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    if current.is_null() { None } else { Some(current) }
}

/// Coerce a looked-up value to its display string.
///
/// Missing values become the empty string. Nested arrays and objects are
/// rendered as compact JSON.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Case-insensitive substring test against a value's display string.
///
/// Arrays and objects match when any of their leaf values does; key names
/// are never searched. `needle` must already be lowercased.
pub fn contains_ignore_case(value: Option<&Value>, needle: &str) -> bool {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| contains_ignore_case(Some(item), needle)),
        Some(Value::Object(map)) => map
            .values()
            .any(|item| contains_ignore_case(Some(item), needle)),
        _ => display_value(value).to_lowercase().contains(needle),
    }
}

/// Native ordering between two present values.
///
/// Numbers compare numerically, strings lexicographically and booleans as
/// `false < true`. Values of different kinds are never coerced into each
/// other; they are grouped by kind (booleans, numbers, strings, then nested
/// values) so the order stays total. Nested arrays and objects compare equal.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) | Value::Object(_) => 4,
    }
}

/// Read a row's identity at `row_key`.
///
/// Strings are used verbatim, every other present value by its display
/// string. Returns `None` when the row has nothing at that path.
pub fn row_identity(row: &Row, row_key: &str) -> Option<String> {
    lookup(row, row_key).map(|value| display_value(Some(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_treats_null_as_missing() {
        let row = json!({"a": null, "b": {"c": 0}});
        assert_eq!(lookup(&row, "a"), None);
        assert_eq!(lookup(&row, "b.c"), Some(&json!(0)));
        assert_eq!(lookup(&row, "b.c.d"), None);
    }

    #[test]
    fn display_of_numbers_and_bools() {
        assert_eq!(display_value(Some(&json!(42))), "42");
        assert_eq!(display_value(Some(&json!(1.5))), "1.5");
        assert_eq!(display_value(Some(&json!(true))), "true");
        assert_eq!(display_value(None), "");
    }

    #[test]
    fn mixed_kinds_group_by_kind() {
        assert_eq!(compare_values(&json!(1), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!([1]), &json!({"a": 1})), Ordering::Equal);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }

    #[test]
    fn identity_from_numeric_key() {
        let row = json!({"id": 7, "meta": {"uid": "u-1"}});
        assert_eq!(row_identity(&row, "id"), Some("7".to_string()));
        assert_eq!(row_identity(&row, "meta.uid"), Some("u-1".to_string()));
        assert_eq!(row_identity(&row, "missing"), None);
    }
}
