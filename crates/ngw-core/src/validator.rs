//! Shape checks for server replies.
//!
//! Nothing in a NextGIS Web reply is read before it passes one of these
//! predicates. The typed accessors below run the matching predicate first and
//! only then look at the value.

use serde_json::{Map, Value};

/// Returns `true` if the value is present and a JSON object.
#[must_use]
pub fn is_object(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Object(_)))
}

/// Returns `true` if the value is present and an array with at least one item.
#[must_use]
pub fn is_non_empty_array(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Array(items)) if !items.is_empty())
}

/// Returns `true` if the value is present and a JSON string.
#[must_use]
pub fn is_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(_)))
}

/// Returns `true` if the value is present and an integer that fits `i64`.
///
/// Floats such as `7.0` are rejected.
#[must_use]
pub fn is_integer(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_i64)
}

/// Borrow the value as an object if [`is_object`] holds.
#[must_use]
pub fn object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    if !is_object(value) {
        return None;
    }
    value.and_then(Value::as_object)
}

/// Borrow the value as a slice if [`is_non_empty_array`] holds.
#[must_use]
pub fn non_empty_array(value: Option<&Value>) -> Option<&[Value]> {
    if !is_non_empty_array(value) {
        return None;
    }
    value.and_then(Value::as_array).map(Vec::as_slice)
}

/// Borrow the value as `&str` if [`is_string`] holds.
#[must_use]
pub fn string(value: Option<&Value>) -> Option<&str> {
    if !is_string(value) {
        return None;
    }
    value.and_then(Value::as_str)
}

/// Read the value as `i64` if [`is_integer`] holds.
#[must_use]
pub fn integer(value: Option<&Value>) -> Option<i64> {
    if !is_integer(value) {
        return None;
    }
    value.and_then(Value::as_i64)
}

/// Look up `key` in `container` after checking that the container is an object.
#[must_use]
pub fn member<'a>(container: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    object(container).and_then(|map| map.get(key))
}
