// Utility functions for the schema module
//
// This module provides shared utility functions used by other schema submodules.

use serde_json::{Number, Value};

use crate::schema::types::Primitive;

/// Converts a JSON number to an integer of the given primitive's width
///
/// Returns `None` when the number is fractional or out of range for the
/// primitive (`int` is 32-bit, `long` is 64-bit).
pub fn integer_for(primitive: Primitive, number: &Number) -> Option<i64> {
    let value = number.as_i64()?;
    match primitive {
        Primitive::Int => {
            if value < i32::MIN as i64 || value > i32::MAX as i64 {
                None
            } else {
                Some(value)
            }
        },
        Primitive::Long => Some(value),
        _ => None,
    }
}

/// Describes the JSON kind of a value for error messages
pub fn describe_json(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Appends a key to a dotted value path
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Appends a sequence index to a value path
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Converts a snake_case method name into its SOAP action name
///
/// `get_pending_invitations` becomes `getPendingInvitations`.
pub fn soap_action_name(method: &str) -> String {
    let mut action = String::with_capacity(method.len());
    let mut upper_next = false;
    for c in method.chars() {
        if c == '_' {
            upper_next = !action.is_empty();
        } else if upper_next {
            action.extend(c.to_uppercase());
            upper_next = false;
        } else {
            action.push(c);
        }
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(value: Value) -> Number {
        match value {
            Value::Number(n) => n,
            other => panic!("Expected a number, got {:?}", other),
        }
    }

    #[test]
    fn test_int_range() {
        assert_eq!(integer_for(Primitive::Int, &number(json!(42))), Some(42));
        assert_eq!(integer_for(Primitive::Int, &number(json!(2147483648_i64))), None);
        assert_eq!(integer_for(Primitive::Int, &number(json!(-2147483648_i64))), Some(-2147483648));
        assert_eq!(integer_for(Primitive::Int, &number(json!(1.5))), None);
    }

    #[test]
    fn test_long_range() {
        assert_eq!(integer_for(Primitive::Long, &number(json!(123456781))), Some(123456781));
        assert_eq!(integer_for(Primitive::Long, &number(json!(u64::MAX))), None);
    }

    #[test]
    fn test_paths() {
        assert_eq!(child_path("", "operations"), "operations");
        assert_eq!(child_path(&index_path("operations", 0), "operand"), "operations[0].operand");
    }

    #[test]
    fn test_soap_action_name() {
        assert_eq!(soap_action_name("get"), "get");
        assert_eq!(soap_action_name("get_pending_invitations"), "getPendingInvitations");
        assert_eq!(soap_action_name("mutate_link"), "mutateLink");
        assert_eq!(
            soap_action_name("get_product_package_items_by_statement"),
            "getProductPackageItemsByStatement"
        );
    }
}
