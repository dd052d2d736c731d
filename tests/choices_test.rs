use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use soap_params::{Error, ParametersValidator, RegistryParser, ShapedValue};

fn validator() -> ParametersValidator {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/adwords_user_list_service.json");
    let registry = RegistryParser::new().load_file(path).unwrap();
    ParametersValidator::new(Arc::new(registry))
}

/// A mutate operation adding an expression rule list built from `items`
fn op_for_items(items: Value) -> Value {
    json!({
        "operator": "ADD",
        "operand": {
            "xsi_type": "ExpressionRuleUserList",
            "name": "choices test",
            "description": "A list of mars cruise customers in the last year",
            "rule": {"groups": [{"items": items}]}
        }
    })
}

/// Validates one mutate operation and returns the serialized `rule`
fn shaped_rule(op: Value) -> Value {
    let params = validator().validate("mutate", &[json!([op])]).unwrap();
    let operation = &params.get("operations").and_then(ShapedValue::as_list).unwrap()[0];
    let rule = operation.get("operand").and_then(|operand| operand.get("rule")).unwrap();
    serde_json::to_value(rule).unwrap()
}

fn number_item(name: &str, value: i64) -> Value {
    json!({
        "NumberRuleItem": {
            "xsi:type": "NumberRuleItem",
            "key": {"name": name},
            "op": "EQUALS",
            "value": value
        }
    })
}

#[test]
fn test_choices_one() {
    let op = op_for_items(json!([
        {"xsi_type": "NumberRuleItem", "key": {"name": "foo"}, "op": "EQUALS", "value": 42}
    ]));

    assert_eq!(
        shaped_rule(op),
        json!({"groups": [{"items": [number_item("foo", 42)]}]})
    );
}

#[test]
fn test_choices_keep_field_order() {
    let op = op_for_items(json!([
        {"value": 42, "op": "EQUALS", "xsi_type": "NumberRuleItem", "key": {"name": "foo"}}
    ]));
    let params = validator().validate("mutate", &[json!([op])]).unwrap();
    let operation = &params.get("operations").and_then(ShapedValue::as_list).unwrap()[0];
    let items = operation
        .get("operand")
        .and_then(|operand| operand.get("rule"))
        .and_then(|rule| rule.get("groups"))
        .and_then(ShapedValue::as_list)
        .and_then(|groups| groups[0].get("items"))
        .and_then(ShapedValue::as_list)
        .unwrap();

    assert!(matches!(items[0], ShapedValue::Choice(_)));
    assert_eq!(items[0].discriminator(), Some("NumberRuleItem"));
    assert_eq!(items[0].as_object().unwrap().order(), vec!["key", "op", "value"]);

    let json = serde_json::to_string(&items[0]).unwrap();
    assert_eq!(
        json,
        r#"{"NumberRuleItem":{"xsi:type":"NumberRuleItem","key":{"name":"foo"},"op":"EQUALS","value":42}}"#
    );
}

#[test]
fn test_choices_multiple_of_same_type() {
    let op = op_for_items(json!([
        {"xsi_type": "NumberRuleItem", "key": {"name": "foo"}, "op": "EQUALS", "value": 42},
        {"xsi_type": "NumberRuleItem", "key": {"name": "bar"}, "op": "EQUALS", "value": 84}
    ]));

    assert_eq!(
        shaped_rule(op),
        json!({"groups": [{"items": [number_item("foo", 42), number_item("bar", 84)]}]})
    );
}

#[test]
fn test_choices_different_types() {
    let op = op_for_items(json!([
        {"xsi_type": "NumberRuleItem", "key": {"name": "foo"}, "op": "EQUALS", "value": 42},
        {"xsi_type": "StringRuleItem", "key": {"name": "bar"}, "op": "EQUALS", "value": "baz"}
    ]));

    assert_eq!(
        shaped_rule(op),
        json!({"groups": [{"items": [
            number_item("foo", 42),
            {
                "StringRuleItem": {
                    "xsi:type": "StringRuleItem",
                    "key": {"name": "bar"},
                    "op": "EQUALS",
                    "value": "baz"
                }
            }
        ]}]})
    );
}

#[test]
fn test_choices_wrong_xsi_type() {
    let op = op_for_items(json!([
        {"xsi_type": "FooRuleItem", "key": {"name": "foo"}, "op": "EQUALS", "value": 42}
    ]));
    let result = validator().validate("mutate", &[json!([op])]);
    match result {
        Err(Error::TypeMismatch { path, .. }) => {
            assert_eq!(path, "operations[0].operand.rule.groups[0].items[0]");
        }
        other => panic!("expected a type mismatch, got {:?}", other),
    }
}

#[test]
fn test_choices_missing_xsi_type() {
    let op = op_for_items(json!([
        {"key": {"name": "foo"}, "op": "EQUALS", "value": 42}
    ]));
    let result = validator().validate("mutate", &[json!([op])]);
    assert!(matches!(result, Err(Error::TypeMismatch { .. })));
}

#[test]
fn test_choice_fields_checked_against_concrete_type() {
    // StringRuleItem operators are not valid for a number item
    let op = op_for_items(json!([
        {"xsi_type": "NumberRuleItem", "key": {"name": "foo"}, "op": "STARTS_WITH", "value": 42}
    ]));
    let result = validator().validate("mutate", &[json!([op])]);
    assert!(matches!(result, Err(Error::TypeMismatch { path, .. })
        if path == "operations[0].operand.rule.groups[0].items[0].op"));
}

#[test]
fn test_inherited_choices() {
    let op = json!({
        "operator": "ADD",
        "operand": {
            "xsi_type": "LogicalUserList",
            "name": "Sample Logical List",
            "status": "OPEN",
            "rules": [{
                "operator": "ANY",
                "rule_operands": [
                    {"xsi_type": "LogicalUserList", "id": 123456781},
                    {"xsi_type": "BasicUserList", "id": 123456782},
                    {"xsi_type": "LogicalUserList", "id": 123456783},
                    {"xsi_type": "ExpressionRuleUserList", "id": 123456784}
                ]
            }]
        }
    });

    let params = validator().validate("mutate", &[json!([op])]).unwrap();
    let operand = params.get("operations").and_then(ShapedValue::as_list).unwrap()[0]
        .get("operand")
        .unwrap();
    assert_eq!(operand.discriminator(), Some("LogicalUserList"));
    assert_eq!(operand.as_object().unwrap().order(), vec!["name", "status", "rules"]);

    let operands = operand
        .get("rules")
        .and_then(ShapedValue::as_list)
        .and_then(|rules| rules[0].get("rule_operands"))
        .and_then(ShapedValue::as_list)
        .unwrap();

    let expected = ["LogicalUserList", "BasicUserList", "LogicalUserList", "ExpressionRuleUserList"];
    assert_eq!(operands.len(), expected.len());
    for (operand, name) in operands.iter().zip(expected) {
        assert!(matches!(operand, ShapedValue::Object(_)));
        assert_eq!(operand.discriminator(), Some(name));
        assert_eq!(operand.get("id").and_then(ShapedValue::as_i64).map(|id| id > 0), Some(true));
    }

    let json = serde_json::to_value(&operands[1]).unwrap();
    assert_eq!(json, json!({"xsi:type": "BasicUserList", "id": 123456782}));
}

#[test]
fn test_abstract_operand_without_xsi_type() {
    let op = json!({"operator": "ADD", "operand": {"name": "no type"}});
    let result = validator().validate("mutate", &[json!([op])]);
    assert!(matches!(result, Err(Error::TypeMismatch { path, .. }) if path == "operations[0].operand"));
}

#[test]
fn test_abstract_operand_with_abstract_xsi_type() {
    let op = json!({"operator": "ADD", "operand": {"xsi_type": "RuleBasedUserList", "name": "abstract"}});
    let result = validator().validate("mutate", &[json!([op])]);
    assert!(matches!(result, Err(Error::TypeMismatch { .. })));
}

#[test]
fn test_unregistered_operand_type() {
    let op = json!({"operator": "ADD", "operand": {"xsi_type": "FooUserList", "id": 123}});
    let result = validator().validate("mutate", &[json!([op])]);
    assert!(matches!(result, Err(Error::TypeMismatch { path, .. }) if path == "operations[0].operand"));
}

#[test]
fn test_choice_number_value_passes_through() {
    let op = op_for_items(json!([
        {"xsi_type": "NumberRuleItem", "key": {"name": "big"}, "op": "EQUALS", "value": 9007199254740993_i64},
        {"xsi_type": "NumberRuleItem", "key": {"name": "half"}, "op": "EQUALS", "value": 0.5}
    ]));

    let rule = serde_json::to_string(&shaped_rule(op)).unwrap();
    assert!(rule.contains(r#""value":9007199254740993"#), "{}", rule);
    assert!(rule.contains(r#""value":0.5"#), "{}", rule);
}
