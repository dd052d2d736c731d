// Registry definition parser
//
// This module reads the declarative JSON form of a service registry
// (method table + type table) and turns it into a checked `Registry`.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::internal::error::{Error, Result};
use crate::schema::registry::{Registry, RegistryKey};
use crate::schema::types::{FieldDescriptor, MaxOccurs, MethodSignature, OutputDescriptor, TypeSchema};

/// Parser for JSON registry definitions
#[derive(Debug, Default)]
pub struct RegistryParser;

impl RegistryParser {
    /// Creates a new registry parser
    pub fn new() -> Self {
        Self
    }

    /// Reads and parses a registry file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Registry> {
        let text = fs::read_to_string(path)?;
        self.parse_str(&text)
    }

    /// Parses a registry from JSON text
    pub fn parse_str(&self, text: &str) -> Result<Registry> {
        let json: Value = serde_json::from_str(text)?;
        self.parse_registry(&json)
    }

    /// Parses a JSON registry definition into a Registry
    pub fn parse_registry(&self, json: &Value) -> Result<Registry> {
        // Validate that the input is an object
        let obj = match json {
            Value::Object(obj) => obj,
            _ => return Err(Error::RegistryError("Registry must be a JSON object".to_string())),
        };

        let key = RegistryKey {
            api: self.get_string_field(obj, "api")?,
            version: self.get_string_field(obj, "version")?,
            service: self.get_string_field(obj, "service")?,
        };
        let mut builder = Registry::builder(key);

        match obj.get("namespace") {
            Some(Value::String(ns)) => {
                builder.namespace(ns);
            },
            None | Some(Value::Null) => {},
            Some(_) => return Err(Error::RegistryError("Field 'namespace' must be a string".to_string())),
        }

        for (name, definition) in self.get_object_field(obj, "types")? {
            builder.add_type(self.parse_type(name, definition)?);
        }

        for (name, definition) in self.get_object_field(obj, "methods")? {
            builder.add_method(self.parse_method(name, definition)?);
        }

        builder.build()
    }

    /// Parses one entry of the type table
    fn parse_type(&self, name: &str, definition: &Value) -> Result<TypeSchema> {
        let obj = match definition {
            Value::Object(obj) => obj,
            _ => return Err(Error::RegistryError(format!("Type '{}' must be an object", name))),
        };

        // Simple types carry an enumeration instead of fields
        if let Some(enumerations) = obj.get("enumerations") {
            if obj.contains_key("fields") || obj.contains_key("base") {
                return Err(Error::RegistryError(format!(
                    "Enumeration '{}' cannot declare fields or a base", name
                )));
            }
            if let Some(Value::String(base_type)) = obj.get("type") {
                if base_type != "string" {
                    return Err(Error::RegistryError(format!(
                        "Enumeration '{}' must be string-valued, got '{}'", name, base_type
                    )));
                }
            }
            let values = self.parse_string_list(enumerations, &format!("enumerations of '{}'", name))?;
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            return Ok(TypeSchema::enumeration(name, &values));
        }

        let fields = match obj.get("fields") {
            Some(fields) => self.parse_fields(fields, name)?,
            None => Vec::new(),
        };
        let mut schema = TypeSchema::complex(name, fields);

        match obj.get("base") {
            Some(Value::String(base)) => schema = schema.with_base(base),
            None | Some(Value::Null) => {},
            Some(_) => return Err(Error::RegistryError(format!("Base of type '{}' must be a string", name))),
        }

        match obj.get("abstract") {
            Some(Value::Bool(true)) => schema = schema.abstract_type(),
            None | Some(Value::Bool(false)) => {},
            Some(_) => return Err(Error::RegistryError(format!("Abstract flag of type '{}' must be a boolean", name))),
        }

        Ok(schema)
    }

    /// Parses one entry of the method table
    fn parse_method(&self, name: &str, definition: &Value) -> Result<MethodSignature> {
        let obj = match definition {
            Value::Object(obj) => obj,
            _ => return Err(Error::RegistryError(format!("Method '{}' must be an object", name))),
        };

        let input = match obj.get("input") {
            Some(input) => self.parse_fields(input, name)?,
            None => Vec::new(),
        };

        let output = match obj.get("output") {
            Some(Value::Object(out)) => OutputDescriptor {
                name: match out.get("name") {
                    Some(Value::String(out_name)) => out_name.clone(),
                    _ => format!("{}_response", name),
                },
                fields: match out.get("fields") {
                    Some(fields) => self.parse_fields(fields, name)?,
                    None => Vec::new(),
                },
            },
            None | Some(Value::Null) => OutputDescriptor {
                name: format!("{}_response", name),
                fields: Vec::new(),
            },
            Some(_) => return Err(Error::RegistryError(format!("Output of method '{}' must be an object", name))),
        };

        Ok(MethodSignature {
            name: name.to_string(),
            input,
            output,
        })
    }

    /// Parses a list of field descriptors
    fn parse_fields(&self, fields: &Value, owner: &str) -> Result<Vec<FieldDescriptor>> {
        let items = match fields {
            Value::Array(items) => items,
            _ => return Err(Error::RegistryError(format!("Fields of '{}' must be an array", owner))),
        };
        items.iter().map(|item| self.parse_field(item, owner)).collect()
    }

    /// Parses a single field descriptor
    fn parse_field(&self, field: &Value, owner: &str) -> Result<FieldDescriptor> {
        let obj = match field {
            Value::Object(obj) => obj,
            _ => return Err(Error::RegistryError(format!("Field of '{}' must be an object", owner))),
        };

        let name = self.get_string_field(obj, "name")?;
        let type_name = self.get_string_field(obj, "type")?;

        let min_occurs = match obj.get("min_occurs") {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => 0,
                Some(1) => 1,
                _ => {
                    return Err(Error::RegistryError(format!(
                        "min_occurs of '{}.{}' must be 0 or 1", owner, name
                    )))
                },
            },
            Some(_) => return Err(Error::RegistryError(format!("min_occurs of '{}.{}' must be a number", owner, name))),
        };

        let max_occurs = match obj.get("max_occurs") {
            None | Some(Value::Null) => MaxOccurs::One,
            Some(Value::String(s)) if s == "unbounded" => MaxOccurs::Unbounded,
            Some(Value::Number(n)) if n.as_u64() == Some(1) => MaxOccurs::One,
            Some(other) => {
                return Err(Error::RegistryError(format!(
                    "max_occurs of '{}.{}' must be 1 or \"unbounded\", got {}", owner, name, other
                )))
            },
        };

        let choices = match obj.get("choices") {
            None | Some(Value::Null) => None,
            Some(list) => Some(self.parse_string_list(list, &format!("choices of '{}.{}'", owner, name))?),
        };

        Ok(FieldDescriptor {
            name,
            type_name,
            min_occurs,
            max_occurs,
            choices,
        })
    }

    /// Parses an array of strings
    fn parse_string_list(&self, value: &Value, what: &str) -> Result<Vec<String>> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(Error::RegistryError(format!("Entries of {} must be strings", what))),
                })
                .collect(),
            _ => Err(Error::RegistryError(format!("{} must be an array", what))),
        }
    }

    /// Helper to get a string field from a JSON object
    fn get_string_field(&self, obj: &Map<String, Value>, field: &str) -> Result<String> {
        match obj.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(Error::RegistryError(format!("Field '{}' must be a string", field))),
            None => Err(Error::RegistryError(format!("Required field '{}' is missing", field))),
        }
    }

    /// Helper to get an object field from a JSON object
    fn get_object_field<'a>(&self, obj: &'a Map<String, Value>, field: &str) -> Result<&'a Map<String, Value>> {
        match obj.get(field) {
            Some(Value::Object(inner)) => Ok(inner),
            Some(_) => Err(Error::RegistryError(format!("Field '{}' must be an object", field))),
            None => Err(Error::RegistryError(format!("Required field '{}' is missing", field))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "api": "ad_manager",
            "version": "v201811",
            "service": "ProductPackageItemService",
            "namespace": "https://www.google.com/apis/ads/publisher/v201811",
            "methods": {
                "get_product_package_items_by_statement": {
                    "input": [{"name": "statement", "type": "Statement", "min_occurs": 0, "max_occurs": 1}],
                    "output": {
                        "name": "get_product_package_items_by_statement_response",
                        "fields": [{"name": "rval", "type": "ProductPackageItemPage", "min_occurs": 0, "max_occurs": 1}]
                    }
                }
            },
            "types": {
                "Statement": {"fields": [{"name": "query", "type": "string", "min_occurs": 0, "max_occurs": 1}]},
                "ProductPackageItemPage": {"fields": [
                    {"name": "total_result_set_size", "type": "int"},
                    {"name": "results", "type": "ProductPackageItem", "min_occurs": 0, "max_occurs": "unbounded"}
                ]},
                "ProductPackageItem": {"fields": [
                    {"name": "id", "type": "long"},
                    {"name": "archive_status", "type": "ArchiveStatus"}
                ]},
                "ArchiveStatus": {"type": "string", "enumerations": ["ARCHIVED", "NOT_ARCHIVED", "UNKNOWN"]},
                "Value": {"fields": [], "abstract": true},
                "ObjectValue": {"fields": [], "abstract": true, "base": "Value"}
            }
        })
    }

    #[test]
    fn test_parse_minimal_registry() {
        let registry = RegistryParser::new().parse_registry(&minimal()).unwrap();
        assert_eq!(registry.key().to_string(), "ad_manager/v201811/ProductPackageItemService");

        let method = registry.method("get_product_package_items_by_statement").unwrap();
        assert_eq!(method.input.len(), 1);
        assert_eq!(method.output.fields[0].type_name, "ProductPackageItemPage");

        let page = registry.type_schema("ProductPackageItemPage").unwrap();
        assert!(page.own_fields()[1].is_repeated());
        assert_eq!(page.own_fields()[0].max_occurs, MaxOccurs::One);

        let status = registry.type_schema("ArchiveStatus").unwrap();
        assert_eq!(status.enum_values().map(<[String]>::len), Some(3));

        let object_value = registry.type_schema("ObjectValue").unwrap();
        assert!(object_value.is_abstract());
        assert_eq!(object_value.base(), Some("Value"));
    }

    #[test]
    fn test_parse_str_rejects_malformed_json() {
        let result = RegistryParser::new().parse_str("{\"api\": ");
        assert!(matches!(result, Err(Error::RegistryError(_))));
    }

    #[test]
    fn test_missing_key_parts() {
        let mut json = minimal();
        json.as_object_mut().unwrap().remove("service");
        assert!(matches!(
            RegistryParser::new().parse_registry(&json),
            Err(Error::RegistryError(_))
        ));
    }

    #[test]
    fn test_bad_occurs() {
        let mut json = minimal();
        json["types"]["Statement"]["fields"][0]["max_occurs"] = json!(5);
        assert!(matches!(
            RegistryParser::new().parse_registry(&json),
            Err(Error::RegistryError(_))
        ));

        let mut json = minimal();
        json["types"]["Statement"]["fields"][0]["min_occurs"] = json!(2);
        assert!(matches!(
            RegistryParser::new().parse_registry(&json),
            Err(Error::RegistryError(_))
        ));
    }

    #[test]
    fn test_dangling_base() {
        let mut json = minimal();
        json["types"]["ObjectValue"]["base"] = json!("MissingValue");
        assert!(matches!(
            RegistryParser::new().parse_registry(&json),
            Err(Error::UnknownType(name)) if name == "MissingValue"
        ));
    }

    #[test]
    fn test_enumeration_with_fields_rejected() {
        let mut json = minimal();
        json["types"]["ArchiveStatus"]["fields"] = json!([]);
        assert!(matches!(
            RegistryParser::new().parse_registry(&json),
            Err(Error::RegistryError(_))
        ));
    }

    #[test]
    fn test_choices_parsed() {
        let mut json = minimal();
        json["types"]["Holder"] = json!({"fields": [
            {"name": "items", "type": "ProductPackageItem", "max_occurs": "unbounded", "choices": ["ProductPackageItem"]}
        ]});
        let registry = RegistryParser::new().parse_registry(&json).unwrap();
        let holder = registry.type_schema("Holder").unwrap();
        assert_eq!(holder.own_fields()[0].choices, Some(vec!["ProductPackageItem".to_string()]));
    }
}
