// Parameter validator for service methods
//
// This module walks a method's declared signature against caller-supplied
// positional arguments and produces a shaped, schema-ordered tree. It is a
// pure transform: the registry and the caller's input are only read.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::internal::error::{Error, Result};
use crate::schema::registry::Registry;
use crate::schema::resolver::SchemaResolver;
use crate::schema::shaped::{ShapedField, ShapedObject, ShapedParams, ShapedValue};
use crate::schema::types::{FieldDescriptor, Primitive, TypeKind, TypeSchema};
use crate::schema::utils::{child_path, describe_json, index_path, integer_for};

/// What to do with mapping keys the resolved type does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Fail with a type mismatch
    #[default]
    Reject,
    /// Drop the key
    Ignore,
}

/// Whether `min_occurs = 1` fields must be present inside mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredFieldPolicy {
    /// Leave required-ness to the server
    #[default]
    Defer,
    /// Fail with a type mismatch when a required field is missing
    Enforce,
}

/// Configuration for parameter validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Policy for undeclared mapping keys
    pub unknown_fields: UnknownFieldPolicy,

    /// Policy for missing required fields inside mappings
    pub required_fields: RequiredFieldPolicy,

    /// Input key naming the concrete type of a polymorphic value
    pub discriminator_key: String,

    /// Maximum nesting depth for validation
    pub max_nesting_depth: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Reject,
            required_fields: RequiredFieldPolicy::Defer,
            discriminator_key: "xsi_type".to_string(),
            max_nesting_depth: 32,
        }
    }
}

/// Validates and shapes method arguments against a service registry
#[derive(Debug, Clone)]
pub struct ParametersValidator {
    registry: Arc<Registry>,
    config: ValidatorConfig,
}

impl ParametersValidator {
    /// Creates a new validator with default configuration
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            config: ValidatorConfig::default(),
        }
    }

    /// Creates a new validator with custom configuration
    pub fn with_config(registry: Arc<Registry>, config: ValidatorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    fn resolver(&self) -> SchemaResolver<'_> {
        SchemaResolver::new(&self.registry)
    }

    /// Validates positional arguments for a method.
    ///
    /// Arguments are zipped with the signature's input fields by index.
    /// Trailing optional arguments may be omitted or null; supplying more
    /// arguments than declared, or omitting a required one, is an arity
    /// error. Nothing partial is returned on failure.
    pub fn validate(&self, method_name: &str, args: &[Value]) -> Result<ShapedParams> {
        let signature = self
            .registry
            .method(method_name)
            .ok_or_else(|| Error::UnknownMethod(method_name.to_string()))?;

        if args.len() > signature.input.len() {
            return Err(Error::Arity {
                method: method_name.to_string(),
                message: format!(
                    "expected at most {} argument(s), got {}",
                    signature.input.len(),
                    args.len()
                ),
            });
        }

        let mut fields = Vec::with_capacity(signature.input.len());
        for (index, field) in signature.input.iter().enumerate() {
            match args.get(index) {
                None | Some(Value::Null) => {
                    if field.is_required() {
                        return Err(Error::Arity {
                            method: method_name.to_string(),
                            message: format!(
                                "missing required argument '{}' at position {}",
                                field.name, index
                            ),
                        });
                    }
                }
                Some(value) => {
                    let shaped = self.shape_field(field, value, &field.name, 0)?;
                    fields.push(ShapedField::new(&field.name, shaped));
                }
            }
        }

        debug!(
            registry = %self.registry.key(),
            method = method_name,
            params = fields.len(),
            "validated arguments"
        );

        Ok(ShapedParams {
            method: signature.name.clone(),
            fields,
        })
    }

    /// Shapes a value against a field, honoring its repetition
    fn shape_field(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<ShapedValue> {
        self.check_depth(path, depth)?;

        if !field.is_repeated() {
            return self.shape_single(field, value, path, depth);
        }

        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(Error::mismatch(
                    path,
                    format!("field '{}' is repeated, expected a sequence but got {}", field.name, describe_json(other)),
                ));
            }
        };

        let mut shaped = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = index_path(path, index);
            if item.is_null() {
                return Err(Error::mismatch(&item_path, "null is not allowed inside a sequence"));
            }
            self.check_depth(&item_path, depth + 1)?;
            shaped.push(self.shape_single(field, item, &item_path, depth + 1)?);
        }
        Ok(ShapedValue::List(shaped))
    }

    /// Shapes one (non-sequence) value against the field's declared type
    fn shape_single(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<ShapedValue> {
        trace!(path, type_name = %field.type_name, "shaping value");

        if let Some(choices) = &field.choices {
            return self.shape_choice(choices, value, path, depth);
        }

        if let Some(primitive) = field.primitive() {
            return shape_primitive(primitive, value, path);
        }

        let declared = self.resolver().type_schema(&field.type_name)?;
        match &declared.kind {
            TypeKind::Enumeration { values } => shape_enumeration(declared, values, value, path),
            TypeKind::Complex { .. } => Ok(ShapedValue::Object(self.shape_complex(declared, value, path, depth)?)),
        }
    }

    /// Shapes a mapping against a complex declared type, resolving the
    /// discriminator if one is supplied
    fn shape_complex(
        &self,
        declared: &TypeSchema,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<ShapedObject> {
        let map = expect_mapping(value, &declared.name, path)?;

        let discriminator = self.discriminator(map, path)?;
        let concrete = match discriminator {
            Some(name) => {
                let concrete = self.concrete_subtype(name, &declared.name, path)?;
                trace!(path, declared = %declared.name, concrete = %concrete.name, "resolved discriminator");
                concrete
            }
            None if declared.is_abstract() => {
                return Err(Error::mismatch(
                    path,
                    format!(
                        "type '{}' is abstract, '{}' must name a concrete subtype",
                        declared.name, self.config.discriminator_key
                    ),
                ));
            }
            None => declared,
        };

        self.shape_object(concrete, map, discriminator.map(str::to_string), path, depth)
    }

    /// Shapes a choice element; the discriminator is mandatory and must be
    /// one of the declared choices
    fn shape_choice(
        &self,
        choices: &[String],
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<ShapedValue> {
        let map = expect_mapping(value, "choice", path)?;
        let name = self.discriminator(map, path)?.ok_or_else(|| {
            Error::mismatch(
                path,
                format!(
                    "choice value requires '{}', one of [{}]",
                    self.config.discriminator_key,
                    choices.join(", ")
                ),
            )
        })?;

        if !choices.iter().any(|choice| choice == name) {
            return Err(Error::mismatch(
                path,
                format!("'{}' is not one of the allowed choices [{}]", name, choices.join(", ")),
            ));
        }

        let concrete = self.resolver().type_schema(name)?;
        let object = self.shape_object(concrete, map, Some(name.to_string()), path, depth)?;
        Ok(ShapedValue::Choice(object))
    }

    /// Shapes the keys of a mapping against a concrete type's resolved fields
    fn shape_object(
        &self,
        concrete: &TypeSchema,
        map: &Map<String, Value>,
        xsi_type: Option<String>,
        path: &str,
        depth: usize,
    ) -> Result<ShapedObject> {
        let fields = self.resolver().resolve_fields(&concrete.name)?;

        for key in map.keys() {
            if *key == self.config.discriminator_key || fields.iter().any(|f| f.name == *key) {
                continue;
            }
            match self.config.unknown_fields {
                UnknownFieldPolicy::Reject => {
                    return Err(Error::mismatch(
                        path,
                        format!("unknown field '{}' for type '{}'", key, concrete.name),
                    ));
                }
                UnknownFieldPolicy::Ignore => {
                    debug!(path, field = %key, type_name = %concrete.name, "ignoring unknown field");
                }
            }
        }

        let mut object = ShapedObject::new(&concrete.name);
        object.xsi_type = xsi_type;
        for field in fields {
            let field_path = child_path(path, &field.name);
            match map.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.is_required() && self.config.required_fields == RequiredFieldPolicy::Enforce {
                        return Err(Error::mismatch(
                            &field_path,
                            format!("required field '{}' of type '{}' is missing", field.name, concrete.name),
                        ));
                    }
                }
                Some(value) => {
                    let shaped = self.shape_field(field, value, &field_path, depth + 1)?;
                    object.fields.push(ShapedField::new(&field.name, shaped));
                }
            }
        }
        Ok(object)
    }

    /// Reads the discriminator key of a mapping
    fn discriminator<'v>(&self, map: &'v Map<String, Value>, path: &str) -> Result<Option<&'v str>> {
        match map.get(&self.config.discriminator_key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(name)) => Ok(Some(name)),
            Some(other) => Err(Error::mismatch(
                path,
                format!(
                    "'{}' must be a type name, got {}",
                    self.config.discriminator_key,
                    describe_json(other)
                ),
            )),
        }
    }

    /// Checks that a discriminator names an instantiable descendant of the
    /// declared type
    fn concrete_subtype(&self, name: &str, declared: &str, path: &str) -> Result<&TypeSchema> {
        let resolver = self.resolver();
        let concrete = match self.registry.type_schema(name) {
            Some(schema) => schema,
            None => {
                return Err(Error::mismatch(
                    path,
                    format!("'{}' is not a registered subtype of '{}'", name, declared),
                ));
            }
        };
        if !resolver.is_descendant_of(name, declared)? {
            return Err(Error::mismatch(
                path,
                format!("'{}' is not a subtype of '{}'", name, declared),
            ));
        }
        if concrete.is_abstract() {
            return Err(Error::mismatch(
                path,
                format!("'{}' is abstract and cannot be instantiated", name),
            ));
        }
        Ok(concrete)
    }

    fn check_depth(&self, path: &str, depth: usize) -> Result<()> {
        if depth > self.config.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                limit: self.config.max_nesting_depth,
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

fn expect_mapping<'v>(value: &'v Value, type_name: &str, path: &str) -> Result<&'v Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::mismatch(
            path,
            format!("expected a mapping for '{}', got {}", type_name, describe_json(other)),
        )),
    }
}

fn shape_primitive(primitive: Primitive, value: &Value, path: &str) -> Result<ShapedValue> {
    let shaped = match (primitive, value) {
        (Primitive::String, Value::String(s)) => Some(ShapedValue::String(s.clone())),
        (Primitive::Boolean, Value::Bool(b)) => Some(ShapedValue::Boolean(*b)),
        (Primitive::Int | Primitive::Long, Value::Number(n)) => integer_for(primitive, n).map(ShapedValue::Int),
        // Integral numbers keep their integer form on `double` fields
        (Primitive::Double, Value::Number(n)) => n
            .as_i64()
            .map(ShapedValue::Int)
            .or_else(|| n.as_f64().map(ShapedValue::Double)),
        _ => None,
    };

    shaped.ok_or_else(|| {
        let detail = match value {
            Value::Number(n) if primitive.is_numeric() => format!("{} is out of range for {}", n, primitive),
            other => format!("expected {}, got {}", primitive, describe_json(other)),
        };
        Error::mismatch(path, detail)
    })
}

fn shape_enumeration(schema: &TypeSchema, values: &[String], value: &Value, path: &str) -> Result<ShapedValue> {
    match value {
        Value::String(s) if values.iter().any(|allowed| allowed == s) => Ok(ShapedValue::String(s.clone())),
        Value::String(s) => Err(Error::mismatch(
            path,
            format!("'{}' is not a value of enumeration '{}'", s, schema.name),
        )),
        other => Err(Error::mismatch(
            path,
            format!("expected a value of enumeration '{}', got {}", schema.name, describe_json(other)),
        )),
    }
}
