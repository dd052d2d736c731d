// Service registries
//
// A registry holds the method signatures and type schemas of one
// (api, version, service) triple. It is built once, checked for
// consistency, and never mutated afterwards, so it can be shared across
// threads behind an `Arc` without locking.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::internal::error::{Error, Result};
use crate::schema::types::{FieldDescriptor, MethodSignature, Primitive, TypeKind, TypeSchema};

/// Identifies a registry: API family, version, and service name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryKey {
    /// API family, e.g. `adwords` or `ad_manager`
    pub api: String,
    /// API version, e.g. `v201809`
    pub version: String,
    /// Service name, e.g. `AdwordsUserListService`
    pub service: String,
}

impl RegistryKey {
    pub fn new(api: &str, version: &str, service: &str) -> Self {
        Self {
            api: api.to_string(),
            version: version.to_string(),
            service: service.to_string(),
        }
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.api, self.version, self.service)
    }
}

/// Immutable table of method signatures and type schemas for one service
#[derive(Debug)]
pub struct Registry {
    key: RegistryKey,
    namespace: Option<String>,
    methods: HashMap<String, MethodSignature>,
    types: HashMap<String, TypeSchema>,
    fingerprint: String,
}

impl Registry {
    /// Starts building a registry for the given key
    pub fn builder(key: RegistryKey) -> RegistryBuilder {
        RegistryBuilder {
            key,
            namespace: None,
            methods: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn key(&self) -> &RegistryKey {
        &self.key
    }

    /// SOAP namespace of the service, if known
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Looks up a method signature by name
    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.get(name)
    }

    /// Looks up a type schema by name
    pub fn type_schema(&self, name: &str) -> Option<&TypeSchema> {
        self.types.get(name)
    }

    /// Method names, sorted
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterates over all type schemas (unordered)
    pub fn types(&self) -> impl Iterator<Item = &TypeSchema> {
        self.types.values()
    }

    /// Lowercase hex SHA-256 of the canonical registry definition.
    ///
    /// Two registries with the same methods and types have the same
    /// fingerprint regardless of the order definitions were added in.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Collects definitions and checks them before producing a [`Registry`]
#[derive(Debug)]
pub struct RegistryBuilder {
    key: RegistryKey,
    namespace: Option<String>,
    methods: Vec<MethodSignature>,
    types: Vec<TypeSchema>,
}

impl RegistryBuilder {
    /// Sets the SOAP namespace
    pub fn namespace(&mut self, namespace: &str) -> &mut Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Adds a type schema
    pub fn add_type(&mut self, schema: TypeSchema) -> &mut Self {
        self.types.push(schema);
        self
    }

    /// Adds a method signature
    pub fn add_method(&mut self, method: MethodSignature) -> &mut Self {
        self.methods.push(method);
        self
    }

    /// Checks the collected definitions and freezes them.
    ///
    /// Fails with `UnknownType` when a base, field, or choice references a
    /// type that was never added, and with `RegistryError` for duplicate
    /// names, enumeration bases, choices that are not concrete descendants
    /// of their field's type, or base cycles.
    pub fn build(self) -> Result<Registry> {
        let mut types: HashMap<String, TypeSchema> = HashMap::with_capacity(self.types.len());
        for schema in self.types {
            if types.contains_key(&schema.name) {
                return Err(Error::RegistryError(format!(
                    "Duplicate type '{}' in {}", schema.name, self.key
                )));
            }
            types.insert(schema.name.clone(), schema);
        }

        let mut methods: HashMap<String, MethodSignature> = HashMap::with_capacity(self.methods.len());
        for method in self.methods {
            if methods.contains_key(&method.name) {
                return Err(Error::RegistryError(format!(
                    "Duplicate method '{}' in {}", method.name, self.key
                )));
            }
            methods.insert(method.name.clone(), method);
        }

        for schema in types.values() {
            check_type(schema, &types)?;
        }
        for method in methods.values() {
            for field in method.input.iter().chain(&method.output.fields) {
                check_field(field, &types)?;
            }
        }

        let fingerprint = fingerprint(self.namespace.as_deref(), &methods, &types);
        info!(
            registry = %self.key,
            types = types.len(),
            methods = methods.len(),
            "registry loaded"
        );

        Ok(Registry {
            key: self.key,
            namespace: self.namespace,
            methods,
            types,
            fingerprint,
        })
    }
}

fn check_type(schema: &TypeSchema, types: &HashMap<String, TypeSchema>) -> Result<()> {
    let mut seen = HashSet::new();
    for field in schema.own_fields() {
        if !seen.insert(field.name.as_str()) {
            return Err(Error::RegistryError(format!(
                "Duplicate field '{}' in type '{}'", field.name, schema.name
            )));
        }
        check_field(field, types)?;
    }

    // Walk the base chain; more hops than there are types means a cycle
    let mut current = schema;
    let mut hops = 0;
    while let Some(base_name) = current.base() {
        let base = types
            .get(base_name)
            .ok_or_else(|| Error::UnknownType(base_name.to_string()))?;
        if base.is_enumeration() {
            return Err(Error::RegistryError(format!(
                "Type '{}' cannot extend enumeration '{}'", current.name, base.name
            )));
        }
        hops += 1;
        if hops > types.len() {
            return Err(Error::RegistryError(format!(
                "Inheritance cycle through type '{}'", schema.name
            )));
        }
        current = base;
    }
    Ok(())
}

fn check_field(field: &FieldDescriptor, types: &HashMap<String, TypeSchema>) -> Result<()> {
    if field.min_occurs > 1 {
        return Err(Error::RegistryError(format!(
            "Field '{}' has min_occurs {}, expected 0 or 1", field.name, field.min_occurs
        )));
    }
    if Primitive::from_name(&field.type_name).is_none() && !types.contains_key(&field.type_name) {
        return Err(Error::UnknownType(field.type_name.clone()));
    }
    if let Some(choices) = &field.choices {
        for choice in choices {
            match types.get(choice) {
                Some(TypeSchema { kind: TypeKind::Complex { is_abstract: false, .. }, .. }) => {
                    if !derives_from(choice, &field.type_name, types) {
                        return Err(Error::RegistryError(format!(
                            "Choice '{}' of field '{}' does not derive from '{}'",
                            choice, field.name, field.type_name
                        )));
                    }
                }
                Some(_) => {
                    return Err(Error::RegistryError(format!(
                        "Choice '{}' of field '{}' must be a concrete complex type", choice, field.name
                    )));
                }
                None => return Err(Error::UnknownType(choice.clone())),
            }
        }
    }
    Ok(())
}

/// Walks the base chain of `name` looking for `ancestor`. Gives up after
/// more hops than there are types, so cycles read as unrelated.
fn derives_from(name: &str, ancestor: &str, types: &HashMap<String, TypeSchema>) -> bool {
    let mut current = types.get(name);
    let mut hops = 0;
    while let Some(schema) = current {
        if schema.name == ancestor {
            return true;
        }
        hops += 1;
        if hops > types.len() {
            return false;
        }
        current = schema.base().and_then(|base| types.get(base));
    }
    false
}

fn fingerprint(
    namespace: Option<&str>,
    methods: &HashMap<String, MethodSignature>,
    types: &HashMap<String, TypeSchema>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("ns:{}\n", namespace.unwrap_or("")));

    let mut method_names: Vec<&String> = methods.keys().collect();
    method_names.sort_unstable();
    for name in method_names {
        let method = &methods[name];
        hasher.update(format!("method:{}\n", name));
        for field in &method.input {
            hasher.update(canonical_field("in", field));
        }
        hasher.update(format!("out:{}\n", method.output.name));
        for field in &method.output.fields {
            hasher.update(canonical_field("rval", field));
        }
    }

    let mut type_names: Vec<&String> = types.keys().collect();
    type_names.sort_unstable();
    for name in type_names {
        match &types[name].kind {
            TypeKind::Complex { fields, base, is_abstract } => {
                hasher.update(format!(
                    "type:{}:{}:{}\n",
                    name,
                    base.as_deref().unwrap_or(""),
                    is_abstract
                ));
                for field in fields {
                    hasher.update(canonical_field("field", field));
                }
            }
            TypeKind::Enumeration { values } => {
                hasher.update(format!("enum:{}:{}\n", name, values.join(",")));
            }
        }
    }

    hex::encode(hasher.finalize())
}

fn canonical_field(prefix: &str, field: &FieldDescriptor) -> String {
    let choices = field
        .choices
        .as_ref()
        .map(|c| c.join(","))
        .unwrap_or_default();
    format!(
        "{}:{}:{}:{}:{}:{}\n",
        prefix, field.name, field.type_name, field.min_occurs, field.max_occurs, choices
    )
}

/// Process-wide set of registries, one per (api, version, service)
#[derive(Debug, Default)]
pub struct RegistryCatalog {
    registries: HashMap<RegistryKey, Arc<Registry>>,
}

impl RegistryCatalog {
    pub fn new() -> Self {
        Self {
            registries: HashMap::new(),
        }
    }

    /// Adds a registry. Each key may be registered once.
    pub fn insert(&mut self, registry: Registry) -> Result<Arc<Registry>> {
        let key = registry.key().clone();
        if self.registries.contains_key(&key) {
            return Err(Error::RegistryError(format!("Registry {} is already loaded", key)));
        }
        let registry = Arc::new(registry);
        self.registries.insert(key, registry.clone());
        Ok(registry)
    }

    /// Gets a registry by key
    pub fn get(&self, key: &RegistryKey) -> Option<Arc<Registry>> {
        self.registries.get(key).cloned()
    }

    /// Gets a registry by its three key parts
    pub fn lookup(&self, api: &str, version: &str, service: &str) -> Option<Arc<Registry>> {
        self.get(&RegistryKey::new(api, version, service))
    }

    /// Versions loaded for a service, sorted ascending
    pub fn versions_of(&self, api: &str, service: &str) -> Vec<&str> {
        let mut versions: Vec<&str> = self
            .registries
            .keys()
            .filter(|key| key.api == api && key.service == service)
            .map(|key| key.version.as_str())
            .collect();
        versions.sort_unstable();
        versions
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<&RegistryKey> {
        let mut keys: Vec<&RegistryKey> = self.registries.keys().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}
