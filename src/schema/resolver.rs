// Schema resolver
//
// Flattens single-inheritance type chains. Resolution walks parent links
// through the registry's name index; it never allocates more than the
// result and never touches shared mutable state.

use crate::internal::error::{Error, Result};
use crate::schema::registry::Registry;
use crate::schema::types::{FieldDescriptor, TypeSchema};

/// Read-only view over a registry answering inheritance questions
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'r> {
    registry: &'r Registry,
}

impl<'r> SchemaResolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Looks up a type, failing with `UnknownType` if it is not registered
    pub fn type_schema(&self, type_name: &str) -> Result<&'r TypeSchema> {
        self.registry
            .type_schema(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))
    }

    /// Returns the type followed by its ancestors, most-derived first
    pub fn ancestors(&self, type_name: &str) -> Result<Vec<&'r TypeSchema>> {
        let mut current = self.type_schema(type_name)?;
        let mut chain = vec![current];
        while let Some(base) = current.base() {
            current = self.type_schema(base)?;
            chain.push(current);
        }
        Ok(chain)
    }

    /// Resolves the full field list of a type: root ancestor's fields
    /// first, the type's own fields last.
    ///
    /// This is the canonical serialization order for the type.
    /// Enumerations resolve to no fields.
    pub fn resolve_fields(&self, type_name: &str) -> Result<Vec<&'r FieldDescriptor>> {
        let chain = self.ancestors(type_name)?;
        Ok(chain
            .into_iter()
            .rev()
            .flat_map(|schema| schema.own_fields())
            .collect())
    }

    pub fn is_abstract(&self, type_name: &str) -> Result<bool> {
        Ok(self.type_schema(type_name)?.is_abstract())
    }

    /// Returns true if `candidate` is `ancestor` or derives from it
    pub fn is_descendant_of(&self, candidate: &str, ancestor: &str) -> Result<bool> {
        let mut current = Some(self.type_schema(candidate)?);
        while let Some(schema) = current {
            if schema.name == ancestor {
                return Ok(true);
            }
            current = match schema.base() {
                Some(base) => Some(self.type_schema(base)?),
                None => None,
            };
        }
        Ok(false)
    }

    /// All registered strict descendants of a type, sorted by name
    pub fn subtypes_of(&self, type_name: &str) -> Result<Vec<&'r str>> {
        self.type_schema(type_name)?;
        let mut subtypes = Vec::new();
        for schema in self.registry.types() {
            if schema.name != type_name && self.is_descendant_of(&schema.name, type_name)? {
                subtypes.push(schema.name.as_str());
            }
        }
        subtypes.sort_unstable();
        Ok(subtypes)
    }
}
