// Schema type system for service registries
//
// This module defines the declarative building blocks every service
// registry is made of: field descriptors, type schemas, and method
// signatures.

use std::fmt;

/// Primitive XSD types a field may be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `xsd:string`
    String,
    /// `xsd:int` (32-bit signed)
    Int,
    /// `xsd:long` (64-bit signed)
    Long,
    /// `xsd:boolean`
    Boolean,
    /// `xsd:double`
    Double,
}

impl Primitive {
    /// Maps a registry type name to a primitive, if it names one
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Primitive::String),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "boolean" => Some(Primitive::Boolean),
            "double" => Some(Primitive::Double),
            _ => None,
        }
    }

    /// Returns the registry spelling of this primitive
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Boolean => "boolean",
            Primitive::Double => "double",
        }
    }

    /// Returns true if this primitive accepts numeric literals
    pub fn is_numeric(&self) -> bool {
        matches!(self, Primitive::Int | Primitive::Long | Primitive::Double)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper occurrence bound of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxOccurs {
    /// At most one value
    One,
    /// An ordered sequence of values
    Unbounded,
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::One => f.write_str("1"),
            MaxOccurs::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Represents a field of a complex type or a method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, unique within its declaring type
    pub name: String,
    /// Declared type: a primitive name or a registered type name
    pub type_name: String,
    /// Lower occurrence bound (0 or 1)
    pub min_occurs: u32,
    /// Upper occurrence bound
    pub max_occurs: MaxOccurs,
    /// Concrete types a choice element may take. Choice values are
    /// emitted wrapped in an element named after their concrete type.
    pub choices: Option<Vec<String>>,
}

impl FieldDescriptor {
    /// Creates an optional, single-valued field
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            min_occurs: 0,
            max_occurs: MaxOccurs::One,
            choices: None,
        }
    }

    /// Marks the field as required (`min_occurs = 1`)
    pub fn required(mut self) -> Self {
        self.min_occurs = 1;
        self
    }

    /// Marks the field as repeated (`max_occurs = unbounded`)
    pub fn repeated(mut self) -> Self {
        self.max_occurs = MaxOccurs::Unbounded;
        self
    }

    /// Declares the field as a choice between the given concrete types
    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn is_required(&self) -> bool {
        self.min_occurs > 0
    }

    pub fn is_repeated(&self) -> bool {
        self.max_occurs == MaxOccurs::Unbounded
    }

    /// Returns the primitive this field is declared with, if any
    pub fn primitive(&self) -> Option<Primitive> {
        Primitive::from_name(&self.type_name)
    }
}

/// Shape of a registered type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Record type with ordered fields and an optional single base type
    Complex {
        fields: Vec<FieldDescriptor>,
        base: Option<String>,
        is_abstract: bool,
    },
    /// String-valued leaf type restricted to a fixed value set
    Enumeration { values: Vec<String> },
}

/// A named type in a service registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    /// Type name, e.g. `LogicalUserList` or `UserListMembershipStatus`
    pub name: String,
    /// Type shape
    pub kind: TypeKind,
}

impl TypeSchema {
    /// Creates a concrete complex type with no base
    pub fn complex(name: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Complex {
                fields,
                base: None,
                is_abstract: false,
            },
        }
    }

    /// Creates an enumeration type
    pub fn enumeration(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Enumeration {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        }
    }

    /// Sets the base type. Has no effect on enumerations.
    pub fn with_base(mut self, base_name: &str) -> Self {
        if let TypeKind::Complex { ref mut base, .. } = self.kind {
            *base = Some(base_name.to_string());
        }
        self
    }

    /// Marks the type abstract. Has no effect on enumerations.
    pub fn abstract_type(mut self) -> Self {
        if let TypeKind::Complex { ref mut is_abstract, .. } = self.kind {
            *is_abstract = true;
        }
        self
    }

    /// Base type name, if any
    pub fn base(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Complex { base, .. } => base.as_deref(),
            TypeKind::Enumeration { .. } => None,
        }
    }

    /// Fields declared directly on this type (inherited fields excluded)
    pub fn own_fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            TypeKind::Complex { fields, .. } => fields,
            TypeKind::Enumeration { .. } => &[],
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Complex { is_abstract: true, .. })
    }

    pub fn is_enumeration(&self) -> bool {
        matches!(self.kind, TypeKind::Enumeration { .. })
    }

    /// Allowed values of an enumeration type
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            TypeKind::Enumeration { values } => Some(values),
            TypeKind::Complex { .. } => None,
        }
    }
}

/// Response wrapper of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    /// Wrapper element name, e.g. `mutate_response`
    pub name: String,
    /// Fields of the wrapper
    pub fields: Vec<FieldDescriptor>,
}

/// Signature of a service method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Method name in snake_case, e.g. `get_pending_invitations`
    pub name: String,
    /// Positional parameters, in order
    pub input: Vec<FieldDescriptor>,
    /// Response shape
    pub output: OutputDescriptor,
}

impl MethodSignature {
    /// Creates a signature whose response wrapper is named `<name>_response`
    pub fn new(name: &str, input: Vec<FieldDescriptor>, output_fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            input,
            output: OutputDescriptor {
                name: format!("{}_response", name),
                fields: output_fields,
            },
        }
    }

    /// Number of parameters that must be supplied
    pub fn required_arity(&self) -> usize {
        self.input
            .iter()
            .rposition(|field| field.is_required())
            .map_or(0, |last| last + 1)
    }
}
