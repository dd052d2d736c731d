// Schema module for service registries
//
// This module provides registry definition, resolution, and validation
// functionality for SOAP service parameters. It includes:
//
// 1. Type and method descriptors with single inheritance
// 2. Immutable per-service registries and a catalog keyed by api/version/service
// 3. JSON registry parser
// 4. Schema resolver (inherited field order, abstract types, subtypes)
// 5. Parameter validator producing schema-ordered shaped values

// Re-export public types and functions
pub use self::types::{FieldDescriptor, MaxOccurs, MethodSignature, OutputDescriptor, Primitive, TypeKind, TypeSchema};
pub use self::registry::{Registry, RegistryBuilder, RegistryCatalog, RegistryKey};
pub use self::parser::RegistryParser;
pub use self::resolver::SchemaResolver;
pub use self::shaped::{ShapedField, ShapedObject, ShapedParams, ShapedValue, XSI_TYPE_ATTRIBUTE};
pub use self::validator::{ParametersValidator, RequiredFieldPolicy, UnknownFieldPolicy, ValidatorConfig};

// Sub-modules
pub mod types;
pub mod registry;
pub mod parser;
pub mod resolver;
pub mod shaped;
pub mod validator;

// Shared helpers, also used by the service facade and report ordering
pub(crate) mod utils;
