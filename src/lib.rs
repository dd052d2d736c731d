// soap-params library entry point
//
// Registry-driven validation and shaping of SOAP request parameters for
// the ads client libraries.

pub mod internal;
pub mod schema;
pub mod service;
pub mod report;

pub use internal::error::{Error, Result};
pub use schema::{
    ParametersValidator, Registry, RegistryCatalog, RegistryKey, RegistryParser, SchemaResolver,
    ShapedObject, ShapedParams, ShapedValue, ValidatorConfig,
};
pub use service::{PreparedCall, Service};
