// Service facade
//
// Binds a registry to its SOAP namespace the way generated service
// classes do: each snake_case method maps to a SOAP action, and calls are
// validated and shaped before they are handed to a transport.

use std::sync::Arc;

use serde::Serialize;

use crate::internal::error::{Error, Result};
use crate::schema::registry::{Registry, RegistryKey};
use crate::schema::shaped::ShapedParams;
use crate::schema::utils::soap_action_name;
use crate::schema::validator::{ParametersValidator, ValidatorConfig};

/// A validated call ready for a transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedCall {
    /// SOAP action name, e.g. `getPendingInvitations`
    pub action: String,
    /// Service namespace, if the registry declares one
    pub namespace: Option<String>,
    /// Shaped positional parameters
    pub params: ShapedParams,
}

/// One SOAP service of one API version
#[derive(Debug, Clone)]
pub struct Service {
    validator: ParametersValidator,
}

impl Service {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            validator: ParametersValidator::new(registry),
        }
    }

    pub fn with_config(registry: Arc<Registry>, config: ValidatorConfig) -> Self {
        Self {
            validator: ParametersValidator::with_config(registry, config),
        }
    }

    pub fn key(&self) -> &RegistryKey {
        self.validator.registry().key()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.validator.registry().namespace()
    }

    /// Method names offered by the service, sorted
    pub fn methods(&self) -> Vec<&str> {
        self.validator.registry().method_names()
    }

    /// SOAP action name of a method
    pub fn soap_action(&self, method: &str) -> Result<String> {
        match self.validator.registry().method(method) {
            Some(signature) => Ok(soap_action_name(&signature.name)),
            None => Err(Error::UnknownMethod(method.to_string())),
        }
    }

    /// Validates and shapes arguments for a method
    pub fn validate_args(&self, method: &str, args: &[serde_json::Value]) -> Result<ShapedParams> {
        self.validator.validate(method, args)
    }

    /// Validates a call and packages it with its action and namespace
    pub fn prepare(&self, method: &str, args: &[serde_json::Value]) -> Result<PreparedCall> {
        let params = self.validate_args(method, args)?;
        Ok(PreparedCall {
            action: soap_action_name(&params.method),
            namespace: self.namespace().map(str::to_string),
            params,
        })
    }
}
