use thiserror::Error;
use std::io;

/// Unified error type for the soap-params library.
///
/// Every validation failure is returned immediately; nothing in the
/// library catches or downgrades these.
#[derive(Error, Debug)]
pub enum Error {
    /// The method name has no entry in the service registry.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// A type name has no entry in the service registry.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// Positional argument count is incompatible with the method signature.
    #[error("Arity error in '{method}': {message}")]
    Arity {
        /// Method being validated.
        method: String,
        /// What was wrong with the argument list.
        message: String,
    },

    /// A value does not match its declared shape, type, enumeration, or
    /// discriminator.
    #[error("Type mismatch at '{path}': {message}")]
    TypeMismatch {
        /// Dotted path of the offending value, e.g. `operations[0].operand`.
        path: String,
        /// Description of the mismatch.
        message: String,
    },

    /// Input nesting exceeded the configured limit.
    #[error("Maximum nesting depth ({limit}) exceeded at '{path}'")]
    NestingTooDeep {
        /// Configured depth limit.
        limit: usize,
        /// Path where the limit was crossed.
        path: String,
    },

    /// A registry definition could not be parsed or is inconsistent.
    #[error("Registry Error: {0}")]
    RegistryError(String),

    /// A report definition contained fields the report schema does not know.
    #[error("{0}")]
    InvalidReportDefinition(String),

    /// A report download failed without a structured error body.
    #[error("HTTP code: {http_code}, body: {body}")]
    Report {
        /// HTTP status of the download response.
        http_code: u16,
        /// Response body, lossily decoded.
        body: String,
    },

    /// A report download failed with a `reportDownloadError` XML body.
    #[error("HTTP code: {http_code}, type: '{error_type}', trigger: '{trigger}', field path: '{field_path}'")]
    ReportXml {
        http_code: u16,
        /// API error type, e.g. `ReportDefinitionError.INVALID_FIELD_NAME_FOR_REPORT`.
        error_type: String,
        trigger: String,
        field_path: String,
    },

    /// Reading a registry or argument file failed.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for soap-params operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        // Malformed JSON only ever reaches us through registry loading
        Error::RegistryError(format!("Invalid JSON: {}", err))
    }
}

impl Error {
    /// Builds a `TypeMismatch` for the given path.
    pub(crate) fn mismatch(path: &str, message: impl Into<String>) -> Self {
        Error::TypeMismatch {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status carried by report download errors.
    pub fn http_code(&self) -> Option<u16> {
        match self {
            Error::Report { http_code, .. } | Error::ReportXml { http_code, .. } => Some(*http_code),
            _ => None,
        }
    }

    /// Returns true for argument validation failures, including the
    /// nesting limit (as opposed to registry loading, report, or I/O
    /// failures).
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownMethod(_)
                | Error::UnknownType(_)
                | Error::Arity { .. }
                | Error::TypeMismatch { .. }
                | Error::NestingTooDeep { .. }
        )
    }
}
