//! Error types for IDL parsing and binding resolution.

use thiserror::Error;

/// Error type for IDL parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed source text.
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        /// File being parsed.
        file: String,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Error message.
        message: String,
    },

    /// A construct the generator does not support (`union`, `senum`).
    #[error("{file}:{line}:{column}: unsupported construct '{construct}'")]
    Unsupported {
        /// File being parsed.
        file: String,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Keyword of the construct.
        construct: String,
    },

    /// Duplicate definition within one document.
    #[error("{file}: duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// File being parsed.
        file: String,
        /// Kind of definition (type, service, ...).
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// IO error while reading a document.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Creates a syntax error.
    pub fn syntax(
        file: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Creates a duplicate definition error.
    pub fn duplicate(
        file: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::DuplicateDefinition {
            file: file.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Error type for binding resolution.
///
/// Every variant names the offending service, method or field so the message
/// is actionable on its own.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// A service transitively extends itself.
    #[error("cyclic service inheritance: {chain}")]
    CyclicInheritance {
        /// The chain of services forming the cycle, e.g. `A -> B -> A`.
        chain: String,
    },

    /// A service extends a service that does not exist.
    #[error("service '{service}' extends unknown service '{parent}'")]
    UnknownService {
        /// Extending service.
        service: String,
        /// Parent reference as written.
        parent: String,
    },

    /// A type reference that resolves to nothing known.
    #[error("unresolved type '{type_name}' in {location}")]
    UnresolvedType {
        /// Type name as written.
        type_name: String,
        /// Where the reference occurs, e.g. `service Echo, method ping, argument arg1`.
        location: String,
    },

    /// A method whose shape violates an invariant (oneway with a result,
    /// duplicate field ids or names).
    #[error("malformed method '{service}.{method}': {reason}")]
    MalformedMethod {
        /// Service name.
        service: String,
        /// Method name.
        method: String,
        /// What is wrong.
        reason: String,
    },

    /// A method declares a throws field whose type is not an exception.
    #[error(
        "method '{service}.{method}' declares exception field '{field}' of type '{type_name}', which is not an exception"
    )]
    InvalidExceptionType {
        /// Service name.
        service: String,
        /// Method name.
        method: String,
        /// Field name.
        field: String,
        /// Type name as written.
        type_name: String,
    },

    /// The model does not contain the document it claims as root.
    #[error("document '{path}' is missing from the model")]
    MissingDocument {
        /// Path of the missing document.
        path: String,
    },
}

impl ResolutionError {
    /// Creates a malformed method error.
    pub fn malformed(service: &str, method: &str, reason: impl Into<String>) -> Self {
        Self::MalformedMethod {
            service: service.to_string(),
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = ParseError::syntax("echo.thrift", 3, 14, "expected '}'");
        assert_eq!(err.to_string(), "echo.thrift:3:14: expected '}'");
    }

    #[test]
    fn test_malformed_method_display() {
        let err =
            ResolutionError::malformed("Echo", "fire", "oneway method declares a return type");
        assert_eq!(
            err.to_string(),
            "malformed method 'Echo.fire': oneway method declares a return type"
        );
    }

    #[test]
    fn test_cyclic_inheritance_display() {
        let err = ResolutionError::CyclicInheritance {
            chain: "A -> B -> A".to_string(),
        };
        assert!(err.to_string().contains("A -> B -> A"));
    }
}
