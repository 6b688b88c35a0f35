//! Error types for code generation.

use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// IDL parsing error.
    #[error("IDL parse error: {0}")]
    Parse(#[from] thriftgen_idl::ParseError),

    /// Binding resolution error.
    #[error("resolution error: {0}")]
    Resolution(#[from] thriftgen_idl::ResolutionError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The emitter produced invalid output. Always an internal defect.
    #[error("emission error: {message}")]
    Emission {
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates an emission error with the given message.
    pub fn emission(message: impl Into<String>) -> Self {
        Self::Emission {
            message: message.into(),
        }
    }
}
