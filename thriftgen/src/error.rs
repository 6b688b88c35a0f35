//! Error types for the driver.

use thiserror::Error;

/// Error type for driver operations. Every variant is fatal.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Bad command line.
    #[error("usage error: {0}")]
    Usage(String),

    /// The input file or the output directory is unusable.
    #[error("input error: {message}")]
    Input {
        /// Error message.
        message: String,
    },

    /// The upstream Thrift compiler could not run or failed.
    #[error("upstream compiler failed: {message}")]
    UpstreamCompiler {
        /// Error message, including the compiler's stderr when available.
        message: String,
    },

    /// Parsing, resolution, generation or the output write failed.
    #[error(transparent)]
    Codegen(#[from] thriftgen_codegen::CodegenError),
}

impl DriverError {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Creates an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the command line itself.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}
