//! Error types for generated adapters and the transports they run on.

use thiserror::Error;

/// Failure to encode or decode an argument or result struct.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Encoding failed.
    #[error("failed to encode {type_name}: {message}")]
    Encode {
        /// Type being encoded.
        type_name: String,
        /// Error message.
        message: String,
    },

    /// Decoding failed.
    #[error("failed to decode {type_name}: {message}")]
    Decode {
        /// Type being decoded.
        type_name: String,
        /// Error message.
        message: String,
    },
}

impl ProtocolError {
    /// Creates a decode error for type `T`.
    pub fn decode<T>(message: impl Into<String>) -> Self {
        Self::Decode {
            type_name: short_type_name::<T>(),
            message: message.into(),
        }
    }

    /// Creates an encode error for type `T`.
    pub fn encode<T>(message: impl Into<String>) -> Self {
        Self::Encode {
            type_name: short_type_name::<T>(),
            message: message.into(),
        }
    }
}

fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// Error type for RPC calls.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed to deliver the call or its reply.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// Argument or result struct could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A two-way reply carried neither a success value nor a declared exception.
    #[error("{service}.{method} failed: unknown result")]
    MissingResult {
        /// Service name.
        service: String,
        /// Method name.
        method: String,
    },

    /// The context deadline passed before the call completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// No handlers are registered for the service.
    #[error("unknown service '{service}'")]
    UnknownService {
        /// Service name.
        service: String,
    },

    /// The service has no handler for the method.
    #[error("unknown method '{service}.{method}'")]
    UnknownMethod {
        /// Service name.
        service: String,
        /// Method name.
        method: String,
    },
}

impl Error {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates the error returned when a reply has no result set.
    pub fn missing_result(service: &str, method: &str) -> Self {
        Self::MissingResult {
            service: service.to_string(),
            method: method.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoPingArgs;

    #[test]
    fn test_protocol_error_type_name() {
        let err = ProtocolError::decode::<EchoPingArgs>("unexpected end of input");
        assert_eq!(
            err.to_string(),
            "failed to decode EchoPingArgs: unexpected end of input"
        );
    }

    #[test]
    fn test_missing_result_display() {
        let err = Error::missing_result("Echo", "ping");
        assert_eq!(err.to_string(), "Echo.ping failed: unknown result");
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: Error = ProtocolError::encode::<EchoPingArgs>("boom").into();
        assert!(matches!(err, Error::Protocol(ProtocolError::Encode { .. })));
    }
}
