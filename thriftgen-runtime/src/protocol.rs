//! Struct serialization contract.
//!
//! Argument and result structs are produced by the upstream Thrift compiler
//! (or written by hand); generated adapters only see them through [`TStruct`].

use crate::error::{Error, ProtocolError};
use bytes::Bytes;

/// A struct that can be written to and read from a binary envelope.
pub trait TStruct: Sized + Send + Sync {
    /// Serializes the struct.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be serialized.
    fn write(&self) -> Result<Bytes, ProtocolError>;

    /// Deserializes the struct.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if `buf` is not a valid encoding.
    fn read(buf: &[u8]) -> Result<Self, ProtocolError>;
}

/// Encodes a struct into an envelope.
///
/// # Errors
/// Returns `Error::Protocol` if encoding fails.
pub fn encode<T: TStruct>(value: &T) -> Result<Bytes, Error> {
    value.write().map_err(Error::from)
}

/// Decodes a struct from an envelope.
///
/// # Errors
/// Returns `Error::Protocol` if decoding fails.
pub fn decode<T: TStruct>(buf: &[u8]) -> Result<T, Error> {
    T::read(buf).map_err(Error::from)
}
