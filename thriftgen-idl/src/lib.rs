//! # thriftgen IDL
//!
//! Thrift IDL front end for the thriftgen binding generator.
//!
//! This crate provides:
//! - A winnow-based parser for the Thrift IDL subset
//! - The parsed document model, including every transitively included file
//! - Binding resolution: type lookup, inheritance flattening, oneway and
//!   exception validation

pub mod binding;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod types;

pub use binding::{
    BindingSet, Include, ResolvedField, ResolvedMethod, ResolvedService, ResolvedType,
};
pub use error::{ParseError, ResolutionError};
pub use parser::{parse_document, parse_file};
pub use resolver::resolve;
pub use types::{
    BaseType, Document, FieldDef, IdlModel, MethodDef, NamedKind, ServiceDef, StructDef, TypeRef,
};
