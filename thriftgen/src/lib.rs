//! # thriftgen
//!
//! Generates typed RPC adapters from Thrift IDL.
//!
//! Given a service definition, thriftgen emits a Rust source file with a
//! service trait, a client facet that forwards typed calls over a generic
//! `(service, method, envelope)` transport, and a server facet that registers
//! one handler per method.
//!
//! ## Quick Start
//!
//! ```ignore
//! use thriftgen::driver::{DriverOptions, run};
//!
//! let options = DriverOptions::new("idl/echo.thrift").output_dir("gen");
//! let path = run(&options)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`idl`] - IDL parsing and binding resolution
//! - [`codegen`] - Rust adapter generation and output
//! - [`runtime`] - Runtime used by generated code
//! - [`driver`] - Command line driver

pub mod driver;
pub mod error;

pub use driver::{DriverOptions, run};
pub use error::DriverError;

/// IDL parsing and binding resolution.
pub mod idl {
    pub use thriftgen_idl::*;
}

/// Rust adapter generation.
pub mod codegen {
    pub use thriftgen_codegen::*;
}

/// Runtime used by generated code.
pub mod runtime {
    pub use thriftgen_runtime::*;
}
