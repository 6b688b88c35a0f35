//! # thriftgen Codegen
//!
//! Rust adapter generation from Thrift IDL.
//!
//! This crate provides:
//! - Service trait and per-method exception enum generation
//! - Client and server facet generation over the thriftgen runtime
//! - Output finalization with a deterministic file layout
//! - Build script integration

pub mod error;
pub mod generator;
pub mod output;
pub mod rust;

pub use error::CodegenError;
pub use generator::{Generator, GeneratorOptions};
pub use output::{finalize, output_path, write_output};

use std::path::{Path, PathBuf};

/// Generated source for one IDL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Package of the IDL file.
    pub package: String,
    /// Generated Rust source, not yet finalized.
    pub source: String,
}

impl GeneratedFile {
    /// Writes the file to `<output_dir>/<package>/tchan-<package>.rs`.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` if writing fails.
    pub fn write_to(&self, output_dir: &Path) -> Result<PathBuf, CodegenError> {
        write_output(output_dir, &self.package, &self.source)
    }
}

/// Generates adapter code from IDL source text with no includes.
///
/// # Arguments
/// * `name` - File name the source stands for; its stem is the package name
/// * `source` - IDL source text
/// * `options` - Generator options
///
/// # Errors
/// Returns `CodegenError` if parsing, resolution or generation fails.
pub fn generate_from_str(
    name: &str,
    source: &str,
    options: &GeneratorOptions,
) -> Result<GeneratedFile, CodegenError> {
    let document = thriftgen_idl::parse_document(name, source)?;
    generate_from_model(&thriftgen_idl::IdlModel::single(document), options)
}

/// Generates adapter code from an IDL file, following its includes.
///
/// # Arguments
/// * `path` - Path to the IDL file
/// * `options` - Generator options
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, resolution or generation fails.
pub fn generate_from_file(
    path: &Path,
    options: &GeneratorOptions,
) -> Result<GeneratedFile, CodegenError> {
    let model = thriftgen_idl::parse_file(path)?;
    generate_from_model(&model, options)
}

/// Generates adapter code for the root document of a parsed model.
///
/// # Errors
/// Returns `CodegenError` if resolution or generation fails.
pub fn generate_from_model(
    model: &thriftgen_idl::IdlModel,
    options: &GeneratorOptions,
) -> Result<GeneratedFile, CodegenError> {
    let bindings = thriftgen_idl::resolve(model)?;
    let source = Generator::with_options(&bindings, options.clone()).generate()?;
    Ok(GeneratedFile {
        package: bindings.package,
        source,
    })
}
