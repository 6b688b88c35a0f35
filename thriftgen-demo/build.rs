//! Generates the Echo adapters from `idl/echo.thrift` into `OUT_DIR`.

use std::env;
use std::path::{Path, PathBuf};
use thriftgen_codegen::GeneratorOptions;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let idl = Path::new("idl/echo.thrift");
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rerun-if-changed={}", idl.display());

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let options = GeneratorOptions::new().types_module("super::types");
    let generated = thriftgen_codegen::generate_from_file(idl, &options)?;
    generated.write_to(&out_dir)?;
    Ok(())
}
