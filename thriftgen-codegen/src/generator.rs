//! Main code generator: renders a [`BindingSet`] into one Rust source file.

use crate::error::CodegenError;
use crate::rust::{ClientGenerator, InterfaceGenerator, ServerGenerator};
use thriftgen_idl::BindingSet;

/// Default path of the runtime crate referenced by generated code.
pub const DEFAULT_RUNTIME_CRATE: &str = "thriftgen_runtime";

/// Default root under which included packages are imported.
pub const DEFAULT_INCLUDE_ROOT: &str = "crate";

/// Options controlling the generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    runtime_crate: String,
    types_module: Option<String>,
    include_root: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            types_module: None,
            include_root: DEFAULT_INCLUDE_ROOT.to_string(),
        }
    }
}

impl GeneratorOptions {
    /// Creates options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path of the runtime crate (`use <path> as tchan;`).
    #[must_use]
    pub fn runtime_crate(mut self, path: impl Into<String>) -> Self {
        self.runtime_crate = path.into();
        self
    }

    /// Sets a module whose items are glob-imported, typically the upstream
    /// argument and result structs.
    #[must_use]
    pub fn types_module(mut self, path: impl Into<String>) -> Self {
        self.types_module = Some(path.into());
        self
    }

    /// Sets the module path included packages are imported from.
    #[must_use]
    pub fn include_root(mut self, path: impl Into<String>) -> Self {
        self.include_root = path.into();
        self
    }

    /// Returns the runtime crate path.
    #[must_use]
    pub fn get_runtime_crate(&self) -> &str {
        &self.runtime_crate
    }

    /// Returns the types module, if any.
    #[must_use]
    pub fn get_types_module(&self) -> Option<&str> {
        self.types_module.as_deref()
    }
}

/// Main code generator.
pub struct Generator<'a> {
    bindings: &'a BindingSet,
    options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    /// Creates a new generator with default options.
    #[must_use]
    pub fn new(bindings: &'a BindingSet) -> Self {
        Self::with_options(bindings, GeneratorOptions::default())
    }

    /// Creates a new generator.
    #[must_use]
    pub fn with_options(bindings: &'a BindingSet, options: GeneratorOptions) -> Self {
        Self { bindings, options }
    }

    /// Generates the complete source file.
    ///
    /// The output depends only on the bindings and the options, so repeated
    /// runs produce identical text.
    ///
    /// # Errors
    /// Returns `CodegenError::Emission` if the bindings break an invariant
    /// the resolver guarantees or the rendered text is not valid Rust.
    pub fn generate(&self) -> Result<String, CodegenError> {
        self.check_invariants()?;

        let mut output = String::new();
        output.push_str(&self.generate_header());

        for service in &self.bindings.services {
            tracing::debug!(
                service = %service.name,
                methods = service.methods.len(),
                "emitting service"
            );
            output.push_str(&InterfaceGenerator::new(service).generate());
            output.push_str(&ClientGenerator::new(service).generate());
            output.push_str(&ServerGenerator::new(service).generate());
        }

        syn::parse_file(&output).map_err(|e| {
            CodegenError::emission(format!(
                "generated code for package '{}' does not parse: {}",
                self.bindings.package, e
            ))
        })?;

        Ok(output)
    }

    fn check_invariants(&self) -> Result<(), CodegenError> {
        for service in &self.bindings.services {
            for method in &service.methods {
                if method.oneway && (!method.is_void() || !method.exceptions.is_empty()) {
                    return Err(CodegenError::emission(format!(
                        "oneway method '{}.{}' carries a result",
                        service.name, method.name
                    )));
                }
                if method.error_enum.is_some() == method.exceptions.is_empty() {
                    return Err(CodegenError::emission(format!(
                        "method '{}.{}' has an exception enum without exceptions or vice versa",
                        service.name, method.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn generate_header(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "// Code generated by thriftgen for package `{}`. DO NOT EDIT.\n\n",
            self.bindings.package
        ));
        output.push_str(&format!(
            "use {} as tchan;\n",
            self.options.runtime_crate
        ));
        if let Some(types) = &self.options.types_module {
            output.push_str("#[allow(unused_imports)]\n");
            output.push_str(&format!("use {}::*;\n", types));
        }
        for include in self.bindings.includes.values() {
            output.push_str("#[allow(unused_imports)]\n");
            output.push_str(&format!(
                "use {}::{};\n",
                self.options.include_root, include.package
            ));
        }
        output.push('\n');

        output
    }
}
