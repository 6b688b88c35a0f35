//! Service trait and per-method exception enum generation.

use thriftgen_idl::binding::{RPC_VARIANT, ResolvedMethod, ResolvedService};

/// Generator for the service trait and its exception enums.
pub struct InterfaceGenerator<'a> {
    service: &'a ResolvedService,
}

impl<'a> InterfaceGenerator<'a> {
    /// Creates a new interface generator.
    #[must_use]
    pub fn new(service: &'a ResolvedService) -> Self {
        Self { service }
    }

    /// Generates the trait followed by one enum per method that declares
    /// exceptions.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = self.generate_trait();
        for method in &self.service.methods {
            if let Some(enum_name) = &method.error_enum {
                output.push_str(&generate_error_enum(self.service, method, enum_name));
            }
        }
        output
    }

    fn generate_trait(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "/// Interface of the `{}` service.\n",
            self.service.name
        ));
        if let Some(parent) = &self.service.parent {
            output.push_str("///\n");
            output.push_str(&format!(
                "/// Includes the methods inherited from `{}`.\n",
                parent
            ));
        }
        output.push_str("#[tchan::async_trait]\n");
        output.push_str(&format!(
            "pub trait {}: Send + Sync {{\n",
            self.service.trait_name()
        ));

        for (i, method) in self.service.methods.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            if method.oneway {
                output.push_str(&format!(
                    "    /// Handles `{}`. Oneway: the caller does not wait for completion.\n",
                    method.name
                ));
            } else {
                output.push_str(&format!("    /// Handles `{}`.\n", method.name));
            }
            output.push_str(&format!("    {};\n", signature(method)));
        }

        output.push_str("}\n\n");
        output
    }
}

/// Renders the trait method signature, without a trailing `;` or body.
pub(crate) fn signature(method: &ResolvedMethod) -> String {
    let mut params = String::from("&self, ctx: &tchan::Context");
    for arg in &method.arguments {
        params.push_str(&format!(", {}: {}", arg.binding, arg.field_type.rust_type()));
    }
    format!(
        "async fn {}({}) -> Result<{}, {}>",
        method.rust_name,
        params,
        method.rust_return_type(),
        error_type(method)
    )
}

/// Returns the error type of a method: its exception enum or the runtime error.
pub(crate) fn error_type(method: &ResolvedMethod) -> &str {
    method.error_enum.as_deref().unwrap_or("tchan::Error")
}

fn generate_error_enum(service: &ResolvedService, method: &ResolvedMethod, name: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "/// Errors returned by `{}.{}`.\n",
        service.name, method.name
    ));
    output.push_str("#[derive(Debug)]\n");
    output.push_str(&format!("pub enum {} {{\n", name));
    for exc in &method.exceptions {
        output.push_str(&format!("    /// The `{}` exception.\n", exc.name));
        output.push_str(&format!(
            "    {}({}),\n",
            exc.variant_name,
            exc.field_type.rust_type()
        ));
    }
    output.push_str("    /// Transport or protocol failure.\n");
    output.push_str(&format!("    {}(tchan::Error),\n", RPC_VARIANT));
    output.push_str("}\n\n");

    output.push_str(&format!("impl From<tchan::Error> for {} {{\n", name));
    output.push_str("    fn from(err: tchan::Error) -> Self {\n");
    output.push_str(&format!("        Self::{}(err)\n", RPC_VARIANT));
    output.push_str("    }\n");
    output.push_str("}\n\n");

    output.push_str(&format!("impl std::fmt::Display for {} {{\n", name));
    output.push_str(
        "    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {\n",
    );
    output.push_str("        match self {\n");
    for exc in &method.exceptions {
        output.push_str(&format!(
            "            Self::{}(exc) => write!(f, \"{}: {{:?}}\", exc),\n",
            exc.variant_name, exc.name
        ));
    }
    output.push_str(&format!(
        "            Self::{}(err) => write!(f, \"{{}}\", err),\n",
        RPC_VARIANT
    ));
    output.push_str("        }\n");
    output.push_str("    }\n");
    output.push_str("}\n\n");

    output.push_str(&format!("impl std::error::Error for {} {{\n", name));
    output.push_str(
        "    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {\n",
    );
    output.push_str("        match self {\n");
    output.push_str(&format!(
        "            Self::{}(err) => Some(err),\n",
        RPC_VARIANT
    ));
    output.push_str("            _ => None,\n");
    output.push_str("        }\n");
    output.push_str("    }\n");
    output.push_str("}\n\n");

    output
}
