//! Client facet generation.

use super::interface::{error_type, signature};
use thriftgen_idl::binding::{ResolvedMethod, ResolvedService};

/// Generator for the client facet: a struct implementing the service trait by
/// forwarding every call to a `TChanClient`.
pub struct ClientGenerator<'a> {
    service: &'a ResolvedService,
}

impl<'a> ClientGenerator<'a> {
    /// Creates a new client generator.
    #[must_use]
    pub fn new(service: &'a ResolvedService) -> Self {
        Self { service }
    }

    /// Generates the client struct, its constructors and the trait impl.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();
        let client_name = self.service.client_name();

        output.push_str(&format!(
            "/// Client for the `{}` service.\n",
            self.service.name
        ));
        output.push_str("#[derive(Clone)]\n");
        output.push_str(&format!("pub struct {} {{\n", client_name));
        output.push_str("    client: std::sync::Arc<dyn tchan::TChanClient>,\n");
        output.push_str("    service: String,\n");
        output.push_str("}\n\n");

        output.push_str(&format!("impl {} {{\n", client_name));
        output.push_str(&format!(
            "    /// Creates a client calling the `{}` service.\n",
            self.service.name
        ));
        output.push_str(
            "    pub fn new(client: std::sync::Arc<dyn tchan::TChanClient>) -> Self {\n",
        );
        output.push_str(&format!(
            "        Self::with_service_name(client, \"{}\")\n",
            self.service.name
        ));
        output.push_str("    }\n\n");
        output.push_str(
            "    /// Creates a client calling the service registered under `service`.\n",
        );
        output.push_str("    pub fn with_service_name(\n");
        output.push_str("        client: std::sync::Arc<dyn tchan::TChanClient>,\n");
        output.push_str("        service: impl Into<String>,\n");
        output.push_str("    ) -> Self {\n");
        output.push_str("        Self {\n");
        output.push_str("            client,\n");
        output.push_str("            service: service.into(),\n");
        output.push_str("        }\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");

        output.push_str("#[tchan::async_trait]\n");
        output.push_str(&format!(
            "impl {} for {} {{\n",
            self.service.trait_name(),
            client_name
        ));
        for (i, method) in self.service.methods.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            output.push_str(&generate_method(method));
        }
        output.push_str("}\n\n");

        output
    }
}

/// Renders the argument struct literal, fields in declared order.
fn args_literal(method: &ResolvedMethod) -> String {
    if method.arguments.is_empty() {
        return format!("{} {{}}", method.args_struct);
    }
    let fields: Vec<String> = method
        .arguments
        .iter()
        .map(|arg| {
            if arg.binding == arg.field_name {
                arg.field_name.clone()
            } else {
                format!("{}: {}", arg.field_name, arg.binding)
            }
        })
        .collect();
    format!("{} {{ {} }}", method.args_struct, fields.join(", "))
}

fn generate_method(method: &ResolvedMethod) -> String {
    let mut output = String::new();

    output.push_str(&format!("    {} {{\n", signature(method)));
    output.push_str(&format!("        let args = {};\n", args_literal(method)));

    if method.oneway {
        output.push_str(&format!(
            "        tchan::call_oneway(self.client.as_ref(), ctx, &self.service, \"{}\", &args).await\n",
            method.name
        ));
        output.push_str("    }\n");
        return output;
    }

    let has_result = !method.is_void() || !method.exceptions.is_empty();
    output.push_str(&format!(
        "        let {}: {} =\n",
        if has_result { "result" } else { "_result" },
        method.result_struct
    ));
    output.push_str(&format!(
        "            tchan::call(self.client.as_ref(), ctx, &self.service, \"{}\", &args).await?;\n",
        method.name
    ));

    if !method.is_void() {
        output.push_str("        if let Some(success) = result.success {\n");
        output.push_str("            return Ok(success);\n");
        output.push_str("        }\n");
    }
    for exc in &method.exceptions {
        output.push_str(&format!(
            "        if let Some(exc) = result.{} {{\n",
            exc.field_name
        ));
        output.push_str(&format!(
            "            return Err({}::{}(exc));\n",
            error_type(method),
            exc.variant_name
        ));
        output.push_str("        }\n");
    }

    if method.is_void() {
        output.push_str("        Ok(())\n");
    } else {
        let into = if method.error_enum.is_some() {
            ".into()"
        } else {
            ""
        };
        output.push_str(&format!(
            "        Err(tchan::Error::missing_result(&self.service, \"{}\"){})\n",
            method.name, into
        ));
    }
    output.push_str("    }\n");

    output
}
