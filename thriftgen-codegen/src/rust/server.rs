//! Server facet generation.

use thriftgen_idl::binding::{RPC_VARIANT, ResolvedMethod, ResolvedService};

/// Generator for the server facet: a `TChanServer` that decodes arguments,
/// calls the user's implementation and encodes the result struct.
pub struct ServerGenerator<'a> {
    service: &'a ResolvedService,
}

impl<'a> ServerGenerator<'a> {
    /// Creates a new server generator.
    #[must_use]
    pub fn new(service: &'a ResolvedService) -> Self {
        Self { service }
    }

    /// Generates the server struct and its `TChanServer` impl.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();
        let server_name = self.service.server_name();
        let trait_name = self.service.trait_name();

        output.push_str(&format!(
            "/// Server exposing a [`{}`] implementation.\n",
            trait_name
        ));
        output.push_str(&format!("pub struct {}<H> {{\n", server_name));
        output.push_str("    handler: std::sync::Arc<H>,\n");
        output.push_str("    service: String,\n");
        output.push_str("}\n\n");

        output.push_str(&format!(
            "impl<H: {} + 'static> {}<H> {{\n",
            trait_name, server_name
        ));
        output.push_str(&format!(
            "    /// Creates a server registered as `{}`.\n",
            self.service.name
        ));
        output.push_str("    pub fn new(handler: H) -> Self {\n");
        output.push_str("        Self::from_arc(std::sync::Arc::new(handler))\n");
        output.push_str("    }\n\n");
        output.push_str("    /// Creates a server sharing an existing implementation.\n");
        output.push_str("    pub fn from_arc(handler: std::sync::Arc<H>) -> Self {\n");
        output.push_str("        Self {\n");
        output.push_str("            handler,\n");
        output.push_str(&format!(
            "            service: \"{}\".to_string(),\n",
            self.service.name
        ));
        output.push_str("        }\n");
        output.push_str("    }\n\n");
        output.push_str("    /// Registers the handlers under a different service name.\n");
        output.push_str("    #[must_use]\n");
        output.push_str(
            "    pub fn with_service_name(mut self, service: impl Into<String>) -> Self {\n",
        );
        output.push_str("        self.service = service.into();\n");
        output.push_str("        self\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");

        output.push_str(&format!(
            "impl<H: {} + 'static> tchan::TChanServer for {}<H> {{\n",
            trait_name, server_name
        ));
        output.push_str("    fn service(&self) -> &str {\n");
        output.push_str("        &self.service\n");
        output.push_str("    }\n\n");
        output.push_str("    #[allow(clippy::field_reassign_with_default)]\n");
        output.push_str("    fn handlers(&self) -> tchan::HandlerMap {\n");
        output.push_str("        let mut handlers = tchan::HandlerMap::new();\n");
        for method in &self.service.methods {
            output.push_str(&generate_handler(method));
        }
        output.push_str("        handlers\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");

        output
    }
}

/// Renders the call of the implementation with decoded arguments in order.
fn invocation(method: &ResolvedMethod) -> String {
    let mut call_args = String::from("&ctx");
    for arg in &method.arguments {
        call_args.push_str(&format!(", args.{}", arg.field_name));
    }
    format!("handler.{}({}).await", method.rust_name, call_args)
}

fn generate_handler(method: &ResolvedMethod) -> String {
    let mut output = String::new();
    let constructor = if method.oneway { "oneway" } else { "two_way" };
    let args_binding = if method.arguments.is_empty() {
        "_args"
    } else {
        "args"
    };

    output.push_str("        {\n");
    output.push_str("            let handler = std::sync::Arc::clone(&self.handler);\n");
    output.push_str("            handlers.insert(\n");
    output.push_str(&format!("                \"{}\",\n", method.name));
    output.push_str(&format!(
        "                tchan::Handler::{}(move |ctx, envelope| {{\n",
        constructor
    ));
    output.push_str("                    let handler = std::sync::Arc::clone(&handler);\n");
    output.push_str("                    async move {\n");
    output.push_str(&format!(
        "                        let {}: {} = tchan::decode(&envelope)?;\n",
        args_binding, method.args_struct
    ));

    let body = "                        ";
    if method.oneway {
        output.push_str(&format!("{}{}\n", body, invocation(method)));
    } else if let Some(enum_name) = &method.error_enum {
        output.push_str(&format!(
            "{}let mut result = {}::default();\n",
            body, method.result_struct
        ));
        output.push_str(&format!("{}match {} {{\n", body, invocation(method)));
        if method.is_void() {
            output.push_str(&format!("{}    Ok(()) => {{}}\n", body));
        } else {
            output.push_str(&format!(
                "{}    Ok(success) => result.success = Some(success),\n",
                body
            ));
        }
        for exc in &method.exceptions {
            output.push_str(&format!(
                "{}    Err({}::{}(exc)) => result.{} = Some(exc),\n",
                body, enum_name, exc.variant_name, exc.field_name
            ));
        }
        output.push_str(&format!(
            "{}    Err({}::{}(err)) => return Err(err),\n",
            body, enum_name, RPC_VARIANT
        ));
        output.push_str(&format!("{}}}\n", body));
        output.push_str(&format!("{}tchan::encode(&result)\n", body));
    } else if method.is_void() {
        output.push_str(&format!("{}{}?;\n", body, invocation(method)));
        output.push_str(&format!(
            "{}tchan::encode(&{}::default())\n",
            body, method.result_struct
        ));
    } else {
        output.push_str(&format!(
            "{}let mut result = {}::default();\n",
            body, method.result_struct
        ));
        output.push_str(&format!(
            "{}result.success = Some({}?);\n",
            body,
            invocation(method)
        ));
        output.push_str(&format!("{}tchan::encode(&result)\n", body));
    }

    output.push_str("                    }\n");
    output.push_str("                }),\n");
    output.push_str("            );\n");
    output.push_str("        }\n");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use thriftgen_idl::{IdlModel, parse_document, resolve};

    fn service(src: &str, name: &str) -> ResolvedService {
        let doc = parse_document("test.thrift", src).expect("Failed to parse");
        let set = resolve(&IdlModel::single(doc)).expect("Failed to resolve");
        set.service(name).cloned().expect("service missing")
    }

    #[test]
    fn test_handler_kinds() {
        let echo = service(
            "service Echo {
                string ping(1: string arg1)
                oneway void fireAndForget(1: string arg1)
            }",
            "Echo",
        );
        let code = ServerGenerator::new(&echo).generate();

        assert!(code.contains(
            "impl<H: TChanEcho + 'static> tchan::TChanServer for TChanEchoServer<H> {"
        ));
        assert!(code.contains("\"ping\",\n                tchan::Handler::two_way("));
        assert!(code.contains("\"fireAndForget\",\n                tchan::Handler::oneway("));
        assert!(code.contains("let args: EchoPingArgs = tchan::decode(&envelope)?;"));
        assert!(code.contains("result.success = Some(handler.ping(&ctx, args.arg1).await?);"));
        assert!(code.contains("handler.fire_and_forget(&ctx, args.arg1).await\n"));
    }

    #[test]
    fn test_exception_mapping_order() {
        let svc = service(
            "exception E1 {}
             exception E2 {}
             service S { void f(1: i32 a, 2: i32 b) throws (2: E2 second, 1: E1 first) }",
            "S",
        );
        let code = ServerGenerator::new(&svc).generate();

        assert!(code.contains("match handler.f(&ctx, args.a, args.b).await {"));
        assert!(code.contains("Ok(()) => {}"));
        let second = code.find("Err(SFError::Second(exc)) => result.second = Some(exc),").unwrap();
        let first = code.find("Err(SFError::First(exc)) => result.first = Some(exc),").unwrap();
        let rpc = code.find("Err(SFError::Rpc(err)) => return Err(err),").unwrap();
        assert!(second < first && first < rpc);
    }

    #[test]
    fn test_void_method_without_exceptions() {
        let svc = service("service S { void reset() }", "S");
        let code = ServerGenerator::new(&svc).generate();
        assert!(code.contains("let _args: SResetArgs = tchan::decode(&envelope)?;"));
        assert!(code.contains("handler.reset(&ctx).await?;"));
        assert!(code.contains("tchan::encode(&SResetResult::default())"));
    }
}
