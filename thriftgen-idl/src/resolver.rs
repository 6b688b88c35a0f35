//! Binding resolution.
//!
//! Walks an [`IdlModel`] and produces the [`BindingSet`] for its root document,
//! performing every semantic check the emitter relies on: type resolution
//! (across includes), inheritance flattening with cycle detection, oneway
//! classification and exception validation.

use crate::binding::{
    BindingSet, Include, RESERVED_BINDINGS, RPC_VARIANT, ResolvedField, ResolvedMethod,
    ResolvedService, ResolvedType, qualify, rust_ident, to_pascal_case,
};
use crate::error::ResolutionError;
use crate::types::{Document, FieldDef, IdlModel, MethodDef, NamedKind, ServiceDef, TypeRef};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

/// Typedef chains longer than this are treated as cyclic.
const MAX_TYPEDEF_DEPTH: usize = 64;

/// Resolves the root document of `model` into a [`BindingSet`].
///
/// # Arguments
/// * `model` - Root document plus every transitively included document
///
/// # Errors
/// Returns `ResolutionError` naming the offending service, method or field on
/// the first violated invariant.
pub fn resolve(model: &IdlModel) -> Result<BindingSet, ResolutionError> {
    let root = model
        .root_document()
        .ok_or_else(|| ResolutionError::MissingDocument {
            path: model.root.display().to_string(),
        })?;
    let resolver = Resolver { model };

    for doc in model.documents.values() {
        resolver.check_definitions(doc)?;
    }

    let mut services = Vec::with_capacity(root.services.len());
    for service in &root.services {
        let mut stack = Vec::new();
        let mut methods = resolver.effective_methods(root, service, &mut stack)?;
        for method in &mut methods {
            if !method.exceptions.is_empty() {
                method.error_enum = Some(format!(
                    "{}{}Error",
                    to_pascal_case(&service.name),
                    to_pascal_case(&method.name)
                ));
            }
        }
        tracing::debug!(
            service = %service.name,
            methods = methods.len(),
            "resolved service"
        );
        services.push(ResolvedService {
            name: service.name.clone(),
            parent: service.extends.clone(),
            methods,
        });
    }

    let includes = root
        .includes
        .iter()
        .map(|include| {
            let package = model
                .document(&include.resolved)
                .map_or_else(|| include.name().to_lowercase(), Document::package_name);
            (
                include.path.clone(),
                Include {
                    path: include.path.clone(),
                    package,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    Ok(BindingSet {
        package: root.package_name(),
        services,
        includes,
    })
}

struct Resolver<'a> {
    model: &'a IdlModel,
}

impl<'a> Resolver<'a> {
    /// Package qualifier for items declared in `doc`: none for the root.
    fn package_of(&self, doc: &Document) -> Option<String> {
        (doc.path != self.model.root).then(|| doc.package_name())
    }

    /// Finds the document and local name a possibly qualified name refers to.
    fn locate<'n>(&self, doc: &'a Document, name: &'n str) -> Option<(&'a Document, &'n str)> {
        match name.split_once('.') {
            Some((include, local)) => {
                let include = doc.include_named(include)?;
                let target = self.model.document(&include.resolved)?;
                Some((target, local))
            }
            None => Some((doc, name)),
        }
    }

    /// Verifies that struct, exception and typedef definitions only reference
    /// known types.
    fn check_definitions(&self, doc: &'a Document) -> Result<(), ResolutionError> {
        for def in doc.structs.iter().chain(&doc.exceptions) {
            for field in &def.fields {
                self.resolve_type(doc, &field.type_ref, &|| {
                    format!("struct {}, field {}", def.name, field.name)
                })?;
            }
        }
        for typedef in &doc.typedefs {
            self.resolve_type(doc, &typedef.target, &|| format!("typedef {}", typedef.name))?;
        }
        Ok(())
    }

    fn resolve_type(
        &self,
        doc: &'a Document,
        type_ref: &TypeRef,
        location: &dyn Fn() -> String,
    ) -> Result<ResolvedType, ResolutionError> {
        Ok(match type_ref {
            TypeRef::Base(base) => ResolvedType::Base(*base),
            TypeRef::List(elem) => {
                ResolvedType::List(Box::new(self.resolve_type(doc, elem, location)?))
            }
            TypeRef::Set(elem) => {
                ResolvedType::Set(Box::new(self.resolve_type(doc, elem, location)?))
            }
            TypeRef::Map(key, value) => ResolvedType::Map(
                Box::new(self.resolve_type(doc, key, location)?),
                Box::new(self.resolve_type(doc, value, location)?),
            ),
            TypeRef::Named(name) => {
                let unresolved = || ResolutionError::UnresolvedType {
                    type_name: name.clone(),
                    location: location(),
                };
                let (target, local) = self.locate(doc, name).ok_or_else(unresolved)?;
                let kind = target.type_kind(local).ok_or_else(unresolved)?;
                ResolvedType::Named {
                    kind,
                    name: local.to_string(),
                    package: self.package_of(target),
                }
            }
        })
    }

    /// Returns true if `type_ref` names an exception, following typedefs.
    fn is_exception(&self, doc: &'a Document, type_ref: &TypeRef) -> bool {
        let mut doc = doc;
        let mut current = type_ref;
        for _ in 0..MAX_TYPEDEF_DEPTH {
            let TypeRef::Named(name) = current else {
                return false;
            };
            let Some((target, local)) = self.locate(doc, name) else {
                return false;
            };
            match target.type_kind(local) {
                Some(NamedKind::Exception) => return true,
                Some(NamedKind::Typedef) => match target.typedef(local) {
                    Some(typedef) => {
                        doc = target;
                        current = &typedef.target;
                    }
                    None => return false,
                },
                _ => return false,
            }
        }
        false
    }

    /// Computes the effective method list of `service`, declared in `doc`.
    ///
    /// `stack` holds the services currently being resolved, outermost first.
    fn effective_methods(
        &self,
        doc: &'a Document,
        service: &'a ServiceDef,
        stack: &mut Vec<(PathBuf, String)>,
    ) -> Result<Vec<ResolvedMethod>, ResolutionError> {
        let key = (doc.path.clone(), service.name.clone());
        if let Some(start) = stack.iter().position(|entry| *entry == key) {
            let mut chain: Vec<&str> = stack[start..].iter().map(|(_, n)| n.as_str()).collect();
            chain.push(&service.name);
            return Err(ResolutionError::CyclicInheritance {
                chain: chain.join(" -> "),
            });
        }
        stack.push(key);

        let mut methods = match &service.extends {
            Some(parent) => {
                let unknown = || ResolutionError::UnknownService {
                    service: service.name.clone(),
                    parent: parent.clone(),
                };
                let (parent_doc, local) = self.locate(doc, parent).ok_or_else(unknown)?;
                let parent_def = parent_doc.service(local).ok_or_else(unknown)?;
                self.effective_methods(parent_doc, parent_def, stack)?
            }
            None => Vec::new(),
        };

        let mut declared = HashSet::new();
        for method in &service.methods {
            let resolved = self.resolve_method(doc, service, method)?;
            if !declared.insert(method.name.as_str()) {
                tracing::warn!(
                    service = %service.name,
                    method = %method.name,
                    "method declared twice in one service, the later declaration wins"
                );
            }
            methods.retain(|m| m.name != resolved.name);
            methods.push(resolved);
        }
        check_generated_names(&service.name, &methods)?;

        stack.pop();
        Ok(methods)
    }

    fn resolve_method(
        &self,
        doc: &'a Document,
        service: &ServiceDef,
        method: &MethodDef,
    ) -> Result<ResolvedMethod, ResolutionError> {
        let malformed =
            |reason: String| ResolutionError::malformed(&service.name, &method.name, reason);

        if method.oneway && method.return_type.is_some() {
            return Err(malformed("oneway method declares a return type".to_string()));
        }
        if method.oneway && !method.exceptions.is_empty() {
            return Err(malformed("oneway method declares exceptions".to_string()));
        }
        check_unique(&method.arguments, "argument").map_err(&malformed)?;
        check_unique(&method.exceptions, "exception").map_err(&malformed)?;

        let mut arguments = Vec::with_capacity(method.arguments.len());
        for arg in &method.arguments {
            let field_type = self.resolve_type(doc, &arg.type_ref, &|| {
                format!(
                    "service {}, method {}, argument {}",
                    service.name, method.name, arg.name
                )
            })?;
            arguments.push(resolved_field(arg, field_type));
        }

        let return_type = match &method.return_type {
            Some(ty) => Some(self.resolve_type(doc, ty, &|| {
                format!("service {}, method {}, return type", service.name, method.name)
            })?),
            None => None,
        };

        let mut exceptions = Vec::with_capacity(method.exceptions.len());
        for exc in &method.exceptions {
            let field_type = self.resolve_type(doc, &exc.type_ref, &|| {
                format!(
                    "service {}, method {}, exception {}",
                    service.name, method.name, exc.name
                )
            })?;
            if !self.is_exception(doc, &exc.type_ref) {
                return Err(ResolutionError::InvalidExceptionType {
                    service: service.name.clone(),
                    method: method.name.clone(),
                    field: exc.name.clone(),
                    type_name: exc.type_ref.to_string(),
                });
            }
            let field = resolved_field(exc, field_type);
            if field.variant_name == RPC_VARIANT {
                return Err(malformed(format!(
                    "exception field '{}' collides with the transport error variant",
                    exc.name
                )));
            }
            exceptions.push(field);
        }

        let package = self.package_of(doc);
        let struct_prefix = format!(
            "{}{}",
            to_pascal_case(&service.name),
            to_pascal_case(&method.name)
        );

        Ok(ResolvedMethod {
            name: method.name.clone(),
            rust_name: rust_ident(&method.name),
            declaring_service: service.name.clone(),
            arguments,
            return_type,
            exceptions,
            oneway: method.oneway,
            args_struct: qualify(package.as_deref(), &format!("{}Args", struct_prefix)),
            result_struct: qualify(package.as_deref(), &format!("{}Result", struct_prefix)),
            error_enum: None,
        })
    }
}

fn resolved_field(field: &FieldDef, field_type: ResolvedType) -> ResolvedField {
    let field_name = rust_ident(&field.name);
    let binding = if RESERVED_BINDINGS.contains(&field_name.as_str()) {
        format!("{}_", field_name)
    } else {
        field_name.clone()
    };
    ResolvedField {
        id: field.id,
        name: field.name.clone(),
        field_name,
        binding,
        variant_name: to_pascal_case(&field.name),
        field_type,
    }
}

/// Checks that ids and names are unique within a field list.
fn check_unique(fields: &[FieldDef], what: &str) -> Result<(), String> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for field in fields {
        if !ids.insert(field.id) {
            return Err(format!("duplicate {} id {}", what, field.id));
        }
        if !names.insert(rust_ident(&field.name)) {
            return Err(format!("duplicate {} name '{}'", what, field.name));
        }
    }
    Ok(())
}

/// Rejects distinct methods whose Rust function name or PascalCase struct
/// prefix coincide, since their generated items would clash.
fn check_generated_names(
    service: &str,
    methods: &[ResolvedMethod],
) -> Result<(), ResolutionError> {
    let mut functions: HashMap<&str, &str> = HashMap::new();
    let mut prefixes: HashMap<String, &str> = HashMap::new();
    for method in methods {
        let clash = functions
            .insert(&method.rust_name, &method.name)
            .or_else(|| prefixes.insert(to_pascal_case(&method.name), &method.name));
        if let Some(other) = clash {
            return Err(ResolutionError::malformed(
                service,
                &method.name,
                format!("generated Rust names clash with method '{}'", other),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::types::BaseType;

    fn resolve_src(src: &str) -> Result<BindingSet, ResolutionError> {
        let doc = parse_document("test.thrift", src).expect("Failed to parse");
        resolve(&IdlModel::single(doc))
    }

    fn model_with(files: &[(&str, &str)]) -> IdlModel {
        let mut documents = BTreeMap::new();
        for (path, src) in files {
            let doc = parse_document(path, src).expect("Failed to parse");
            documents.insert(PathBuf::from(path), doc);
        }
        IdlModel {
            root: PathBuf::from(files[0].0),
            documents,
        }
    }

    #[test]
    fn test_resolve_echo() {
        let set = resolve_src(
            "service Echo {
                string ping(1: string arg1)
                oneway void fireAndForget(1: string arg1)
            }",
        )
        .expect("Failed to resolve");

        assert_eq!(set.package, "test");
        let echo = set.service("Echo").unwrap();
        let ping = echo.method("ping").unwrap();
        assert!(!ping.oneway);
        assert_eq!(ping.rust_return_type(), "String");
        assert_eq!(ping.args_struct, "EchoPingArgs");
        assert_eq!(ping.result_struct, "EchoPingResult");
        assert_eq!(ping.error_enum, None);

        let fire = echo.method("fireAndForget").unwrap();
        assert!(fire.oneway);
        assert_eq!(fire.rust_name, "fire_and_forget");
    }

    #[test]
    fn test_argument_order_preserved() {
        let set = resolve_src("service S { void m(3: i32 c, 1: i32 a, 2: i32 b) }").unwrap();
        let ids: Vec<i16> = set.services[0].methods[0]
            .arguments
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_oneway_with_return_rejected() {
        let err = resolve_src("service S { oneway i32 m() }").unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::MalformedMethod { ref method, .. } if method == "m"
        ));
    }

    #[test]
    fn test_oneway_with_exceptions_rejected() {
        let err = resolve_src(
            "exception E {}
             service S { oneway void m() throws (1: E e) }",
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedMethod { .. }));
    }

    #[test]
    fn test_oneway_void_accepted() {
        let set = resolve_src("service S { oneway void m(1: i64 at) }").unwrap();
        assert!(set.services[0].methods[0].oneway);
    }

    #[test]
    fn test_exception_must_be_exception_type() {
        let err = resolve_src(
            "struct NotAnError {}
             service S { void m() throws (1: NotAnError e) }",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::InvalidExceptionType {
                service: "S".to_string(),
                method: "m".to_string(),
                field: "e".to_string(),
                type_name: "NotAnError".to_string(),
            }
        );
    }

    #[test]
    fn test_exception_through_typedef() {
        let set = resolve_src(
            "exception Boom {}
             typedef Boom Kaboom
             service S { void m() throws (1: Kaboom k) }",
        )
        .unwrap();
        let method = &set.services[0].methods[0];
        assert_eq!(method.exceptions[0].field_type.rust_type(), "Kaboom");
        assert_eq!(method.error_enum.as_deref(), Some("SMError"));
    }

    #[test]
    fn test_exception_order_preserved() {
        let set = resolve_src(
            "exception E1 {}
             exception E2 {}
             service S { i32 f() throws (2: E2 second, 1: E1 first) }",
        )
        .unwrap();
        let names: Vec<&str> = set.services[0].methods[0]
            .exceptions
            .iter()
            .map(|e| e.variant_name.as_str())
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn test_unresolved_type() {
        let err = resolve_src("service S { Missing m() }").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnresolvedType {
                type_name: "Missing".to_string(),
                location: "service S, method m, return type".to_string(),
            }
        );
    }

    #[test]
    fn test_unresolved_struct_field_type() {
        let err = resolve_src("struct A { 1: list<Nope> items }").unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::UnresolvedType { ref type_name, .. } if type_name == "Nope"
        ));
    }

    #[test]
    fn test_duplicate_argument_id() {
        let err = resolve_src("service S { void m(1: i32 a, 1: i32 b) }").unwrap_err();
        assert!(err.to_string().contains("duplicate argument id 1"));
    }

    #[test]
    fn test_inheritance_flattening_with_shadowing() {
        let set = resolve_src(
            "service A {
                i32 m(1: i32 x)
                void base()
             }
             service B extends A {
                string m(1: string y, 2: string z)
             }",
        )
        .unwrap();

        let b = set.service("B").unwrap();
        let names: Vec<&str> = b.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["base", "m"]);

        let m = b.method("m").unwrap();
        assert_eq!(m.declaring_service, "B");
        assert_eq!(m.rust_return_type(), "String");
        assert_eq!(m.arguments.len(), 2);

        let base = b.method("base").unwrap();
        assert_eq!(base.declaring_service, "A");
        assert_eq!(base.args_struct, "ABaseArgs");
    }

    #[test]
    fn test_cycle_rejected() {
        let err = resolve_src(
            "service A extends B { void a() }
             service B extends A { void b() }",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::CyclicInheritance {
                chain: "A -> B -> A".to_string()
            }
        );
    }

    #[test]
    fn test_self_extension_rejected() {
        let err = resolve_src("service A extends A {}").unwrap_err();
        assert!(matches!(err, ResolutionError::CyclicInheritance { .. }));
    }

    #[test]
    fn test_unknown_parent() {
        let err = resolve_src("service A extends Nowhere {}").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownService {
                service: "A".to_string(),
                parent: "Nowhere".to_string(),
            }
        );
    }

    #[test]
    fn test_cross_file_inheritance_and_types() {
        let model = model_with(&[
            (
                "kv.thrift",
                "include \"shared.thrift\"
                 service KeyValue extends shared.Base {
                    shared.Item get(1: string key) throws (1: shared.NotFound notFound)
                 }",
            ),
            (
                "shared.thrift",
                "struct Item { 1: binary data }
                 exception NotFound { 1: string key }
                 service Base { Item health() }",
            ),
        ]);

        let set = resolve(&model).expect("Failed to resolve");
        assert_eq!(set.includes["shared.thrift"].package, "shared");

        let kv = set.service("KeyValue").unwrap();
        let health = kv.method("health").unwrap();
        assert_eq!(health.args_struct, "shared::BaseHealthArgs");
        assert_eq!(health.rust_return_type(), "shared::Item");

        let get = kv.method("get").unwrap();
        assert_eq!(get.args_struct, "KeyValueGetArgs");
        assert_eq!(get.exceptions[0].field_name, "not_found");
        assert_eq!(get.exceptions[0].variant_name, "NotFound");
        assert_eq!(get.error_enum.as_deref(), Some("KeyValueGetError"));
    }

    #[test]
    fn test_reserved_binding_renamed() {
        let set = resolve_src("service S { void m(1: string ctx, 2: string type) }").unwrap();
        let args = &set.services[0].methods[0].arguments;
        assert_eq!(args[0].field_name, "ctx");
        assert_eq!(args[0].binding, "ctx_");
        assert_eq!(args[1].field_name, "r#type");
        assert_eq!(args[1].binding, "r#type");
        assert_eq!(args[1].field_type, ResolvedType::Base(BaseType::String));
    }

    #[test]
    fn test_rpc_variant_collision_rejected() {
        let err = resolve_src(
            "exception E {}
             service S { void m() throws (1: E rpc) }",
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedMethod { .. }));
    }

    #[test]
    fn test_colliding_rust_names_rejected() {
        let err = resolve_src("service S { void getFoo() void get_foo(1: i32 x) }").unwrap_err();
        match err {
            ResolutionError::MalformedMethod {
                service,
                method,
                reason,
            } => {
                assert_eq!(service, "S");
                assert_eq!(method, "get_foo");
                assert!(reason.contains("'getFoo'"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_inherited_rust_name_collision_rejected() {
        let err = resolve_src(
            "service Base { void getFoo() }
             service Child extends Base { void get_foo() }",
        )
        .unwrap_err();
        assert!(matches!(err, ResolutionError::MalformedMethod { .. }));
    }

    #[test]
    fn test_same_name_shadowing_still_accepted() {
        let set = resolve_src(
            "service Base { void getFoo() }
             service Child extends Base { void getFoo(1: i32 x) }",
        )
        .unwrap();
        let child = set.services.iter().find(|s| s.name == "Child").unwrap();
        assert_eq!(child.methods.len(), 1);
        assert_eq!(child.methods[0].arguments.len(), 1);
    }
}
