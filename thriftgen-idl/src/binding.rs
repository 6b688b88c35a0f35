//! Binding set: the generation-ready form of an IDL file.
//!
//! A [`BindingSet`] is produced by [`crate::resolver::resolve`] and consumed by
//! the code emitter. It is self-contained: every type is already rendered to a
//! Rust path and every struct name the emitted code refers to is precomputed,
//! so emission needs no further IDL lookups.

use crate::types::{BaseType, NamedKind};
use std::collections::BTreeMap;

/// Resolved bindings for one IDL file.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSet {
    /// Package name (lowercased file stem).
    pub package: String,
    /// Services in declaration order, each with its effective method list.
    pub services: Vec<ResolvedService>,
    /// Includes of the file keyed by include path as written.
    pub includes: BTreeMap<String, Include>,
}

impl BindingSet {
    /// Gets a service by IDL name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ResolvedService> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// An include directive mapped to the package housing its generated types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// Include path as written.
    pub path: String,
    /// Package of the included file.
    pub package: String,
}

/// A service with its inheritance chain flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedService {
    /// Service name; also the service key used on the wire.
    pub name: String,
    /// Parent service as written in the IDL, if any.
    pub parent: Option<String>,
    /// Effective methods: inherited ones first, shadowed ones removed.
    pub methods: Vec<ResolvedMethod>,
}

impl ResolvedService {
    /// Returns the name of the service trait.
    #[must_use]
    pub fn trait_name(&self) -> String {
        format!("TChan{}", to_pascal_case(&self.name))
    }

    /// Returns the name of the client facet struct.
    #[must_use]
    pub fn client_name(&self) -> String {
        format!("TChan{}Client", to_pascal_case(&self.name))
    }

    /// Returns the name of the server facet struct.
    #[must_use]
    pub fn server_name(&self) -> String {
        format!("TChan{}Server", to_pascal_case(&self.name))
    }

    /// Gets an effective method by IDL name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&ResolvedMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A method ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMethod {
    /// Method name; also the method key used on the wire.
    pub name: String,
    /// Rust function name.
    pub rust_name: String,
    /// Service that declared the method (differs from the owning service for
    /// inherited methods).
    pub declaring_service: String,
    /// Arguments in declared order.
    pub arguments: Vec<ResolvedField>,
    /// Return type; `None` for `void`.
    pub return_type: Option<ResolvedType>,
    /// Declared exceptions in declared order.
    pub exceptions: Vec<ResolvedField>,
    /// Whether the call has no response.
    pub oneway: bool,
    /// Path of the upstream argument struct.
    pub args_struct: String,
    /// Path of the upstream result struct.
    pub result_struct: String,
    /// Name of the per-method exception enum, present iff exceptions are declared.
    pub error_enum: Option<String>,
}

impl ResolvedMethod {
    /// Returns the Rust type returned on success.
    #[must_use]
    pub fn rust_return_type(&self) -> String {
        self.return_type
            .as_ref()
            .map_or_else(|| "()".to_string(), ResolvedType::rust_type)
    }

    /// Returns true if the method returns no value.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        self.return_type.is_none()
    }
}

/// A resolved argument or exception field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// Field id.
    pub id: i16,
    /// Field name as declared.
    pub name: String,
    /// Struct field name in the upstream struct.
    pub field_name: String,
    /// Local binding name in emitted code, distinct from the emitter's own locals.
    pub binding: String,
    /// Enum variant name used when the field is an exception.
    pub variant_name: String,
    /// Resolved type.
    pub field_type: ResolvedType,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    /// Base type.
    Base(BaseType),
    /// `list<T>`.
    List(Box<ResolvedType>),
    /// `set<T>`.
    Set(Box<ResolvedType>),
    /// `map<K, V>`.
    Map(Box<ResolvedType>, Box<ResolvedType>),
    /// User-defined type.
    Named {
        /// Kind of the definition.
        kind: NamedKind,
        /// Declared name.
        name: String,
        /// Package of the declaring file when it is not the generated file.
        package: Option<String>,
    },
}

impl ResolvedType {
    /// Returns the Rust type path.
    #[must_use]
    pub fn rust_type(&self) -> String {
        match self {
            Self::Base(base) => base.rust_type().to_string(),
            Self::List(elem) => format!("Vec<{}>", elem.rust_type()),
            Self::Set(elem) => format!("std::collections::BTreeSet<{}>", elem.rust_type()),
            Self::Map(key, value) => format!(
                "std::collections::BTreeMap<{}, {}>",
                key.rust_type(),
                value.rust_type()
            ),
            Self::Named { name, package, .. } => qualify(package.as_deref(), &to_pascal_case(name)),
        }
    }
}

/// Prefixes `item` with `package::` when a package is given.
#[must_use]
pub fn qualify(package: Option<&str>, item: &str) -> String {
    match package {
        Some(package) => format!("{}::{}", package, item),
        None => item.to_string(),
    }
}

/// Local names the emitted code binds itself; argument bindings must avoid them.
pub const RESERVED_BINDINGS: &[&str] =
    &["ctx", "args", "result", "envelope", "handler", "handlers"];

/// Name of the catch-all variant of per-method exception enums.
pub const RPC_VARIANT: &str = "Rpc";

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Converts an IDL name into a valid Rust identifier in snake_case.
///
/// Keywords become raw identifiers (`r#type`); names that cannot be raw
/// (`self`, `super`, `crate`) get a trailing underscore.
#[must_use]
pub fn rust_ident(name: &str) -> String {
    let snake = to_snake_case(name);
    if matches!(snake.as_str(), "self" | "super" | "crate") {
        format!("{}_", snake)
    } else if RUST_KEYWORDS.contains(&snake.as_str()) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// Converts a string to snake_case.
///
/// Acronyms stay together: `getHTTPStatus` becomes `get_http_status`.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            result.push('_');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                result.push('_');
            }
        }
        result.push(c.to_ascii_lowercase());
    }
    result
}

/// Converts a string to PascalCase.
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}
