//! IDL model definitions.
//!
//! This module contains the data structures produced by the parser: documents
//! with their includes, namespaces, type definitions and services. The model is
//! a faithful image of the source text; name resolution and semantic checks
//! happen later in [`crate::resolver`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A parsed root document together with every transitively included document.
#[derive(Debug, Clone)]
pub struct IdlModel {
    /// Path of the document generation was requested for.
    pub root: PathBuf,
    /// All parsed documents keyed by their normalized path.
    pub documents: BTreeMap<PathBuf, Document>,
}

impl IdlModel {
    /// Creates a model holding a single in-memory document.
    #[must_use]
    pub fn single(document: Document) -> Self {
        let root = document.path.clone();
        let mut documents = BTreeMap::new();
        documents.insert(root.clone(), document);
        Self { root, documents }
    }

    /// Returns the root document.
    #[must_use]
    pub fn root_document(&self) -> Option<&Document> {
        self.documents.get(&self.root)
    }

    /// Looks up a document by path.
    #[must_use]
    pub fn document(&self, path: &Path) -> Option<&Document> {
        self.documents.get(path)
    }
}

/// A single parsed IDL file.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Path the document was read from.
    pub path: PathBuf,
    /// Include directives in declaration order.
    pub includes: Vec<IncludeDef>,
    /// Namespace declarations keyed by scope (`rs`, `go`, `*`, ...).
    pub namespaces: BTreeMap<String, String>,
    /// Constants.
    pub constants: Vec<ConstDef>,
    /// Typedef aliases.
    pub typedefs: Vec<TypedefDef>,
    /// Enumerations.
    pub enums: Vec<EnumDef>,
    /// Plain structs.
    pub structs: Vec<StructDef>,
    /// Exception structs.
    pub exceptions: Vec<StructDef>,
    /// Services.
    pub services: Vec<ServiceDef>,
}

impl Document {
    /// Creates an empty document for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns the package name derived from the file name: the lowercased
    /// file stem.
    #[must_use]
    pub fn package_name(&self) -> String {
        package_name(&self.path)
    }

    /// Looks up a service by name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceDef> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Looks up the kind of a named type declared in this document.
    #[must_use]
    pub fn type_kind(&self, name: &str) -> Option<NamedKind> {
        if self.structs.iter().any(|s| s.name == name) {
            Some(NamedKind::Struct)
        } else if self.exceptions.iter().any(|s| s.name == name) {
            Some(NamedKind::Exception)
        } else if self.typedefs.iter().any(|t| t.name == name) {
            Some(NamedKind::Typedef)
        } else if self.enums.iter().any(|e| e.name == name) {
            Some(NamedKind::Enum)
        } else {
            None
        }
    }

    /// Looks up a typedef by name.
    #[must_use]
    pub fn typedef(&self, name: &str) -> Option<&TypedefDef> {
        self.typedefs.iter().find(|t| t.name == name)
    }

    /// Finds the include whose file stem matches `name`.
    #[must_use]
    pub fn include_named(&self, name: &str) -> Option<&IncludeDef> {
        self.includes.iter().find(|i| i.name() == name)
    }
}

/// Returns the package name for an IDL path: its lowercased file stem.
#[must_use]
pub fn package_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// An `include "path"` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDef {
    /// The path as written in the source.
    pub path: String,
    /// The path resolved against the including document, filled by the parser.
    pub resolved: PathBuf,
}

impl IncludeDef {
    /// Returns the name used to qualify types from this include: the file stem
    /// as written, e.g. `shared` for `include "shared.thrift"`.
    #[must_use]
    pub fn name(&self) -> String {
        Path::new(&self.path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A type reference as written in the IDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A base type such as `i32` or `string`.
    Base(BaseType),
    /// `list<T>`.
    List(Box<TypeRef>),
    /// `set<T>`.
    Set(Box<TypeRef>),
    /// `map<K, V>`.
    Map(Box<TypeRef>, Box<TypeRef>),
    /// A named type, possibly qualified with an include name (`shared.Item`).
    Named(String),
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base(base) => f.write_str(base.idl_name()),
            Self::List(elem) => write!(f, "list<{}>", elem),
            Self::Set(elem) => write!(f, "set<{}>", elem),
            Self::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Thrift base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `bool`.
    Bool,
    /// `byte` or `i8`.
    Byte,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `double`.
    Double,
    /// `string`.
    String,
    /// `binary`.
    Binary,
}

impl BaseType {
    /// Parses a base type keyword.
    #[must_use]
    pub fn from_idl_name(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(Self::Bool),
            "byte" | "i8" => Some(Self::Byte),
            "i16" => Some(Self::I16),
            "i32" => Some(Self::I32),
            "i64" => Some(Self::I64),
            "double" => Some(Self::Double),
            "string" => Some(Self::String),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Returns the IDL spelling of the type.
    #[must_use]
    pub const fn idl_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "binary",
        }
    }

    /// Returns the Rust type used for this base type.
    #[must_use]
    pub const fn rust_type(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Double => "f64",
            Self::String => "String",
            Self::Binary => "Vec<u8>",
        }
    }
}

/// Kind of a named, user-defined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKind {
    /// `struct`.
    Struct,
    /// `exception`.
    Exception,
    /// `typedef`.
    Typedef,
    /// `enum`.
    Enum,
}

/// Field requiredness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requiredness {
    /// No qualifier.
    #[default]
    Default,
    /// `required`.
    Required,
    /// `optional`.
    Optional,
}

/// A field of a struct, an argument list or a throws list.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field id; implicit ids are negative.
    pub id: i16,
    /// Field name.
    pub name: String,
    /// Field type.
    pub type_ref: TypeRef,
    /// Requiredness qualifier.
    pub requiredness: Requiredness,
    /// Default value, if any.
    pub default: Option<ConstValue>,
}

impl FieldDef {
    /// Creates a field with default requiredness and no default value.
    #[must_use]
    pub fn new(id: i16, name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            id,
            name: name.into(),
            type_ref,
            requiredness: Requiredness::Default,
            default: None,
        }
    }
}

/// A constant value literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Double(f64),
    /// String literal.
    Str(String),
    /// Reference to another constant or enum value.
    Identifier(String),
    /// `[a, b, ...]`.
    List(Vec<ConstValue>),
    /// `{k: v, ...}`.
    Map(Vec<(ConstValue, ConstValue)>),
}

/// `const T name = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDef {
    /// Constant name.
    pub name: String,
    /// Constant type.
    pub type_ref: TypeRef,
    /// Constant value.
    pub value: ConstValue,
}

/// `typedef T Alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDef {
    /// Alias name.
    pub name: String,
    /// Aliased type.
    pub target: TypeRef,
}

/// `enum Name { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// Enum name.
    pub name: String,
    /// Values in declaration order with their resolved integer values.
    pub values: Vec<(String, i64)>,
}

/// A `struct` or `exception` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    /// Struct name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
}

/// A service function.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    /// Method name.
    pub name: String,
    /// Arguments in declaration order.
    pub arguments: Vec<FieldDef>,
    /// Return type; `None` for `void`.
    pub return_type: Option<TypeRef>,
    /// Declared exceptions in declaration order.
    pub exceptions: Vec<FieldDef>,
    /// Whether the method was declared `oneway`.
    pub oneway: bool,
}

impl MethodDef {
    /// Creates a two-way `void` method without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            return_type: None,
            exceptions: Vec::new(),
            oneway: false,
        }
    }
}

/// A `service` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDef {
    /// Service name.
    pub name: String,
    /// Parent service, possibly qualified with an include name.
    pub extends: Option<String>,
    /// Methods in declaration order.
    pub methods: Vec<MethodDef>,
}

impl ServiceDef {
    /// Creates a service without a parent.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            methods: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_lowercases_stem() {
        assert_eq!(package_name(Path::new("idl/KeyValue.thrift")), "keyvalue");
        assert_eq!(package_name(Path::new("echo.thrift")), "echo");
    }

    #[test]
    fn test_include_name() {
        let include = IncludeDef {
            path: "../common/Shared.thrift".to_string(),
            resolved: PathBuf::from("common/Shared.thrift"),
        };
        assert_eq!(include.name(), "Shared");
    }

    #[test]
    fn test_base_type_round_trip_names() {
        assert_eq!(BaseType::from_idl_name("i8"), Some(BaseType::Byte));
        assert_eq!(BaseType::from_idl_name("byte"), Some(BaseType::Byte));
        assert_eq!(BaseType::from_idl_name("uuid"), None);
        assert_eq!(BaseType::Binary.rust_type(), "Vec<u8>");
    }

    #[test]
    fn test_type_ref_display() {
        let map = TypeRef::Map(
            Box::new(TypeRef::Base(BaseType::String)),
            Box::new(TypeRef::List(Box::new(TypeRef::Named("shared.Item".into())))),
        );
        assert_eq!(map.to_string(), "map<string, list<shared.Item>>");
    }

    #[test]
    fn test_document_type_kind() {
        let mut doc = Document::new("test.thrift");
        doc.exceptions.push(StructDef {
            name: "NotFound".to_string(),
            fields: Vec::new(),
        });
        doc.typedefs.push(TypedefDef {
            name: "Key".to_string(),
            target: TypeRef::Base(BaseType::String),
        });

        assert_eq!(doc.type_kind("NotFound"), Some(NamedKind::Exception));
        assert_eq!(doc.type_kind("Key"), Some(NamedKind::Typedef));
        assert_eq!(doc.type_kind("Missing"), None);
    }
}
