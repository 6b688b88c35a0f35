//! Thrift IDL parser.
//!
//! This module turns IDL source text into the [`Document`] model and follows
//! `include` directives to build a complete [`IdlModel`]. The grammar is a set
//! of winnow parsers over the lexemes in [`crate::lexer`].

use crate::error::ParseError;
use crate::lexer::{self, Number, expected, reject};
use crate::types::{
    BaseType, ConstDef, ConstValue, Document, EnumDef, FieldDef, IdlModel, IncludeDef, MethodDef,
    Requiredness, ServiceDef, StructDef, TypeRef, TypedefDef,
};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use winnow::combinator::{cut_err, fail, opt};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::{ModalResult, Parser};

/// Parses an IDL file and every file it transitively includes.
///
/// Include paths are resolved relative to the directory of the including
/// file. Each file is parsed once, so include cycles terminate.
///
/// # Arguments
/// * `path` - Path of the root IDL file
///
/// # Errors
/// Returns `ParseError` if any file cannot be read or is malformed.
pub fn parse_file(path: &Path) -> Result<IdlModel, ParseError> {
    let root = normalize(path);
    let mut documents = BTreeMap::new();
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(next) = queue.pop_front() {
        if documents.contains_key(&next) {
            continue;
        }
        let source = std::fs::read_to_string(&next).map_err(|source| ParseError::Io {
            path: next.display().to_string(),
            source,
        })?;
        let document = parse_document(&next, &source)?;
        tracing::debug!(
            path = %next.display(),
            includes = document.includes.len(),
            services = document.services.len(),
            "parsed IDL document"
        );
        queue.extend(document.includes.iter().map(|i| i.resolved.clone()));
        documents.insert(next, document);
    }

    Ok(IdlModel { root, documents })
}

/// Parses a single document from source text.
///
/// Includes are recorded (with their paths resolved against `path`) but not
/// loaded.
///
/// # Arguments
/// * `path` - Path the source was read from, used for messages and includes
/// * `source` - IDL source text
///
/// # Errors
/// Returns `ParseError` if the source is malformed.
pub fn parse_document(path: impl AsRef<Path>, source: &str) -> Result<Document, ParseError> {
    let path = path.as_ref();
    let file = path.display().to_string();
    DocumentParser {
        path,
        file: &file,
        source,
        input: source,
    }
    .document()
}

/// Lexically normalizes a path, folding `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Drives the grammar over one document and turns winnow errors into
/// positioned [`ParseError`]s.
struct DocumentParser<'a, 's> {
    path: &'a Path,
    file: &'a str,
    source: &'s str,
    input: &'s str,
}

impl<'s> DocumentParser<'_, 's> {
    fn run<T>(
        &mut self,
        mut parser: impl FnMut(&mut &'s str) -> ModalResult<T>,
    ) -> Result<T, ParseError> {
        parser(&mut self.input).map_err(|err| self.syntax_error(err))
    }

    fn syntax_error(&self, err: ErrMode<ContextError>) -> ParseError {
        let context = match &err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx.context().next().cloned(),
            ErrMode::Incomplete(_) => None,
        };
        let mut rest = self.input;
        let message = match context {
            Some(StrContext::Label(label)) => label.to_string(),
            Some(StrContext::Expected(what)) => {
                let _ = lexer::ws(&mut rest);
                format!("expected {}, found {}", what, lexer::describe(rest))
            }
            _ => {
                let _ = lexer::ws(&mut rest);
                format!("unexpected {}", lexer::describe(rest))
            }
        };
        let (line, column) = lexer::position(self.source, rest);
        ParseError::syntax(self.file, line, column, message)
    }

    fn document(mut self) -> Result<Document, ParseError> {
        let mut doc = Document::new(self.path);
        let mut names = HashSet::new();

        loop {
            self.run(lexer::ws)?;
            if self.input.is_empty() {
                break;
            }
            let start = self.input;
            let keyword = self.run(|input| {
                cut_err(lexer::identifier)
                    .context(expected("definition"))
                    .parse_next(input)
            })?;

            let (kind, name) = match keyword {
                "include" => {
                    let path = self.run(string)?;
                    let base = self.path.parent().unwrap_or_else(|| Path::new(""));
                    let resolved = normalize(&base.join(&path));
                    doc.includes.push(IncludeDef { path, resolved });
                    self.run(separator)?;
                    continue;
                }
                "cpp_include" => {
                    self.run(string)?;
                    self.run(separator)?;
                    continue;
                }
                "namespace" => {
                    let (scope, name) = self.run(namespace)?;
                    doc.namespaces.insert(scope, name);
                    continue;
                }
                "union" | "senum" => {
                    let (line, column) = lexer::position(self.source, start);
                    return Err(ParseError::Unsupported {
                        file: self.file.to_string(),
                        line,
                        column,
                        construct: keyword.to_string(),
                    });
                }
                "const" => {
                    let def = self.run(const_def)?;
                    let name = def.name.clone();
                    doc.constants.push(def);
                    ("constant", name)
                }
                "typedef" => {
                    let def = self.run(typedef_def)?;
                    let name = def.name.clone();
                    doc.typedefs.push(def);
                    ("type", name)
                }
                "enum" => {
                    let def = self.run(enum_def)?;
                    let name = def.name.clone();
                    doc.enums.push(def);
                    ("type", name)
                }
                "struct" => {
                    let def = self.run(struct_def)?;
                    let name = def.name.clone();
                    doc.structs.push(def);
                    ("type", name)
                }
                "exception" => {
                    let def = self.run(struct_def)?;
                    let name = def.name.clone();
                    doc.exceptions.push(def);
                    ("type", name)
                }
                "service" => {
                    let def = self.run(service_def)?;
                    let name = def.name.clone();
                    doc.services.push(def);
                    ("service", name)
                }
                other => {
                    let (line, column) = lexer::position(self.source, start);
                    return Err(ParseError::syntax(
                        self.file,
                        line,
                        column,
                        format!("expected definition, found '{}'", other),
                    ));
                }
            };

            if !names.insert(name.clone()) {
                return Err(ParseError::duplicate(self.file, kind, name));
            }
        }

        Ok(doc)
    }
}

fn ident(input: &mut &str) -> ModalResult<String> {
    cut_err(lexer::identifier)
        .context(expected("identifier"))
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn string(input: &mut &str) -> ModalResult<String> {
    cut_err(lexer::string_literal)
        .context(expected("string literal"))
        .parse_next(input)
}

fn expect(input: &mut &str, c: char, what: &'static str) -> ModalResult<()> {
    cut_err(|i: &mut &str| lexer::symbol(i, c))
        .context(expected(what))
        .parse_next(input)
}

/// Consumes `c` if it is the next lexeme.
fn eat(input: &mut &str, c: char) -> ModalResult<bool> {
    Ok(opt(|i: &mut &str| lexer::symbol(i, c))
        .parse_next(input)?
        .is_some())
}

/// Consumes the keyword `kw` if it is the next lexeme.
fn eat_keyword(input: &mut &str, kw: &'static str) -> ModalResult<bool> {
    Ok(opt(|i: &mut &str| lexer::keyword(i, kw))
        .parse_next(input)?
        .is_some())
}

fn peek(input: &str, c: char) -> bool {
    let mut lookahead = input;
    lexer::symbol(&mut lookahead, c).is_ok()
}

fn separator(input: &mut &str) -> ModalResult<()> {
    if !eat(input, ',')? {
        eat(input, ';')?;
    }
    Ok(())
}

fn integer(input: &mut &str, what: &'static str) -> ModalResult<i64> {
    let start = *input;
    match cut_err(lexer::number)
        .context(expected(what))
        .parse_next(input)?
    {
        Number::Int(value) => Ok(value),
        Number::Double(_) => {
            *input = start;
            cut_err(fail)
                .context(expected(what))
                .parse_next(input)
        }
    }
}

/// Skips a `( key = "value", ... )` annotation list if present.
fn annotations(input: &mut &str) -> ModalResult<()> {
    if !eat(input, '(')? {
        return Ok(());
    }
    while !eat(input, ')')? {
        ident(input)?;
        if eat(input, '=')? {
            string(input)?;
        }
        separator(input)?;
    }
    Ok(())
}

fn namespace(input: &mut &str) -> ModalResult<(String, String)> {
    let scope = if eat(input, '*')? {
        "*".to_string()
    } else {
        ident(input)?
    };
    let name = ident(input)?;
    annotations(input)?;
    separator(input)?;
    Ok((scope, name))
}

fn const_def(input: &mut &str) -> ModalResult<ConstDef> {
    let type_ref = field_type(input)?;
    let name = ident(input)?;
    expect(input, '=', "'='")?;
    let value = const_value(input)?;
    separator(input)?;
    Ok(ConstDef {
        name,
        type_ref,
        value,
    })
}

fn typedef_def(input: &mut &str) -> ModalResult<TypedefDef> {
    let target = field_type(input)?;
    let name = ident(input)?;
    annotations(input)?;
    separator(input)?;
    Ok(TypedefDef { name, target })
}

fn enum_def(input: &mut &str) -> ModalResult<EnumDef> {
    let name = ident(input)?;
    expect(input, '{', "'{'")?;

    let mut values = Vec::new();
    let mut next_value = Some(0i64);
    while !eat(input, '}')? {
        let start = *input;
        let value_name = ident(input)?;
        let value = if eat(input, '=')? {
            integer(input, "integer enum value")?
        } else if let Some(value) = next_value {
            value
        } else {
            *input = start;
            lexer::ws(input)?;
            return reject(input, "enum value out of range");
        };
        next_value = value.checked_add(1);
        values.push((value_name, value));
        annotations(input)?;
        separator(input)?;
    }
    annotations(input)?;

    Ok(EnumDef { name, values })
}

fn struct_def(input: &mut &str) -> ModalResult<StructDef> {
    let name = ident(input)?;
    expect(input, '{', "'{'")?;
    let fields = field_list(input, '}')?;
    expect(input, '}', "'}'")?;
    annotations(input)?;
    Ok(StructDef { name, fields })
}

fn service_def(input: &mut &str) -> ModalResult<ServiceDef> {
    let mut service = ServiceDef::new(ident(input)?);
    if eat_keyword(input, "extends")? {
        service.extends = Some(ident(input)?);
    }
    expect(input, '{', "'{'")?;
    while !eat(input, '}')? {
        service.methods.push(method_def(input)?);
    }
    annotations(input)?;
    Ok(service)
}

fn method_def(input: &mut &str) -> ModalResult<MethodDef> {
    let oneway = eat_keyword(input, "oneway")?;
    let return_type = if eat_keyword(input, "void")? {
        None
    } else {
        Some(field_type(input)?)
    };

    let mut method = MethodDef::new(ident(input)?);
    method.oneway = oneway;
    method.return_type = return_type;

    expect(input, '(', "'('")?;
    method.arguments = field_list(input, ')')?;
    expect(input, ')', "')'")?;

    if eat_keyword(input, "throws")? {
        expect(input, '(', "'('")?;
        method.exceptions = field_list(input, ')')?;
        expect(input, ')', "')'")?;
    }

    annotations(input)?;
    separator(input)?;
    Ok(method)
}

/// Parses fields up to (not including) the closing delimiter.
fn field_list(input: &mut &str, close: char) -> ModalResult<Vec<FieldDef>> {
    let mut fields = Vec::new();
    let mut implicit_id = 0i16;
    while !peek(*input, close) {
        fields.push(field(input, &mut implicit_id)?);
    }
    Ok(fields)
}

fn field(input: &mut &str, implicit_id: &mut i16) -> ModalResult<FieldDef> {
    lexer::ws(input)?;
    let start = *input;
    let id = match opt(lexer::number).parse_next(input)? {
        Some(Number::Int(id)) => {
            expect(input, ':', "':'")?;
            match i16::try_from(id) {
                Ok(id) => id,
                Err(_) => {
                    *input = start;
                    return reject(input, "field id out of range");
                }
            }
        }
        Some(Number::Double(_)) => {
            *input = start;
            return cut_err(fail)
                .context(expected("field id"))
                .parse_next(input);
        }
        None => match implicit_id.checked_sub(1) {
            Some(id) => {
                *implicit_id = id;
                id
            }
            None => return reject(input, "too many fields without an id"),
        },
    };

    let requiredness = if eat_keyword(input, "required")? {
        Requiredness::Required
    } else if eat_keyword(input, "optional")? {
        Requiredness::Optional
    } else {
        Requiredness::Default
    };

    let type_ref = field_type(input)?;
    let name = ident(input)?;
    let default = if eat(input, '=')? {
        Some(const_value(input)?)
    } else {
        None
    };
    annotations(input)?;
    separator(input)?;

    Ok(FieldDef {
        id,
        name,
        type_ref,
        requiredness,
        default,
    })
}

fn field_type(input: &mut &str) -> ModalResult<TypeRef> {
    let name = ident(input)?;
    let type_ref = match name.as_str() {
        "list" | "set" => {
            expect(input, '<', "'<'")?;
            let elem = Box::new(field_type(input)?);
            expect(input, '>', "'>'")?;
            if name == "list" {
                TypeRef::List(elem)
            } else {
                TypeRef::Set(elem)
            }
        }
        "map" => {
            expect(input, '<', "'<'")?;
            let key = Box::new(field_type(input)?);
            expect(input, ',', "','")?;
            let value = Box::new(field_type(input)?);
            expect(input, '>', "'>'")?;
            TypeRef::Map(key, value)
        }
        other => BaseType::from_idl_name(other)
            .map_or_else(|| TypeRef::Named(other.to_string()), TypeRef::Base),
    };
    if eat_keyword(input, "cpp_type")? {
        string(input)?;
    }
    annotations(input)?;
    Ok(type_ref)
}

fn const_value(input: &mut &str) -> ModalResult<ConstValue> {
    if let Some(number) = opt(lexer::number).parse_next(input)? {
        return Ok(match number {
            Number::Int(v) => ConstValue::Int(v),
            Number::Double(v) => ConstValue::Double(v),
        });
    }
    if let Some(s) = opt(lexer::string_literal).parse_next(input)? {
        return Ok(ConstValue::Str(s));
    }
    if let Some(ident) = opt(lexer::identifier).parse_next(input)? {
        return Ok(ConstValue::Identifier(ident.to_string()));
    }
    if eat(input, '[')? {
        let mut items = Vec::new();
        while !eat(input, ']')? {
            items.push(const_value(input)?);
            separator(input)?;
        }
        return Ok(ConstValue::List(items));
    }
    if eat(input, '{')? {
        let mut entries = Vec::new();
        while !eat(input, '}')? {
            let key = const_value(input)?;
            expect(input, ':', "':'")?;
            let value = const_value(input)?;
            entries.push((key, value));
            separator(input)?;
        }
        return Ok(ConstValue::Map(entries));
    }
    cut_err(fail)
        .context(expected("constant value"))
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NamedKind;

    const ECHO_IDL: &str = r#"
namespace rs echo
include "shared.thrift"

typedef string Message

exception EchoError {
  1: string reason
}

service Echo extends shared.Base {
  Message ping(1: Message arg1) throws (1: EchoError err),
  oneway void fireAndForget(1: string arg1);
  void reset()
}
"#;

    #[test]
    fn test_parse_document_services() {
        let doc = parse_document("idl/echo.thrift", ECHO_IDL).expect("Failed to parse");

        assert_eq!(doc.namespaces.get("rs").map(String::as_str), Some("echo"));
        assert_eq!(doc.services.len(), 1);

        let echo = &doc.services[0];
        assert_eq!(echo.name, "Echo");
        assert_eq!(echo.extends.as_deref(), Some("shared.Base"));
        assert_eq!(echo.methods.len(), 3);

        let ping = &echo.methods[0];
        assert_eq!(ping.return_type, Some(TypeRef::Named("Message".to_string())));
        assert_eq!(ping.exceptions.len(), 1);
        assert!(!ping.oneway);

        let fire = &echo.methods[1];
        assert!(fire.oneway);
        assert_eq!(fire.return_type, None);

        assert!(echo.methods[2].arguments.is_empty());
    }

    #[test]
    fn test_parse_document_include_resolution() {
        let doc = parse_document("idl/echo.thrift", ECHO_IDL).expect("Failed to parse");
        assert_eq!(doc.includes.len(), 1);
        assert_eq!(doc.includes[0].path, "shared.thrift");
        assert_eq!(doc.includes[0].resolved, PathBuf::from("idl/shared.thrift"));
    }

    #[test]
    fn test_parse_document_type_kinds() {
        let doc = parse_document("echo.thrift", ECHO_IDL).expect("Failed to parse");
        assert_eq!(doc.type_kind("Message"), Some(NamedKind::Typedef));
        assert_eq!(doc.type_kind("EchoError"), Some(NamedKind::Exception));
    }

    #[test]
    fn test_parse_fields_keep_declared_order_and_ids() {
        let src = "struct S { 3: i32 c, 1: required string a; 2: optional list<i64> b = [1, 2] }";
        let doc = parse_document("s.thrift", src).expect("Failed to parse");
        let fields = &doc.structs[0].fields;

        let ids: Vec<i16> = fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(fields[1].requiredness, Requiredness::Required);
        assert_eq!(
            fields[2].default,
            Some(ConstValue::List(vec![ConstValue::Int(1), ConstValue::Int(2)]))
        );
    }

    #[test]
    fn test_parse_implicit_field_ids() {
        let doc = parse_document("s.thrift", "struct S { string a, string b }").unwrap();
        let ids: Vec<i16> = doc.structs[0].fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![-1, -2]);
    }

    #[test]
    fn test_parse_containers_and_annotations() {
        let src = r#"struct S {
            1: map<string, set<binary>> (python.immutable = "") m,
            2: list<shared.Item> items,
        } (final = "true")"#;
        let doc = parse_document("s.thrift", src).expect("Failed to parse");
        let fields = &doc.structs[0].fields;
        assert_eq!(fields[0].type_ref.to_string(), "map<string, set<binary>>");
        assert_eq!(fields[1].type_ref.to_string(), "list<shared.Item>");
    }

    #[test]
    fn test_parse_enum_values() {
        let doc = parse_document("e.thrift", "enum Color { RED, GREEN = 5, BLUE }").unwrap();
        assert_eq!(
            doc.enums[0].values,
            vec![
                ("RED".to_string(), 0),
                ("GREEN".to_string(), 5),
                ("BLUE".to_string(), 6)
            ]
        );
    }

    #[test]
    fn test_parse_constants() {
        let src = r#"const map<string, i32> LIMITS = {"a": 1, "b": 2}
const double RATIO = 2.5;"#;
        let doc = parse_document("c.thrift", src).unwrap();
        assert_eq!(doc.constants.len(), 2);
        assert_eq!(doc.constants[1].value, ConstValue::Double(2.5));
    }

    #[test]
    fn test_parse_rejects_union() {
        let err = parse_document("u.thrift", "union U { 1: i32 a }").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unsupported { ref construct, .. } if construct == "union"
        ));
    }

    #[test]
    fn test_parse_rejects_duplicate_definition() {
        let err = parse_document("d.thrift", "struct A {} exception A {}").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_parse_reports_position() {
        let err = parse_document("bad.thrift", "service Echo {\n  string ping(1: string a\n}")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad.thrift:3:1: expected identifier, found '}'"
        );
    }

    #[test]
    fn test_parse_file_follows_includes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("shared.thrift"),
            "include \"echo.thrift\"\nservice Base { void health() }",
        )
        .unwrap();
        std::fs::write(dir.path().join("echo.thrift"), ECHO_IDL).unwrap();

        let model = parse_file(&dir.path().join("echo.thrift")).expect("Failed to parse");
        assert_eq!(model.documents.len(), 2);
        assert_eq!(model.root_document().map(|d| d.services.len()), Some(1));
        assert!(
            model
                .document(&normalize(&dir.path().join("shared.thrift")))
                .is_some_and(|d| d.service("Base").is_some())
        );
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file(Path::new("/nonexistent/none.thrift")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c.thrift")), PathBuf::from("a/c.thrift"));
        assert_eq!(normalize(Path::new("../x.thrift")), PathBuf::from("../x.thrift"));
    }

    #[test]
    fn test_parse_enum_overflow() {
        let err = parse_document("e.thrift", "enum E {\n  A = 9223372036854775807,\n  B\n}")
            .unwrap_err();
        assert_eq!(err.to_string(), "e.thrift:3:3: enum value out of range");
    }

    #[test]
    fn test_parse_enum_max_value_without_successor() {
        let doc = parse_document("e.thrift", "enum E { A = 9223372036854775807 }").unwrap();
        assert_eq!(doc.enums[0].values, vec![("A".to_string(), i64::MAX)]);
    }

    #[test]
    fn test_parse_field_id_out_of_range() {
        let err = parse_document("s.thrift", "struct S { 40000: i32 a }").unwrap_err();
        assert_eq!(err.to_string(), "s.thrift:1:12: field id out of range");
    }

    #[test]
    fn test_parse_unterminated_comment() {
        let err = parse_document("t.thrift", "service Echo {}\n/* never closed").unwrap_err();
        assert!(err.to_string().contains("unterminated block comment"));
        assert!(err.to_string().starts_with("t.thrift:2:"));
    }

    #[test]
    fn test_parse_unexpected_character() {
        let err = parse_document("t.thrift", "service @").unwrap_err();
        assert_eq!(err.to_string(), "t.thrift:1:9: expected identifier, found '@'");
    }

    #[test]
    fn test_parse_unknown_definition() {
        let err = parse_document("t.thrift", "\n  servce Echo {}").unwrap_err();
        assert_eq!(err.to_string(), "t.thrift:2:3: expected definition, found 'servce'");
    }

    #[test]
    fn test_parse_comments_and_namespaces() {
        let src = "# hash\n// line\n/* block */ namespace * all\nnamespace py.twisted tw;";
        let doc = parse_document("n.thrift", src).unwrap();
        assert_eq!(doc.namespaces.get("*").map(String::as_str), Some("all"));
        assert_eq!(doc.namespaces.get("py.twisted").map(String::as_str), Some("tw"));
    }
}
