//! Lexical combinators for Thrift IDL, built on winnow.
//!
//! Every lexeme parser skips leading whitespace and comments, so the grammar
//! in [`crate::parser`] composes them directly. Errors carry a winnow
//! [`StrContext`]: `Expected` for "expected X, found Y" messages and `Label`
//! for messages that stand on their own.

use winnow::combinator::{alt, cut_err, fail, opt, repeat};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::token::{literal, one_of, take_till, take_until, take_while};
use winnow::{ModalResult, Parser};

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer literal (decimal or `0x` hex).
    Int(i64),
    /// Floating point literal.
    Double(f64),
}

/// Skips whitespace, `//` and `#` line comments and `/* */` block comments.
pub fn ws(input: &mut &str) -> ModalResult<()> {
    repeat::<_, _, (), _, _>(0.., alt((whitespace, line_comment, block_comment)))
        .parse_next(input)?;
    Ok(())
}

fn whitespace(input: &mut &str) -> ModalResult<()> {
    take_while(1.., char::is_whitespace)
        .map(|_| ())
        .parse_next(input)
}

fn line_comment(input: &mut &str) -> ModalResult<()> {
    alt((literal("//"), literal("#"))).parse_next(input)?;
    take_till(0.., |c: char| c == '\n').parse_next(input)?;
    opt(literal("\n")).parse_next(input)?;
    Ok(())
}

fn block_comment(input: &mut &str) -> ModalResult<()> {
    literal("/*").parse_next(input)?;
    cut_err(take_until(0.., "*/"))
        .context(StrContext::Label("unterminated block comment"))
        .parse_next(input)?;
    literal("*/").parse_next(input)?;
    Ok(())
}

/// Parses an identifier. Dotted names (`shared.Item`) are one identifier.
pub fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    ws(input)?;
    let original = *input;
    take_while(1.., is_ident_start).parse_next(input)?;
    take_while(0.., is_ident_continue).parse_next(input)?;
    let consumed = original.len() - input.len();
    Ok(&original[..consumed])
}

/// Parses the exact keyword `kw`, backtracking on any other identifier.
pub fn keyword(input: &mut &str, kw: &str) -> ModalResult<()> {
    let checkpoint = *input;
    let ident = identifier(input)?;
    if ident == kw {
        Ok(())
    } else {
        *input = checkpoint;
        Err(backtrack_err())
    }
}

/// Parses a single punctuation character.
pub fn symbol(input: &mut &str, c: char) -> ModalResult<()> {
    ws(input)?;
    literal(c).parse_next(input)?;
    Ok(())
}

/// Parses a single- or double-quoted string literal and unescapes it.
pub fn string_literal(input: &mut &str) -> ModalResult<String> {
    ws(input)?;
    let quote = alt(('"', '\'')).parse_next(input)?;
    let text: &str = *input;
    let mut value = String::new();
    let mut chars = text.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            c if c == quote => {
                *input = &text[idx + c.len_utf8()..];
                return Ok(value);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, other)) => value.push(other),
                None => break,
            },
            c => value.push(c),
        }
    }
    reject(input, "unterminated string literal")
}

/// Parses an integer (decimal or `0x` hex) or floating point literal.
pub fn number(input: &mut &str) -> ModalResult<Number> {
    ws(input)?;
    let start = *input;
    let sign = opt(alt(('-', '+'))).parse_next(input)?;

    if opt(alt((literal("0x"), literal("0X"))))
        .parse_next(input)?
        .is_some()
    {
        let digits = take_while(1.., |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
        return match i64::from_str_radix(digits, 16) {
            Ok(value) => Ok(Number::Int(if sign == Some('-') { -value } else { value })),
            Err(_) => {
                *input = start;
                reject(input, "integer literal out of range")
            }
        };
    }

    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let fraction = opt(('.', take_while(0.., |c: char| c.is_ascii_digit()))).parse_next(input)?;
    let exponent = opt((
        one_of(['e', 'E']),
        opt(one_of(['+', '-'])),
        take_while(1.., |c: char| c.is_ascii_digit()),
    ))
    .parse_next(input)?;
    let text = &start[..start.len() - input.len()];

    if fraction.is_some() || exponent.is_some() {
        match text.parse() {
            Ok(value) => Ok(Number::Double(value)),
            Err(_) => {
                *input = start;
                reject(input, "invalid floating point literal")
            }
        }
    } else {
        match text.parse() {
            Ok(value) => Ok(Number::Int(value)),
            Err(_) => {
                *input = start;
                reject(input, "integer literal out of range")
            }
        }
    }
}

/// Fails without consuming, with `message` as the whole error text.
pub fn reject<T>(input: &mut &str, message: &'static str) -> ModalResult<T> {
    cut_err(fail)
        .context(StrContext::Label(message))
        .parse_next(input)
}

/// Context for an "expected X, found Y" error.
pub fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

/// Describes the lexeme at the start of `rest` for error messages.
#[must_use]
pub fn describe(rest: &str) -> String {
    if rest.is_empty() {
        return "end of file".to_string();
    }
    let mut lookahead = rest;
    if let Ok(ident) = identifier(&mut lookahead) {
        return format!("'{}'", ident);
    }
    let mut lookahead = rest;
    if let Ok(s) = string_literal(&mut lookahead) {
        return format!("\"{}\"", s);
    }
    let mut lookahead = rest;
    match number(&mut lookahead) {
        Ok(Number::Int(value)) => format!("'{}'", value),
        Ok(Number::Double(value)) => format!("'{}'", value),
        Err(_) => rest
            .chars()
            .next()
            .map_or_else(|| "end of file".to_string(), |c| format!("'{}'", c)),
    }
}

/// Returns the 1-based line and column of `rest` within `source`.
///
/// `rest` must be a suffix of `source`, as every parser state is.
#[must_use]
pub fn position(source: &str, rest: &str) -> (usize, usize) {
    let offset = source.len().saturating_sub(rest.len());
    let consumed = source.get(..offset).unwrap_or(source);
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    (line, column)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '.' || c.is_ascii_alphanumeric()
}

fn backtrack_err() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}
