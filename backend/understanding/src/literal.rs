//! Safe parser for the list literals vision models write.
//!
//! Accepts Python-style and JSON-style literals only: lists, tuples, quoted
//! strings, numbers, and the `None`/`True`/`False`/`null`/`true`/`false`
//! keywords. Nothing is evaluated; any other construct is a syntax error.

use serde_json::{Number, Value};
use thiserror::Error;

/// Nesting deeper than this is rejected instead of recursing further.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Parse one literal at the start of `input` (leading whitespace allowed).
///
/// Returns the value and the number of bytes consumed; trailing text is left
/// for the caller.
pub fn parse_literal_prefix(input: &str) -> Result<(Value, usize), LiteralError> {
    let mut parser = Parser { src: input, pos: 0 };
    let value = parser.value(0)?;
    Ok((value, parser.pos))
}

/// Parse a list literal at the start of `input`; anything else is an error.
pub fn parse_list_prefix(input: &str) -> Result<(Vec<Value>, usize), LiteralError> {
    let mut parser = Parser { src: input, pos: 0 };
    parser.skip_ws();
    if parser.bump() != Some('[') {
        return parser.error("expected '['");
    }
    let items = parser.sequence(']', 0)?;
    Ok((items, parser.pos))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error<T>(&self, message: impl Into<String>) -> Result<T, LiteralError> {
        Err(LiteralError {
            offset: self.pos,
            message: message.into(),
        })
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_DEPTH {
            return self.error("nesting too deep");
        }
        self.skip_ws();
        match self.peek() {
            Some('[') => {
                self.bump();
                Ok(Value::Array(self.sequence(']', depth)?))
            }
            Some('(') => {
                self.bump();
                self.parenthesized(depth)
            }
            Some(q @ ('"' | '\'')) => {
                self.bump();
                Ok(Value::String(self.string(q)?))
            }
            Some(c) if matches!(c, '-' | '+' | '.') || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(c) => self.error(format!("unexpected character {c:?}")),
            None => self.error("unexpected end of input"),
        }
    }

    /// Comma-separated values up to `close`, trailing comma allowed.
    fn sequence(&mut self, close: char, depth: usize) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(items),
                Some(c) => return self.error(format!("expected ',' or {close:?}, found {c:?}")),
                None => return self.error(format!("unterminated sequence, expected {close:?}")),
            }
        }
    }

    /// `(a, b)` is a tuple, `(a,)` a one-tuple, `(a)` just `a`.
    fn parenthesized(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.skip_ws();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.value(depth + 1)?;
        self.skip_ws();
        match self.bump() {
            Some(')') => Ok(first),
            Some(',') => {
                let mut items = vec![first];
                items.extend(self.sequence(')', depth)?);
                Ok(Value::Array(items))
            }
            Some(c) => self.error(format!("expected ',' or ')', found {c:?}")),
            None => self.error("unterminated tuple"),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return self.error("unterminated string"),
                Some('\n') => return self.error("line break inside string"),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        match self.bump() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\u{7}'),
            Some('v') => out.push('\u{b}'),
            Some(c @ ('\\' | '\'' | '"' | '/')) => out.push(c),
            Some('\n') => {}
            Some('u') => out.push(self.hex_escape(4, "\\u")?),
            Some('x') => out.push(self.hex_escape(2, "\\x")?),
            // Unknown escapes keep their backslash.
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => return self.error("unterminated escape"),
        }
        Ok(())
    }

    /// Exactly `len` hex digits naming one code point.
    fn hex_escape(&mut self, len: usize, name: &str) -> Result<char, LiteralError> {
        let start = self.pos;
        let hex = self.src.get(start..start + len).unwrap_or_default();
        let code = u32::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.len() == len && hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(char::from_u32);
        match code {
            Some(ch) => {
                self.pos += len;
                Ok(ch)
            }
            None => self.error(format!("invalid {name} escape")),
        }
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let negative = match self.peek() {
            Some(sign @ ('-' | '+')) => {
                self.bump();
                sign == '-'
            }
            _ => false,
        };
        let start = self.pos;
        let int_digits = self.digits();
        let mut is_float = false;
        let mut frac_digits = 0;
        if self.peek() == Some('.') {
            self.bump();
            is_float = true;
            frac_digits = self.digits();
        }
        if int_digits == 0 && frac_digits == 0 {
            return self.error("expected digits");
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            is_float = true;
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.digits() == 0 {
                return self.error("expected exponent digits");
            }
        }
        if matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            return self.error("malformed number");
        }

        let digits = &self.src[start..self.pos];
        let text = if negative { format!("-{digits}") } else { digits.to_string() };
        let number = if is_float {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else {
            text.parse::<i64>().ok().map(Number::from)
        };
        match number {
            Some(n) => Ok(Value::Number(n)),
            // Out-of-range integers keep their digits as text.
            None if !is_float => Ok(Value::String(text)),
            None => self.error("number out of range"),
        }
    }

    fn digits(&mut self) -> usize {
        let mut count = 0;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
            count += 1;
        }
        count
    }

    fn keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "None" | "null" => Ok(Value::Null),
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            other => {
                self.pos = start;
                self.error(format!("unexpected identifier {other:?}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(s: &str) -> Result<Value, LiteralError> {
        parse_literal_prefix(s).map(|(v, _)| v)
    }

    #[test]
    fn parses_nested_string_lists() {
        let v = parse(r#"[["Gross", "64,490 kg"], ['Tare', '21,700 kg'],]"#).unwrap();
        assert_eq!(v, json!([["Gross", "64,490 kg"], ["Tare", "21,700 kg"]]));
    }

    #[test]
    fn reports_consumed_length() {
        let (_, used) = parse_literal_prefix(r#"[["a", "b"]] trailing"#).unwrap();
        assert_eq!(used, 12);
    }

    #[test]
    fn parses_keywords_and_numbers() {
        let v = parse("[None, True, false, null, 42, -1.5, 1e3]").unwrap();
        assert_eq!(v, json!([null, true, false, null, 42, -1.5, 1000.0]));
    }

    #[test]
    fn tuples_become_arrays() {
        assert_eq!(parse("[('a', 'b')]").unwrap(), json!([["a", "b"]]));
        assert_eq!(parse("[('a',)]").unwrap(), json!([["a"]]));
        assert_eq!(parse("[('a')]").unwrap(), json!(["a"]));
    }

    #[test]
    fn string_escapes() {
        let v = parse(r#"["it\'s", "a\"b", "\u00e9", "back\\slash", "C:\d"]"#).unwrap();
        assert_eq!(v, json!(["it's", "a\"b", "é", "back\\slash", "C:\\d"]));
    }

    #[test]
    fn hex_and_bell_escapes() {
        assert!(parse(r#"["\x4"]"#).is_err());
        let v = parse(r#"["\x41\x42", "tab\vend"]"#).unwrap();
        assert_eq!(v, json!(["AB", "tab\u{b}end"]));
    }

    #[test]
    fn signed_and_leading_dot_numbers() {
        let v = parse("[+1, .5, -.25, 5., +2e2]").unwrap();
        assert_eq!(v, json!([1, 0.5, -0.25, 5.0, 200.0]));
        assert!(parse("[.]").is_err());
        assert!(parse("[+]").is_err());
    }

    #[test]
    fn quote_of_other_kind_is_plain_text() {
        assert_eq!(parse(r#"["Louisiana's"]"#).unwrap(), json!(["Louisiana's"]));
    }

    #[test]
    fn rejects_identifiers_and_calls() {
        assert!(parse("[[__import__('os'), 'x']]").is_err());
        assert!(parse("[[open, 'x']]").is_err());
    }

    #[test]
    fn rejects_expressions() {
        assert!(parse("[['a', 1 + 2]]").is_err());
        assert!(parse("[['a' 'b']]").is_err());
    }

    #[test]
    fn rejects_unterminated() {
        assert!(parse(r#"[["a", "b"]"#).is_err());
        assert!(parse(r#"[["a, "b"]]"#).is_err());
    }

    #[test]
    fn list_prefix_requires_list() {
        let (items, used) = parse_list_prefix(" [['a', 1]] rest").unwrap();
        assert_eq!(items, vec![json!(["a", 1])]);
        assert_eq!(used, 11);
        assert!(parse_list_prefix("('a', 1)").is_err());
        assert!(parse_list_prefix("'a'").is_err());
    }

    #[test]
    fn rejects_excessive_nesting() {
        let deep = format!("{}{}", "[".repeat(64), "]".repeat(64));
        let err = parse(&deep).unwrap_err();
        assert!(err.message.contains("nesting"));
    }
}
