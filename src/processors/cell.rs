//! Typed view of categorical cells.
//!
//! A raw CSV cell goes through three explicit conversions before one-hot
//! expansion:
//!
//! 1. [`CellValue::normalize_scalar`] wraps a bare scalar into a one-element
//!    list (only for columns configured as `prepare`).
//! 2. [`CellValue::parse_list`] turns a scalar holding a list literal such as
//!    `['Central Air', 'Ceiling Fan']` into a list. A scalar that is not a
//!    list literal becomes [`CellValue::Unparseable`].
//! 3. [`CellValue::into_tokens`] yields the category tokens. Only lists have
//!    tokens; `Missing` and `Unparseable` both yield none.

use thiserror::Error;

use crate::core::table::is_missing;

/// One categorical cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Missing,
    Scalar(String),
    List(Vec<String>),
    /// A scalar that was expected to be a list literal but is not one
    Unparseable(String),
}

impl CellValue {
    /// Reads a raw table cell.
    pub fn from_cell(cell: &str) -> Self {
        if is_missing(cell) {
            CellValue::Missing
        } else {
            CellValue::Scalar(cell.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Wraps a scalar into a single-element list. Other values pass through.
    pub fn normalize_scalar(self) -> Self {
        match self {
            CellValue::Scalar(s) => CellValue::List(vec![s]),
            other => other,
        }
    }

    /// Parses a scalar as a list literal. Other values pass through.
    pub fn parse_list(self) -> Self {
        match self {
            CellValue::Scalar(s) => match parse_list_literal(&s) {
                Ok(tokens) => CellValue::List(tokens),
                Err(_) => CellValue::Unparseable(s),
            },
            other => other,
        }
    }

    /// Renders the cell back to table text. Lists use list-literal syntax,
    /// which [`parse_list_literal`] reads back unchanged.
    pub fn to_cell(&self) -> String {
        match self {
            CellValue::Missing => String::new(),
            CellValue::Scalar(s) | CellValue::Unparseable(s) => s.clone(),
            CellValue::List(tokens) => {
                let items: Vec<String> = tokens.iter().map(|t| quote_literal(t)).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }

    /// Category tokens of the cell.
    ///
    /// Anything that is not a list, `Missing` included, has no tokens.
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            CellValue::List(tokens) => tokens,
            CellValue::Missing | CellValue::Scalar(_) | CellValue::Unparseable(_) => Vec::new(),
        }
    }
}

/// Quote a token as a string literal, preferring single quotes.
fn quote_literal(token: &str) -> String {
    let quote = if token.contains('\'') && !token.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(token.len() + 2);
    out.push(quote);
    for c in token.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Reasons a string is not a flat list literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("expected '[' at offset {0}")]
    NotAList(usize),

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("trailing input at offset {0}")]
    TrailingInput(usize),
}

struct LiteralParser<'a> {
    chars: Vec<(usize, char)>,
    pos: usize,
    src: &'a str,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().collect(),
            pos: 0,
            src,
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.src.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(found) => Err(LiteralError::Unexpected {
                found,
                offset: self.offset() - found.len_utf8(),
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<String>, LiteralError> {
        self.skip_whitespace();
        if self.peek() != Some('[') {
            return Err(LiteralError::NotAList(self.offset()));
        }
        self.expect('[')?;

        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.pos += 1;
                break;
            }

            items.push(self.parse_item()?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(found) => {
                    return Err(LiteralError::Unexpected {
                        found,
                        offset: self.offset() - found.len_utf8(),
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }

        self.skip_whitespace();
        if self.peek().is_some() {
            return Err(LiteralError::TrailingInput(self.offset()));
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some('\'') | Some('"') => {
                // Adjacent literals concatenate: 'a' "b" == 'ab'
                let mut value = self.parse_string()?;
                loop {
                    self.skip_whitespace();
                    match self.peek() {
                        Some('\'') | Some('"') => value.push_str(&self.parse_string()?),
                        _ => break,
                    }
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                self.parse_number()
            }
            Some(c) if c.is_ascii_alphabetic() => self.parse_constant(),
            Some(found) => Err(LiteralError::Unexpected {
                found,
                offset: self.offset(),
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let start = self.offset();
        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let mut value = String::new();

        loop {
            match self.bump() {
                None => return Err(LiteralError::UnterminatedString(start)),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    None => return Err(LiteralError::UnterminatedString(start)),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some('\n') => {}
                    // Unknown escapes keep the backslash
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some('\n') => return Err(LiteralError::UnterminatedString(start)),
                Some(c) => value.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();

        let cleaned = text.replace('_', "");
        if cleaned.parse::<i64>().is_ok() || cleaned.parse::<f64>().is_ok() {
            Ok(text)
        } else {
            Err(LiteralError::Unexpected {
                found: text.chars().next().unwrap_or('?'),
                offset: self.chars[start].0,
            })
        }
    }

    fn parse_constant(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();

        match word.as_str() {
            "True" | "False" | "None" => Ok(word),
            _ => Err(LiteralError::Unexpected {
                found: word.chars().next().unwrap_or('?'),
                offset: self.chars[start].0,
            }),
        }
    }
}

/// Parse a flat list literal into its items as text.
///
/// Accepts single or double quoted strings (with backslash escapes), numbers,
/// `True`, `False` and `None`, separated by commas, with an optional
/// trailing comma. Nested containers, tuples and bare words are rejected.
pub fn parse_list_literal(src: &str) -> Result<Vec<String>, LiteralError> {
    LiteralParser::new(src).parse_list()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> CellValue {
        CellValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_parse_simple_list() {
        assert_eq!(
            parse_list_literal("['Central Air', \"Ceiling Fan(s)\"]").unwrap(),
            vec!["Central Air", "Ceiling Fan(s)"]
        );
        assert_eq!(parse_list_literal("[]").unwrap(), Vec::<String>::new());
        assert_eq!(parse_list_literal("  [ 'a' , ]  ").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_parse_escapes_and_constants() {
        assert_eq!(
            parse_list_literal(r"['it\'s', 'a\\b', 'x\qy']").unwrap(),
            vec!["it's", "a\\b", "x\\qy"]
        );
        assert_eq!(
            parse_list_literal("[1, -2.5, True, None]").unwrap(),
            vec!["1", "-2.5", "True", "None"]
        );
        assert_eq!(parse_list_literal("['ab' \"cd\"]").unwrap(), vec!["abcd"]);
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(parse_list_literal("Central Air"), Err(LiteralError::NotAList(0)));
        assert!(parse_list_literal("('a', 'b')").is_err());
        assert!(parse_list_literal("['a', ['b']]").is_err());
        assert!(parse_list_literal("['a'").is_err());
        assert!(parse_list_literal("['a] ").is_err());
        assert!(parse_list_literal("[a]").is_err());
        assert!(parse_list_literal("['a'] x").is_err());
        assert!(parse_list_literal("['a',,]").is_err());
        assert!(parse_list_literal("").is_err());
    }

    #[test]
    fn test_normalize_scalar() {
        assert_eq!(CellValue::Missing.normalize_scalar(), CellValue::Missing);
        assert_eq!(
            CellValue::from_cell("R-1").normalize_scalar(),
            list(&["R-1"])
        );
        assert_eq!(list(&["a"]).normalize_scalar(), list(&["a"]));
    }

    #[test]
    fn test_parse_list_stage() {
        assert_eq!(
            CellValue::from_cell("['a', 'b']").parse_list(),
            list(&["a", "b"])
        );
        assert_eq!(
            CellValue::from_cell("not a list").parse_list(),
            CellValue::Unparseable("not a list".into())
        );
        // Missing is not a string, so it is not turned into an empty list here
        assert_eq!(CellValue::Missing.parse_list(), CellValue::Missing);
        // Prepared scalars are already lists and are not re-parsed
        assert_eq!(
            CellValue::from_cell("['x']").normalize_scalar().parse_list(),
            list(&["['x']"])
        );
    }

    #[test]
    fn test_to_cell_renders_lists() {
        assert_eq!(CellValue::Missing.to_cell(), "");
        assert_eq!(list(&["R-1"]).to_cell(), "['R-1']");
        assert_eq!(list(&["a", "b c"]).to_cell(), "['a', 'b c']");
        assert_eq!(list(&["it's"]).to_cell(), "[\"it's\"]");
        assert_eq!(list(&[]).to_cell(), "[]");

        let tricky = list(&["it's \"quoted\"", "back\\slash", "line\nbreak"]);
        assert_eq!(tricky.to_cell().as_str(), r#"['it\'s "quoted"', 'back\\slash', 'line\nbreak']"#);
        assert_eq!(CellValue::Scalar(tricky.to_cell()).parse_list(), tricky);
    }

    #[test]
    fn test_into_tokens_coercion() {
        assert_eq!(list(&["a", "b"]).into_tokens(), vec!["a", "b"]);
        assert!(CellValue::Missing.into_tokens().is_empty());
        assert!(CellValue::Unparseable("oops".into()).into_tokens().is_empty());
        assert!(CellValue::Scalar("5".into()).into_tokens().is_empty());
    }
}
