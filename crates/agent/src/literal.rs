//! Restricted Python-literal parser
//!
//! Models write tool payloads as Python dict literals (`{'a': True}`), which
//! are not JSON. This parses the literal subset (dicts, lists, tuples,
//! strings, numbers, `True`/`False`/`None`) into `serde_json::Value`.
//! Tokens are produced on demand so parsing can stop right after the first
//! complete value, leaving whatever text follows untouched.

use serde_json::{Map, Number, Value};
use thiserror::Error;

const MAX_DEPTH: usize = 64;

/// Parse failure with the byte offset where it was detected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub reason: String,
}

impl LiteralError {
    fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LiteralError>;

/// Parse a complete literal; only whitespace may follow it
pub fn parse_literal(input: &str) -> Result<Value> {
    let (value, end) = parse_literal_prefix(input)?;
    let rest = &input[end..];
    if let Some((i, c)) = rest.char_indices().find(|(_, c)| !c.is_whitespace()) {
        return Err(LiteralError::new(
            end + i,
            format!("unexpected trailing `{}`", c),
        ));
    }
    Ok(value)
}

/// Parse one literal at the start of `input`, returning it and the byte
/// offset just past it
pub fn parse_literal_prefix(input: &str) -> Result<(Value, usize)> {
    let mut parser = Parser::new(input);
    let value = parser.value(0)?;
    Ok((value, parser.consumed()))
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Comma,
    Str(String),
    Num(Number),
    True,
    False,
    None,
    Eof,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::LBrace => "`{`".to_string(),
            Tok::RBrace => "`}`".to_string(),
            Tok::LBracket => "`[`".to_string(),
            Tok::RBracket => "`]`".to_string(),
            Tok::LParen => "`(`".to_string(),
            Tok::RParen => "`)`".to_string(),
            Tok::Colon => "`:`".to_string(),
            Tok::Comma => "`,`".to_string(),
            Tok::Str(_) => "string".to_string(),
            Tok::Num(_) => "number".to_string(),
            Tok::True => "`True`".to_string(),
            Tok::False => "`False`".to_string(),
            Tok::None => "`None`".to_string(),
            Tok::Eof => "end of input".to_string(),
        }
    }
}

struct Token {
    tok: Tok,
    start: usize,
    end: usize,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    peeked: Option<Token>,
    /// End offset of the last consumed token
    last_end: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            peeked: None,
            last_end: 0,
        }
    }

    fn consumed(&self) -> usize {
        self.last_end
    }

    fn peek(&mut self) -> Result<&Token> {
        if self.peeked.is_none() {
            let token = self.lex()?;
            self.peeked = Some(token);
        }
        match self.peeked.as_ref() {
            Some(token) => Ok(token),
            None => Err(LiteralError::new(self.pos, "lexer produced no token")),
        }
    }

    fn next(&mut self) -> Result<Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex()?,
        };
        self.last_end = token.end;
        Ok(token)
    }

    fn next_is_string(&self) -> bool {
        match &self.peeked {
            Some(token) => matches!(token.tok, Tok::Str(_)),
            None => matches!(self.rest().trim_start().chars().next(), Some('\'' | '"')),
        }
    }

    fn expect(&mut self, want: Tok) -> Result<()> {
        let token = self.next()?;
        if token.tok == want {
            Ok(())
        } else {
            Err(LiteralError::new(
                token.start,
                format!("expected {}, found {}", want.describe(), token.tok.describe()),
            ))
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(LiteralError::new(self.pos, "nesting too deep"));
        }

        let token = self.next()?;
        match token.tok {
            Tok::LBrace => self.dict(depth),
            Tok::LBracket => self.sequence(Tok::RBracket, depth).map(Value::Array),
            Tok::LParen => self.parenthesized(depth),
            Tok::Str(mut s) => {
                // adjacent literals concatenate: 'a' 'b' == 'ab'
                while self.next_is_string() {
                    if let Tok::Str(more) = self.next()?.tok {
                        s.push_str(&more);
                    }
                }
                Ok(Value::String(s))
            }
            Tok::Num(n) => Ok(Value::Number(n)),
            Tok::True => Ok(Value::Bool(true)),
            Tok::False => Ok(Value::Bool(false)),
            Tok::None => Ok(Value::Null),
            other => Err(LiteralError::new(
                token.start,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }

    fn dict(&mut self, depth: usize) -> Result<Value> {
        let mut map = Map::new();
        loop {
            if self.peek()?.tok == Tok::RBrace {
                self.next()?;
                return Ok(Value::Object(map));
            }

            let key_token = self.next()?;
            let key = match key_token.tok {
                Tok::Str(s) => s,
                Tok::Num(n) => n.to_string(),
                other => {
                    return Err(LiteralError::new(
                        key_token.start,
                        format!("expected a string key, found {}", other.describe()),
                    ))
                }
            };

            let colon = self.peek()?;
            if colon.tok == Tok::Comma || colon.tok == Tok::RBrace {
                return Err(LiteralError::new(colon.start, "set literals are not supported"));
            }
            self.expect(Tok::Colon)?;
            let value = self.value(depth + 1)?;
            map.insert(key, value);

            let sep = self.next()?;
            match sep.tok {
                Tok::Comma => continue,
                Tok::RBrace => return Ok(Value::Object(map)),
                other => {
                    return Err(LiteralError::new(
                        sep.start,
                        format!("expected `,` or `}}`, found {}", other.describe()),
                    ))
                }
            }
        }
    }

    fn sequence(&mut self, close: Tok, depth: usize) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.peek()?.tok == close {
                self.next()?;
                return Ok(items);
            }

            items.push(self.value(depth + 1)?);

            let sep = self.next()?;
            if sep.tok == close {
                return Ok(items);
            }
            if sep.tok != Tok::Comma {
                return Err(LiteralError::new(
                    sep.start,
                    format!(
                        "expected `,` or {}, found {}",
                        close.describe(),
                        sep.tok.describe()
                    ),
                ));
            }
        }
    }

    /// `()` and `(a, b)` are tuples; `(a)` is just `a`
    fn parenthesized(&mut self, depth: usize) -> Result<Value> {
        if self.peek()?.tok == Tok::RParen {
            self.next()?;
            return Ok(Value::Array(Vec::new()));
        }

        let first = self.value(depth + 1)?;
        let sep = self.next()?;
        match sep.tok {
            Tok::RParen => Ok(first),
            Tok::Comma => {
                let mut items = vec![first];
                items.extend(self.sequence(Tok::RParen, depth)?);
                Ok(Value::Array(items))
            }
            other => Err(LiteralError::new(
                sep.start,
                format!("expected `,` or `)`, found {}", other.describe()),
            )),
        }
    }

    // ---------------------------------------------------------------
    // Lexer
    // ---------------------------------------------------------------

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn lex(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(c) = self.rest().chars().next() else {
            return Ok(Token {
                tok: Tok::Eof,
                start,
                end: start,
            });
        };

        let single = match c {
            '{' => Some(Tok::LBrace),
            '}' => Some(Tok::RBrace),
            '[' => Some(Tok::LBracket),
            ']' => Some(Tok::RBracket),
            '(' => Some(Tok::LParen),
            ')' => Some(Tok::RParen),
            ':' => Some(Tok::Colon),
            ',' => Some(Tok::Comma),
            _ => None,
        };
        if let Some(tok) = single {
            self.pos += 1;
            return Ok(Token {
                tok,
                start,
                end: self.pos,
            });
        }

        let tok = match c {
            '\'' | '"' => self.string(c)?,
            '0'..='9' | '-' | '+' | '.' => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.name()?,
            other => {
                return Err(LiteralError::new(
                    start,
                    format!("unexpected character `{}`", other),
                ))
            }
        };
        Ok(Token {
            tok,
            start,
            end: self.pos,
        })
    }

    fn string(&mut self, quote: char) -> Result<Tok> {
        let start = self.pos;
        self.pos += quote.len_utf8();

        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                c if c == quote => {
                    self.pos += i + c.len_utf8();
                    return Ok(Tok::Str(out));
                }
                '\n' => break,
                '\\' => {
                    let Some((j, esc)) = chars.next() else {
                        break;
                    };
                    let at = self.pos + j - 1;
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'a' => out.push('\u{07}'),
                        'b' => out.push('\u{08}'),
                        'f' => out.push('\u{0c}'),
                        'v' => out.push('\u{0b}'),
                        '\\' => out.push('\\'),
                        '\'' => out.push('\''),
                        '"' => out.push('"'),
                        '\n' => {}
                        '0'..='7' => {
                            // up to three octal digits, so at most 0o777
                            let mut code = esc as u32 - '0' as u32;
                            for _ in 0..2 {
                                let mut ahead = chars.clone();
                                match ahead.next() {
                                    Some((_, d @ '0'..='7')) => {
                                        code = code * 8 + (d as u32 - '0' as u32);
                                        chars = ahead;
                                    }
                                    _ => break,
                                }
                            }
                            out.push(char::from_u32(code).ok_or_else(|| {
                                LiteralError::new(at, "invalid octal escape")
                            })?);
                        }
                        'x' | 'u' | 'U' => {
                            let width = match esc {
                                'x' => 2,
                                'u' => 4,
                                _ => 8,
                            };
                            let digits: String =
                                chars.by_ref().take(width).map(|(_, d)| d).collect();
                            let code = Some(&digits)
                                .filter(|d| {
                                    d.len() == width && d.chars().all(|c| c.is_ascii_hexdigit())
                                })
                                .and_then(|d| u32::from_str_radix(d, 16).ok())
                                .and_then(char::from_u32)
                                .ok_or_else(|| {
                                    LiteralError::new(at, format!("invalid \\{} escape", esc))
                                })?;
                            out.push(code);
                        }
                        'N' => {
                            return Err(LiteralError::new(
                                at,
                                "named unicode escapes are not supported",
                            ))
                        }
                        // unrecognized escapes keep their backslash
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                other => out.push(other),
            }
        }

        Err(LiteralError::new(start, "unterminated string"))
    }

    fn number(&mut self) -> Result<Tok> {
        let start = self.pos;
        let rest = self.rest();
        let bytes = rest.as_bytes();

        let mut len = 0;
        if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
            len += 1;
        }
        let mut is_float = false;
        while let Some(&b) = bytes.get(len) {
            match b {
                b'0'..=b'9' | b'_' => len += 1,
                b'.' if !is_float => {
                    is_float = true;
                    len += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    len += 1;
                    if matches!(bytes.get(len), Some(b'-') | Some(b'+')) {
                        len += 1;
                    }
                }
                _ => break,
            }
        }

        let text: String = rest[..len].chars().filter(|c| *c != '_').collect();
        self.pos += len;

        let invalid = || LiteralError::new(start, format!("invalid number `{}`", &rest[..len]));
        if !text.bytes().any(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        if is_float {
            let f: f64 = text.parse().map_err(|_| invalid())?;
            Number::from_f64(f).map(Tok::Num).ok_or_else(invalid)
        } else if let Ok(i) = text.parse::<i64>() {
            Ok(Tok::Num(Number::from(i)))
        } else if let Ok(u) = text.trim_start_matches('+').parse::<u64>() {
            Ok(Tok::Num(Number::from(u)))
        } else {
            Err(invalid())
        }
    }

    fn name(&mut self) -> Result<Tok> {
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let word = &rest[..len];
        self.pos += len;

        match word {
            "True" => Ok(Tok::True),
            "False" => Ok(Tok::False),
            "None" => Ok(Tok::None),
            other => Err(LiteralError::new(start, format!("unexpected name `{}`", other))),
        }
    }
}
