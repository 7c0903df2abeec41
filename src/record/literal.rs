//! Text literals stored in metadata fields: integers, tuples `(..)` and lists `[..]`.
//!
//! Examples: `(412, 880)`, `[0, 0, 112, 131, 150, 171, 174, 176, 181]`, `[(1, 2), (3, 4),]`.

use std::fmt;

use crate::foundation::core::Point;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LiteralError {
    pub(crate) offset: usize,
    pub(crate) message: String,
}

impl LiteralError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for LiteralError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    Paren,
    Bracket,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Int(i64),
    Open(Delim),
    Close(Delim),
    Comma,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn lex(input: &str) -> Result<Vec<Token>, LiteralError> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        // Int: -?[0-9]+
        if c.is_ascii_digit() || (c == '-' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit())
        {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i < bytes.len() && matches!(bytes[i] as char, '.' | 'e' | 'E') {
                return Err(LiteralError::new(i, "expected an integer, found a float"));
            }
            let s = &input[start..i];
            let v: i64 = s
                .parse()
                .map_err(|_| LiteralError::new(start, format!("integer '{s}' out of range")))?;
            out.push(Token {
                kind: TokenKind::Int(v),
                offset: start,
            });
            continue;
        }

        let kind = match c {
            '(' => TokenKind::Open(Delim::Paren),
            ')' => TokenKind::Close(Delim::Paren),
            '[' => TokenKind::Open(Delim::Bracket),
            ']' => TokenKind::Close(Delim::Bracket),
            ',' => TokenKind::Comma,
            _ => {
                let ch = input[start..].chars().next().unwrap_or(c);
                return Err(LiteralError::new(
                    start,
                    format!("unexpected character '{ch}'"),
                ));
            }
        };
        i += 1;
        out.push(Token {
            kind,
            offset: start,
        });
    }

    out.push(Token {
        kind: TokenKind::Eof,
        offset: input.len(),
    });
    Ok(out)
}

/// Decoded literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Literal {
    Int(i64),
    Seq(Vec<Literal>),
}

impl Literal {
    /// Interpret as a 2-element sequence of `i32`.
    pub(crate) fn as_point(&self) -> Result<Point, String> {
        let Literal::Seq(items) = self else {
            return Err("expected a point like (x, y), found an integer".to_owned());
        };
        let [x, y] = items.as_slice() else {
            return Err(format!(
                "expected a point with 2 coordinates, found {}",
                items.len()
            ));
        };
        Ok(Point::new(coord(x)?, coord(y)?))
    }

    /// Interpret as a sequence of non-negative integers.
    pub(crate) fn as_frame_list(&self) -> Result<Vec<u64>, String> {
        let Literal::Seq(items) = self else {
            return Err("expected a list of frame indices, found an integer".to_owned());
        };
        items
            .iter()
            .map(|item| match item {
                Literal::Int(v) => u64::try_from(*v)
                    .map_err(|_| format!("frame index {v} must be non-negative")),
                Literal::Seq(_) => Err("expected a frame index, found a sequence".to_owned()),
            })
            .collect()
    }
}

fn coord(lit: &Literal) -> Result<i32, String> {
    match lit {
        Literal::Int(v) => {
            i32::try_from(*v).map_err(|_| format!("coordinate {v} does not fit a pixel index"))
        }
        Literal::Seq(_) => Err("expected an integer coordinate, found a sequence".to_owned()),
    }
}

pub(crate) fn parse_literal(src: &str) -> Result<Literal, LiteralError> {
    let tokens = lex(src.trim())?;
    let mut p = Parser { tokens, pos: 0 };
    let lit = p.parse_value()?;
    p.expect_eof()?;
    Ok(lit)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect_eof(&self) -> Result<(), LiteralError> {
        let t = self.peek();
        if t.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(LiteralError::new(
                t.offset,
                format!("unexpected trailing {:?}", t.kind),
            ))
        }
    }

    fn parse_value(&mut self) -> Result<Literal, LiteralError> {
        let t = self.bump();
        match t.kind {
            TokenKind::Int(v) => Ok(Literal::Int(v)),
            TokenKind::Open(delim) => self.parse_seq(delim),
            TokenKind::Eof => Err(LiteralError::new(t.offset, "empty literal")),
            other => Err(LiteralError::new(
                t.offset,
                format!("expected a value, found {other:?}"),
            )),
        }
    }

    fn parse_seq(&mut self, delim: Delim) -> Result<Literal, LiteralError> {
        let mut items = Vec::new();
        loop {
            if self.peek().kind == TokenKind::Close(delim) {
                self.bump();
                return Ok(Literal::Seq(items));
            }
            items.push(self.parse_value()?);

            let t = self.bump();
            match t.kind {
                TokenKind::Comma => continue,
                TokenKind::Close(d) if d == delim => return Ok(Literal::Seq(items)),
                other => {
                    return Err(LiteralError::new(
                        t.offset,
                        format!("expected ',' or closing {delim:?}, found {other:?}"),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/record/literal.rs"]
mod tests;
