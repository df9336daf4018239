//! Path expression tokenizer
//!
//! Turns `customer.children[1].name` or `$.plans[*]['plan name']` into a
//! flat list of [`Segment`]s. Both dialects share the bracket grammar; they
//! differ only in how an expression starts.

use crate::error::{DocfillError, DocfillResult};
use std::iter::Peekable;
use std::str::Chars;

/// One navigation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Map key; on a sequence a numeric key acts as an index
    Field(String),
    /// Sequence index; negative counts from the end
    Index(i64),
    /// Every child of a map or sequence
    Wildcard,
}

pub(crate) struct Tokenizer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            position: 0,
        }
    }

    /// Dotted dialect: `a.b[0].c`, `a.0.c`, `items.*.name`, `` (root)
    pub(crate) fn dotted(mut self) -> DocfillResult<Vec<Segment>> {
        let mut segments = Vec::new();

        match self.peek() {
            None => return Ok(segments),
            Some('$') => return Err(self.error("'$' expressions belong to the jsonPath dialect")),
            Some('.') => {
                // A lone "." selects the root
                self.advance();
                if self.peek().is_none() {
                    return Ok(segments);
                }
                return Err(self.error("expected a field name"));
            }
            Some('[') => {}
            Some(_) => segments.push(self.read_name()?),
        }

        self.read_tail(&mut segments)?;
        Ok(segments)
    }

    /// JSONPath dialect: `$`, `$.a.b[0]`, `$['a b'].c`, `$.items[*].name`
    pub(crate) fn json_path(mut self) -> DocfillResult<Vec<Segment>> {
        if self.peek() != Some('$') {
            return Err(self.error("jsonPath expressions must start with '$'"));
        }
        self.advance();

        let mut segments = Vec::new();
        self.read_tail(&mut segments)?;
        Ok(segments)
    }

    fn read_tail(&mut self, segments: &mut Vec<Segment>) -> DocfillResult<()> {
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.advance();
                    if self.peek() == Some('.') {
                        return Err(self.error("recursive descent '..' is not supported"));
                    }
                    segments.push(self.read_name()?);
                }
                '[' => {
                    self.advance();
                    segments.push(self.read_bracket()?);
                }
                _ => return Err(self.error(format!("unexpected character '{}'", c))),
            }
        }
        Ok(())
    }

    fn read_name(&mut self) -> DocfillResult<Segment> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' || c == ']' {
                break;
            }
            name.push(c);
            self.advance();
        }

        let name = name.trim();
        match name {
            "" => Err(self.error("expected a field name")),
            "*" => Ok(Segment::Wildcard),
            _ => Ok(Segment::Field(name.to_string())),
        }
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed
    fn read_bracket(&mut self) -> DocfillResult<Segment> {
        self.skip_whitespace();

        let segment = match self.peek() {
            Some('*') => {
                self.advance();
                Segment::Wildcard
            }
            Some(quote @ ('\'' | '"')) => {
                self.advance();
                let mut key = String::new();
                loop {
                    match self.advance() {
                        Some(c) if c == quote => break,
                        Some('\\') => match self.advance() {
                            Some(escaped) => key.push(escaped),
                            None => return Err(self.error("unterminated quoted key")),
                        },
                        Some(c) => key.push(c),
                        None => return Err(self.error("unterminated quoted key")),
                    }
                }
                Segment::Field(key)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(c) = self.peek() {
                    if c == '-' || c.is_ascii_digit() {
                        digits.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                let index = digits
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("invalid index '{}'", digits)))?;
                Segment::Index(index)
            }
            _ => return Err(self.error("expected index, '*' or quoted key inside brackets")),
        };

        self.skip_whitespace();
        match self.advance() {
            Some(']') => Ok(segment),
            _ => Err(self.error("expected ']'")),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn error(&self, reason: impl Into<String>) -> DocfillError {
        DocfillError::PathSyntax {
            expression: self.source.to_string(),
            reason: format!("{} (at position {})", reason.into(), self.position),
        }
    }
}
