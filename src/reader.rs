//! A forward-only JSON cursor with non-destructive lookahead.
//!
//! `JsonReader` borrows an in-memory document and walks it value by value.
//! Cloning a reader is cheap (a slice and a few counters), which is what makes
//! lookahead possible: a clone can scan ahead over the next value while the
//! original stays put. `peek_raw_value` is built on exactly that.
//!
//! The scanner here is structural only. It tracks nesting, strings, and
//! literal boundaries so it can find where a value ends; full grammar checks
//! (number syntax, comma placement inside skipped values) are left to
//! `serde_json`, which parses every span this reader hands out.

use crate::error::DecodeError;
use std::fmt;

/// Nesting limit used when no options say otherwise. Matches `serde_json`.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Kind of the next JSON value, as seen from its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Object => "object",
            TokenKind::Array => "array",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::EndOfInput => "end of input",
        };
        f.write_str(name)
    }
}

/// Per-object iteration state handed out by [`JsonReader::begin_object`].
#[derive(Debug)]
pub struct ObjectScan {
    first: bool,
}

#[derive(Debug, Clone)]
pub struct JsonReader<'a> {
    input: &'a str,
    pos: usize,
    max_depth: usize,
    /// Objects entered through `begin_object` and not yet closed.
    open_objects: usize,
    last_key: Option<String>,
}

impl<'a> JsonReader<'a> {
    pub fn new(input: &'a str) -> Self {
        JsonReader {
            input,
            pos: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            open_objects: 0,
            last_key: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Byte offset of the cursor.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Classify the next value without consuming it.
    pub fn peek_kind(&mut self) -> Result<TokenKind, DecodeError> {
        self.skip_whitespace();
        let kind = match self.current() {
            None => TokenKind::EndOfInput,
            Some(b'{') => TokenKind::Object,
            Some(b'[') => TokenKind::Array,
            Some(b'"') => TokenKind::String,
            Some(b'-' | b'0'..=b'9') => TokenKind::Number,
            Some(b't' | b'f') => TokenKind::Boolean,
            Some(b'n') => TokenKind::Null,
            Some(_) => return Err(self.unexpected_char("a value")),
        };
        Ok(kind)
    }

    /// Raw text of the next value, leaving this cursor where it is.
    pub fn peek_raw_value(&self) -> Result<&'a str, DecodeError> {
        let mut probe = self.clone();
        probe.read_raw_value()
    }

    /// Consume the next value and return its raw text.
    pub fn read_raw_value(&mut self) -> Result<&'a str, DecodeError> {
        let input = self.input;
        let (start, end) = self.skip_value()?;
        Ok(&input[start..end])
    }

    /// Consume the next value, however deeply nested, returning its byte span.
    pub fn skip_value(&mut self) -> Result<(usize, usize), DecodeError> {
        self.skip_whitespace();
        let start = self.pos;
        // Closing bytes still owed, innermost last.
        let mut closers: Vec<u8> = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(byte) = self.current() else {
                return Err(self.end_of_input(&closers));
            };

            match byte {
                b'{' | b'[' => {
                    if closers.len() + self.open_objects >= self.max_depth {
                        return Err(DecodeError::DepthLimitExceeded {
                            limit: self.max_depth,
                        });
                    }
                    closers.push(if byte == b'{' { b'}' } else { b']' });
                    self.pos += 1;
                }
                b'}' | b']' => {
                    if closers.last() != Some(&byte) {
                        return Err(self.unexpected_char("a value"));
                    }
                    closers.pop();
                    self.pos += 1;
                }
                b',' | b':' if !closers.is_empty() => self.pos += 1,
                b'"' => {
                    if !self.scan_string() {
                        return Err(self.end_of_input(&closers));
                    }
                }
                b'-' | b'0'..=b'9' => self.scan_number(),
                b't' | b'f' | b'n' => self.scan_literal()?,
                _ => return Err(self.unexpected_char("a value")),
            }

            if closers.is_empty() {
                return Ok((start, self.pos));
            }
        }
    }

    /// Consume a `null` literal.
    pub fn read_null(&mut self) -> Result<(), DecodeError> {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with("null") {
            self.pos += 4;
            Ok(())
        } else {
            Err(self.unexpected_char("null"))
        }
    }

    /// Consume an object's opening brace.
    pub fn begin_object(&mut self) -> Result<ObjectScan, DecodeError> {
        match self.peek_kind()? {
            TokenKind::Object => {
                self.pos += 1;
                self.open_objects += 1;
                Ok(ObjectScan { first: true })
            }
            found => Err(DecodeError::ExpectedObject {
                found,
                offset: self.pos,
            }),
        }
    }

    /// Advance to the next key of the object being scanned.
    ///
    /// Returns `None` once the closing brace has been consumed. On `Some`, the
    /// cursor sits on the key's value.
    pub fn next_key(&mut self, scan: &mut ObjectScan) -> Result<Option<String>, DecodeError> {
        self.skip_whitespace();
        match self.current() {
            None => return Err(self.truncated()),
            Some(b'}') => {
                self.pos += 1;
                self.open_objects = self.open_objects.saturating_sub(1);
                return Ok(None);
            }
            Some(b',') if !scan.first => {
                self.pos += 1;
                self.skip_whitespace();
            }
            Some(_) if !scan.first => return Err(self.unexpected_char("',' or '}'")),
            Some(_) => {}
        }
        scan.first = false;

        match self.current() {
            None => return Err(self.truncated()),
            Some(b'"') => {}
            Some(_) => return Err(self.unexpected_char("an object key")),
        }
        let start = self.pos;
        if !self.scan_string() {
            return Err(self.truncated());
        }
        let key = unescape(&self.input[start..self.pos], start)?;

        self.skip_whitespace();
        match self.current() {
            None => return Err(self.truncated()),
            Some(b':') => self.pos += 1,
            Some(_) => return Err(self.unexpected_char("':'")),
        }

        self.last_key = Some(key.clone());
        Ok(Some(key))
    }

    /// Require that nothing but whitespace follows.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(DecodeError::TrailingCharacters { offset: self.pos });
        }
        Ok(())
    }

    fn current(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.current() {
            self.pos += 1;
        }
    }

    /// Move past a string starting at the cursor. False if input ran out.
    fn scan_string(&mut self) -> bool {
        let bytes = self.input.as_bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    self.pos = i + 1;
                    return true;
                }
                _ => i += 1,
            }
        }
        self.pos = bytes.len();
        false
    }

    fn scan_number(&mut self) {
        while let Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') = self.current() {
            self.pos += 1;
        }
    }

    fn scan_literal(&mut self) -> Result<(), DecodeError> {
        let start = self.pos;
        while self.current().is_some_and(|b| b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        match &self.input[start..self.pos] {
            "true" | "false" | "null" => Ok(()),
            other => Err(DecodeError::Syntax {
                offset: start,
                message: format!("invalid literal {other:?}"),
            }),
        }
    }

    fn truncated(&self) -> DecodeError {
        DecodeError::TruncatedObject {
            offset: self.pos,
            key: self.last_key.clone(),
        }
    }

    fn end_of_input(&self, closers: &[u8]) -> DecodeError {
        if self.open_objects > 0 || closers.contains(&b'}') {
            self.truncated()
        } else {
            DecodeError::UnexpectedEnd { offset: self.pos }
        }
    }

    fn unexpected_char(&self, expected: &str) -> DecodeError {
        let found = self.input[self.pos..].chars().next();
        match found {
            Some(c) => DecodeError::Syntax {
                offset: self.pos,
                message: format!("expected {expected}, found {c:?}"),
            },
            None => self.end_of_input(&[]),
        }
    }
}

fn unescape(raw: &str, offset: usize) -> Result<String, DecodeError> {
    if !raw.contains('\\') {
        return Ok(raw[1..raw.len() - 1].to_string());
    }
    serde_json::from_str(raw).map_err(|e| DecodeError::Syntax {
        offset,
        message: e.to_string(),
    })
}
