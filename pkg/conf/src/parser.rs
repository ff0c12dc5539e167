use std::collections::HashSet;

use bumpalo::Bump;

use crate::errors::*;
use crate::value::{Member, ShortString, Value, MAX_SHORT_STRING};

/// Parses one JSON value surrounded only by whitespace. Only the integer
/// subset of JSON numbers is accepted; fractions and exponents are errors.
pub fn parse<'a>(arena: &'a Bump, input: &[u8]) -> Result<Value<'a>> {
    let mut parser = Parser {
        arena,
        input,
        pos: 0,
    };

    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();

    if parser.pos != input.len() {
        return Err(err_msg("trailing bytes after value"));
    }

    Ok(value)
}

struct Parser<'a, 'b> {
    arena: &'a Bump,
    input: &'b [u8],
    pos: usize,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn take(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_whitespace(&mut self) {
        while matches!(
            self.peek(),
            Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')
        ) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<Value<'a>> {
        match self.peek() {
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => self.parse_string(),
            Some(b't') => self.parse_literal(b"true", Value::Bool(true)),
            Some(b'f') => self.parse_literal(b"false", Value::Bool(false)),
            Some(b'n') => self.parse_literal(b"null", Value::Null),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            _ => Err(err_msg("unexpected byte at start of value")),
        }
    }

    fn parse_literal(&mut self, literal: &'static [u8], value: Value<'a>) -> Result<Value<'a>> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(value)
        } else {
            Err(err_msg("invalid literal"))
        }
    }

    fn parse_object(&mut self) -> Result<Value<'a>> {
        self.pos += 1; // '{'

        let mut members = bumpalo::collections::Vec::new_in(self.arena);
        let mut seen: HashSet<String> = HashSet::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(members.into_bump_slice()));
        }

        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return Err(err_msg("expected object key"));
            }

            let name = self.parse_string()?;
            let key = match &name {
                Value::Short(s) => s.as_str(),
                Value::String(s) => s,
                _ => unreachable!(),
            };
            if !seen.insert(key.to_string()) {
                return Err(format_err!("duplicate object key {:?}", key));
            }

            self.skip_whitespace();
            if self.take() != Some(b':') {
                return Err(err_msg("expected ':' after object key"));
            }

            self.skip_whitespace();
            let value = self.parse_value()?;
            members.push(Member::new(name, value));

            self.skip_whitespace();
            match self.take() {
                Some(b',') => {}
                Some(b'}') => break,
                _ => return Err(err_msg("expected ',' or '}' in object")),
            }
        }

        Ok(Value::Object(members.into_bump_slice()))
    }

    fn parse_array(&mut self) -> Result<Value<'a>> {
        self.pos += 1; // '['

        let mut elements = bumpalo::collections::Vec::new_in(self.arena);

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(elements.into_bump_slice()));
        }

        loop {
            self.skip_whitespace();
            elements.push(self.parse_value()?);

            self.skip_whitespace();
            match self.take() {
                Some(b',') => {}
                Some(b']') => break,
                _ => return Err(err_msg("expected ',' or ']' in array")),
            }
        }

        Ok(Value::Array(elements.into_bump_slice()))
    }

    /// Two passes: first scan to the closing quote counting the bytes that
    /// escapes will save, then decode into an allocation of exactly the
    /// estimated size (or into the inline short form when it fits).
    fn parse_string(&mut self) -> Result<Value<'a>> {
        self.pos += 1; // '"'
        let start = self.pos;

        let mut i = start;
        let mut surplus = 0usize;
        loop {
            let b = *self
                .input
                .get(i)
                .ok_or_else(|| err_msg("unterminated string"))?;
            match b {
                b'"' => break,
                b'\\' => {
                    let escape = *self
                        .input
                        .get(i + 1)
                        .ok_or_else(|| err_msg("unterminated string"))?;
                    if escape == b'u' {
                        if i + 6 > self.input.len() {
                            return Err(err_msg("unterminated string"));
                        }
                        // 6 bytes of escape produce at most 3 bytes of UTF-8.
                        surplus += 3;
                        i += 6;
                    } else {
                        surplus += 1;
                        i += 2;
                    }
                }
                _ if b < 0x20 => return Err(err_msg("control byte in string")),
                _ => i += 1,
            }
        }

        let raw = &self.input[start..i];
        self.pos = i + 1;

        let size = raw.len() - surplus;
        if size <= MAX_SHORT_STRING {
            let mut buf = [0u8; MAX_SHORT_STRING];
            let n = decode_string(raw, &mut buf)?;
            let short = ShortString::from_bytes(&buf[..n])
                .ok_or_else(|| err_msg("invalid UTF-8 in string"))?;
            Ok(Value::Short(short))
        } else {
            let dest = self.arena.alloc_slice_fill_copy(size, 0u8);
            let n = decode_string(raw, dest)?;
            let s = std::str::from_utf8(&dest[..n])
                .map_err(|_| err_msg("invalid UTF-8 in string"))?;
            Ok(Value::String(s))
        }
    }

    fn parse_number(&mut self) -> Result<Value<'a>> {
        let negative = if self.peek() == Some(b'-') {
            self.pos += 1;
            true
        } else {
            false
        };

        // One past i64::MAX is representable when negated.
        let limit: u64 = (i64::MAX as u64) + if negative { 1 } else { 0 };
        let cutoff = limit / 10;
        let cutlim = limit % 10;

        if self.peek() == Some(b'0') {
            if let Some(b'0'..=b'9') = self.input.get(self.pos + 1).copied() {
                return Err(err_msg("leading zero in number"));
            }
        }

        let mut value = 0u64;
        let mut digits = 0usize;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            let digit = (b - b'0') as u64;
            if value > cutoff || (value == cutoff && digit > cutlim) {
                return Err(err_msg("integer overflow"));
            }
            value = value * 10 + digit;
            self.pos += 1;
            digits += 1;
        }

        if digits == 0 {
            return Err(err_msg("empty digit run"));
        }

        match self.peek() {
            Some(b'.') | Some(b'e') | Some(b'E') => {
                return Err(err_msg("fractional numbers are not supported"));
            }
            _ => {}
        }

        let n = if negative {
            0i64.wrapping_sub(value as i64)
        } else {
            value as i64
        };
        Ok(Value::Integer(n))
    }
}

fn hex4(raw: &[u8]) -> Result<u16> {
    if raw.len() < 4 {
        return Err(err_msg("truncated unicode escape"));
    }
    let mut v = 0u16;
    for &b in &raw[..4] {
        let digit = (b as char)
            .to_digit(16)
            .ok_or_else(|| err_msg("invalid unicode escape"))?;
        v = (v << 4) | digit as u16;
    }
    Ok(v)
}

/// Decodes the escaped body of a string into 'out', returning the number of
/// bytes written. The first scan pass guarantees 'out' is large enough and
/// that every escape introducer has bytes after it.
fn decode_string(raw: &[u8], out: &mut [u8]) -> Result<usize> {
    let mut i = 0;
    let mut n = 0;

    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' {
            out[n] = b;
            n += 1;
            i += 1;
            continue;
        }

        let escape = raw[i + 1];
        i += 2;

        match escape {
            b'"' | b'\\' | b'/' => {
                out[n] = escape;
                n += 1;
            }
            b'n' => {
                out[n] = b'\n';
                n += 1;
            }
            b'r' => {
                out[n] = b'\r';
                n += 1;
            }
            b't' => {
                out[n] = b'\t';
                n += 1;
            }
            b'b' => {
                out[n] = 0x08;
                n += 1;
            }
            b'f' => {
                out[n] = 0x0C;
                n += 1;
            }
            b'u' => {
                let hi = hex4(&raw[i..])?;
                i += 4;

                let code = if (0xD800..=0xDBFF).contains(&hi) {
                    if raw.len() - i >= 6 && raw[i] == b'\\' && raw[i + 1] == b'u' {
                        let lo = hex4(&raw[i + 2..])?;
                        if !(0xDC00..=0xDFFF).contains(&lo) {
                            return Err(err_msg("invalid low surrogate"));
                        }
                        i += 6;
                        (((hi - 0xD800) as u32) << 10) + ((lo - 0xDC00) as u32) + 0x10000
                    } else {
                        return Err(err_msg("unpaired high surrogate"));
                    }
                } else if (0xDC00..=0xDFFF).contains(&hi) {
                    return Err(err_msg("orphan low surrogate"));
                } else {
                    hi as u32
                };

                let ch = char::from_u32(code).ok_or_else(|| err_msg("invalid unicode escape"))?;
                n += ch.encode_utf8(&mut out[n..]).len();
            }
            _ => return Err(err_msg("invalid escape")),
        }
    }

    Ok(n)
}
