//! Decoding of quoted list tokens.
//!
//! List attributes (disk names, IP pool names) reach the controller as quoted
//! literals such as `"boot-disk"`. Three forms are accepted:
//!
//! - double-quoted, with backslash escapes (`\n`, `\x41`, `\101`, `\u00e9`, ...)
//! - back-quoted raw text, where carriage returns are dropped
//! - single-quoted, holding exactly one character
//!
//! Anything else is rejected with an [`UnquoteError`].

use std::str::Chars;

use thiserror::Error;

/// Why a token could not be unquoted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnquoteError {
    #[error("token is not quoted")]
    NotQuoted,

    #[error("opening and closing quotes differ")]
    Mismatched,

    #[error("unescaped {0:?} inside quoted token")]
    BareQuote(char),

    #[error("newline inside quoted token")]
    Newline,

    #[error("invalid escape sequence {0:?}")]
    InvalidEscape(String),

    #[error("single-quoted token must hold exactly one character")]
    NotSingleChar,

    #[error("token decodes to invalid UTF-8")]
    InvalidUtf8,
}

/// Strip the quotes from `token` and resolve its escapes.
pub fn unquote(token: &str) -> Result<String, UnquoteError> {
    let mut chars = token.chars();
    let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
        return Err(UnquoteError::NotQuoted);
    };
    if !matches!(open, '"' | '\'' | '`') {
        return Err(UnquoteError::NotQuoted);
    }
    if open != close {
        return Err(UnquoteError::Mismatched);
    }

    let inner = chars.as_str();
    if open == '`' {
        if inner.contains('`') {
            return Err(UnquoteError::BareQuote('`'));
        }
        return Ok(inner.chars().filter(|c| *c != '\r').collect());
    }
    unescape(inner, open)
}

fn unescape(inner: &str, quote: char) -> Result<String, UnquoteError> {
    if inner.contains('\n') {
        return Err(UnquoteError::Newline);
    }

    let mut out = Vec::with_capacity(inner.len());
    let mut units = 0usize;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        units += 1;
        match c {
            '\\' => escape(&mut chars, quote, &mut out)?,
            c if c == quote => return Err(UnquoteError::BareQuote(c)),
            c => push_char(&mut out, c),
        }
    }

    if quote == '\'' && units != 1 {
        return Err(UnquoteError::NotSingleChar);
    }
    String::from_utf8(out).map_err(|_| UnquoteError::InvalidUtf8)
}

/// Decode one escape sequence; the leading backslash is already consumed.
fn escape(chars: &mut Chars<'_>, quote: char, out: &mut Vec<u8>) -> Result<(), UnquoteError> {
    let Some(c) = chars.next() else {
        return Err(UnquoteError::InvalidEscape("\\".to_string()));
    };

    match c {
        'a' => out.push(0x07),
        'b' => out.push(0x08),
        'f' => out.push(0x0c),
        'n' => out.push(b'\n'),
        'r' => out.push(b'\r'),
        't' => out.push(b'\t'),
        'v' => out.push(0x0b),
        '\\' => out.push(b'\\'),
        '\'' | '"' if c == quote => out.push(c as u8),
        'x' => {
            let value = digits(chars, c, 2, 16)?;
            out.push(value as u8);
        }
        'u' | 'U' => {
            let width = if c == 'u' { 4 } else { 8 };
            let value = digits(chars, c, width, 16)?;
            let decoded = char::from_u32(value)
                .ok_or_else(|| UnquoteError::InvalidEscape(format!("\\{}{:x}", c, value)))?;
            push_char(out, decoded);
        }
        '0'..='7' => {
            let rest = digits(chars, c, 2, 8)?;
            let value = (c as u32 - '0' as u32) * 64 + rest;
            if value > 0xff {
                return Err(UnquoteError::InvalidEscape(format!("\\{:o}", value)));
            }
            out.push(value as u8);
        }
        other => return Err(UnquoteError::InvalidEscape(format!("\\{}", other))),
    }
    Ok(())
}

/// Read exactly `count` digits in `radix` following escape `lead`.
fn digits(chars: &mut Chars<'_>, lead: char, count: usize, radix: u32) -> Result<u32, UnquoteError> {
    let mut seen = format!("\\{}", lead);
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars
            .next()
            .inspect(|d| seen.push(*d))
            .and_then(|d| d.to_digit(radix))
            .ok_or_else(|| UnquoteError::InvalidEscape(seen.clone()))?;
        value = value * radix + digit;
    }
    Ok(value)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}
