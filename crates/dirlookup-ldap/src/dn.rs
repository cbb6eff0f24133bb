//! Distinguished name parsing
//!
//! Parses DNs as they show up in real directories and in caller input, which
//! is looser than RFC 4514:
//! - `\,` / `\2C` escapes and `"quoted, values"` are honored.
//! - An unescaped `,` (or `;`, or `+` between attribute value assertions) only
//!   separates components when the text after it starts a new
//!   `attribute=` pair. `cn=Washburn, Caleb,ou=users` therefore has the
//!   leading value `Washburn, Caleb`.
//! - `.` is never special.
//!
//! Malformed escapes and quoting are rejected with [`Error::Parse`] instead
//! of being guessed at.

use dirlookup_core::{Error, Result};
use ldap3::dn_escape;
use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

/// One `attribute=value` assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ava {
    pub attribute: String,
    /// Unescaped value
    pub value: String,
}

/// Relative distinguished name; usually a single assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    avas: Vec<Ava>,
}

impl Rdn {
    /// Naming attribute (the first assertion's)
    pub fn attribute(&self) -> &str {
        &self.avas[0].attribute
    }

    /// Naming value (the first assertion's), unescaped
    pub fn value(&self) -> &str {
        &self.avas[0].value
    }

    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(parse_error("empty DN"));
        }

        let rdns = split_unescaped(input, &[',', ';'])?
            .into_iter()
            .map(|raw| {
                let avas = split_unescaped(raw, &['+'])?
                    .into_iter()
                    .map(parse_ava)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Rdn { avas })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rdns })
    }

    /// Leading (most specific) RDN
    pub fn leading(&self) -> &Rdn {
        &self.rdns[0]
    }

    /// Unescaped value of the leading RDN
    pub fn naming_value(&self) -> &str {
        self.leading().value()
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// Case-folded rendering, for comparing DNs that differ only in case or
    /// escaping style
    pub fn normalized(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl FromStr for Dn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ava) in self.avas.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}={}", ava.attribute, dn_escape(ava.value.as_str()))?;
        }
        Ok(())
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", rdn)?;
        }
        Ok(())
    }
}

/// Whether caller input should be treated as a DN or inline entry rather
/// than a login name
pub fn is_dn_like(input: &str) -> bool {
    input.contains('=')
}

/// DN text of a membership reference or caller input.
///
/// Accepts a bare DN, or an inline LDIF-style entry whose `dn:` line names
/// the entry.
pub fn reference_dn(input: &str) -> Result<&str> {
    let input = input.trim();

    for line in input.lines() {
        let line = line.trim();
        let is_dn_line = line
            .get(..3)
            .map(|p| p.eq_ignore_ascii_case("dn:"))
            .unwrap_or(false);
        if is_dn_line {
            let rest = &line[3..];
            if rest.starts_with(':') {
                return Err(parse_error("base64-encoded dn: lines are not supported"));
            }
            return Ok(rest.trim());
        }
    }

    if input.lines().count() > 1 {
        return Err(parse_error("inline entry has no dn: line"));
    }

    Ok(input)
}

fn parse_error(msg: impl Into<String>) -> Error {
    Error::Parse(msg.into())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SplitState {
    Type,
    ValueStart,
    Value,
    Quoted,
}

/// Split on separators that are unescaped, unquoted and followed by the start
/// of another `attribute=` pair. Returned slices are still escaped.
fn split_unescaped<'a>(input: &'a str, separators: &[char]) -> Result<Vec<&'a str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut state = SplitState::Type;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            if state == SplitState::ValueStart {
                state = SplitState::Value;
            }
            continue;
        }

        match (state, c) {
            (_, '\\') => escaped = true,
            (SplitState::Type, '=') => state = SplitState::ValueStart,
            (SplitState::ValueStart, '"') => state = SplitState::Quoted,
            (SplitState::Quoted, '"') => state = SplitState::Value,
            (SplitState::Quoted, _) => {}
            (_, c)
                if separators.contains(&c) && starts_attribute(&input[i + c.len_utf8()..]) =>
            {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
                state = SplitState::Type;
            }
            (SplitState::ValueStart, c) if !c.is_whitespace() => state = SplitState::Value,
            _ => {}
        }
    }

    if escaped {
        return Err(parse_error(format!("dangling escape at end of '{}'", input)));
    }
    if state == SplitState::Quoted {
        return Err(parse_error(format!("unterminated quoted value in '{}'", input)));
    }

    parts.push(&input[start..]);
    Ok(parts)
}

fn starts_attribute(rest: &str) -> bool {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '.'))
        .unwrap_or(rest.len());
    let (attribute, after) = rest.split_at(end);
    is_attribute_type(attribute) && after.trim_start().starts_with('=')
}

/// Descriptor (`cn`, `x-custom`) or numeric OID (`2.5.4.3`)
fn is_attribute_type(attribute: &str) -> bool {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric() || c == '-'),
        Some(c) if c.is_ascii_digit() => attribute
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())),
        _ => false,
    }
}

fn parse_ava(raw: &str) -> Result<Ava> {
    let eq = raw
        .find('=')
        .ok_or_else(|| parse_error(format!("missing '=' in DN component '{}'", raw.trim())))?;

    let attribute = raw[..eq].trim();
    if !is_attribute_type(attribute) {
        return Err(parse_error(format!(
            "invalid attribute type '{}' in DN component '{}'",
            attribute,
            raw.trim()
        )));
    }

    Ok(Ava {
        attribute: attribute.to_string(),
        value: unescape_value(&raw[eq + 1..])?,
    })
}

fn unescape_value(raw: &str) -> Result<String> {
    let trimmed = raw.trim_start();
    if let Some(quoted) = trimmed.strip_prefix('"') {
        return unescape_quoted(quoted);
    }

    let mut out = Vec::with_capacity(trimmed.len());
    // Unescaped trailing whitespace is insignificant; escaped is kept.
    let mut keep = 0;
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            decode_escape(&mut chars, &mut out)?;
            keep = out.len();
        } else {
            push_char(&mut out, c);
            if !c.is_whitespace() {
                keep = out.len();
            }
        }
    }
    out.truncate(keep);

    into_string(out)
}

fn unescape_quoted(rest: &str) -> Result<String> {
    let mut out = Vec::with_capacity(rest.len());
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => decode_escape(&mut chars, &mut out)?,
            '"' => {
                if chars.any(|c| !c.is_whitespace()) {
                    return Err(parse_error("unexpected text after closing quote"));
                }
                return into_string(out);
            }
            c => push_char(&mut out, c),
        }
    }
    Err(parse_error("unterminated quoted value"))
}

fn decode_escape(chars: &mut Peekable<Chars<'_>>, out: &mut Vec<u8>) -> Result<()> {
    match chars.next() {
        None => Err(parse_error("dangling escape at end of value")),
        Some(high) if high.is_ascii_hexdigit() => match chars.peek().copied() {
            Some(low) if low.is_ascii_hexdigit() => {
                chars.next();
                out.push(hex_value(high) << 4 | hex_value(low));
                Ok(())
            }
            _ => Err(parse_error(format!("incomplete hex escape '\\{}'", high))),
        },
        Some(c) => {
            push_char(out, c);
            Ok(())
        }
    }
}

fn hex_value(c: char) -> u8 {
    c.to_digit(16).map(|d| d as u8).unwrap_or(0)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| parse_error("hex escapes do not form valid UTF-8"))
}
