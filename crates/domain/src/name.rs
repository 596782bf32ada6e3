//! Domain name helpers.
//!
//! Names are kept as dotted text without the trailing root dot. A label byte
//! that would be ambiguous in that form is escaped the way zone files do it:
//! `\.` for a dot inside a label, `\\` for a backslash and `\DDD` for a byte
//! that is not part of valid UTF-8. mDNS names compare case-insensitively, so
//! every comparison in the engine goes through [`names_equal`] and every map
//! key through [`to_key`].

use crate::errors::DomainError;
use std::fmt::Write;
use std::net::Ipv4Addr;

/// Longest dotted name whose wire form fits the 255 octet limit.
pub const MAX_NAME_LEN: usize = 253;
pub const MAX_LABEL_LEN: usize = 63;

/// Strips a single trailing root dot, if any. An escaped final dot belongs
/// to the last label and stays.
pub fn normalize(name: &str) -> &str {
    match name.strip_suffix('.') {
        Some(stripped) if !ends_with_escape(stripped) => stripped,
        _ => name,
    }
}

fn ends_with_escape(s: &str) -> bool {
    s.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

pub fn validate_name(name: &str) -> Result<(), DomainError> {
    let name = normalize(name);
    if name.is_empty() {
        return Err(DomainError::InvalidDomainName("empty name".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::NameTooLong(name.len()));
    }
    for label in labels(name)? {
        if label.is_empty() {
            return Err(DomainError::InvalidLabel {
                name: name.to_string(),
                reason: "empty label",
            });
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(DomainError::InvalidLabel {
                name: name.to_string(),
                reason: "label longer than 63 bytes",
            });
        }
    }
    Ok(())
}

/// Raw label bytes of a dotted name, escapes undone. Empty labels are
/// returned as such; length rules are left to the caller.
pub fn labels(name: &str) -> Result<Vec<Vec<u8>>, DomainError> {
    let name = normalize(name);
    if name.is_empty() {
        return Ok(Vec::new());
    }

    let bad_escape = || DomainError::InvalidLabel {
        name: name.to_string(),
        reason: "bad escape sequence",
    };

    let mut out = Vec::new();
    let mut label = Vec::new();
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        match c {
            '.' => out.push(std::mem::take(&mut label)),
            '\\' => {
                let next = chars.next().ok_or_else(bad_escape)?;
                if let Some(d0) = next.to_digit(10) {
                    let d1 = chars.next().and_then(|c| c.to_digit(10));
                    let d2 = chars.next().and_then(|c| c.to_digit(10));
                    let (Some(d1), Some(d2)) = (d1, d2) else {
                        return Err(bad_escape());
                    };
                    let value = d0 * 100 + d1 * 10 + d2;
                    label.push(u8::try_from(value).map_err(|_| bad_escape())?);
                } else {
                    let mut utf8 = [0u8; 4];
                    label.extend_from_slice(next.encode_utf8(&mut utf8).as_bytes());
                }
            }
            _ => {
                let mut utf8 = [0u8; 4];
                label.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    out.push(label);
    Ok(out)
}

/// Appends one raw wire label to a dotted name, escaping as needed.
pub fn push_label(name: &mut String, label: &[u8]) {
    if !name.is_empty() {
        name.push('.');
    }
    match std::str::from_utf8(label) {
        Ok(text) => name.push_str(&escape_label(text)),
        Err(_) => {
            for &b in label {
                match b {
                    b'.' | b'\\' => {
                        name.push('\\');
                        name.push(b as char);
                    }
                    0x21..=0x7e => name.push(b as char),
                    _ => {
                        let _ = write!(name, "\\{:03}", b);
                    }
                }
            }
        }
    }
}

/// Escapes free text, such as a DNS-SD instance name, for use as a single
/// label.
pub fn escape_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '.' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// First label (still escaped) and the rest of the name after it.
pub fn split_first_label(name: &str) -> (&str, Option<&str>) {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'.' => return (&name[..i], Some(&name[i + 1..])),
            _ => i += 1,
        }
    }
    (name, None)
}

#[inline]
pub fn names_equal(a: &str, b: &str) -> bool {
    normalize(a).eq_ignore_ascii_case(normalize(b))
}

/// Lowercase form used as a map key.
pub fn to_key(name: &str) -> String {
    normalize(name).to_ascii_lowercase()
}

/// Builds the `in-addr.arpa` name used for reverse (PTR) lookups.
pub fn reverse_name(addr: Ipv4Addr) -> String {
    let [a, b, c, d] = addr.octets();
    format!("{}.{}.{}.{}.in-addr.arpa", d, c, b, a)
}
