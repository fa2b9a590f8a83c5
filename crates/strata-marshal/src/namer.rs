//! Child names for container elements.
//!
//! An element's name is a length letter followed by its decimal index:
//! `a` for one digit, `b` for two, and so on (`a0`, `a9`, `b10`, `c100`).
//! Indices carry no leading zeros, so byte order of names equals numeric
//! order of indices and every name parses back to exactly one index.

use strata_store::StorePath;

use crate::error::MarshalResult;

/// The child segment for element `index`.
pub fn child_name(index: usize) -> String {
    let digits = index.to_string();
    // usize has at most 20 decimal digits, so the letter stays within a..t.
    let letter = char::from(b'a' + (digits.len() - 1) as u8);
    let mut name = String::with_capacity(digits.len() + 1);
    name.push(letter);
    name.push_str(&digits);
    name
}

/// The element index a child segment names, or `None` if `name` is not a
/// well-formed element name.
pub fn parse_child_name(name: &str) -> Option<usize> {
    let mut chars = name.chars();
    let letter = chars.next()?;
    if !letter.is_ascii_lowercase() {
        return None;
    }
    let digits = chars.as_str();
    let expected = (letter as u8 - b'a') as usize + 1;
    if digits.len() != expected || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Path of element `index` beneath `parent`.
pub fn child_path(parent: &StorePath, index: usize) -> MarshalResult<StorePath> {
    Ok(parent.join(&child_name(index))?)
}
