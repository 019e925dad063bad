//! Base62 encoding of numeric ids into short codes.
//!
//! The alphabet order is digits, then lowercase, then uppercase. Changing it
//! would change every code ever issued, so it is fixed.

/// Code alphabet: `0-9`, `a-z`, `A-Z`.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const BASE: u64 = ALPHABET.len() as u64;

/// Longest code `encode` can produce (`u64::MAX` in base62).
pub const MAX_ENCODED_LEN: usize = 11;

/// Errors that can occur while decoding a short code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid character {character:?} at position {position} in base62 string")]
    InvalidCharacter { character: char, position: usize },

    #[error("Base62 value does not fit into 64 bits")]
    Overflow,
}

/// Encodes a numeric id as a base62 string, most significant digit first.
///
/// `0` encodes to `"0"`; any other value never starts with `'0'`.
///
/// # Examples
///
/// ```
/// use tinyurl::utils::base62::encode;
///
/// assert_eq!(encode(0), "0");
/// assert_eq!(encode(61), "Z");
/// assert_eq!(encode(62), "10");
/// ```
pub fn encode(mut id: u64) -> String {
    if id == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut digits = Vec::with_capacity(MAX_ENCODED_LEN);
    while id > 0 {
        digits.push(ALPHABET[(id % BASE) as usize]);
        id /= BASE;
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

/// Decodes a base62 string back into its numeric id.
///
/// Ids are `u64` throughout the crate, so the `u64` range is the limit on
/// magnitude: any value above `"lYGhA16ahyf"` (`u64::MAX`) is rejected with
/// [`DecodeError::Overflow`] rather than wrapped. The empty string decodes
/// to `0`. Leading zeros are accepted.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidCharacter`] for any character outside the alphabet
/// and [`DecodeError::Overflow`] when the value exceeds `u64::MAX`.
///
/// # Examples
///
/// ```
/// use tinyurl::utils::base62::{decode, DecodeError};
///
/// assert_eq!(decode("10"), Ok(62));
/// assert!(matches!(decode("a-b"), Err(DecodeError::InvalidCharacter { .. })));
/// ```
pub fn decode(code: &str) -> Result<u64, DecodeError> {
    code.chars()
        .enumerate()
        .try_fold(0u64, |acc, (position, character)| {
            let digit = digit_value(character)
                .ok_or(DecodeError::InvalidCharacter {
                    character,
                    position,
                })?;

            acc.checked_mul(BASE)
                .and_then(|v| v.checked_add(digit))
                .ok_or(DecodeError::Overflow)
        })
}

/// Returns `true` if every character of `code` belongs to the alphabet.
pub fn is_base62(code: &str) -> bool {
    code.chars().all(|c| digit_value(c).is_some())
}

fn digit_value(c: char) -> Option<u64> {
    let value = match c {
        '0'..='9' => c as u64 - '0' as u64,
        'a'..='z' => c as u64 - 'a' as u64 + 10,
        'A'..='Z' => c as u64 - 'A' as u64 + 36,
        _ => return None,
    };
    Some(value)
}
