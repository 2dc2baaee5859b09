//! Checksum — NMEA 0183 XOR checksums for sentences and tag blocks.

use super::model::ParseError;

/// XOR of every byte in `body`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Split `body*HH` at the last `*`. Returns `None` when there is no `*`.
pub fn split(text: &str) -> Option<(&str, &str)> {
    text.rfind('*').map(|idx| (&text[..idx], &text[idx + 1..]))
}

/// Check `found` (two hex digits, trailing whitespace tolerated) against the body.
pub fn verify(body: &str, found: &str) -> Result<(), ParseError> {
    let expected = checksum(body);
    let digits = found.trim_end();
    match u8::from_str_radix(digits, 16) {
        Ok(value) if digits.len() == 2 && value == expected => Ok(()),
        _ => Err(ParseError::Checksum {
            expected,
            found: digits.to_string(),
        }),
    }
}
