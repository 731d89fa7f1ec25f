//! Latin-1 conversions.
//!
//! Tibia.com is a Latin-1 site. Page bytes are turned into text exactly once,
//! in [`decode_page`]; everything downstream works on `String`s. Running a
//! conversion a second time over already-correct text corrupts it, so no
//! parser calls into this module.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("character {ch:?} at position {position} has no Latin-1 representation")]
pub struct EncodingError {
    pub ch: char,
    pub position: usize,
}

/// Encode text as Latin-1 bytes.
pub fn to_latin1(s: &str) -> Result<Vec<u8>, EncodingError> {
    s.chars()
        .enumerate()
        .map(|(position, ch)| u8::try_from(u32::from(ch)).map_err(|_| EncodingError { ch, position }))
        .collect()
}

/// Decode Latin-1 bytes. Every byte maps to the code point of the same value.
pub fn to_unicode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Undo one round of UTF-8-read-as-Latin-1 corruption (`"NÃ¤urin"` -> `"Näurin"`).
pub fn repair_mojibake(s: &str) -> Result<String, EncodingError> {
    let bytes = to_latin1(s)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Turn a fetched body into text.
///
/// Bodies that are valid UTF-8 are taken as UTF-8; anything else is the
/// site's native Latin-1. The declared charset is not trusted, since the
/// site does not always honour it.
pub fn decode_page(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => to_unicode(bytes),
    }
}

/// Percent-encode a query value the way Tibia.com expects: Latin-1 bytes,
/// form-encoded.
pub fn latin1_query_escape(s: &str) -> Result<String, EncodingError> {
    let bytes = to_latin1(s)?;
    Ok(url::form_urlencoded::byte_serialize(&bytes).collect())
}
