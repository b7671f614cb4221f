//! Byte-to-character decoding
//!
//! Gemini bodies and headers are decoded one byte to one character
//! (ISO-8859-1). Multi-byte UTF-8 sequences therefore come out as several
//! Latin-1 characters; front-ends that render existing capsules rely on this.

/// Decode bytes as ISO-8859-1, mapping each byte to the code point of the same value
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
