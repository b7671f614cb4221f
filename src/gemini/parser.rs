//! Gemini response parsing
//!
//! A response is `<2-digit-status>[ <meta>]\r\n<body>`. There is no length
//! framing: the body is everything the server sent before closing the
//! connection, so parsing works on the complete buffer.

use super::{ConnectionError, Error, Response, Result, Status};
use crate::charset::latin1_to_string;
use bytes::Bytes;

/// Number of digits in a status code
const STATUS_DIGITS: usize = 2;

/// Find the first CR in a buffer
fn find_cr(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\r')
}

/// Split a complete response buffer into status, meta and body
///
/// Format: STATUS[ META]\r\nBODY
/// Example: 20 text/gemini\r\n# Welcome
pub fn parse_response(raw: &[u8]) -> Result<Response> {
    if raw.is_empty() {
        return Err(ConnectionError::EmptyResponse.into());
    }
    if raw.len() < STATUS_DIGITS {
        return Err(Error::MalformedResponse(
            "response shorter than a status code".to_string(),
        ));
    }

    let status = Status::from_digits(raw[0], raw[1])?;
    let mut pos = STATUS_DIGITS;

    // Exactly one separator precedes the meta text
    if raw.get(pos).map_or(false, |&b| b != b'\r') {
        pos += 1;
    }

    let rest = raw.get(pos..).unwrap_or_default();
    let cr = find_cr(rest)
        .ok_or_else(|| Error::MalformedResponse("header line is not terminated".to_string()))?;

    if rest.get(cr + 1) != Some(&b'\n') {
        return Err(Error::MalformedResponse(
            "header line ends in CR without LF".to_string(),
        ));
    }

    let meta = latin1_to_string(&rest[..cr]);
    let body = if status.is_success() {
        Bytes::copy_from_slice(&rest[cr + 2..])
    } else {
        Bytes::new()
    };

    log::trace!(
        "parsed response status={} meta={:?} body={} bytes",
        status,
        meta,
        body.len()
    );

    Ok(Response::new(status, meta, body))
}
