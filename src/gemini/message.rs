//! Gemini message types
//!
//! This module defines the status code and the response produced by one
//! request.

use super::{Error, Result, CRLF};
use bytes::Bytes;
use std::fmt;

/// Status families used for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// 10: prompt the user and re-request with the answer as query
    Input,
    /// 11: like `Input`, but the answer should be masked
    SensitiveInput,
    /// 2x: meta is a MIME type, body is content
    Success,
    /// 3x: meta is the new target
    Redirect,
    /// 4x
    TemporaryFailure,
    /// 5x
    PermanentFailure,
    /// 6x
    CertificateRequired,
    /// Anything outside 10..=69
    Unknown,
}

/// Gemini status code (two decimal digits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Status {
    code: u8,
}

impl Status {
    pub const INPUT: Status = Status { code: 10 };
    pub const SENSITIVE_INPUT: Status = Status { code: 11 };
    pub const SUCCESS: Status = Status { code: 20 };
    pub const REDIRECT_TEMPORARY: Status = Status { code: 30 };
    pub const REDIRECT_PERMANENT: Status = Status { code: 31 };
    pub const TEMPORARY_FAILURE: Status = Status { code: 40 };
    pub const SERVER_UNAVAILABLE: Status = Status { code: 41 };
    pub const PERMANENT_FAILURE: Status = Status { code: 50 };
    pub const NOT_FOUND: Status = Status { code: 51 };
    pub const GONE: Status = Status { code: 52 };
    pub const PROXY_REQUEST_REFUSED: Status = Status { code: 53 };
    pub const BAD_REQUEST: Status = Status { code: 59 };
    pub const CERTIFICATE_REQUIRED: Status = Status { code: 60 };

    /// Create a status code; anything that is not two digits is rejected
    pub fn new(code: u8) -> Result<Self> {
        if code <= 99 {
            Ok(Status { code })
        } else {
            Err(Error::MalformedResponse(format!(
                "status code {} is not two digits",
                code
            )))
        }
    }

    /// Combine two ASCII digits
    pub fn from_digits(d0: u8, d1: u8) -> Result<Self> {
        if !d0.is_ascii_digit() || !d1.is_ascii_digit() {
            return Err(Error::MalformedResponse(format!(
                "status {:?} is not two digits",
                String::from_utf8_lossy(&[d0, d1])
            )));
        }
        Ok(Status {
            code: 10 * (d0 - b'0') + (d1 - b'0'),
        })
    }

    /// Get the numeric code
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Family of this status
    pub fn category(&self) -> StatusCategory {
        match self.code {
            10 => StatusCategory::Input,
            11 => StatusCategory::SensitiveInput,
            // Other 1x codes are treated as plain input
            12..=19 => StatusCategory::Input,
            20..=29 => StatusCategory::Success,
            30..=39 => StatusCategory::Redirect,
            40..=49 => StatusCategory::TemporaryFailure,
            50..=59 => StatusCategory::PermanentFailure,
            60..=69 => StatusCategory::CertificateRequired,
            _ => StatusCategory::Unknown,
        }
    }

    /// True for status 20
    pub fn is_success(&self) -> bool {
        *self == Status::SUCCESS
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.code)
    }
}

/// Response to one Gemini request
///
/// The body is only ever populated for status 20.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    meta: String,
    body: Bytes,
}

impl Response {
    /// Create a response; the body is discarded unless the status is 20
    pub fn new(status: Status, meta: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let body = if status.is_success() {
            body.into()
        } else {
            Bytes::new()
        };
        Response {
            status,
            meta: meta.into(),
            body,
        }
    }

    /// Get the status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Header text after the status: MIME type, prompt, redirect target or error detail
    pub fn meta(&self) -> &str {
        &self.meta
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take the body, keeping the shared buffer
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Convert response to wire format
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(self.meta.len() + self.body.len() + 5);
        wire.extend_from_slice(self.status.to_string().as_bytes());
        if !self.meta.is_empty() {
            wire.push(b' ');
            wire.extend_from_slice(self.meta.as_bytes());
        }
        wire.extend_from_slice(CRLF.as_bytes());
        wire.extend_from_slice(&self.body);
        wire
    }
}
