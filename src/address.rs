//! Gemini address model
//!
//! An [`Address`] is a validated `gemini://` URL split into hostname, folder
//! and file. Addresses are only created through [`Address::parse`] (or
//! helpers that re-validate), so every instance satisfies
//! `reconstructed_url() == "gemini://" + hostname + folder + file [+ "?" + query]`.
//!
//! # Grammar
//!
//! ```text
//! gemini://<hostname>[/<path>][?<query>]
//! hostname = 1*( ALPHA / DIGIT / "." )
//! path     = *( visible ASCII except "?" )
//! query    = *( visible ASCII )
//! ```
//!
//! Input is lower-cased before validation. Hostnames with ports, hyphens or
//! userinfo are rejected.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::str::FromStr;

/// Scheme prefix of every Gemini address
pub const SCHEME_PREFIX: &str = "gemini://";

/// Characters escaped in user-supplied query text: everything except RFC 3986 unreserved.
const QUERY_TEXT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Address validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Gemini address {address:?}: {reason}")]
pub struct InvalidAddress {
    address: String,
    reason: &'static str,
}

impl InvalidAddress {
    fn new(address: &str, reason: &'static str) -> Self {
        InvalidAddress {
            address: address.to_string(),
            reason,
        }
    }

    /// The rejected input
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Why the input was rejected
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// A validated Gemini address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    hostname: String,
    folder: String,
    file: String,
    query: Option<String>,
}

fn is_hostname_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.'
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_graphic() && b != b'?'
}

fn is_query_byte(b: u8) -> bool {
    b.is_ascii_graphic()
}

/// True if `target` starts with a URI scheme such as `https:` or `mailto:`
fn has_scheme(target: &str) -> bool {
    let mut chars = target.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    for c in chars {
        match c {
            ':' => return true,
            c if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') => {}
            _ => return false,
        }
    }
    false
}

impl Address {
    /// Validate and decompose an address string
    pub fn parse(raw: &str) -> Result<Self, InvalidAddress> {
        let lowered = raw.to_lowercase();

        let rest = lowered
            .strip_prefix(SCHEME_PREFIX)
            .ok_or_else(|| InvalidAddress::new(raw, "missing gemini:// scheme"))?;

        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };

        let host_end = location.find('/').unwrap_or(location.len());
        let hostname = &location[..host_end];
        let path = &location[host_end..];

        if hostname.is_empty() {
            return Err(InvalidAddress::new(raw, "empty hostname"));
        }
        if !hostname.bytes().all(is_hostname_byte) {
            return Err(InvalidAddress::new(raw, "hostname may only contain letters, digits and dots"));
        }
        if !path.bytes().all(is_path_byte) {
            return Err(InvalidAddress::new(raw, "path contains whitespace or non-ASCII characters"));
        }
        if let Some(query) = query {
            if !query.bytes().all(is_query_byte) {
                return Err(InvalidAddress::new(raw, "query contains whitespace or non-ASCII characters"));
            }
        }

        // The file is whatever follows the final slash; the folder keeps the slashes
        let (folder, file) = match path.rfind('/') {
            Some(slash) => (&path[..=slash], &path[slash + 1..]),
            None => ("/", ""),
        };

        let address = Address {
            hostname: hostname.to_string(),
            folder: folder.to_string(),
            file: file.to_string(),
            query: query.map(str::to_string),
        };
        log::trace!(
            "parsed address host={} folder={} file={} query={:?}",
            address.hostname,
            address.folder,
            address.file,
            address.query
        );
        Ok(address)
    }

    /// Check whether a string is a complete, valid Gemini address
    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    /// Hostname, lower-cased
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Folder path, always starting and ending with `/`
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Trailing path segment; empty when the address names a folder
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Query text after `?`, if any
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Rebuild the canonical address string
    pub fn reconstructed_url(&self) -> String {
        let mut url = self.folder_url();
        url.push_str(&self.file);
        if let Some(ref query) = self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Rebuild the address of the folder containing this file
    pub fn folder_url(&self) -> String {
        format!("{}{}{}", SCHEME_PREFIX, self.hostname, self.folder)
    }

    /// The folder-only address ("go to parent folder")
    ///
    /// Drops the file and query. Calling it on a folder address returns the
    /// same folder.
    pub fn parent(&self) -> Address {
        Address {
            hostname: self.hostname.clone(),
            folder: self.folder.clone(),
            file: String::new(),
            query: None,
        }
    }

    /// Attach user input as the query, replacing any existing one
    ///
    /// The text is percent-encoded and the result re-validated, so like every
    /// other address it is lower-cased.
    pub fn with_query(&self, text: &str) -> Result<Address, InvalidAddress> {
        let candidate = format!(
            "{}{}?{}",
            self.folder_url(),
            self.file,
            utf8_percent_encode(text, QUERY_TEXT)
        );
        Address::parse(&candidate)
    }

    /// Resolve a link target found on the page at `self`
    ///
    /// Resolution order:
    /// 1. a complete Gemini address is used as-is;
    /// 2. otherwise the target is taken relative to the current folder, after
    ///    stripping one leading `/` or `./`;
    /// 3. anything still invalid (including targets with another scheme) fails.
    pub fn resolve_link(&self, target: &str) -> Result<Address, InvalidAddress> {
        if let Ok(address) = Address::parse(target) {
            return Ok(address);
        }

        if has_scheme(target) {
            return Err(InvalidAddress::new(target, "not a Gemini link"));
        }

        let relative = target
            .strip_prefix("./")
            .or_else(|| target.strip_prefix('/'))
            .unwrap_or(target)
            .trim_start_matches('/');

        let candidate = format!("{}{}", self.folder_url(), relative);
        Address::parse(&candidate).map_err(|_| InvalidAddress::new(target, "not a Gemini link"))
    }
}

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reconstructed_url())
    }
}
