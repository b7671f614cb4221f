//! gemlite - Gemini protocol client core
//!
//! This crate provides the non-visual half of a Gemini browser: the address
//! model, a blocking TLS request/response engine, a Gemtext parser and the
//! navigation policy a front-end needs to drive them.

pub mod address;
pub mod charset;
pub mod gemini;
pub mod gemtext;
pub mod navigation;

pub use address::{Address, InvalidAddress};
pub use gemini::{ClientConfig, ConnectionError, Error, GeminiClient, Response, Status};
pub use gemtext::{GemtextBlock, GemtextOptions};
pub use navigation::{classify, Content, Fetch, Navigator, NavigatorConfig, Outcome};
