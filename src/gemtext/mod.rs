//! Gemtext document parser
//!
//! Turns a `text/gemini` body into an ordered list of [`GemtextBlock`]s.
//! Bytes are decoded as Latin-1, one byte per character, so the parser never
//! fails on invalid UTF-8.
//!
//! # Examples
//!
//! ```
//! use gemlite::gemtext::{self, GemtextBlock};
//!
//! let blocks = gemtext::parse(b"# Title\n=> gemini://x.test/ Link text\n");
//! assert_eq!(blocks[0], GemtextBlock::heading(1, "Title"));
//! assert_eq!(blocks[1], GemtextBlock::link("gemini://x.test/", "Link text"));
//! ```

pub mod block;
pub mod parser;

pub use block::{links, GemtextBlock};
pub use parser::{GemtextParser, Mode};

/// Parsing options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GemtextOptions {
    /// Drop one trailing `\r` from each line before classifying it.
    /// Off by default, so CRLF documents keep the `\r` in their text.
    pub strip_carriage_returns: bool,
}

/// Parse a Gemtext body with default options
pub fn parse(body: &[u8]) -> Vec<GemtextBlock> {
    parse_with(body, &GemtextOptions::default())
}

/// Parse a Gemtext body
pub fn parse_with(body: &[u8], options: &GemtextOptions) -> Vec<GemtextBlock> {
    let mut parser = GemtextParser::new(options.clone());
    for line in parser::split_lines(body) {
        parser.feed_line(line);
    }
    let blocks = parser.finish();
    log::trace!("parsed {} bytes into {} blocks", body.len(), blocks.len());
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let body = b"# Title\n\nSome text\n=> gemini://x.test/ Link text\n* item\n> quoted\n";
        assert_eq!(
            parse(body),
            vec![
                GemtextBlock::heading(1, "Title"),
                GemtextBlock::BlankLine,
                GemtextBlock::paragraph("Some text"),
                GemtextBlock::link("gemini://x.test/", "Link text"),
                GemtextBlock::list_item("item"),
                GemtextBlock::block_quote(" quoted"),
            ]
        );
    }

    #[test]
    fn test_parse_preformatted() {
        assert_eq!(
            parse(b"```\ncode line\n```\n"),
            vec![GemtextBlock::preformatted("code line\n")]
        );
        assert_eq!(
            parse(b"before\n```\n  a\n\n  b\n```\nafter"),
            vec![
                GemtextBlock::paragraph("before"),
                GemtextBlock::preformatted("  a\n\n  b\n"),
                GemtextBlock::paragraph("after"),
            ]
        );
    }

    #[test]
    fn test_empty_preformatted() {
        assert_eq!(parse(b"```\n```"), vec![GemtextBlock::preformatted("")]);
    }

    #[test]
    fn test_empty_body() {
        assert!(parse(b"").is_empty());
        assert!(parse(b"\n\n\n").is_empty());
    }

    #[test]
    fn test_trailing_blank_lines_dropped() {
        assert_eq!(
            parse(b"text\n\n\n"),
            vec![GemtextBlock::paragraph("text")]
        );
        // Interior blank lines survive
        assert_eq!(
            parse(b"\n\ntext"),
            vec![
                GemtextBlock::BlankLine,
                GemtextBlock::BlankLine,
                GemtextBlock::paragraph("text"),
            ]
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let body = b"## Sub\n```\nx\n```\n=> a.gmi\n";
        assert_eq!(parse(body), parse(body));
    }

    #[test]
    fn test_latin1_decoding() {
        assert_eq!(
            parse(b"caf\xe9\n"),
            vec![GemtextBlock::paragraph("caf\u{e9}")]
        );
        // UTF-8 sequences decode byte by byte
        assert_eq!(
            parse("é".as_bytes()),
            vec![GemtextBlock::paragraph("\u{c3}\u{a9}")]
        );
    }

    #[test]
    fn test_crlf_options() {
        let body = b"# Title\r\ntext\r\n";
        assert_eq!(
            parse(body),
            vec![
                GemtextBlock::heading(1, "Title\r"),
                GemtextBlock::paragraph("text\r"),
            ]
        );

        let options = GemtextOptions {
            strip_carriage_returns: true,
        };
        assert_eq!(
            parse_with(body, &options),
            vec![
                GemtextBlock::heading(1, "Title"),
                GemtextBlock::paragraph("text"),
            ]
        );
    }

    #[test]
    fn test_display_reparses() {
        let body = b"# Title\n=> a.gmi A\n* item\n>q\n```\ncode\n```\n";
        let blocks = parse(body);
        let rendered: Vec<String> = blocks.iter().map(ToString::to_string).collect();
        let reparsed = parse(rendered.join("\n").as_bytes());
        assert_eq!(blocks, reparsed);
    }

    #[test]
    fn test_links_helper() {
        let blocks = parse(b"=> one.gmi\ntext\n=> gemini://two.test/ Two\n");
        assert_eq!(
            links(&blocks).collect::<Vec<_>>(),
            vec!["one.gmi", "gemini://two.test/"]
        );
    }
}
