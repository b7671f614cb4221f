//! Gemtext block elements

use std::fmt;

/// One block of a Gemtext document
///
/// Documents are plain `Vec<GemtextBlock>`; order is the only relationship
/// between blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GemtextBlock {
    /// `#`, `##` or `###` heading; level is 1 to 3
    Heading { level: u8, text: String },
    /// `=>` link line; caption equals target when the line has none
    Link { target: String, caption: String },
    /// `*` list item
    ListItem { text: String },
    /// `>` quote line
    BlockQuote { text: String },
    /// Any other non-empty line
    Paragraph { text: String },
    /// Empty line
    BlankLine,
    /// Lines between two fences, each followed by `\n`
    Preformatted { lines: String },
}

impl GemtextBlock {
    /// Create a heading, clamping the level to 1..=3
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        GemtextBlock::Heading {
            level: level.clamp(1, 3),
            text: text.into(),
        }
    }

    /// Create a link; an empty caption falls back to the target
    pub fn link(target: impl Into<String>, caption: impl Into<String>) -> Self {
        let target = target.into();
        let caption = caption.into();
        let caption = if caption.is_empty() {
            target.clone()
        } else {
            caption
        };
        GemtextBlock::Link { target, caption }
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        GemtextBlock::ListItem { text: text.into() }
    }

    pub fn block_quote(text: impl Into<String>) -> Self {
        GemtextBlock::BlockQuote { text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        GemtextBlock::Paragraph { text: text.into() }
    }

    pub fn preformatted(lines: impl Into<String>) -> Self {
        GemtextBlock::Preformatted { lines: lines.into() }
    }

    /// Link target, if this block is a link
    pub fn link_target(&self) -> Option<&str> {
        match self {
            GemtextBlock::Link { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Visible text of the block
    pub fn text(&self) -> &str {
        match self {
            GemtextBlock::Heading { text, .. }
            | GemtextBlock::ListItem { text }
            | GemtextBlock::BlockQuote { text }
            | GemtextBlock::Paragraph { text } => text,
            GemtextBlock::Link { caption, .. } => caption,
            GemtextBlock::Preformatted { lines } => lines,
            GemtextBlock::BlankLine => "",
        }
    }
}

/// Renders the block back as Gemtext source
impl fmt::Display for GemtextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GemtextBlock::Heading { level, text } => {
                write!(f, "{} {}", "#".repeat(usize::from(*level)), text)
            }
            GemtextBlock::Link { target, caption } if caption == target => write!(f, "=> {}", target),
            GemtextBlock::Link { target, caption } => write!(f, "=> {} {}", target, caption),
            GemtextBlock::ListItem { text } => write!(f, "* {}", text),
            GemtextBlock::BlockQuote { text } => write!(f, ">{}", text),
            GemtextBlock::Paragraph { text } => f.write_str(text),
            GemtextBlock::BlankLine => Ok(()),
            GemtextBlock::Preformatted { lines } => write!(f, "```\n{}```", lines),
        }
    }
}

/// Link targets of a document, in order
pub fn links(blocks: &[GemtextBlock]) -> impl Iterator<Item = &str> {
    blocks.iter().filter_map(GemtextBlock::link_target)
}
