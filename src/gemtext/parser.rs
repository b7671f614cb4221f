//! Gemtext line classifier
//!
//! The parser is a two-state machine. In `Normal` mode every line becomes one
//! block, classified by its first byte. A fence line (three backticks)
//! switches to `Preformatted` mode, where lines are collected verbatim into a
//! single buffer until the next fence flushes it as one block.
//!
//! Parsing never fails: any byte sequence yields some block sequence.

use super::{GemtextBlock, GemtextOptions};
use crate::charset::latin1_to_string;

const FENCE: &[u8] = b"```";

/// Parser mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Preformatted,
}

/// Incremental Gemtext parser
///
/// Feed lines with [`GemtextParser::feed_line`], then call
/// [`GemtextParser::finish`].
#[derive(Debug)]
pub struct GemtextParser {
    options: GemtextOptions,
    mode: Mode,
    buffer: Vec<u8>,
    blocks: Vec<GemtextBlock>,
}

impl GemtextParser {
    pub fn new(options: GemtextOptions) -> Self {
        GemtextParser {
            options,
            mode: Mode::Normal,
            buffer: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Feed one line without its `\n`
    pub fn feed_line(&mut self, line: &[u8]) {
        let line = if self.options.strip_carriage_returns {
            line.strip_suffix(&b"\r"[..]).unwrap_or(line)
        } else {
            line
        };

        match self.mode {
            Mode::Normal if line.starts_with(FENCE) => {
                // The rest of the opening fence (alt text) is dropped
                self.mode = Mode::Preformatted;
            }
            Mode::Normal => self.blocks.push(classify_line(line)),
            Mode::Preformatted if line.starts_with(FENCE) => self.flush_preformatted(),
            Mode::Preformatted => {
                self.buffer.extend_from_slice(line);
                self.buffer.push(b'\n');
            }
        }
    }

    fn flush_preformatted(&mut self) {
        let lines = latin1_to_string(&self.buffer);
        self.buffer.clear();
        self.blocks.push(GemtextBlock::Preformatted { lines });
        self.mode = Mode::Normal;
    }

    /// Finish parsing and return the blocks
    ///
    /// A preformatted region still open at the end is flushed as a final block.
    pub fn finish(mut self) -> Vec<GemtextBlock> {
        if self.mode == Mode::Preformatted {
            log::debug!("unterminated preformatted block ({} bytes)", self.buffer.len());
            self.flush_preformatted();
        }
        self.blocks
    }
}

/// Split a body into lines on `\n`, dropping trailing empty lines
///
/// An empty body therefore has no lines at all and parses to no blocks,
/// not to a single `BlankLine`.
pub fn split_lines(body: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = body.split(|&b| b == b'\n').collect();
    while lines.last().map_or(false, |line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Text after a fixed number of marker and delimiter bytes; empty if the line is shorter
fn text_from(line: &[u8], offset: usize) -> String {
    latin1_to_string(line.get(offset..).unwrap_or_default())
}

fn skip_spaces(line: &[u8], mut index: usize) -> usize {
    while index < line.len() && line[index] == b' ' {
        index += 1;
    }
    index
}

/// Classify one line outside preformatted mode
pub fn classify_line(line: &[u8]) -> GemtextBlock {
    match line.first() {
        None => GemtextBlock::BlankLine,
        Some(b'#') => parse_heading(line),
        Some(b'=') if line.starts_with(b"=>") => parse_link(line),
        Some(b'*') => GemtextBlock::ListItem {
            text: text_from(line, 2),
        },
        Some(b'>') => GemtextBlock::BlockQuote {
            text: text_from(line, 1),
        },
        Some(_) => GemtextBlock::Paragraph {
            text: latin1_to_string(line),
        },
    }
}

/// `#` run picks the level; text starts one byte after the marker.
/// `#Title` therefore loses its first letter.
fn parse_heading(line: &[u8]) -> GemtextBlock {
    let run = line.iter().take_while(|&&b| b == b'#').count();
    let level = run.min(3);
    GemtextBlock::Heading {
        level: level as u8,
        text: text_from(line, level + 1),
    }
}

fn parse_link(line: &[u8]) -> GemtextBlock {
    let mut index = skip_spaces(line, 2);

    let start = index;
    while index < line.len() && line[index] != b' ' {
        index += 1;
    }
    let target = latin1_to_string(&line[start..index]);

    let index = skip_spaces(line, index);
    let caption = if index >= line.len() {
        target.clone()
    } else {
        latin1_to_string(&line[index..])
    };

    GemtextBlock::Link { target, caption }
}
