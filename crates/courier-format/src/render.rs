//! Converts segments into styled display blocks.
//!
//! Inline styling is parsed by an explicit left-to-right state machine
//! rather than ad-hoc index walking, so every unterminated-span case has a
//! single, visible degrade path: the span is re-emitted literally.

use crate::block::{Block, Inline};
use crate::segment::Segment;

/// Render a whole reply.
///
/// When the reply is exactly one code segment, the answer *is* the code:
/// it becomes a single preformatted block with no inline parsing at all.
pub fn render_blocks(segments: &[Segment]) -> Vec<Block> {
    if let [Segment::Code { content, language }] = segments {
        if content.is_empty() {
            return Vec::new();
        }
        return vec![Block::Preformatted {
            content: content.clone(),
            language: language.clone(),
        }];
    }
    segments.iter().filter_map(render).collect()
}

/// Render one segment; `None` for empty content.
pub fn render(segment: &Segment) -> Option<Block> {
    match segment {
        Segment::Code { content, language } => {
            if content.is_empty() {
                return None;
            }
            Some(Block::Preformatted {
                content: content.clone(),
                language: language.clone(),
            })
        }
        Segment::Text { content } => {
            if content.trim().is_empty() {
                return None;
            }
            let runs = tokenize_inline(content);
            if runs.is_empty() {
                None
            } else {
                Some(Block::Rich { runs })
            }
        }
    }
}

/// Tokenizer state. Span-carrying states remember where the construct
/// opened so an unterminated span can be replayed as literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Plain,
    /// After `**` / `__`; `start` is the first marker's index.
    InBold { marker: char, start: usize },
    /// After a single backtick at `start`.
    InCode { start: usize },
    /// After `[` at `start`.
    InLinkText { start: usize },
    /// After `](`; link text is `start+1..text_end`.
    InLinkUrl {
        start: usize,
        text_end: usize,
        url_start: usize,
    },
}

fn tokenize_inline(text: &str) -> Vec<Inline> {
    let chars: Vec<char> = text.chars().collect();
    let mut runs: Vec<Inline> = Vec::new();
    let mut plain = String::new();
    let mut state = State::Plain;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match state {
            State::Plain => {
                if (c == '*' || c == '_') && chars.get(i + 1) == Some(&c) {
                    state = State::InBold { marker: c, start: i };
                    i += 2;
                } else if c == '`' {
                    state = State::InCode { start: i };
                    i += 1;
                } else if c == '[' {
                    state = State::InLinkText { start: i };
                    i += 1;
                } else if c == '*' || c == '_' {
                    // Single marker: an unwrapped italic span. Italics are
                    // not a supported style, so the delimiters are stripped
                    // and the inner text kept plain.
                    i = consume_italic(&chars, i, c, &mut plain);
                } else {
                    plain.push(c);
                    i += 1;
                }
            }
            State::InBold { marker, start } => {
                if c == marker && chars.get(i + 1) == Some(&marker) {
                    flush_plain(&mut plain, &mut runs);
                    let inner: String = chars[start + 2..i].iter().collect();
                    if !inner.is_empty() {
                        runs.push(Inline::Bold { text: inner });
                    }
                    state = State::Plain;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            State::InCode { start } => {
                if c == '`' {
                    flush_plain(&mut plain, &mut runs);
                    let inner: String = chars[start + 1..i].iter().collect();
                    if !inner.is_empty() {
                        runs.push(Inline::Code { text: inner });
                    }
                    state = State::Plain;
                }
                i += 1;
            }
            State::InLinkText { start } => {
                if c == ']' {
                    if chars.get(i + 1) == Some(&'(') {
                        state = State::InLinkUrl {
                            start,
                            text_end: i,
                            url_start: i + 2,
                        };
                        i += 2;
                    } else {
                        // No following (url): degrade to literal `[text]`.
                        plain.extend(&chars[start..=i]);
                        state = State::Plain;
                        i += 1;
                    }
                } else {
                    i += 1;
                }
            }
            State::InLinkUrl {
                start,
                text_end,
                url_start,
            } => {
                if c == ')' {
                    flush_plain(&mut plain, &mut runs);
                    runs.push(Inline::Link {
                        text: chars[start + 1..text_end].iter().collect(),
                        url: chars[url_start..i].iter().collect(),
                    });
                    state = State::Plain;
                }
                i += 1;
            }
        }
    }

    // Unterminated span: replay it literally from where it opened.
    match state {
        State::Plain => {}
        State::InBold { start, .. }
        | State::InCode { start }
        | State::InLinkText { start }
        | State::InLinkUrl { start, .. } => {
            plain.extend(&chars[start..]);
        }
    }
    flush_plain(&mut plain, &mut runs);
    runs
}

/// Strip a `*text*` / `_text_` italic span into `plain`, returning the
/// index after the closing marker. Falls back to pushing the marker
/// literally when the span does not qualify.
fn consume_italic(chars: &[char], open: usize, marker: char, plain: &mut String) -> usize {
    let openable = chars
        .get(open + 1)
        .map(|next| !next.is_whitespace())
        .unwrap_or(false);
    if openable {
        let mut j = open + 1;
        while j < chars.len() {
            if chars[j] == marker && !chars[j - 1].is_whitespace() {
                plain.extend(&chars[open + 1..j]);
                return j + 1;
            }
            j += 1;
        }
    }
    plain.push(marker);
    open + 1
}

fn flush_plain(plain: &mut String, runs: &mut Vec<Inline>) {
    if !plain.is_empty() {
        runs.push(Inline::Text {
            text: std::mem::take(plain),
        });
    }
}
