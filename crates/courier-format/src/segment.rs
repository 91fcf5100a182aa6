//! Splits raw reply text into ordered text/code segments.
//!
//! A fence opens on a line of three backticks plus an optional language tag
//! and closes on a line of three backticks alone. An opening fence that
//! never closes is not code: it is re-emitted literally as text.

/// One ordered piece of the reply. Concatenating all segment contents
/// (whitespace-insensitively) reconstructs the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text { content: String },
    Code { content: String, language: String },
}

/// Language tag used when an opening fence carries none.
const DEFAULT_LANGUAGE: &str = "text";

pub fn segment(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text_buf = String::new();
    // (language, verbatim opening fence line, body)
    let mut open_fence: Option<(String, String, String)> = None;

    for line in raw.lines() {
        if open_fence.is_some() {
            if line.trim() == "```" {
                let (language, _, body) = open_fence.take().unwrap();
                segments.push(Segment::Code {
                    content: body,
                    language,
                });
            } else if let Some((_, _, body)) = open_fence.as_mut() {
                body.push_str(line);
                body.push('\n');
            }
            continue;
        }
        match parse_opening_fence(line) {
            Some(language) => {
                flush_text(&mut text_buf, &mut segments);
                open_fence = Some((language, line.to_string(), String::new()));
            }
            None => {
                text_buf.push_str(line);
                text_buf.push('\n');
            }
        }
    }

    // Unterminated fence: everything from the opening line down is plain
    // text, fence included.
    if let Some((_, fence_line, body)) = open_fence.take() {
        text_buf.push_str(&fence_line);
        text_buf.push('\n');
        text_buf.push_str(&body);
    }
    flush_text(&mut text_buf, &mut segments);

    segments
}

/// Returns the (lowercased) language tag when `line` is an opening fence.
fn parse_opening_fence(line: &str) -> Option<String> {
    let tag = line.trim().strip_prefix("```")?;
    // A tag containing backticks is inline code on one line, not a fence.
    if tag.contains('`') {
        return None;
    }
    let tag = tag.trim();
    if tag.is_empty() {
        Some(DEFAULT_LANGUAGE.to_string())
    } else {
        Some(tag.to_lowercase())
    }
}

fn flush_text(buf: &mut String, segments: &mut Vec<Segment>) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        segments.push(Segment::Text {
            content: trimmed.to_string(),
        });
    }
    buf.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_segment() {
        let segs = segment("Just an answer.");
        assert_eq!(
            segs,
            vec![Segment::Text {
                content: "Just an answer.".into()
            }]
        );
    }

    #[test]
    fn text_code_text() {
        let segs = segment("Hello\n```js\nconsole.log(1)\n```\nBye");
        assert_eq!(
            segs,
            vec![
                Segment::Text {
                    content: "Hello".into()
                },
                Segment::Code {
                    content: "console.log(1)\n".into(),
                    language: "js".into()
                },
                Segment::Text {
                    content: "Bye".into()
                },
            ]
        );
    }

    #[test]
    fn language_tag_is_lowercased() {
        let segs = segment("```Rust\nfn main() {}\n```");
        assert_eq!(
            segs,
            vec![Segment::Code {
                content: "fn main() {}\n".into(),
                language: "rust".into()
            }]
        );
    }

    #[test]
    fn missing_tag_defaults_to_text() {
        let segs = segment("```\nsome output\n```");
        match &segs[0] {
            Segment::Code { language, .. } => assert_eq!(language, "text"),
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn empty_code_segment_is_kept() {
        let segs = segment("before\n```sh\n```\nafter");
        assert_eq!(segs.len(), 3);
        assert_eq!(
            segs[1],
            Segment::Code {
                content: String::new(),
                language: "sh".into()
            }
        );
    }

    #[test]
    fn unterminated_fence_is_literal_text() {
        let segs = segment("look:\n```py\nprint(1)");
        assert_eq!(segs.len(), 2);
        match &segs[1] {
            Segment::Text { content } => {
                assert!(content.starts_with("```py"));
                assert!(content.contains("print(1)"));
            }
            other => panic!("expected text, got {other:?}"),
        }
        assert!(segs.iter().all(|s| matches!(s, Segment::Text { .. })));
    }

    #[test]
    fn whitespace_only_text_between_fences_is_dropped() {
        let segs = segment("```a\nx\n```\n   \n```b\ny\n```");
        assert_eq!(segs.len(), 2);
        assert!(segs.iter().all(|s| matches!(s, Segment::Code { .. })));
    }

    #[test]
    fn n_fences_yield_n_code_segments_and_content_is_preserved() {
        let raw = "intro\n```rust\nlet a = 1;\n```\nmiddle bit\n```sh\nls -la\n```\noutro";
        let segs = segment(raw);

        let code_count = segs
            .iter()
            .filter(|s| matches!(s, Segment::Code { .. }))
            .count();
        assert_eq!(code_count, 2);

        // Whitespace-insensitive reconstruction: every non-fence source
        // character survives, in order.
        let rebuilt: String = segs
            .iter()
            .map(|s| match s {
                Segment::Text { content } => content.clone(),
                Segment::Code { content, .. } => content.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        let strip = |s: &str| {
            s.chars()
                .filter(|c| !c.is_whitespace() && *c != '`')
                .collect::<String>()
        };
        let source_without_fences = raw.replace("```rust", "").replace("```sh", "");
        assert_eq!(strip(&rebuilt), strip(&source_without_fences));
    }
}
