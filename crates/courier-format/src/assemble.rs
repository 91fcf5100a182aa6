//! Packs rendered blocks into size-bounded delivery chunks.
//!
//! Non-code content accumulates into a shared buffer up to `text_ceiling`.
//! A preformatted block always travels alone: intact under `code_ceiling`,
//! otherwise force-split at the best boundary available (last space, then
//! last newline, then a hard cut) and flagged as degraded.

use tracing::warn;

use crate::block::{Block, Chunk, Inline};

struct Draft {
    blocks: Vec<Block>,
    is_code: bool,
    degraded: bool,
}

pub fn assemble(blocks: &[Block], text_ceiling: usize, code_ceiling: usize) -> Vec<Chunk> {
    let mut drafts: Vec<Draft> = Vec::new();
    let mut runs: Vec<Inline> = Vec::new();
    let mut used = 0usize;

    for block in blocks {
        match block {
            Block::Rich { runs: block_runs } => {
                // Paragraph break between merged rich blocks.
                if !runs.is_empty() {
                    if used + 1 > text_ceiling {
                        flush_text(&mut drafts, &mut runs, &mut used);
                    } else {
                        runs.push(Inline::plain("\n"));
                        used += 1;
                    }
                }
                for run in block_runs {
                    pack_run(run.clone(), text_ceiling, &mut drafts, &mut runs, &mut used);
                }
            }
            Block::Preformatted { content, language } => {
                flush_text(&mut drafts, &mut runs, &mut used);
                if content.chars().count() <= code_ceiling {
                    drafts.push(Draft {
                        blocks: vec![block.clone()],
                        is_code: true,
                        degraded: false,
                    });
                } else {
                    force_split_code(content, language, code_ceiling, &mut drafts);
                }
            }
        }
    }
    flush_text(&mut drafts, &mut runs, &mut used);

    // Degenerate input still yields one (empty) chunk so callers always
    // have something to inspect.
    if drafts.is_empty() {
        return vec![Chunk::empty()];
    }

    finalize(drafts)
}

/// Append a run to the open text buffer, splitting it across chunk
/// boundaries when it cannot fit.
fn pack_run(
    mut run: Inline,
    ceiling: usize,
    drafts: &mut Vec<Draft>,
    runs: &mut Vec<Inline>,
    used: &mut usize,
) {
    loop {
        let len = run.char_len();
        if *used + len <= ceiling {
            if len > 0 {
                runs.push(run);
                *used += len;
            }
            return;
        }

        // A run that fits a fresh chunk moves there whole rather than
        // being cut mid-style.
        if !runs.is_empty() && len <= ceiling {
            flush_text(drafts, runs, used);
            continue;
        }

        // A link cannot be meaningfully cut; degrade it to plain text
        // before splitting.
        if let Inline::Link { text, url } = &run {
            run = Inline::plain(format!("{text} ({url})"));
            continue;
        }

        let remaining = ceiling - *used;
        let (head, tail) = split_run(run, remaining);
        if let Some(head) = head {
            *used += head.char_len();
            runs.push(head);
        }
        flush_text(drafts, runs, used);
        match tail {
            Some(rest) => run = rest,
            None => return,
        }
    }
}

/// Split a styled run so the head fits in `cap` characters, preferring the
/// last space before the cut. The style is preserved on both sides.
fn split_run(run: Inline, cap: usize) -> (Option<Inline>, Option<Inline>) {
    let (text, rebuild): (String, fn(String) -> Inline) = match run {
        Inline::Text { text } => (text, |t| Inline::Text { text: t }),
        Inline::Bold { text } => (text, |t| Inline::Bold { text: t }),
        Inline::Code { text } => (text, |t| Inline::Code { text: t }),
        // Links are degraded before reaching here.
        Inline::Link { text, url } => (format!("{text} ({url})"), |t| Inline::Text { text: t }),
    };

    if cap == 0 {
        return (None, Some(rebuild(text)));
    }

    let cut = byte_index_of_char(&text, cap);
    let window = &text[..cut];
    let split_at = match window.rfind(' ') {
        Some(0) | None => cut,
        Some(pos) => pos,
    };

    let head = text[..split_at].to_string();
    let tail = text[split_at..].trim_start().to_string();
    (
        (!head.is_empty()).then(|| rebuild(head)),
        (!tail.is_empty()).then(|| rebuild(tail)),
    )
}

/// Last-resort split of an oversized preformatted block. Every resulting
/// chunk is flagged so delivery can record the degradation.
fn force_split_code(content: &str, language: &str, cap: usize, drafts: &mut Vec<Draft>) {
    warn!(
        chars = content.chars().count(),
        cap, "preformatted block exceeds ceiling; force-splitting"
    );
    let mut remaining = content;
    loop {
        if remaining.chars().count() <= cap {
            if !remaining.is_empty() {
                push_code(drafts, remaining, language);
            }
            return;
        }
        let cut = byte_index_of_char(remaining, cap);
        let window = &remaining[..cut];
        let split_at = match window.rfind(' ').or_else(|| window.rfind('\n')) {
            Some(0) | None => cut,
            Some(pos) => pos,
        };
        push_code(drafts, &remaining[..split_at], language);
        remaining = remaining[split_at..].trim_start();
    }
}

fn push_code(drafts: &mut Vec<Draft>, content: &str, language: &str) {
    drafts.push(Draft {
        blocks: vec![Block::Preformatted {
            content: content.to_string(),
            language: language.to_string(),
        }],
        is_code: true,
        degraded: true,
    });
}

fn flush_text(drafts: &mut Vec<Draft>, runs: &mut Vec<Inline>, used: &mut usize) {
    if !runs.is_empty() {
        drafts.push(Draft {
            blocks: vec![Block::Rich {
                runs: std::mem::take(runs),
            }],
            is_code: false,
            degraded: false,
        });
    }
    *used = 0;
}

/// Number the non-code chunks and build final chunks with fallbacks.
fn finalize(drafts: Vec<Draft>) -> Vec<Chunk> {
    let total_text = drafts.iter().filter(|d| !d.is_code).count();
    let mut text_index = 0usize;
    let mut chunks = Vec::with_capacity(drafts.len());

    for mut draft in drafts {
        let mut sequence = None;
        if !draft.is_code && total_text > 1 {
            text_index += 1;
            sequence = Some((text_index, total_text));
            let prefix = format!("[{text_index}/{total_text}] ");
            if let Some(Block::Rich { runs }) = draft.blocks.first_mut() {
                runs.insert(0, Inline::plain(prefix));
            }
        }
        let fallback = draft
            .blocks
            .iter()
            .map(Block::fallback_text)
            .collect::<Vec<_>>()
            .join("\n");
        chunks.push(Chunk {
            blocks: draft.blocks,
            fallback,
            sequence,
            degraded_split: draft.degraded,
            feedback: None,
        });
    }
    chunks
}

/// Byte index of the `n`-th character (or the end of the string).
fn byte_index_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}
