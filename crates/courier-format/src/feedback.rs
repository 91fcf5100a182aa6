//! Decides whether a reply deserves rating controls and attaches them.
//!
//! The checks run against the raw pre-segmentation text and short-circuit
//! on the first disqualifier, cheapest first.

use crate::block::{Chunk, FeedbackControls};

/// Exact (case-insensitive, trimmed) replies that never earn ratings.
const FILLER_REPLIES: &[&str] = &["ok", "done", "hello", "hi", "hey", "thanks", "thank you"];

/// Replies opening with one of these are greetings or refusals, not answers.
const REFUSAL_PREFIXES: &[&str] = &[
    "i'm sorry",
    "i am sorry",
    "i can't",
    "i cannot",
    "i don't have",
    "unfortunately, i",
    "hello!",
    "hi there",
];

/// Relayed copies of our own failure notice are not answers either.
const ERROR_MARKER: &str = "something went wrong";

#[derive(Debug, Clone)]
pub struct FeedbackPolicy {
    pub min_len: usize,
    pub enabled: bool,
}

impl FeedbackPolicy {
    pub fn new(min_len: usize, enabled: bool) -> Self {
        Self { min_len, enabled }
    }

    /// True when the reply is worth asking the user to rate.
    pub fn is_substantive(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.chars().count() < self.min_len {
            return false;
        }
        let lower = trimmed.to_lowercase();
        if FILLER_REPLIES.contains(&lower.as_str()) {
            return false;
        }
        if REFUSAL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return false;
        }
        if lower.contains(ERROR_MARKER) {
            return false;
        }
        true
    }

    /// Attach rating controls to the last chunk, and only there. The
    /// controls stay a distinct trailing element of the chunk, never part
    /// of its content blocks.
    pub fn attach(&self, chunks: &mut [Chunk], raw: &str) {
        if !self.enabled || !self.is_substantive(raw) {
            return;
        }
        if let Some(last) = chunks.last_mut() {
            last.feedback = Some(FeedbackControls::ratings());
        }
    }
}
