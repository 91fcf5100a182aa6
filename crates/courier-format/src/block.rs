use serde::Serialize;

/// One styled run inside a rich block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Bold { text: String },
    Code { text: String },
    Link { text: String, url: String },
}

impl Inline {
    pub fn plain(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }

    /// Character cost of this run when packing against a ceiling.
    pub fn char_len(&self) -> usize {
        match self {
            Inline::Text { text } | Inline::Bold { text } | Inline::Code { text } => {
                text.chars().count()
            }
            Inline::Link { text, url } => text.chars().count() + url.chars().count(),
        }
    }

    /// Plain-text form used for fallback summaries.
    pub fn fallback_text(&self) -> &str {
        match self {
            Inline::Text { text }
            | Inline::Bold { text }
            | Inline::Code { text }
            | Inline::Link { text, .. } => text,
        }
    }
}

/// A structured display node: either a sequence of styled runs or a single
/// preformatted region rendered verbatim in monospace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Rich { runs: Vec<Inline> },
    Preformatted { content: String, language: String },
}

impl Block {
    pub fn char_len(&self) -> usize {
        match self {
            Block::Rich { runs } => runs.iter().map(Inline::char_len).sum(),
            Block::Preformatted { content, .. } => content.chars().count(),
        }
    }

    pub fn is_preformatted(&self) -> bool {
        matches!(self, Block::Preformatted { .. })
    }

    pub fn fallback_text(&self) -> String {
        match self {
            Block::Rich { runs } => runs.iter().map(|r| r.fallback_text()).collect(),
            Block::Preformatted { content, .. } => content.clone(),
        }
    }
}

/// The three mutually exclusive rating options attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackControls {
    pub group: String,
    pub options: Vec<FeedbackOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackOption {
    pub action_id: String,
    pub label: String,
}

impl FeedbackControls {
    pub fn ratings() -> Self {
        let option = |action_id: &str, label: &str| FeedbackOption {
            action_id: action_id.to_string(),
            label: label.to_string(),
        };
        Self {
            group: "answer_rating".to_string(),
            options: vec![
                option("rating_helpful", "Helpful"),
                option("rating_partial", "Partly helpful"),
                option("rating_unhelpful", "Not helpful"),
            ],
        }
    }
}

/// A size-bounded unit of outbound content.
///
/// `sequence` is set only on numbered non-code chunks; `degraded_split`
/// marks content that came out of the force-split path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub blocks: Vec<Block>,
    pub fallback: String,
    pub sequence: Option<(usize, usize)>,
    pub degraded_split: bool,
    pub feedback: Option<FeedbackControls>,
}

impl Chunk {
    /// The degenerate "nothing to say" chunk. Callers skip sending it.
    pub fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            fallback: String::new(),
            sequence: None,
            degraded_split: false,
            feedback: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Serialized payload handed to the messaging collaborator.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "blocks": self.blocks,
            "feedback": self.feedback,
        })
    }
}
