//! Delimiting tags that mark each stage's output inside a larger message.

use std::sync::LazyLock;

use regex::Regex;

/// A stage-specific XML-style tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageTag {
    ResearchResults,
    Article,
    ReviewFeedback,
    Final,
}

impl StageTag {
    pub const ALL: [StageTag; 4] = [
        Self::ResearchResults,
        Self::Article,
        Self::ReviewFeedback,
        Self::Final,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ResearchResults => "research_results",
            Self::Article => "article",
            Self::ReviewFeedback => "review_feedback",
            Self::Final => "final",
        }
    }

    pub fn open(&self) -> String {
        format!("<{}>", self.name())
    }

    pub fn close(&self) -> String {
        format!("</{}>", self.name())
    }
}

/// Wrap `text` in `tag`.
pub fn wrap(tag: StageTag, text: &str) -> String {
    format!("<{0}>{text}</{0}>", tag.name())
}

/// Inner text of the first `tag` element, or the trimmed input when the tag
/// is absent. An unterminated tag yields everything after the opening tag.
pub fn unwrap(tag: StageTag, text: &str) -> String {
    let open = tag.open();
    let close = tag.close();
    match text.find(&open) {
        Some(start) => {
            let inner = &text[start + open.len()..];
            let inner = match inner.find(&close) {
                Some(end) => &inner[..end],
                None => inner,
            };
            inner.trim().to_string()
        }
        None => text.trim().to_string(),
    }
}

static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?\s*(research_results|article|review_feedback|final)\s*>")
        .expect("valid stage tag regex")
});

/// Remove every stage tag, keeping the enclosed content.
///
/// Repeats until no tag is left, since removing an inner tag can join the
/// pieces of an outer one (`<arti<final>cle>`).
pub fn strip_all(text: &str) -> String {
    let mut stripped = ANY_TAG_RE.replace_all(text, "").into_owned();
    while contains_any(&stripped) {
        stripped = ANY_TAG_RE.replace_all(&stripped, "").into_owned();
    }
    stripped.trim().to_string()
}

/// True if any stage tag remains in `text`.
pub fn contains_any(text: &str) -> bool {
    ANY_TAG_RE.is_match(text)
}
