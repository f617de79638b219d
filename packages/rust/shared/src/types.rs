//! Core domain types for the article pipeline.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NewsdeskError, Result};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RawInput
// ---------------------------------------------------------------------------

/// Journalist notes as received. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput(String);

impl RawInput {
    /// Accept the text of the `query` field; blank text counts as missing.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(NewsdeskError::malformed("query"));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Entity classification used by the extractor schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Organization,
    Product,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::Product => "PRODUCT",
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSON" => Ok(Self::Person),
            "ORGANIZATION" | "ORGANISATION" => Ok(Self::Organization),
            "PRODUCT" => Ok(Self::Product),
            other => Err(NewsdeskError::validation(format!(
                "unknown entity type '{other}'"
            ))),
        }
    }
}

/// A named person, organization or product found in the input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub subtype: String,
    /// Always within `[0, 1]`.
    pub confidence: f32,
}

/// Entities in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySet(pub Vec<Entity>);

impl EntitySet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.0.iter()
    }

    /// Count entities of one type.
    pub fn count_of(&self, entity_type: EntityType) -> usize {
        self.0.iter().filter(|e| e.entity_type == entity_type).count()
    }

    /// Look an entity up by its extracted text (case-insensitive).
    pub fn find(&self, text: &str) -> Option<&Entity> {
        self.0.iter().find(|e| e.text.eq_ignore_ascii_case(text))
    }
}

// ---------------------------------------------------------------------------
// Stage artifacts
// ---------------------------------------------------------------------------

/// The free-text query handed to the knowledge retriever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchQuery(pub String);

/// Research text returned by the knowledge retriever (untagged).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchResult(pub String);

/// One article draft: a headline line followed by the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// 0 for the first draft, 1 for the revision.
    pub revision: u32,
    text: String,
}

impl Draft {
    /// Build a draft, requiring a non-empty headline and body.
    pub fn parse(revision: u32, text: impl Into<String>) -> Result<Self> {
        let text = text.into().trim().to_string();
        let (headline, body) = split_headline(&text);
        if headline.is_empty() {
            return Err(NewsdeskError::validation("draft has no headline"));
        }
        if body.is_empty() {
            return Err(NewsdeskError::validation("draft has a headline but no body"));
        }
        Ok(Self { revision, text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn headline(&self) -> &str {
        split_headline(&self.text).0
    }

    pub fn body(&self) -> &str {
        split_headline(&self.text).1
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

fn split_headline(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once('\n') {
        Some((head, rest)) => (head.trim(), rest.trim()),
        None => (text.trim(), ""),
    }
}

static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(critical|important|minor)\b").expect("valid priority regex")
});

/// Reviewer critique of exactly one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    /// Revision of the draft this feedback reviews.
    pub revision: u32,
    text: String,
}

/// Priority tag counts found in a critique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub critical: usize,
    pub important: usize,
    pub minor: usize,
}

impl Feedback {
    pub fn new(revision: u32, text: impl Into<String>) -> Result<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(NewsdeskError::validation("review feedback is empty"));
        }
        Ok(Self { revision, text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn priorities(&self) -> PriorityCounts {
        let mut counts = PriorityCounts::default();
        for caps in PRIORITY_RE.captures_iter(&self.text) {
            match caps[1].to_ascii_lowercase().as_str() {
                "critical" => counts.critical += 1,
                "important" => counts.important += 1,
                _ => counts.minor += 1,
            }
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Tool names
// ---------------------------------------------------------------------------

/// Separator a gateway puts between its target name and the tool name.
pub const GATEWAY_DELIMITER: &str = "___";

/// Tool name with any `target___` gateway prefix removed.
pub fn bare_tool_name(name: &str) -> &str {
    match name.split_once(GATEWAY_DELIMITER) {
        Some((_, tool)) => tool.trim(),
        None => name.trim(),
    }
}
