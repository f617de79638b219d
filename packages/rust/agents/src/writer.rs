//! Article writing stage.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, instrument};

use newsdesk_bedrock::{GenerationRequest, TextGenerator};
use newsdesk_shared::tags::{self, StageTag};
use newsdesk_shared::{Draft, Feedback, ModelProfile, NewsdeskError, Result};

use crate::prompts;
use crate::stage_failure;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:\*\*|__)?[ \t]*(?:headline|title|article)[ \t]*:[ \t]*(?:\*\*|__)?[ \t]*")
        .expect("valid label regex")
});

pub struct ArticleWriter {
    generator: Arc<dyn TextGenerator>,
    profile: ModelProfile,
    system_prompt: String,
}

impl ArticleWriter {
    pub fn new(generator: Arc<dyn TextGenerator>, profile: ModelProfile, target_words: u32) -> Self {
        Self {
            generator,
            profile,
            system_prompt: prompts::writer_prompt(target_words),
        }
    }

    /// Write (or revise) a draft from one input blob.
    #[instrument(skip_all, fields(revision = revision, chars = input.len()))]
    pub async fn write(&self, input: &str, revision: u32) -> Result<Draft> {
        let generation = self
            .generator
            .generate(GenerationRequest {
                profile: &self.profile,
                system_prompt: &self.system_prompt,
                input,
            })
            .await
            .map_err(|e| stage_failure(e, NewsdeskError::Generation))?;

        let draft = Draft::parse(revision, clean_article(&generation.text))
            .map_err(|e| stage_failure(e, NewsdeskError::Generation))?;

        info!(
            words = draft.word_count(),
            headline = draft.headline(),
            "draft written"
        );
        Ok(draft)
    }
}

/// Input for the first draft: the facts followed by the tagged research,
/// both verbatim.
pub fn compose_initial(news_facts: &str, tagged_research: &str) -> String {
    format!("{news_facts}\n\n{tagged_research}")
}

/// Input for the revision pass: the previous draft and its critique.
pub fn compose_revision(draft: &Draft, feedback: &Feedback) -> String {
    format!(
        "Revise the article in the <article> tag so that it addresses the review feedback \
         in the <review_feedback> tag. Return only the revised headline and body.\n\n{}\n\n{}",
        tags::wrap(StageTag::Article, draft.text()),
        tags::wrap(StageTag::ReviewFeedback, feedback.text()),
    )
}

/// Remove echoed tags, `Headline:`-style labels and heading markers.
pub fn clean_article(raw: &str) -> String {
    let untagged = tags::strip_all(raw);
    let unlabeled = LABEL_RE.replace_all(&untagged, "");
    let text = unlabeled.trim();

    match text.split_once('\n') {
        Some((headline, body)) => format!("{}\n\n{}", clean_headline(headline), body.trim()),
        None => clean_headline(text),
    }
}

fn clean_headline(line: &str) -> String {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim()
        .to_string()
}
