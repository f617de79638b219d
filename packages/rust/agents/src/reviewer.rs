//! Article review stage.

use std::sync::Arc;

use tracing::{info, instrument};

use newsdesk_bedrock::{GenerationRequest, TextGenerator};
use newsdesk_shared::tags;
use newsdesk_shared::{Feedback, ModelProfile, NewsdeskError, Result};

use crate::prompts;
use crate::stage_failure;

pub struct ArticleReviewer {
    generator: Arc<dyn TextGenerator>,
    profile: ModelProfile,
}

impl ArticleReviewer {
    pub fn new(generator: Arc<dyn TextGenerator>, profile: ModelProfile) -> Self {
        Self { generator, profile }
    }

    /// Critique one article. `revision` is the revision of the draft under review.
    #[instrument(skip_all, fields(revision = revision, chars = article_text.len()))]
    pub async fn review(&self, article_text: &str, revision: u32) -> Result<Feedback> {
        let generation = self
            .generator
            .generate(GenerationRequest {
                profile: &self.profile,
                system_prompt: prompts::REVIEWER_PROMPT,
                input: article_text,
            })
            .await
            .map_err(|e| stage_failure(e, NewsdeskError::Review))?;

        let feedback = Feedback::new(revision, tags::strip_all(&generation.text))
            .map_err(|e| stage_failure(e, NewsdeskError::Review))?;

        let priorities = feedback.priorities();
        info!(
            critical = priorities.critical,
            important = priorities.important,
            minor = priorities.minor,
            "review complete"
        );
        Ok(feedback)
    }
}
