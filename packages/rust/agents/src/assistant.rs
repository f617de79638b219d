//! Media assistant over the gateway tools.
//!
//! The tool plan is fixed: `get_show_detail` with the question, then
//! `get_title_rating` for every title id found in the question or the
//! retrieved details, then one generation call over the collected results.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Value, json};
use tracing::{info, instrument};

use newsdesk_bedrock::{GenerationRequest, TextGenerator};
use newsdesk_handlers::{Gateway, GatewayTool, NOT_AVAILABLE};
use newsdesk_shared::{ModelProfile, NewsdeskError, Result};

use crate::prompts::MEDIA_ASSISTANT_PROMPT;
use crate::stage_failure;

/// Tool name of the assistant.
pub const MEDIA_ASSISTANT_TOOL: &str = "mediaAssistantAgent";

const QUESTION_ARGUMENT: &str = "query";

/// Ratings looked up per question.
const MAX_RATED_TITLES: usize = 10;

static TITLE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\btitle_id\s*[:=]\s*"?([a-z0-9_-]+)|\b(aws\d{6})\b"#)
        .expect("valid title id regex")
});

pub struct MediaAssistant {
    generator: Arc<dyn TextGenerator>,
    profile: ModelProfile,
    gateway: Gateway,
}

impl MediaAssistant {
    pub fn new(generator: Arc<dyn TextGenerator>, profile: ModelProfile, gateway: Gateway) -> Self {
        Self {
            generator,
            profile,
            gateway,
        }
    }

    pub fn spec() -> Value {
        json!({
            "name": MEDIA_ASSISTANT_TOOL,
            "description": "Answers questions about movies and shows from the title knowledge \
                            base and the rating table.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    QUESTION_ARGUMENT: {"type": "string", "description": "A question about a title or genre"}
                },
                "required": [QUESTION_ARGUMENT],
            }
        })
    }

    /// The question from a JSON argument object.
    pub fn argument(args: &Value) -> Result<&str> {
        args.get(QUESTION_ARGUMENT)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| NewsdeskError::malformed(QUESTION_ARGUMENT))
    }

    #[instrument(skip_all, fields(chars = question.len()))]
    pub async fn answer(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(NewsdeskError::malformed(QUESTION_ARGUMENT));
        }

        let details = self
            .gateway
            .invoke(GatewayTool::GetShowDetail, &json!({ "query": question }))
            .await?;
        let snippets: Vec<&str> = details
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut ratings = Vec::new();
        for title_id in title_ids(question, &snippets) {
            let rating = self
                .gateway
                .invoke(GatewayTool::GetTitleRating, &json!({ "title_id": title_id }))
                .await?;
            let rating = rating
                .get("rating")
                .and_then(Value::as_str)
                .unwrap_or(NOT_AVAILABLE)
                .to_string();
            ratings.push((title_id, rating));
        }

        let input = compose_context(question, &snippets, &ratings);
        let generation = self
            .generator
            .generate(GenerationRequest {
                profile: &self.profile,
                system_prompt: MEDIA_ASSISTANT_PROMPT,
                input: &input,
            })
            .await
            .map_err(|e| stage_failure(e, NewsdeskError::Generation))?;

        let answer = generation.text.trim();
        if answer.is_empty() {
            return Err(NewsdeskError::Generation(
                "media assistant returned an empty answer".into(),
            ));
        }
        info!(
            details = snippets.len(),
            rated = ratings.len(),
            "media question answered"
        );
        Ok(answer.to_string())
    }
}

/// Title ids in first-seen order, question first.
fn title_ids(question: &str, snippets: &[&str]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for text in std::iter::once(question).chain(snippets.iter().copied()) {
        for caps in TITLE_ID_RE.captures_iter(text) {
            let Some(id) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            let id = id.as_str().to_lowercase();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids.truncate(MAX_RATED_TITLES);
    ids
}

fn compose_context(question: &str, snippets: &[&str], ratings: &[(String, String)]) -> String {
    let mut out = format!("## Question\n{question}\n\n## get_show_detail\n");
    if snippets.is_empty() {
        out.push_str("No matching titles.\n");
    }
    for snippet in snippets {
        out.push_str("- ");
        out.push_str(snippet.trim());
        out.push('\n');
    }
    out.push_str("\n## get_title_rating\n");
    if ratings.is_empty() {
        out.push_str("No title ids to rate.\n");
    }
    for (title_id, rating) in ratings {
        out.push_str(&format!("- {title_id}: {rating}\n"));
    }
    out
}
