//! Research query stage.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use newsdesk_bedrock::{GenerationRequest, TextGenerator};
use newsdesk_shared::{ModelProfile, NewsdeskError, ResearchQuery, Result};

use crate::extractor::has_entity_section;
use crate::prompts::{self, RESEARCH_OUTPUT_FORMAT, RESEARCH_PREAMBLE};
use crate::stage_failure;

/// Turns extractor output into a single knowledge base query.
pub struct ResearchQueryBuilder {
    generator: Arc<dyn TextGenerator>,
    profile: ModelProfile,
    system_prompt: String,
}

impl ResearchQueryBuilder {
    pub fn new(generator: Arc<dyn TextGenerator>, profile: ModelProfile) -> Self {
        Self {
            generator,
            profile,
            system_prompt: prompts::research_query_prompt(),
        }
    }

    /// Build the query from the extractor's two-section text.
    #[instrument(skip_all, fields(chars = extractor_output.len()))]
    pub async fn build(&self, extractor_output: &str) -> Result<ResearchQuery> {
        if !has_entity_section(extractor_output) {
            return Err(NewsdeskError::QueryBuild(
                "input has no Entities section".into(),
            ));
        }

        let generation = self
            .generator
            .generate(GenerationRequest {
                profile: &self.profile,
                system_prompt: &self.system_prompt,
                input: extractor_output,
            })
            .await
            .map_err(|e| stage_failure(e, NewsdeskError::QueryBuild))?;

        let generated = strip_quotes(generation.text.trim());
        if generated.is_empty() {
            return Err(NewsdeskError::QueryBuild(
                "model returned an empty query".into(),
            ));
        }

        let query = enforce_contract(generated, extractor_output);
        info!(chars = query.len(), "research query built");
        Ok(ResearchQuery(query))
    }
}

/// Models sometimes echo the quoting used in the prompt.
fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(text)
}

/// The query must open with the preamble, carry the output format exactly
/// once and end with the entity list it is scoped to.
fn enforce_contract(generated: &str, extractor_output: &str) -> String {
    let body = match generated.strip_prefix(RESEARCH_PREAMBLE) {
        Some(rest) => rest.trim_start().to_string(),
        None if generated.contains(RESEARCH_PREAMBLE) => {
            debug!("moving research preamble to the front");
            generated.replacen(RESEARCH_PREAMBLE, "", 1).trim().to_string()
        }
        None => {
            debug!("prepending research preamble");
            generated.to_string()
        }
    };

    let mut query = String::from(RESEARCH_PREAMBLE);
    if !body.contains(RESEARCH_OUTPUT_FORMAT) {
        debug!("prepending output format");
        query.push_str("\n\n");
        query.push_str(RESEARCH_OUTPUT_FORMAT);
    }
    if !body.is_empty() {
        query.push_str("\n\n");
        query.push_str(&body);
    }

    if !has_entity_section(&query) {
        debug!("appending extractor output");
        query.push_str("\n\n");
        query.push_str(extractor_output.trim());
    }
    query
}
