//! Knowledge retrieval stage.

use std::sync::Arc;

use tracing::{info, instrument};

use newsdesk_bedrock::{KnowledgeBaseSettings, KnowledgeRetriever};
use newsdesk_shared::{NewsdeskError, ResearchQuery, ResearchResult, Result};

use crate::stage_failure;

/// Runs one retrieve-and-generate call against the configured knowledge base.
pub struct ResearchRetriever {
    service: Arc<dyn KnowledgeRetriever>,
    settings: KnowledgeBaseSettings,
}

impl ResearchRetriever {
    pub fn new(service: Arc<dyn KnowledgeRetriever>, settings: KnowledgeBaseSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &KnowledgeBaseSettings {
        &self.settings
    }

    #[instrument(skip_all, fields(kb = %self.settings.knowledge_base_id))]
    pub async fn retrieve(&self, query: &ResearchQuery) -> Result<ResearchResult> {
        let answer = self
            .service
            .retrieve_and_generate(&query.0, &self.settings)
            .await
            .map_err(|e| stage_failure(e, NewsdeskError::Retrieval))?;

        let text = answer.text.trim();
        if text.is_empty() {
            return Err(NewsdeskError::Retrieval(
                "knowledge base returned an empty answer".into(),
            ));
        }

        info!(
            chars = text.len(),
            citations = answer.citation_count,
            "research retrieved"
        );
        Ok(ResearchResult(text.to_string()))
    }
}
