//! Knowledge base access through the Bedrock Agent Runtime API.
//!
//! Two calls are supported: `retrieveAndGenerate`, which synthesizes an
//! answer from the top-N snippets, and `retrieve`, which returns the raw
//! ranked snippets.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use newsdesk_shared::Result;

use crate::client::BedrockClient;

/// Fixed scope of a retrieve-and-generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseSettings {
    pub knowledge_base_id: String,
    pub model_arn: String,
    pub number_of_results: u32,
    pub search_type: String,
}

/// Synthesized answer from retrieve-and-generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAnswer {
    pub text: String,
    pub citation_count: usize,
}

/// One ranked snippet from `retrieve`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: Option<f64>,
}

/// Opaque knowledge-retrieval service.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        settings: &KnowledgeBaseSettings,
    ) -> Result<SynthesizedAnswer>;

    async fn retrieve(&self, query: &str, knowledge_base_id: &str) -> Result<Vec<RetrievedChunk>>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RagResponse {
    output: RagOutput,
    #[serde(default)]
    citations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RagOutput {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    content: RetrievalContent,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RetrievalContent {
    #[serde(default)]
    text: String,
}

fn rag_body(query: &str, settings: &KnowledgeBaseSettings) -> serde_json::Value {
    json!({
        "input": { "text": query },
        "retrieveAndGenerateConfiguration": {
            "type": "KNOWLEDGE_BASE",
            "knowledgeBaseConfiguration": {
                "knowledgeBaseId": settings.knowledge_base_id,
                "modelArn": settings.model_arn,
                "retrievalConfiguration": {
                    "vectorSearchConfiguration": {
                        "numberOfResults": settings.number_of_results,
                        "overrideSearchType": settings.search_type,
                    }
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Bedrock implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl KnowledgeRetriever for BedrockClient {
    #[instrument(skip_all, fields(kb = %settings.knowledge_base_id, top = settings.number_of_results))]
    async fn retrieve_and_generate(
        &self,
        query: &str,
        settings: &KnowledgeBaseSettings,
    ) -> Result<SynthesizedAnswer> {
        let url = self.agent_runtime_url(&["retrieveAndGenerate"])?;
        let response: RagResponse = self
            .post_json("bedrock retrieveAndGenerate", url, &rag_body(query, settings))
            .await?;

        info!(
            chars = response.output.text.len(),
            citations = response.citations.len(),
            "retrieve and generate complete"
        );

        Ok(SynthesizedAnswer {
            text: response.output.text,
            citation_count: response.citations.len(),
        })
    }

    #[instrument(skip_all, fields(kb = %knowledge_base_id))]
    async fn retrieve(&self, query: &str, knowledge_base_id: &str) -> Result<Vec<RetrievedChunk>> {
        let url = self.agent_runtime_url(&["knowledgebases", knowledge_base_id, "retrieve"])?;
        let body = json!({ "retrievalQuery": { "text": query } });
        let response: RetrieveResponse = self.post_json("bedrock retrieve", url, &body).await?;

        let chunks: Vec<RetrievedChunk> = response
            .retrieval_results
            .into_iter()
            .map(|r| RetrievedChunk {
                text: r.content.text,
                score: r.score,
            })
            .collect();

        info!(results = chunks.len(), "retrieve complete");
        Ok(chunks)
    }
}
