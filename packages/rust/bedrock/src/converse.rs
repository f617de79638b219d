//! Text generation through the Bedrock Converse API.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use newsdesk_shared::{ModelProfile, Result};

use crate::client::BedrockClient;

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// One generation call: a model, a system instruction and a single user turn.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub profile: &'a ModelProfile,
    pub system_prompt: &'a str,
    pub input: &'a str,
}

/// Generated text plus call accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub model: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub latency_ms: u64,
    pub stop_reason: Option<String>,
}

/// Opaque text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TextBlock<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseBody<'a> {
    system: Vec<TextBlock<'a>>,
    messages: Vec<Message<'a>>,
    inference_config: InferenceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_model_request_fields: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    #[serde(default)]
    message: Option<OutputMessage>,
}

#[derive(Debug, Deserialize)]
struct OutputMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// `top_k` is not part of the common inference config; each model family
/// takes it under its own key.
fn top_k_fields(profile: &ModelProfile) -> Option<serde_json::Value> {
    let top_k = profile.top_k?;
    if profile.model_id.contains("anthropic") {
        Some(serde_json::json!({ "top_k": top_k }))
    } else {
        Some(serde_json::json!({ "inferenceConfig": { "topK": top_k } }))
    }
}

fn build_body<'a>(request: &GenerationRequest<'a>) -> ConverseBody<'a> {
    ConverseBody {
        system: vec![TextBlock {
            text: request.system_prompt,
        }],
        messages: vec![Message {
            role: "user",
            content: vec![TextBlock {
                text: request.input,
            }],
        }],
        inference_config: InferenceConfig {
            max_tokens: request.profile.max_tokens,
            temperature: request.profile.temperature,
            top_p: request.profile.top_p,
        },
        additional_model_request_fields: top_k_fields(request.profile),
    }
}

// ---------------------------------------------------------------------------
// Bedrock implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl TextGenerator for BedrockClient {
    #[instrument(skip_all, fields(model = %request.profile.model_id))]
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation> {
        let url = self.runtime_url(&["model", request.profile.model_id.as_str(), "converse"])?;
        let body = build_body(&request);

        let start = Instant::now();
        let response: ConverseResponse = self.post_json("bedrock converse", url, &body).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let text = response
            .output
            .message
            .map(|m| {
                m.content
                    .into_iter()
                    .filter_map(|block| block.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        info!(
            tokens_in = response.usage.input_tokens,
            tokens_out = response.usage.output_tokens,
            latency_ms,
            stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
            "model call complete"
        );

        Ok(Generation {
            text,
            model: request.profile.model_id.clone(),
            tokens_in: response.usage.input_tokens,
            tokens_out: response.usage.output_tokens,
            latency_ms,
            stop_reason: response.stop_reason,
        })
    }
}
