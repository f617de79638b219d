//! Scripted service fakes that record every call.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use newsdesk_bedrock::{
    Generation, GenerationRequest, KnowledgeBaseSettings, KnowledgeRetriever, RetrievedChunk,
    SynthesizedAnswer, TextGenerator,
};
use newsdesk_shared::{NewsdeskError, Result};

use crate::tools::AgentTools;

#[derive(Debug, Clone)]
pub struct GeneratorCall {
    pub model: String,
    pub system_prompt: String,
    pub input: String,
}

/// Answers generation calls from a queue, in call order.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<GeneratorCall>>,
}

impl ScriptedGenerator {
    pub fn new(replies: impl IntoIterator<Item = Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Generation> {
        self.calls.lock().unwrap().push(GeneratorCall {
            model: request.profile.model_id.clone(),
            system_prompt: request.system_prompt.to_string(),
            input: request.input.to_string(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NewsdeskError::Network("no scripted reply left".into())))?;
        Ok(Generation {
            text: reply,
            model: request.profile.model_id.clone(),
            tokens_in: 10,
            tokens_out: 20,
            latency_ms: 1,
            stop_reason: Some("end_turn".into()),
        })
    }
}

/// Knowledge base fake with one scripted answer.
pub struct ScriptedRetriever {
    answer: Mutex<Option<Result<String>>>,
    pub chunks: Vec<RetrievedChunk>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedRetriever {
    pub fn answering(answer: Result<String>) -> Self {
        Self {
            answer: Mutex::new(Some(answer)),
            chunks: Vec::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeRetriever for ScriptedRetriever {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        _settings: &KnowledgeBaseSettings,
    ) -> Result<SynthesizedAnswer> {
        self.queries.lock().unwrap().push(query.to_string());
        let text = self
            .answer
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(NewsdeskError::Network("no scripted answer left".into())))?;
        Ok(SynthesizedAnswer {
            text,
            citation_count: 1,
        })
    }

    async fn retrieve(&self, query: &str, _knowledge_base_id: &str) -> Result<Vec<RetrievedChunk>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.chunks.clone())
    }
}

pub fn kb_settings() -> KnowledgeBaseSettings {
    KnowledgeBaseSettings {
        knowledge_base_id: "KB0042".into(),
        model_arn: "arn:aws:bedrock:us-east-1:123456789012:inference-profile/us.amazon.nova-micro-v1:0"
            .into(),
        number_of_results: 5,
        search_type: "HYBRID".into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Research(String),
    Write(String),
    Review(String),
}

/// Agent tools fake answering each tool from its own queue.
pub struct ScriptedTools {
    research: Mutex<VecDeque<Result<String>>>,
    write: Mutex<VecDeque<Result<String>>>,
    review: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<ToolCall>>,
}

impl ScriptedTools {
    pub fn new(
        research: impl IntoIterator<Item = Result<String>>,
        write: impl IntoIterator<Item = Result<String>>,
        review: impl IntoIterator<Item = Result<String>>,
    ) -> Self {
        Self {
            research: Mutex::new(research.into_iter().collect()),
            write: Mutex::new(write.into_iter().collect()),
            review: Mutex::new(review.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ToolCall::Write(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    pub fn reviews(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ToolCall::Review(_)))
            .count()
    }

    fn next(queue: &Mutex<VecDeque<Result<String>>>, tool: &str) -> Result<String> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NewsdeskError::Network(format!("{tool} called too often"))))
    }
}

#[async_trait]
impl AgentTools for ScriptedTools {
    async fn research(&self, news_facts: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(ToolCall::Research(news_facts.to_string()));
        Self::next(&self.research, "research")
    }

    async fn write(&self, query: &str) -> Result<String> {
        self.calls.lock().unwrap().push(ToolCall::Write(query.to_string()));
        Self::next(&self.write, "write")
    }

    async fn review(&self, article_text: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(ToolCall::Review(article_text.to_string()));
        Self::next(&self.review, "review")
    }
}
