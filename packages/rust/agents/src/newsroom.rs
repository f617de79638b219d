//! Two-phase entry point: [`Newsroom::setup`] once, [`Newsroom::run`] per request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use newsdesk_bedrock::{
    BedrockClient, Credentials, KnowledgeBaseSettings, KnowledgeRetriever, TextGenerator,
    resolve_knowledge_base_id, resolve_model_arn,
};
use newsdesk_handlers::Gateway;
use newsdesk_shared::{AppConfig, NewsdeskError, RawInput, Result, RunId, bare_tool_name};

use crate::assistant::{MEDIA_ASSISTANT_TOOL, MediaAssistant};
use crate::extractor::EntityExtractor;
use crate::query::ResearchQueryBuilder;
use crate::retriever::ResearchRetriever;
use crate::reviewer::ArticleReviewer;
use crate::supervisor::{RunOutcome, StageObserver, Supervisor};
use crate::tools::{self, AgentTool, BedrockAgentTools};
use crate::writer::ArticleWriter;

/// One invocation payload: `{"query": "...", "session_id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl InvocationRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: None,
        }
    }

    /// Read a payload, reporting a missing or non-string `query` by name.
    pub fn from_value(payload: &Value) -> Result<Self> {
        let query = payload
            .get("query")
            .and_then(Value::as_str)
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| NewsdeskError::malformed("query"))?;
        let session_id = payload
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self {
            query: query.to_string(),
            session_id,
        })
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// Immutable pipeline context shared by every run.
pub struct Newsroom {
    tools: BedrockAgentTools,
    assistant: MediaAssistant,
    knowledge: Arc<dyn KnowledgeRetriever>,
}

impl Newsroom {
    /// Resolve credentials and knowledge base parameters and build every
    /// component. Nothing here is repeated per run.
    #[instrument(skip_all, fields(region = %config.aws.region))]
    pub fn setup(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let credentials = Credentials::resolve(&config.aws)?;
        let settings = KnowledgeBaseSettings {
            knowledge_base_id: resolve_knowledge_base_id(&config.knowledge_base)?,
            model_arn: resolve_model_arn(&config.aws, &config.knowledge_base)?,
            number_of_results: config.knowledge_base.number_of_results,
            search_type: config.knowledge_base.search_type.clone(),
        };
        let client = BedrockClient::new(&config.aws, credentials)?;

        info!(
            kb = %settings.knowledge_base_id,
            results = settings.number_of_results,
            search = %settings.search_type,
            "newsroom ready"
        );

        Ok(Self::with_services(
            config,
            Arc::new(client.clone()),
            Arc::new(client),
            settings,
        ))
    }

    /// Build from already-constructed services.
    pub fn with_services(
        config: &AppConfig,
        generator: Arc<dyn TextGenerator>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        settings: KnowledgeBaseSettings,
    ) -> Self {
        let models = &config.models;
        let assistant = MediaAssistant::new(
            generator.clone(),
            models.assistant.clone(),
            Gateway::new(knowledge.clone(), settings.knowledge_base_id.clone()),
        );
        let tools = BedrockAgentTools {
            extractor: EntityExtractor::new(generator.clone(), models.extraction.clone()),
            query_builder: ResearchQueryBuilder::new(
                generator.clone(),
                models.research_query.clone(),
            ),
            retriever: ResearchRetriever::new(knowledge.clone(), settings),
            writer: ArticleWriter::new(
                generator.clone(),
                models.writer.clone(),
                config.writer.target_words,
            ),
            reviewer: ArticleReviewer::new(generator, models.reviewer.clone()),
        };
        Self {
            tools,
            assistant,
            knowledge,
        }
    }

    /// Run the full pipeline for one request.
    pub async fn run(
        &self,
        request: &InvocationRequest,
        observer: &dyn StageObserver,
    ) -> Result<RunOutcome> {
        let input = RawInput::new(request.query.as_str())?;
        let run_id = RunId::new();
        Supervisor::new(&self.tools, observer)
            .run(run_id, &input, request.session_id.as_deref())
            .await
    }

    /// Answer one media question from show details and ratings.
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.assistant.answer(question).await
    }

    /// Invoke one agent tool by name.
    pub async fn invoke_tool(&self, name: &str, args: &Value) -> Result<String> {
        if bare_tool_name(name) == MEDIA_ASSISTANT_TOOL {
            return self.ask(MediaAssistant::argument(args)?).await;
        }
        tools::invoke_tool(&self.tools, name, args).await
    }

    /// Descriptions of every agent tool.
    pub fn tool_specs(&self) -> Vec<Value> {
        tool_specs()
    }

    /// Knowledge base service, for callers that query it directly.
    pub fn knowledge(&self) -> Arc<dyn KnowledgeRetriever> {
        self.knowledge.clone()
    }

    pub fn knowledge_base(&self) -> &KnowledgeBaseSettings {
        self.tools.retriever.settings()
    }
}

/// Descriptions of the pipeline tools followed by the media assistant.
pub fn tool_specs() -> Vec<Value> {
    AgentTool::ALL
        .iter()
        .map(AgentTool::spec)
        .chain(std::iter::once(MediaAssistant::spec()))
        .collect()
}
