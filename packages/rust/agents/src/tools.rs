//! The three agent tools the supervisor coordinates.
//!
//! Each tool returns its output wrapped in its stage tag so the tagged text
//! can be handed to the next tool unchanged.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, instrument};

use newsdesk_shared::tags::{self, StageTag};
use newsdesk_shared::{NewsdeskError, RawInput, Result, bare_tool_name};

use crate::extractor::EntityExtractor;
use crate::query::ResearchQueryBuilder;
use crate::retriever::ResearchRetriever;
use crate::reviewer::ArticleReviewer;
use crate::writer::ArticleWriter;

// ---------------------------------------------------------------------------
// Tool names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentTool {
    Research,
    ArticleWriting,
    ArticleReviewer,
}

impl AgentTool {
    pub const ALL: [AgentTool; 3] = [
        AgentTool::Research,
        AgentTool::ArticleWriting,
        AgentTool::ArticleReviewer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Research => "researchAgent",
            Self::ArticleWriting => "articleWritingAgent",
            Self::ArticleReviewer => "articleReviewerAgent",
        }
    }

    /// The single string argument each tool takes.
    pub fn argument_name(&self) -> &'static str {
        match self {
            Self::Research => "news_facts",
            Self::ArticleWriting => "query",
            Self::ArticleReviewer => "article_text",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Research => {
                "Extracts people, organizations and products from news facts and gathers \
                 background research on them from the knowledge base. Returns the research \
                 in a <research_results> tag."
            }
            Self::ArticleWriting => {
                "Writes a news article from news facts and research, or revises an article \
                 to address review feedback. Returns the article in an <article> tag."
            }
            Self::ArticleReviewer => {
                "Reviews an article for clarity, accuracy and journalistic quality. Returns \
                 prioritized feedback in a <review_feedback> tag."
            }
        }
    }

    fn argument_description(&self) -> &'static str {
        match self {
            Self::Research => "The news facts to research (raw journalist notes)",
            Self::ArticleWriting => "The research data, facts, and any feedback for the article",
            Self::ArticleReviewer => "The complete article text to be reviewed",
        }
    }

    /// Tool description in the name / description / input schema shape.
    pub fn spec(&self) -> Value {
        let arg = self.argument_name();
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": {
                "type": "object",
                "properties": {
                    arg: {"type": "string", "description": self.argument_description()}
                },
                "required": [arg],
            }
        })
    }

    /// The required argument from a JSON argument object.
    pub fn argument<'a>(&self, args: &'a Value) -> Result<&'a str> {
        let arg = self.argument_name();
        args.get(arg)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| NewsdeskError::malformed(arg))
    }
}

impl FromStr for AgentTool {
    type Err = NewsdeskError;

    /// Accepts gateway-prefixed names (`target___researchAgent`).
    fn from_str(s: &str) -> Result<Self> {
        let name = bare_tool_name(s);
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| NewsdeskError::UnknownTool(name.to_string()))
    }
}

impl std::fmt::Display for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tool seam
// ---------------------------------------------------------------------------

/// The tool surface. Every method performs one stage of work and returns
/// tagged text.
#[async_trait]
pub trait AgentTools: Send + Sync {
    /// Extract, build a query and retrieve: `<research_results>`.
    async fn research(&self, news_facts: &str) -> Result<String>;
    /// Write or revise: `<article>`.
    async fn write(&self, query: &str) -> Result<String>;
    /// Critique: `<review_feedback>`.
    async fn review(&self, article_text: &str) -> Result<String>;
}

/// Dispatch one tool by name with a JSON argument object.
pub async fn invoke_tool(tools: &dyn AgentTools, name: &str, args: &Value) -> Result<String> {
    let tool: AgentTool = name.parse()?;
    let input = tool.argument(args)?;
    info!(tool = %tool, "invoking agent tool");
    match tool {
        AgentTool::Research => tools.research(input).await,
        AgentTool::ArticleWriting => tools.write(input).await,
        AgentTool::ArticleReviewer => tools.review(input).await,
    }
}

// ---------------------------------------------------------------------------
// Bedrock-backed tools
// ---------------------------------------------------------------------------

/// The tools built from the five components.
pub struct BedrockAgentTools {
    pub extractor: EntityExtractor,
    pub query_builder: ResearchQueryBuilder,
    pub retriever: ResearchRetriever,
    pub writer: ArticleWriter,
    pub reviewer: ArticleReviewer,
}

#[async_trait]
impl AgentTools for BedrockAgentTools {
    #[instrument(skip_all, name = "research_agent")]
    async fn research(&self, news_facts: &str) -> Result<String> {
        let input = RawInput::new(news_facts).map_err(|_| NewsdeskError::malformed("news_facts"))?;

        let extraction = self.extractor.extract(&input).await?;
        let query = self.query_builder.build(&extraction.text).await?;
        let research = self.retriever.retrieve(&query).await?;

        Ok(tags::wrap(StageTag::ResearchResults, &research.0))
    }

    #[instrument(skip_all, name = "article_writing_agent")]
    async fn write(&self, query: &str) -> Result<String> {
        let draft = self.writer.write(query, 0).await?;
        Ok(tags::wrap(StageTag::Article, draft.text()))
    }

    #[instrument(skip_all, name = "article_reviewer_agent")]
    async fn review(&self, article_text: &str) -> Result<String> {
        let article = tags::unwrap(StageTag::Article, article_text);
        let feedback = self.reviewer.review(&article, 0).await?;
        Ok(tags::wrap(StageTag::ReviewFeedback, feedback.text()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fakes::{ScriptedGenerator, ScriptedRetriever, ScriptedTools, kb_settings};
    use newsdesk_shared::ModelsConfig;

    const EXTRACTED: &str = "## Entities\n- entity_id: E1\n  text: Acme Corp\n  type: ORGANIZATION\n  subtype: Corporation\n  confidence: 0.95\n\n## New Facts\nAcme Corp announced a merger.";

    fn bedrock_tools(
        generator: Arc<ScriptedGenerator>,
        retriever: Arc<ScriptedRetriever>,
    ) -> BedrockAgentTools {
        let models = ModelsConfig::default();
        BedrockAgentTools {
            extractor: EntityExtractor::new(generator.clone(), models.extraction),
            query_builder: ResearchQueryBuilder::new(generator.clone(), models.research_query),
            retriever: ResearchRetriever::new(retriever, kb_settings()),
            writer: ArticleWriter::new(generator.clone(), models.writer, 800),
            reviewer: ArticleReviewer::new(generator, models.reviewer),
        }
    }

    #[test]
    fn names_round_trip_and_prefixes_are_stripped() {
        for tool in AgentTool::ALL {
            assert_eq!(tool.name().parse::<AgentTool>().unwrap(), tool);
        }
        assert_eq!(
            "newsdesk-target___articleReviewerAgent".parse::<AgentTool>().unwrap(),
            AgentTool::ArticleReviewer
        );
        let err = "summarizeAgent".parse::<AgentTool>().unwrap_err();
        assert_eq!(err.to_string(), "unknown tool: summarizeAgent");
    }

    #[test]
    fn spec_names_the_argument() {
        let spec = AgentTool::Research.spec();
        assert_eq!(spec["name"], "researchAgent");
        assert_eq!(spec["inputSchema"]["required"][0], "news_facts");
        assert_eq!(
            spec["inputSchema"]["properties"]["news_facts"]["type"],
            "string"
        );
    }

    #[tokio::test]
    async fn missing_argument_names_the_field() {
        let tools = ScriptedTools::new([], [], []);
        let err = invoke_tool(&tools, "articleWritingAgent", &json!({"text": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing required field: query");
        assert!(tools.calls().is_empty());
    }

    #[tokio::test]
    async fn research_tool_runs_three_stages_and_tags_output() {
        let generator = Arc::new(ScriptedGenerator::new([
            Ok(EXTRACTED.to_string()),
            Ok("Research Acme Corp.".to_string()),
        ]));
        let retriever = Arc::new(ScriptedRetriever::answering(Ok(
            "Acme Corp makes anvils.".to_string()
        )));
        let tools = bedrock_tools(generator.clone(), retriever.clone());

        let out = invoke_tool(&tools, "researchAgent", &json!({"news_facts": "Acme news"}))
            .await
            .unwrap();
        assert_eq!(out, "<research_results>Acme Corp makes anvils.</research_results>");

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].input, "Acme news");
        assert_eq!(calls[1].input, EXTRACTED);
        assert_eq!(retriever.queries().len(), 1);
    }

    #[tokio::test]
    async fn extraction_failure_stops_research() {
        let generator = Arc::new(ScriptedGenerator::new([Ok("no sections here".to_string())]));
        let retriever = Arc::new(ScriptedRetriever::answering(Ok("unused".to_string())));
        let tools = bedrock_tools(generator.clone(), retriever.clone());

        let err = tools.research("Acme news").await.unwrap_err();
        assert!(matches!(err, NewsdeskError::Extraction(_)));
        assert_eq!(generator.calls().len(), 1);
        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn query_failure_stops_before_retrieval() {
        let generator = Arc::new(ScriptedGenerator::new([
            Ok(EXTRACTED.to_string()),
            Err(NewsdeskError::Network("timed out".into())),
        ]));
        let retriever = Arc::new(ScriptedRetriever::answering(Ok("unused".to_string())));
        let tools = bedrock_tools(generator.clone(), retriever.clone());

        let err = tools.research("Acme news").await.unwrap_err();
        assert!(matches!(err, NewsdeskError::QueryBuild(_)));
        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn reviewer_tool_accepts_tagged_article() {
        let generator = Arc::new(ScriptedGenerator::new([Ok("Looks fine (minor).".to_string())]));
        let retriever = Arc::new(ScriptedRetriever::answering(Ok("unused".to_string())));
        let tools = bedrock_tools(generator.clone(), retriever);

        let out = tools.review("<article>Head\n\nBody</article>").await.unwrap();
        assert_eq!(out, "<review_feedback>Looks fine (minor).</review_feedback>");
        assert_eq!(generator.calls()[0].input, "Head\n\nBody");
    }
}
