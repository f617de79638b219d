//! HTTP surface for the article pipeline.
//!
//! - `GET /ping`: health
//! - `POST /invocations`: full research → write → review run
//! - `GET /tools`, `POST /tools/:name`: individual tools
//! - `POST /actions`: action-group events

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;

use newsdesk_agents::Newsroom;
use newsdesk_handlers::Gateway;
use newsdesk_shared::RuntimeConfig;

/// Shared state for the runtime.
#[derive(Clone)]
pub struct AppState {
    pub newsroom: Arc<Newsroom>,
    pub gateway: Arc<Gateway>,
    /// Deadline for one `/invocations` run.
    pub invocation_timeout: Duration,
}

impl AppState {
    pub fn new(newsroom: Newsroom, invocation_timeout: Duration) -> Self {
        let gateway = Gateway::new(
            newsroom.knowledge(),
            newsroom.knowledge_base().knowledge_base_id.clone(),
        );
        Self {
            newsroom: Arc::new(newsroom),
            gateway: Arc::new(gateway),
            invocation_timeout,
        }
    }
}

/// Start the runtime server.
pub async fn serve(newsroom: Newsroom, config: &RuntimeConfig) -> Result<()> {
    let state = AppState::new(
        newsroom,
        Duration::from_secs(config.invocation_timeout_secs),
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting runtime at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use newsdesk_bedrock::{
        Generation, GenerationRequest, KnowledgeBaseSettings, KnowledgeRetriever, RetrievedChunk,
        SynthesizedAnswer, TextGenerator,
    };
    use newsdesk_shared::{AppConfig, NewsdeskError};

    const EXTRACTED: &str = "## Entities\n\
        - entity_id: E1\n  text: Acme Corp\n  type: ORGANIZATION\n  confidence: 0.95\n\
        - entity_id: E2\n  text: Globex\n  type: ORGANIZATION\n  confidence: 0.9\n\n\
        ## New Facts\nAcme Corp announced a merger with Globex today.";

    /// Answers by model id, one canned reply per stage.
    struct StageGenerator {
        delay: Option<Duration>,
    }

    #[async_trait]
    impl TextGenerator for StageGenerator {
        async fn generate(&self, request: GenerationRequest<'_>) -> newsdesk_shared::Result<Generation> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let text = match request.profile.model_id.as_str() {
                "test.extraction" => EXTRACTED,
                "test.query" => "Research Acme Corp and Globex.",
                "test.writer" => "Headline: Acme and Globex Merge\n\nAcme Corp announced a merger with Globex today.",
                "test.reviewer" => "1. Add a quote from Globex (important)",
                "test.assistant" => "Ocean Drift is rated 8.91.",
                other => {
                    return Err(NewsdeskError::Network(format!("no reply for {other}")));
                }
            };
            Ok(Generation {
                text: text.to_string(),
                model: request.profile.model_id.clone(),
                tokens_in: 10,
                tokens_out: 20,
                latency_ms: 1,
                stop_reason: Some("end_turn".into()),
            })
        }
    }

    struct StaticKnowledge {
        answer: Option<String>,
    }

    #[async_trait]
    impl KnowledgeRetriever for StaticKnowledge {
        async fn retrieve_and_generate(
            &self,
            _query: &str,
            _settings: &KnowledgeBaseSettings,
        ) -> newsdesk_shared::Result<SynthesizedAnswer> {
            match &self.answer {
                Some(text) => Ok(SynthesizedAnswer {
                    text: text.clone(),
                    citation_count: 1,
                }),
                None => Err(NewsdeskError::Service {
                    service: "bedrock retrieveAndGenerate",
                    status: 404,
                    message: "knowledge base KB0042 not found".into(),
                }),
            }
        }

        async fn retrieve(
            &self,
            _query: &str,
            _knowledge_base_id: &str,
        ) -> newsdesk_shared::Result<Vec<RetrievedChunk>> {
            Ok(vec![RetrievedChunk {
                text: "Ocean Drift (aws567890): a sailing drama".into(),
                score: Some(0.7),
            }])
        }
    }

    fn test_app(answer: Option<&str>, delay: Option<Duration>, timeout: Duration) -> axum::Router {
        let mut config = AppConfig::default();
        config.models.extraction.model_id = "test.extraction".into();
        config.models.research_query.model_id = "test.query".into();
        config.models.writer.model_id = "test.writer".into();
        config.models.reviewer.model_id = "test.reviewer".into();
        config.models.assistant.model_id = "test.assistant".into();

        let settings = KnowledgeBaseSettings {
            knowledge_base_id: "KB0042".into(),
            model_arn: "arn:aws:bedrock:us-east-1::foundation-model/amazon.nova-micro-v1:0".into(),
            number_of_results: 5,
            search_type: "HYBRID".into(),
        };
        let newsroom = Newsroom::with_services(
            &config,
            Arc::new(StageGenerator { delay }),
            Arc::new(StaticKnowledge {
                answer: answer.map(str::to_string),
            }),
            settings,
        );
        create_router(AppState::new(newsroom, timeout))
    }

    fn app() -> axum::Router {
        test_app(
            Some("Acme Corp makes anvils. Globex makes widgets."),
            None,
            Duration::from_secs(30),
        )
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn ping_is_healthy() {
        let request = Request::builder().uri("/ping").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "Healthy"}));
    }

    #[tokio::test]
    async fn invocation_returns_article() {
        let (status, body) = send(
            app(),
            post(
                "/invocations",
                r#"{"query": "Acme Corp announced a merger with Globex today.", "session_id": "abc"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_id"], "abc");
        let article = body["article"].as_str().unwrap();
        assert!(article.starts_with("Acme and Globex Merge\n"));
        assert!(!article.contains("<article>"));
        assert!(!body["run_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_header_fills_missing_session_id() {
        let request = Request::builder()
            .method("POST")
            .uri("/invocations")
            .header("content-type", "application/json")
            .header(handlers::SESSION_HEADER, "runtime-session-9")
            .body(Body::from(r#"{"query": "Acme Corp announced a merger with Globex today."}"#))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_id"], "runtime-session-9");

        let request = Request::builder()
            .method("POST")
            .uri("/invocations")
            .header("content-type", "application/json")
            .header(handlers::SESSION_HEADER, "runtime-session-9")
            .body(Body::from(
                r#"{"query": "Acme Corp announced a merger with Globex today.", "session_id": "abc"}"#,
            ))
            .unwrap();
        let (_, body) = send(app(), request).await;
        assert_eq!(body["session_id"], "abc");
    }

    #[tokio::test]
    async fn missing_query_is_bad_request() {
        let (status, body) = send(app(), post("/invocations", r#"{"prompt": "hi"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing required field: query");

        let (status, _) = send(app(), post("/invocations", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn retrieval_failure_is_bad_gateway() {
        let app = test_app(None, None, Duration::from_secs(30));
        let (status, body) = send(app, post("/invocations", r#"{"query": "Acme merges."}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("retrieval failure:"));
        assert!(message.contains("knowledge base KB0042 not found"));
    }

    #[tokio::test]
    async fn expired_deadline_is_generation_failure() {
        let app = test_app(
            Some("unused"),
            Some(Duration::from_secs(5)),
            Duration::from_millis(50),
        );
        let (status, body) = send(app, post("/invocations", r#"{"query": "Acme merges."}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().starts_with("generation failure:"));
    }

    #[tokio::test]
    async fn tools_are_listed() {
        let request = Request::builder().uri("/tools").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|spec| spec["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "researchAgent",
                "articleWritingAgent",
                "articleReviewerAgent",
                "mediaAssistantAgent",
                "get_title_rating",
                "get_show_detail"
            ]
        );
    }

    #[tokio::test]
    async fn gateway_prefixed_rating_tool() {
        let (status, body) = send(
            app(),
            post("/tools/ratings-target___get_title_rating", r#"{"title_id": "aws567890"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tool"], "get_title_rating");
        assert_eq!(body["output"], json!({"title_id": "aws567890", "rating": "8.91"}));
    }

    #[tokio::test]
    async fn reviewer_tool_returns_tagged_feedback() {
        let (status, body) = send(
            app(),
            post(
                "/tools/articleReviewerAgent",
                r#"{"article_text": "<article>Acme and Globex Merge\n\nBody.</article>"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let output = body["output"].as_str().unwrap();
        assert!(output.starts_with("<review_feedback>"));
        assert!(output.ends_with("</review_feedback>"));
    }

    #[tokio::test]
    async fn media_assistant_tool_answers() {
        let (status, body) = send(
            app(),
            post("/tools/mediaAssistantAgent", r#"{"query": "Is Ocean Drift any good?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tool"], "mediaAssistantAgent");
        assert_eq!(body["output"], "Ocean Drift is rated 8.91.");

        let (status, body) = send(app(), post("/tools/mediaAssistantAgent", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing required field: query");
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let (status, body) = send(app(), post("/tools/x___get_cast", "{}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown tool: get_cast");
    }

    #[tokio::test]
    async fn action_group_event() {
        let (status, body) = send(
            app(),
            post(
                "/actions",
                r#"{"actionGroup": "ratings", "function": "get_title_rating",
                    "parameters": [{"name": "title_id", "type": "string", "value": "aws999999"}]}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["response"]["functionResponse"]["responseBody"]["TEXT"]["body"],
            "The function get_title_rating was called successfully, ratings are not available!"
        );
    }
}
