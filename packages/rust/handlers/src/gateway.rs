//! Gateway tool handler: `get_title_rating` and `get_show_detail`.
//!
//! The gateway prefixes tool names with its target (`target___tool`); the
//! prefix is dropped before dispatch.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, instrument};

use newsdesk_bedrock::KnowledgeRetriever;
use newsdesk_shared::{NewsdeskError, Result, bare_tool_name};

use crate::ratings::lookup_rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayTool {
    GetTitleRating,
    GetShowDetail,
}

impl GatewayTool {
    pub const ALL: [GatewayTool; 2] = [GatewayTool::GetTitleRating, GatewayTool::GetShowDetail];

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetTitleRating => "get_title_rating",
            Self::GetShowDetail => "get_show_detail",
        }
    }

    pub fn argument_name(&self) -> &'static str {
        match self {
            Self::GetTitleRating => "title_id",
            Self::GetShowDetail => "query",
        }
    }

    pub fn spec(&self) -> Value {
        let (description, arg_description) = match self {
            Self::GetTitleRating => (
                "Look up the rating of a title by its id.",
                "The id of the title, e.g. aws567890",
            ),
            Self::GetShowDetail => (
                "Search the title knowledge base for shows matching a question or genre.",
                "A question about a specific title or genre",
            ),
        };
        let arg = self.argument_name();
        json!({
            "name": self.name(),
            "description": description,
            "inputSchema": {
                "type": "object",
                "properties": { arg: {"type": "string", "description": arg_description} },
                "required": [arg],
            }
        })
    }
}

impl FromStr for GatewayTool {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self> {
        let name = bare_tool_name(s);
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| NewsdeskError::UnknownTool(name.to_string()))
    }
}

fn argument<'a>(event: &'a Value, field: &str) -> Result<&'a str> {
    event
        .get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| NewsdeskError::malformed(field))
}

/// `get_title_rating`: needs no external service.
pub fn title_rating(event: &Value) -> Result<Value> {
    let title_id = argument(event, GatewayTool::GetTitleRating.argument_name())?;
    let rating = lookup_rating(title_id);
    info!(title_id, found = rating.is_found(), "title rating looked up");
    Ok(rating.to_value())
}

/// Dispatches gateway tools against one knowledge base.
pub struct Gateway {
    knowledge: Arc<dyn KnowledgeRetriever>,
    knowledge_base_id: String,
}

impl Gateway {
    pub fn new(knowledge: Arc<dyn KnowledgeRetriever>, knowledge_base_id: impl Into<String>) -> Self {
        Self {
            knowledge,
            knowledge_base_id: knowledge_base_id.into(),
        }
    }

    #[instrument(skip_all, fields(tool = %tool.name()))]
    pub async fn invoke(&self, tool: GatewayTool, event: &Value) -> Result<Value> {
        match tool {
            GatewayTool::GetTitleRating => title_rating(event),
            GatewayTool::GetShowDetail => self.show_detail(event).await,
        }
    }

    /// Snippet texts from a knowledge base `retrieve`, in rank order.
    async fn show_detail(&self, event: &Value) -> Result<Value> {
        let query = argument(event, GatewayTool::GetShowDetail.argument_name())?;
        let chunks = self
            .knowledge
            .retrieve(query, &self.knowledge_base_id)
            .await
            .map_err(|e| NewsdeskError::Retrieval(e.to_string()))?;

        info!(results = chunks.len(), "show detail retrieved");
        Ok(Value::Array(
            chunks.into_iter().map(|c| Value::String(c.text)).collect(),
        ))
    }
}
