//! Endpoint handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use newsdesk_agents::{InvocationRequest, SilentObserver, tool_specs};
use newsdesk_handlers::{GatewayTool, handle_action_group};
use newsdesk_shared::{NewsdeskError, bare_tool_name};

use super::AppState;

/// Session id header set by the hosting agent runtime.
pub const SESSION_HEADER: &str = "x-amzn-bedrock-agentcore-runtime-session-id";

/// Failure reported to an HTTP caller as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// The body was not a JSON document.
    Body(String),
    Newsdesk(NewsdeskError),
}

impl From<NewsdeskError> for ApiError {
    fn from(err: NewsdeskError) -> Self {
        Self::Newsdesk(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::Newsdesk(NewsdeskError::MalformedRequest { .. }) => StatusCode::BAD_REQUEST,
            Self::Newsdesk(NewsdeskError::UnknownTool(_)) => StatusCode::NOT_FOUND,
            Self::Newsdesk(err) if err.is_stage_failure() => StatusCode::BAD_GATEWAY,
            Self::Newsdesk(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Body(text) => text.clone(),
            Self::Newsdesk(err) => {
                if err.is_internal() {
                    error!(error = %err, "request failed");
                } else {
                    warn!(error = %err, "request rejected");
                }
                err.caller_message()
            }
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

/// Health check.
pub async fn ping() -> Json<Value> {
    Json(json!({"status": "Healthy"}))
}

/// Run the full pipeline for one `{"query", "session_id"?}` payload.
/// A body `session_id` takes precedence over the session header.
pub async fn invocations(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let mut request = InvocationRequest::from_value(&payload)?;
    if request.session_id.is_none() {
        let header = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        request = request.with_session(header);
    }

    let outcome = tokio::time::timeout(
        state.invocation_timeout,
        state.newsroom.run(&request, &SilentObserver),
    )
    .await
    .map_err(|_| {
        NewsdeskError::Generation(format!(
            "invocation deadline of {}ms exceeded",
            state.invocation_timeout.as_millis()
        ))
    })??;

    info!(
        run_id = %outcome.run_id,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "invocation complete"
    );

    Ok(Json(json!({
        "article": outcome.article,
        "run_id": outcome.run_id.to_string(),
        "session_id": outcome.session_id,
    })))
}

/// Descriptions of the agent and gateway tools.
pub async fn list_tools() -> Json<Value> {
    let specs: Vec<Value> = tool_specs()
        .into_iter()
        .chain(GatewayTool::ALL.iter().map(GatewayTool::spec))
        .collect();
    Json(Value::Array(specs))
}

/// Invoke one tool; gateway tools are tried before agent tools.
pub async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(args) = payload?;

    let output = match name.parse::<GatewayTool>() {
        Ok(tool) => state.gateway.invoke(tool, &args).await?,
        Err(NewsdeskError::UnknownTool(_)) => {
            Value::String(state.newsroom.invoke_tool(&name, &args).await?)
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Json(json!({
        "tool": bare_tool_name(&name),
        "output": output,
    })))
}

/// Action-group events; error documents are returned in the body.
pub async fn action_group(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(event) = payload?;
    Ok(Json(handle_action_group(&event)))
}
