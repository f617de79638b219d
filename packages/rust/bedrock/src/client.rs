//! Shared HTTP plumbing for the Bedrock runtime and agent-runtime endpoints.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use newsdesk_shared::{AwsConfig, NewsdeskError, Result};

use crate::credentials::Credentials;

/// User-Agent string for Bedrock requests.
const USER_AGENT: &str = concat!("Newsdesk/", env!("CARGO_PKG_VERSION"));

/// Largest error body fragment echoed into an error message.
const MAX_ERROR_BODY: usize = 500;

/// Error payload returned by Bedrock endpoints.
#[derive(serde::Deserialize)]
struct ServiceErrorBody {
    #[serde(alias = "Message")]
    message: String,
}

/// Client for the text-generation and knowledge-base endpoints.
///
/// Built once at startup and shared by every component; cheap to clone.
#[derive(Debug, Clone)]
pub struct BedrockClient {
    http: Client,
    runtime_base: Url,
    agent_runtime_base: Url,
    credentials: Credentials,
}

impl BedrockClient {
    /// Build a client for the configured region (or endpoint overrides).
    pub fn new(aws: &AwsConfig, credentials: Credentials) -> Result<Self> {
        Self::with_endpoints(
            &aws.runtime_base(),
            &aws.agent_runtime_base(),
            credentials,
            Duration::from_secs(aws.request_timeout_secs),
        )
    }

    /// Build a client against explicit endpoints.
    pub fn with_endpoints(
        runtime_base: &str,
        agent_runtime_base: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NewsdeskError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            runtime_base: parse_base(runtime_base)?,
            agent_runtime_base: parse_base(agent_runtime_base)?,
            credentials,
        })
    }

    /// URL under the runtime endpoint; each segment is percent-encoded.
    pub(crate) fn runtime_url(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.runtime_base, segments)
    }

    /// URL under the agent-runtime endpoint; each segment is percent-encoded.
    pub(crate) fn agent_runtime_url(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.agent_runtime_base, segments)
    }

    /// POST a JSON body and decode a JSON response.
    pub(crate) async fn post_json<B, R>(&self, service: &'static str, url: Url, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(service, %url, "sending request");

        let response = self
            .http
            .post(url.clone())
            .header(reqwest::header::AUTHORIZATION, self.credentials.authorization())
            .json(body)
            .send()
            .await
            .map_err(|e| NewsdeskError::Network(format!("{service} {url}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NewsdeskError::Network(format!("{service}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(NewsdeskError::Service {
                service,
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            NewsdeskError::validation(format!(
                "{service}: unexpected response shape: {e} (got: {})",
                &text[..floor_char_boundary(&text, 200)]
            ))
        })
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| NewsdeskError::config(format!("invalid endpoint '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(NewsdeskError::config(format!("endpoint '{raw}' cannot be a base URL")));
    }
    Ok(url)
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| NewsdeskError::config(format!("endpoint '{base}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Prefer the service's `message` field, else a bounded slice of the body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body[..floor_char_boundary(body, MAX_ERROR_BODY)].trim().to_string(),
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
