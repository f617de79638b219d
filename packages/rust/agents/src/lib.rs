//! The article generation pipeline for Newsdesk.
//!
//! Five single-call components (extractor, query builder, retriever, writer,
//! reviewer) are exposed as three agent tools and sequenced by the
//! [`Supervisor`] under a one-revision cap. A [`MediaAssistant`] answers title
//! questions over the gateway tools. [`Newsroom`] owns the configured
//! components and is the entry point for callers.

pub mod assistant;
pub mod extractor;
pub mod newsroom;
pub mod prompts;
pub mod query;
pub mod retriever;
pub mod reviewer;
pub mod supervisor;
pub mod tools;
pub mod writer;

#[cfg(test)]
pub(crate) mod fakes;

use newsdesk_shared::NewsdeskError;

pub use assistant::{MEDIA_ASSISTANT_TOOL, MediaAssistant};
pub use extractor::{EntityExtractor, Extraction};
pub use newsroom::{InvocationRequest, Newsroom, tool_specs};
pub use query::ResearchQueryBuilder;
pub use retriever::ResearchRetriever;
pub use reviewer::ArticleReviewer;
pub use supervisor::{
    MAX_REVISIONS, PipelineState, RunOutcome, SilentObserver, StageObserver, Supervisor,
    SupervisorState,
};
pub use tools::{AgentTool, AgentTools, BedrockAgentTools};
pub use writer::ArticleWriter;

/// Fold a service or validation error into one stage's failure variant,
/// keeping the originating message. Stage failures pass through unchanged.
pub(crate) fn stage_failure(
    err: NewsdeskError,
    stage: fn(String) -> NewsdeskError,
) -> NewsdeskError {
    match err {
        e if e.is_stage_failure() => e,
        NewsdeskError::Validation { message } => stage(message),
        other => stage(other.to_string()),
    }
}
