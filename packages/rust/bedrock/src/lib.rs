//! Amazon Bedrock service clients for Newsdesk.
//!
//! Two seams are exposed as traits so the agents can run against fakes:
//! [`TextGenerator`] (Converse) and [`KnowledgeRetriever`] (knowledge base
//! retrieve and retrieve-and-generate). [`BedrockClient`] implements both.

pub mod client;
pub mod converse;
pub mod credentials;
pub mod knowledge;

pub use client::BedrockClient;
pub use converse::{Generation, GenerationRequest, TextGenerator};
pub use credentials::{Credentials, resolve_knowledge_base_id, resolve_model_arn};
pub use knowledge::{KnowledgeBaseSettings, KnowledgeRetriever, RetrievedChunk, SynthesizedAnswer};
