//! Shared types, error model, and configuration for Newsdesk.
//!
//! This crate is the foundation depended on by all other Newsdesk crates.
//! It provides:
//! - [`NewsdeskError`]: the unified error type
//! - Domain types ([`RawInput`], [`Entity`], [`Draft`], [`Feedback`], [`RunId`])
//! - Stage tags ([`StageTag`], [`tags::wrap`], [`tags::strip_all`])
//! - Configuration ([`AppConfig`], [`ModelProfile`], config loading)

pub mod config;
pub mod error;
pub mod tags;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AwsConfig, KnowledgeBaseConfig, ModelProfile, ModelsConfig, RuntimeConfig,
    WriterConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{NewsdeskError, OPAQUE_FAILURE, Result};
pub use tags::StageTag;
pub use types::{
    Draft, Entity, EntitySet, EntityType, Feedback, PriorityCounts, RawInput, ResearchQuery,
    ResearchResult, RunId, bare_tool_name,
};
