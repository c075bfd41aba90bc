//! Shared types for PromptLayer request tracking.
//!
//! Provider events and aggregated responses stay as raw JSON; the canonical
//! prompt blueprint used for live progress and tracking is typed.
mod blueprint;
mod error;
pub mod json;
mod provider;
mod streaming;

pub use blueprint::{
    AssistantMessage, BlueprintMetadata, ContentBlock, FunctionCall, ModelMetadata,
    PromptBlueprint, PromptTemplate, Role, ToolCall,
};
pub use error::PromptLayerError;
pub use provider::{ApiType, Provider, StreamFormat, TemplateType};
pub use serde_json::Value;
pub use streaming::{StreamingYield, TrackResponse};
