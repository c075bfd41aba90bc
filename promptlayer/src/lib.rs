//! PromptLayer request tracking for LLM provider clients.
//!
//! Wrap a [`ProviderClient`] in an [`InstrumentedClient`] and every call made
//! through it is posted to PromptLayer. Streamed calls are relayed event by
//! event and tracked once the provider stream ends.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use futures::StreamExt;
//! use promptlayer::{
//!     CallOutcome, InstrumentedClient, Intercepted, PromptLayerConfig, PromptLayerError, Provider,
//!     ProviderClient, TrackingClient,
//! };
//! use serde_json::{json, Value};
//!
//! struct OpenAi;
//!
//! #[async_trait]
//! impl ProviderClient for OpenAi {
//!     async fn invoke(&self, _method: &str, _args: Value) -> Result<CallOutcome, PromptLayerError> {
//!         Ok(CallOutcome::Ready(json!({"choices": []})))
//!     }
//! }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackingClient::new(PromptLayerConfig::from_env()?)?;
//! let client = InstrumentedClient::new(OpenAi, tracker, Provider::OpenAi, "openai");
//! let completions = client.scope("chat").scope("completions");
//! match completions
//!     .invoke("create", json!({"model": "gpt-4o", "messages": [], "return_pl_id": true}))
//!     .await?
//! {
//!     Intercepted::Response { request_id, .. } => println!("tracked as {request_id:?}"),
//!     Intercepted::Stream(mut records) => {
//!         while let Some(record) = records.next().await {
//!             println!("{:?}", record?);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
mod intercept;

pub use intercept::{CallOutcome, InstrumentedClient, Intercepted, ProviderClient};
pub use promptlayer_core::{
    ApiType, AssistantMessage, BlueprintMetadata, ContentBlock, PromptBlueprint,
    PromptLayerError, Provider, StreamFormat, StreamingYield, TemplateType, TrackResponse,
};
pub use promptlayer_stream::{EventFeed, ProviderOverrides, ProviderSettings, Route};
pub use promptlayer_track::{
    PromptLayerConfig, RetryPolicy, TrackError, TrackGroup, TrackMetadata, TrackPrompt,
    TrackRequest, TrackScore, TrackingClient,
};
