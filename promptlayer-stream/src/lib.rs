//! Folds provider stream events into canonical blueprints and aggregated
//! responses.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use promptlayer_core::{BlueprintMetadata, PromptLayerError, StreamFormat, TrackResponse};
//! use promptlayer_stream::{stream_response, EventFeed};
//! use serde_json::{json, Value};
//!
//! # async fn demo() {
//! let events = futures::stream::iter(vec![Ok(json!({"choices": [{"delta": {"content": "Hi"}}]}))]);
//! let feed = EventFeed::new(events);
//! let metadata = BlueprintMetadata::new("openai", "gpt-4o");
//! let mut yields = stream_response(feed, StreamFormat::OpenAiChat, metadata, |_aggregated: Value| async {
//!     Ok::<_, PromptLayerError>(Some(TrackResponse {
//!         request_id: 1,
//!         prompt_blueprint: None,
//!     }))
//! });
//! while let Some(record) = yields.next().await {
//!     println!("{:?}", record);
//! }
//! # }
//! ```
pub mod blueprint;
pub mod normalize;
mod orchestrator;
mod route;

pub use blueprint::build_blueprint;
pub use normalize::normalize;
pub use orchestrator::{stream_response, EventFeed, EventStream};
pub use route::{format_for_function, ProviderOverrides, ProviderSettings, Route};
