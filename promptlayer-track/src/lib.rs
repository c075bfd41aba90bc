//! Client for the PromptLayer request-tracking API.
//!
//! ```rust,no_run
//! use promptlayer_track::{PromptLayerConfig, TrackRequest, TrackingClient};
//! use serde_json::{json, Map};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TrackingClient::new(PromptLayerConfig::from_env()?)?;
//! let request = TrackRequest::new("openai.chat.completions.create", Map::new())
//!     .with_provider("openai")
//!     .with_response(json!({"choices": []}));
//! if let Some(tracked) = client.track_request(&request).await? {
//!     println!("tracked as {}", tracked.request_id);
//! }
//! # Ok(())
//! # }
//! ```
mod client;
mod config;
mod request;

pub use client::{TrackError, TrackingClient};
pub use config::{PromptLayerConfig, RetryPolicy, DEFAULT_API_URL};
pub use request::{TrackGroup, TrackMetadata, TrackPrompt, TrackRequest, TrackScore};
