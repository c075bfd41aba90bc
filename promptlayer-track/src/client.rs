use std::time::Duration;

use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

use promptlayer_core::json::first_of;
use promptlayer_core::{PromptLayerError, TrackResponse};

use crate::config::PromptLayerConfig;
use crate::request::{TrackGroup, TrackMetadata, TrackPrompt, TrackRequest, TrackScore};

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http error {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<TrackError> for PromptLayerError {
    fn from(err: TrackError) -> Self {
        match err {
            TrackError::InvalidArgument(message) => PromptLayerError::InvalidArgument(message),
            other => PromptLayerError::Tracking(other.to_string()),
        }
    }
}

/// A tracking endpoint and how its failures are reported.
struct Endpoint {
    path: &'static str,
    fallback: &'static str,
    context: &'static str,
}

const TRACK_REQUEST: Endpoint = Endpoint {
    path: "/track-request",
    fallback: "Failed to log request",
    context: "logging your request",
};
const TRACK_METADATA: Endpoint = Endpoint {
    path: "/library-track-metadata",
    fallback: "Failed to track metadata",
    context: "logging metadata to your request",
};
const TRACK_SCORE: Endpoint = Endpoint {
    path: "/library-track-score",
    fallback: "Failed to track score",
    context: "scoring your request",
};
const TRACK_PROMPT: Endpoint = Endpoint {
    path: "/library-track-prompt",
    fallback: "Failed to track prompt",
    context: "associating your request with a prompt template",
};
const TRACK_GROUP: Endpoint = Endpoint {
    path: "/track-group",
    fallback: "Failed to track group",
    context: "associating your request with a group",
};
const CREATE_GROUP: Endpoint = Endpoint {
    path: "/create-group",
    fallback: "Failed to create group",
    context: "creating a group",
};

/// Client for the PromptLayer tracking API.
///
/// Strictness is fixed by [`PromptLayerConfig::throw_on_error`]: a strict
/// client returns every failure, a lenient one logs it and reports `None` or
/// `false`. Argument validation errors are returned either way.
#[derive(Clone, Debug)]
pub struct TrackingClient {
    client: Client,
    config: PromptLayerConfig,
}

impl TrackingClient {
    pub fn new(config: PromptLayerConfig) -> Result<Self, TrackError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &PromptLayerConfig {
        &self.config
    }

    /// Posts a finished call. Returns the backend request id and the
    /// blueprint it rendered for the response.
    pub async fn track_request(
        &self,
        request: &TrackRequest,
    ) -> Result<Option<TrackResponse>, TrackError> {
        let Some(data) = self.post(&TRACK_REQUEST, request).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<TrackResponse>(data) {
            Ok(tracked) => Ok(Some(tracked)),
            Err(err) => self.settle(&TRACK_REQUEST, TrackError::InvalidResponse(err.to_string())),
        }
    }

    pub async fn track_metadata(&self, body: &TrackMetadata) -> Result<bool, TrackError> {
        Ok(self.post(&TRACK_METADATA, body).await?.is_some())
    }

    pub async fn track_score(&self, body: &TrackScore) -> Result<bool, TrackError> {
        if !(0..=100).contains(&body.score) {
            return Err(TrackError::InvalidArgument(
                "Score must be a number between 0 and 100.".to_string(),
            ));
        }
        Ok(self.post(&TRACK_SCORE, body).await?.is_some())
    }

    pub async fn track_prompt(&self, body: &TrackPrompt) -> Result<bool, TrackError> {
        if body.prompt_name.trim().is_empty() {
            return Err(TrackError::InvalidArgument(
                "Prompt name must not be empty.".to_string(),
            ));
        }
        Ok(self.post(&TRACK_PROMPT, body).await?.is_some())
    }

    pub async fn track_group(&self, body: &TrackGroup) -> Result<bool, TrackError> {
        Ok(self.post(&TRACK_GROUP, body).await?.is_some())
    }

    /// Creates a request group and returns its id.
    pub async fn create_group(&self) -> Result<Option<u64>, TrackError> {
        let Some(data) = self.post(&CREATE_GROUP, &json!({})).await? else {
            return Ok(None);
        };
        match data.get("id").and_then(Value::as_u64) {
            Some(id) => Ok(Some(id)),
            None => self.settle(
                &CREATE_GROUP,
                TrackError::InvalidResponse("missing group id".to_string()),
            ),
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: &T,
    ) -> Result<Option<Value>, TrackError> {
        let mut payload =
            serde_json::to_value(body).map_err(|err| TrackError::InvalidArgument(err.to_string()))?;
        match payload.as_object_mut() {
            Some(map) => {
                map.insert("api_key".to_string(), json!(self.config.api_key()));
            }
            None => {
                return Err(TrackError::InvalidArgument(
                    "tracking body must be a JSON object".to_string(),
                ))
            }
        }

        match self.send_with_retry(endpoint, &payload).await {
            Ok(data) => Ok(Some(data)),
            Err(err) => self.settle(endpoint, err),
        }
    }

    /// Applies the configured strictness to a tracking failure.
    fn settle<T>(&self, endpoint: &Endpoint, err: TrackError) -> Result<Option<T>, TrackError> {
        if self.config.throw_on_error {
            return Err(err);
        }
        warn!(
            endpoint = endpoint.path,
            error = %err,
            "While {}, PromptLayer experienced an error",
            endpoint.context
        );
        Ok(None)
    }

    async fn send_with_retry(&self, endpoint: &Endpoint, payload: &Value) -> Result<Value, TrackError> {
        let url = self.config.endpoint_url(endpoint.path);
        let policy = &self.config.retry;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let retries_left = (policy.max_retries + 1).saturating_sub(attempt);
            let request = self
                .client
                .post(&url)
                .header("X-API-KEY", self.config.api_key())
                .json(payload);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response.text().await?;
                        return Ok(serde_json::from_str(&text).unwrap_or(Value::Null));
                    }
                    if should_retry(status) {
                        warn!(
                            attempt,
                            retries_left,
                            status = status.as_u16(),
                            endpoint = endpoint.path,
                            "PromptLayer API request attempt failed"
                        );
                        if retries_left > 0 {
                            let delay = next_delay(status, response.headers(), policy.delay_for(attempt))
                                .min(policy.max_delay);
                            sleep(delay).await;
                            continue;
                        }
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(TrackError::Http {
                        status,
                        message: error_message(&body, endpoint.fallback),
                    });
                }
                Err(err) => {
                    if err.is_timeout() || err.is_connect() {
                        warn!(
                            attempt,
                            retries_left,
                            endpoint = endpoint.path,
                            error = %err,
                            "PromptLayer API request attempt failed"
                        );
                        if retries_left > 0 {
                            sleep(policy.delay_for(attempt)).await;
                            continue;
                        }
                    }
                    return Err(TrackError::Request(err));
                }
            }
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn next_delay(status: StatusCode, headers: &HeaderMap, computed: Duration) -> Duration {
    if status == StatusCode::TOO_MANY_REQUESTS {
        if let Some(value) = headers.get("Retry-After").and_then(|v| v.to_str().ok()) {
            if let Ok(seconds) = value.trim().parse::<u64>() {
                return Duration::from_secs(seconds);
            }
        }
    }
    computed
}

fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|data| first_of(data, &["message", "error"]))
        .map(|message| match message {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
