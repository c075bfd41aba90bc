use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use tracing::debug;

use promptlayer_core::{
    ApiType, BlueprintMetadata, PromptLayerError, Provider, StreamFormat, StreamingYield,
};
use promptlayer_stream::{format_for_function, stream_response, EventFeed};
use promptlayer_track::{TrackRequest, TrackingClient};

/// Arguments that only steer tracking and are never sent to the provider.
const RETURN_PL_ID: &str = "return_pl_id";
const PL_TAGS: &str = "pl_tags";

/// Request arguments that are not model parameters.
const NON_PARAMETER_ARGS: &[&str] = &["model", "messages", "input", "prompt", "contents", "stream"];

/// What a provider call handed back.
pub enum CallOutcome {
    Ready(Value),
    Deferred(BoxFuture<'static, Result<Value, PromptLayerError>>),
    Stream(EventFeed),
}

/// A vendor SDK client, addressed by dotted method path
/// (`chat.completions.create`).
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn invoke(&self, method_path: &str, args: Value) -> Result<CallOutcome, PromptLayerError>;
}

/// Result of an instrumented call.
pub enum Intercepted {
    Response {
        response: Value,
        /// Set when the call asked for `return_pl_id` and tracking succeeded.
        request_id: Option<u64>,
    },
    Stream(BoxStream<'static, Result<StreamingYield, PromptLayerError>>),
}

impl std::fmt::Debug for Intercepted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intercepted::Response {
                response,
                request_id,
            } => f
                .debug_struct("Response")
                .field("response", response)
                .field("request_id", request_id)
                .finish(),
            Intercepted::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

struct Shared<C> {
    inner: C,
    tracker: TrackingClient,
    provider: Provider,
}

/// Wraps a provider client so that every call through it is tracked.
///
/// The wrapper records the dotted function name of each call, for example
/// `openai.chat.completions.create` for
/// `client.scope("chat").scope("completions").invoke("create", args)`.
pub struct InstrumentedClient<C> {
    shared: Arc<Shared<C>>,
    prefix: String,
    path: Vec<String>,
}

impl<C> Clone for InstrumentedClient<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            prefix: self.prefix.clone(),
            path: self.path.clone(),
        }
    }
}

impl<C: ProviderClient> InstrumentedClient<C> {
    pub fn new(
        inner: C,
        tracker: TrackingClient,
        provider: Provider,
        function_prefix: impl Into<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner,
                tracker,
                provider,
            }),
            prefix: function_prefix.into(),
            path: Vec::new(),
        }
    }

    /// A handle for a nested API (`client.chat`, then `.completions`).
    pub fn scope(&self, segment: impl Into<String>) -> Self {
        let mut scoped = self.clone();
        scoped.path.push(segment.into());
        scoped
    }

    pub fn function_name(&self, method: &str) -> String {
        std::iter::once(self.prefix.as_str())
            .chain(self.path.iter().map(String::as_str))
            .chain(std::iter::once(method))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub async fn invoke(&self, method: &str, mut args: Value) -> Result<Intercepted, PromptLayerError> {
        let function_name = self.function_name(method);
        let provider = self.shared.provider;
        let (return_pl_id, tags) = strip_instrumentation(&mut args);
        let kwargs = args.as_object().cloned().unwrap_or_default();
        let format = format_for_function(&function_name);

        let streaming = kwargs.get("stream").and_then(Value::as_bool) == Some(true);
        if streaming && format.is_none() {
            return Err(PromptLayerError::unsupported(provider.as_str(), &function_name));
        }

        let request = TrackRequest::new(&function_name, kwargs)
            .with_provider(provider.as_str())
            .with_tags(tags)
            .with_return_pl_id(return_pl_id);
        let method_path = self
            .path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(method))
            .collect::<Vec<_>>()
            .join(".");

        match self.shared.inner.invoke(&method_path, args).await? {
            CallOutcome::Ready(response) => self.track(request, response).await,
            CallOutcome::Deferred(pending) => {
                let response = pending.await?;
                self.track(request, response).await
            }
            CallOutcome::Stream(feed) => {
                let Some(format) = format else {
                    return Err(PromptLayerError::unsupported(provider.as_str(), &function_name));
                };
                debug!(function_name = %function_name, "tracking streamed provider response");
                let metadata = blueprint_metadata(provider, format, &request.kwargs);
                let tracker = self.shared.tracker.clone();
                let stream = stream_response(feed, format, metadata, move |aggregated| async move {
                    let request = request.with_response(aggregated);
                    tracker
                        .track_request(&request)
                        .await
                        .map_err(PromptLayerError::from)
                });
                Ok(Intercepted::Stream(stream))
            }
        }
    }

    async fn track(&self, request: TrackRequest, response: Value) -> Result<Intercepted, PromptLayerError> {
        let request = request.with_response(response);
        let tracked = self.shared.tracker.track_request(&request).await?;
        let request_id = tracked
            .filter(|_| request.return_pl_id)
            .map(|tracked| tracked.request_id);
        Ok(Intercepted::Response {
            response: request.request_response,
            request_id,
        })
    }
}

/// Removes `return_pl_id` and `pl_tags` from the outgoing arguments.
fn strip_instrumentation(args: &mut Value) -> (bool, Vec<String>) {
    let Some(map) = args.as_object_mut() else {
        return (false, Vec::new());
    };
    let return_pl_id = map
        .remove(RETURN_PL_ID)
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let tags = map
        .remove(PL_TAGS)
        .and_then(|value| match value {
            Value::Array(tags) => Some(
                tags.into_iter()
                    .filter_map(|tag| tag.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default();
    (return_pl_id, tags)
}

fn blueprint_metadata(
    provider: Provider,
    format: StreamFormat,
    kwargs: &Map<String, Value>,
) -> BlueprintMetadata {
    let model = kwargs
        .get("model")
        .or_else(|| kwargs.get("modelId"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let parameters = kwargs
        .iter()
        .filter(|(key, _)| !NON_PARAMETER_ARGS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let metadata = BlueprintMetadata::new(provider.as_str(), model).with_parameters(parameters);
    match (provider, format) {
        (_, StreamFormat::OpenAiResponses) => metadata.with_api_type(ApiType::Responses.as_str()),
        (Provider::OpenAi | Provider::AzureOpenAi, _) => {
            metadata.with_api_type(ApiType::ChatCompletions.as_str())
        }
        _ => metadata,
    }
}
