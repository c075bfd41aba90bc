use std::future::Future;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::{json, Value};
use tracing::debug;

use promptlayer_core::{
    BlueprintMetadata, PromptLayerError, StreamFormat, StreamingYield, TrackResponse,
};

use crate::{build_blueprint, normalize};

pub type EventStream = BoxStream<'static, Result<Value, PromptLayerError>>;

/// A provider's live event feed.
pub struct EventFeed {
    events: EventStream,
    response_metadata: Option<Value>,
}

impl EventFeed {
    pub fn new<S>(events: S) -> Self
    where
        S: Stream<Item = Result<Value, PromptLayerError>> + Send + 'static,
    {
        Self {
            events: events.boxed(),
            response_metadata: None,
        }
    }

    /// Bedrock hands back `{ $metadata, stream }`; the unwrapped stream is
    /// consumed and `$metadata` is re-attached to the aggregated response as
    /// `ResponseMetadata`.
    pub fn bedrock<S>(metadata: Option<Value>, events: S) -> Self
    where
        S: Stream<Item = Result<Value, PromptLayerError>> + Send + 'static,
    {
        Self {
            events: events.boxed(),
            response_metadata: Some(metadata.unwrap_or_else(|| json!({}))),
        }
    }
}

struct Session<F> {
    events: EventStream,
    response_metadata: Option<Value>,
    format: StreamFormat,
    metadata: BlueprintMetadata,
    buffer: Vec<Value>,
    finalize: F,
}

impl<F, Fut> Session<F>
where
    F: FnOnce(Value) -> Fut,
    Fut: Future<Output = Result<Option<TrackResponse>, PromptLayerError>>,
{
    async fn finish(self) -> Result<StreamingYield, PromptLayerError> {
        let mut aggregated = normalize(self.format, &self.buffer);
        if let Some(response_metadata) = self.response_metadata {
            aggregated["ResponseMetadata"] = response_metadata;
        }
        debug!(
            events = self.buffer.len(),
            format = ?self.format,
            "provider stream exhausted, tracking aggregated response"
        );

        match (self.finalize)(aggregated.clone()).await? {
            Some(tracked) => Ok(StreamingYield {
                request_id: Some(tracked.request_id),
                raw_response: None,
                prompt_blueprint: tracked.prompt_blueprint,
            }),
            None => Ok(StreamingYield {
                request_id: None,
                raw_response: Some(aggregated),
                prompt_blueprint: None,
            }),
        }
    }
}

/// Relays a provider stream as [`StreamingYield`] records.
///
/// Each event is yielded with its blueprint fragment before the next one is
/// pulled. Once the feed ends the buffered events are normalized and handed
/// to `finalize`, and one closing record is yielded. A feed error is yielded
/// and ends the stream without calling `finalize`; so does dropping the
/// stream early.
pub fn stream_response<F, Fut>(
    feed: EventFeed,
    format: StreamFormat,
    metadata: BlueprintMetadata,
    finalize: F,
) -> BoxStream<'static, Result<StreamingYield, PromptLayerError>>
where
    F: FnOnce(Value) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Option<TrackResponse>, PromptLayerError>> + Send + 'static,
{
    let session = Session {
        events: feed.events,
        response_metadata: feed.response_metadata,
        format,
        metadata,
        buffer: Vec::new(),
        finalize,
    };

    stream::unfold(Some(session), |state| async move {
        let Some(mut session) = state else {
            return None;
        };
        match session.events.next().await {
            Some(Ok(event)) => {
                let blueprint = build_blueprint(session.format, &event, &session.metadata);
                session.buffer.push(event.clone());
                Some((Ok(StreamingYield::progress(event, Some(blueprint))), Some(session)))
            }
            Some(Err(err)) => {
                debug!(error = %err, "provider stream failed");
                Some((Err(err), None))
            }
            None => Some((session.finish().await, None)),
        }
    })
    .boxed()
}
