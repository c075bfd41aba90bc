use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use promptlayer_core::{BlueprintMetadata, PromptLayerError, StreamFormat, TrackResponse};
use promptlayer_stream::{stream_response, EventFeed};

fn chat_events() -> Vec<Value> {
    ["He", "llo", " world"]
        .iter()
        .map(|text| json!({"id": "c1", "model": "gpt-4o", "choices": [{"index": 0, "delta": {"content": text}}]}))
        .collect()
}

fn feed(events: Vec<Value>) -> EventFeed {
    EventFeed::new(stream::iter(events.into_iter().map(Ok)))
}

fn metadata() -> BlueprintMetadata {
    BlueprintMetadata::new("openai", "gpt-4o")
}

#[tokio::test]
async fn yields_one_record_per_event_then_a_final_record() {
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);

    let records: Vec<_> = stream_response(
        feed(chat_events()),
        StreamFormat::OpenAiChat,
        metadata(),
        move |aggregated: Value| async move {
            *sink.lock().expect("lock") = Some(aggregated);
            Ok(Some(TrackResponse {
                request_id: 42,
                prompt_blueprint: None,
            }))
        },
    )
    .collect()
    .await;

    assert_eq!(records.len(), 4);
    let texts: Vec<String> = records[..3]
        .iter()
        .map(|record| {
            let record = record.as_ref().expect("progress record");
            assert_eq!(record.request_id, None);
            assert!(!record.is_final());
            record
                .prompt_blueprint
                .as_ref()
                .and_then(|blueprint| blueprint.message())
                .map(|message| message.text())
                .unwrap_or_default()
        })
        .collect();
    assert_eq!(texts, vec!["He", "llo", " world"]);
    assert_eq!(
        records[1].as_ref().expect("progress").raw_response,
        Some(chat_events()[1].clone())
    );

    let last = records[3].as_ref().expect("final record");
    assert_eq!(last.request_id, Some(42));
    assert_eq!(last.raw_response, None);
    assert!(last.is_final());

    let aggregated = captured.lock().expect("lock").clone().expect("finalize called");
    assert_eq!(aggregated["choices"][0]["message"]["content"], "Hello world");
}

#[tokio::test]
async fn empty_feed_still_tracks_an_empty_response() {
    let records: Vec<_> = stream_response(
        feed(Vec::new()),
        StreamFormat::AnthropicMessages,
        BlueprintMetadata::new("anthropic", "claude-3-5-sonnet"),
        |aggregated: Value| async move {
            assert_eq!(aggregated["content"], json!([]));
            Ok(Some(TrackResponse {
                request_id: 7,
                prompt_blueprint: None,
            }))
        },
    )
    .collect()
    .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].as_ref().expect("final").request_id, Some(7));
}

#[tokio::test]
async fn lenient_tracking_failure_returns_aggregated_response() {
    let records: Vec<_> = stream_response(
        feed(chat_events()),
        StreamFormat::OpenAiChat,
        metadata(),
        |_aggregated: Value| async { Ok(None) },
    )
    .collect()
    .await;

    assert_eq!(records.len(), 4);
    let last = records[3].as_ref().expect("final record");
    assert_eq!(last.request_id, None);
    assert_eq!(last.prompt_blueprint, None);
    assert!(last.is_final());
    let aggregated = last.raw_response.as_ref().expect("aggregated response");
    assert_eq!(aggregated["choices"][0]["message"]["content"], "Hello world");
}

#[tokio::test]
async fn strict_tracking_failure_ends_with_error() {
    let mut records = stream_response(
        feed(chat_events()),
        StreamFormat::OpenAiChat,
        metadata(),
        |_aggregated: Value| async { Err(PromptLayerError::Tracking("backend unavailable".to_string())) },
    );

    for _ in 0..3 {
        assert!(records.next().await.expect("progress").is_ok());
    }
    let err = records.next().await.expect("final").expect_err("tracking error");
    assert!(matches!(err, PromptLayerError::Tracking(_)));
    assert!(records.next().await.is_none());
}

#[tokio::test]
async fn feed_error_is_yielded_once_without_tracking() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let events = stream::iter(vec![
        Ok(json!({"choices": [{"delta": {"content": "partial"}}]})),
        Err(PromptLayerError::ProviderFeed("connection reset".to_string())),
        Ok(json!({"choices": [{"delta": {"content": "never seen"}}]})),
    ]);

    let records: Vec<_> = stream_response(
        EventFeed::new(events),
        StreamFormat::OpenAiChat,
        metadata(),
        move |_aggregated: Value| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        },
    )
    .collect()
    .await;

    assert_eq!(records.len(), 2);
    assert!(records[0].is_ok());
    assert!(matches!(records[1], Err(PromptLayerError::ProviderFeed(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropping_the_stream_early_skips_tracking() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut records = stream_response(
        feed(chat_events()),
        StreamFormat::OpenAiChat,
        metadata(),
        move |_aggregated: Value| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        },
    );
    assert!(records.next().await.is_some());
    drop(records);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bedrock_response_metadata_is_reattached() {
    let events = vec![
        json!({"contentBlockDelta": {"delta": {"text": "Hi"}}}),
        json!({"contentBlockStop": {}}),
        json!({"messageStop": {"stopReason": "end_turn"}}),
    ];
    let metadata_envelope = json!({"httpStatusCode": 200, "requestId": "req-1"});
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);

    let records: Vec<_> = stream_response(
        EventFeed::bedrock(Some(metadata_envelope.clone()), stream::iter(events.into_iter().map(Ok))),
        StreamFormat::Bedrock,
        BlueprintMetadata::new("amazon.bedrock", "anthropic.claude-3-haiku"),
        move |aggregated: Value| async move {
            *sink.lock().expect("lock") = Some(aggregated);
            Ok(Some(TrackResponse {
                request_id: 1,
                prompt_blueprint: None,
            }))
        },
    )
    .collect()
    .await;

    assert_eq!(records.len(), 4);
    let aggregated = captured.lock().expect("lock").clone().expect("finalize called");
    assert_eq!(aggregated["ResponseMetadata"], metadata_envelope);
    assert_eq!(aggregated["output"]["message"]["content"][0]["text"], "Hi");
}
