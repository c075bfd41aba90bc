use serde_json::{json, Value};

use promptlayer_core::{AssistantMessage, BlueprintMetadata, ContentBlock, StreamFormat};
use promptlayer_stream::blueprint::event_message;
use promptlayer_stream::build_blueprint;

fn block(index: u64) -> Option<String> {
    Some(index.to_string())
}

fn fold(format: StreamFormat, events: &[Value]) -> AssistantMessage {
    let mut message = AssistantMessage::default();
    for event in events {
        message.absorb(event_message(format, event));
    }
    message
}

#[test]
fn blueprint_wraps_single_assistant_message_with_metadata() {
    let metadata = BlueprintMetadata::new("openai", "gpt-4o").with_api_type("chat-completions");
    let event = json!({"choices": [{"index": 0, "delta": {"content": "Hi"}}]});

    let blueprint = build_blueprint(StreamFormat::OpenAiChat, &event, &metadata);

    assert_eq!(blueprint.metadata, metadata);
    assert_eq!(blueprint.prompt_template.kind, "chat");
    let message = blueprint.message().expect("assistant message");
    assert_eq!(message.content, vec![ContentBlock::text("Hi")]);
    assert!(message.tool_calls.is_empty());
}

#[test]
fn openai_event_carries_only_its_own_fragment() {
    let first = event_message(
        StreamFormat::OpenAiChat,
        &json!({"choices": [{"delta": {"content": "He"}}]}),
    );
    let second = event_message(
        StreamFormat::OpenAiChat,
        &json!({"choices": [{"delta": {"content": "llo"}}]}),
    );

    assert_eq!(first.text(), "He");
    assert_eq!(second.text(), "llo");
}

#[test]
fn openai_tool_call_fragments_fold_into_one_call() {
    let events = vec![
        json!({"choices": [{"delta": {"tool_calls": [{"index": 0, "id": "call_1", "function": {"name": "lookup", "arguments": ""}}]}}]}),
        json!({"choices": [{"delta": {"tool_calls": [{"index": 0, "function": {"arguments": "{\"a\":"}}]}}]}),
        json!({"choices": [{"delta": {"tool_calls": [{"index": 0, "function": {"arguments": "1}"}}]}}]}),
    ];

    let message = fold(StreamFormat::OpenAiChat, &events);

    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].id, "call_1");
    assert_eq!(message.tool_calls[0].function.name, "lookup");
    assert_eq!(message.tool_calls[0].function.arguments, json!("{\"a\":1}"));
}

#[test]
fn mistral_events_are_read_from_data() {
    let event = json!({"data": {"choices": [{"delta": {"content": "Bonjour"}}]}});

    assert_eq!(event_message(StreamFormat::Mistral, &event).text(), "Bonjour");
}

#[test]
fn completion_events_become_text() {
    let openai = json!({"choices": [{"text": "Once"}]});
    let anthropic = json!({"completion": " upon"});

    assert_eq!(event_message(StreamFormat::OpenAiCompletion, &openai).text(), "Once");
    assert_eq!(event_message(StreamFormat::AnthropicCompletion, &anthropic).text(), " upon");
}

#[test]
fn anthropic_events_open_blocks_and_stream_deltas() {
    let events = vec![
        json!({"type": "message_start", "message": {"id": "msg_1"}}),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "thinking"}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "thinking_delta", "thinking": "Plan"}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "signature_delta", "signature": "sig"}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "content_block_start", "index": 1, "content_block": {"type": "text"}}),
        json!({"type": "content_block_delta", "index": 1, "delta": {"type": "text_delta", "text": "A"}}),
        json!({"type": "content_block_delta", "index": 1, "delta": {"type": "text_delta", "text": "B"}}),
        json!({"type": "content_block_stop", "index": 1}),
        json!({"type": "content_block_start", "index": 2, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "lookup"}}),
        json!({"type": "content_block_delta", "index": 2, "delta": {"type": "input_json_delta", "partial_json": "{\"q\":"}}),
        json!({"type": "content_block_delta", "index": 2, "delta": {"type": "input_json_delta", "partial_json": "1}"}}),
    ];

    assert!(event_message(StreamFormat::AnthropicMessages, &events[0]).is_empty());

    let message = fold(StreamFormat::AnthropicMessages, &events);

    assert_eq!(
        message.content,
        vec![
            ContentBlock::thinking("Plan", "sig").with_item_id(block(0)),
            ContentBlock::text("AB").with_item_id(block(1)),
        ]
    );
    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].id, "toolu_1");
    assert_eq!(message.tool_calls[0].item_id, block(2));
    assert_eq!(message.tool_calls[0].function.arguments, json!("{\"q\":1}"));
}

#[test]
fn anthropic_server_tool_use_is_reported_as_content() {
    let event = json!({
        "type": "content_block_start",
        "index": 0,
        "content_block": {"type": "server_tool_use", "id": "srvtoolu_1", "name": "web_search"},
    });

    let message = event_message(StreamFormat::AnthropicMessages, &event);

    assert_eq!(
        message.content,
        vec![ContentBlock::tool_use("srvtoolu_1", "web_search", json!({})).with_item_id(block(0))]
    );
    assert!(message.tool_calls.is_empty());
}

#[test]
fn anthropic_server_tool_input_stays_with_its_block() {
    let events = vec![
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "lookup"}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "{\"a\":1}"}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "content_block_start", "index": 1, "content_block": {"type": "server_tool_use", "id": "srvtoolu_1", "name": "web_search"}}),
        json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"query\":"}}),
        json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "\"rust\"}"}}),
        json!({"type": "content_block_stop", "index": 1}),
    ];

    let message = fold(StreamFormat::AnthropicMessages, &events);

    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].id, "toolu_1");
    assert_eq!(message.tool_calls[0].function.arguments, json!("{\"a\":1}"));
    assert_eq!(
        message.content,
        vec![ContentBlock::tool_use("srvtoolu_1", "web_search", json!("{\"query\":\"rust\"}"))
            .with_item_id(block(1))]
    );
}

#[test]
fn anthropic_text_blocks_split_by_tool_use_stay_separate() {
    let events = vec![
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text"}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Let me check."}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "lookup"}}),
        json!({"type": "content_block_stop", "index": 1}),
        json!({"type": "content_block_start", "index": 2, "content_block": {"type": "text"}}),
        json!({"type": "content_block_delta", "index": 2, "delta": {"type": "text_delta", "text": "Done."}}),
        json!({"type": "content_block_stop", "index": 2}),
    ];

    let message = fold(StreamFormat::AnthropicMessages, &events);

    assert_eq!(
        message.content,
        vec![
            ContentBlock::text("Let me check.").with_item_id(block(0)),
            ContentBlock::text("Done.").with_item_id(block(2)),
        ]
    );
    assert_eq!(message.tool_calls.len(), 1);
}

#[test]
fn google_parts_map_to_thinking_text_and_calls() {
    let event = json!({"candidates": [{"content": {"parts": [
        {"text": "hmm", "thought": true, "thoughtSignature": "sig"},
        {"text": "Answer"},
        {"functionCall": {"name": "lookup", "args": {"q": "x"}}},
    ]}}]});

    let message = event_message(StreamFormat::Google, &event);

    assert_eq!(
        message.content,
        vec![ContentBlock::thinking("hmm", "sig"), ContentBlock::text("Answer")]
    );
    assert_eq!(message.tool_calls[0].function.name, "lookup");
    assert_eq!(message.tool_calls[0].function.arguments, json!({"q": "x"}));
}

#[test]
fn bedrock_tool_stub_collects_input_fragments() {
    let events = vec![
        json!({"contentBlockStart": {"start": {"toolUse": {"toolUseId": "tooluse_1", "name": "lookup"}}}}),
        json!({"contentBlockDelta": {"delta": {"toolUse": {"input": "{\"q\":"}}}}),
        json!({"contentBlockDelta": {"delta": {"toolUse": {"input": "\"x\"}"}}}}),
        json!({"contentBlockStop": {}}),
        json!({"messageStop": {"stopReason": "tool_use"}}),
    ];

    let message = fold(StreamFormat::Bedrock, &events);

    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].id, "tooluse_1");
    assert_eq!(message.tool_calls[0].function.arguments, json!("{\"q\":\"x\"}"));
    assert!(message.content.is_empty());
}

#[test]
fn bedrock_blocks_are_kept_apart_by_index() {
    let events = vec![
        json!({"contentBlockDelta": {"contentBlockIndex": 0, "delta": {"text": "First"}}}),
        json!({"contentBlockStop": {"contentBlockIndex": 0}}),
        json!({"contentBlockStart": {"contentBlockIndex": 1, "start": {"toolUse": {"toolUseId": "tooluse_1", "name": "lookup"}}}}),
        json!({"contentBlockDelta": {"contentBlockIndex": 1, "delta": {"toolUse": {"input": "{}"}}}}),
        json!({"contentBlockStop": {"contentBlockIndex": 1}}),
        json!({"contentBlockDelta": {"contentBlockIndex": 2, "delta": {"text": "Second"}}}),
    ];

    let message = fold(StreamFormat::Bedrock, &events);

    assert_eq!(
        message.content,
        vec![
            ContentBlock::text("First").with_item_id(block(0)),
            ContentBlock::text("Second").with_item_id(block(2)),
        ]
    );
    assert_eq!(message.tool_calls[0].item_id, block(1));
    assert_eq!(message.tool_calls[0].function.arguments, json!("{}"));
}

#[test]
fn responses_fragments_are_tagged_with_item_ids() {
    let events = vec![
        json!({"type": "response.output_item.added", "item": {"type": "message", "id": "msg_1"}}),
        json!({"type": "response.output_text.delta", "item_id": "msg_1", "delta": "Hello"}),
        json!({"type": "response.output_item.added", "item": {"type": "message", "id": "msg_2"}}),
        json!({"type": "response.output_text.delta", "item_id": "msg_2", "delta": "Again"}),
        json!({"type": "response.output_item.added", "item": {"type": "function_call", "id": "fc_1", "call_id": "call_1", "name": "lookup"}}),
        json!({"type": "response.function_call_arguments.delta", "item_id": "fc_1", "delta": "{}"}),
    ];

    let message = fold(StreamFormat::OpenAiResponses, &events);

    assert_eq!(
        message.content,
        vec![
            ContentBlock::text("Hello").with_item_id(Some("msg_1".to_string())),
            ContentBlock::text("Again").with_item_id(Some("msg_2".to_string())),
        ]
    );
    assert_eq!(message.tool_calls.len(), 1);
    assert_eq!(message.tool_calls[0].id, "call_1");
    assert_eq!(message.tool_calls[0].item_id.as_deref(), Some("fc_1"));
    assert_eq!(message.tool_calls[0].function.arguments, json!("{}"));
}
