use serde_json::{Map, Value};

use promptlayer_core::json::{non_null, str_field};
use promptlayer_core::{AssistantMessage, ContentBlock, ToolCall};

use super::block_id;

/// Fragments are tagged with the block `index` so that separate blocks of
/// the same kind stay apart when folded.
pub(super) fn message_event(event: &Value) -> AssistantMessage {
    let mut message = AssistantMessage::default();
    let item_id = block_id(event.get("index"));

    match str_field(event, "type") {
        "content_block_start" => {
            let block = non_null(event, "content_block").unwrap_or(&Value::Null);
            let opened = match str_field(block, "type") {
                "thinking" => ContentBlock::thinking("", ""),
                "text" => ContentBlock::text(""),
                "tool_use" => {
                    message.tool_calls.push(
                        ToolCall::new(
                            str_field(block, "id"),
                            str_field(block, "name"),
                            Value::Object(Map::new()),
                        )
                        .with_item_id(item_id),
                    );
                    return message;
                }
                // Executed by the provider, so it is reported as content.
                "server_tool_use" => ContentBlock::tool_use(
                    str_field(block, "id"),
                    str_field(block, "name"),
                    Value::Object(Map::new()),
                ),
                _ => return message,
            };
            message.content.push(opened.with_item_id(item_id));
        }
        "content_block_delta" => {
            let delta = non_null(event, "delta").unwrap_or(&Value::Null);
            let fragment = match str_field(delta, "type") {
                "thinking_delta" => ContentBlock::thinking(str_field(delta, "thinking"), ""),
                "text_delta" => ContentBlock::text(str_field(delta, "text")),
                "signature_delta" => ContentBlock::thinking("", str_field(delta, "signature")),
                "input_json_delta" => {
                    message.tool_calls.push(
                        ToolCall::new(
                            "",
                            "",
                            Value::String(str_field(delta, "partial_json").to_string()),
                        )
                        .with_item_id(item_id),
                    );
                    return message;
                }
                _ => return message,
            };
            message.content.push(fragment.with_item_id(item_id));
        }
        _ => {}
    }

    message
}

pub(super) fn completion_event(event: &Value) -> AssistantMessage {
    let content = match str_field(event, "completion") {
        "" => Vec::new(),
        text => vec![ContentBlock::text(text)],
    };
    AssistantMessage::new(content, Vec::new())
}
