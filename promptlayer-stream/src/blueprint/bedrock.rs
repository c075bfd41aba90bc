use serde_json::{Map, Value};

use promptlayer_core::json::{non_null, str_field};
use promptlayer_core::{AssistantMessage, ContentBlock, ToolCall};

use super::block_id;

pub(super) fn event(event: &Value) -> AssistantMessage {
    let mut message = AssistantMessage::default();

    if let Some(start) = non_null(event, "contentBlockStart") {
        if let Some(tool) = start.pointer("/start/toolUse") {
            message.tool_calls.push(
                ToolCall::new(
                    str_field(tool, "toolUseId"),
                    str_field(tool, "name"),
                    Value::Object(Map::new()),
                )
                .with_item_id(block_id(start.get("contentBlockIndex"))),
            );
        }
    } else if let Some(block) = non_null(event, "contentBlockDelta") {
        let item_id = block_id(block.get("contentBlockIndex"));
        let delta = block.get("delta").unwrap_or(&Value::Null);
        if let Some(text) = delta.get("text").and_then(Value::as_str) {
            message
                .content
                .push(ContentBlock::text(text).with_item_id(item_id));
        } else if let Some(reasoning) = non_null(delta, "reasoningContent") {
            message.content.push(
                ContentBlock::thinking(
                    str_field(reasoning, "text"),
                    str_field(reasoning, "signature"),
                )
                .with_item_id(item_id),
            );
        } else if let Some(input) = delta.pointer("/toolUse/input").and_then(Value::as_str) {
            message.tool_calls.push(
                ToolCall::new("", "", Value::String(input.to_string())).with_item_id(item_id),
            );
        }
    }

    message
}
