use serde_json::{Map, Value};

use promptlayer_core::json::{array_field, non_null, str_field};
use promptlayer_core::{AssistantMessage, ContentBlock, ToolCall};

pub(super) fn event(event: &Value) -> AssistantMessage {
    let mut message = AssistantMessage::default();

    for candidate in array_field(event, "candidates") {
        let Some(parts) = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for part in parts {
            match part.get("text").and_then(Value::as_str) {
                Some(text) if !text.is_empty() => {
                    let block = if part.get("thought").and_then(Value::as_bool) == Some(true) {
                        ContentBlock::thinking(text, str_field(part, "thoughtSignature"))
                    } else {
                        ContentBlock::text(text)
                    };
                    message.content.push(block);
                }
                _ => {
                    if let Some(call) = non_null(part, "functionCall") {
                        let args = non_null(call, "args")
                            .cloned()
                            .unwrap_or_else(|| Value::Object(Map::new()));
                        message.tool_calls.push(ToolCall::new(
                            str_field(call, "id"),
                            str_field(call, "name"),
                            args,
                        ));
                    }
                }
            }
        }
    }

    message
}
