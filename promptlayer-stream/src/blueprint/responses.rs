use serde_json::Value;

use promptlayer_core::json::{non_null, opt_str, str_field};
use promptlayer_core::{AssistantMessage, ContentBlock, ToolCall};

/// Responses API event. Every fragment carries the `item_id` of the output
/// item it belongs to.
pub(super) fn event(event: &Value) -> AssistantMessage {
    let mut message = AssistantMessage::default();
    let item_id = opt_str(event, "item_id").map(str::to_string);

    match str_field(event, "type") {
        "response.output_item.added" => {
            let item = non_null(event, "item").unwrap_or(&Value::Null);
            let id = opt_str(item, "id").map(str::to_string);
            match str_field(item, "type") {
                "message" => message.content.push(ContentBlock::text("").with_item_id(id)),
                "reasoning" => message
                    .content
                    .push(ContentBlock::thinking("", "").with_item_id(id)),
                "function_call" => message.tool_calls.push(
                    ToolCall::new(
                        str_field(item, "call_id"),
                        str_field(item, "name"),
                        Value::String(String::new()),
                    )
                    .with_item_id(id),
                ),
                _ => {}
            }
        }
        "response.output_text.delta" => message
            .content
            .push(ContentBlock::text(str_field(event, "delta")).with_item_id(item_id)),
        "response.reasoning_summary_text.delta" => message
            .content
            .push(ContentBlock::thinking(str_field(event, "delta"), "").with_item_id(item_id)),
        "response.function_call_arguments.delta" => message.tool_calls.push(
            ToolCall::new("", "", Value::String(str_field(event, "delta").to_string()))
                .with_item_id(item_id),
        ),
        _ => {}
    }

    message
}
