use serde_json::Value;

use promptlayer_core::json::{array_field, first_of, non_null, str_field};
use promptlayer_core::{AssistantMessage, ContentBlock, FunctionCall, ToolCall};

/// Chat chunk: text, tool-call and legacy function-call fragments of every choice.
pub(super) fn chat(event: &Value) -> AssistantMessage {
    let mut message = AssistantMessage::default();

    for choice in array_field(event, "choices") {
        let Some(delta) = non_null(choice, "delta") else {
            continue;
        };
        match delta.get("content").and_then(Value::as_str) {
            Some(text) if !text.is_empty() => message.content.push(ContentBlock::text(text)),
            _ => {}
        }

        let tool_calls = first_of(delta, &["tool_calls", "toolCalls"])
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for call in tool_calls {
            let Some(function) = non_null(call, "function") else {
                continue;
            };
            let arguments = non_null(function, "arguments")
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            message.tool_calls.push(ToolCall::new(
                str_field(call, "id"),
                str_field(function, "name"),
                arguments,
            ));
        }

        if let Some(call) = non_null(delta, "function_call") {
            message.function_call = Some(FunctionCall {
                name: str_field(call, "name").to_string(),
                arguments: Value::String(str_field(call, "arguments").to_string()),
            });
        }
    }

    message
}

/// Legacy completion chunk: the text of every choice.
pub(super) fn completion(event: &Value) -> AssistantMessage {
    let content = array_field(event, "choices")
        .iter()
        .filter_map(|choice| choice.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .map(ContentBlock::text)
        .collect();
    AssistantMessage::new(content, Vec::new())
}
