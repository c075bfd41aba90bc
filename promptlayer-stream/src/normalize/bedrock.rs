use std::mem;

use serde_json::{json, Value};

use promptlayer_core::json::{has_key, non_null, parse_json_or_empty, str_field};

/// Content accumulated since the last `contentBlockStop`.
#[derive(Debug, Default)]
struct OpenBlock {
    tool: Option<Value>,
    tool_input: String,
    text: String,
    thinking: String,
    signature: String,
}

impl OpenBlock {
    fn close(&mut self) -> Option<Value> {
        if let Some(mut tool) = self.tool.take() {
            tool["input"] = parse_json_or_empty(&mem::take(&mut self.tool_input));
            return Some(json!({ "toolUse": tool }));
        }
        if !self.text.is_empty() {
            return Some(json!({ "text": mem::take(&mut self.text) }));
        }
        if !self.thinking.is_empty() {
            return Some(json!({
                "reasoningContent": {
                    "reasoningText": {
                        "text": mem::take(&mut self.thinking),
                        "signature": mem::take(&mut self.signature),
                    }
                }
            }));
        }
        None
    }
}

/// Folds Converse stream events into a Converse response. `ResponseMetadata`
/// is left empty; the caller re-attaches the one from the stream envelope.
pub fn converse(events: &[Value]) -> Value {
    let mut content = Vec::new();
    let mut open = OpenBlock::default();
    let mut stop_reason = json!("end_turn");
    let mut usage = json!({});
    let mut metrics = json!({});

    for event in events {
        if let Some(start) = non_null(event, "contentBlockStart") {
            if let Some(tool) = start.pointer("/start/toolUse") {
                open.tool = Some(json!({
                    "toolUseId": tool.get("toolUseId").cloned().unwrap_or(json!("")),
                    "name": tool.get("name").cloned().unwrap_or(json!("")),
                }));
                open.tool_input.clear();
            }
        } else if let Some(delta) = event.pointer("/contentBlockDelta/delta") {
            if let Some(text) = delta.get("text").and_then(Value::as_str) {
                open.text.push_str(text);
            } else if let Some(reasoning) = non_null(delta, "reasoningContent") {
                open.thinking.push_str(str_field(reasoning, "text"));
                open.signature.push_str(str_field(reasoning, "signature"));
            } else if let Some(input) = delta.pointer("/toolUse/input").and_then(Value::as_str) {
                open.tool_input.push_str(input);
            }
        } else if has_key(event, "contentBlockStop") {
            content.extend(open.close());
        } else if let Some(stop) = non_null(event, "messageStop") {
            if let Some(reason) = non_null(stop, "stopReason") {
                stop_reason = reason.clone();
            }
        } else if let Some(metadata) = non_null(event, "metadata") {
            usage = non_null(metadata, "usage").cloned().unwrap_or_else(|| json!({}));
            metrics = non_null(metadata, "metrics").cloned().unwrap_or_else(|| json!({}));
        }
    }

    json!({
        "ResponseMetadata": {},
        "output": {
            "message": {
                "role": "assistant",
                "content": content,
            }
        },
        "stopReason": stop_reason,
        "usage": usage,
        "metrics": metrics,
    })
}
