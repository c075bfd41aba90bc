use serde_json::{json, Map, Value};
use tracing::debug;

use promptlayer_core::json::{has_key, non_null, parse_json_or_empty, str_field};

use super::{child_object, last_present};

fn empty_message() -> Value {
    json!({
        "id": "",
        "type": "message",
        "role": "assistant",
        "model": "",
        "content": [],
        "stop_reason": null,
        "stop_sequence": null,
        "usage": {
            "input_tokens": 0,
            "output_tokens": 0,
            "cache_creation_input_tokens": 0,
            "cache_read_input_tokens": 0,
        },
    })
}

/// The content block between `content_block_start` and `content_block_stop`.
#[derive(Debug)]
struct OpenBlock {
    block: Map<String, Value>,
    kind: String,
    text: String,
    thinking: String,
    signature: String,
    input_json: String,
    citations: Vec<Value>,
}

impl OpenBlock {
    fn start(block: &Value) -> Self {
        let block = block.as_object().cloned().unwrap_or_default();
        let kind = block
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            block,
            kind,
            text: String::new(),
            thinking: String::new(),
            signature: String::new(),
            input_json: String::new(),
            citations: Vec::new(),
        }
    }

    fn is_tool(&self) -> bool {
        matches!(self.kind.as_str(), "tool_use" | "server_tool_use")
    }

    fn apply(&mut self, delta: &Value) {
        match self.kind.as_str() {
            "thinking" => {
                if has_key(delta, "signature") {
                    self.signature = str_field(delta, "signature").to_string();
                }
                self.thinking.push_str(str_field(delta, "thinking"));
            }
            "text" => {
                if str_field(delta, "type") == "citations_delta" {
                    if let Some(citation) = non_null(delta, "citation") {
                        self.citations.push(citation.clone());
                    }
                }
                self.text.push_str(str_field(delta, "text"));
            }
            _ if self.is_tool() => {
                if str_field(delta, "type") == "input_json_delta" {
                    self.input_json.push_str(str_field(delta, "partial_json"));
                }
            }
            _ => {}
        }
    }

    fn close(self) -> Value {
        let mut block = self.block;
        match self.kind.as_str() {
            "thinking" => {
                block.insert("signature".to_string(), Value::String(self.signature));
                block.insert("thinking".to_string(), Value::String(self.thinking));
            }
            "text" => {
                block.insert("text".to_string(), Value::String(self.text));
                let citations = if self.citations.is_empty() {
                    Value::Null
                } else {
                    Value::Array(self.citations)
                };
                block.insert("citations".to_string(), citations);
            }
            "tool_use" | "server_tool_use" => {
                block.insert("input".to_string(), parse_json_or_empty(&self.input_json));
            }
            _ => {}
        }
        Value::Object(block)
    }
}

/// Folds Messages API stream events into a `message`.
pub fn messages(events: &[Value]) -> Value {
    let mut response = empty_message();
    let mut current: Option<OpenBlock> = None;
    let empty = json!({});

    for event in events {
        match str_field(event, "type") {
            "message_start" => {
                if let Some(message) = event.get("message").filter(|m| m.is_object()) {
                    response = message.clone();
                    if !response["content"].is_array() {
                        response["content"] = json!([]);
                    }
                }
            }
            "content_block_start" => {
                if current.is_some() {
                    debug!("content block replaced before its stop event");
                }
                current = Some(OpenBlock::start(non_null(event, "content_block").unwrap_or(&empty)));
            }
            "content_block_delta" => {
                if let Some(block) = current.as_mut() {
                    block.apply(non_null(event, "delta").unwrap_or(&empty));
                }
            }
            "content_block_stop" => {
                if let Some(block) = current.take() {
                    if let Some(content) = response["content"].as_array_mut() {
                        content.push(block.close());
                    }
                }
            }
            "message_delta" => {
                if let Some(usage) = non_null(event, "usage") {
                    let output_tokens = usage.get("output_tokens").cloned().unwrap_or(json!(0));
                    if let Some(totals) = child_object(&mut response, "usage") {
                        totals.insert("output_tokens".to_string(), output_tokens);
                    }
                }
                let delta = non_null(event, "delta").unwrap_or(&empty);
                for key in ["stop_reason", "stop_sequence"] {
                    if let Some(value) = delta.get(key) {
                        response[key] = value.clone();
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(block) = current {
        debug!(kind = %block.kind, "dropping content block without a stop event");
    }
    response
}

/// Folds legacy Text Completions events into a `completion`.
pub fn completion(events: &[Value]) -> Value {
    let mut response = json!({
        "type": "completion",
        "id": "",
        "model": "",
        "completion": "",
        "stop_reason": null,
    });
    let Some(last) = events.last() else {
        return response;
    };

    let text: String = events.iter().map(|event| str_field(event, "completion")).collect();
    response["completion"] = Value::String(text);
    response["id"] = json!(str_field(last, "id"));
    response["model"] = json!(str_field(last, "model"));
    response["stop_reason"] = last_present(events, &["/stop_reason"]);
    response
}
