use serde_json::{json, Map, Value};

use promptlayer_core::json::{array_field, non_null, opt_str, str_field};

/// Top-level fields copied from `response.created` when present.
const SEEDED_FIELDS: &[&str] = &[
    "id",
    "created_at",
    "model",
    "status",
    "parallel_tool_calls",
    "temperature",
    "tool_choice",
    "tools",
    "top_p",
    "truncation",
    "max_output_tokens",
    "previous_response_id",
    "store",
    "user",
    "metadata",
    "instructions",
    "text",
    "reasoning",
];

fn empty_response() -> Value {
    json!({
        "id": null,
        "object": "response",
        "created_at": null,
        "status": null,
        "error": null,
        "incomplete_details": null,
        "instructions": null,
        "max_output_tokens": null,
        "model": null,
        "output": [],
        "parallel_tool_calls": true,
        "previous_response_id": null,
        "reasoning": {},
        "store": true,
        "temperature": 1,
        "tool_choice": "auto",
        "tools": [],
        "top_p": 1,
        "truncation": "disabled",
        "usage": null,
        "user": null,
        "metadata": {},
    })
}

/// Output items that have been announced but not yet finished.
#[derive(Debug, Default)]
struct OpenItems {
    items: Vec<Value>,
}

impl OpenItems {
    fn open(&mut self, item: &Value) {
        let id = item.get("id").cloned().unwrap_or(Value::Null);
        let status = non_null(item, "status").cloned().unwrap_or(json!("in_progress"));
        let opened = match str_field(item, "type") {
            "reasoning" => json!({
                "type": "reasoning",
                "id": id,
                "summary": [],
                "status": status,
            }),
            "function_call" => json!({
                "type": "function_call",
                "id": id,
                "call_id": item.get("call_id").cloned().unwrap_or(Value::Null),
                "name": item.get("name").cloned().unwrap_or(Value::Null),
                "arguments": "",
                "status": status,
            }),
            "message" => json!({
                "type": "message",
                "id": id,
                "role": non_null(item, "role").cloned().unwrap_or(json!("assistant")),
                "content": [],
                "status": status,
            }),
            _ if item.is_object() => item.clone(),
            _ => return,
        };
        self.items.retain(|existing| existing.get("id") != opened.get("id"));
        self.items.push(opened);
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Map<String, Value>> {
        self.items
            .iter_mut()
            .find(|item| str_field(item, "id") == id)
            .and_then(Value::as_object_mut)
    }

    fn get_kind_mut(&mut self, id: &str, kind: &str) -> Option<&mut Map<String, Value>> {
        self.get_mut(id)
            .filter(|item| item.get("type").and_then(Value::as_str) == Some(kind))
    }

    /// The message named by `item_id`, or the first open message.
    fn message_mut(&mut self, item_id: Option<&str>) -> Option<&mut Map<String, Value>> {
        let is_message = |item: &Value| str_field(item, "type") == "message";
        let position = item_id
            .and_then(|id| {
                self.items
                    .iter()
                    .position(|item| is_message(item) && str_field(item, "id") == id)
            })
            .or_else(|| self.items.iter().position(is_message))?;
        self.items.get_mut(position).and_then(Value::as_object_mut)
    }

    fn summary_mut(&mut self, id: &str) -> Option<&mut Vec<Value>> {
        self.get_kind_mut(id, "reasoning")?
            .entry("summary")
            .or_insert_with(|| json!([]))
            .as_array_mut()
    }
}

/// The summary part at `index`. A part one past the end is opened on demand;
/// anything further out is ignored.
fn summary_slot(summary: &mut Vec<Value>, index: Option<usize>) -> Option<&mut Value> {
    let index = index?;
    if index == summary.len() {
        summary.push(json!({ "type": "summary_text", "text": "" }));
    }
    summary.get_mut(index)
}

fn summary_part(part: &Value) -> Value {
    json!({
        "type": non_null(part, "type").cloned().unwrap_or(json!("summary_text")),
        "text": non_null(part, "text").cloned().unwrap_or(json!("")),
    })
}

fn append_text(target: &mut Value, key: &str, delta: &str) {
    let mut text = str_field(target, key).to_string();
    text.push_str(delta);
    target[key] = Value::String(text);
}

/// The last content part of a message, when it is an `output_text` part.
fn last_output_text(message: &mut Map<String, Value>) -> Option<&mut Value> {
    message
        .get_mut("content")?
        .as_array_mut()?
        .last_mut()
        .filter(|part| str_field(part, "type") == "output_text")
}

/// Folds Responses API events into a `response` object.
pub fn responses(events: &[Value]) -> Value {
    let mut response = empty_response();
    let mut open = OpenItems::default();
    let mut output: Vec<Value> = Vec::new();
    let empty = json!({});

    for event in events {
        let item_id = str_field(event, "item_id");
        let summary_index = match event.get("summary_index") {
            None | Some(Value::Null) => Some(0),
            Some(index) => index.as_u64().and_then(|index| usize::try_from(index).ok()),
        };

        match str_field(event, "type") {
            "response.created" => {
                let seed = non_null(event, "response").unwrap_or(&empty);
                for field in SEEDED_FIELDS {
                    if let Some(value) = non_null(seed, field) {
                        response[*field] = value.clone();
                    }
                }
            }
            "response.in_progress" => {
                if let Some(status) = event.pointer("/response/status").filter(|s| !s.is_null()) {
                    response["status"] = status.clone();
                }
            }
            "response.output_item.added" => {
                open.open(non_null(event, "item").unwrap_or(&empty));
            }
            "response.reasoning_summary_part.added" => {
                if let Some(summary) = open.summary_mut(item_id) {
                    summary.push(summary_part(non_null(event, "part").unwrap_or(&empty)));
                }
            }
            "response.reasoning_summary_text.delta" => {
                let delta = str_field(event, "delta");
                if let Some(slot) = open
                    .summary_mut(item_id)
                    .and_then(|summary| summary_slot(summary, summary_index))
                {
                    append_text(slot, "text", delta);
                }
            }
            "response.reasoning_summary_text.done" => {
                let text = str_field(event, "text").to_string();
                if let Some(slot) = open
                    .summary_mut(item_id)
                    .and_then(|summary| summary_slot(summary, summary_index))
                {
                    slot["text"] = Value::String(text);
                }
            }
            "response.reasoning_summary_part.done" => {
                let part = summary_part(non_null(event, "part").unwrap_or(&empty));
                if let Some(slot) = open
                    .summary_mut(item_id)
                    .and_then(|summary| summary.get_mut(summary_index?))
                {
                    *slot = part;
                }
            }
            "response.function_call_arguments.delta" => {
                if let Some(item) = open.get_mut(item_id) {
                    let mut arguments = item
                        .get("arguments")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string();
                    arguments.push_str(str_field(event, "delta"));
                    item.insert("arguments".to_string(), Value::String(arguments));
                }
            }
            "response.function_call_arguments.done" => {
                if let Some(item) = open.get_mut(item_id) {
                    item.insert(
                        "arguments".to_string(),
                        json!(str_field(event, "arguments")),
                    );
                }
            }
            "response.content_part.added" => {
                let part = non_null(event, "part").unwrap_or(&empty);
                if let Some(message) = open.message_mut(opt_str(event, "item_id")) {
                    let content_part = json!({
                        "type": non_null(part, "type").cloned().unwrap_or(json!("output_text")),
                        "text": non_null(part, "text").cloned().unwrap_or(json!("")),
                        "annotations": non_null(part, "annotations").cloned().unwrap_or(json!([])),
                    });
                    if let Some(content) = message
                        .entry("content")
                        .or_insert_with(|| json!([]))
                        .as_array_mut()
                    {
                        content.push(content_part);
                    }
                }
            }
            "response.output_text.delta" => {
                if let Some(part) = open
                    .message_mut(opt_str(event, "item_id"))
                    .and_then(last_output_text)
                {
                    append_text(part, "text", str_field(event, "delta"));
                }
            }
            "response.output_text.done" => {
                let text = str_field(event, "text").to_string();
                if let Some(part) = open
                    .message_mut(opt_str(event, "item_id"))
                    .and_then(last_output_text)
                {
                    part["text"] = Value::String(text);
                }
            }
            "response.output_item.done" => {
                let done = non_null(event, "item").unwrap_or(&empty);
                let Some(item) = open.get_mut(str_field(done, "id")) else {
                    continue;
                };
                item.insert(
                    "status".to_string(),
                    non_null(done, "status").cloned().unwrap_or(json!("completed")),
                );
                let overrides: &[&str] = match str_field(done, "type") {
                    "reasoning" => &["summary"],
                    "function_call" => &["arguments", "call_id", "name"],
                    "message" => &["content", "role"],
                    _ => &[],
                };
                for key in overrides {
                    if let Some(value) = non_null(done, key) {
                        item.insert(key.to_string(), value.clone());
                    }
                }
                output.push(Value::Object(item.clone()));
            }
            "response.completed" | "response.failed" | "response.incomplete" => {
                let last = non_null(event, "response").unwrap_or(&empty);
                let status = non_null(last, "status")
                    .or_else(|| non_null(&response, "status"))
                    .cloned()
                    .unwrap_or(json!("completed"));
                response["status"] = status;
                for field in ["usage", "reasoning", "error", "incomplete_details"] {
                    if let Some(value) = non_null(last, field) {
                        response[field] = value.clone();
                    }
                }
                let finished = array_field(last, "output");
                if !finished.is_empty() {
                    output = finished.to_vec();
                }
            }
            _ => {}
        }
    }

    response["output"] = Value::Array(output);
    response
}
