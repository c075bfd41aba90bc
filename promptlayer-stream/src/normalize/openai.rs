use serde_json::{json, Map, Value};

use promptlayer_core::json::{array_field, first_of, str_field};

use super::{fragment_text, last_present};

#[derive(Debug)]
struct PendingToolCall {
    index: Option<u64>,
    id: String,
    kind: String,
    name: String,
    arguments: String,
}

impl PendingToolCall {
    fn into_value(self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind,
            "function": {
                "name": self.name,
                "arguments": self.arguments,
            }
        })
    }
}

/// Adds one `delta.tool_calls[]` entry, matching an open call by id, then by
/// index, then falling back to the most recent call.
fn merge_tool_delta(calls: &mut Vec<PendingToolCall>, delta: &Value) {
    let id = str_field(delta, "id");
    let index = delta.get("index").and_then(Value::as_u64);
    let function = delta.get("function").unwrap_or(&Value::Null);
    let name = fragment_text(function.get("name"));
    let arguments = fragment_text(function.get("arguments"));

    let existing = if !id.is_empty() {
        calls.iter().rposition(|call| call.id == id)
    } else if let Some(index) = index {
        calls.iter().rposition(|call| call.index == Some(index))
    } else {
        calls.len().checked_sub(1)
    };

    match existing.and_then(|position| calls.get_mut(position)) {
        Some(call) => {
            call.name.push_str(&name);
            call.arguments.push_str(&arguments);
        }
        None => {
            let kind = match str_field(delta, "type") {
                "" => "function",
                other => other,
            };
            calls.push(PendingToolCall {
                index,
                id: id.to_string(),
                kind: kind.to_string(),
                name,
                arguments,
            });
        }
    }
}

fn empty_chat() -> Value {
    json!({
        "id": "",
        "object": "chat.completion",
        "created": 0,
        "model": "",
        "choices": [],
    })
}

/// Folds chat completion chunks into a `chat.completion`.
pub fn chat(events: &[Value]) -> Value {
    let Some(last) = events.last() else {
        return empty_chat();
    };

    let mut content: Option<String> = None;
    let mut refusal: Option<String> = None;
    let mut function_call: Option<(String, String)> = None;
    let mut tool_calls: Vec<PendingToolCall> = Vec::new();

    for event in events {
        let Some(choice) = array_field(event, "choices").first() else {
            continue;
        };
        let delta = choice.get("delta").unwrap_or(&Value::Null);

        if let Some(text) = delta.get("content").and_then(Value::as_str) {
            content.get_or_insert_with(String::new).push_str(text);
        }
        if let Some(text) = delta.get("refusal").and_then(Value::as_str) {
            refusal.get_or_insert_with(String::new).push_str(text);
        }
        if let Some(call) = delta.get("function_call").filter(|call| call.is_object()) {
            let (name, arguments) = function_call.get_or_insert_with(Default::default);
            name.push_str(&fragment_text(call.get("name")));
            arguments.push_str(&fragment_text(call.get("arguments")));
        }
        if let Some(fragments) = first_of(delta, &["tool_calls", "toolCalls"]).and_then(Value::as_array) {
            for fragment in fragments {
                merge_tool_delta(&mut tool_calls, fragment);
            }
        }
    }

    let envelope = events
        .iter()
        .rev()
        .find(|event| !array_field(event, "choices").is_empty())
        .unwrap_or(last);
    let index = events
        .iter()
        .find_map(|event| array_field(event, "choices").first())
        .and_then(|choice| choice.get("index"))
        .cloned()
        .unwrap_or(json!(0));
    let finish_reason =
        last_present(events, &["/choices/0/finish_reason", "/choices/0/finishReason"]);

    let mut message = Map::new();
    message.insert("role".to_string(), json!("assistant"));
    message.insert("content".to_string(), json!(content));
    message.insert("refusal".to_string(), json!(refusal));
    if let Some((name, arguments)) = function_call {
        message.insert(
            "function_call".to_string(),
            json!({ "name": name, "arguments": arguments }),
        );
    }
    if !tool_calls.is_empty() {
        message.insert(
            "tool_calls".to_string(),
            Value::Array(tool_calls.into_iter().map(PendingToolCall::into_value).collect()),
        );
    }

    let mut response = json!({
        "id": envelope.get("id").cloned().unwrap_or(json!("")),
        "object": "chat.completion",
        "created": envelope.get("created").cloned().unwrap_or(json!(0)),
        "model": envelope.get("model").cloned().unwrap_or(json!("")),
        "choices": [{
            "index": index,
            "finish_reason": finish_reason,
            "logprobs": last_present(events, &["/choices/0/logprobs"]),
            "message": Value::Object(message),
        }],
    });
    let fingerprint = last_present(events, &["/system_fingerprint"]);
    if !fingerprint.is_null() {
        response["system_fingerprint"] = fingerprint;
    }
    let usage = last_present(events, &["/usage"]);
    if !usage.is_null() {
        response["usage"] = usage;
    }
    response
}

/// Folds legacy completion chunks into a `text_completion`.
pub fn completion(events: &[Value]) -> Value {
    let Some(last) = events.last() else {
        return json!({
            "id": "",
            "object": "text_completion",
            "created": 0,
            "model": "",
            "choices": [{"text": "", "index": 0, "finish_reason": "stop", "logprobs": null}],
        });
    };

    let text: String = events
        .iter()
        .filter_map(|event| array_field(event, "choices").first())
        .filter_map(|choice| choice.get("text").and_then(Value::as_str))
        .collect();
    let finish_reason = match last_present(events, &["/choices/0/finish_reason"]) {
        Value::Null => json!("stop"),
        reason => reason,
    };

    let mut response = json!({
        "id": last.get("id").cloned().unwrap_or(json!("")),
        "object": "text_completion",
        "created": last.get("created").cloned().unwrap_or(json!(0)),
        "model": last.get("model").cloned().unwrap_or(json!("")),
        "choices": [{
            "text": text,
            "index": 0,
            "finish_reason": finish_reason,
            "logprobs": last_present(events, &["/choices/0/logprobs"]),
        }],
    });
    for (key, pointer) in [("system_fingerprint", "/system_fingerprint"), ("usage", "/usage")] {
        let value = last_present(events, &[pointer]);
        if !value.is_null() {
            response[key] = value;
        }
    }
    response
}
