//! End-of-stream normalizers.
//!
//! Each normalizer folds the complete, ordered list of provider events into the
//! object that provider would have returned for the same request without
//! streaming. An empty list produces a well-formed response with no content.

mod anthropic;
mod bedrock;
mod google;
mod mistral;
mod openai;
mod responses;

use serde_json::{Map, Value};

use promptlayer_core::StreamFormat;

pub use anthropic::{completion as anthropic_completion, messages as anthropic_messages};
pub use bedrock::converse as bedrock_converse;
pub use google::generate_content as google_generate_content;
pub use mistral::chat as mistral_chat;
pub use openai::{chat as openai_chat, completion as openai_completion};
pub use responses::responses as openai_responses;

pub fn normalize(format: StreamFormat, events: &[Value]) -> Value {
    match format {
        StreamFormat::OpenAiChat => openai_chat(events),
        StreamFormat::OpenAiCompletion => openai_completion(events),
        StreamFormat::OpenAiResponses => openai_responses(events),
        StreamFormat::AnthropicMessages => anthropic_messages(events),
        StreamFormat::AnthropicCompletion => anthropic_completion(events),
        StreamFormat::Google => google_generate_content(events),
        StreamFormat::Mistral => mistral_chat(events),
        StreamFormat::Bedrock => bedrock_converse(events),
    }
}

/// Value at the first matching pointer in the latest event that carries one.
pub(crate) fn last_present(events: &[Value], pointers: &[&str]) -> Value {
    events
        .iter()
        .rev()
        .find_map(|event| {
            pointers
                .iter()
                .find_map(|pointer| event.pointer(pointer).filter(|value| !value.is_null()))
        })
        .cloned()
        .unwrap_or(Value::Null)
}

/// Returns `parent[key]` as an object, replacing anything else found there.
pub(crate) fn child_object<'a>(parent: &'a mut Value, key: &str) -> Option<&'a mut Map<String, Value>> {
    let entry = parent
        .as_object_mut()?
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut()
}

/// Text of a streamed fragment; structured fragments are re-serialized.
pub(crate) fn fragment_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
