//! Per-event blueprint builders.
//!
//! A builder looks at exactly one provider event and renders only the content
//! that event carries. Successive blueprints are progress narration; callers
//! that want the running transcript fold them with
//! [`AssistantMessage::absorb`](promptlayer_core::AssistantMessage::absorb).

mod anthropic;
mod bedrock;
mod google;
mod openai;
mod responses;

use serde_json::Value;

use promptlayer_core::{AssistantMessage, BlueprintMetadata, PromptBlueprint, StreamFormat};

/// Renders the fragment carried by a single event as an assistant message.
pub fn event_message(format: StreamFormat, event: &Value) -> AssistantMessage {
    match format {
        StreamFormat::OpenAiChat => openai::chat(event),
        StreamFormat::OpenAiCompletion => openai::completion(event),
        StreamFormat::OpenAiResponses => responses::event(event),
        StreamFormat::AnthropicMessages => anthropic::message_event(event),
        StreamFormat::AnthropicCompletion => anthropic::completion_event(event),
        StreamFormat::Google => google::event(event),
        StreamFormat::Mistral => openai::chat(event.get("data").unwrap_or(&Value::Null)),
        StreamFormat::Bedrock => bedrock::event(event),
    }
}

/// Correlation id for providers that address content blocks by position.
fn block_id(index: Option<&Value>) -> Option<String> {
    index.and_then(Value::as_u64).map(|index| index.to_string())
}

pub fn build_blueprint(
    format: StreamFormat,
    event: &Value,
    metadata: &BlueprintMetadata,
) -> PromptBlueprint {
    PromptBlueprint::from_message(event_message(format, event), metadata.clone())
}
