use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PromptLayerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openai.azure")]
    AzureOpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "anthropic.bedrock")]
    AnthropicBedrock,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "vertexai")]
    VertexAi,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "amazon.bedrock")]
    AmazonBedrock,
}

impl Provider {
    pub const ALL: [Provider; 8] = [
        Provider::OpenAi,
        Provider::AzureOpenAi,
        Provider::Anthropic,
        Provider::AnthropicBedrock,
        Provider::Google,
        Provider::VertexAi,
        Provider::Mistral,
        Provider::AmazonBedrock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::AzureOpenAi => "openai.azure",
            Provider::Anthropic => "anthropic",
            Provider::AnthropicBedrock => "anthropic.bedrock",
            Provider::Google => "google",
            Provider::VertexAi => "vertexai",
            Provider::Mistral => "mistral",
            Provider::AmazonBedrock => "amazon.bedrock",
        }
    }

    /// Providers that report token usage on the final stream chunk when asked.
    pub fn streams_usage(&self) -> bool {
        matches!(self, Provider::OpenAi | Provider::AzureOpenAi)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = PromptLayerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|provider| provider.as_str() == value)
            .ok_or_else(|| PromptLayerError::unsupported(value, "any"))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ApiType {
    #[default]
    #[serde(rename = "chat-completions")]
    ChatCompletions,
    #[serde(rename = "responses")]
    Responses,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::ChatCompletions => "chat-completions",
            ApiType::Responses => "responses",
        }
    }
}

impl FromStr for ApiType {
    type Err = PromptLayerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "chat-completions" => Ok(ApiType::ChatCompletions),
            "responses" => Ok(ApiType::Responses),
            other => Err(PromptLayerError::InvalidArgument(format!(
                "unknown api type '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Chat,
    Completion,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Chat => "chat",
            TemplateType::Completion => "completion",
        }
    }
}

/// Wire format of a provider's streamed events.
///
/// Selects both the per-event blueprint builder and the end-of-stream
/// normalizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamFormat {
    OpenAiChat,
    OpenAiCompletion,
    OpenAiResponses,
    AnthropicMessages,
    AnthropicCompletion,
    Google,
    Mistral,
    Bedrock,
}
