use serde_json::{Map, Value};

use promptlayer_core::{ApiType, PromptLayerError, Provider, StreamFormat, TemplateType};

/// Tracked function name and stream format for a provider call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub provider: Provider,
    pub function_name: &'static str,
    pub format: StreamFormat,
}

impl Route {
    /// Looks up how calls to `provider` are tracked and normalized.
    ///
    /// Fails before any network call when the provider has no route for the
    /// template type.
    pub fn resolve(
        provider: Provider,
        api_type: ApiType,
        template: TemplateType,
        model_name: &str,
    ) -> Result<Self, PromptLayerError> {
        use StreamFormat::*;
        use TemplateType::{Chat, Completion};

        let (function_name, format) = match (provider, template) {
            (Provider::OpenAi, _) if api_type == ApiType::Responses => {
                ("openai.responses.create", OpenAiResponses)
            }
            (Provider::OpenAi, Chat) => ("openai.chat.completions.create", OpenAiChat),
            (Provider::OpenAi, Completion) => ("openai.completions.create", OpenAiCompletion),
            (Provider::AzureOpenAi, _) if api_type == ApiType::Responses => {
                ("openai.AzureOpenAI.responses.create", OpenAiResponses)
            }
            (Provider::AzureOpenAi, Chat) => {
                ("openai.AzureOpenAI.chat.completions.create", OpenAiChat)
            }
            (Provider::AzureOpenAi, Completion) => {
                ("openai.AzureOpenAI.completions.create", OpenAiCompletion)
            }
            (Provider::Anthropic | Provider::AnthropicBedrock, Chat) => {
                ("anthropic.messages.create", AnthropicMessages)
            }
            (Provider::Anthropic | Provider::AnthropicBedrock, Completion) => {
                ("anthropic.completions.create", AnthropicCompletion)
            }
            (Provider::Google, Chat) => ("google.convo.send_message", Google),
            (Provider::Google, Completion) => ("google.model.generate_content", Google),
            (Provider::VertexAi, Chat) if model_name.starts_with("claude") => {
                ("anthropic.messages.create", AnthropicMessages)
            }
            (Provider::VertexAi, Completion) if model_name.starts_with("claude") => {
                ("anthropic.completions.create", AnthropicCompletion)
            }
            (Provider::VertexAi, Chat) if model_name.starts_with("gemini") => {
                ("google.convo.send_message", Google)
            }
            (Provider::VertexAi, Completion) if model_name.starts_with("gemini") => {
                ("google.model.generate_content", Google)
            }
            (Provider::AmazonBedrock, _) => ("boto3.bedrock-runtime.converse", Bedrock),
            (Provider::Mistral, Chat) => ("mistral.client.chat", Mistral),
            (provider, template) => {
                return Err(PromptLayerError::unsupported(
                    provider.as_str(),
                    template.as_str(),
                ))
            }
        };

        Ok(Self {
            provider,
            function_name,
            format,
        })
    }
}

const FUNCTION_FORMATS: &[(&str, StreamFormat)] = &[
    ("openai.chat.completions.create", StreamFormat::OpenAiChat),
    ("openai.AzureOpenAI.chat.completions.create", StreamFormat::OpenAiChat),
    ("openai.completions.create", StreamFormat::OpenAiCompletion),
    ("openai.AzureOpenAI.completions.create", StreamFormat::OpenAiCompletion),
    ("openai.responses.create", StreamFormat::OpenAiResponses),
    ("openai.AzureOpenAI.responses.create", StreamFormat::OpenAiResponses),
    ("anthropic.messages.create", StreamFormat::AnthropicMessages),
    ("anthropic.completions.create", StreamFormat::AnthropicCompletion),
    ("google.convo.send_message", StreamFormat::Google),
    ("google.model.generate_content", StreamFormat::Google),
    ("boto3.bedrock-runtime.converse", StreamFormat::Bedrock),
    ("boto3.bedrock-runtime.converse_stream", StreamFormat::Bedrock),
    ("mistral.client.chat", StreamFormat::Mistral),
    ("mistral.chat.stream", StreamFormat::Mistral),
];

/// Stream format of a tracked function name, if it is one we know how to fold.
pub fn format_for_function(function_name: &str) -> Option<StreamFormat> {
    FUNCTION_FORMATS
        .iter()
        .find(|(name, _)| *name == function_name)
        .map(|(_, format)| *format)
}

/// Keys whose values are passed through untouched by camelCase conversion.
const CAMEL_CASE_PASSTHROUGH: &[&str] = &["function_declarations", "properties"];

/// Outgoing request arguments prepared for a provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderSettings {
    pub provider: Provider,
    pub kwargs: Map<String, Value>,
}

impl ProviderSettings {
    pub fn configure(
        provider: Provider,
        model_name: &str,
        llm_kwargs: &Map<String, Value>,
        stream: bool,
    ) -> Self {
        let mut kwargs = llm_kwargs.clone();
        kwargs.insert("stream".to_string(), Value::Bool(stream));

        if matches!(provider, Provider::Google | Provider::VertexAi)
            && model_name.starts_with("gemini")
        {
            kwargs = match convert_keys_to_camel_case(Value::Object(kwargs)) {
                Value::Object(map) => map,
                _ => Map::new(),
            };
        }

        if stream && provider.streams_usage() {
            kwargs.insert(
                "stream_options".to_string(),
                serde_json::json!({ "include_usage": true }),
            );
        }

        Self { provider, kwargs }
    }

    /// Points the call at a custom endpoint. Unset fields leave the kwargs
    /// untouched.
    pub fn with_overrides(mut self, overrides: &ProviderOverrides) -> Self {
        if let Some(base_url) = &overrides.base_url {
            self.kwargs
                .insert("baseURL".to_string(), Value::String(base_url.clone()));
        }
        if let Some(api_key) = &overrides.api_key {
            self.kwargs
                .insert("apiKey".to_string(), Value::String(api_key.clone()));
        }
        self
    }
}

/// Endpoint settings of a custom provider deployment.
#[derive(Clone, Default, PartialEq)]
pub struct ProviderOverrides {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderOverrides")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn convert_keys_to_camel_case(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.into_iter().map(convert_keys_to_camel_case).collect())
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let value = if CAMEL_CASE_PASSTHROUGH.contains(&key.as_str()) {
                        value
                    } else {
                        convert_keys_to_camel_case(value)
                    };
                    (snake_to_camel(&key), value)
                })
                .collect(),
        ),
        other => other,
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        match chars.peek() {
            Some(next) if ch == '_' && next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    out
}
