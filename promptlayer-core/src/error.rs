use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptLayerError {
    #[error("Unsupported provider '{provider}' for template type '{template}'")]
    UnsupportedProvider { provider: String, template: String },
    #[error("Provider stream failed: {0}")]
    ProviderFeed(String),
    #[error("Tracking request failed: {0}")]
    Tracking(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl PromptLayerError {
    pub fn unsupported(provider: impl Into<String>, template: impl Into<String>) -> Self {
        PromptLayerError::UnsupportedProvider {
            provider: provider.into(),
            template: template.into(),
        }
    }
}
