use std::time::Duration;

// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    AzureOpenAi(AzureOpenAiProviderConfig),
}

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    /// Per-request limit. `None` waits for the model as long as it takes
    pub timeout: Option<Duration>,
}

/// A chat deployment on an Azure OpenAI resource
#[derive(Debug, Clone)]
pub struct AzureOpenAiProviderConfig {
    pub endpoint: String,
    /// Sent as the `api-key` header when present
    pub api_key: Option<String>,
    pub deployment: String,
    pub api_version: String,
    /// Per-request limit. `None` waits for the model as long as it takes
    pub timeout: Option<Duration>,
}

impl ProviderConfig {
    /// Model or deployment name, for logging
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAi(config) => &config.model,
            ProviderConfig::AzureOpenAi(config) => &config.deployment,
        }
    }
}
