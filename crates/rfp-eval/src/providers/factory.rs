use super::{
    azure::AzureOpenAiProvider, base::Provider, configs::ProviderConfig, openai::OpenAiProvider,
};
use anyhow::Result;
use strum_macros::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProviderType {
    #[strum(serialize = "OpenAI")]
    OpenAi,
    #[strum(serialize = "Azure OpenAI")]
    AzureOpenAi,
}

impl ProviderConfig {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderConfig::OpenAi(_) => ProviderType::OpenAi,
            ProviderConfig::AzureOpenAi(_) => ProviderType::AzureOpenAi,
        }
    }
}

pub fn get_provider(config: ProviderConfig) -> Result<Box<dyn Provider>> {
    debug!("Creating {} provider for {}", config.provider_type(), config.model());
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Box::new(OpenAiProvider::new(openai_config)?)),
        ProviderConfig::AzureOpenAi(azure_config) => {
            Ok(Box::new(AzureOpenAiProvider::new(azure_config)?))
        }
    }
}
