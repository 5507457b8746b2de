use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use rfp_eval::chunker::{DEFAULT_MAX_MODEL_TOKENS, DEFAULT_RESERVED_TOKENS};
use rfp_eval::document::DocumentIntelligenceConfig;
use rfp_eval::orchestration::{DEFAULT_HISTORY_WINDOW, DEFAULT_MAXIMUM_ITERATIONS};
use rfp_eval::providers::configs::{
    AzureOpenAiProviderConfig, OpenAiProviderConfig, ProviderConfig,
};
use rfp_eval::providers::factory::ProviderType;
use rfp_eval::search::AzureSearchConfig;
use rfp_eval::session::{EvaluationSettings, Routing};
use rfp_eval::summarizer::SummarizerConfig;
use rfp_eval::token_counter::TokenEstimate;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Settings read from the process environment, one field per variable
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub azure_openai_endpoint: Option<String>,
    #[serde(default)]
    pub azure_openai_api_key: Option<String>,
    #[serde(default)]
    pub azure_openai_chat_deployment_name: Option<String>,
    pub azure_openai_api_version: String,

    #[serde(default)]
    pub openai_api_key: Option<String>,
    pub openai_host: String,
    pub openai_model: String,

    #[serde(default)]
    pub azure_document_intelligence_endpoint: Option<String>,
    #[serde(default)]
    pub azure_document_intelligence_api_key: Option<String>,

    #[serde(default)]
    pub azure_ai_search_endpoint: Option<String>,
    #[serde(default)]
    pub azure_ai_search_api_key: Option<String>,
    pub legal_policy_index: String,
    pub supplier_index: String,

    pub rfp_eval_documents_dir: PathBuf,
    pub rfp_eval_agent_prompts: PathBuf,
    pub rfp_eval_industry: String,
    pub rfp_eval_max_model_tokens: usize,
    pub rfp_eval_reserved_tokens: usize,
    pub rfp_eval_token_estimate: TokenEstimate,
    pub rfp_eval_max_iterations: usize,
    pub rfp_eval_history_window: usize,
    pub rfp_eval_routing: String,
    #[serde(default)]
    pub rfp_eval_model_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("azure_openai_api_version", "2024-10-21")?
            .set_default("openai_host", "https://api.openai.com")?
            .set_default("openai_model", "gpt-4o")?
            .set_default("legal_policy_index", "legal-policy-index")?
            .set_default("supplier_index", "supplier-insights-index")?
            .set_default("rfp_eval_documents_dir", "documents")?
            .set_default("rfp_eval_agent_prompts", "agent_prompts.jinja")?
            .set_default("rfp_eval_industry", "Cloud Computing")?
            .set_default("rfp_eval_max_model_tokens", DEFAULT_MAX_MODEL_TOKENS as i64)?
            .set_default("rfp_eval_reserved_tokens", DEFAULT_RESERVED_TOKENS as i64)?
            .set_default("rfp_eval_token_estimate", "words")?
            .set_default("rfp_eval_max_iterations", DEFAULT_MAXIMUM_ITERATIONS as i64)?
            .set_default("rfp_eval_history_window", DEFAULT_HISTORY_WINDOW as i64)?
            .set_default("rfp_eval_routing", Routing::default().to_string())?
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            if let config::ConfigError::NotFound(field) = &err {
                ConfigError::MissingEnvVar {
                    env_var: to_env_var(field),
                }
            } else {
                ConfigError::Other(err)
            }
        })
    }

    /// Azure OpenAI when its endpoint is set, otherwise the OpenAI API
    pub fn provider_type(&self) -> Result<ProviderType, ConfigError> {
        if present(&self.azure_openai_endpoint).is_some() {
            Ok(ProviderType::AzureOpenAi)
        } else if present(&self.openai_api_key).is_some() {
            Ok(ProviderType::OpenAi)
        } else {
            Err(missing("azure_openai_endpoint"))
        }
    }

    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        match self.provider_type()? {
            ProviderType::AzureOpenAi => {
                Ok(ProviderConfig::AzureOpenAi(AzureOpenAiProviderConfig {
                    endpoint: required(&self.azure_openai_endpoint, "azure_openai_endpoint")?,
                    api_key: present(&self.azure_openai_api_key),
                    deployment: required(
                        &self.azure_openai_chat_deployment_name,
                        "azure_openai_chat_deployment_name",
                    )?,
                    api_version: self.azure_openai_api_version.clone(),
                    timeout: self.model_timeout(),
                }))
            }
            ProviderType::OpenAi => Ok(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host: self.openai_host.clone(),
                api_key: required(&self.openai_api_key, "openai_api_key")?,
                model: self.openai_model.clone(),
                timeout: self.model_timeout(),
            })),
        }
    }

    /// Model calls wait indefinitely unless RFP_EVAL_MODEL_TIMEOUT_SECS is set
    fn model_timeout(&self) -> Option<Duration> {
        self.rfp_eval_model_timeout_secs.map(Duration::from_secs)
    }

    /// Document Intelligence is optional: without it only text files can be read
    pub fn document_intelligence(&self) -> Option<DocumentIntelligenceConfig> {
        let endpoint = present(&self.azure_document_intelligence_endpoint)?;
        let api_key = present(&self.azure_document_intelligence_api_key)?;
        Some(DocumentIntelligenceConfig::new(endpoint, api_key))
    }

    pub fn search(&self) -> Result<AzureSearchConfig, ConfigError> {
        Ok(AzureSearchConfig {
            endpoint: required(&self.azure_ai_search_endpoint, "azure_ai_search_endpoint")?,
            api_key: required(&self.azure_ai_search_api_key, "azure_ai_search_api_key")?,
        })
    }

    pub fn market_dataset(&self) -> PathBuf {
        self.rfp_eval_documents_dir.join("market-intelligence.json")
    }

    pub fn summarizer(&self) -> SummarizerConfig {
        SummarizerConfig {
            max_model_tokens: self.rfp_eval_max_model_tokens,
            reserved_tokens: self.rfp_eval_reserved_tokens,
            token_estimate: self.rfp_eval_token_estimate,
            ..Default::default()
        }
    }

    pub fn evaluation(&self) -> Result<EvaluationSettings, ConfigError> {
        let routing = self.rfp_eval_routing.parse::<Routing>().map_err(|_| {
            ConfigError::Other(config::ConfigError::Message(format!(
                "{} must be 'model' or 'keyword', got '{}'",
                to_env_var("rfp_eval_routing"),
                self.rfp_eval_routing
            )))
        })?;

        Ok(EvaluationSettings {
            industry: self.rfp_eval_industry.clone(),
            maximum_iterations: self.rfp_eval_max_iterations,
            history_window: self.rfp_eval_history_window,
            routing,
        })
    }
}

// Empty variables count as unset
fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

fn required(value: &Option<String>, field: &str) -> Result<String, ConfigError> {
    present(value).ok_or_else(|| missing(field))
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingEnvVar {
        env_var: to_env_var(field),
    }
}
