use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::base::{CompletionOptions, Provider, Usage};
use super::configs::AzureOpenAiProviderConfig;
use super::utils::{create_request, get_usage, handle_response, openai_response_to_message};
use crate::models::message::Message;

/// Chat completions against an Azure OpenAI deployment
pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureOpenAiProviderConfig,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureOpenAiProviderConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = self.url();
        debug!(deployment = %self.config.deployment, "POST {}", url);

        let mut request = self.client.post(&url).json(&payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("api-key", api_key);
        }
        let response = request.send().await?;

        handle_response(&payload, response).await
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<(Message, Usage)> {
        // The deployment in the URL selects the model
        let payload = create_request(None, system, messages, options);

        let response = self.post(payload).await?;

        let message = openai_response_to_message(&response)?;
        let usage = get_usage(&response);

        Ok((message, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::summary::ProposalSummary;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String, api_key: Option<&str>) -> AzureOpenAiProviderConfig {
        AzureOpenAiProviderConfig {
            endpoint,
            api_key: api_key.map(String::from),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-10-21".to_string(),
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_complete_structured_output() -> Result<()> {
        let mock_server = MockServer::start().await;
        let summary = json!({
            "vendor_name": "Northwind Traders",
            "legal_summary": "ISO 27001 certified",
            "overall_summary": "Managed hosting"
        });
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-10-21"))
            .and(header("api-key", "secret"))
            .and(body_partial_json(json!({
                "max_tokens": 1000,
                "response_format": {"type": "json_schema"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": summary.to_string()},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 100, "completion_tokens": 40, "total_tokens": 140}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = AzureOpenAiProvider::new(config(mock_server.uri(), Some("secret")))?;
        let options = CompletionOptions::default()
            .with_max_tokens(1000)
            .with_json_schema("VendorProposalSummary", ProposalSummary::json_schema());
        let (message, usage) = provider
            .complete(
                "Summarize the proposal",
                &[Message::user().with_text("chunk")],
                &options,
            )
            .await?;

        let parsed = ProposalSummary::from_generation(message.text());
        assert_eq!(parsed.vendor_name, "Northwind Traders");
        assert_eq!(usage.total_tokens, Some(140));
        Ok(())
    }

    #[tokio::test]
    async fn test_request_failure() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": "context_length_exceeded", "message": "too many tokens"}
            })))
            .mount(&mock_server)
            .await;

        let provider = AzureOpenAiProvider::new(config(mock_server.uri(), None))?;
        let err = provider
            .complete("sys", &[], &CompletionOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Context length exceeded"));
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_timeout() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(500))
                    .set_body_json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "late"}}]
                    })),
            )
            .mount(&mock_server)
            .await;

        let mut limited = config(mock_server.uri(), None);
        limited.timeout = Some(std::time::Duration::from_millis(50));
        let provider = AzureOpenAiProvider::new(limited)?;
        let result = provider
            .complete("sys", &[Message::user().with_text("hi")], &CompletionOptions::default())
            .await;
        assert!(result.is_err());

        // without a limit the slow reply still arrives
        let provider = AzureOpenAiProvider::new(config(mock_server.uri(), None))?;
        let (message, _) = provider
            .complete("sys", &[Message::user().with_text("hi")], &CompletionOptions::default())
            .await?;
        assert_eq!(message.text(), "late");
        Ok(())
    }
}
