use anyhow::{anyhow, Result};
use reqwest::{Response, StatusCode};
use serde_json::{json, Map, Value};

use super::base::{CompletionOptions, ResponseFormat, Usage};
use crate::models::message::Message;
use crate::models::role::Role;

/// Convert internal Message format to OpenAI's API message specification.
///
/// Agent replies keep their speaker in the `name` field so the model can tell the
/// participants of a group conversation apart.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter(|message| !message.content.is_empty())
        .map(|message| {
            let mut converted = json!({
                "role": message.role,
                "content": message.content,
            });
            if let Some(agent) = message.speaker() {
                converted["name"] = json!(agent.to_string());
            }
            converted
        })
        .collect()
}

/// Convert a response format into the `response_format` request field
pub fn response_format_to_openai_spec(format: &ResponseFormat) -> Value {
    match format {
        ResponseFormat::Text => json!({"type": "text"}),
        ResponseFormat::JsonSchema { name, schema } => json!({
            "type": "json_schema",
            "json_schema": {
                "name": name,
                "schema": schema,
                "strict": true
            }
        }),
    }
}

/// Build a chat completion payload. `model` is omitted for endpoints where the
/// deployment in the URL selects it.
pub fn create_request(
    model: Option<&str>,
    system: &str,
    messages: &[Message],
    options: &CompletionOptions,
) -> Value {
    let system_message = json!({
        "role": "system",
        "content": system
    });

    let mut messages_array = vec![system_message];
    messages_array.extend(messages_to_openai_spec(messages));

    let mut payload = Map::new();
    if let Some(model) = model {
        payload.insert("model".to_string(), json!(model));
    }
    payload.insert("messages".to_string(), json!(messages_array));

    if let Some(temp) = options.temperature {
        payload.insert("temperature".to_string(), json!(temp));
    }
    if let Some(tokens) = options.max_tokens {
        payload.insert("max_tokens".to_string(), json!(tokens));
    }
    if let Some(format) = &options.response_format {
        payload.insert(
            "response_format".to_string(),
            response_format_to_openai_spec(format),
        );
    }

    Value::Object(payload)
}

/// Map the HTTP status of a completion call to a result
pub async fn handle_response(payload: &Value, response: Response) -> Result<Value> {
    match response.status() {
        StatusCode::OK => Ok(response.json().await?),
        status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
            // Every call is attempted once, throttling surfaces to the caller
            Err(anyhow!("Server error: {}", status))
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                if let Some(err) = value.get("error").and_then(check_openai_context_length_error)
                {
                    return Err(err.into());
                }
            }
            Err(anyhow!(
                "Request failed: {}\nResponse: {}\nPayload: {}",
                status,
                body,
                payload
            ))
        }
    }
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    if let Some(error) = response.get("error") {
        if let Some(err) = check_openai_context_length_error(error) {
            return Err(err.into());
        }
        return Err(anyhow!("OpenAI API error: {}", error));
    }

    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No choices in completion response"))?;

    if let Some(refusal) = original.get("refusal").and_then(|r| r.as_str()) {
        return Err(anyhow!("The model refused to answer: {}", refusal));
    }

    let text = original
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default();

    Ok(Message {
        role: Role::Assistant,
        name: None,
        created: chrono::Utc::now().timestamp(),
        content: text.to_string(),
    })
}

pub fn get_usage(data: &Value) -> Usage {
    let Some(usage) = data.get("usage") else {
        return Usage::default();
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
