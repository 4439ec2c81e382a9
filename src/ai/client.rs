use crate::error::GatewayError;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Default completion endpoint
pub const DEFAULT_ENDPOINT: &str = "https://toolkit.rork.com/text/llm/";

/// One chat turn sent to the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    completion: Option<String>,
}

/// Client for the completion endpoint. Each call carries its own timeout.
///
/// Requests are `{ "messages": [...] }`; replies are `{ "completion": "..." }`.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Send the conversation and return the completion text
    pub async fn complete(&self, messages: &[ChatMessage], timeout: Duration) -> Result<String, GatewayError> {
        debug!(endpoint = %self.endpoint, messages = messages.len(), "Completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&CompletionRequest { messages })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Completion request failed");
                GatewayError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Completion endpoint error");
            return Err(GatewayError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(GatewayError::from)?;
        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::InvalidJson(e.to_string()))?;

        match parsed.completion {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GatewayError::MissingCompletion),
        }
    }
}

/// Parse the first JSON object in `text`, starting at its first `{`
pub fn extract_object(text: &str) -> Result<Value, GatewayError> {
    extract_json(text, '{')
}

/// Parse the first JSON array in `text`, starting at its first `[`
pub fn extract_array(text: &str) -> Result<Value, GatewayError> {
    extract_json(text, '[')
}

/// The streaming deserializer stops at the end of the first complete value,
/// so prose or a second value after it is ignored.
fn extract_json(text: &str, open: char) -> Result<Value, GatewayError> {
    let start = text.find(open).ok_or(GatewayError::NoJson)?;
    let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();

    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(GatewayError::InvalidJson(e.to_string())),
        None => Err(GatewayError::NoJson),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("You are terse."), ChatMessage::user("Hi")]
    }

    #[test]
    fn test_extract_object_from_prose() {
        let text = "Sure! Here it is:\n{\"a\": {\"b\": [1, 2]}} and something after {\"c\": 3}";
        assert_eq!(extract_object(text).unwrap(), json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn test_extract_array() {
        let text = "```json\n[{\"title\": \"x\"}]\n```";
        assert_eq!(extract_array(text).unwrap(), json!([{"title": "x"}]));
    }

    #[test]
    fn test_extract_without_json() {
        assert_eq!(extract_object("no braces here"), Err(GatewayError::NoJson));
    }

    #[test]
    fn test_extract_malformed_json() {
        assert!(matches!(extract_object("{\"a\": }"), Err(GatewayError::InvalidJson(_))));
    }

    #[tokio::test]
    async fn test_complete_returns_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/text/llm/"))
            .and(body_partial_json(json!({ "messages": messages() })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"completion": "Hello"})))
            .mount(&mock_server)
            .await;

        let client = CompletionClient::new(format!("{}/text/llm/", mock_server.uri())).unwrap();
        let text = client.complete(&messages(), Duration::from_secs(5)).await.unwrap();

        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn test_complete_maps_status_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = CompletionClient::new(mock_server.uri()).unwrap();
        let result = client.complete(&messages(), Duration::from_secs(5)).await;

        assert_eq!(result, Err(GatewayError::Status(503)));
    }

    #[tokio::test]
    async fn test_complete_missing_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "nope"})))
            .mount(&mock_server)
            .await;

        let client = CompletionClient::new(mock_server.uri()).unwrap();
        let result = client.complete(&messages(), Duration::from_secs(5)).await;

        assert_eq!(result, Err(GatewayError::MissingCompletion));
    }

    #[tokio::test]
    async fn test_complete_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"completion": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = CompletionClient::new(mock_server.uri()).unwrap();
        let result = client.complete(&messages(), Duration::from_millis(50)).await;

        assert_eq!(result, Err(GatewayError::Timeout));
    }
}
