//! OpenAI-compatible chat client for highlight suggestions.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::MlClientConfig;
use crate::error::{MlError, MlResult};
use crate::retry::{map_send_error, with_retry};
use crate::services::SuggestionService;
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

/// Client for `POST {base}/chat/completions`, falling back through the
/// configured model list.
pub struct ChatSuggester {
    http: Client,
    config: MlClientConfig,
    api_key: String,
}

impl ChatSuggester {
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(MlError::MissingConfig("OPENAI_API_KEY"))?;
        if config.suggestion_models.is_empty() {
            return Err(MlError::MissingConfig("SUGGESTION_MODELS"));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    async fn complete(&self, model: &str, prompt: &str) -> MlResult<String> {
        let url = format!("{}/chat/completions", self.config.openai_base_url);
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::from_status("Chat service", status, &body));
        }

        let body = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| MlError::InvalidResponse(format!("chat body: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| MlError::InvalidResponse("no content in chat response".to_string()))?;

        Ok(strip_code_fence(&content).to_string())
    }
}

#[async_trait]
impl SuggestionService for ChatSuggester {
    async fn suggest(&self, prompt: &str) -> MlResult<String> {
        let mut last_error = None;

        for model in &self.config.suggestion_models {
            info!("Requesting suggestions with model: {}", model);
            let result = with_retry("Chat", self.config.max_retries, || {
                self.complete(model, prompt)
            })
            .await;

            match result {
                Ok(text) => {
                    info!("Got suggestions from {} ({} chars)", model, text.len());
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| MlError::RequestFailed("all suggestion models failed".to_string())))
    }
}

/// Drop a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an info string such as ```text
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, models: &[&str]) -> MlClientConfig {
        MlClientConfig {
            openai_base_url: server.uri(),
            api_key: Some("test-key".to_string()),
            suggestion_models: models.iter().map(|m| m.to_string()).collect(),
            max_retries: 0,
            ..Default::default()
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```text\nPontos relevantes:\n```"), "Pontos relevantes:");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[tokio::test]
    async fn test_suggest_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "primary"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Pontos relevantes:")))
            .mount(&server)
            .await;

        let client = ChatSuggester::new(config_for(&server, &["primary"])).unwrap();
        assert_eq!(client.suggest("prompt").await.unwrap(), "Pontos relevantes:");
    }

    #[tokio::test]
    async fn test_suggest_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"model": "primary"})))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"model": "fallback"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatSuggester::new(config_for(&server, &["primary", "fallback"])).unwrap();
        assert_eq!(client.suggest("prompt").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_suggest_all_models_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = ChatSuggester::new(config_for(&server, &["a", "b"])).unwrap();
        let err = client.suggest("prompt").await.unwrap_err();
        assert!(matches!(err, MlError::InvalidResponse(_)));
    }
}
