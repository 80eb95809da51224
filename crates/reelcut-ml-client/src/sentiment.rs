//! HTTP client for the sentiment/topic service.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use reelcut_models::SentimentLabel;

use crate::config::MlClientConfig;
use crate::error::{MlError, MlResult};
use crate::retry::{map_send_error, with_retry};
use crate::services::SentimentService;
use crate::types::{Sentiment, SentimentRequest, SentimentResponse, TopicsRequest, TopicsResponse};

/// Client for `POST {base}/sentiment` and `POST {base}/topics`.
pub struct SentimentClient {
    http: Client,
    config: MlClientConfig,
}

impl SentimentClient {
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Check if the service is reachable.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.config.sentiment_base_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Sentiment service health check failed: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Sentiment service health check error: {}", e);
                false
            }
        }
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> MlResult<R>
    where
        B: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.sentiment_base_url, endpoint);
        debug!("Sending request to {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MlError::from_status("Sentiment service", status, &text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| MlError::InvalidResponse(format!("{} body: {}", endpoint, e)))
    }
}

#[async_trait]
impl SentimentService for SentimentClient {
    async fn classify(&self, text: &str) -> MlResult<Sentiment> {
        let request = SentimentRequest { text };
        let response: SentimentResponse = with_retry("Sentiment", self.config.max_retries, || {
            self.post_json("sentiment", &request)
        })
        .await?;

        if !response.score.is_finite() {
            return Err(MlError::InvalidResponse(format!(
                "non-finite sentiment score {}",
                response.score
            )));
        }

        Ok(Sentiment {
            label: SentimentLabel::from_label(&response.label),
            score: response.score.clamp(0.0, 1.0),
        })
    }

    async fn extract_topics(
        &self,
        documents: &[String],
        num_topics: usize,
        num_keywords: usize,
    ) -> MlResult<Vec<String>> {
        let request = TopicsRequest {
            documents,
            num_topics,
            num_keywords,
        };
        let response: TopicsResponse = with_retry("Topics", self.config.max_retries, || {
            self.post_json("topics", &request)
        })
        .await?;

        let mut keywords: Vec<String> = Vec::new();
        for keyword in response.topics.into_iter().flatten() {
            let keyword = keyword.trim().to_string();
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        Ok(keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SentimentClient {
        SentimentClient::new(MlClientConfig {
            sentiment_base_url: server.uri(),
            max_retries: 0,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_classify() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .and(body_json(serde_json::json!({"text": "que dia incrível"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"label": "POSITIVE", "score": 0.97})),
            )
            .mount(&server)
            .await;

        let sentiment = client_for(&server).classify("que dia incrível").await.unwrap();
        assert_eq!(sentiment.label, SentimentLabel::Positive);
        assert!((sentiment.score - 0.97).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_extract_topics_flattens_and_dedups() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/topics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "topics": [["futebol", "gol"], ["gol", "torcida", " "]]
            })))
            .mount(&server)
            .await;

        let topics = client_for(&server)
            .extract_topics(&["texto".to_string()], 2, 3)
            .await
            .unwrap();
        assert_eq!(topics, vec!["futebol", "gol", "torcida"]);
    }

    #[tokio::test]
    async fn test_invalid_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).classify("x").await.unwrap_err();
        assert!(matches!(err, MlError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client = SentimentClient::new(MlClientConfig {
            sentiment_base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(!client.health_check().await);
    }
}
