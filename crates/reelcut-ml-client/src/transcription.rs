//! OpenAI-compatible speech-to-text client.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use std::path::Path;
use tracing::debug;

use crate::config::MlClientConfig;
use crate::error::{MlError, MlResult};
use crate::retry::{map_send_error, with_retry};
use crate::services::TranscriptionService;
use crate::types::{Transcription, VerboseTranscription};

/// Client for `POST {base}/audio/transcriptions`.
pub struct OpenAiTranscriber {
    http: Client,
    config: MlClientConfig,
    api_key: String,
}

impl OpenAiTranscriber {
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(MlError::MissingConfig("OPENAI_API_KEY"))?;
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

    async fn send_once(&self, file_name: &str, bytes: Vec<u8>) -> MlResult<Transcription> {
        let url = format!("{}/audio/transcriptions", self.config.openai_base_url);

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("audio/mpeg")?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "verbose_json");
        if let Some(language) = &self.config.transcription_language {
            form = form.text("language", language.clone());
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::from_status("Transcription service", status, &body));
        }

        let body = response.text().await?;
        let raw: VerboseTranscription = serde_json::from_str(&body)
            .map_err(|e| MlError::InvalidResponse(format!("transcription body: {}", e)))?;
        Ok(raw.into())
    }
}

#[async_trait]
impl TranscriptionService for OpenAiTranscriber {
    async fn transcribe(&self, audio: &Path) -> MlResult<Transcription> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        debug!(
            "Uploading {} ({} bytes) for transcription",
            audio.display(),
            bytes.len()
        );

        with_retry("Transcription", self.config.max_retries, || {
            self.send_once(&file_name, bytes.clone())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> MlClientConfig {
        MlClientConfig {
            openai_base_url: server.uri(),
            api_key: Some("test-key".to_string()),
            max_retries: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let result = OpenAiTranscriber::new(MlClientConfig::default());
        assert!(matches!(result, Err(MlError::MissingConfig("OPENAI_API_KEY"))));
    }

    #[tokio::test]
    async fn test_transcribe_parses_verbose_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "primeira parte",
                "segments": [
                    {"start": 0.0, "end": 3.2, "text": " primeira"},
                    {"start": 3.2, "end": 5.0, "text": " parte"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let chunk = temp.path().join("chunk_0000.mp3");
        tokio::fs::write(&chunk, b"fake mp3").await.unwrap();

        let client = OpenAiTranscriber::new(config_for(&server)).unwrap();
        let transcription = client.transcribe(&chunk).await.unwrap();

        assert_eq!(transcription.text, "primeira parte");
        assert_eq!(transcription.segments.len(), 2);
        assert_eq!(transcription.segments[0].text, "primeira");
        assert_eq!(transcription.segments[1].start, 3.2);
    }

    #[tokio::test]
    async fn test_transcribe_maps_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let chunk = temp.path().join("chunk_0001.mp3");
        tokio::fs::write(&chunk, b"fake mp3").await.unwrap();

        let client = OpenAiTranscriber::new(config_for(&server)).unwrap();
        let err = client.transcribe(&chunk).await.unwrap_err();
        assert!(matches!(err, MlError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_transcribe_missing_file() {
        let server = MockServer::start().await;
        let client = OpenAiTranscriber::new(config_for(&server)).unwrap();
        let err = client.transcribe(Path::new("/nonexistent/chunk.mp3")).await.unwrap_err();
        assert!(matches!(err, MlError::Io(_)));
    }
}
