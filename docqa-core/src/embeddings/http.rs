//! Embeddings over HTTP
//!
//! Blocking client for OpenAI-compatible `/embeddings` endpoints.

use super::model::Embedder;
use super::{EmbeddingError, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Configuration for the HTTP embedding provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpEmbedderConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer token, if the endpoint needs one
    pub api_key_env: Option<String>,
    /// Requested output dimension, for models that support truncation
    pub dimensions: Option<usize>,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub batch_size: usize,
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            dimensions: None,
            timeout_secs: 30,
            max_retries: 3,
            batch_size: 64,
        }
    }
}

/// Blocking embeddings client that talks to OpenAI-compatible endpoints
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("missing base_url".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("missing model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(var) = &config.api_key_env {
            let key = std::env::var(var).map_err(|_| {
                EmbeddingError::InvalidConfig(format!("environment variable {} is not set", var))
            })?;
            let auth = HeaderValue::from_str(&format!("Bearer {}", key.trim()))
                .map_err(|_| EmbeddingError::InvalidConfig(format!("invalid API key in {}", var)))?;
            headers.insert(AUTHORIZATION, auth);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;
        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Send one request; `inputs` must fit in a single batch
    fn request(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.config.model,
                input: inputs,
                dimensions: self.config.dimensions,
            };

            match self.client.post(&self.endpoint).json(&request).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp.json()?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(EmbeddingError::Provider(format!(
                                "endpoint returned {} embeddings for {} inputs",
                                parsed.data.len(),
                                inputs.len()
                            )));
                        }
                        return Ok(parsed.data.into_iter().map(|d| d.embedding).collect());
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if Self::should_retry(status) && attempt + 1 < self.config.max_retries {
                        attempt += 1;
                        log::warn!("Embedding request failed ({}), retry {}", status, attempt);
                        thread::sleep(Self::retry_backoff(attempt));
                        continue;
                    }
                    return Err(EmbeddingError::Provider(format!(
                        "embeddings request failed ({}): {}",
                        status, body
                    )));
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect())
                        && attempt + 1 < self.config.max_retries
                    {
                        attempt += 1;
                        log::warn!("Embedding request error: {}, retry {}", err, attempt);
                        thread::sleep(Self::retry_backoff(attempt));
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn retry_backoff(attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        Duration::from_millis(200 * (1 << capped))
    }
}

impl Embedder for HttpEmbedder {
    fn model_id(&self) -> String {
        self.config.model.clone()
    }

    fn embedding_dim(&self) -> Option<usize> {
        self.config.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::Provider("empty embeddings response".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            embeddings.extend(self.request(batch)?);
        }
        Ok(embeddings)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run_blocking<T, F>(f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    fn config_for(server: &MockServer) -> HttpEmbedderConfig {
        HttpEmbedderConfig {
            base_url: format!("{}/v1", server.uri()),
            model: "test-model".to_string(),
            api_key_env: None,
            dimensions: None,
            timeout_secs: 5,
            max_retries: 2,
            batch_size: 2,
        }
    }

    #[tokio::test]
    async fn test_embed_batch_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({ "model": "test-model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "index": 1, "embedding": [0.0, 1.0] },
                    { "index": 0, "embedding": [1.0, 0.0] }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let embeddings = run_blocking(move || HttpEmbedder::new(config)?.embed_batch(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_embed_batch_splits_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "index": 0, "embedding": [1.0] },
                    { "index": 1, "embedding": [2.0] }
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let embeddings =
            run_blocking(move || HttpEmbedder::new(config)?.embed_batch(&["a", "b", "c", "d"]))
                .await
                .unwrap();

        assert_eq!(embeddings.len(), 4);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let config = config_for(&server);
        let result = run_blocking(move || HttpEmbedder::new(config)?.embed("a")).await;

        assert!(matches!(result, Err(EmbeddingError::Provider(_))));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad input"))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let result = run_blocking(move || HttpEmbedder::new(config)?.embed("a")).await;

        match result {
            Err(EmbeddingError::Provider(message)) => assert!(message.contains("bad input")),
            other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let result = run_blocking(move || HttpEmbedder::new(config)?.embed("a")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bearer_token_from_environment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [0.5] }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        std::env::set_var("DOCQA_TEST_EMBED_KEY", "secret-token");
        let config = HttpEmbedderConfig {
            api_key_env: Some("DOCQA_TEST_EMBED_KEY".to_string()),
            ..config_for(&server)
        };
        let result = run_blocking(move || HttpEmbedder::new(config)?.embed("a"))
            .await
            .unwrap();

        assert_eq!(result, vec![0.5]);
    }

    #[test]
    fn test_missing_api_key_variable() {
        let config = HttpEmbedderConfig {
            api_key_env: Some("DOCQA_TEST_UNSET_VARIABLE".to_string()),
            ..HttpEmbedderConfig::default()
        };

        assert!(matches!(
            HttpEmbedder::new(config),
            Err(EmbeddingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_model_rejected() {
        let config = HttpEmbedderConfig {
            model: " ".to_string(),
            api_key_env: None,
            ..HttpEmbedderConfig::default()
        };

        assert!(HttpEmbedder::new(config).is_err());
    }
}
