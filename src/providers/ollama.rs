use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Ollama client for interacting with Ollama API
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API, without trailing slash
    base_url: String,
    /// Model used for every generation
    model: String,
    /// Sampling temperature, server default when unset
    temperature: Option<f32>,
    /// Per-request timeout configured on the HTTP client
    timeout: Duration,
    /// HTTP client with its connection pool, shared by clones
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Whether to stream the response
    stream: bool,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            options: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }
}

/// Normalise an endpoint such as `localhost:11434` or `http://gpu-box:11434/`
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Extract the generated text from a body that may be a single object or JSON lines
fn parse_generation_body(body: &str) -> Result<String, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(response.response);
    }

    // A server that ignores `stream: false` answers with one object per line
    let mut text = String::new();
    let mut parsed_any = false;
    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
            if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
                text.push_str(part);
                parsed_any = true;
            }
        }
    }

    if parsed_any {
        Ok(text)
    } else {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API response. Raw response (first 500 chars): {}", preview);
        Err(ProviderError::ParseError("response field missing from Ollama reply".to_string()))
    }
}

impl Ollama {
    /// Create a new Ollama client
    ///
    /// Uses a pooled HTTP/1.1 client; clones share the pool.
    pub fn new(endpoint: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_endpoint(endpoint)?;

        let client = Client::builder()
            .timeout(timeout)
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url,
            model: model.into(),
            temperature: None,
            timeout,
            client,
        })
    }

    /// Set the sampling temperature for every request
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else if error.is_connect() {
            ProviderError::ConnectionError(error.to_string())
        } else {
            ProviderError::RequestFailed(error.to_string())
        }
    }

    /// Send one generation request
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: body,
            });
        }

        parse_generation_body(&body)
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut request = GenerationRequest::new(&self.model, prompt);
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }
        self.generate(&request).await
    }

    async fn test_connection(&self) -> Result<String, ProviderError> {
        let version = self.version().await?;
        Ok(format!("Ollama {} at {} (model {})", version, self.base_url, self.model))
    }
}
