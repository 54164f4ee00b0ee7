use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    config::{AppConfig, SamplingOptions},
    error::ServiceError,
    model::{GenerationRequest, PullRequest, VersionResponse, stream::aggregate_fragments},
};

/// Anything that can turn a prompt into completed text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String, ServiceError>;
}

/// Client for a locally hosted Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.ollama_url.clone(),
            model: config.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Liveness check. Any 2xx answer counts; the version string is
    /// reported as `unknown` when the body is not the usual payload.
    pub async fn version(&self) -> Result<String, ServiceError> {
        let response = self.http.get(self.url("/api/version")).send().await?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await?;
        let version = serde_json::from_slice::<VersionResponse>(&body)
            .map(|v| v.version)
            .unwrap_or_else(|_| "unknown".to_string());
        Ok(version)
    }

    pub async fn pull_model(&self) -> Result<(), ServiceError> {
        let body = PullRequest { name: &self.model };
        let response = self
            .http
            .post(self.url("/api/pull"))
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Requests the configured model and logs the outcome. Never fails.
    pub async fn ensure_model(&self) {
        info!(model = %self.model, "making sure model is available");
        match self.pull_model().await {
            Ok(()) => info!(model = %self.model, "model is ready"),
            Err(err) => warn!(model = %self.model, %err, "could not pull model"),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String, ServiceError> {
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: options.stream,
            temperature: options.temperature,
            top_p: options.top_p,
        };
        debug!(
            model = %request.model,
            prompt_bytes = request.prompt.len(),
            stream = request.stream,
            "calling inference service"
        );

        let response = self
            .http
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        aggregate_fragments(response.bytes_stream()).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::UpstreamStatus {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}
