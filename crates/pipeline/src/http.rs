//! HTTP-backed adapter implementations.
//!
//! Request/response mapping only: reqwest failures are classified onto the
//! adapter error taxonomy and bodies are decoded against strict schemas, so
//! the stages never see an untyped response.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use reloom_core::config::ServiceEndpoint;
use reloom_core::Season;

use crate::adapters::{
    AdapterError, KnowledgeAdapter, MarketExplainRequest, ReasoningAdapter, StrategyCandidate,
    StrategyProposeRequest, TrendSnapshot, VisionAdapter, VisionDetection,
};

#[derive(Clone, Debug)]
pub struct HttpAdapterConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
}

impl HttpAdapterConfig {
    pub fn from_endpoint(endpoint: &ServiceEndpoint) -> Self {
        Self {
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
            timeout: Duration::from_secs(endpoint.timeout_secs.max(1)),
        }
    }
}

pub struct HttpVisionAdapter {
    client: reqwest::Client,
    config: HttpAdapterConfig,
}

impl HttpVisionAdapter {
    pub fn new(client: reqwest::Client, config: HttpAdapterConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    image_ref: &'a str,
}

#[async_trait]
impl VisionAdapter for HttpVisionAdapter {
    async fn detect(&self, image_ref: &str) -> Result<VisionDetection, AdapterError> {
        post_json(&self.client, &self.config, "vision", "/v1/detect", &DetectRequest { image_ref })
            .await
    }
}

pub struct HttpKnowledgeAdapter {
    client: reqwest::Client,
    config: HttpAdapterConfig,
}

impl HttpKnowledgeAdapter {
    pub fn new(client: reqwest::Client, config: HttpAdapterConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl KnowledgeAdapter for HttpKnowledgeAdapter {
    async fn retrieve_trends(
        &self,
        category: &str,
        region: &str,
        season: Season,
    ) -> Result<TrendSnapshot, AdapterError> {
        let url = join_url(&self.config.base_url, "/v1/trends");
        let mut request = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .query(&[("category", category), ("region", region), ("season", season.as_str())]);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| classify_reqwest("knowledge", error))?;
        decode_response("knowledge", response).await
    }
}

pub struct HttpReasoningAdapter {
    client: reqwest::Client,
    config: HttpAdapterConfig,
}

impl HttpReasoningAdapter {
    pub fn new(client: reqwest::Client, config: HttpAdapterConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Deserialize)]
struct ExplainResponse {
    output: String,
}

#[derive(Deserialize)]
struct ProposeResponse {
    candidates: Vec<StrategyCandidate>,
}

#[async_trait]
impl ReasoningAdapter for HttpReasoningAdapter {
    async fn explain(&self, request: &MarketExplainRequest) -> Result<String, AdapterError> {
        let response: ExplainResponse =
            post_json(&self.client, &self.config, "reasoning", "/v1/explain", request).await?;
        Ok(response.output)
    }

    async fn propose(
        &self,
        request: &StrategyProposeRequest,
    ) -> Result<Vec<StrategyCandidate>, AdapterError> {
        let response: ProposeResponse =
            post_json(&self.client, &self.config, "reasoning", "/v1/propose", request).await?;
        Ok(response.candidates)
    }
}

async fn post_json<B: Serialize, T: DeserializeOwned>(
    client: &reqwest::Client,
    config: &HttpAdapterConfig,
    service: &'static str,
    path: &str,
    body: &B,
) -> Result<T, AdapterError> {
    let url = join_url(&config.base_url, path);
    let mut request = client.post(url).timeout(config.timeout).json(body);
    if let Some(key) = &config.api_key {
        request = request.bearer_auth(key.expose_secret());
    }

    let response = request.send().await.map_err(|error| classify_reqwest(service, error))?;
    decode_response(service, response).await
}

async fn decode_response<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T, AdapterError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(AdapterError::Throttled { service });
    }
    if !status.is_success() {
        return Err(AdapterError::Status { service, status: status.as_u16() });
    }

    response
        .json::<T>()
        .await
        .map_err(|error| AdapterError::Malformed { service, reason: error.to_string() })
}

fn classify_reqwest(service: &'static str, error: reqwest::Error) -> AdapterError {
    if error.is_timeout() {
        AdapterError::Timeout { service }
    } else {
        AdapterError::Transport { service, reason: error.to_string() }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
