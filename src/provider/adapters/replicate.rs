//! Replicate: asynchronous predictions polled until they settle

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::http::{
    base_url, build_client, download, ensure_success, require_key, PollSchedule, PollStatus,
};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.replicate.com";
/// SDXL model version
const DEFAULT_VERSION: &str = "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 60;

pub struct ReplicateProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
    schedule: PollSchedule,
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: String,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
    num_outputs: u32,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl Prediction {
    /// First output URL; the API returns either a list or a single string
    fn output_url(&self) -> Option<String> {
        match self.output.as_ref()? {
            Value::String(url) => Some(url.clone()),
            Value::Array(items) => items.first()?.as_str().map(str::to_string),
            _ => None,
        }
    }
}

impl ReplicateProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "replicate"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
            schedule: PollSchedule::from_config(config, POLL_INTERVAL, MAX_POLLS),
        })
    }

    async fn check(&self, api_key: &str, id: &str) -> Result<PollStatus<String>> {
        let response = self
            .client
            .get(format!("{}/v1/predictions/{}", self.base_url, id))
            .header("Authorization", format!("Token {}", api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(provider = %self.name, status = %response.status(), "Poll request rejected");
            return Ok(PollStatus::Pending);
        }

        let prediction: Prediction = response.json().await?;
        Ok(match prediction.status.as_str() {
            "succeeded" => match prediction.output_url() {
                Some(url) => PollStatus::Ready(url),
                None => PollStatus::Failed("succeeded without output".to_string()),
            },
            "failed" | "canceled" => PollStatus::Failed(
                prediction
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| prediction.status.clone()),
            ),
            _ => PollStatus::Pending,
        })
    }
}

#[async_trait]
impl ImageProvider for ReplicateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;

        let body = PredictionRequest {
            version: super::model_for(self.config.model.as_deref(), DEFAULT_VERSION),
            input: PredictionInput {
                prompt,
                width: options.size.width,
                height: options.size.height,
                num_outputs: 1,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/predictions", self.base_url))
            .header("Authorization", format!("Token {}", api_key))
            .json(&body)
            .send()
            .await?;

        let prediction: Prediction = ensure_success(&self.name, response).await?.json().await?;
        if prediction.id.is_empty() {
            return Err(AppError::Provider(format!(
                "{} returned a prediction without id",
                self.name
            )));
        }
        debug!(provider = %self.name, prediction = %prediction.id, "Submitted prediction");

        let url = self
            .schedule
            .run(&self.name, || self.check(&api_key, &prediction.id))
            .await?;

        download(&self.client, &self.name, &url).await
    }
}
