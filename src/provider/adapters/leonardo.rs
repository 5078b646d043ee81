//! Leonardo.ai: generation jobs polled until complete

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::http::{
    base_url, build_client, download, ensure_success, require_key, PollSchedule, PollStatus,
};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://cloud.leonardo.ai";
/// Leonardo Diffusion XL
const DEFAULT_MODEL: &str = "6bef9f1b-29cb-40c7-b9df-32b51c1f67d3";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 60;

pub struct LeonardoProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
    schedule: PollSchedule,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGeneration<'a> {
    prompt: &'a str,
    model_id: String,
    width: u32,
    height: u32,
    #[serde(rename = "num_images")]
    num_images: u32,
}

#[derive(Debug, Deserialize)]
struct CreateGenerationResponse {
    #[serde(rename = "sdGenerationJob")]
    job: GenerationJob,
}

#[derive(Debug, Deserialize)]
struct GenerationJob {
    #[serde(rename = "generationId")]
    generation_id: String,
}

#[derive(Debug, Deserialize)]
struct GenerationStatusResponse {
    generations_by_pk: Option<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    status: String,
    #[serde(default)]
    generated_images: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}

impl LeonardoProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "leonardo"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
            schedule: PollSchedule::from_config(config, POLL_INTERVAL, MAX_POLLS),
        })
    }

    fn generation_url(&self) -> String {
        format!("{}/api/rest/v1/generations", self.base_url)
    }

    async fn check(&self, api_key: &str, id: &str) -> Result<PollStatus<String>> {
        let response = self
            .client
            .get(format!("{}/{}", self.generation_url(), id))
            .bearer_auth(api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(provider = %self.name, status = %response.status(), "Poll request rejected");
            return Ok(PollStatus::Pending);
        }

        let parsed: GenerationStatusResponse = response.json().await?;
        let Some(generation) = parsed.generations_by_pk else {
            return Ok(PollStatus::Pending);
        };

        Ok(match generation.status.as_str() {
            "COMPLETE" => match generation.generated_images.into_iter().next() {
                Some(image) => PollStatus::Ready(image.url),
                None => PollStatus::Failed("complete without images".to_string()),
            },
            "FAILED" => PollStatus::Failed("generation failed".to_string()),
            _ => PollStatus::Pending,
        })
    }
}

#[async_trait]
impl ImageProvider for LeonardoProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;

        let body = CreateGeneration {
            prompt,
            model_id: super::model_for(self.config.model.as_deref(), DEFAULT_MODEL),
            width: options.size.width,
            height: options.size.height,
            num_images: 1,
        };

        let response = self
            .client
            .post(self.generation_url())
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await?;

        let created: CreateGenerationResponse =
            ensure_success(&self.name, response).await?.json().await?;
        let id = created.job.generation_id;
        if id.is_empty() {
            return Err(AppError::Provider(format!(
                "{} returned an empty generation id",
                self.name
            )));
        }
        debug!(provider = %self.name, generation = %id, "Submitted generation");

        let url = self
            .schedule
            .run(&self.name, || self.check(&api_key, &id))
            .await?;

        download(&self.client, &self.name, &url).await
    }
}
