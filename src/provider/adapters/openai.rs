//! OpenAI DALL-E: image URL (or inline base64) from the images API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::base64;
use crate::provider::http::{base_url, build_client, download, ensure_success, require_key};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "dall-e-3";
const DEFAULT_QUALITY: &str = "standard";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAiProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: String,
    prompt: &'a str,
    n: u32,
    size: String,
    quality: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    data: Vec<OpenAiImage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "openai"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;

        let body = OpenAiRequest {
            model: super::model_for(self.config.model.as_deref(), DEFAULT_MODEL),
            prompt,
            n: 1,
            size: options.size.to_string(),
            quality: options.get("quality").unwrap_or(DEFAULT_QUALITY),
        };

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: OpenAiResponse = ensure_success(&self.name, response).await?.json().await?;
        match parsed.data.into_iter().next() {
            Some(OpenAiImage { url: Some(url), .. }) => {
                download(&self.client, &self.name, &url).await
            }
            Some(OpenAiImage {
                b64_json: Some(encoded),
                ..
            }) => base64::decode(&encoded),
            _ => Err(AppError::Provider(format!(
                "{} response contained no image",
                self.name
            ))),
        }
    }
}
