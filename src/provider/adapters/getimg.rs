//! GetImg.ai: SDXL text-to-image returning a base64 JPEG

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::provider::base64::decode_field;
use crate::provider::http::{base_url, build_client, ensure_success, require_key};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.getimg.ai";
const DEFAULT_MODEL: &str = "stable-diffusion-xl-v1-0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GetImgProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct GetImgRequest<'a> {
    prompt: &'a str,
    model: String,
    width: u32,
    height: u32,
    steps: u32,
    guidance: f32,
    output_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GetImgResponse {
    #[serde(default)]
    image: Option<String>,
}

impl GetImgProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "getimg"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl ImageProvider for GetImgProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;

        let body = GetImgRequest {
            prompt,
            model: super::model_for(self.config.model.as_deref(), DEFAULT_MODEL),
            width: options.size.width,
            height: options.size.height,
            steps: 30,
            guidance: 7.5,
            output_format: "jpeg",
        };

        let response = self
            .client
            .post(format!("{}/v1/stable-diffusion-xl/text-to-image", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: GetImgResponse = ensure_success(&self.name, response).await?.json().await?;
        decode_field(&self.name, "image", parsed.image.as_deref())
    }
}
