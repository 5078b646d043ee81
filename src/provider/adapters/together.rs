//! Together AI: OpenAI-style endpoint returning base64 images

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::provider::base64::decode_field;
use crate::provider::http::{base_url, build_client, ensure_success, require_key};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.together.xyz";
const DEFAULT_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const STEPS: u32 = 50;

pub struct TogetherProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct TogetherRequest<'a> {
    model: String,
    prompt: &'a str,
    width: u32,
    height: u32,
    steps: u32,
    n: u32,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TogetherResponse {
    #[serde(default)]
    data: Vec<TogetherImage>,
}

#[derive(Debug, Deserialize)]
struct TogetherImage {
    #[serde(default)]
    b64_json: Option<String>,
}

impl TogetherProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "together"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl ImageProvider for TogetherProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;

        let body = TogetherRequest {
            model: super::model_for(self.config.model.as_deref(), DEFAULT_MODEL),
            prompt,
            width: options.size.width,
            height: options.size.height,
            steps: STEPS,
            n: 1,
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: TogetherResponse = ensure_success(&self.name, response).await?.json().await?;
        let image = parsed.data.into_iter().next();
        decode_field(
            &self.name,
            "data[0].b64_json",
            image.as_ref().and_then(|i| i.b64_json.as_deref()),
        )
    }
}
