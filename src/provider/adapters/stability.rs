//! Stability AI: SDXL text-to-image returning base64 artifacts

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::provider::base64::decode_field;
use crate::provider::http::{base_url, build_client, ensure_success, require_key};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.stability.ai";
const DEFAULT_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct StabilityProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct StabilityRequest<'a> {
    text_prompts: [TextPrompt<'a>; 1],
    cfg_scale: u32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: u32,
}

#[derive(Debug, Deserialize)]
struct StabilityResponse {
    #[serde(default)]
    artifacts: Vec<StabilityArtifact>,
}

#[derive(Debug, Deserialize)]
struct StabilityArtifact {
    #[serde(default)]
    base64: Option<String>,
}

impl StabilityProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "stability"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl ImageProvider for StabilityProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;
        let engine = super::model_for(self.config.model.as_deref(), DEFAULT_ENGINE);

        let body = StabilityRequest {
            text_prompts: [TextPrompt {
                text: prompt,
                weight: 1,
            }],
            cfg_scale: 7,
            height: options.size.height,
            width: options.size.width,
            samples: 1,
            steps: 30,
        };

        let response = self
            .client
            .post(format!(
                "{}/v1/generation/{}/text-to-image",
                self.base_url, engine
            ))
            .bearer_auth(api_key)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let parsed: StabilityResponse = ensure_success(&self.name, response).await?.json().await?;
        let artifact = parsed.artifacts.into_iter().next();
        decode_field(
            &self.name,
            "artifacts[0].base64",
            artifact.as_ref().and_then(|a| a.base64.as_deref()),
        )
    }
}
