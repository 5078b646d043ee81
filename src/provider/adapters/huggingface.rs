//! HuggingFace Inference API: raw image bytes from a hosted model

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::provider::http::{base_url, build_client, ensure_success, require_key};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HuggingFaceProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

impl HuggingFaceProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "huggingface"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;
        let model = match options.get("model") {
            Some(model) => model.to_string(),
            None => super::model_for(self.config.model.as_deref(), DEFAULT_MODEL),
        };

        let response = self
            .client
            .post(format!("{}/models/{}", self.base_url, model))
            .bearer_auth(api_key)
            .json(&InferenceRequest { inputs: prompt })
            .send()
            .await?;

        let response = ensure_success(&self.name, response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
