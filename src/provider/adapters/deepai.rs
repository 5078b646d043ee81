//! DeepAI: form-encoded request, image delivered through an output URL

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::http::{base_url, build_client, download, ensure_success, require_key};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.deepai.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DeepAiProvider {
    name: String,
    client: Client,
    base_url: String,
    config: ProviderConfig,
}

#[derive(Debug, Deserialize)]
struct DeepAiResponse {
    #[serde(default)]
    output_url: Option<String>,
}

impl DeepAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "deepai"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl ImageProvider for DeepAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<Vec<u8>> {
        let api_key = require_key(&self.config)?;

        let response = self
            .client
            .post(format!("{}/api/text2img", self.base_url))
            .header("api-key", api_key)
            .form(&[("text", prompt)])
            .send()
            .await?;

        let parsed: DeepAiResponse = ensure_success(&self.name, response).await?.json().await?;
        let url = parsed.output_url.ok_or_else(|| {
            AppError::Provider(format!("{} response is missing 'output_url'", self.name))
        })?;

        download(&self.client, &self.name, &url).await
    }
}
