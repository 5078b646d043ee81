//! Pollinations.ai: keyless GET endpoint returning raw image bytes

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::http::{base_url, build_client, ensure_success};
use crate::provider::traits::{GenerationOptions, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PollinationsProvider {
    name: String,
    client: Client,
    base_url: String,
    model: Option<String>,
}

impl PollinationsProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            name: super::name_for(config, "pollinations"),
            client: build_client(config, DEFAULT_TIMEOUT)?,
            base_url: base_url(config, DEFAULT_BASE_URL),
            model: config.model.clone(),
        })
    }

    fn request_url(&self, prompt: &str, options: &GenerationOptions) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Provider(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::Provider(format!("Base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push("prompt")
            .push(prompt);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("width", &options.size.width.to_string())
                .append_pair("height", &options.size.height.to_string())
                .append_pair("nologo", "true");
            if let Some(model) = self.model.as_deref() {
                query.append_pair("model", model);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl ImageProvider for PollinationsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let url = self.request_url(prompt, options)?;
        debug!(provider = %self.name, url = %url, "Requesting image");

        let response = ensure_success(&self.name, self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
