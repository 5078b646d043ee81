//! Midjourney has no public HTTP API; it is registered but never produces images

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::traits::{GenerationOptions, ImageProvider};

pub struct MidjourneyProvider {
    name: String,
}

impl MidjourneyProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            name: super::name_for(config, "midjourney"),
        }
    }
}

#[async_trait]
impl ImageProvider for MidjourneyProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<Vec<u8>> {
        Err(AppError::ProviderNotAvailable(
            "midjourney requires Discord bot integration".to_string(),
        ))
    }
}
