//! Vendor adapters, one per provider

mod deepai;
mod getimg;
mod huggingface;
mod leonardo;
mod midjourney;
mod openai;
mod pollinations;
mod replicate;
mod stability;
mod together;

pub use deepai::DeepAiProvider;
pub use getimg::GetImgProvider;
pub use huggingface::HuggingFaceProvider;
pub use leonardo::LeonardoProvider;
pub use midjourney::MidjourneyProvider;
pub use openai::OpenAiProvider;
pub use pollinations::PollinationsProvider;
pub use replicate::ReplicateProvider;
pub use stability::StabilityProvider;
pub use together::TogetherProvider;

use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::traits::ImageProvider;

/// Construct the adapter registered under `name`
pub fn build(name: &str, config: &ProviderConfig) -> Result<Arc<dyn ImageProvider>> {
    let provider: Arc<dyn ImageProvider> = match name {
        "pollinations" => Arc::new(PollinationsProvider::new(config)?),
        "together" => Arc::new(TogetherProvider::new(config)?),
        "deepai" => Arc::new(DeepAiProvider::new(config)?),
        "stability" => Arc::new(StabilityProvider::new(config)?),
        "openai" => Arc::new(OpenAiProvider::new(config)?),
        "replicate" => Arc::new(ReplicateProvider::new(config)?),
        "huggingface" => Arc::new(HuggingFaceProvider::new(config)?),
        "getimg" => Arc::new(GetImgProvider::new(config)?),
        "leonardo" => Arc::new(LeonardoProvider::new(config)?),
        "midjourney" => Arc::new(MidjourneyProvider::new(config)),
        other => return Err(AppError::ProviderNotAvailable(other.to_string())),
    };
    Ok(provider)
}

/// Configured model, else the vendor default
fn model_for(config_model: Option<&str>, default: &str) -> String {
    config_model.unwrap_or(default).to_string()
}

/// Display name of an adapter, preferring the configured one
fn name_for(config: &ProviderConfig, default: &str) -> String {
    if config.name.is_empty() {
        default.to_string()
    } else {
        config.name.clone()
    }
}
