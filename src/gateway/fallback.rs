//! Fallback orchestrator: try providers in order, persist the first image

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::gateway::router::Router;
use crate::output::{ArtifactWriter, GenerationResult};
use crate::provider::{GenerationOptions, GenerationRequest, ImageSize, ProviderRegistry};

/// Reason reported when every candidate came back empty
pub const ALL_PROVIDERS_FAILED: &str = "all providers failed";

/// Runs a generation request across providers
pub struct FallbackOrchestrator {
    router: Router,
    writer: ArtifactWriter,
    default_size: ImageSize,
}

impl FallbackOrchestrator {
    /// Create an orchestrator over a registry and the loaded settings
    pub fn new(registry: Arc<ProviderRegistry>, settings: &Settings) -> Result<Self> {
        Ok(Self {
            router: Router::new(registry),
            writer: ArtifactWriter::new(&settings.output_dir, settings.save_metadata),
            default_size: settings.default_image_size()?,
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    /// Generate an image, falling back through providers
    ///
    /// Provider failures never surface here; only filesystem and input
    /// errors are returned as `Err`.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let GenerationRequest {
            prompt,
            provider,
            size,
            options: extra,
        } = request;

        if prompt.trim().is_empty() {
            return Err(AppError::InvalidRequest("prompt cannot be empty".to_string()));
        }

        self.writer.ensure_output_dir().await?;

        let options = GenerationOptions {
            size: size.unwrap_or(self.default_size),
            extra,
        };

        for candidate in self.router.route(provider.as_deref()) {
            let name = candidate.name();
            info!(provider = %name, "Trying provider");

            let start = Instant::now();
            let outcome = candidate.provider().generate(&prompt, &options).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(data) if !data.is_empty() => {
                    let artifact = self
                        .writer
                        .persist(name, &prompt, options.size, &data)
                        .await?;

                    info!(
                        provider = %name,
                        path = ?artifact.image_path,
                        bytes = data.len(),
                        elapsed_ms,
                        "Image generated"
                    );

                    return Ok(GenerationResult::Success {
                        provider: name.to_string(),
                        filepath: artifact.image_path,
                        prompt,
                    });
                }
                Ok(_) => {
                    warn!(provider = %name, elapsed_ms, "Provider returned no image");
                }
                Err(e) => {
                    warn!(provider = %name, elapsed_ms, error = %e, "Provider failed");
                }
            }
        }

        warn!("All providers failed");
        Ok(GenerationResult::Failure {
            reason: ALL_PROVIDERS_FAILED.to_string(),
            prompt,
        })
    }
}
