//! Multi-provider image generation with ordered fallback
//!
//! A prompt is sent to third-party image services one at a time, by
//! ascending priority, until one returns an image. The image and an
//! optional metadata record are then written to the output directory.
//!
//! ```no_run
//! use std::sync::Arc;
//! use imagegen_fallback::{
//!     config::Settings, gateway::FallbackOrchestrator, provider::GenerationRequest,
//!     provider::ProviderRegistry,
//! };
//!
//! # async fn run() -> imagegen_fallback::Result<()> {
//! let settings = Settings::load(None)?;
//! let registry = Arc::new(ProviderRegistry::from_settings(&settings)?);
//! let orchestrator = FallbackOrchestrator::new(registry, &settings)?;
//!
//! let result = orchestrator
//!     .generate(GenerationRequest::new("a lighthouse at dawn"))
//!     .await?;
//! println!("{:?}", result);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod output;
pub mod provider;

pub use error::{AppError, Result};
pub use gateway::FallbackOrchestrator;
pub use output::GenerationResult;
pub use provider::{GenerationRequest, ImageProvider, ProviderRegistry};
