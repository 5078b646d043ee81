//! Provider module - Trait, vendor adapters, and registry

pub mod adapters;
pub mod base64;
mod http;
pub mod registry;
pub mod traits;

pub use registry::{ProviderRegistry, RegisteredProvider};
pub use traits::{GenerationOptions, GenerationRequest, ImageProvider, ImageSize};
