//! Gateway module - Candidate routing and provider fallback

pub mod fallback;
pub mod router;

pub use fallback::{FallbackOrchestrator, ALL_PROVIDERS_FAILED};
pub use router::Router;
