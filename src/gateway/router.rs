//! Candidate selection for a generation request

use std::sync::Arc;
use tracing::{debug, warn};

use crate::provider::{ProviderRegistry, RegisteredProvider};

/// Picks which providers to try, and in which order
pub struct Router {
    registry: Arc<ProviderRegistry>,
}

impl Router {
    /// Create a new router
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Ordered candidates for a request
    ///
    /// A registered explicit provider is the only candidate, whatever its
    /// enabled flag. Otherwise enabled providers are tried by ascending
    /// priority, ties kept in registration order.
    pub fn route(&self, provider: Option<&str>) -> Vec<&RegisteredProvider> {
        if let Some(name) = provider {
            match self.registry.get(name) {
                Some(entry) => {
                    if !entry.config().enabled {
                        debug!(provider = %name, "Explicit provider is disabled, trying it anyway");
                    }
                    return vec![entry];
                }
                None => {
                    warn!(provider = %name, "Unknown provider requested, using fallback order");
                }
            }
        }

        let mut candidates: Vec<&RegisteredProvider> = self
            .registry
            .entries()
            .iter()
            .filter(|entry| entry.config().enabled)
            .collect();

        // Stable sort keeps registration order for equal priorities
        candidates.sort_by_key(|entry| entry.config().priority);

        debug!(
            candidates = ?candidates.iter().map(|c| c.name()).collect::<Vec<_>>(),
            "Resolved fallback order"
        );
        candidates
    }
}
