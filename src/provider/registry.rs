//! Provider registry: name to adapter and configuration, in registration order

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{ProviderConfig, Settings, BUILTIN_PROVIDERS};
use crate::error::{AppError, Result};
use crate::provider::adapters;
use crate::provider::traits::ImageProvider;

/// A provider together with its configuration
#[derive(Clone)]
pub struct RegisteredProvider {
    config: ProviderConfig,
    provider: Arc<dyn ImageProvider>,
}

impl RegisteredProvider {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn ImageProvider> {
        &self.provider
    }
}

/// Registry of image providers
///
/// Populated once at startup and read-only afterwards.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every built-in provider using the loaded settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut registry = Self::new();

        for builtin in BUILTIN_PROVIDERS {
            let config = settings
                .providers
                .get(builtin.name)
                .cloned()
                .unwrap_or_else(|| ProviderConfig::disabled(builtin.name));

            let provider = adapters::build(builtin.name, &config)?;
            registry.register(config, provider)?;
        }

        for name in settings.providers.keys() {
            if registry.lookup(name).is_none() {
                warn!(provider = %name, "Ignoring configuration for unknown provider");
            }
        }

        Ok(registry)
    }

    /// Register a provider; names must be unique
    pub fn register(
        &mut self,
        mut config: ProviderConfig,
        provider: Arc<dyn ImageProvider>,
    ) -> Result<()> {
        if config.name.is_empty() {
            config.name = provider.name().to_string();
        }

        if self.get(&config.name).is_some() {
            return Err(AppError::Config(config::ConfigError::Message(format!(
                "Provider '{}' registered twice",
                config.name
            ))));
        }

        debug!(
            provider = %config.name,
            enabled = config.enabled,
            priority = config.priority,
            "Registered provider"
        );

        self.entries.push(RegisteredProvider { config, provider });
        Ok(())
    }

    /// Look up a provider's adapter by name
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ImageProvider>> {
        self.get(name).map(|entry| entry.provider.clone())
    }

    /// Look up a provider with its configuration
    pub fn get(&self, name: &str) -> Option<&RegisteredProvider> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// All providers in registration order
    pub fn entries(&self) -> &[RegisteredProvider] {
        &self.entries
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
