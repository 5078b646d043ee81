//! Application settings and configuration management

use crate::error::{AppError, Result};
use crate::provider::ImageSize;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Prefix for environment overrides, e.g. `IMAGEGEN__OUTPUT_DIR`
pub const ENV_PREFIX: &str = "IMAGEGEN";

/// Priority assigned to providers that do not declare one
pub const DEFAULT_PRIORITY: i32 = 999;

/// A provider compiled into the binary, in registration order
#[derive(Debug, Clone, Copy)]
pub struct BuiltinProvider {
    pub name: &'static str,
    /// Environment variable holding the provider credential
    pub credential_env: Option<&'static str>,
    pub default_priority: i32,
    /// Enabled without a credential (only keyless providers)
    pub enabled_without_credential: bool,
}

const fn keyed(name: &'static str, env: &'static str, priority: i32) -> BuiltinProvider {
    BuiltinProvider {
        name,
        credential_env: Some(env),
        default_priority: priority,
        enabled_without_credential: false,
    }
}

pub const BUILTIN_PROVIDERS: &[BuiltinProvider] = &[
    BuiltinProvider {
        name: "pollinations",
        credential_env: None,
        default_priority: 1,
        enabled_without_credential: true,
    },
    keyed("together", "TOGETHER_API_KEY", 2),
    keyed("deepai", "DEEPAI_API_KEY", 3),
    keyed("stability", "STABILITY_API_KEY", 4),
    keyed("openai", "OPENAI_API_KEY", 5),
    keyed("replicate", "REPLICATE_API_TOKEN", 6),
    keyed("huggingface", "HUGGINGFACE_API_KEY", 7),
    keyed("getimg", "GETIMG_API_KEY", 8),
    keyed("leonardo", "LEONARDO_API_KEY", 9),
    // Needs a Discord bot; only reachable when named explicitly.
    BuiltinProvider {
        name: "midjourney",
        credential_env: None,
        default_priority: DEFAULT_PRIORITY,
        enabled_without_credential: false,
    },
];

/// Look up a built-in provider by name
pub fn builtin(name: &str) -> Option<&'static BuiltinProvider> {
    BUILTIN_PROVIDERS.iter().find(|p| p.name == name)
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_size")]
    pub default_size: String,
    #[serde(default = "default_true")]
    pub save_metadata: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_output_dir() -> String {
    "./generated_images".to_string()
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_true() -> bool {
    true
}

/// Per-provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Filled from the map key when loaded from a file
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, alias = "credential")]
    pub api_key: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Override for the vendor API root
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl ProviderConfig {
    /// Enabled provider with the given priority and no overrides
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority,
            ..Self::default()
        }
    }

    /// Configuration for a registered provider the settings never mention
    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            priority: DEFAULT_PRIORITY,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Load settings from an optional JSON file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |var| std::env::var(var).ok())
    }

    /// Load settings, resolving credentials through `lookup`
    ///
    /// With an existing file, its `providers` table is authoritative. Without
    /// one, the provider table is derived from which credentials are present.
    /// In both cases `IMAGEGEN__PROVIDERS__<NAME>__<FIELD>` variables are
    /// layered on top, e.g. `IMAGEGEN__PROVIDERS__OPENAI__MODEL=dall-e-2`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .set_default("output_dir", default_output_dir())?
            .set_default("default_size", default_size())?
            .set_default("save_metadata", true)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?;

        let file = path.filter(|p| {
            let exists = p.exists();
            if !exists {
                warn!(path = ?p, "Config file not found, using environment defaults");
            }
            exists
        });

        match file {
            Some(file) => {
                builder = builder.add_source(File::from(file).format(FileFormat::Json));
            }
            None => {
                for (name, provider) in default_providers(&lookup) {
                    builder = builder
                        .set_default(format!("providers.{}.enabled", name), provider.enabled)?
                        .set_default(
                            format!("providers.{}.priority", name),
                            i64::from(provider.priority),
                        )?;
                }
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.resolve_providers(&lookup);
        settings.validate()?;
        Ok(settings)
    }

    /// Settings built purely from credential lookups, without any file
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self {
            providers: default_providers(&lookup),
            ..Self::default()
        };
        settings.resolve_providers(&lookup);
        settings
    }

    /// Fill provider names from map keys and missing credentials from the environment
    fn resolve_providers<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (name, provider) in self.providers.iter_mut() {
            provider.name = name.clone();

            if provider.api_key.as_deref().is_some_and(str::is_empty) {
                provider.api_key = None;
            }
            if provider.api_key.is_none() {
                provider.api_key = builtin(name)
                    .and_then(|b| b.credential_env)
                    .and_then(|var| non_empty(lookup(var)));
            }
        }
    }

    /// Parsed default image size
    pub fn default_image_size(&self) -> Result<ImageSize> {
        self.default_size.parse()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.trim().is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "output_dir cannot be empty".to_string(),
            )));
        }

        if let Err(e) = self.default_image_size() {
            return Err(AppError::Config(config::ConfigError::Message(format!(
                "default_size '{}' is invalid: {}",
                self.default_size, e
            ))));
        }

        if !["text", "json"].contains(&self.logging.format.as_str()) {
            return Err(AppError::Config(config::ConfigError::Message(format!(
                "Invalid logging format '{}'. Must be 'text' or 'json'",
                self.logging.format
            ))));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            output_dir: default_output_dir(),
            default_size: default_size(),
            save_metadata: true,
            logging: LoggingConfig::default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Provider table used when no config file is supplied
fn default_providers<F>(lookup: &F) -> HashMap<String, ProviderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    BUILTIN_PROVIDERS
        .iter()
        .filter(|b| b.enabled_without_credential || b.credential_env.is_some())
        .map(|b| {
            let api_key = b.credential_env.and_then(|var| non_empty(lookup(var)));
            let config = ProviderConfig {
                name: b.name.to_string(),
                enabled: b.enabled_without_credential || api_key.is_some(),
                api_key,
                priority: b.default_priority,
                ..ProviderConfig::default()
            };
            (b.name.to_string(), config)
        })
        .collect()
}
