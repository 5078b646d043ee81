//! Output module - Persisted images, metadata records, and generation results

pub mod file;

pub use file::ArtifactWriter;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sidecar record written next to each image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub prompt: String,
    pub provider: String,
    pub timestamp: String,
    /// Requested size as `WxH`
    pub size: String,
    /// Image file name inside the output directory
    pub filename: String,
}

/// Files produced by one successful generation
#[derive(Debug, Clone)]
pub struct PersistedArtifact {
    pub image_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
    pub filename: String,
    pub timestamp: String,
}

/// Outcome of a fallback run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationResult {
    Success {
        provider: String,
        filepath: PathBuf,
        prompt: String,
    },
    Failure {
        reason: String,
        prompt: String,
    },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn prompt(&self) -> &str {
        match self {
            Self::Success { prompt, .. } | Self::Failure { prompt, .. } => prompt,
        }
    }
}
