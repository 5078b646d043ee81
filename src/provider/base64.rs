//! Base64 payload decoding

use base64::{engine::general_purpose::STANDARD, Engine};
use crate::error::{AppError, Result};

/// Decode a base64 image payload, accepting data URLs
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    // Handle data URL format (e.g., "data:image/png;base64,...")
    let data = match encoded.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };

    STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::Decode(format!("Invalid base64 data: {}", e)))
}

/// Decode an optional payload field, treating absence as a provider error
pub(crate) fn decode_field(provider: &str, field: &str, value: Option<&str>) -> Result<Vec<u8>> {
    let encoded = value.ok_or_else(|| {
        AppError::Provider(format!("{} response is missing '{}'", provider, field))
    })?;
    decode(encoded)
}
