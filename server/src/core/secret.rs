//! Server secret used to hash API keys
//!
//! Resolution order:
//! 1. `PULSEBOARD_API_KEY_SECRET` (hex encoded)
//! 2. `api_key.secret` inside the data directory
//! 3. A freshly generated secret, written to the data directory

use std::path::Path;

use anyhow::{Context, Result};

use super::constants::{API_KEY_SECRET_FILENAME, API_KEY_SECRET_LENGTH, ENV_API_KEY_SECRET};
use super::storage::AppStorage;
use crate::utils::crypto;
use crate::utils::file::write_private;

/// HMAC key for API key hashing
#[derive(Clone)]
pub struct ApiKeySecret(Vec<u8>);

impl std::fmt::Debug for ApiKeySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKeySecret([REDACTED])")
    }
}

impl ApiKeySecret {
    /// Load the secret from env or disk, creating one on first run
    pub fn load_or_create(storage: &AppStorage) -> Result<Self> {
        if let Ok(value) = std::env::var(ENV_API_KEY_SECRET) {
            tracing::debug!("Using API key secret from environment");
            return Self::from_hex(&value);
        }
        Self::load_or_create_file(&storage.data_path(API_KEY_SECRET_FILENAME))
    }

    fn load_or_create_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read secret file: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded API key secret");
            return Self::from_hex(&content);
        }

        let key = crypto::generate_key(API_KEY_SECRET_LENGTH);
        write_private(path, hex::encode(&key).as_bytes())
            .with_context(|| format!("Failed to write secret file: {}", path.display()))?;
        tracing::info!(path = %path.display(), "Generated new API key secret");
        Ok(Self(key))
    }

    fn from_hex(value: &str) -> Result<Self> {
        let bytes = hex::decode(value.trim()).context("API key secret must be hex encoded")?;
        if bytes.len() < 16 {
            anyhow::bail!("API key secret must be at least 16 bytes");
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        Self(b"test-secret-for-api-key-hashing".to_vec())
    }
}
