//! Translation of a miner config.toml into a provider config layer.
//!
//! This is pure: it takes the raw file text plus the three values fetched from
//! external providers and produces the new config and the operator advisory.

use crate::config::ProviderConfig;
use crate::error::{MigrationError, Result};
use base64::{engine::general_purpose, Engine as _};

/// Prefix of an `Authorization` header carrying a bearer token
pub const BEARER_PREFIX: &str = "Bearer ";

/// Advisory emitted with every translation: window PoSt moves to the provider.
pub const WINDOW_POST_ADVISORY: &str = "\nBefore running lotus-provider, ensure any miner/worker answering of WindowPost is disabled by
(on Miner) DisableBuiltinWindowPoSt=true and (on Workers) not enabling windowpost on CLI or via
environment variable LOTUS_WORKER_WINDOWPOST.
";

/// Result of translating a miner config
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub config: ProviderConfig,
    pub advisory: &'static str,
}

impl Translation {
    /// TOML text for the layer row
    pub fn to_toml_string(&self) -> Result<String> {
        self.config.to_toml_string()
    }
}

/// Build the provider config for `miner_address` from a miner's config.toml.
pub fn translate(
    legacy_toml: &str,
    miner_address: &str,
    raw_secret_key: &[u8],
    authorization_header: &str,
) -> Result<Translation> {
    // Shared sections carry over unchanged
    let mut config = ProviderConfig::from_toml_str(legacy_toml)?;

    if miner_address.is_empty() {
        return Err(MigrationError::MissingIdentity);
    }
    config.addresses.miner_addresses = vec![miner_address.to_string()];

    config.apis.storage_rpc_secret = encode_storage_secret(raw_secret_key)?;
    config.apis.chain_api_info = vec![parse_bearer_token(authorization_header)?.to_string()];

    config.subsystems.enable_window_post = true;

    Ok(Translation {
        config,
        advisory: WINDOW_POST_ADVISORY,
    })
}

/// Encode a raw key with the standard base64 alphabet and no padding.
pub fn encode_storage_secret(raw_secret_key: &[u8]) -> Result<String> {
    if raw_secret_key.is_empty() {
        return Err(MigrationError::Encoding);
    }
    Ok(general_purpose::STANDARD_NO_PAD.encode(raw_secret_key))
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer_token(header: &str) -> Result<&str> {
    let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        MigrationError::BearerParse(format!("expected \"{}<token>\"", BEARER_PREFIX))
    })?;
    if token.is_empty() {
        return Err(MigrationError::BearerParse("empty bearer token".to_string()));
    }
    Ok(token)
}
