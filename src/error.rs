//! Error types for the miner-to-layer migration.
//!
//! Every step of a migration returns immediately on failure; nothing is
//! retried and nothing already written to the layer store is rolled back.

use crate::layers::StoreError;

/// Hint appended to every store connectivity failure.
pub const STORE_REMEDIATION_HINT: &str =
    "Ensure the miner config.toml's HarmonyDB entry is setup to reach Yugabyte correctly";

/// Unified error type for a migration run.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The legacy repo does not exist or cannot be opened
    #[error("repo access error: {0}")]
    RepoAccess(String),

    /// The legacy config.toml is not valid TOML for the expected schema
    #[error("could not decode toml: {0}")]
    ConfigDecode(#[from] toml::de::Error),

    /// The target config could not be serialized
    #[error("could not encode provider config: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// The layer store could not be reached
    #[error("could not reach the database. {hint}: {reason}")]
    StoreUnreachable { reason: String, hint: &'static str },

    /// The requested layer already exists and overwrite was not granted
    #[error("the overwrite flag is needed to replace existing layer: {0}")]
    DuplicateLayer(String),

    /// The store rejected an insert on a title the pre-check considered free
    #[error("layer {title} already exists in the store (another migration may have created it)")]
    StoreIntegrity { title: String },

    /// Any other store failure
    #[error("layer store error: {0}")]
    Store(String),

    /// The keystore lookup failed
    #[error("error getting {name}: {reason}")]
    SecretLookup { name: String, reason: String },

    /// The actor address lookup failed
    #[error("could not read actor address from {provider}: {reason}")]
    IdentityLookup { provider: String, reason: String },

    /// The miner address resolved to an empty string
    #[error("miner address is empty")]
    MissingIdentity,

    /// The chain API info lookup failed
    #[error("cannot read API from {provider}: {reason}")]
    ApiInfo { provider: String, reason: String },

    /// The Authorization header is not of the form `Bearer <token>`
    #[error("malformed authorization header: {0}")]
    BearerParse(String),

    /// The raw secret key is empty
    #[error("cannot encode an empty storage RPC secret")]
    Encoding,

    /// IO errors while reading repo files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrationError {
    /// Create a repo access error with context
    pub fn repo_access<S: Into<String>>(msg: S) -> Self {
        Self::RepoAccess(msg.into())
    }

    /// Create a secret lookup error for the named key
    pub fn secret_lookup<N: Into<String>, R: ToString>(name: N, reason: R) -> Self {
        Self::SecretLookup {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an identity lookup error naming the provider
    pub fn identity_lookup<P: Into<String>, R: ToString>(provider: P, reason: R) -> Self {
        Self::IdentityLookup {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an API info error naming the provider
    pub fn api_info<P: Into<String>, R: ToString>(provider: P, reason: R) -> Self {
        Self::ApiInfo {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<StoreError> for MigrationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unreachable(reason) => MigrationError::StoreUnreachable {
                reason,
                hint: STORE_REMEDIATION_HINT,
            },
            StoreError::Integrity { title } => MigrationError::StoreIntegrity { title },
            StoreError::Backend(msg) => MigrationError::Store(msg),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_store_carries_hint() {
        let err: MigrationError = StoreError::Unreachable("connection refused".into()).into();
        let msg = err.to_string();
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("HarmonyDB"));
    }

    #[test]
    fn integrity_failure_names_title() {
        let err: MigrationError = StoreError::Integrity {
            title: "mig3".into(),
        }
        .into();
        assert!(matches!(err, MigrationError::StoreIntegrity { ref title } if title == "mig3"));
        assert!(err.to_string().contains("mig3"));
    }

    #[test]
    fn duplicate_layer_message() {
        let err = MigrationError::DuplicateLayer("prod".into());
        assert_eq!(
            err.to_string(),
            "the overwrite flag is needed to replace existing layer: prod"
        );
    }
}
