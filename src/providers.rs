//! Sources of the values a migration cannot read from config.toml: the miner
//! actor address, the JWT signing key and the chain node's API token.
//!
//! Each is a trait so the migration can be driven from a live node or from
//! fixed values.

use crate::api_info::{ApiInfo, FULLNODE_API_INFO_ENV};
use crate::config::expand_home;
use crate::error::{MigrationError, Result};
use crate::repo::{FsKeyStore, LegacyRepo};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Default location of the chain node repo
pub const DEFAULT_FULLNODE_REPO: &str = "~/.lotus";

/// Environment variable overriding the chain node repo location
pub const LOTUS_PATH_ENV: &str = "LOTUS_PATH";

const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Yields the on-chain actor address of the node being migrated
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn actor_address(&self) -> Result<String>;
}

/// Yields raw private keys by keystore name
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn private_key(&self, name: &str) -> Result<Vec<u8>>;
}

/// Yields the `Authorization` header value for the chain node API
#[async_trait]
pub trait ApiInfoProvider: Send + Sync {
    async fn auth_header(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Asks the running miner for its actor address over JSON-RPC.
pub struct MinerRpcIdentity {
    client: reqwest::Client,
    api: ApiInfo,
}

impl MinerRpcIdentity {
    const PROVIDER: &'static str = "storage miner API";

    pub fn new(api: ApiInfo) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .map_err(|e| MigrationError::identity_lookup(Self::PROVIDER, e))?;
        Ok(Self { client, api })
    }

    /// Use the `api` and `token` files of an opened miner repo
    pub fn from_repo(repo: &LegacyRepo) -> Result<Self> {
        let api = repo
            .api_info()
            .map_err(|e| MigrationError::identity_lookup(Self::PROVIDER, e))?;
        Self::new(api)
    }
}

#[async_trait]
impl IdentityProvider for MinerRpcIdentity {
    async fn actor_address(&self) -> Result<String> {
        let url = self
            .api
            .http_url("v0")
            .map_err(|e| MigrationError::identity_lookup(Self::PROVIDER, e))?;
        debug!("Requesting actor address from {}", url);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "Filecoin.ActorAddress",
            "params": [],
            "id": 1,
        });
        let response: RpcResponse<String> = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.api.auth_header())
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| MigrationError::identity_lookup(Self::PROVIDER, e))?
            .json()
            .await
            .map_err(|e| MigrationError::identity_lookup(Self::PROVIDER, e))?;

        if let Some(err) = response.error {
            return Err(MigrationError::identity_lookup(
                Self::PROVIDER,
                format!("rpc error {}: {}", err.code, err.message),
            ));
        }
        response
            .result
            .ok_or_else(|| MigrationError::identity_lookup(Self::PROVIDER, "empty rpc result"))
    }
}

#[async_trait]
impl SecretProvider for FsKeyStore {
    async fn private_key(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.get(name)?.private_key)
    }
}

/// Chain node API info from `FULLNODE_API_INFO`, else from the chain node
/// repo (`LOTUS_PATH`, default `~/.lotus`).
#[derive(Debug, Clone, Default)]
pub struct FullNodeApiInfo {
    env_value: Option<String>,
    repo_path: Option<String>,
}

impl FullNodeApiInfo {
    const PROVIDER: &'static str = "full node API info";

    /// Resolve sources from the process environment
    pub fn from_env() -> Self {
        Self {
            env_value: std::env::var(FULLNODE_API_INFO_ENV).ok(),
            repo_path: std::env::var(LOTUS_PATH_ENV).ok(),
        }
    }

    pub fn with_sources(env_value: Option<String>, repo_path: Option<String>) -> Self {
        Self {
            env_value,
            repo_path,
        }
    }

    pub fn resolve(&self) -> Result<ApiInfo> {
        if let Some(value) = self.env_value.as_deref().filter(|v| !v.is_empty()) {
            return ApiInfo::parse(value)
                .map_err(|e| MigrationError::api_info(FULLNODE_API_INFO_ENV, e));
        }
        let repo = expand_home(self.repo_path.as_deref().unwrap_or(DEFAULT_FULLNODE_REPO));
        ApiInfo::from_repo(&repo).map_err(|e| MigrationError::api_info(Self::PROVIDER, e))
    }
}

#[async_trait]
impl ApiInfoProvider for FullNodeApiInfo {
    async fn auth_header(&self) -> Result<String> {
        Ok(self.resolve()?.auth_header())
    }
}

/// Fixed actor address
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn actor_address(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fixed key returned for every name
#[derive(Clone)]
pub struct StaticSecret(pub Vec<u8>);

#[async_trait]
impl SecretProvider for StaticSecret {
    async fn private_key(&self, _name: &str) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// Fixed `Authorization` header value
#[derive(Clone)]
pub struct StaticApiInfo(pub String);

#[async_trait]
impl ApiInfoProvider for StaticApiInfo {
    async fn auth_header(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
