//! One migration run: miner config.toml in, a new provider layer out.
//!
//! The run is strictly sequential: `Idle → TitlesListed → [BaseEnsured] →
//! LayerInserted → Done`, aborting at the first failure. Nothing written
//! before a failure is rolled back, so a base layer created by a failed run
//! stays in the store.

use crate::config::{HarmonyDbConfig, LegacyMinerConfig};
use crate::error::Result;
use crate::follow_up::follow_up_message;
use crate::layers::{resolve_target_name, LayerClient, LayerStore, LayerWrite, BASE_LAYER};
use crate::providers::{ApiInfoProvider, IdentityProvider, SecretProvider};
use crate::repo::JWT_SECRET_NAME;
use crate::translate::translate;
use log::{debug, error, info};
use std::fmt;

/// Progress of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Idle,
    TitlesListed,
    BaseEnsured,
    LayerInserted,
    Done,
    Failed,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::TitlesListed => "titles-listed",
            Self::BaseEnsured => "base-ensured",
            Self::LayerInserted => "layer-inserted",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the operator asked for
#[derive(Debug, Clone, Default)]
pub struct MigrationRequest {
    /// Raw text of the miner's config.toml
    pub legacy_toml: String,
    /// Requested layer title, empty to derive one
    pub to_layer: String,
    /// Permit replacing an existing layer of the same title
    pub overwrite: bool,
}

/// External collaborators of a run
pub struct Providers<'a> {
    pub identity: &'a dyn IdentityProvider,
    pub secrets: &'a dyn SecretProvider,
    pub api_info: &'a dyn ApiInfoProvider,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub layer: String,
    pub base_created: bool,
    pub replaced: bool,
    /// Guidance to print for the operator
    pub message: String,
}

/// Drives a single migration against a layer store.
pub struct Migration<'a, S> {
    client: &'a LayerClient<S>,
    phase: MigrationPhase,
}

impl<'a, S: LayerStore> Migration<'a, S> {
    pub fn new(client: &'a LayerClient<S>) -> Self {
        Self {
            client,
            phase: MigrationPhase::Idle,
        }
    }

    pub fn phase(&self) -> MigrationPhase {
        self.phase
    }

    fn advance(&mut self, next: MigrationPhase) {
        debug!("Migration {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Run to completion, or stop at the first error with phase `Failed`.
    pub async fn run(
        &mut self,
        request: &MigrationRequest,
        providers: Providers<'_>,
    ) -> Result<MigrationReport> {
        match self.run_steps(request, providers).await {
            Ok(report) => {
                self.advance(MigrationPhase::Done);
                Ok(report)
            }
            Err(e) => {
                error!("Migration failed after phase {}: {}", self.phase, e);
                self.advance(MigrationPhase::Failed);
                Err(e)
            }
        }
    }

    async fn run_steps(
        &mut self,
        request: &MigrationRequest,
        providers: Providers<'_>,
    ) -> Result<MigrationReport> {
        let legacy = LegacyMinerConfig::from_toml_str(&request.legacy_toml)?;

        let existing = self.client.list_non_empty_titles().await?;
        self.advance(MigrationPhase::TitlesListed);

        let layer = resolve_target_name(&request.to_layer, &existing, request.overwrite)?;
        // Derived names are never approved for overwrite
        let replace = request.overwrite && !request.to_layer.is_empty();
        info!("Migrating miner config into layer {}", layer);

        let miner_address = providers.identity.actor_address().await?;
        let secret = providers.secrets.private_key(JWT_SECRET_NAME).await?;
        let header = providers.api_info.auth_header().await?;

        let translation = translate(&request.legacy_toml, &miner_address, &secret, &header)?;
        let config_toml = translation.to_toml_string()?;

        let mut base_created = false;
        if layer != BASE_LAYER {
            base_created = self.client.ensure_base_layer(&existing).await?;
            self.advance(MigrationPhase::BaseEnsured);
        }

        let write = self
            .client
            .write_target_layer(&layer, &config_toml, &existing, replace)
            .await?;
        self.advance(MigrationPhase::LayerInserted);

        let message = follow_up_message(
            &layer,
            translation.advisory,
            &legacy.harmony_db,
            &HarmonyDbConfig::default(),
        );

        Ok(MigrationReport {
            layer,
            base_created,
            replaced: write == LayerWrite::Replaced,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::SledLayerStore;
    use crate::providers::{StaticApiInfo, StaticIdentity, StaticSecret};

    fn temp_client() -> LayerClient<SledLayerStore> {
        let db = sled::Config::new().temporary(true).open().unwrap();
        LayerClient::new(SledLayerStore::new(db).unwrap())
    }

    #[tokio::test]
    async fn phases_end_in_done() {
        let client = temp_client();
        let identity = StaticIdentity("f01000".into());
        let secrets = StaticSecret(b"key".to_vec());
        let api = StaticApiInfo("Bearer tok".into());

        let mut migration = Migration::new(&client);
        assert_eq!(migration.phase(), MigrationPhase::Idle);
        let report = migration
            .run(
                &MigrationRequest::default(),
                Providers {
                    identity: &identity,
                    secrets: &secrets,
                    api_info: &api,
                },
            )
            .await
            .unwrap();
        assert_eq!(migration.phase(), MigrationPhase::Done);
        assert_eq!(report.layer, "mig0");
        assert!(report.base_created);
        assert!(!report.replaced);
    }

    #[tokio::test]
    async fn provider_failure_leaves_store_untouched() {
        let client = temp_client();
        let identity = StaticIdentity(String::new());
        let secrets = StaticSecret(b"key".to_vec());
        let api = StaticApiInfo("Bearer tok".into());

        let mut migration = Migration::new(&client);
        let err = migration
            .run(
                &MigrationRequest::default(),
                Providers {
                    identity: &identity,
                    secrets: &secrets,
                    api_info: &api,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::MigrationError::MissingIdentity));
        assert_eq!(migration.phase(), MigrationPhase::Failed);
        assert!(client.list_non_empty_titles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn migrating_into_base_skips_bootstrap() {
        let client = temp_client();
        let identity = StaticIdentity("f01000".into());
        let secrets = StaticSecret(b"key".to_vec());
        let api = StaticApiInfo("Bearer tok".into());

        let request = MigrationRequest {
            to_layer: BASE_LAYER.into(),
            ..Default::default()
        };
        let report = Migration::new(&client)
            .run(
                &request,
                Providers {
                    identity: &identity,
                    secrets: &secrets,
                    api_info: &api,
                },
            )
            .await
            .unwrap();
        assert!(!report.base_created);
        let base = client.get_layer(BASE_LAYER).await.unwrap().unwrap();
        assert!(base.contains("f01000"));
    }
}
