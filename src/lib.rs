//! Migration of a single-node miner configuration into named provider config
//! layers stored in a shared database.
//!
//! The pieces are the [`translate`] step (miner config → provider config), the
//! [`layers`] naming and persistence policy, and the [`follow_up`] guidance
//! composed once the layer is written. [`migration`] wires them into one run.

pub mod api_info;
pub mod cli;
pub mod config;
pub mod error;
pub mod follow_up;
pub mod layers;
pub mod migration;
pub mod providers;
pub mod repo;
pub mod translate;

pub use config::{HarmonyDbConfig, LegacyMinerConfig, ProviderConfig};
pub use error::{MigrationError, Result};
pub use layers::{
    resolve_target_name, LayerClient, LayerStore, LayerWrite, PgLayerStore, SledLayerStore,
    StoreError, BASE_LAYER,
};
pub use migration::{Migration, MigrationPhase, MigrationReport, MigrationRequest, Providers};
pub use translate::{translate, Translation};
