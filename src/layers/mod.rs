//! Named configuration layers and the policy for creating them.
//!
//! A layer is a row `(title, config)` in the `harmony_config` table. Titles
//! are unique; rows with empty `config` are invisible to listing. The
//! [`LayerClient`] owns the naming rules (derived names, duplicate policy)
//! and the `"base"` bootstrap, and delegates persistence to a [`LayerStore`].

pub mod pg_store;
pub mod sled_store;

pub use pg_store::PgLayerStore;
pub use sled_store::SledLayerStore;

use crate::config::ProviderConfig;
use crate::error::{MigrationError, Result};
use async_trait::async_trait;
use log::{debug, info};
use std::collections::BTreeSet;

/// Title of the mandatory default layer
pub const BASE_LAYER: &str = "base";

/// Name of the table (or tree) holding the layers
pub const LAYER_TABLE: &str = "harmony_config";

/// Prefix of names derived when the operator does not choose one
pub const DERIVED_NAME_PREFIX: &str = "mig";

/// Errors surfaced by a layer store backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    /// Uniqueness on `title` was violated by an insert
    #[error("a layer titled {title} already exists")]
    Integrity { title: String },
    #[error("{0}")]
    Backend(String),
}

/// Persistence for layer rows.
///
/// Implementations must enforce title uniqueness themselves: `insert_layer`
/// on an existing title is an [`StoreError::Integrity`] failure, never an
/// overwrite.
#[async_trait]
pub trait LayerStore: Send + Sync {
    /// Titles of all rows whose config is non-empty
    async fn list_non_empty_titles(&self) -> std::result::Result<BTreeSet<String>, StoreError>;

    /// Insert a new row
    async fn insert_layer(&self, title: &str, config: &str) -> std::result::Result<(), StoreError>;

    /// Replace the content of an existing row, returns false if no row matched
    async fn replace_layer(&self, title: &str, config: &str)
        -> std::result::Result<bool, StoreError>;

    /// Content of a row, if present
    async fn get_layer(&self, title: &str) -> std::result::Result<Option<String>, StoreError>;
}

#[async_trait]
impl<T: LayerStore + ?Sized> LayerStore for Box<T> {
    async fn list_non_empty_titles(&self) -> std::result::Result<BTreeSet<String>, StoreError> {
        (**self).list_non_empty_titles().await
    }

    async fn insert_layer(&self, title: &str, config: &str) -> std::result::Result<(), StoreError> {
        (**self).insert_layer(title, config).await
    }

    async fn replace_layer(
        &self,
        title: &str,
        config: &str,
    ) -> std::result::Result<bool, StoreError> {
        (**self).replace_layer(title, config).await
    }

    async fn get_layer(&self, title: &str) -> std::result::Result<Option<String>, StoreError> {
        (**self).get_layer(title).await
    }
}

/// Pick the title for a new layer.
///
/// An empty request derives `mig<N>` from the number of existing titles. The
/// derived name is not reserved; two concurrent runs may pick the same one
/// and the later insert then fails on the store's uniqueness check. An
/// existing `"base"` is never a valid target, overwrite or not.
pub fn resolve_target_name(
    requested: &str,
    existing: &BTreeSet<String>,
    overwrite_allowed: bool,
) -> Result<String> {
    if requested.is_empty() {
        return Ok(format!("{}{}", DERIVED_NAME_PREFIX, existing.len()));
    }
    if existing.contains(requested) && (!overwrite_allowed || requested == BASE_LAYER) {
        return Err(MigrationError::DuplicateLayer(requested.to_string()));
    }
    Ok(requested.to_string())
}

/// Outcome of writing the target layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerWrite {
    Inserted,
    Replaced,
}

/// Naming and persistence policy over a [`LayerStore`].
pub struct LayerClient<S> {
    store: S,
}

impl<S: LayerStore> LayerClient<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List the titles of every non-empty layer
    pub async fn list_non_empty_titles(&self) -> Result<BTreeSet<String>> {
        let titles = self.store.list_non_empty_titles().await.map_err(|e| match e {
            // Any failure to list is treated as a connectivity problem
            StoreError::Backend(msg) => StoreError::Unreachable(msg),
            other => other,
        })?;
        debug!("Found {} non-empty layers", titles.len());
        Ok(titles)
    }

    /// Create the `"base"` layer from schema defaults unless it is listed.
    ///
    /// Returns whether a row was inserted. An existing base is never touched.
    pub async fn ensure_base_layer(&self, existing: &BTreeSet<String>) -> Result<bool> {
        if existing.contains(BASE_LAYER) {
            debug!("Base layer already present");
            return Ok(false);
        }
        let defaults = ProviderConfig::default_toml()?;
        self.store.insert_layer(BASE_LAYER, &defaults).await?;
        info!("Created default {} layer", BASE_LAYER);
        Ok(true)
    }

    /// Insert a new layer row; a duplicate title surfaces as `StoreIntegrity`
    pub async fn insert_layer(&self, title: &str, config: &str) -> Result<()> {
        self.store.insert_layer(title, config).await?;
        Ok(())
    }

    /// Write the target layer.
    ///
    /// `replace` must only be set when the operator named the layer and
    /// granted overwrite. A listed title is then replaced; everything else is
    /// a plain insert, so an unapproved collision fails with `StoreIntegrity`.
    /// The base layer is never replaced.
    pub async fn write_target_layer(
        &self,
        title: &str,
        config: &str,
        existing: &BTreeSet<String>,
        replace: bool,
    ) -> Result<LayerWrite> {
        if replace && title != BASE_LAYER && existing.contains(title) {
            if self.store.replace_layer(title, config).await? {
                info!("Replaced layer {}", title);
                return Ok(LayerWrite::Replaced);
            }
            // Row vanished since listing, fall through to insert
        }
        self.insert_layer(title, config).await?;
        info!("Inserted layer {}", title);
        Ok(LayerWrite::Inserted)
    }

    /// Content of a layer, if it exists
    pub async fn get_layer(&self, title: &str) -> Result<Option<String>> {
        Ok(self.store.get_layer(title).await?)
    }
}
