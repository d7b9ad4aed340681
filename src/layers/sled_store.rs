use super::{LayerStore, StoreError, LAYER_TABLE};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;

/// Layer store on an embedded sled database.
///
/// One tree keyed by title; the value is the raw config text. Inserts use
/// `compare_and_swap` from an absent key so title uniqueness is enforced
/// atomically.
#[derive(Clone)]
pub struct SledLayerStore {
    db: sled::Db,
    layers: sled::Tree,
}

fn backend(op: &'static str) -> impl Fn(sled::Error) -> StoreError {
    move |e| StoreError::Backend(format!("{} failed: {}", op, e))
}

impl SledLayerStore {
    /// Wrap an already opened database
    pub fn new(db: sled::Db) -> Result<Self, StoreError> {
        let layers = db.open_tree(LAYER_TABLE).map_err(backend("open tree"))?;
        Ok(Self { db, layers })
    }

    /// Open (or create) a database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            StoreError::Unreachable(format!(
                "cannot open layer database at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::new(db)
    }

    /// Gets a reference to the underlying database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.layers.flush().map_err(backend("flush"))?;
        Ok(())
    }
}

#[async_trait]
impl LayerStore for SledLayerStore {
    async fn list_non_empty_titles(&self) -> Result<BTreeSet<String>, StoreError> {
        let mut titles = BTreeSet::new();
        for entry in self.layers.iter() {
            let (key, value) = entry.map_err(backend("scan"))?;
            if value.is_empty() {
                continue;
            }
            titles.insert(String::from_utf8_lossy(&key).to_string());
        }
        Ok(titles)
    }

    async fn insert_layer(&self, title: &str, config: &str) -> Result<(), StoreError> {
        let swapped = self
            .layers
            .compare_and_swap(title.as_bytes(), None as Option<&[u8]>, Some(config.as_bytes()))
            .map_err(backend("insert"))?;
        if swapped.is_err() {
            return Err(StoreError::Integrity {
                title: title.to_string(),
            });
        }
        self.flush()
    }

    async fn replace_layer(&self, title: &str, config: &str) -> Result<bool, StoreError> {
        let key = title.as_bytes();
        if !self.layers.contains_key(key).map_err(backend("lookup"))? {
            return Ok(false);
        }
        self.layers
            .insert(key, config.as_bytes())
            .map_err(backend("replace"))?;
        self.flush()?;
        Ok(true)
    }

    async fn get_layer(&self, title: &str) -> Result<Option<String>, StoreError> {
        let value = self.layers.get(title.as_bytes()).map_err(backend("get"))?;
        Ok(value.map(|v| String::from_utf8_lossy(&v).to_string()))
    }
}
