//! The legacy miner repo on disk.
//!
//! Only read access is needed: the config file, the keystore, and the API
//! endpoint files a running miner writes next to them.

pub mod keystore;

pub use keystore::{key_file_name, FsKeyStore, StoredKey, JWT_SECRET_NAME};

use crate::api_info::ApiInfo;
use crate::config::{expand_home, LegacyMinerConfig};
use crate::error::{MigrationError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of a miner repo
pub const DEFAULT_MINER_REPO: &str = "~/.lotusminer";

const CONFIG_FILE: &str = "config.toml";
const KEYSTORE_DIR: &str = "keystore";

/// An opened miner repo
#[derive(Debug, Clone)]
pub struct LegacyRepo {
    path: PathBuf,
}

impl LegacyRepo {
    /// Open the repo at `path`, expanding a leading `~`.
    ///
    /// Fails when the directory or its config.toml does not exist.
    pub fn open(path: &str) -> Result<Self> {
        let path = expand_home(path);
        if !path.is_dir() {
            return Err(MigrationError::repo_access(format!(
                "repo not initialized: {}",
                path.display()
            )));
        }
        let repo = Self { path };
        if !repo.config_path().is_file() {
            return Err(MigrationError::repo_access(format!(
                "repo not initialized: missing {}",
                repo.config_path().display()
            )));
        }
        debug!("Opened miner repo at {}", repo.path.display());
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    /// Whole config.toml as text
    pub fn read_config_text(&self) -> Result<String> {
        fs::read_to_string(self.config_path()).map_err(|e| {
            MigrationError::repo_access(format!("could not read {}: {}", CONFIG_FILE, e))
        })
    }

    /// Parsed miner config
    pub fn load_config(&self) -> Result<LegacyMinerConfig> {
        LegacyMinerConfig::from_toml_str(&self.read_config_text()?)
    }

    pub fn keystore(&self) -> Result<FsKeyStore> {
        let dir = self.path.join(KEYSTORE_DIR);
        if !dir.is_dir() {
            return Err(MigrationError::secret_lookup(
                KEYSTORE_DIR,
                format!("keystore err: {} is not a directory", dir.display()),
            ));
        }
        Ok(FsKeyStore::new(dir))
    }

    /// API endpoint of the running miner
    pub fn api_info(&self) -> Result<ApiInfo> {
        ApiInfo::from_repo(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_repo_is_not_initialized() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = LegacyRepo::open(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, MigrationError::RepoAccess(ref m) if m.contains("not initialized")));
    }

    #[test]
    fn repo_without_config_is_rejected() {
        let dir = tempdir().unwrap();
        let err = LegacyRepo::open(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, MigrationError::RepoAccess(_)));
    }

    #[test]
    fn loads_config_and_keystore() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "[HarmonyDB]\nPort = \"5432\"\n").unwrap();
        fs::create_dir(dir.path().join("keystore")).unwrap();

        let repo = LegacyRepo::open(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(repo.load_config().unwrap().harmony_db.port, "5432");
        assert_eq!(repo.keystore().unwrap().root(), dir.path().join("keystore"));
    }
}
