//! Configuration schemas for the migration
//!
//! This module holds the legacy miner config (the input), the layered provider
//! config (the output) and the HarmonyDB connection section they share.

pub mod harmony_db;
pub mod legacy;
pub mod provider;

pub use harmony_db::HarmonyDbConfig;
pub use legacy::LegacyMinerConfig;
pub use provider::{
    AddressesConfig, ApisConfig, FeesConfig, JournalConfig, ProviderConfig, ProvingConfig,
    SubsystemsConfig,
};

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a tilde, or when the home directory is unknown, are returned
/// unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_unchanged() {
        assert_eq!(expand_home("/var/lib/miner"), PathBuf::from("/var/lib/miner"));
    }

    #[test]
    fn tilde_prefix_is_expanded() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.lotusminer"), home.join(".lotusminer"));
        }
    }
}
