//! The single-node miner configuration being migrated away from.

use super::HarmonyDbConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A miner's config.toml.
///
/// Only the `[HarmonyDB]` section is interpreted; every other section is kept
/// verbatim in `other` so callers can inspect it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyMinerConfig {
    #[serde(rename = "HarmonyDB", default)]
    pub harmony_db: HarmonyDbConfig,
    #[serde(flatten)]
    pub other: toml::Table,
}

impl LegacyMinerConfig {
    /// Parse a miner config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_unrelated_sections() {
        let text = r#"
[API]
ListenAddress = "/ip4/127.0.0.1/tcp/2345/http"

[HarmonyDB]
Hosts = ["10.0.0.1", "10.0.0.2"]
Port = "5432"
"#;
        let cfg = LegacyMinerConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.harmony_db.hosts.len(), 2);
        assert_eq!(cfg.harmony_db.database, "yugabyte");
        assert!(cfg.other.contains_key("API"));
    }

    #[test]
    fn missing_harmony_section_uses_defaults() {
        let cfg = LegacyMinerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.harmony_db, HarmonyDbConfig::default());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(LegacyMinerConfig::from_toml_str("[HarmonyDB\nPort=").is_err());
    }
}
