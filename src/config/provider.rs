//! The layered provider configuration schema.
//!
//! A layer stored in the database is a (possibly partial) TOML rendering of
//! [`ProviderConfig`]. Section and key names match what the provider fleet
//! reads, which is why the serde renames below use `PascalCase`.

use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProviderConfig {
    pub subsystems: SubsystemsConfig,
    pub fees: FeesConfig,
    pub addresses: AddressesConfig,
    pub proving: ProvingConfig,
    pub journal: JournalConfig,
    pub apis: ApisConfig,
}

/// Which scheduled subsystems this provider instance serves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SubsystemsConfig {
    pub enable_window_post: bool,
    /// Zero means unlimited
    pub window_post_max_tasks: u32,
    pub enable_winning_post: bool,
    pub winning_post_max_tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FeesConfig {
    pub default_max_fee: String,
    pub max_pre_commit_gas_fee: String,
    pub max_commit_gas_fee: String,
    #[serde(rename = "MaxWindowPoStGasFee")]
    pub max_window_post_gas_fee: String,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            default_max_fee: "0.07 FIL".to_string(),
            max_pre_commit_gas_fee: "0.025 FIL".to_string(),
            max_commit_gas_fee: "0.05 FIL".to_string(),
            max_window_post_gas_fee: "5 FIL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AddressesConfig {
    pub pre_commit_control: Vec<String>,
    pub commit_control: Vec<String>,
    pub terminate_control: Vec<String>,
    pub disable_owner_fallback: bool,
    pub disable_worker_fallback: bool,
    /// Miner actors this provider acts for
    pub miner_addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProvingConfig {
    pub parallel_check_limit: u32,
    pub single_check_timeout: String,
    pub partition_check_timeout: String,
    #[serde(rename = "DisableWDPoStPreChecks")]
    pub disable_wdpost_pre_checks: bool,
    #[serde(rename = "MaxPartitionsPerPoStMessage")]
    pub max_partitions_per_post_message: u32,
}

impl Default for ProvingConfig {
    fn default() -> Self {
        Self {
            parallel_check_limit: 32,
            single_check_timeout: "10m0s".to_string(),
            partition_check_timeout: "20m0s".to_string(),
            disable_wdpost_pre_checks: false,
            max_partitions_per_post_message: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JournalConfig {
    /// Comma separated `system:event` pairs
    pub disabled_events: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApisConfig {
    /// Chain node API tokens
    pub chain_api_info: Vec<String>,
    /// Shared secret for storage RPC, raw standard base64 without padding
    #[serde(rename = "StorageRPCSecret")]
    pub storage_rpc_secret: String,
}

impl ProviderConfig {
    /// Decode TOML text into the provider schema.
    ///
    /// Keys the schema does not know are ignored and missing keys keep their
    /// defaults, so a miner config.toml decodes into its shared settings.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Serialized defaults, the content of a freshly bootstrapped base layer
    pub fn default_toml() -> Result<String> {
        Self::default().to_toml_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let text = ProviderConfig::default_toml().unwrap();
        assert!(!text.is_empty());
        assert!(text.contains("[Subsystems]"));
        assert!(text.contains("StorageRPCSecret"));
        let back = ProviderConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, ProviderConfig::default());
    }

    #[test]
    fn miner_sections_copy_shared_settings() {
        let text = r#"
[Subsystems]
EnableMining = true
EnableSealing = true

[Addresses]
PreCommitControl = ["f3abc"]
DisableOwnerFallback = true

[Proving]
ParallelCheckLimit = 128

[Fees]
MaxCommitGasFee = "0.1 FIL"
"#;
        let cfg = ProviderConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.addresses.pre_commit_control, vec!["f3abc".to_string()]);
        assert!(cfg.addresses.disable_owner_fallback);
        assert_eq!(cfg.proving.parallel_check_limit, 128);
        assert_eq!(cfg.proving.single_check_timeout, "10m0s");
        assert_eq!(cfg.fees.max_commit_gas_fee, "0.1 FIL");
        assert_eq!(cfg.fees.default_max_fee, "0.07 FIL");
        assert!(!cfg.subsystems.enable_window_post);
    }
}
