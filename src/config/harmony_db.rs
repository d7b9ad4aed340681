use serde::{Deserialize, Serialize};

/// Connection settings for the shared HarmonyDB (Yugabyte/Postgres) store.
///
/// Field names follow the `[HarmonyDB]` section of the node's config.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HarmonyDbConfig {
    /// Hosts of the database cluster, first entry is tried first
    pub hosts: Vec<String>,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Kept as a string to match the on-disk format (`Port = "5433"`)
    pub port: String,
}

impl Default for HarmonyDbConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["127.0.0.1".to_string()],
            username: "yugabyte".to_string(),
            password: "yugabyte".to_string(),
            database: "yugabyte".to_string(),
            port: "5433".to_string(),
        }
    }
}

impl HarmonyDbConfig {
    /// Port parsed as a number for the database driver
    pub fn port_number(&self) -> Result<u16, std::num::ParseIntError> {
        self.port.trim().parse()
    }

    /// First configured host, falling back to the compiled-in default
    pub fn primary_host(&self) -> &str {
        self.hosts
            .first()
            .map(String::as_str)
            .unwrap_or("127.0.0.1")
    }
}
