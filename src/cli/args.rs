//! CLI argument definitions
//!
//! The command surface is intentionally thin: flags are parsed here and handed
//! to the migration core as plain values.

use crate::repo::DEFAULT_MINER_REPO;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Deprecated environment variable for the miner repo
pub const LOTUS_STORAGE_PATH_ENV: &str = "LOTUS_STORAGE_PATH";

/// Main CLI structure containing global arguments and subcommands
#[derive(Parser, Debug)]
#[command(author, version, about = "Manage provider config layers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Express a database config (for lotus-provider) from an existing miner
    FromMiner(FromMinerArgs),
    /// Print the default provider config
    Default,
    /// List the titles of all non-empty layers
    List(StoreArgs),
    /// Print the content of a layer
    Get {
        /// Layer title
        title: String,
        #[command(flatten)]
        store: StoreArgs,
    },
}

/// Where the miner repo is and which layer store to use
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Specify miner repo path
    #[arg(long = "miner-repo", env = "LOTUS_MINER_PATH")]
    pub miner_repo: Option<String>,

    /// DEPRECATED, use --miner-repo
    #[arg(long = "storagerepo", hide = true)]
    pub storagerepo: Option<String>,

    /// Use an embedded layer database at this path instead of HarmonyDB
    #[arg(long)]
    pub local_store: Option<PathBuf>,
}

/// Resolved repo location and whether a deprecated source supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub path: String,
    pub deprecated_source: Option<&'static str>,
}

impl StoreArgs {
    /// Pick the miner repo: `--miner-repo`/`LOTUS_MINER_PATH`, then the
    /// deprecated `--storagerepo` flag and `LOTUS_STORAGE_PATH` variable,
    /// then the default.
    pub fn repo_location(&self, storage_path_env: Option<String>) -> RepoLocation {
        if let Some(path) = self.miner_repo.clone() {
            return RepoLocation {
                path,
                deprecated_source: None,
            };
        }
        if let Some(path) = self.storagerepo.clone() {
            return RepoLocation {
                path,
                deprecated_source: Some("--storagerepo"),
            };
        }
        if let Some(path) = storage_path_env.filter(|p| !p.is_empty()) {
            return RepoLocation {
                path,
                deprecated_source: Some(LOTUS_STORAGE_PATH_ENV),
            };
        }
        RepoLocation {
            path: DEFAULT_MINER_REPO.to_string(),
            deprecated_source: None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct FromMinerArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// The layer name for this data push. 'base' is recommended for single-miner setup.
    #[arg(long = "to-layer", short = 't', default_value = "")]
    pub to_layer: String,

    /// Use this with --to-layer to replace an existing layer
    #[arg(long = "replace", short = 'r', visible_alias = "overwrite")]
    pub overwrite: bool,
}
