//! Command handlers for the `layer-migrate` binary.

pub mod args;

pub use args::{Cli, Commands, FromMinerArgs, RepoLocation, StoreArgs, LOTUS_STORAGE_PATH_ENV};

use crate::config::ProviderConfig;
use crate::error::{MigrationError, Result};
use crate::layers::{LayerClient, LayerStore, PgLayerStore, SledLayerStore};
use crate::migration::{Migration, MigrationRequest, Providers};
use crate::providers::{FullNodeApiInfo, MinerRpcIdentity};
use crate::repo::LegacyRepo;
use log::{info, warn};

/// Open the miner repo named by the flags, warning on deprecated sources
pub fn open_repo(store: &StoreArgs) -> Result<LegacyRepo> {
    let location = store.repo_location(std::env::var(LOTUS_STORAGE_PATH_ENV).ok());
    if let Some(source) = location.deprecated_source {
        warn!(
            "{} is deprecated and will be removed soon, use --miner-repo or LOTUS_MINER_PATH",
            source
        );
    }
    LegacyRepo::open(&location.path)
}

/// Connect to the layer store: the embedded database if requested, otherwise
/// HarmonyDB using the miner config's `[HarmonyDB]` section.
pub async fn open_store(
    store: &StoreArgs,
    repo: Option<&LegacyRepo>,
) -> Result<LayerClient<Box<dyn LayerStore>>> {
    if let Some(path) = &store.local_store {
        info!("Using local layer store at {}", path.display());
        let local: Box<dyn LayerStore> = Box::new(SledLayerStore::open(path)?);
        return Ok(LayerClient::new(local));
    }
    let settings = match repo {
        Some(repo) => repo.load_config()?.harmony_db,
        None => open_repo(store)?.load_config()?.harmony_db,
    };
    let pg: Box<dyn LayerStore> = Box::new(PgLayerStore::connect(&settings).await?);
    Ok(LayerClient::new(pg))
}

/// `from-miner`: migrate the miner's config into a new layer and print the
/// follow-up instructions.
pub async fn handle_from_miner(args: FromMinerArgs) -> Result<()> {
    let repo = open_repo(&args.store)?;
    let legacy_toml = repo.read_config_text()?;
    let client = open_store(&args.store, Some(&repo)).await?;

    let identity = MinerRpcIdentity::from_repo(&repo)?;
    let keystore = repo.keystore()?;
    let api_info = FullNodeApiInfo::from_env();

    let request = MigrationRequest {
        legacy_toml,
        to_layer: args.to_layer,
        overwrite: args.overwrite,
    };
    let report = Migration::new(&client)
        .run(
            &request,
            Providers {
                identity: &identity,
                secrets: &keystore,
                api_info: &api_info,
            },
        )
        .await?;

    println!("{}", report.message);
    Ok(())
}

/// `default`: print the default provider config
pub fn handle_default() -> Result<()> {
    print!("{}", ProviderConfig::default_toml()?);
    Ok(())
}

/// `list`: print non-empty layer titles, one per line
pub async fn handle_list(store: StoreArgs) -> Result<()> {
    let client = open_store(&store, None).await?;
    for title in client.list_non_empty_titles().await? {
        println!("{}", title);
    }
    Ok(())
}

/// `get`: print a layer's content
pub async fn handle_get(title: String, store: StoreArgs) -> Result<()> {
    let client = open_store(&store, None).await?;
    match client.get_layer(&title).await? {
        Some(config) if !config.is_empty() => {
            print!("{}", config);
            Ok(())
        }
        _ => Err(MigrationError::Store(format!("layer {} not found", title))),
    }
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::FromMiner(args) => handle_from_miner(args).await,
        Commands::Default => handle_default(),
        Commands::List(store) => handle_list(store).await,
        Commands::Get { title, store } => handle_get(title, store).await,
    }
}
