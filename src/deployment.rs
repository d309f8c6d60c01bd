use eyre::WrapErr;

use self::steps::{init, prepare, reconcile, sync_upgrade};
use crate::chains::Chain;
use crate::cli::{Args, Command};
use crate::config::Config;

pub mod deployment_context;
pub mod steps;

pub use self::deployment_context::DeploymentContext;

pub async fn run(args: Args) -> eyre::Result<()> {
    // Resolved before the config or any registry is read.
    let chain = Chain::from_alias(args.command.chain())?;

    let config_path = args.config.as_ref().map(|path| args.root.join(path));
    let config = Config::load(config_path.as_deref())
        .await
        .wrap_err("Failed to load config")?;

    let context = DeploymentContext::new(args.root, config, chain);

    match args.command {
        Command::Reconcile { .. } => reconcile::run(&context).await?,
        Command::Prepare { target, .. } => {
            prepare::run(&context, target.as_deref()).await?
        }
        Command::SyncUpgrade {
            new_impl, target, ..
        } => {
            sync_upgrade::run(&context, new_impl.as_deref(), target.as_deref())
                .await?
        }
        Command::Init { .. } => init::run(&context).await?,
    }

    Ok(())
}
