use clap::Parser;
use cli::Args;
use tracing_error::ErrorLayer;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub mod checksum;
pub mod forge_utils;
pub mod serde_utils;

mod chains;
mod cli;
mod config;
mod error;
mod receipt;
mod registry;
mod templating;
mod types;

mod deployment;

async fn start() -> eyre::Result<()> {
    let args = Args::parse();

    deployment::run(args).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    dotenv::dotenv().ok();

    let indicatif_layer = IndicatifLayer::new();

    let filter = EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_filter(filter),
        )
        .with(indicatif_layer)
        .with(ErrorLayer::default())
        .init();

    match start().await {
        Ok(()) => Ok(()),
        Err(report) => {
            tracing::error!("{:?}", report);
            std::process::exit(1)
        }
    }
}
