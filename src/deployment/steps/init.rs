use tracing::{info, instrument};

use crate::deployment::DeploymentContext;
use crate::registry;

#[instrument(skip_all, fields(chain = context.meta.alias))]
pub async fn run(context: &DeploymentContext) -> eyre::Result<()> {
    let path = registry::create(context.deployed_dir(), &context.meta).await?;

    info!(path = %path.display(), "Created registry");
    println!("Created {}", path.display());

    Ok(())
}
