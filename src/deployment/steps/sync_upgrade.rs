use std::path::Path;

use tracing::{info, instrument};

use super::prepare::{print_report, rewrite_source};
use crate::deployment::DeploymentContext;
use crate::registry;
use crate::templating::UPGRADE_SCRIPT_TEMPLATE;

/// Points the upgrade script at the registry's proxy. `new_impl` replaces
/// the implementation for this rewrite only, the registry is left as is.
#[instrument(skip_all, fields(chain = context.meta.alias))]
pub async fn run(
    context: &DeploymentContext,
    new_impl: Option<&str>,
    target: Option<&Path>,
) -> eyre::Result<()> {
    let path = context.project_path(
        target.unwrap_or(context.config.paths.upgrade_script.as_path()),
    );

    let mut registry = registry::load(
        context.deployed_dir(),
        &context.meta,
        &context.normalizer,
    )
    .await?;

    if let Some(new_impl) = new_impl {
        let new_impl = context.normalizer.normalize(new_impl)?;
        info!(implementation = %new_impl, "Overriding implementation");
        registry.implementation = new_impl;
    }

    let report =
        rewrite_source(context, &path, &registry, &UPGRADE_SCRIPT_TEMPLATE)
            .await?;

    print_report(&path, &report);

    println!();
    println!(
        "Run the upgrade with:\n  forge script {} --rpc-url {} --broadcast",
        context.config.verification.upgrade_proxy_script, context.meta.alias
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::chains::Chain;
    use crate::config::Config;
    use crate::error::Error;

    const PROXY: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
    const ADMIN: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";
    const IMPL: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const OVERRIDE: &str = "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb";

    const UPGRADE: &str = indoc! {"
        contract UpgradeProxy is Script {
            address internal constant PROXY = 0x0000000000000000000000000000000000000000;
            address internal constant PROXY_ADMIN = 0x0000000000000000000000000000000000000000;
            address internal constant NEW_IMPLEMENTATION = 0x0000000000000000000000000000000000000000;
        }
    "};

    async fn setup() -> eyre::Result<(tempfile::TempDir, DeploymentContext)>
    {
        let dir = tempfile::tempdir()?;
        let context = DeploymentContext::new(
            dir.path().to_path_buf(),
            Config::default(),
            Chain::Arb,
        );

        registry::create(context.deployed_dir(), &context.meta).await?;

        let mut registry = registry::load(
            context.deployed_dir(),
            &context.meta,
            &context.normalizer,
        )
        .await?;
        registry.proxy = context.normalizer.normalize(PROXY)?;
        registry.proxy_admin = context.normalizer.normalize(ADMIN)?;
        registry.implementation = context.normalizer.normalize(IMPL)?;
        registry::save(context.deployed_dir(), &context.meta, &registry)
            .await?;

        tokio::fs::create_dir_all(dir.path().join("script")).await?;
        tokio::fs::write(
            context.project_path("script/UpgradeProxy.s.sol"),
            UPGRADE,
        )
        .await?;

        Ok((dir, context))
    }

    #[tokio::test]
    async fn writes_registry_addresses() -> eyre::Result<()> {
        let (_dir, context) = setup().await?;

        run(&context, None, None).await?;

        let script = tokio::fs::read_to_string(
            context.project_path("script/UpgradeProxy.s.sol"),
        )
        .await?;

        assert!(script
            .contains(&format!("address internal constant PROXY = {PROXY};")));
        assert!(script.contains(&format!(
            "address internal constant PROXY_ADMIN = {ADMIN};"
        )));
        assert!(script.contains(&format!(
            "address internal constant NEW_IMPLEMENTATION = {IMPL};"
        )));

        Ok(())
    }

    #[tokio::test]
    async fn override_is_not_persisted() -> eyre::Result<()> {
        let (_dir, context) = setup().await?;

        run(&context, Some(&OVERRIDE.to_lowercase()), None).await?;

        let script = tokio::fs::read_to_string(
            context.project_path("script/UpgradeProxy.s.sol"),
        )
        .await?;
        assert!(script.contains(&format!(
            "address internal constant NEW_IMPLEMENTATION = {OVERRIDE};"
        )));

        let registry = registry::load(
            context.deployed_dir(),
            &context.meta,
            &context.normalizer,
        )
        .await?;
        assert_eq!(registry.implementation.as_str(), IMPL);

        Ok(())
    }

    #[tokio::test]
    async fn malformed_override_is_rejected() -> eyre::Result<()> {
        let (_dir, context) = setup().await?;

        let err = run(&context, Some("0x1234"), None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidAddress(_))
        ));

        let script = tokio::fs::read_to_string(
            context.project_path("script/UpgradeProxy.s.sol"),
        )
        .await?;
        assert_eq!(script, UPGRADE);

        Ok(())
    }
}
