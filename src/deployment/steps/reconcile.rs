use tracing::{info, instrument};

use crate::deployment::DeploymentContext;
use crate::forge_utils::{self, SynthesizedCommands};
use crate::receipt::{self, AddressExtraction};
use crate::registry::{self, ChainRegistry};

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub registry: ChainRegistry,
    pub commands: SynthesizedCommands,
}

#[instrument(skip_all, fields(script = %script))]
async fn extract_phase(
    context: &DeploymentContext,
    script: &str,
) -> eyre::Result<AddressExtraction> {
    let receipt = receipt::load(context.receipt_path(script)).await;
    let extraction = receipt::extract(receipt.as_ref(), &context.normalizer)?;

    if extraction.is_empty() {
        info!("No addresses in receipt");
    }

    Ok(extraction)
}

/// Returns `[implementation phase, proxy phase]` in merge order. The
/// implementation receipt owns the implementation address, the proxy
/// receipt only supplies one when the implementation phase has none.
async fn extract_receipts(
    context: &DeploymentContext,
) -> eyre::Result<[AddressExtraction; 2]> {
    let receipts = &context.config.receipts;

    let implementation_phase =
        extract_phase(context, &receipts.implementation_script).await?;
    let mut proxy_phase =
        extract_phase(context, &receipts.proxy_script).await?;

    if implementation_phase.implementation.is_some() {
        proxy_phase.implementation = None;
    }

    Ok([implementation_phase, proxy_phase])
}

/// Merges the latest receipts into the registry. Commands are synthesized
/// before anything is written, a registry they cannot be built from is
/// never saved.
#[instrument(skip_all, fields(chain = context.meta.alias))]
pub async fn reconcile(
    context: &DeploymentContext,
) -> eyre::Result<Reconciliation> {
    let deployed_dir = context.deployed_dir();

    let prior =
        registry::load(&deployed_dir, &context.meta, &context.normalizer)
            .await?;

    let results = extract_receipts(context).await?;
    let merged = registry::merge(&prior, &results);

    let commands = forge_utils::synthesize(
        &merged,
        &context.meta,
        &context.config.verification,
    )?;

    if merged == prior {
        info!("Registry already up to date");
    }

    registry::save(&deployed_dir, &context.meta, &merged).await?;

    Ok(Reconciliation {
        registry: merged,
        commands,
    })
}

pub async fn run(context: &DeploymentContext) -> eyre::Result<()> {
    let Reconciliation { registry, commands } = reconcile(context).await?;

    println!(
        "Registry for {} (chain {})",
        context.meta.display_name, context.meta.id
    );
    println!("  implementation: {}", registry.implementation);
    println!("  proxy:          {}", registry.proxy);
    println!("  proxyAdmin:     {}", registry.proxy_admin);
    for (name, address) in &registry.libraries {
        println!("  {name}: {address}");
    }

    println!();
    match commands.verify_command {
        Some(verify_command) => {
            println!("Verify the implementation with:\n{verify_command}")
        }
        None => println!("No implementation deployed, nothing to verify"),
    }

    println!();
    println!("Upgrade with:\n{}", commands.upgrade_command);

    if !context.normalizer.is_canonical() {
        println!();
        println!("Addresses were checksummed by the fallback backend");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::chains::Chain;
    use crate::config::Config;

    const IMPL: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const NEW_IMPL: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";
    const PROXY: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
    const LIB: &str = "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb";

    async fn write(path: &Path, content: &str) -> eyre::Result<()> {
        tokio::fs::create_dir_all(path.parent().unwrap()).await?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn receipt_json(records: &[(&str, &str)]) -> String {
        let transactions: Vec<_> = records
            .iter()
            .map(|(name, address)| {
                serde_json::json!({
                    "contractName": name,
                    "contractAddress": address.to_lowercase(),
                })
            })
            .collect();

        serde_json::json!({ "transactions": transactions }).to_string()
    }

    async fn setup(
        chain: Chain,
    ) -> eyre::Result<(tempfile::TempDir, DeploymentContext)> {
        let dir = tempfile::tempdir()?;
        let context = DeploymentContext::new(
            dir.path().to_path_buf(),
            Config::default(),
            chain,
        );

        registry::create(context.deployed_dir(), &context.meta).await?;

        Ok((dir, context))
    }

    #[tokio::test]
    async fn merges_both_phases() -> eyre::Result<()> {
        let (_dir, context) = setup(Chain::Base).await?;

        write(
            &context.receipt_path("DeployImpl.s.sol"),
            &receipt_json(&[("QueryFluid", LIB), ("QueryData", IMPL)]),
        )
        .await?;
        write(
            &context.receipt_path("DeployProxy.s.sol"),
            &receipt_json(&[
                ("QueryData", NEW_IMPL),
                ("TransparentUpgradeableProxy", PROXY),
            ]),
        )
        .await?;

        let Reconciliation { registry, commands } = reconcile(&context).await?;

        assert_eq!(registry.implementation.as_str(), IMPL);
        assert_eq!(registry.proxy.as_str(), PROXY);
        assert!(registry.proxy_admin.is_zero());
        assert_eq!(
            registry.libraries.get("QueryFluid").map(|a| a.as_str()),
            Some(LIB)
        );

        let verify = commands.verify_command.unwrap();
        assert!(verify.contains(IMPL));
        assert!(commands
            .upgrade_command
            .contains("script/UpgradeProxy.s.sol:UpgradeProxy"));

        let saved = registry::load(
            context.deployed_dir(),
            &context.meta,
            &context.normalizer,
        )
        .await?;
        assert_eq!(saved, registry);

        Ok(())
    }

    #[tokio::test]
    async fn proxy_phase_supplies_missing_implementation() -> eyre::Result<()>
    {
        let (_dir, context) = setup(Chain::Base).await?;

        write(
            &context.receipt_path("DeployProxy.s.sol"),
            &receipt_json(&[
                ("QueryData", NEW_IMPL),
                ("TransparentUpgradeableProxy", PROXY),
            ]),
        )
        .await?;

        let Reconciliation { registry, .. } = reconcile(&context).await?;

        assert_eq!(registry.implementation.as_str(), NEW_IMPL);
        assert_eq!(registry.proxy.as_str(), PROXY);

        Ok(())
    }

    #[tokio::test]
    async fn no_receipts_keeps_registry() -> eyre::Result<()> {
        let (_dir, context) = setup(Chain::Eth).await?;

        let before = registry::load(
            context.deployed_dir(),
            &context.meta,
            &context.normalizer,
        )
        .await?;

        let Reconciliation { registry, commands } = reconcile(&context).await?;

        assert_eq!(registry, before);
        assert!(commands.verify_command.is_none());
        assert!(commands.upgrade_command.starts_with(
            "IMPLEMENTATION=0x0000000000000000000000000000000000000000"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn unmapped_library_writes_nothing() -> eyre::Result<()> {
        let (_dir, context) = setup(Chain::Base).await?;

        let registry_path =
            registry::registry_path(context.deployed_dir(), &context.meta);

        // A library present in the registry that has no declaration path.
        let mut registry = registry::load(
            context.deployed_dir(),
            &context.meta,
            &context.normalizer,
        )
        .await?;
        registry.implementation = context.normalizer.normalize(IMPL)?;
        registry.libraries.insert(
            "QueryCurveSuperCompact".to_string(),
            context.normalizer.normalize(LIB)?,
        );
        registry::save(context.deployed_dir(), &context.meta, &registry)
            .await?;
        let before_reconcile = tokio::fs::read_to_string(&registry_path).await?;

        write(
            &context.receipt_path("DeployImpl.s.sol"),
            &receipt_json(&[("QueryData", NEW_IMPL)]),
        )
        .await?;

        assert!(reconcile(&context).await.is_err());
        assert_eq!(
            tokio::fs::read_to_string(&registry_path).await?,
            before_reconcile
        );

        Ok(())
    }
}
