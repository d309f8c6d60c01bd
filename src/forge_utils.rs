use tracing::info;

use crate::chains::{ChainMeta, VerifierKind};
use crate::config::VerificationConfig;
use crate::error::Result;
use crate::receipt::Library;
use crate::registry::ChainRegistry;
use crate::types::ChecksumAddress;

pub mod common;
pub mod script;
pub mod verify;

pub use self::common::{CommandLine, ContractSpec, ExternalDep};
pub use self::script::ForgeScript;
pub use self::verify::ForgeVerify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCommands {
    /// `None` until an implementation has been deployed.
    pub verify_command: Option<String>,
    pub upgrade_command: String,
}

/// Builds the verify and upgrade commands for a chain. Nothing is executed.
///
/// Every library in the registry must map to a declaration path, a verify
/// command without one of its links would be wrong without saying so.
pub fn synthesize(
    registry: &ChainRegistry,
    meta: &ChainMeta,
    settings: &VerificationConfig,
) -> Result<SynthesizedCommands> {
    let verify_command = match registry.implementation.non_zero() {
        Some(implementation) => Some(verify_command(
            registry,
            implementation,
            meta,
            settings,
        )?),
        None => {
            info!(chain = meta.alias, "No implementation to verify yet");
            None
        }
    };

    Ok(SynthesizedCommands {
        verify_command,
        upgrade_command: upgrade_command(registry, meta, settings),
    })
}

fn verify_command(
    registry: &ChainRegistry,
    implementation: &ChecksumAddress,
    meta: &ChainMeta,
    settings: &VerificationConfig,
) -> Result<String> {
    let spec: ContractSpec = settings.contract.parse()?;

    let compiler_version = match meta.verifier {
        VerifierKind::Sourcify => {
            &settings.sourcify_compiler_version
        }
        _ => &settings.compiler_version,
    };

    let mut forge_verify = ForgeVerify::new(
        spec,
        implementation.clone(),
        meta.verifier,
        &meta.verifier_url,
    )
    .with_rpc_url(meta.alias)
    .with_api_key_env(&settings.api_key_env)
    .with_compiler_version(compiler_version)
    .with_optimizer_runs(settings.optimizer_runs);

    for (name, address) in &registry.libraries {
        let library = Library::lookup(name)?;

        forge_verify = forge_verify.with_external_dep(ExternalDep::new(
            library.contract_spec(),
            address.clone(),
        ));
    }

    Ok(forge_verify.render())
}

fn upgrade_command(
    registry: &ChainRegistry,
    meta: &ChainMeta,
    settings: &VerificationConfig,
) -> String {
    let target = if registry.proxy.is_zero() {
        &settings.deploy_proxy_script
    } else {
        &settings.upgrade_proxy_script
    };

    ForgeScript::new(target)
        .with_env("IMPLEMENTATION", &registry.implementation)
        .with_rpc_url(meta.alias)
        .with_chain(meta.id)
        .with_broadcast()
        .with_verification(
            meta.verifier,
            &meta.verifier_url,
            Some(settings.api_key_env.as_str()),
        )
        .render()
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::chains::Chain;
    use crate::checksum::{ChecksumBackend, Normalizer};
    use crate::error::Error;

    const IMPL: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const PROXY: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
    const LIB: &str = "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb";

    fn addr(s: &str) -> ChecksumAddress {
        Normalizer::new(ChecksumBackend::Canonical)
            .normalize(s)
            .unwrap()
    }

    fn deployed(chain: Chain) -> ChainRegistry {
        let mut registry = ChainRegistry::seed(chain.meta().id);
        registry.implementation = addr(IMPL);
        registry.proxy = addr(PROXY);
        registry
            .libraries
            .insert("QueryFluid".to_string(), addr(LIB));
        registry
    }

    #[test]
    fn no_implementation_means_no_verify_command() -> eyre::Result<()> {
        let meta = Chain::Base.meta();
        let registry = ChainRegistry::seed(meta.id);

        let commands =
            synthesize(&registry, &meta, &VerificationConfig::default())?;

        assert!(commands.verify_command.is_none());
        assert!(commands
            .upgrade_command
            .contains("forge script script/DeployProxy.s.sol:DeployProxy"));

        Ok(())
    }

    #[test]
    fn etherscan_verify_command() -> eyre::Result<()> {
        let meta = Chain::Base.meta();

        let commands = synthesize(
            &deployed(Chain::Base),
            &meta,
            &VerificationConfig::default(),
        )?;

        let expected = indoc! {r#"
            forge verify-contract \
              0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed \
              src/Quote.sol:QueryData \
              --verifier etherscan \
              --verifier-url "https://api.etherscan.io/v2/api?chainid=8453" \
              --etherscan-api-key $ETHERSCAN_API_KEY \
              --num-of-optimizations 200 \
              --compiler-version v0.8.17+commit.8df45f5f \
              --libraries src/extLib/QueryFluid.sol:QueryFluid:0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb \
              --watch"#};

        assert_eq!(commands.verify_command.as_deref(), Some(expected));

        Ok(())
    }

    #[test]
    fn sourcify_verify_command() -> eyre::Result<()> {
        let meta = Chain::Monad.meta();

        let commands = synthesize(
            &deployed(Chain::Monad),
            &meta,
            &VerificationConfig::default(),
        )?;

        let expected = indoc! {r#"
            forge verify-contract \
              --rpc-url monad \
              --verifier sourcify \
              --verifier-url 'https://sourcify-api-monad.blockvision.org/' \
              --compiler-version 0.8.17 \
              --num-of-optimizations 200 \
              --libraries src/extLib/QueryFluid.sol:QueryFluid:0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb \
              0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed \
              src/Quote.sol:QueryData"#};

        assert_eq!(commands.verify_command.as_deref(), Some(expected));
        assert!(!commands.upgrade_command.contains("--verify"));

        Ok(())
    }

    #[test]
    fn oklink_has_no_api_key() -> eyre::Result<()> {
        let meta = Chain::Xlayer.meta();

        let commands = synthesize(
            &deployed(Chain::Xlayer),
            &meta,
            &VerificationConfig::default(),
        )?;

        let verify = commands.verify_command.unwrap();
        assert!(verify.contains("--verifier oklink"));
        assert!(!verify.contains("--etherscan-api-key"));
        assert!(verify.ends_with("--watch"));

        assert!(commands.upgrade_command.contains("--verifier oklink"));
        assert!(!commands.upgrade_command.contains("--etherscan-api-key"));

        Ok(())
    }

    #[test]
    fn upgrade_command_targets_existing_proxy() -> eyre::Result<()> {
        let meta = Chain::Base.meta();

        let commands = synthesize(
            &deployed(Chain::Base),
            &meta,
            &VerificationConfig::default(),
        )?;

        let expected = indoc! {r#"
            IMPLEMENTATION=0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed \
              forge script script/UpgradeProxy.s.sol:UpgradeProxy \
              --rpc-url base \
              --chain 8453 \
              --broadcast \
              --verify \
              --verifier etherscan \
              --verifier-url "https://api.etherscan.io/v2/api?chainid=8453" \
              --etherscan-api-key $ETHERSCAN_API_KEY \
              -vvvv"#};

        assert_eq!(commands.upgrade_command, expected);

        Ok(())
    }

    #[test]
    fn unmapped_library_fails() {
        let meta = Chain::Base.meta();
        let mut registry = deployed(Chain::Base);
        registry
            .libraries
            .insert("QueryCurveSuperCompact".to_string(), addr(LIB));

        assert!(matches!(
            synthesize(&registry, &meta, &VerificationConfig::default()),
            Err(Error::Validation(_))
        ));
    }
}
