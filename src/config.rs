use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checksum::ChecksumBackend;
use crate::error::Result;
use crate::serde_utils;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub receipts: ReceiptsConfig,
    pub verification: VerificationConfig,
    pub checksum: ChecksumConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub deployed_dir: PathBuf,
    pub broadcast_dir: PathBuf,
    pub source_template: PathBuf,
    pub upgrade_script: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            deployed_dir: PathBuf::from("scripts/deployed"),
            broadcast_dir: PathBuf::from("broadcast"),
            source_template: PathBuf::from("src/Quote.sol"),
            upgrade_script: PathBuf::from("script/UpgradeProxy.s.sol"),
        }
    }
}

/// Foundry writes `<broadcast_dir>/<script>/<chain id>/<file_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptsConfig {
    pub implementation_script: String,
    pub proxy_script: String,
    pub file_name: String,
}

impl Default for ReceiptsConfig {
    fn default() -> Self {
        Self {
            implementation_script: "DeployImpl.s.sol".to_string(),
            proxy_script: "DeployProxy.s.sol".to_string(),
            file_name: "run-latest.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub contract: String,
    pub compiler_version: String,
    pub sourcify_compiler_version: String,
    pub optimizer_runs: u32,
    /// Only ever written as `$NAME` into command text.
    pub api_key_env: String,
    pub deploy_proxy_script: String,
    pub upgrade_proxy_script: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            contract: "src/Quote.sol:QueryData".to_string(),
            compiler_version: "v0.8.17+commit.8df45f5f".to_string(),
            sourcify_compiler_version: "0.8.17".to_string(),
            optimizer_runs: 200,
            api_key_env: "ETHERSCAN_API_KEY".to_string(),
            deploy_proxy_script: "script/DeployProxy.s.sol:DeployProxy"
                .to_string(),
            upgrade_proxy_script: "script/UpgradeProxy.s.sol:UpgradeProxy"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksumConfig {
    pub backend: ChecksumBackend,
}

impl Config {
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => serde_utils::read_deserialize(path, "Config").await,
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn partial_config_keeps_defaults() -> eyre::Result<()> {
        let config: Config = serde_yaml::from_str(indoc! {r#"
            paths:
              source_template: contracts/Quote.sol
            verification:
              optimizer_runs: 1000
            checksum:
              backend: fallback
        "#})?;

        assert_eq!(
            config.paths.source_template,
            PathBuf::from("contracts/Quote.sol")
        );
        assert_eq!(config.paths.deployed_dir, PathBuf::from("scripts/deployed"));
        assert_eq!(config.verification.optimizer_runs, 1000);
        assert_eq!(config.verification.api_key_env, "ETHERSCAN_API_KEY");
        assert_eq!(config.checksum.backend, ChecksumBackend::Fallback);
        assert_eq!(config.receipts, ReceiptsConfig::default());

        Ok(())
    }

    #[tokio::test]
    async fn no_path_means_defaults() -> eyre::Result<()> {
        assert_eq!(Config::load(None).await?, Config::default());

        Ok(())
    }

    #[tokio::test]
    async fn explicit_missing_path_is_an_error() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;

        assert!(Config::load(Some(&dir.path().join("nope.yml")))
            .await
            .is_err());

        Ok(())
    }
}
