use std::path::{Path, PathBuf};

use crate::chains::{Chain, ChainMeta};
use crate::checksum::Normalizer;
use crate::config::Config;

/// Everything a step needs for one chain, resolved once per invocation.
#[derive(Debug)]
pub struct DeploymentContext {
    pub root: PathBuf,
    pub config: Config,
    pub meta: ChainMeta,
    pub normalizer: Normalizer,
}

impl DeploymentContext {
    pub fn new(root: PathBuf, config: Config, chain: Chain) -> Self {
        let normalizer = Normalizer::new(config.checksum.backend);

        Self {
            root,
            config,
            meta: chain.meta(),
            normalizer,
        }
    }

    /// Resolves a configured path against the project root. Absolute paths
    /// are returned as is.
    pub fn project_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    pub fn deployed_dir(&self) -> PathBuf {
        self.project_path(&self.config.paths.deployed_dir)
    }

    pub fn receipt_path(&self, script: &str) -> PathBuf {
        self.project_path(&self.config.paths.broadcast_dir)
            .join(script)
            .join(self.meta.id.to_string())
            .join(&self.config.receipts.file_name)
    }
}
