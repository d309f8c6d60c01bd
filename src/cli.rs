use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[clap(rename_all = "kebab-case", version, about)]
pub struct Args {
    /// Project root, relative paths in the config resolve against it
    #[clap(long, env = "REGISTRY_SYNC_ROOT", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Path to a YAML config file, defaults apply when omitted
    #[clap(short, long, env = "REGISTRY_SYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Merge the latest broadcast receipts into the chain's registry and
    /// print the verify and upgrade commands
    Reconcile {
        /// Chain alias, e.g. 'eth', 'base' or 'arbitrum'
        chain: String,
    },

    /// Write the chain's protocol addresses into the contract source
    Prepare {
        /// Chain alias, e.g. 'eth', 'base' or 'arbitrum'
        chain: String,

        /// Source file to rewrite instead of the configured template
        #[clap(long)]
        target: Option<PathBuf>,
    },

    /// Write PROXY, PROXY_ADMIN and NEW_IMPLEMENTATION into the upgrade script
    SyncUpgrade {
        /// Chain alias, e.g. 'eth', 'base' or 'arbitrum'
        chain: String,

        /// Implementation to upgrade to, defaults to the registry's
        #[clap(long)]
        new_impl: Option<String>,

        /// Script to rewrite instead of the configured upgrade script
        #[clap(long)]
        target: Option<PathBuf>,
    },

    /// Create an empty registry for a chain
    Init {
        /// Chain alias, e.g. 'eth', 'base' or 'arbitrum'
        chain: String,
    },
}

impl Command {
    pub fn chain(&self) -> &str {
        match self {
            Self::Reconcile { chain }
            | Self::Prepare { chain, .. }
            | Self::SyncUpgrade { chain, .. }
            | Self::Init { chain } => chain,
        }
    }
}
