use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Error, Result};
use crate::types::ChainId;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    EnumIter,
    Display,
    IntoStaticStr,
)]
pub enum Chain {
    #[strum(to_string = "eth", serialize = "ethereum")]
    Eth,
    #[strum(to_string = "bsc", serialize = "bnb")]
    Bsc,
    #[strum(to_string = "monad")]
    Monad,
    #[strum(to_string = "base")]
    Base,
    #[strum(to_string = "op", serialize = "optimism")]
    Op,
    #[strum(to_string = "arb", serialize = "arbitrum")]
    Arb,
    #[strum(to_string = "polygon", serialize = "matic")]
    Polygon,
    #[strum(to_string = "blast")]
    Blast,
    #[strum(to_string = "avax", serialize = "avalanche")]
    Avax,
    #[strum(to_string = "unichain")]
    Unichain,
    #[strum(to_string = "xlayer")]
    Xlayer,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VerifierKind {
    Etherscan,
    Sourcify,
    Oklink,
}

impl VerifierKind {
    /// Whether `forge script --broadcast` can verify in the same invocation.
    pub fn verifies_on_broadcast(self) -> bool {
        matches!(self, Self::Etherscan | Self::Oklink)
    }

    pub fn takes_api_key(self) -> bool {
        matches!(self, Self::Etherscan)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMeta {
    pub alias: &'static str,
    pub id: ChainId,
    pub verifier: VerifierKind,
    pub verifier_url: String,
    pub display_name: &'static str,
}

fn etherscan_v2(chain_id: u64) -> String {
    format!("https://api.etherscan.io/v2/api?chainid={chain_id}")
}

impl Chain {
    pub fn from_alias(alias: &str) -> Result<Self> {
        Self::from_str(&alias.trim().to_lowercase()).map_err(|_| {
            Error::Validation(format!("Unknown chain \"{alias}\""))
        })
    }

    pub fn meta(self) -> ChainMeta {
        let (id, verifier, display_name) = match self {
            Self::Eth => (1, VerifierKind::Etherscan, "Ethereum Mainnet"),
            Self::Bsc => (56, VerifierKind::Etherscan, "BNB Smart Chain"),
            Self::Monad => (143, VerifierKind::Sourcify, "Monad"),
            Self::Base => (8453, VerifierKind::Etherscan, "Base"),
            Self::Op => (10, VerifierKind::Etherscan, "Optimism"),
            Self::Arb => (42161, VerifierKind::Etherscan, "Arbitrum One"),
            Self::Polygon => (137, VerifierKind::Etherscan, "Polygon"),
            Self::Blast => (81457, VerifierKind::Etherscan, "Blast"),
            Self::Avax => (43114, VerifierKind::Etherscan, "Avalanche C-Chain"),
            Self::Unichain => (130, VerifierKind::Etherscan, "Unichain"),
            Self::Xlayer => (196, VerifierKind::Oklink, "X Layer"),
        };

        let verifier_url = match self {
            Self::Monad => "https://sourcify-api-monad.blockvision.org/".to_string(),
            Self::Xlayer => "https://www.oklink.com/api/v5/explorer/contract/verify-source-code-plugin/xlayer".to_string(),
            _ => etherscan_v2(id),
        };

        ChainMeta {
            alias: self.into(),
            id: ChainId(id),
            verifier,
            verifier_url,
            display_name,
        }
    }
}
