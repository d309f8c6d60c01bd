use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{info, warn};

use crate::checksum::Normalizer;
use crate::error::{Error, Result};
use crate::forge_utils::ContractSpec;
use crate::serde_utils;
use crate::types::ChecksumAddress;

pub const IMPLEMENTATION_CONTRACT: &str = "QueryData";
pub const PROXY_CONTRACT: &str = "TransparentUpgradeableProxy";
pub const PROXY_ADMIN_CONTRACT: &str = "ProxyAdmin";

/// Libraries linked into the implementation contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    EnumIter,
    Display,
)]
pub enum Library {
    QueryAlgebraTicksSuperCompact,
    QueryZoraTicksSuperCompact,
    QueryUniv4TicksSuperCompact,
    QueryUniv3TicksSuperCompact,
    QueryPancakeInfinityLBReserveSuperCompact,
    QueryIzumiSuperCompact,
    QueryHorizonTicksSuperCompact,
    QueryFluidLite,
    QueryFluid,
}

impl Library {
    pub fn lookup(name: &str) -> Result<Self> {
        name.parse().map_err(|_| {
            Error::Validation(format!("No declaration path for library {name}"))
        })
    }

    /// Declaration the library is linked against.
    pub fn contract_spec(self) -> ContractSpec {
        ContractSpec::path_name(format!("src/extLib/{self}.sol"), self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRole {
    Implementation,
    Proxy,
    ProxyAdmin,
    Library(Library),
}

impl ContractRole {
    pub fn classify(contract_name: &str) -> Option<Self> {
        match contract_name {
            IMPLEMENTATION_CONTRACT => Some(Self::Implementation),
            PROXY_CONTRACT => Some(Self::Proxy),
            PROXY_ADMIN_CONTRACT => Some(Self::ProxyAdmin),
            other => other.parse().ok().map(Self::Library),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressExtraction {
    pub implementation: Option<ChecksumAddress>,
    pub proxy: Option<ChecksumAddress>,
    pub proxy_admin: Option<ChecksumAddress>,
    pub libraries: BTreeMap<Library, ChecksumAddress>,
}

impl AddressExtraction {
    pub fn is_empty(&self) -> bool {
        self.implementation.is_none()
            && self.proxy.is_none()
            && self.proxy_admin.is_none()
            && self.libraries.is_empty()
    }
}

/// Reads a broadcast receipt. A missing or unreadable file is `None`, a
/// single phase of a deployment only leaves one of them behind.
pub async fn load(path: impl AsRef<Path>) -> Option<DeploymentReceipt> {
    let path = path.as_ref();

    match serde_utils::read_json::<DeploymentReceipt>(path, "Receipt").await {
        Ok(receipt) => {
            info!(
                path = %path.display(),
                transactions = receipt.transactions.len(),
                "Loaded receipt"
            );
            Some(receipt)
        }
        Err(Error::NotFound { .. }) => {
            info!(path = %path.display(), "No receipt");
            None
        }
        Err(err) => {
            warn!(path = %path.display(), "Ignoring unreadable receipt: {err}");
            None
        }
    }
}

pub fn extract(
    receipt: Option<&DeploymentReceipt>,
    normalizer: &Normalizer,
) -> Result<AddressExtraction> {
    let mut extraction = AddressExtraction::default();

    let Some(receipt) = receipt else {
        return Ok(extraction);
    };

    for tx in &receipt.transactions {
        let (Some(name), Some(address)) =
            (tx.contract_name.as_deref(), tx.contract_address.as_deref())
        else {
            continue;
        };

        let Some(role) = ContractRole::classify(name) else {
            continue;
        };

        let address = normalizer.normalize(address)?;
        if address.is_zero() {
            continue;
        }

        // Later records win, receipts are in execution order.
        match role {
            ContractRole::Implementation => {
                extraction.implementation = Some(address)
            }
            ContractRole::Proxy => extraction.proxy = Some(address),
            ContractRole::ProxyAdmin => extraction.proxy_admin = Some(address),
            ContractRole::Library(library) => {
                extraction.libraries.insert(library, address);
            }
        }
    }

    Ok(extraction)
}
