use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::{info, instrument};

use crate::chains::ChainMeta;
use crate::checksum::Normalizer;
use crate::error::{Error, Result};
use crate::receipt::{AddressExtraction, Library};
use crate::serde_utils;
use crate::types::{ChainId, ChecksumAddress};

pub const REGISTRY_FILE: &str = "registry.yml";

/// Protocol groups written by `init`, each address starts at the sentinel.
pub const SEED_PROTOCOL_GROUPS: &[(&str, &[&str])] = &[
    ("uniswapV4", &["poolManager", "stateView", "positionManager"]),
    ("fluidLite", &["dex", "deployerContract"]),
    ("fluid", &["liquidity", "dexV2"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRegistry {
    pub chain_id: ChainId,
    #[serde(default)]
    pub proxy: ChecksumAddress,
    #[serde(default)]
    pub proxy_admin: ChecksumAddress,
    #[serde(default)]
    pub implementation: ChecksumAddress,
    #[serde(default)]
    pub libraries: BTreeMap<String, ChecksumAddress>,
    /// Groups such as `uniswapV4` or `fluid`, in file order. Not touched by
    /// the merge.
    #[serde(flatten)]
    pub protocol_addresses: Mapping,
}

impl ChainRegistry {
    pub fn seed(chain_id: ChainId) -> Self {
        let mut registry = Self {
            chain_id,
            proxy: ChecksumAddress::zero(),
            proxy_admin: ChecksumAddress::zero(),
            implementation: ChecksumAddress::zero(),
            libraries: BTreeMap::new(),
            protocol_addresses: Mapping::new(),
        };

        for (group, names) in SEED_PROTOCOL_GROUPS {
            for name in *names {
                registry.set_protocol_address(
                    group,
                    name,
                    ChecksumAddress::zero().as_str(),
                );
            }
        }

        registry
    }

    pub fn protocol_address(&self, group: &str, name: &str) -> Option<&str> {
        self.protocol_addresses
            .get(group)
            .and_then(|entries| entries.get(name))
            .and_then(Value::as_str)
    }

    pub fn set_protocol_address(
        &mut self,
        group: &str,
        name: &str,
        address: &str,
    ) {
        if !self.protocol_addresses.contains_key(group) {
            self.protocol_addresses
                .insert(group.into(), Value::Mapping(Mapping::new()));
        }

        if let Some(Value::Mapping(entries)) =
            self.protocol_addresses.get_mut(group)
        {
            entries.insert(name.into(), address.into());
        }
    }

    /// Protocol groups as `(group, [(name, address)])`, failing on anything
    /// that is not a mapping of names to strings.
    fn protocol_groups(&self) -> Result<Vec<(&str, Vec<(&str, &str)>)>> {
        let mut groups = Vec::with_capacity(self.protocol_addresses.len());

        for (group, entries) in &self.protocol_addresses {
            let Some(group) = group.as_str() else {
                return Err(Error::Validation(format!(
                    "Protocol group name {group:?} is not a string"
                )));
            };

            let entries = match entries {
                Value::Mapping(entries) => entries,
                other => {
                    return Err(Error::Validation(format!(
                        "Protocol group {group} must map names to addresses, \
                         found {other:?}"
                    )))
                }
            };

            let mut pairs = Vec::with_capacity(entries.len());
            for (name, address) in entries {
                match (name.as_str(), address.as_str()) {
                    (Some(name), Some(address)) => pairs.push((name, address)),
                    _ => {
                        return Err(Error::Validation(format!(
                            "Protocol group {group} has a non-string entry \
                             {name:?}: {address:?}"
                        )))
                    }
                }
            }

            groups.push((group, pairs));
        }

        Ok(groups)
    }

    fn normalize_in_place(&mut self, normalizer: &Normalizer) -> Result<()> {
        for field in [
            &mut self.proxy,
            &mut self.proxy_admin,
            &mut self.implementation,
        ] {
            *field = normalizer.normalize(field.as_str())?;
        }

        for (name, address) in self.libraries.iter_mut() {
            Library::lookup(name)?;
            *address = normalizer.normalize(address.as_str())?;
        }

        self.protocol_groups()?;

        Ok(())
    }

    /// Renders the registry as a YAML block mapping. Field order is fixed,
    /// protocol groups keep their order and every address is double-quoted.
    pub fn to_document(&self) -> Result<String> {
        let mut out = format!("chainId: {}\n", self.chain_id);

        push_entry(&mut out, "", "proxy", &self.proxy)?;
        push_entry(&mut out, "", "proxyAdmin", &self.proxy_admin)?;
        push_entry(&mut out, "", "implementation", &self.implementation)?;

        push_block(
            &mut out,
            "libraries",
            self.libraries
                .iter()
                .map(|(name, address)| (name.as_str(), address.as_str())),
        )?;

        for (group, entries) in self.protocol_groups()? {
            push_block(&mut out, group, entries)?;
        }

        Ok(out)
    }
}

fn push_key(out: &mut String, key: &str) -> Result<()> {
    let bare = key
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if bare {
        out.push_str(key);
    } else {
        out.push_str(&serde_json::to_string(key)?);
    }

    Ok(())
}

fn push_entry(
    out: &mut String,
    indent: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    out.push_str(indent);
    push_key(out, key)?;
    out.push_str(": ");
    // A JSON string is a valid double-quoted YAML scalar.
    out.push_str(&serde_json::to_string(value)?);
    out.push('\n');

    Ok(())
}

fn push_block<'a>(
    out: &mut String,
    key: &str,
    entries: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<()> {
    let mut entries = entries.into_iter().peekable();

    push_key(out, key)?;
    if entries.peek().is_none() {
        out.push_str(": {}\n");
        return Ok(());
    }
    out.push_str(":\n");

    for (name, value) in entries {
        push_entry(out, "  ", name, value)?;
    }

    Ok(())
}

fn take_present(slot: &mut ChecksumAddress, value: &Option<ChecksumAddress>) {
    if let Some(address) = value.as_ref().and_then(|a| a.non_zero()) {
        *slot = address.clone();
    }
}

/// Folds extraction results into `prior` in order. A present value replaces
/// what came before it, an absent one never does.
pub fn merge(
    prior: &ChainRegistry,
    results: &[AddressExtraction],
) -> ChainRegistry {
    let mut merged = prior.clone();

    for result in results {
        take_present(&mut merged.implementation, &result.implementation);
        take_present(&mut merged.proxy, &result.proxy);
        take_present(&mut merged.proxy_admin, &result.proxy_admin);

        for (library, address) in &result.libraries {
            if let Some(address) = address.non_zero() {
                merged
                    .libraries
                    .insert(library.to_string(), address.clone());
            }
        }
    }

    merged
}

pub fn registry_path(deployed_dir: impl AsRef<Path>, meta: &ChainMeta) -> PathBuf {
    deployed_dir.as_ref().join(meta.alias).join(REGISTRY_FILE)
}

#[instrument(skip_all, fields(chain = meta.alias))]
pub async fn load(
    deployed_dir: impl AsRef<Path>,
    meta: &ChainMeta,
    normalizer: &Normalizer,
) -> Result<ChainRegistry> {
    let path = registry_path(deployed_dir, meta);

    let mut registry: ChainRegistry =
        serde_utils::read_deserialize(&path, "Registry").await?;

    if registry.chain_id != meta.id {
        return Err(Error::Validation(format!(
            "{} declares chainId {} but {} is chain {}",
            path.display(),
            registry.chain_id,
            meta.alias,
            meta.id
        )));
    }

    registry.normalize_in_place(normalizer)?;

    info!(path = %path.display(), "Loaded registry");

    Ok(registry)
}

#[instrument(skip_all, fields(chain = meta.alias))]
pub async fn save(
    deployed_dir: impl AsRef<Path>,
    meta: &ChainMeta,
    registry: &ChainRegistry,
) -> Result<()> {
    if registry.chain_id != meta.id {
        return Err(Error::Validation(format!(
            "Refusing to write chainId {} into the registry of {}",
            registry.chain_id, meta.alias
        )));
    }

    let path = registry_path(deployed_dir, meta);

    serde_utils::write_atomic(&path, registry.to_document()?).await?;

    info!(path = %path.display(), "Saved registry");

    Ok(())
}

/// Writes a seed registry, never over an existing one.
#[instrument(skip_all, fields(chain = meta.alias))]
pub async fn create(
    deployed_dir: impl AsRef<Path>,
    meta: &ChainMeta,
) -> Result<PathBuf> {
    let path = registry_path(deployed_dir, meta);

    if path.exists() {
        return Err(Error::Validation(format!(
            "Registry already exists at {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let document = ChainRegistry::seed(meta.id).to_document()?;
    serde_utils::write_atomic(&path, document).await?;

    Ok(path)
}
