use regex::Regex;
use tracing::{debug, warn};

use crate::checksum::Normalizer;
use crate::error::{Error, Result};
use crate::registry::ChainRegistry;
use crate::types::ChecksumAddress;

/// Where a constant's value comes from in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    Implementation,
    Proxy,
    ProxyAdmin,
    Protocol {
        group: &'static str,
        name: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantSpec {
    pub name: &'static str,
    pub visibility: &'static str,
    pub source: AddressSource,
}

impl ConstantSpec {
    const fn public(name: &'static str, source: AddressSource) -> Self {
        Self {
            name,
            visibility: "public",
            source,
        }
    }

    const fn internal(name: &'static str, source: AddressSource) -> Self {
        Self {
            name,
            visibility: "internal",
            source,
        }
    }

    /// Captures the declaration prefix and the literal separately. Only a
    /// declaration that starts its line matches, commented-out copies don't.
    fn declaration_pattern(&self) -> Result<Regex> {
        Ok(Regex::new(&format!(
            r"(?m)^([ \t]*address\s+{}\s+constant\s+{}\s*=\s*)(0x[0-9a-fA-F]{{40}})\b",
            regex::escape(self.visibility),
            regex::escape(self.name),
        ))?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SourceTemplate {
    pub constants: &'static [ConstantSpec],
    pub network_comment: bool,
}

const fn protocol(group: &'static str, name: &'static str) -> AddressSource {
    AddressSource::Protocol { group, name }
}

pub const QUOTE_TEMPLATE: SourceTemplate = SourceTemplate {
    constants: &[
        ConstantSpec::public("POOL_MANAGER", protocol("uniswapV4", "poolManager")),
        ConstantSpec::public("STATE_VIEW", protocol("uniswapV4", "stateView")),
        ConstantSpec::public(
            "POSITION_MANAGER",
            protocol("uniswapV4", "positionManager"),
        ),
        ConstantSpec::public("FLUID_LITE_DEX", protocol("fluidLite", "dex")),
        ConstantSpec::public(
            "FLUID_LITE_DEPLOYER_CONTRACT",
            protocol("fluidLite", "deployerContract"),
        ),
        ConstantSpec::public("FLUID_LIQUIDITY", protocol("fluid", "liquidity")),
        ConstantSpec::public("FLUID_DEX_V2", protocol("fluid", "dexV2")),
    ],
    network_comment: true,
};

pub const UPGRADE_SCRIPT_TEMPLATE: SourceTemplate = SourceTemplate {
    constants: &[
        ConstantSpec::internal("PROXY", AddressSource::Proxy),
        ConstantSpec::internal("PROXY_ADMIN", AddressSource::ProxyAdmin),
        ConstantSpec::internal(
            "NEW_IMPLEMENTATION",
            AddressSource::Implementation,
        ),
    ],
    network_comment: false,
};

const NETWORK_COMMENT_PATTERN: &str =
    r"// Core contract addresses \([^)\r\n]*\)";

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConstantOutcome {
    #[display(fmt = "substituted {} -> {}", from, to)]
    Substituted { from: String, to: String },
    #[display(fmt = "already {}", _0)]
    AlreadyCurrent(String),
    #[display(fmt = "no declaration found")]
    DeclarationNotFound { had_value: bool },
    #[display(fmt = "no registry value, left unchanged")]
    NoRegistryValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CommentOutcome {
    #[display(fmt = "rewritten")]
    Rewritten,
    #[display(fmt = "already current")]
    AlreadyCurrent,
    #[display(fmt = "not found")]
    NotFound,
    #[display(fmt = "not applicable")]
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateReport {
    pub constants: Vec<(&'static str, ConstantOutcome)>,
    pub network_comment: CommentOutcome,
}

impl TemplateReport {
    #[cfg(test)]
    pub fn outcome(&self, name: &str) -> Option<&ConstantOutcome> {
        self.constants
            .iter()
            .find(|(constant, _)| *constant == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn changed(&self) -> bool {
        self.network_comment == CommentOutcome::Rewritten
            || self.constants.iter().any(|(_, outcome)| {
                matches!(outcome, ConstantOutcome::Substituted { .. })
            })
    }

    /// Fails when a constant had a value to write but its declaration is
    /// gone from the template, e.g. after a rename.
    pub fn ensure_no_drift(&self) -> Result<()> {
        let missing: Vec<_> = self
            .constants
            .iter()
            .filter(|(_, outcome)| {
                matches!(
                    outcome,
                    ConstantOutcome::DeclarationNotFound { had_value: true }
                )
            })
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "Constant declaration not found for {}",
                missing.join(", ")
            )))
        }
    }
}

fn resolve(
    registry: &ChainRegistry,
    source: AddressSource,
    normalizer: &Normalizer,
) -> Result<Option<ChecksumAddress>> {
    let value = match source {
        AddressSource::Implementation => {
            registry.implementation.non_zero().cloned()
        }
        AddressSource::Proxy => registry.proxy.non_zero().cloned(),
        AddressSource::ProxyAdmin => registry.proxy_admin.non_zero().cloned(),
        // Protocol entries are explicit, the sentinel is a real value there.
        AddressSource::Protocol { group, name } => registry
            .protocol_address(group, name)
            .map(|address| normalizer.normalize(address))
            .transpose()?,
    };

    Ok(value)
}

/// Rewrites the address literal of every constant in `template` and, if the
/// template asks for it, the network comment line. Nothing else in `text`
/// is touched.
pub fn apply(
    text: &str,
    registry: &ChainRegistry,
    template: &SourceTemplate,
    network: &str,
    normalizer: &Normalizer,
) -> Result<(String, TemplateReport)> {
    let mut out = text.to_string();
    let mut constants = Vec::with_capacity(template.constants.len());

    for spec in template.constants {
        let value = resolve(registry, spec.source, normalizer)?;
        let pattern = spec.declaration_pattern()?;

        let Some(captures) = pattern.captures(&out) else {
            warn!(constant = spec.name, "Declaration not found");
            constants.push((
                spec.name,
                ConstantOutcome::DeclarationNotFound {
                    had_value: value.is_some(),
                },
            ));
            continue;
        };

        let Some(value) = value else {
            constants.push((spec.name, ConstantOutcome::NoRegistryValue));
            continue;
        };

        let (range, current) = match captures.get(2) {
            Some(literal) => (literal.range(), literal.as_str().to_string()),
            None => {
                constants.push((
                    spec.name,
                    ConstantOutcome::DeclarationNotFound { had_value: true },
                ));
                continue;
            }
        };

        if current == value.as_str() {
            constants.push((spec.name, ConstantOutcome::AlreadyCurrent(current)));
            continue;
        }

        debug!(constant = spec.name, from = %current, to = %value, "Substituting");

        out.replace_range(range, value.as_str());
        constants.push((
            spec.name,
            ConstantOutcome::Substituted {
                from: current,
                to: value.to_string(),
            },
        ));
    }

    let network_comment = if template.network_comment {
        rewrite_network_comment(&mut out, network)?
    } else {
        CommentOutcome::Skipped
    };

    Ok((
        out,
        TemplateReport {
            constants,
            network_comment,
        },
    ))
}

fn rewrite_network_comment(
    text: &mut String,
    network: &str,
) -> Result<CommentOutcome> {
    let pattern = Regex::new(NETWORK_COMMENT_PATTERN)?;
    let desired = format!("// Core contract addresses ({network})");

    let Some(found) = pattern.find(text) else {
        return Ok(CommentOutcome::NotFound);
    };

    if found.as_str() == desired {
        return Ok(CommentOutcome::AlreadyCurrent);
    }

    let range = found.range();
    text.replace_range(range, &desired);

    Ok(CommentOutcome::Rewritten)
}
