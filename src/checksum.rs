use ethers::types::Address;
use ethers::utils::{keccak256, to_checksum};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::ChecksumAddress;

/// Which hasher renders the mixed-case checksum.
///
/// `Canonical` delegates to the ethers implementation. `Fallback` applies the
/// nibble rule itself on top of a bare keccak digest and is flagged on every
/// use, since nothing but our own code vouches for its output.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChecksumBackend {
    #[default]
    Canonical,
    Fallback,
}

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    backend: ChecksumBackend,
}

impl Normalizer {
    pub fn new(backend: ChecksumBackend) -> Self {
        if backend == ChecksumBackend::Fallback {
            warn!(
                "Using fallback checksum backend, addresses are not rendered \
                 by the canonical hasher"
            );
        }

        Self { backend }
    }

    pub fn is_canonical(&self) -> bool {
        self.backend == ChecksumBackend::Canonical
    }

    pub fn normalize(&self, address: &str) -> Result<ChecksumAddress> {
        let digits = parse_hex_digits(address)?;

        if digits.bytes().all(|b| b == b'0') {
            return Ok(ChecksumAddress::zero());
        }

        let rendered = match self.backend {
            ChecksumBackend::Canonical => {
                let bytes = hex::decode(&digits)
                    .map_err(|_| Error::InvalidAddress(address.to_string()))?;
                to_checksum(&Address::from_slice(&bytes), None)
            }
            ChecksumBackend::Fallback => {
                warn!(address, "Fallback checksum in use");
                nibble_checksum(&digits)
            }
        };

        Ok(ChecksumAddress::from_normalized(rendered))
    }
}

/// Strips the optional `0x` marker and returns the 40 lowercase hex digits.
fn parse_hex_digits(address: &str) -> Result<String> {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);

    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidAddress(address.to_string()));
    }

    Ok(digits.to_ascii_lowercase())
}

fn nibble_checksum(lowercase_digits: &str) -> String {
    let hash = keccak256(lowercase_digits.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");

    for (i, c) in lowercase_digits.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }

    out
}
