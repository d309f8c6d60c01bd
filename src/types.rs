use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

macro_rules! impl_primitive_num {
    (pub struct $outer:ident($tname:ty)) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            Serialize,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Deserialize,
            Shrinkwrap,
        )]
        #[serde(transparent)]
        pub struct $outer(pub $tname);

        impl std::fmt::Display for $outer {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

impl_primitive_num!(pub struct ChainId(u64));

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// An address rendered as `0x` + 40 hex digits.
///
/// Values produced by [`crate::checksum::Normalizer`] are in mixed-case
/// checksum form, the zero address doubles as the "not deployed" sentinel.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Shrinkwrap,
)]
#[serde(transparent)]
pub struct ChecksumAddress(String);

impl ChecksumAddress {
    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(ZERO_ADDRESS.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0
            .trim_start_matches("0x")
            .trim_start_matches("0X")
            .chars()
            .all(|c| c == '0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `None` for the sentinel, so callers can treat "not deployed" as absent.
    pub fn non_zero(&self) -> Option<&Self> {
        if self.is_zero() {
            None
        } else {
            Some(self)
        }
    }
}

impl Default for ChecksumAddress {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for ChecksumAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
