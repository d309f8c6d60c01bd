use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::types::ChecksumAddress;

const CONTINUATION: &str = " \\\n  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpec {
    pub path: Option<PathBuf>,
    pub name: String,
}

impl ContractSpec {
    pub fn path_name(path: impl Into<PathBuf>, name: impl ToString) -> Self {
        Self {
            path: Some(path.into()),
            name: name.to_string(),
        }
    }

    pub fn name(name: impl ToString) -> Self {
        Self {
            path: None,
            name: name.to_string(),
        }
    }
}

impl FromStr for ContractSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((path, name)) if !path.is_empty() && !name.is_empty() => {
                Ok(Self::path_name(path, name))
            }
            Some(_) => Err(Error::Validation(format!(
                "Malformed contract spec {s:?}"
            ))),
            None => Ok(Self::name(s)),
        }
    }
}

/// A library linked at a known address, rendered as `path:Name:address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDep {
    pub contract_spec: ContractSpec,
    pub address: ChecksumAddress,
}

impl ExternalDep {
    pub fn new(contract_spec: ContractSpec, address: ChecksumAddress) -> Self {
        Self {
            contract_spec,
            address,
        }
    }
}

impl fmt::Display for ContractSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = self.path.as_deref() {
            write!(f, "{}:{}", path.display(), self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl fmt::Display for ExternalDep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contract_spec, self.address)
    }
}

/// Shell command text, one argument group per line.
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    segments: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl ToString) -> Self {
        Self {
            segments: vec![program.to_string()],
        }
    }

    pub fn arg(&mut self, arg: impl ToString) -> &mut Self {
        self.segments.push(arg.to_string());
        self
    }

    pub fn flag(&mut self, flag: &str, value: impl fmt::Display) -> &mut Self {
        self.segments.push(format!("{flag} {value}"));
        self
    }

    pub fn render(&self) -> String {
        self.segments.join(CONTINUATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_contract_specs() -> eyre::Result<()> {
        let spec: ContractSpec = "src/Quote.sol:QueryData".parse()?;
        assert_eq!(spec, ContractSpec::path_name("src/Quote.sol", "QueryData"));
        assert_eq!(spec.to_string(), "src/Quote.sol:QueryData");

        let bare: ContractSpec = "QueryData".parse()?;
        assert_eq!(bare.to_string(), "QueryData");

        assert!("src/Quote.sol:".parse::<ContractSpec>().is_err());

        Ok(())
    }

    #[test]
    fn renders_continuations() {
        let mut cmd = CommandLine::new("forge verify-contract");
        cmd.arg("0xabc").flag("--verifier", "etherscan").arg("--watch");

        assert_eq!(
            cmd.render(),
            "forge verify-contract \\\n  0xabc \\\n  --verifier etherscan \\\n  --watch"
        );
    }
}
