use tracing::instrument;

use super::common::{CommandLine, ContractSpec, ExternalDep};
use crate::chains::VerifierKind;
use crate::types::ChecksumAddress;

/// `forge verify-contract` for an already deployed contract.
#[derive(Debug)]
pub struct ForgeVerify {
    spec: ContractSpec,
    address: ChecksumAddress,
    verifier: VerifierKind,
    verifier_url: String,
    rpc_url: Option<String>,
    api_key_env: Option<String>,
    compiler_version: Option<String>,
    optimizer_runs: Option<u32>,
    external_deps: Vec<ExternalDep>,
}

impl ForgeVerify {
    pub fn new(
        spec: ContractSpec,
        address: ChecksumAddress,
        verifier: VerifierKind,
        verifier_url: impl ToString,
    ) -> Self {
        Self {
            spec,
            address,
            verifier,
            verifier_url: verifier_url.to_string(),
            rpc_url: None,
            api_key_env: None,
            compiler_version: None,
            optimizer_runs: None,
            external_deps: vec![],
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl ToString) -> Self {
        self.rpc_url = Some(rpc_url.to_string());
        self
    }

    pub fn with_api_key_env(mut self, api_key_env: impl ToString) -> Self {
        self.api_key_env = Some(api_key_env.to_string());
        self
    }

    pub fn with_compiler_version(
        mut self,
        compiler_version: impl ToString,
    ) -> Self {
        self.compiler_version = Some(compiler_version.to_string());
        self
    }

    pub fn with_optimizer_runs(mut self, optimizer_runs: u32) -> Self {
        self.optimizer_runs = Some(optimizer_runs);
        self
    }

    pub fn with_external_dep(mut self, external_dep: ExternalDep) -> Self {
        self.external_deps.push(external_dep);
        self
    }

    fn push_compiler_settings(&self, cmd: &mut CommandLine) {
        match self.verifier {
            // sourcify wants the compiler version before the optimizer runs
            VerifierKind::Sourcify => {
                if let Some(version) = &self.compiler_version {
                    cmd.flag("--compiler-version", version);
                }
                if let Some(runs) = self.optimizer_runs {
                    cmd.flag("--num-of-optimizations", runs);
                }
            }
            VerifierKind::Etherscan | VerifierKind::Oklink => {
                if let Some(runs) = self.optimizer_runs {
                    cmd.flag("--num-of-optimizations", runs);
                }
                if let Some(version) = &self.compiler_version {
                    cmd.flag("--compiler-version", version);
                }
            }
        }
    }

    fn push_libraries(&self, cmd: &mut CommandLine) {
        for external_dep in &self.external_deps {
            cmd.flag("--libraries", external_dep);
        }
    }

    #[instrument(name = "forge_verify", skip_all)]
    pub fn render(&self) -> String {
        let mut cmd = CommandLine::new("forge verify-contract");

        match self.verifier {
            VerifierKind::Sourcify => {
                if let Some(rpc_url) = &self.rpc_url {
                    cmd.flag("--rpc-url", rpc_url);
                }
                cmd.flag("--verifier", self.verifier);
                cmd.flag("--verifier-url", format!("'{}'", self.verifier_url));
                self.push_compiler_settings(&mut cmd);
                self.push_libraries(&mut cmd);
                cmd.arg(&self.address);
                cmd.arg(&self.spec);
            }
            VerifierKind::Etherscan | VerifierKind::Oklink => {
                cmd.arg(&self.address);
                cmd.arg(&self.spec);
                cmd.flag("--verifier", self.verifier);
                cmd.flag(
                    "--verifier-url",
                    format!("\"{}\"", self.verifier_url),
                );

                if self.verifier.takes_api_key() {
                    if let Some(api_key_env) = &self.api_key_env {
                        cmd.flag("--etherscan-api-key", format!("${api_key_env}"));
                    }
                }

                self.push_compiler_settings(&mut cmd);
                self.push_libraries(&mut cmd);
                cmd.arg("--watch");
            }
        }

        cmd.render()
    }
}
