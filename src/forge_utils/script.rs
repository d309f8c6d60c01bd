use super::common::CommandLine;
use crate::chains::VerifierKind;
use crate::types::ChainId;

/// `forge script` invocation that broadcasts a deployment or upgrade.
#[derive(Debug)]
pub struct ForgeScript {
    target: String,
    env: Vec<(String, String)>,
    rpc_url: Option<String>,
    chain: Option<ChainId>,
    broadcast: bool,
    verification: Option<ScriptVerification>,
}

#[derive(Debug)]
struct ScriptVerification {
    verifier: VerifierKind,
    verifier_url: String,
    api_key_env: Option<String>,
}

impl ForgeScript {
    pub fn new(target: impl ToString) -> Self {
        Self {
            target: target.to_string(),
            env: vec![],
            rpc_url: None,
            chain: None,
            broadcast: false,
            verification: None,
        }
    }

    pub fn with_env(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl ToString) -> Self {
        self.rpc_url = Some(rpc_url.to_string());
        self
    }

    pub fn with_chain(mut self, chain: ChainId) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_broadcast(mut self) -> Self {
        self.broadcast = true;
        self
    }

    /// Adds `--verify` flags, only for verifiers that support verifying
    /// during a broadcast.
    pub fn with_verification(
        mut self,
        verifier: VerifierKind,
        verifier_url: impl ToString,
        api_key_env: Option<&str>,
    ) -> Self {
        if verifier.verifies_on_broadcast() {
            self.verification = Some(ScriptVerification {
                verifier,
                verifier_url: verifier_url.to_string(),
                api_key_env: api_key_env.map(str::to_string),
            });
        }
        self
    }

    pub fn render(&self) -> String {
        let mut cmd = if self.env.is_empty() {
            CommandLine::new(format!("forge script {}", self.target))
        } else {
            let mut cmd = CommandLine::new(
                self.env
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            cmd.arg(format!("forge script {}", self.target));
            cmd
        };

        if let Some(rpc_url) = &self.rpc_url {
            cmd.flag("--rpc-url", rpc_url);
        }

        if let Some(chain) = self.chain {
            cmd.flag("--chain", chain);
        }

        if self.broadcast {
            cmd.arg("--broadcast");
        }

        if let Some(verification) = &self.verification {
            cmd.arg("--verify");
            cmd.flag("--verifier", verification.verifier);
            cmd.flag(
                "--verifier-url",
                format!("\"{}\"", verification.verifier_url),
            );

            if verification.verifier.takes_api_key() {
                if let Some(api_key_env) = &verification.api_key_env {
                    cmd.flag("--etherscan-api-key", format!("${api_key_env}"));
                }
            }
        }

        cmd.arg("-vvvv");

        cmd.render()
    }
}
