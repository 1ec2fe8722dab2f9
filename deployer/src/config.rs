use std::fmt;

use alloy::signers::local::PrivateKeySigner;

use crate::{
    account::signer_from_private_key,
    chain::ChainId,
    error::DeployError,
    pimlico::{ensure_sponsorship, pimlico_bundler_rpc_url, pimlico_paymaster_rpc_url},
};

/// Secrets read from the environment. Missing values are empty strings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub pimlico_api_key: String,
    pub private_key: String,
}

impl Credentials {
    pub fn new(pimlico_api_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            pimlico_api_key: pimlico_api_key.into(),
            private_key: private_key.into(),
        }
    }

    /// Signer of the direct variant. Fails with `InvalidInput` when unset.
    pub fn signer(&self) -> Result<PrivateKeySigner, DeployError> {
        signer_from_private_key(&self.private_key)
    }

    pub fn ensure_sponsorship(&self, chain: ChainId) -> Result<(), DeployError> {
        ensure_sponsorship(chain, &self.pimlico_api_key)
    }

    pub fn sponsorship_available(&self, chain: ChainId) -> bool {
        self.ensure_sponsorship(chain).is_ok()
    }

    pub fn bundler_rpc_url(&self, chain: ChainId) -> String {
        pimlico_bundler_rpc_url(chain, &self.pimlico_api_key)
    }

    pub fn paymaster_rpc_url(&self, chain: ChainId) -> String {
        pimlico_paymaster_rpc_url(chain, &self.pimlico_api_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("pimlico_api_key", &redact(&self.pimlico_api_key))
            .field("private_key", &redact(&self.private_key))
            .finish()
    }
}
