use alloy::{
    primitives::{eip191_hash_message, Address},
    signers::local::PrivateKeySigner,
};

use crate::{error::DeployError, nickname::nickname};

/// A signing key derived from a passphrase.
///
/// The key is the EIP-191 hash of the passphrase. This is a demo convenience
/// and must not guard real funds.
#[derive(Debug, Clone)]
pub struct Account {
    signer: PrivateKeySigner,
}

impl Account {
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn nickname(&self) -> String {
        nickname(self.address())
    }
}

/// Derives the account for `passphrase`. The same passphrase always yields the
/// same address; the empty passphrase is accepted.
pub fn derive_account(passphrase: &str) -> Result<Account, DeployError> {
    let key = eip191_hash_message(passphrase);
    let signer = PrivateKeySigner::from_bytes(&key)
        .map_err(|e| DeployError::invalid(format!("passphrase does not map to a key: {e}")))?;

    Ok(Account { signer })
}

/// Parses a raw hex private key, with or without `0x`.
pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner, DeployError> {
    if private_key.is_empty() {
        return Err(DeployError::invalid("no private key configured"));
    }
    private_key
        .parse()
        .map_err(|e| DeployError::invalid(format!("invalid private key: {e}")))
}
