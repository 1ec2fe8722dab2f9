//! Login state of one user: passphrase, selected chain and the values derived
//! from them.

use std::collections::HashMap;

use alloy::primitives::Address;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    account::{derive_account, Account},
    chain::{self, ChainId, CHAIN_SEPOLIA},
    error::DeployError,
    safe::SafeAddressResolver,
};

pub struct Session {
    passphrase: String,
    chain: ChainId,
    account: Account,
    // Inputs the published Safe address was computed from.
    resolved_for: Option<(Address, ChainId)>,
    safe_tx: watch::Sender<Address>,
}

impl Session {
    pub fn new() -> Result<Self, DeployError> {
        let (safe_tx, _) = watch::channel(Address::ZERO);
        Ok(Self {
            passphrase: String::new(),
            chain: CHAIN_SEPOLIA,
            account: derive_account("")?,
            resolved_for: None,
            safe_tx,
        })
    }

    /// True once a non-empty passphrase is set.
    pub fn is_authorized(&self) -> bool {
        !self.passphrase.is_empty()
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    pub fn nickname(&self) -> String {
        self.account.nickname()
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn login(&mut self, passphrase: impl Into<String>) -> Result<(), DeployError> {
        let passphrase = passphrase.into();
        self.account = derive_account(&passphrase)?;
        self.passphrase = passphrase;
        self.invalidate_safe_address();
        info!(address = %self.address(), authorized = self.is_authorized(), "Logged in");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), DeployError> {
        self.login("")
    }

    pub fn set_chain(&mut self, chain: ChainId) -> Result<(), DeployError> {
        chain::require(chain)?;
        self.chain = chain;
        self.invalidate_safe_address();
        Ok(())
    }

    // Publishes zero until the Safe of the current inputs is resolved.
    fn invalidate_safe_address(&mut self) {
        if self.is_authorized() && self.resolved_for == Some((self.address(), self.chain)) {
            return;
        }
        self.resolved_for = None;
        self.safe_tx.send_if_modified(|safe| {
            let changed = !safe.is_zero();
            *safe = Address::ZERO;
            changed
        });
    }

    /// Observers of the Safe address; zero while unresolved or logged out.
    pub fn subscribe(&self) -> watch::Receiver<Address> {
        self.safe_tx.subscribe()
    }

    pub fn safe_address(&self) -> Address {
        *self.safe_tx.borrow()
    }

    /// Recomputes the Safe address if the account or chain changed since the
    /// last call, and publishes it.
    pub async fn refresh_safe_address<R>(&mut self, resolver: &R) -> eyre::Result<Address>
    where
        R: SafeAddressResolver,
    {
        if !self.is_authorized() {
            self.resolved_for = None;
            self.safe_tx.send_replace(Address::ZERO);
            return Ok(Address::ZERO);
        }

        let inputs = (self.address(), self.chain);
        if self.resolved_for == Some(inputs) {
            debug!(safe = %self.safe_address(), "Safe address unchanged");
            return Ok(self.safe_address());
        }

        let safe = resolver.safe_address(self.chain, self.address()).await?;
        self.resolved_for = Some(inputs);
        self.safe_tx.send_replace(safe);
        info!(%safe, chain = self.chain, "Safe address resolved");

        Ok(safe)
    }
}

/// Safes discovered per chain, and the one currently selected.
#[derive(Debug, Default, Clone)]
pub struct SafeBook {
    safes: HashMap<ChainId, Vec<Address>>,
    selected: Option<Address>,
}

impl SafeBook {
    /// Records `safe` under `chain`. The first Safe of a chain is selected.
    pub fn add(&mut self, chain: ChainId, safe: Address) {
        let safes = self.safes.entry(chain).or_default();
        if safes.contains(&safe) {
            return;
        }
        safes.push(safe);
        if safes.len() == 1 {
            self.selected = Some(safe);
        }
    }

    pub fn select(&mut self, safe: Address) {
        self.selected = Some(safe);
    }

    pub fn selected(&self) -> Option<Address> {
        self.selected
    }

    pub fn clear(&mut self, chain: ChainId) {
        self.safes.remove(&chain);
        self.selected = None;
    }

    pub fn chain_safes(&self, chain: ChainId) -> &[Address] {
        self.safes.get(&chain).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_safes(&self, chain: ChainId) -> bool {
        !self.chain_safes(chain).is_empty()
    }
}
