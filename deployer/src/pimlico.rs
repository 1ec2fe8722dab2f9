//! Pimlico bundler and paymaster access for v0.6 user operations.

use std::{future::Future, marker::PhantomData, time::Duration};

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    providers::Provider,
    transports::Transport,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    chain::{ChainId, CHAIN_ALFAJORES, CHAIN_FUJI, CHAIN_SCROLL_SEPOLIA, CHAIN_SEPOLIA},
    error::DeployError,
    submit::DeploymentReceipt,
};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Pimlico's name for a chain, or `""` when it has no bundler there.
pub fn pimlico_chain_name(chain: ChainId) -> &'static str {
    match chain {
        CHAIN_SEPOLIA => "sepolia",
        CHAIN_SCROLL_SEPOLIA => "scroll-sepolia-testnet",
        CHAIN_ALFAJORES => "celo-alfajores-testnet",
        CHAIN_FUJI => "avalanche-fuji",
        _ => "",
    }
}

/// Bundler endpoint, or `""` for chains without bundler support.
pub fn pimlico_bundler_rpc_url(chain: ChainId, api_key: &str) -> String {
    match pimlico_chain_name(chain) {
        "" => String::new(),
        name => format!("https://api.pimlico.io/v1/{name}/rpc?apikey={api_key}"),
    }
}

/// Paymaster endpoint, or `""` for chains without bundler support.
pub fn pimlico_paymaster_rpc_url(chain: ChainId, api_key: &str) -> String {
    match pimlico_chain_name(chain) {
        "" => String::new(),
        name => format!("https://api.pimlico.io/v2/{name}/rpc?apikey={api_key}"),
    }
}

/// Fails with [`DeployError::UnsupportedChain`] unless sponsored deployment can
/// be attempted on `chain`. Makes no network calls.
pub fn ensure_sponsorship(chain: ChainId, api_key: &str) -> Result<(), DeployError> {
    if pimlico_bundler_rpc_url(chain, api_key).is_empty() {
        return Err(DeployError::UnsupportedChain {
            chain,
            reason: "no bundler available on this chain",
        });
    }
    if api_key.is_empty() {
        return Err(DeployError::UnsupportedChain {
            chain,
            reason: "no bundler API key configured",
        });
    }
    Ok(())
}

/// An ERC-4337 v0.6 user operation, serialized the way bundlers expect it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPrice {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GasPriceTiers {
    pub slow: GasPrice,
    pub standard: GasPrice,
    pub fast: GasPrice,
}

/// Paymaster answer to `pm_sponsorUserOperation`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sponsorship {
    pub paymaster_and_data: Bytes,
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
}

impl Sponsorship {
    pub fn apply(self, op: &mut UserOperation) {
        op.paymaster_and_data = self.paymaster_and_data;
        op.pre_verification_gas = self.pre_verification_gas;
        op.verification_gas_limit = self.verification_gas_limit;
        op.call_gas_limit = self.call_gas_limit;
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserOperationReceipt {
    success: bool,
    receipt: TransactionReceipt,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: B256,
}

/// Relays and sponsors user operations.
pub trait Bundler {
    fn user_operation_gas_price(&self) -> impl Future<Output = eyre::Result<GasPriceTiers>> + Send;

    fn sponsor_user_operation(
        &self,
        op: &UserOperation,
    ) -> impl Future<Output = eyre::Result<Sponsorship>> + Send;

    /// Returns the user-operation hash.
    fn send_user_operation(
        &self,
        op: &UserOperation,
    ) -> impl Future<Output = eyre::Result<B256>> + Send;

    fn wait_for_user_operation_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = eyre::Result<DeploymentReceipt>> + Send;
}

/// [`Bundler`] backed by Pimlico's bundler and paymaster endpoints.
pub struct PimlicoClient<P, T> {
    bundler: P,
    paymaster: P,
    entry_point: Address,
    _phantom: PhantomData<T>,
}

impl<P, T> PimlicoClient<P, T>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    /// `bundler` and `paymaster` must point at [`pimlico_bundler_rpc_url`] and
    /// [`pimlico_paymaster_rpc_url`] of the same chain.
    pub fn new(bundler: P, paymaster: P, entry_point: Address) -> Self {
        Self {
            bundler,
            paymaster,
            entry_point,
            _phantom: PhantomData,
        }
    }
}

impl<P, T> Bundler for PimlicoClient<P, T>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    async fn user_operation_gas_price(&self) -> eyre::Result<GasPriceTiers> {
        let tiers = self
            .bundler
            .raw_request("pimlico_getUserOperationGasPrice".into(), Vec::<()>::new())
            .await?;
        Ok(tiers)
    }

    async fn sponsor_user_operation(&self, op: &UserOperation) -> eyre::Result<Sponsorship> {
        let sponsorship = self
            .paymaster
            .raw_request("pm_sponsorUserOperation".into(), (op.clone(), self.entry_point))
            .await?;
        Ok(sponsorship)
    }

    async fn send_user_operation(&self, op: &UserOperation) -> eyre::Result<B256> {
        let hash = self
            .bundler
            .raw_request("eth_sendUserOperation".into(), (op.clone(), self.entry_point))
            .await?;
        Ok(hash)
    }

    async fn wait_for_user_operation_receipt(&self, hash: B256) -> eyre::Result<DeploymentReceipt> {
        let started = tokio::time::Instant::now();
        loop {
            let receipt: Option<UserOperationReceipt> = self
                .bundler
                .raw_request("eth_getUserOperationReceipt".into(), (hash,))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(DeploymentReceipt {
                    transaction_hash: receipt.receipt.transaction_hash,
                    success: receipt.success,
                });
            }
            if started.elapsed() > RECEIPT_TIMEOUT {
                eyre::bail!("timed out waiting for user operation {hash}");
            }
            debug!(user_op_hash = %hash, "User operation not included yet");
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
