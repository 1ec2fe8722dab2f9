use std::{future::Future, marker::PhantomData, time::Duration};

use alloy::{
    network::{Network, ReceiptResponse},
    primitives::{Address, B256, U256},
    providers::Provider,
    transports::Transport,
};
use tracing::{debug, info};

use super::{DeploymentReceipt, Submitter};
use crate::{bindings::IBytecodeRouter, error::DeployError, request::DeploymentPlan};

/// Fixed legacy gas price of the direct variant: 100 gwei.
pub const GAS_PRICE_WEI: u128 = 100_000_000_000;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Adds a 50% margin on top of a gas estimate.
pub fn inflate_gas_limit(estimate: u64) -> u64 {
    estimate.saturating_mul(15) / 10
}

/// Signs and broadcasts router calls from an externally owned account.
pub trait RouterClient {
    fn estimate_deploy_gas(
        &self,
        router: Address,
        call: &IBytecodeRouter::deployCall,
        value: U256,
    ) -> impl Future<Output = eyre::Result<u64>> + Send;

    fn send_deploy(
        &self,
        router: Address,
        call: &IBytecodeRouter::deployCall,
        value: U256,
        gas_limit: u64,
        gas_price: u128,
    ) -> impl Future<Output = eyre::Result<B256>> + Send;

    fn wait_for_receipt(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = eyre::Result<DeploymentReceipt>> + Send;
}

/// [`RouterClient`] over a provider that carries the signing wallet.
pub struct RpcRouterClient<P, T, N> {
    provider: P,
    _phantom: PhantomData<(T, N)>,
}

impl<P, T, N> RpcRouterClient<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            _phantom: PhantomData,
        }
    }
}

impl<P, T, N> RouterClient for RpcRouterClient<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    async fn estimate_deploy_gas(
        &self,
        router: Address,
        call: &IBytecodeRouter::deployCall,
        value: U256,
    ) -> eyre::Result<u64> {
        let router = IBytecodeRouter::new(router, &self.provider);
        let gas = router
            .call_builder(call)
            .value(value)
            .estimate_gas()
            .await?;

        Ok(gas)
    }

    async fn send_deploy(
        &self,
        router: Address,
        call: &IBytecodeRouter::deployCall,
        value: U256,
        gas_limit: u64,
        gas_price: u128,
    ) -> eyre::Result<B256> {
        let router = IBytecodeRouter::new(router, &self.provider);
        let tx = router
            .call_builder(call)
            .value(value)
            .gas(gas_limit)
            .gas_price(gas_price)
            .send()
            .await?;

        Ok(*tx.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> eyre::Result<DeploymentReceipt> {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return Ok(DeploymentReceipt {
                    transaction_hash: receipt.transaction_hash(),
                    success: receipt.status(),
                });
            }
            if started.elapsed() > RECEIPT_TIMEOUT {
                eyre::bail!("timed out waiting for receipt of {tx_hash}");
            }
            debug!(%tx_hash, "Receipt not available yet");
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

/// Deploys with a single router transaction signed by the caller's key.
pub struct DirectSubmitter<C> {
    client: C,
    gas_price: u128,
}

impl<C: RouterClient> DirectSubmitter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            gas_price: GAS_PRICE_WEI,
        }
    }
}

impl<C> Submitter for DirectSubmitter<C>
where
    C: RouterClient + Sync,
{
    async fn submit(
        &self,
        plan: &DeploymentPlan,
        value: U256,
    ) -> Result<DeploymentReceipt, DeployError> {
        let call = plan.router_call();

        let estimate = self
            .client
            .estimate_deploy_gas(plan.router, &call, value)
            .await
            .map_err(DeployError::submission)?;
        let gas_limit = inflate_gas_limit(estimate);
        debug!(estimate, gas_limit, "Estimated router gas");

        let tx_hash = self
            .client
            .send_deploy(plan.router, &call, value, gas_limit, self.gas_price)
            .await
            .map_err(DeployError::submission)?;
        info!(%tx_hash, "Deploying");

        self.client
            .wait_for_receipt(tx_hash)
            .await
            .map_err(DeployError::submission)
    }
}
