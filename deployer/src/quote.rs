//! Per-destination dispatch fee quotes and their aggregation.

use std::{future::Future, marker::PhantomData};

use alloy::{
    network::Network,
    primitives::{Address, Bytes, B256, U256},
    providers::Provider,
    transports::Transport,
};
use futures_util::{future::try_join_all, TryFutureExt};
use tracing::debug;

use crate::{bindings::IMailbox, chain::ChainId, error::DeployError, request::DeploymentPlan};

/// Read-only access to a mailbox's `quoteDispatch`.
pub trait DispatchQuoter {
    fn quote_dispatch(
        &self,
        destination: ChainId,
        recipient: B256,
        message_body: Bytes,
        hook_metadata: Bytes,
        hook: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send;
}

/// Quotes against the source chain's mailbox contract.
pub struct MailboxQuoter<P, T, N> {
    provider: P,
    mailbox: Address,
    _phantom: PhantomData<(T, N)>,
}

impl<P, T, N> MailboxQuoter<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    pub fn new(provider: P, mailbox: Address) -> Self {
        Self {
            provider,
            mailbox,
            _phantom: PhantomData,
        }
    }
}

impl<P, T, N> DispatchQuoter for MailboxQuoter<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    async fn quote_dispatch(
        &self,
        destination: ChainId,
        recipient: B256,
        message_body: Bytes,
        hook_metadata: Bytes,
        hook: Address,
    ) -> eyre::Result<U256> {
        let domain = u32::try_from(destination)?;
        let mailbox = IMailbox::new(self.mailbox, &self.provider);
        let fee = mailbox
            .quoteDispatch(domain, recipient, message_body, hook_metadata, hook)
            .call()
            .await?
            .fee;

        Ok(fee)
    }
}

/// Quotes index-aligned with [`DeploymentPlan::destinations`], plus their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSet {
    pub quotes: Vec<U256>,
    pub total: U256,
}

/// Quotes every destination concurrently and sums the results.
///
/// The first failing quote aborts the whole aggregation.
pub async fn quote_total<Q>(quoter: &Q, plan: &DeploymentPlan) -> Result<QuoteSet, DeployError>
where
    Q: DispatchQuoter,
{
    let n = plan.destinations.len();
    if plan.formatted_recipients.len() != n
        || plan.hook_metadatas.len() != n
        || plan.hooks.len() != n
    {
        return Err(DeployError::invalid(
            "destination, recipient, hook metadata and hook lists differ in length",
        ));
    }

    let requests = plan
        .destinations
        .iter()
        .zip(&plan.formatted_recipients)
        .zip(plan.hook_metadatas.iter().zip(&plan.hooks))
        .map(|((&chain, &recipient), (metadata, &hook))| {
            quoter
                .quote_dispatch(
                    chain,
                    recipient,
                    plan.message_body.clone(),
                    metadata.clone(),
                    hook,
                )
                .map_err(move |e| DeployError::QuoteFailed {
                    chain,
                    source: e.into(),
                })
        });
    let quotes = try_join_all(requests).await?;

    let mut total = U256::ZERO;
    for (quote, &chain) in quotes.iter().zip(&plan.destinations) {
        debug!(destination = chain, quote = %quote, "Dispatch quoted");
        total = total
            .checked_add(*quote)
            .ok_or_else(|| DeployError::QuoteFailed {
                chain,
                source: "fee total overflowed".into(),
            })?;
    }

    Ok(QuoteSet { quotes, total })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, sync::Mutex, time::Duration};

    use super::*;
    use crate::{
        chain::{CHAIN_ALFAJORES, CHAIN_FUJI, CHAIN_POLYGON_MUMBAI, CHAIN_SEPOLIA},
        request::DeploymentRequest,
    };

    /// Quotes a fixed fee per destination; chains without an entry fail.
    /// Every call is recorded as `(destination, hook metadata)`.
    pub(crate) struct MockQuoter {
        pub fees: HashMap<ChainId, U256>,
        pub delays: HashMap<ChainId, Duration>,
        pub seen: Mutex<Vec<(ChainId, Bytes)>>,
    }

    impl MockQuoter {
        pub(crate) fn new(fees: &[(ChainId, u64)]) -> Self {
            Self {
                fees: fees
                    .iter()
                    .map(|&(chain, fee)| (chain, U256::from(fee)))
                    .collect(),
                delays: HashMap::new(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl DispatchQuoter for MockQuoter {
        async fn quote_dispatch(
            &self,
            destination: ChainId,
            _recipient: B256,
            _message_body: Bytes,
            hook_metadata: Bytes,
            _hook: Address,
        ) -> eyre::Result<U256> {
            self.seen.lock().unwrap().push((destination, hook_metadata));
            if let Some(delay) = self.delays.get(&destination) {
                tokio::time::sleep(*delay).await;
            }
            self.fees
                .get(&destination)
                .copied()
                .ok_or_else(|| eyre::eyre!("mailbox call reverted"))
        }
    }

    pub(crate) fn plan(destinations: Vec<ChainId>) -> DeploymentPlan {
        DeploymentRequest::new(
            CHAIN_SEPOLIA,
            destinations,
            "0x600160010160005260206000f3",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn test_quotes_are_summed() {
        let quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 100), (CHAIN_FUJI, 250)]);
        let quotes = quote_total(&quoter, &plan(vec![CHAIN_POLYGON_MUMBAI, CHAIN_FUJI]))
            .await
            .unwrap();

        assert_eq!(quotes.quotes, vec![U256::from(100), U256::from(250)]);
        assert_eq!(quotes.total, U256::from(350));
    }

    #[tokio::test]
    async fn test_quotes_stay_aligned_when_completing_out_of_order() {
        let mut quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 100), (CHAIN_FUJI, 250)]);
        quoter
            .delays
            .insert(CHAIN_POLYGON_MUMBAI, Duration::from_millis(50));

        let quotes = quote_total(&quoter, &plan(vec![CHAIN_POLYGON_MUMBAI, CHAIN_FUJI]))
            .await
            .unwrap();

        assert_eq!(quotes.quotes, vec![U256::from(100), U256::from(250)]);
        assert_eq!(quotes.total, U256::from(350));
    }

    #[tokio::test]
    async fn test_failed_quote_names_destination() {
        let quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 100)]);
        let err = quote_total(&quoter, &plan(vec![CHAIN_POLYGON_MUMBAI, CHAIN_ALFAJORES]))
            .await
            .unwrap_err();

        assert!(
            matches!(err, DeployError::QuoteFailed { chain: CHAIN_ALFAJORES, .. }),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_total_overflow_names_destination() {
        let mut quoter = MockQuoter::new(&[(CHAIN_FUJI, 1)]);
        quoter.fees.insert(CHAIN_POLYGON_MUMBAI, U256::MAX);

        let err = quote_total(&quoter, &plan(vec![CHAIN_POLYGON_MUMBAI, CHAIN_FUJI]))
            .await
            .unwrap_err();

        assert!(
            matches!(err, DeployError::QuoteFailed { chain: CHAIN_FUJI, .. }),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_hook_metadata_reaches_quotes_and_router_call() {
        let quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 1), (CHAIN_FUJI, 2)]);
        let mut plan = plan(vec![CHAIN_POLYGON_MUMBAI, CHAIN_FUJI]);
        let metadatas = vec![Bytes::from_static(&[0x01]), Bytes::from_static(&[0x02, 0x03])];
        plan.hook_metadatas = metadatas.clone();

        quote_total(&quoter, &plan).await.unwrap();

        let mut seen = quoter.seen.lock().unwrap().clone();
        seen.sort_by_key(|(chain, _)| *chain != CHAIN_POLYGON_MUMBAI);
        assert_eq!(
            seen,
            vec![
                (CHAIN_POLYGON_MUMBAI, metadatas[0].clone()),
                (CHAIN_FUJI, metadatas[1].clone()),
            ]
        );
        assert_eq!(plan.router_call().customHookMetadatas, metadatas);
    }

    #[tokio::test]
    async fn test_misaligned_plan_is_rejected() {
        let quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 1), (CHAIN_FUJI, 2)]);
        let mut plan = plan(vec![CHAIN_POLYGON_MUMBAI]);
        plan.destinations.push(CHAIN_FUJI);

        let err = quote_total(&quoter, &plan).await.unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput(_)), "got {err:?}");
        assert_eq!(quoter.calls(), 0);
    }
}
