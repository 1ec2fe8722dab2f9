use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use tracing::info;

use super::{DeploymentReceipt, Submitter};
use crate::{
    bindings::ISafe,
    chain::ChainId,
    error::DeployError,
    pimlico::{ensure_sponsorship, Bundler, UserOperation},
    request::DeploymentPlan,
    safe::{previous_owner, SmartAccount},
};

/// Runs one call through `account` as a paymaster-sponsored user operation
/// and waits for the bundler to report it included.
pub async fn execute_user_operation<A, B>(
    account: &A,
    bundler: &B,
    to: Address,
    value: U256,
    data: Bytes,
) -> Result<DeploymentReceipt, DeployError>
where
    A: SmartAccount + Sync,
    B: Bundler + Sync,
{
    let gas_price = bundler
        .user_operation_gas_price()
        .await
        .map_err(DeployError::submission)?
        .fast;

    let mut op = UserOperation {
        sender: account.address(),
        nonce: account.nonce().await.map_err(DeployError::submission)?,
        init_code: account.init_code().await.map_err(DeployError::submission)?,
        call_data: account.encode_call_data(to, value, data),
        max_fee_per_gas: gas_price.max_fee_per_gas,
        max_priority_fee_per_gas: gas_price.max_priority_fee_per_gas,
        signature: account.dummy_signature(),
        ..Default::default()
    };

    bundler
        .sponsor_user_operation(&op)
        .await
        .map_err(DeployError::submission)?
        .apply(&mut op);
    op.signature = account
        .sign_user_operation(&op)
        .map_err(DeployError::submission)?;

    info!(sender = %op.sender, nonce = %op.nonce, "Sending the user operation");
    let hash = bundler
        .send_user_operation(&op)
        .await
        .map_err(DeployError::submission)?;
    info!(user_op_hash = %hash, "Sent the user operation");

    bundler
        .wait_for_user_operation_receipt(hash)
        .await
        .map_err(DeployError::submission)
}

/// Deploys through a Safe, relayed by a bundler and sponsored by a paymaster.
pub struct SponsoredSubmitter<A, B> {
    chain: ChainId,
    api_key: String,
    account: A,
    bundler: B,
}

impl<A, B> SponsoredSubmitter<A, B>
where
    A: SmartAccount + Sync,
    B: Bundler + Sync,
{
    pub fn new(chain: ChainId, api_key: impl Into<String>, account: A, bundler: B) -> Self {
        Self {
            chain,
            api_key: api_key.into(),
            account,
            bundler,
        }
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    /// Adds `new_owner` to the Safe, keeping a threshold of one.
    pub async fn add_owner(&self, new_owner: Address) -> Result<DeploymentReceipt, DeployError> {
        ensure_sponsorship(self.chain, &self.api_key)?;
        info!(safe = %self.account.address(), %new_owner, "Adding a new owner");

        let data = ISafe::addOwnerWithThresholdCall {
            owner: new_owner,
            _threshold: U256::from(1),
        }
        .abi_encode();
        self.execute_on_safe(data.into()).await
    }

    /// Removes `owner` from the Safe, keeping a threshold of one.
    pub async fn remove_owner(&self, owner: Address) -> Result<DeploymentReceipt, DeployError> {
        ensure_sponsorship(self.chain, &self.api_key)?;

        let owners = self
            .account
            .owners()
            .await
            .map_err(DeployError::submission)?;
        let prev_owner = previous_owner(&owners, owner)
            .ok_or_else(|| DeployError::invalid(format!("{owner} is not an owner of the Safe")))?;
        info!(safe = %self.account.address(), %owner, "Removing an owner");

        let data = ISafe::removeOwnerCall {
            prevOwner: prev_owner,
            owner,
            _threshold: U256::from(1),
        }
        .abi_encode();
        self.execute_on_safe(data.into()).await
    }

    async fn execute_on_safe(&self, data: Bytes) -> Result<DeploymentReceipt, DeployError> {
        let receipt = execute_user_operation(
            &self.account,
            &self.bundler,
            self.account.address(),
            U256::ZERO,
            data,
        )
        .await?;

        if !receipt.success {
            return Err(DeployError::ExecutionReverted {
                tx_hash: receipt.transaction_hash,
            });
        }
        Ok(receipt)
    }
}

impl<A, B> Submitter for SponsoredSubmitter<A, B>
where
    A: SmartAccount + Sync,
    B: Bundler + Sync,
{
    fn preflight(&self, plan: &DeploymentPlan) -> Result<(), DeployError> {
        ensure_sponsorship(plan.source, &self.api_key)?;
        if plan.source != self.chain {
            return Err(DeployError::invalid(format!(
                "Safe lives on chain {}, deployment source is {}",
                self.chain, plan.source
            )));
        }
        Ok(())
    }

    async fn submit(
        &self,
        plan: &DeploymentPlan,
        value: U256,
    ) -> Result<DeploymentReceipt, DeployError> {
        self.preflight(plan)?;

        info!(safe = %self.account.address(), "Deploying through the Safe");
        execute_user_operation(
            &self.account,
            &self.bundler,
            plan.router,
            value,
            plan.router_calldata(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy::primitives::B256;

    use super::*;
    use crate::{
        bindings::ISafe4337Module,
        chain::{CHAIN_FUJI, CHAIN_POLYGON_MUMBAI, CHAIN_SEPOLIA},
        pimlico::{GasPrice, GasPriceTiers, Sponsorship},
        quote::tests::{plan, MockQuoter},
        request::DeploymentRequest,
        safe::SENTINEL_OWNER,
        submit::{deploy, Deployment, Stage},
    };

    const SAFE: Address = Address::repeat_byte(0x5a);
    const OWNER: Address = Address::repeat_byte(0x0a);

    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct MockAccount {
        owners: Vec<Address>,
        journal: Journal,
    }

    impl MockAccount {
        fn new() -> Self {
            Self {
                owners: vec![OWNER],
                journal: Journal::default(),
            }
        }
    }

    impl SmartAccount for MockAccount {
        fn address(&self) -> Address {
            SAFE
        }

        async fn nonce(&self) -> eyre::Result<U256> {
            self.journal.push("nonce");
            Ok(U256::from(7))
        }

        async fn init_code(&self) -> eyre::Result<Bytes> {
            self.journal.push("init_code");
            Ok(Bytes::new())
        }

        async fn owners(&self) -> eyre::Result<Vec<Address>> {
            Ok(self.owners.clone())
        }

        fn encode_call_data(&self, to: Address, value: U256, data: Bytes) -> Bytes {
            ISafe4337Module::executeUserOpCall {
                to,
                value,
                data,
                operation: 0,
            }
            .abi_encode()
            .into()
        }

        fn dummy_signature(&self) -> Bytes {
            Bytes::from_static(b"dummy")
        }

        fn sign_user_operation(&self, op: &UserOperation) -> eyre::Result<Bytes> {
            self.journal.push(format!("sign:{}", op.paymaster_and_data));
            Ok(Bytes::from_static(b"signed"))
        }
    }

    struct MockBundler {
        success: bool,
        journal: Journal,
        sent: Mutex<Vec<UserOperation>>,
    }

    impl MockBundler {
        fn new(success: bool) -> Self {
            Self {
                success,
                journal: Journal::default(),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl Bundler for MockBundler {
        async fn user_operation_gas_price(&self) -> eyre::Result<GasPriceTiers> {
            self.journal.push("gas_price");
            let tier = |fee: u64| GasPrice {
                max_fee_per_gas: U256::from(fee),
                max_priority_fee_per_gas: U256::from(1),
            };
            Ok(GasPriceTiers {
                slow: tier(10),
                standard: tier(20),
                fast: tier(30),
            })
        }

        async fn sponsor_user_operation(&self, op: &UserOperation) -> eyre::Result<Sponsorship> {
            self.journal.push(format!("sponsor:{}", op.signature));
            Ok(Sponsorship {
                paymaster_and_data: Bytes::from_static(&[0xaa]),
                pre_verification_gas: U256::from(1),
                verification_gas_limit: U256::from(2),
                call_gas_limit: U256::from(3),
            })
        }

        async fn send_user_operation(&self, op: &UserOperation) -> eyre::Result<B256> {
            self.journal.push("send");
            self.sent.lock().unwrap().push(op.clone());
            Ok(B256::repeat_byte(0x0e))
        }

        async fn wait_for_user_operation_receipt(
            &self,
            hash: B256,
        ) -> eyre::Result<DeploymentReceipt> {
            self.journal.push(format!("wait:{hash}"));
            Ok(DeploymentReceipt {
                transaction_hash: B256::repeat_byte(0x77),
                success: self.success,
            })
        }
    }

    fn submitter(chain: ChainId, api_key: &str) -> SponsoredSubmitter<MockAccount, MockBundler> {
        SponsoredSubmitter::new(chain, api_key, MockAccount::new(), MockBundler::new(true))
    }

    #[tokio::test]
    async fn test_sponsored_deploy_flow() {
        let submitter = submitter(CHAIN_SEPOLIA, "key");
        let plan = plan(vec![CHAIN_POLYGON_MUMBAI]);

        let receipt = submitter.submit(&plan, U256::from(500)).await.unwrap();
        assert_eq!(receipt.transaction_hash, B256::repeat_byte(0x77));
        assert!(receipt.success);

        assert_eq!(
            submitter.bundler.journal.entries(),
            vec![
                "gas_price".to_string(),
                "sponsor:0x64756d6d79".to_string(),
                "send".to_string(),
                format!("wait:{}", B256::repeat_byte(0x0e)),
            ]
        );
        assert_eq!(
            submitter.account.journal.entries(),
            vec!["nonce", "init_code", "sign:0xaa"]
        );

        let sent = submitter.bundler.sent.lock().unwrap();
        let op = &sent[0];
        assert_eq!(op.sender, SAFE);
        assert_eq!(op.nonce, U256::from(7));
        assert_eq!(op.max_fee_per_gas, U256::from(30));
        assert_eq!(op.call_gas_limit, U256::from(3));
        assert_eq!(op.signature, Bytes::from_static(b"signed"));

        let call = ISafe4337Module::executeUserOpCall::abi_decode(&op.call_data, true).unwrap();
        assert_eq!(call.to, plan.router);
        assert_eq!(call.value, U256::from(500));
        assert_eq!(call.data, plan.router_calldata());
    }

    #[tokio::test]
    async fn test_unsupported_chain_fails_before_network() {
        let submitter = submitter(CHAIN_POLYGON_MUMBAI, "key");
        let request = DeploymentRequest::new(
            CHAIN_POLYGON_MUMBAI,
            vec![CHAIN_SEPOLIA],
            "0x600160010160005260206000f3",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        );
        let quoter = MockQuoter::new(&[(CHAIN_SEPOLIA, 1)]);

        let err = deploy(&request, &quoter, &submitter).await.unwrap_err();
        assert!(
            matches!(err, DeployError::UnsupportedChain { chain: CHAIN_POLYGON_MUMBAI, .. }),
            "got {err:?}"
        );
        assert_eq!(quoter.calls(), 0, "mailbox must not be queried");
        assert!(submitter.bundler.journal.entries().is_empty());
        assert!(submitter.account.journal.entries().is_empty());

        let mut deployment = Deployment::new(&request).unwrap();
        assert!(deployment.preflight(&submitter).is_err());
        assert_eq!(deployment.stage(), Stage::Failed);
        assert_eq!(quoter.calls(), 0);
    }

    #[tokio::test]
    async fn test_foreign_source_chain_is_rejected_before_quoting() {
        let submitter = submitter(CHAIN_SEPOLIA, "key");
        let request = DeploymentRequest::new(
            CHAIN_FUJI,
            vec![CHAIN_POLYGON_MUMBAI],
            "0x600160010160005260206000f3",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        );
        let quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 1)]);

        let err = deploy(&request, &quoter, &submitter).await.unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput(_)), "got {err:?}");
        assert_eq!(quoter.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_disables_sponsorship() {
        let submitter = submitter(CHAIN_SEPOLIA, "");
        let quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 1)]);
        let request = DeploymentRequest::new(
            CHAIN_SEPOLIA,
            vec![CHAIN_POLYGON_MUMBAI],
            "0x600160010160005260206000f3",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        );

        let err = deploy(&request, &quoter, &submitter).await.unwrap_err();
        assert!(matches!(err, DeployError::UnsupportedChain { .. }));
        assert_eq!(quoter.calls(), 0);
        assert!(submitter.bundler.journal.entries().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_user_operation() {
        let submitter = SponsoredSubmitter::new(
            CHAIN_SEPOLIA,
            "key",
            MockAccount::new(),
            MockBundler::new(false),
        );
        let quoter = MockQuoter::new(&[(CHAIN_POLYGON_MUMBAI, 1)]);
        let request = DeploymentRequest::new(
            CHAIN_SEPOLIA,
            vec![CHAIN_POLYGON_MUMBAI],
            "0x600160010160005260206000f3",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        );

        let err = deploy(&request, &quoter, &submitter).await.unwrap_err();
        assert!(matches!(err, DeployError::ExecutionReverted { .. }));
    }

    #[tokio::test]
    async fn test_add_owner_calls_safe_itself() {
        let submitter = submitter(CHAIN_SEPOLIA, "key");
        let new_owner = Address::repeat_byte(0x0b);

        submitter.add_owner(new_owner).await.unwrap();

        let sent = submitter.bundler.sent.lock().unwrap();
        let call = ISafe4337Module::executeUserOpCall::abi_decode(&sent[0].call_data, true).unwrap();
        assert_eq!(call.to, SAFE);
        assert_eq!(call.value, U256::ZERO);

        let add = ISafe::addOwnerWithThresholdCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(add.owner, new_owner);
        assert_eq!(add._threshold, U256::from(1));
    }

    #[tokio::test]
    async fn test_remove_owner_uses_list_predecessor() {
        let submitter = submitter(CHAIN_SEPOLIA, "key");

        submitter.remove_owner(OWNER).await.unwrap();

        let sent = submitter.bundler.sent.lock().unwrap();
        let call = ISafe4337Module::executeUserOpCall::abi_decode(&sent[0].call_data, true).unwrap();
        let remove = ISafe::removeOwnerCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(remove.prevOwner, SENTINEL_OWNER);
        assert_eq!(remove.owner, OWNER);
    }

    #[tokio::test]
    async fn test_remove_unknown_owner_is_rejected() {
        let submitter = submitter(CHAIN_SEPOLIA, "key");

        let err = submitter
            .remove_owner(Address::repeat_byte(0x0f))
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidInput(_)));
        assert!(submitter.bundler.journal.entries().is_empty());
    }
}
