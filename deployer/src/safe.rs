//! Safe 1.4.1 smart accounts driven through the v0.6 EntryPoint.
//!
//! The account is counterfactual: its address is the CREATE2 address the
//! proxy factory would use for a one-owner Safe with the 4337 module enabled.
//! The proxy is only deployed by the first user operation, via `initCode`.

use std::{future::Future, marker::PhantomData};

use alloy::{
    primitives::{address, aliases::U192, keccak256, Address, Bytes, B256, U256},
    providers::{Provider, ProviderBuilder},
    signers::{local::PrivateKeySigner, SignerSync},
    sol_types::{eip712_domain, SolCall, SolStruct},
    transports::Transport,
};

use crate::{
    bindings::{
        IEntryPoint, IMultiSend, ISafe, ISafe4337Module, ISafeModuleSetup, ISafeProxyFactory,
        SafeOp,
    },
    chain::{self, ChainId},
    pimlico::UserOperation,
};

pub const ENTRY_POINT_V06: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");
pub const SAFE_PROXY_FACTORY: Address = address!("4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67");
pub const SAFE_SINGLETON: Address = address!("41675C099F32341bf84BFc5382aF534df5C7461a");
pub const SAFE_MODULE_SETUP: Address = address!("8EcD4ec46D4D2a6B64fE960B3D64e8B94B2234eb");
pub const SAFE_4337_MODULE: Address = address!("a581c4A4DB7175302464fF3C06380BC3270b4037");
pub const MULTI_SEND: Address = address!("38869bf66a61cF6bDB996A6aE40D5853Fd43B526");

/// Head of the Safe owner linked list.
pub const SENTINEL_OWNER: Address = address!("0000000000000000000000000000000000000001");

const SALT_NONCE: U256 = U256::ZERO;

/// A contract account that executes calls on behalf of its owning signer.
pub trait SmartAccount {
    fn address(&self) -> Address;

    fn nonce(&self) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// Factory call deploying the account, empty once it exists on chain.
    fn init_code(&self) -> impl Future<Output = eyre::Result<Bytes>> + Send;

    fn owners(&self) -> impl Future<Output = eyre::Result<Vec<Address>>> + Send;

    /// Call data making the account call `to` with `value` and `data`.
    fn encode_call_data(&self, to: Address, value: U256, data: Bytes) -> Bytes;

    /// Signature of the right shape for gas estimation.
    fn dummy_signature(&self) -> Bytes;

    fn sign_user_operation(&self, op: &UserOperation) -> eyre::Result<Bytes>;
}

/// `Safe.setup` call for a one-owner Safe with the 4337 module enabled.
///
/// Module setup runs as a delegatecall batch through `MultiSend`, the same
/// layout permissionless uses for Safe 1.4.1 accounts, so both derive the
/// same address for an owner.
pub fn safe_initializer(owner: Address) -> Bytes {
    let enable_modules = ISafeModuleSetup::enableModulesCall {
        modules: vec![SAFE_4337_MODULE],
    }
    .abi_encode();

    ISafe::setupCall {
        _owners: vec![owner],
        _threshold: U256::from(1),
        to: MULTI_SEND,
        data: IMultiSend::multiSendCall {
            transactions: multi_send_transaction(
                DELEGATE_CALL,
                SAFE_MODULE_SETUP,
                &enable_modules,
            ),
        }
        .abi_encode()
        .into(),
        fallbackHandler: SAFE_4337_MODULE,
        paymentToken: Address::ZERO,
        payment: U256::ZERO,
        paymentReceiver: Address::ZERO,
    }
    .abi_encode()
    .into()
}

const DELEGATE_CALL: u8 = 1;

/// One packed `MultiSend` entry:
/// `operation (1) ++ to (20) ++ value (32) ++ data length (32) ++ data`.
fn multi_send_transaction(operation: u8, to: Address, data: &[u8]) -> Bytes {
    let mut packed = Vec::with_capacity(85 + data.len());
    packed.push(operation);
    packed.extend_from_slice(to.as_slice());
    packed.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());
    packed.extend_from_slice(&U256::from(data.len()).to_be_bytes::<32>());
    packed.extend_from_slice(data);
    packed.into()
}

/// CREATE2 salt the proxy factory derives: keccak256(keccak256(initializer) ++ saltNonce).
pub fn safe_salt(initializer: &[u8], salt_nonce: U256) -> B256 {
    let mut salt_input = Vec::with_capacity(64);
    salt_input.extend_from_slice(keccak256(initializer).as_slice());
    salt_input.extend_from_slice(&salt_nonce.to_be_bytes::<32>());
    keccak256(&salt_input)
}

/// CREATE2 address of a Safe proxy, mirroring `createProxyWithNonce`:
/// salt = [`safe_salt`], code = proxyCreationCode ++ uint256(singleton).
pub fn safe_proxy_address(
    factory: Address,
    singleton: Address,
    proxy_creation_code: &[u8],
    initializer: &[u8],
    salt_nonce: U256,
) -> Address {
    let mut deployment_code = Vec::with_capacity(proxy_creation_code.len() + 32);
    deployment_code.extend_from_slice(proxy_creation_code);
    deployment_code.extend_from_slice(singleton.into_word().as_slice());

    factory.create2(
        safe_salt(initializer, salt_nonce),
        keccak256(&deployment_code),
    )
}

/// `factory ++ createProxyWithNonce(...)`, the v0.6 `initCode` of a new Safe.
pub fn safe_init_code(initializer: Bytes, salt_nonce: U256) -> Bytes {
    let create = ISafeProxyFactory::createProxyWithNonceCall {
        _singleton: SAFE_SINGLETON,
        initializer,
        saltNonce: salt_nonce,
    };

    let mut init_code = SAFE_PROXY_FACTORY.to_vec();
    init_code.extend_from_slice(&create.abi_encode());
    init_code.into()
}

/// Signs a user operation as the Safe 4337 module expects:
/// `validAfter (6 bytes) ++ validUntil (6 bytes) ++ ecdsa signature (65 bytes)`.
pub fn sign_safe_operation(
    signer: &PrivateKeySigner,
    chain_id: ChainId,
    op: &UserOperation,
) -> eyre::Result<Bytes> {
    let hash = safe_operation_hash(chain_id, op);
    let signature = signer.sign_hash_sync(&hash)?;

    let mut encoded = vec![0u8; 12];
    encoded.extend_from_slice(&signature.as_bytes());
    Ok(encoded.into())
}

/// EIP-712 digest of the `SafeOp` for `op`, with no validity window.
pub fn safe_operation_hash(chain_id: ChainId, op: &UserOperation) -> B256 {
    let domain = eip712_domain! {
        chain_id: chain_id,
        verifying_contract: SAFE_4337_MODULE,
    };
    let safe_op = SafeOp {
        safe: op.sender,
        nonce: op.nonce,
        initCode: op.init_code.clone(),
        callData: op.call_data.clone(),
        callGasLimit: op.call_gas_limit,
        verificationGasLimit: op.verification_gas_limit,
        preVerificationGas: op.pre_verification_gas,
        maxFeePerGas: op.max_fee_per_gas,
        maxPriorityFeePerGas: op.max_priority_fee_per_gas,
        paymasterAndData: op.paymaster_and_data.clone(),
        validAfter: Default::default(),
        validUntil: Default::default(),
        entryPoint: ENTRY_POINT_V06,
    };

    safe_op.eip712_signing_hash(&domain)
}

/// Predecessor of `owner` in the Safe owner list, as `removeOwner` wants it.
pub fn previous_owner(owners: &[Address], owner: Address) -> Option<Address> {
    let index = owners.iter().position(|candidate| *candidate == owner)?;
    Some(match index {
        0 => SENTINEL_OWNER,
        i => owners[i - 1],
    })
}

/// Reads the proxy creation code and predicts the Safe owned by `owner`.
pub async fn predict_safe_address<P, T>(provider: &P, owner: Address) -> eyre::Result<Address>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    let factory = ISafeProxyFactory::new(SAFE_PROXY_FACTORY, provider);
    let creation_code = factory.proxyCreationCode().call().await?._0;

    Ok(safe_proxy_address(
        SAFE_PROXY_FACTORY,
        SAFE_SINGLETON,
        &creation_code,
        &safe_initializer(owner),
        SALT_NONCE,
    ))
}

/// A Safe owned by a single local signer.
pub struct SafeAccount<P, T> {
    provider: P,
    signer: PrivateKeySigner,
    chain_id: ChainId,
    address: Address,
    _phantom: PhantomData<T>,
}

impl<P, T> SafeAccount<P, T>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    /// Resolves the Safe address of `signer` on the chain `provider` talks to.
    pub async fn resolve(
        provider: P,
        signer: PrivateKeySigner,
        chain_id: ChainId,
    ) -> eyre::Result<Self> {
        let address = predict_safe_address(&provider, signer.address()).await?;

        Ok(Self {
            provider,
            signer,
            chain_id,
            address,
            _phantom: PhantomData,
        })
    }
}

impl<P, T> SmartAccount for SafeAccount<P, T>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    fn address(&self) -> Address {
        self.address
    }

    async fn nonce(&self) -> eyre::Result<U256> {
        let entry_point = IEntryPoint::new(ENTRY_POINT_V06, &self.provider);
        let nonce = entry_point
            .getNonce(self.address, U192::ZERO)
            .call()
            .await?
            .nonce;

        Ok(nonce)
    }

    async fn init_code(&self) -> eyre::Result<Bytes> {
        let code = self.provider.get_code_at(self.address).await?;
        if !code.is_empty() {
            return Ok(Bytes::new());
        }

        Ok(safe_init_code(
            safe_initializer(self.signer.address()),
            SALT_NONCE,
        ))
    }

    async fn owners(&self) -> eyre::Result<Vec<Address>> {
        let safe = ISafe::new(self.address, &self.provider);
        Ok(safe.getOwners().call().await?._0)
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
        let mut signature = vec![0u8; 12];
        signature.extend_from_slice(&[0xff; 64]);
        signature.push(0x1c);
        signature.into()
    }

    fn sign_user_operation(&self, op: &UserOperation) -> eyre::Result<Bytes> {
        sign_safe_operation(&self.signer, self.chain_id, op)
    }
}

/// Finds the Safe address an owner would control on a chain.
pub trait SafeAddressResolver {
    fn safe_address(
        &self,
        chain: ChainId,
        owner: Address,
    ) -> impl Future<Output = eyre::Result<Address>> + Send;
}

/// Resolves through each chain's registered RPC endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpcSafeResolver;

impl SafeAddressResolver for RpcSafeResolver {
    async fn safe_address(&self, chain: ChainId, owner: Address) -> eyre::Result<Address> {
        let config = chain::require(chain)?;
        let provider = ProviderBuilder::new().on_http(config.rpc_url.parse()?);
        predict_safe_address(&provider, owner).await
    }
}
