use alloy::{
    hex,
    primitives::{Address, Bytes, B256, U256},
    sol_types::{SolCall, SolValue},
};

use crate::{
    bindings::IBytecodeRouter,
    chain::{self, address_to_bytes32, ChainId},
    error::DeployError,
};

/// A deployment as entered by the user: hex strings are not validated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub source: ChainId,
    /// Order is significant, every derived array is index-aligned with it.
    pub destinations: Vec<ChainId>,
    pub initcode: String,
    pub salt: String,
}

/// A validated request with everything the router call and the fee quotes need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub source: ChainId,
    pub mailbox: Address,
    pub router: Address,
    pub destinations: Vec<ChainId>,
    pub initcode: Bytes,
    pub salt: B256,
    pub formatted_recipients: Vec<B256>,
    pub hook_metadatas: Vec<Bytes>,
    pub hooks: Vec<Address>,
    /// `abi.encode(initcode, salt)`, identical for every destination.
    pub message_body: Bytes,
}

impl DeploymentRequest {
    pub fn new(
        source: ChainId,
        destinations: Vec<ChainId>,
        initcode: impl Into<String>,
        salt: impl Into<String>,
    ) -> Self {
        Self {
            source,
            destinations,
            initcode: initcode.into(),
            salt: salt.into(),
        }
    }

    /// Validates the request and derives the per-destination arrays.
    ///
    /// Every destination uses the source chain's dispatch hook. No network
    /// access happens here.
    pub fn build(&self) -> Result<DeploymentPlan, DeployError> {
        let initcode = parse_hex("initcode", &self.initcode)?;
        let salt = parse_hex("salt", &self.salt)?;
        let salt = B256::try_from(salt.as_ref())
            .map_err(|_| DeployError::invalid(format!("salt must be 32 bytes, got {}", salt.len())))?;

        if self.destinations.is_empty() {
            return Err(DeployError::invalid("at least one destination chain is required"));
        }

        let source = chain::require(self.source)?;
        if !source.supports_as_source() {
            return Err(DeployError::UnsupportedChain {
                chain: source.id,
                reason: "no deployment router on this chain",
            });
        }

        let targets = self
            .destinations
            .iter()
            .map(|&id| {
                let target = chain::require(id)?;
                if !target.supports_as_target() {
                    return Err(DeployError::UnsupportedChain {
                        chain: id,
                        reason: "no deployment recipient on this chain",
                    });
                }
                Ok(target)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let message_body = (initcode.clone(), salt).abi_encode_params().into();

        Ok(DeploymentPlan {
            source: source.id,
            mailbox: source.mailbox,
            router: source.router,
            destinations: self.destinations.clone(),
            formatted_recipients: targets
                .iter()
                .map(|target| address_to_bytes32(target.recipient))
                .collect(),
            hook_metadatas: targets
                .iter()
                .map(|target| Bytes::from_static(target.hook_metadata))
                .collect(),
            hooks: vec![source.hook; targets.len()],
            initcode,
            salt,
            message_body,
        })
    }
}

impl DeploymentPlan {
    /// Arguments of the router's `deploy` entry point.
    pub fn router_call(&self) -> IBytecodeRouter::deployCall {
        self.into()
    }

    pub fn router_calldata(&self) -> Bytes {
        self.router_call().abi_encode().into()
    }
}

impl From<&DeploymentPlan> for IBytecodeRouter::deployCall {
    fn from(plan: &DeploymentPlan) -> Self {
        IBytecodeRouter::deployCall {
            bytecode: plan.initcode.clone(),
            salt: plan.salt,
            recipientAddresses: plan.formatted_recipients.clone(),
            chains: plan.destinations.iter().map(|&id| U256::from(id)).collect(),
            customHookMetadatas: plan.hook_metadatas.clone(),
            customHooks: plan.hooks.clone(),
        }
    }
}

fn parse_hex(field: &str, value: &str) -> Result<Bytes, DeployError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| DeployError::invalid(format!("{field} must be 0x-prefixed hex")))?;
    hex::decode(digits)
        .map(Into::into)
        .map_err(|e| DeployError::invalid(format!("invalid {field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{
        CHAIN_ALFAJORES, CHAIN_FUJI, CHAIN_MOONBASE_ALPHA, CHAIN_POLYGON_MUMBAI, CHAIN_SEPOLIA,
    };

    const INITCODE: &str = "0x600160010160005260206000f3";
    const SALT: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    fn request(destinations: Vec<ChainId>) -> DeploymentRequest {
        DeploymentRequest::new(CHAIN_SEPOLIA, destinations, INITCODE, SALT)
    }

    #[test]
    fn test_arrays_are_index_aligned() {
        let destinations = vec![CHAIN_POLYGON_MUMBAI, CHAIN_FUJI, CHAIN_ALFAJORES];
        let plan = request(destinations.clone()).build().unwrap();

        assert_eq!(plan.destinations, destinations);
        assert_eq!(plan.formatted_recipients.len(), destinations.len());
        assert_eq!(plan.hook_metadatas.len(), destinations.len());
        assert_eq!(plan.hooks.len(), destinations.len());

        for (i, id) in destinations.iter().enumerate() {
            let recipient = chain::require(*id).unwrap().recipient;
            assert_eq!(plan.formatted_recipients[i], address_to_bytes32(recipient));
            assert!(plan.hook_metadatas[i].is_empty());
        }
    }

    #[test]
    fn test_hooks_use_source_hook() {
        let plan = request(vec![CHAIN_POLYGON_MUMBAI, CHAIN_MOONBASE_ALPHA])
            .build()
            .unwrap();
        let sepolia = chain::require(CHAIN_SEPOLIA).unwrap();

        assert_eq!(plan.hooks, vec![sepolia.hook, sepolia.hook]);
        assert_eq!(plan.mailbox, sepolia.mailbox);
        assert_eq!(plan.router, sepolia.router);
    }

    #[test]
    fn test_message_body_encodes_initcode_and_salt() {
        let plan = request(vec![CHAIN_POLYGON_MUMBAI]).build().unwrap();
        let (initcode, salt) = <(Bytes, B256)>::abi_decode_params(&plan.message_body, true).unwrap();

        assert_eq!(initcode, plan.initcode);
        assert_eq!(salt, B256::with_last_byte(1));
    }

    #[test]
    fn test_router_call_arguments() {
        let plan = request(vec![CHAIN_POLYGON_MUMBAI]).build().unwrap();
        let call = plan.router_call();

        assert_eq!(call.chains, vec![U256::from(CHAIN_POLYGON_MUMBAI)]);
        assert_eq!(call.recipientAddresses, plan.formatted_recipients);
        assert_eq!(&plan.router_calldata()[..4], &IBytecodeRouter::deployCall::SELECTOR);
    }

    #[test]
    fn test_rejects_malformed_hex() {
        let mut bad = request(vec![CHAIN_POLYGON_MUMBAI]);
        bad.initcode = "not-hex".to_string();
        assert!(matches!(bad.build(), Err(DeployError::InvalidInput(_))));

        let mut bad = request(vec![CHAIN_POLYGON_MUMBAI]);
        bad.salt = "0xzz".to_string();
        assert!(matches!(bad.build(), Err(DeployError::InvalidInput(_))));

        let mut short = request(vec![CHAIN_POLYGON_MUMBAI]);
        short.salt = "0x01".to_string();
        assert!(matches!(short.build(), Err(DeployError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_empty_destinations() {
        assert!(matches!(
            request(vec![]).build(),
            Err(DeployError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_chains() {
        assert!(matches!(
            request(vec![1]).build(),
            Err(DeployError::UnsupportedChain { chain: 1, .. })
        ));

        let unknown_source = DeploymentRequest::new(5, vec![CHAIN_FUJI], INITCODE, SALT);
        assert!(matches!(
            unknown_source.build(),
            Err(DeployError::UnsupportedChain { chain: 5, .. })
        ));
    }
}
