//! Static registry of the chains the deployer knows about.

use alloy::primitives::{address, Address, B256};

use crate::error::DeployError;

/// An EIP-155 chain id. Only ids present in the registry are valid.
pub type ChainId = u64;

pub const CHAIN_SEPOLIA: ChainId = 11155111;
pub const CHAIN_POLYGON_MUMBAI: ChainId = 80001;
pub const CHAIN_SCROLL_SEPOLIA: ChainId = 534351;
pub const CHAIN_ALFAJORES: ChainId = 44787;
pub const CHAIN_FUJI: ChainId = 43113;
pub const CHAIN_BSC_TESTNET: ChainId = 97;
pub const CHAIN_MOONBASE_ALPHA: ChainId = 1287;

/// Per-chain addresses and endpoints used by the deployment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    pub id: ChainId,
    pub name: &'static str,
    pub mailbox: Address,
    pub router: Address,
    pub rpc_url: &'static str,
    /// Contract that receives the deployment message on this chain.
    pub recipient: Address,
    pub hook: Address,
    pub hook_metadata: &'static [u8],
}

impl ChainConfig {
    pub fn supports_as_source(&self) -> bool {
        self.router != Address::ZERO
    }

    pub fn supports_as_target(&self) -> bool {
        self.recipient != Address::ZERO
    }
}

const CHAINS: [ChainConfig; 7] = [
    ChainConfig {
        id: CHAIN_SEPOLIA,
        name: "sepolia",
        mailbox: address!("fFAEF09B3cd11D9b20d1a19bECca54EEC2884766"),
        router: address!("430aC47A3Ea1Ecc240cAB740b35fEFF2b75a1ec8"),
        rpc_url: "https://rpc.sepolia.org",
        recipient: address!("0c28ceEa8595685aAB7EDf759a7c94DE18A5a6E6"),
        hook: address!("17Dc724B7a2F09141C13b8AC33B396073785c2BC"),
        hook_metadata: &[],
    },
    ChainConfig {
        id: CHAIN_POLYGON_MUMBAI,
        name: "polygon-mumbai",
        mailbox: address!("2d1889fe5B092CD988972261434F7E5f26041115"),
        router: address!("DbE35849810c77f2C85D2769444fB3566dAFd180"),
        rpc_url: "https://rpc-mumbai.maticvigil.com",
        recipient: address!("D0B7BFE8bc7a635Ce2E514c1b4Eb5C9238Ef9998"),
        hook: address!("31191BA83143b4745745389fEe64990c65F36829"),
        hook_metadata: &[],
    },
    ChainConfig {
        id: CHAIN_SCROLL_SEPOLIA,
        name: "scroll-sepolia",
        mailbox: address!("3C5154a193D6e2955650f9305c8d80c18C814A68"),
        router: address!("DbE35849810c77f2C85D2769444fB3566dAFd180"),
        rpc_url: "https://sepolia-rpc.scroll.io",
        recipient: address!("F0FB374975dFbDAF18f9E85Ddc4939A4b37A56bE"),
        hook: address!("E1CCB130389f687bf745Dd6dc05E50da17d9ea96"),
        hook_metadata: &[],
    },
    ChainConfig {
        id: CHAIN_ALFAJORES,
        name: "alfajores",
        mailbox: address!("Ef9F292fcEBC3848bF4bB92a96a04F9ECBb78E59"),
        router: address!("7bF601DE6a3bf24678ed06282F1C8fEEC019B554"),
        rpc_url: "https://alfajores-forno.celo-testnet.org",
        recipient: address!("BCDC35bE8fc6e022e9D14b25FEB76AE4d83035de"),
        hook: address!("3528B1aeF3a3d29E0eae90ad777A2b4A6a48aC3F"),
        hook_metadata: &[],
    },
    ChainConfig {
        id: CHAIN_FUJI,
        name: "fuji",
        mailbox: address!("5b6CFf85442B851A8e6eaBd2A4E4507B5135B3B0"),
        router: address!("7bF601DE6a3bf24678ed06282F1C8fEEC019B554"),
        rpc_url: "https://api.avax-test.network/ext/bc/C/rpc",
        recipient: address!("BCDC35bE8fc6e022e9D14b25FEB76AE4d83035de"),
        hook: address!("c684f7F50DB4b2563218512e021fBdd0BeD6b57E"),
        hook_metadata: &[],
    },
    ChainConfig {
        id: CHAIN_BSC_TESTNET,
        name: "bsc-testnet",
        mailbox: address!("F9F6F5646F478d5ab4e20B0F910C92F1CCC9Cc6D"),
        router: address!("7bF601DE6a3bf24678ed06282F1C8fEEC019B554"),
        rpc_url: "https://data-seed-prebsc-1-s1.bnbchain.org:8545",
        recipient: address!("BCDC35bE8fc6e022e9D14b25FEB76AE4d83035de"),
        hook: address!("2670ED2EC08cAd135307556685a96bD4c16b007b"),
        hook_metadata: &[],
    },
    ChainConfig {
        id: CHAIN_MOONBASE_ALPHA,
        name: "moonbase-alpha",
        mailbox: address!("76189acFA212298d7022624a4633411eE0d2f26F"),
        router: address!("7bF601DE6a3bf24678ed06282F1C8fEEC019B554"),
        rpc_url: "https://rpc.api.moonbase.moonbeam.network",
        recipient: address!("BCDC35bE8fc6e022e9D14b25FEB76AE4d83035de"),
        hook: Address::ZERO,
        hook_metadata: &[],
    },
];

/// All registered chains, in declaration order.
pub fn chains() -> &'static [ChainConfig] {
    &CHAINS
}

pub fn lookup(id: ChainId) -> Option<&'static ChainConfig> {
    CHAINS.iter().find(|chain| chain.id == id)
}

pub fn lookup_by_name(name: &str) -> Option<&'static ChainConfig> {
    CHAINS
        .iter()
        .find(|chain| chain.name.eq_ignore_ascii_case(name))
}

/// Like [`lookup`], but an unknown id is reported as [`DeployError::UnsupportedChain`].
pub fn require(id: ChainId) -> Result<&'static ChainConfig, DeployError> {
    lookup(id).ok_or(DeployError::UnsupportedChain {
        chain: id,
        reason: "not in the chain registry",
    })
}

pub fn supports_as_source(id: ChainId) -> bool {
    lookup(id).is_some_and(ChainConfig::supports_as_source)
}

pub fn supports_as_target(id: ChainId) -> bool {
    lookup(id).is_some_and(ChainConfig::supports_as_target)
}

/// Parses a registered chain from its name (`polygon-mumbai`) or numeric id (`80001`).
pub fn parse_chain(s: &str) -> Result<ChainId, String> {
    let chain = match s.parse::<ChainId>() {
        Ok(id) => lookup(id),
        Err(_) => lookup_by_name(s),
    };
    chain
        .map(|chain| chain.id)
        .ok_or_else(|| format!("unknown chain `{s}`"))
}

/// Left-pads an address to the 32-byte recipient form the mailbox expects.
pub fn address_to_bytes32(address: Address) -> B256 {
    address.into_word()
}
