use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use xdeploy::chain::{parse_chain, ChainId};

#[derive(Parser)]
#[command(name = "xdeploy")]
#[command(
    author,
    version,
    about = "Deploy the same bytecode to several chains with one transaction"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "XDEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Pimlico API key. Sponsored operations are unavailable without it.
    #[arg(long, env = "PIMLICO_API_KEY", default_value = "", hide_env_values = true)]
    pub pimlico_api_key: String,

    /// Hex private key signing direct deployments.
    #[arg(long, env = "PRIVATE_KEY", default_value = "", hide_env_values = true)]
    pub private_key: String,

    /// Passphrase the Safe owner is derived from. Empty means logged out.
    #[arg(long, env = "PASSPHRASE", default_value = "", hide_env_values = true)]
    pub passphrase: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the registered chains and what each supports.
    Chains,

    /// Show the account derived from the passphrase.
    Account,

    /// Quote the dispatch fee of every destination.
    Quote(DeploymentArgs),

    /// Deploy to every destination with one source chain transaction.
    Deploy {
        #[command(flatten)]
        deployment: DeploymentArgs,

        /// Send through the passphrase's Safe as a sponsored user operation
        /// instead of signing with the private key.
        #[arg(long)]
        sponsored: bool,
    },

    /// Manage the Safe owned by the passphrase's account.
    Safe {
        /// The chain the Safe lives on (name or id).
        #[arg(long, env = "XDEPLOY_CHAIN", default_value = "sepolia", value_parser = parse_chain)]
        chain: ChainId,

        #[command(subcommand)]
        command: SafeCommand,
    },
}

#[derive(Subcommand)]
pub enum SafeCommand {
    /// Print the counterfactual Safe address.
    Address,

    /// Add an owner, keeping a threshold of one.
    AddOwner { owner: Address },

    /// Remove an owner, keeping a threshold of one.
    RemoveOwner { owner: Address },
}

#[derive(Args)]
pub struct DeploymentArgs {
    /// The source chain (name or id).
    #[arg(long, value_parser = parse_chain)]
    pub source: ChainId,

    /// Comma-separated destination chains (names or ids), in dispatch order.
    #[arg(long, required = true, value_delimiter = ',', value_parser = parse_chain)]
    pub targets: Vec<ChainId>,

    /// Contract creation code, `0x`-prefixed hex.
    #[arg(long)]
    pub initcode: String,

    /// 32-byte CREATE2 salt, `0x`-prefixed hex.
    #[arg(long)]
    pub salt: String,
}
