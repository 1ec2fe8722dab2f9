mod cli;

use alloy::{
    network::EthereumWallet,
    primitives::utils::format_ether,
    providers::ProviderBuilder,
};
use clap::Parser;
use tracing::info;

use cli::{Cli, Command, DeploymentArgs, SafeCommand};
use xdeploy::{
    chain::{self, chains, ChainId},
    pimlico::{Bundler, PimlicoClient},
    safe::{RpcSafeResolver, SafeAccount, SmartAccount, ENTRY_POINT_V06},
    session::Session,
    submit::RpcRouterClient,
    Credentials, DeployError, Deployment, DeploymentRequest, DirectSubmitter, MailboxQuoter,
    SponsoredSubmitter,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let credentials = Credentials::new(cli.pimlico_api_key, cli.private_key);

    match cli.command {
        Command::Chains => list_chains(&credentials),
        Command::Account => {
            let mut session = Session::new()?;
            session.login(cli.passphrase)?;
            println!("address:    {}", session.address());
            println!("nickname:   {}", session.nickname());
            println!("authorized: {}", session.is_authorized());
        }
        Command::Quote(args) => {
            let mut deployment = Deployment::new(&request(args))?;
            let plan = deployment.plan().clone();
            let rpc_url = chain::require(plan.source)?.rpc_url.parse()?;
            let quoter = MailboxQuoter::new(ProviderBuilder::new().on_http(rpc_url), plan.mailbox);

            let quotes = deployment.quote(&quoter).await?;
            for (destination, quote) in plan.destinations.iter().zip(&quotes.quotes) {
                println!("{destination:>10}  {} ETH", format_ether(*quote));
            }
            println!("{:>10}  {} ETH", "total", format_ether(quotes.total));
        }
        Command::Deploy {
            deployment,
            sponsored,
        } => {
            let mut deployment = Deployment::new(&request(deployment))?;
            let source = deployment.plan().source;
            let config = chain::require(source)?;

            let receipt = if sponsored {
                credentials.ensure_sponsorship(source)?;
                let submitter = sponsored_submitter(source, &credentials, &cli.passphrase).await?;
                deployment.preflight(&submitter)?;

                let provider = ProviderBuilder::new().on_http(config.rpc_url.parse()?);
                deployment
                    .quote(&MailboxQuoter::new(provider, config.mailbox))
                    .await?;
                deployment.submit(&submitter).await?
            } else {
                let signer = credentials.signer()?;
                info!(sender = %signer.address(), "Deploying from an externally owned account");

                let provider = ProviderBuilder::new()
                    .with_recommended_fillers()
                    .wallet(EthereumWallet::from(signer))
                    .on_http(config.rpc_url.parse()?);
                let submitter = DirectSubmitter::new(RpcRouterClient::new(&provider));
                deployment.preflight(&submitter)?;
                deployment
                    .quote(&MailboxQuoter::new(&provider, config.mailbox))
                    .await?;
                deployment.submit(&submitter).await?
            };

            println!("deployed in transaction {}", receipt.transaction_hash);
        }
        Command::Safe { chain, command } => match command {
            SafeCommand::Address => {
                let mut session = authorized_session(&cli.passphrase)?;
                session.set_chain(chain)?;
                let safe = session.refresh_safe_address(&RpcSafeResolver).await?;
                println!("owner: {} ({})", session.address(), session.nickname());
                println!("safe:  {safe}");
            }
            SafeCommand::AddOwner { owner } => {
                credentials.ensure_sponsorship(chain)?;
                let submitter = sponsored_submitter(chain, &credentials, &cli.passphrase).await?;
                let receipt = submitter.add_owner(owner).await?;
                println!("added {owner} in transaction {}", receipt.transaction_hash);
            }
            SafeCommand::RemoveOwner { owner } => {
                credentials.ensure_sponsorship(chain)?;
                let submitter = sponsored_submitter(chain, &credentials, &cli.passphrase).await?;
                let receipt = submitter.remove_owner(owner).await?;
                println!("removed {owner} in transaction {}", receipt.transaction_hash);
            }
        },
    }

    Ok(())
}

fn request(args: DeploymentArgs) -> DeploymentRequest {
    DeploymentRequest::new(args.source, args.targets, args.initcode, args.salt)
}

fn list_chains(credentials: &Credentials) {
    println!(
        "{:>10}  {:<16}{:<8}{:<8}{}",
        "id", "name", "source", "target", "sponsored"
    );
    for config in chains() {
        println!(
            "{:>10}  {:<16}{:<8}{:<8}{}",
            config.id,
            config.name,
            config.supports_as_source(),
            config.supports_as_target(),
            credentials.sponsorship_available(config.id),
        );
    }
}

fn authorized_session(passphrase: &str) -> Result<Session, DeployError> {
    let mut session = Session::new()?;
    session.login(passphrase)?;
    if !session.is_authorized() {
        return Err(DeployError::InvalidInput(
            "unauthenticated: set PASSPHRASE".to_string(),
        ));
    }
    Ok(session)
}

/// Sponsored submitter for the passphrase's Safe on `chain`.
async fn sponsored_submitter(
    chain: ChainId,
    credentials: &Credentials,
    passphrase: &str,
) -> eyre::Result<SponsoredSubmitter<impl SmartAccount + Sync, impl Bundler + Sync>> {
    let session = authorized_session(passphrase)?;
    let config = chain::require(chain)?;

    let provider = ProviderBuilder::new().on_http(config.rpc_url.parse()?);
    let safe = SafeAccount::resolve(provider, session.account().signer().clone(), chain).await?;

    let bundler = ProviderBuilder::new().on_http(credentials.bundler_rpc_url(chain).parse()?);
    let paymaster = ProviderBuilder::new().on_http(credentials.paymaster_rpc_url(chain).parse()?);
    let client = PimlicoClient::new(bundler, paymaster, ENTRY_POINT_V06);

    let submitter =
        SponsoredSubmitter::new(chain, credentials.pimlico_api_key.clone(), safe, client);
    info!(safe = %submitter.account().address(), owner = %session.address(), "Using Safe");

    Ok(submitter)
}
