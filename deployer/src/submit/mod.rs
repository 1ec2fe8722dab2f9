//! Deployment lifecycle: build, quote, submit, confirm.
//!
//! Request building and fee aggregation are shared; only the final
//! submission differs between [`DirectSubmitter`] and [`SponsoredSubmitter`].

mod direct;
mod sponsored;

use std::future::Future;

use alloy::primitives::{B256, U256};
use tracing::{error, info};

pub use direct::{inflate_gas_limit, DirectSubmitter, RouterClient, RpcRouterClient, GAS_PRICE_WEI};
pub use sponsored::{execute_user_operation, SponsoredSubmitter};

use crate::{
    error::DeployError,
    quote::{quote_total, DispatchQuoter, QuoteSet},
    request::{DeploymentPlan, DeploymentRequest},
};

/// Terminal outcome of one submitted transaction or user operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub transaction_hash: B256,
    pub success: bool,
}

/// Sends one router call carrying every destination and waits for its receipt.
///
/// Implementations never retry.
pub trait Submitter {
    /// Checks that `plan` can be submitted at all. Makes no network calls.
    fn preflight(&self, _plan: &DeploymentPlan) -> Result<(), DeployError> {
        Ok(())
    }

    fn submit(
        &self,
        plan: &DeploymentPlan,
        value: U256,
    ) -> impl Future<Output = Result<DeploymentReceipt, DeployError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Built,
    Quoted,
    Submitted,
    Confirmed,
    Failed,
}

/// One deployment attempt. A failed attempt is not reusable.
#[derive(Debug)]
pub struct Deployment {
    plan: DeploymentPlan,
    quotes: Option<QuoteSet>,
    stage: Stage,
}

impl Deployment {
    pub fn new(request: &DeploymentRequest) -> Result<Self, DeployError> {
        let plan = request.build()?;
        info!(
            source = plan.source,
            destinations = ?plan.destinations,
            "Deployment built"
        );

        Ok(Self {
            plan,
            quotes: None,
            stage: Stage::Built,
        })
    }

    pub fn plan(&self) -> &DeploymentPlan {
        &self.plan
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn quotes(&self) -> Option<&QuoteSet> {
        self.quotes.as_ref()
    }

    /// Runs the submitter's offline checks before anything is quoted.
    pub fn preflight<S>(&mut self, submitter: &S) -> Result<(), DeployError>
    where
        S: Submitter,
    {
        if self.stage != Stage::Built {
            return Err(DeployError::invalid(format!(
                "cannot check a deployment in stage {:?}",
                self.stage
            )));
        }

        if let Err(err) = submitter.preflight(&self.plan) {
            error!(error = %err, "Deployment rejected before quoting");
            self.stage = Stage::Failed;
            return Err(err);
        }
        Ok(())
    }

    pub async fn quote<Q>(&mut self, quoter: &Q) -> Result<&QuoteSet, DeployError>
    where
        Q: DispatchQuoter,
    {
        if self.stage != Stage::Built {
            return Err(DeployError::invalid(format!(
                "cannot quote a deployment in stage {:?}",
                self.stage
            )));
        }

        match quote_total(quoter, &self.plan).await {
            Ok(quotes) => {
                info!(total = %quotes.total, "Deployment quoted");
                self.stage = Stage::Quoted;
                Ok(self.quotes.insert(quotes))
            }
            Err(err) => {
                error!(error = %err, "Quoting failed");
                self.stage = Stage::Failed;
                Err(err)
            }
        }
    }

    pub async fn submit<S>(&mut self, submitter: &S) -> Result<DeploymentReceipt, DeployError>
    where
        S: Submitter,
    {
        let value = match (&self.quotes, self.stage) {
            (Some(quotes), Stage::Quoted) => quotes.total,
            _ => {
                return Err(DeployError::invalid(format!(
                    "cannot submit a deployment in stage {:?}",
                    self.stage
                )))
            }
        };

        self.stage = Stage::Submitted;
        info!(source = self.plan.source, value = %value, "Deployment submitted");

        match submitter.submit(&self.plan, value).await {
            Ok(receipt) if receipt.success => {
                self.stage = Stage::Confirmed;
                info!(tx_hash = %receipt.transaction_hash, "Deployment confirmed");
                Ok(receipt)
            }
            Ok(receipt) => {
                self.stage = Stage::Failed;
                error!(tx_hash = %receipt.transaction_hash, "Deployment reverted");
                Err(DeployError::ExecutionReverted {
                    tx_hash: receipt.transaction_hash,
                })
            }
            Err(err) => {
                self.stage = Stage::Failed;
                error!(error = %err, "Deployment submission failed");
                Err(err)
            }
        }
    }
}

/// Runs a full attempt: build, check, quote every destination, submit once.
pub async fn deploy<Q, S>(
    request: &DeploymentRequest,
    quoter: &Q,
    submitter: &S,
) -> Result<DeploymentReceipt, DeployError>
where
    Q: DispatchQuoter,
    S: Submitter,
{
    let mut deployment = Deployment::new(request)?;
    deployment.preflight(submitter)?;
    deployment.quote(quoter).await?;
    deployment.submit(submitter).await
}
