use alloy::primitives::B256;

use crate::chain::ChainId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure outcome of building, quoting or submitting a deployment.
///
/// `InvalidInput` and `UnsupportedChain` are raised before any network call.
/// `QuoteFailed` is raised before any value is attached to a transaction.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("chain {chain} is not supported: {reason}")]
    UnsupportedChain { chain: ChainId, reason: &'static str },
    #[error("fee quote for destination chain {chain} failed")]
    QuoteFailed {
        chain: ChainId,
        #[source]
        source: BoxError,
    },
    #[error("submission failed")]
    SubmissionFailed(#[source] BoxError),
    #[error("execution reverted in transaction {tx_hash}")]
    ExecutionReverted { tx_hash: B256 },
}

impl DeployError {
    pub(crate) fn submission(err: impl Into<BoxError>) -> Self {
        Self::SubmissionFailed(err.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
