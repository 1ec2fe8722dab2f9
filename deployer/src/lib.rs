//! Deploys one piece of bytecode to several chains with a single transaction
//! on a source chain, paying every destination's cross-chain dispatch fee up
//! front.

pub mod account;
pub mod bindings;
pub mod chain;
pub mod config;
pub mod error;
pub mod nickname;
pub mod pimlico;
pub mod quote;
pub mod request;
pub mod safe;
pub mod session;
pub mod submit;

pub use account::{derive_account, Account};
pub use chain::{ChainConfig, ChainId};
pub use config::Credentials;
pub use error::DeployError;
pub use quote::{quote_total, DispatchQuoter, MailboxQuoter, QuoteSet};
pub use request::{DeploymentPlan, DeploymentRequest};
pub use submit::{
    deploy, Deployment, DeploymentReceipt, DirectSubmitter, SponsoredSubmitter, Stage, Submitter,
};
