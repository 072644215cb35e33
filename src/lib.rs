#![doc = include_str!("../README.md")]

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod hook;
pub mod payout;
pub mod pipeline;
mod readiness;
mod session;
pub mod sub_code;
pub mod types;
pub mod validate;

// Re-exports for convenient access
pub use auth::{HandshakeStage, RetryPolicy};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{BoxError, Error, Result};
pub use hook::{Hook, HookData, HookInvocation};
pub use payout::{
    BankDetails, BankValidation, BeneficiaryLookup, NewBeneficiary, Page, RemoveBeneficiary,
    TransferLookup, TransferMode, TransferRequest,
};
pub use pipeline::{InboundResponse, OutboundRequest};
pub use session::SessionSnapshot;
pub use types::{AccessToken, BeneficiaryId, CorrelationId, TransferId};
pub use validate::{LifecycleStatus, classify};
