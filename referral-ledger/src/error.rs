//! Error types for the referral ledger
//!
//! Display strings of the participant-facing variants are part of the
//! public contract and must not change.

use crate::types::{AssetKind, ParticipantId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is already in the directory
    #[error("user already registered")]
    AlreadyRegistered(ParticipantId),

    /// Sponsor given at sign-up is not registered
    #[error("referrer address doesn't exist")]
    UnknownSponsor(ParticipantId),

    /// Caller is the ledger's own custody account
    #[error("address is reserved by the ledger")]
    ReservedAccount(ParticipantId),

    /// Deposit below the configured minimum
    #[error("{}", below_minimum_message(.asset, .minimum))]
    BelowMinimum {
        /// Configured minimum deposit
        minimum: Decimal,
        /// Asset variant, selects the message wording
        asset: AssetKind,
    },

    /// Acting participant is not registered
    #[error("user is not registered")]
    NotRegistered(ParticipantId),

    /// Lookup of an unknown participant
    #[error("Participant not found: {0}")]
    NotFound(ParticipantId),

    /// Caller has no direct referrals
    #[error("No referrals")]
    NoReferrals,

    /// Withdrawal with a zero balance
    #[error("nothing to withdraw")]
    NothingToWithdraw,

    /// Asset transfer rejected by the collaborator
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Invariant violation (money conservation, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Snapshot is unreadable or fails its digest check
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn below_minimum_message(asset: &AssetKind, minimum: &Decimal) -> String {
    match asset {
        AssetKind::Native => format!("minimal value = {} Eth", minimum),
        AssetKind::Token => format!("donate at least {} tokens", minimum),
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
