//! Referral Ledger
//!
//! Referral-tree investment ledger with up-chain commission routing.
//!
//! # Architecture
//!
//! - **Directory**: Sole owner of participant records and the referral tree
//! - **Engines**: Deposit and withdrawal rules, one external transfer each
//! - **Unit of Work**: Every operation is fully applied or fully rolled back
//! - **Single Writer**: One actor task serialises operations in hosted mode
//!
//! # Invariants
//!
//! - Money conservation: custody == Σ(balances) + platform fees
//! - Sponsors are immutable and were registered when assigned
//! - Referral lists are append-only, in registration order
//! - Balance is zeroed before any outbound transfer

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod level;
pub mod journal;
pub mod directory;
pub mod transfer;
pub mod investment;
pub mod withdrawal;
pub mod ledger;
pub mod snapshot;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    AssetKind, CommissionCredit, DepositReceipt, Participant, ParticipantId, ReferralInfo,
    Treasury, WithdrawalReceipt,
};
pub use directory::ParticipantDirectory;
pub use level::LevelCalculator;
pub use transfer::{AssetTransfer, Custody};
pub use ledger::Ledger;
pub use actor::{spawn_ledger_actor, LedgerHandle};
pub use config::Config;
