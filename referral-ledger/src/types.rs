//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Participant identifier (wallet address, account handle, etc.)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create new participant ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How deposits reach custody
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Value attached to the call
    Native,
    /// Explicit transfer on an external fungible token
    Token,
}

impl AssetKind {
    /// Short name used in logs and config
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Native => "native",
            AssetKind::Token => "token",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registered participant
///
/// Only `balance`, `total_deposited` and `level` change after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Identity
    pub id: ParticipantId,

    /// Sponsor identity, looked up in the directory on demand
    pub sponsor: Option<ParticipantId>,

    /// Direct referrals in registration order
    pub children: Vec<ParticipantId>,

    /// Withdrawable funds
    pub balance: Decimal,

    /// Cumulative gross deposits
    pub total_deposited: Decimal,

    /// Tier derived from `total_deposited`
    pub level: u32,

    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    /// Fresh record with zero balance and level
    pub fn new(id: ParticipantId, sponsor: Option<ParticipantId>) -> Self {
        Self {
            id,
            sponsor,
            children: Vec::new(),
            balance: Decimal::ZERO,
            total_deposited: Decimal::ZERO,
            level: 0,
            registered_at: Utc::now(),
        }
    }

    /// Root participants have no sponsor
    pub fn is_root(&self) -> bool {
        self.sponsor.is_none()
    }
}

/// Direct referral as reported to its sponsor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralInfo {
    /// Referral identity
    pub id: ParticipantId,
    /// Referral's current level
    pub level: u32,
}

/// Funds held by the ledger
///
/// `custody` always equals the sum of participant balances plus
/// `platform_fees` once an operation completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Treasury {
    /// Total funds in custody
    pub custody: Decimal,

    /// Fees retained by the platform account
    pub platform_fees: Decimal,
}

/// Outcome of a deposit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Receipt ID (UUIDv7 for time-ordering)
    pub receipt_id: Uuid,
    /// Depositor
    pub participant: ParticipantId,
    /// Gross amount pulled into custody
    pub amount: Decimal,
    /// Platform fee retained
    pub fee: Decimal,
    /// Amount credited to the depositor's balance
    pub credited: Decimal,
    /// Level after the deposit
    pub level: u32,
    /// Processing timestamp
    pub processed_at: DateTime<Utc>,
}

/// Commission credited to one sponsor during a withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionCredit {
    /// Receiving sponsor
    pub sponsor: ParticipantId,
    /// 1 for the direct sponsor, 2 for the sponsor's sponsor
    pub depth: usize,
    /// Amount credited
    pub amount: Decimal,
}

/// Outcome of a withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    /// Receipt ID (UUIDv7 for time-ordering)
    pub receipt_id: Uuid,
    /// Withdrawer
    pub participant: ParticipantId,
    /// Balance before the withdrawal
    pub gross: Decimal,
    /// Commission credited up the chain
    pub commissions: Vec<CommissionCredit>,
    /// Commission share kept by the platform for missing upline levels
    pub retained: Decimal,
    /// Amount sent to the withdrawer
    pub net_payout: Decimal,
    /// Processing timestamp
    pub processed_at: DateTime<Utc>,
}

impl WithdrawalReceipt {
    /// Sum of commission credited to sponsors
    pub fn total_commission(&self) -> Decimal {
        self.commissions.iter().map(|c| c.amount).sum()
    }
}
