//! Configuration for the ledger

use crate::level::{default_thresholds, validate_thresholds};
use crate::types::{AssetKind, ParticipantId};
use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Asset configuration
    pub asset: AssetConfig,

    /// Fee rates
    pub fees: FeeConfig,

    /// Tier thresholds
    pub levels: LevelConfig,

    /// Behaviour where product rules are still open
    pub policy: PolicyConfig,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Snapshot configuration
    pub snapshot: SnapshotConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "referral-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            asset: AssetConfig::default(),
            fees: FeeConfig::default(),
            levels: LevelConfig::default(),
            policy: PolicyConfig::default(),
            actor: ActorConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

/// Asset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Native value or external token
    pub kind: AssetKind,

    /// Smallest accepted deposit
    pub min_deposit: Decimal,

    /// Account holding deposited funds
    pub custody_account: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            kind: AssetKind::Native,
            min_deposit: dec!(0.005),
            custody_account: "ledger-custody".to_string(),
        }
    }
}

impl AssetConfig {
    /// Custody account as a participant identity
    pub fn custody_id(&self) -> ParticipantId {
        ParticipantId::new(self.custody_account.clone())
    }
}

/// Fee rates, as fractions (0.05 = 5%)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Retained by the platform on every deposit
    pub deposit_fee_rate: Decimal,

    /// Paid to the direct sponsor on withdrawal
    pub level1_rate: Decimal,

    /// Paid to the sponsor's sponsor on withdrawal
    pub level2_rate: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            deposit_fee_rate: dec!(0.05),
            level1_rate: dec!(0.01),
            level2_rate: dec!(0.007),
        }
    }
}

/// Tier thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Ascending cumulative-deposit thresholds, first entry 0
    pub thresholds: Vec<Decimal>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
        }
    }
}

/// Withdrawal on a zero balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroBalancePolicy {
    /// Fail with `NothingToWithdraw`
    #[default]
    Reject,
    /// Succeed without moving funds
    NoOp,
}

/// Commission share whose upline level does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpaidCommissionPolicy {
    /// Not deducted; the withdrawer keeps it
    #[default]
    Skip,
    /// Deducted from the payout and kept by the platform account
    RetainByPlatform,
}

/// Policy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Zero-balance withdrawal
    pub zero_balance: ZeroBalancePolicy,

    /// Missing upline levels
    pub unpaid_commission: UnpaidCommissionPolicy,
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Snapshot file; snapshots are disabled when unset
    pub path: Option<PathBuf>,

    /// Snapshot every N committed operations (0 = only at shutdown)
    pub interval_ops: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: None,
            interval_ops: 1_000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(kind) = std::env::var("REFERRAL_ASSET_KIND") {
            config.asset.kind = match kind.as_str() {
                "native" => AssetKind::Native,
                "token" => AssetKind::Token,
                other => {
                    return Err(Error::Config(format!("Unknown asset kind: {}", other)));
                }
            };
        }

        if let Ok(min) = std::env::var("REFERRAL_MIN_DEPOSIT") {
            config.asset.min_deposit = parse_decimal("REFERRAL_MIN_DEPOSIT", &min)?;
        }

        if let Ok(account) = std::env::var("REFERRAL_CUSTODY_ACCOUNT") {
            config.asset.custody_account = account;
        }

        if let Ok(path) = std::env::var("REFERRAL_SNAPSHOT_PATH") {
            config.snapshot.path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check rates, minimum and threshold table
    pub fn validate(&self) -> Result<()> {
        if self.asset.min_deposit <= Decimal::ZERO {
            return Err(Error::Config("min_deposit must be positive".to_string()));
        }
        if self.asset.custody_account.is_empty() {
            return Err(Error::Config("custody_account must not be empty".to_string()));
        }

        for (name, rate) in [
            ("deposit_fee_rate", self.fees.deposit_fee_rate),
            ("level1_rate", self.fees.level1_rate),
            ("level2_rate", self.fees.level2_rate),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(Error::Config(format!("{} must be in [0, 1), got {}", name, rate)));
            }
        }
        if self.fees.level1_rate + self.fees.level2_rate >= Decimal::ONE {
            return Err(Error::Config(
                "Commission rates must sum to less than 1".to_string(),
            ));
        }

        if self.actor.mailbox_capacity == 0 {
            return Err(Error::Config("mailbox_capacity must be positive".to_string()));
        }

        validate_thresholds(&self.levels.thresholds)
    }
}

fn parse_decimal(var: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| Error::Config(format!("Invalid {}: {}", var, e)))
}
