//! Deposit processing
//!
//! Funds are pulled into custody before any balance is credited, so a
//! refused transfer leaves the ledger untouched.

use crate::{
    directory::ParticipantDirectory,
    level::LevelCalculator,
    transfer::AssetTransfer,
    types::{AssetKind, DepositReceipt, ParticipantId, Treasury},
    Config, Error, Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Validates and applies deposits
#[derive(Debug, Clone)]
pub struct InvestmentEngine {
    asset: AssetKind,
    min_deposit: Decimal,
    fee_rate: Decimal,
    custody: ParticipantId,
    levels: LevelCalculator,
}

impl InvestmentEngine {
    /// Create engine from configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            asset: config.asset.kind,
            min_deposit: config.asset.min_deposit,
            fee_rate: config.fees.deposit_fee_rate,
            custody: config.asset.custody_id(),
            levels: LevelCalculator::new(config.levels.thresholds.clone())?,
        })
    }

    /// Platform fee on a gross deposit
    pub fn fee_for(&self, amount: Decimal) -> Decimal {
        amount * self.fee_rate
    }

    /// Level calculator in use
    pub fn levels(&self) -> &LevelCalculator {
        &self.levels
    }

    /// Apply a deposit of `amount` by `id`
    pub fn deposit(
        &self,
        directory: &mut ParticipantDirectory,
        treasury: &mut Treasury,
        transfer: &dyn AssetTransfer,
        id: &ParticipantId,
        amount: Decimal,
    ) -> Result<DepositReceipt> {
        if !directory.contains(id) {
            return Err(Error::NotRegistered(id.clone()));
        }
        if amount < self.min_deposit {
            return Err(Error::BelowMinimum {
                minimum: self.min_deposit,
                asset: self.asset,
            });
        }

        transfer.transfer(id, &self.custody, amount)?;

        let fee = self.fee_for(amount);
        let credited = amount - fee;

        let participant = directory.participant_mut(id)?;
        participant.balance += credited;
        participant.total_deposited += amount;
        participant.level = self.levels.level(participant.total_deposited);
        let level = participant.level;

        treasury.custody += amount;
        treasury.platform_fees += fee;

        tracing::debug!(
            participant = %id,
            %amount,
            %fee,
            level,
            "Deposit applied"
        );

        Ok(DepositReceipt {
            receipt_id: Uuid::now_v7(),
            participant: id.clone(),
            amount,
            fee,
            credited,
            level,
            processed_at: Utc::now(),
        })
    }
}
