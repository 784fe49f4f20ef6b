//! Withdrawal processing and up-chain commission routing
//!
//! Steps run in a fixed order:
//!
//! 1. read the balance and zero it
//! 2. compute the level-1 and level-2 commission
//! 3. credit each resolved sponsor's balance
//! 4. compute the net payout
//! 5. push the payout through the transfer collaborator
//!
//! The balance is zeroed before the outbound transfer so a re-entered
//! withdrawal can never observe the old balance. A failed transfer fails the
//! whole call; the ledger's unit of work undoes steps 1-3.

use crate::{
    config::{UnpaidCommissionPolicy, ZeroBalancePolicy},
    directory::ParticipantDirectory,
    transfer::AssetTransfer,
    types::{CommissionCredit, ParticipantId, Treasury, WithdrawalReceipt},
    Config, Error, Result,
};
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Number of sponsor levels that receive commission
pub const COMMISSION_DEPTH: usize = 2;

/// Computes the commission split and pays out withdrawals
#[derive(Debug, Clone)]
pub struct WithdrawalEngine {
    rates: [Decimal; COMMISSION_DEPTH],
    custody: ParticipantId,
    zero_balance: ZeroBalancePolicy,
    unpaid_commission: UnpaidCommissionPolicy,
}

impl WithdrawalEngine {
    /// Create engine from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            rates: [config.fees.level1_rate, config.fees.level2_rate],
            custody: config.asset.custody_id(),
            zero_balance: config.policy.zero_balance,
            unpaid_commission: config.policy.unpaid_commission,
        }
    }

    /// Commission owed to each sponsor level for a gross withdrawal
    pub fn commission_for(&self, gross: Decimal) -> [Decimal; COMMISSION_DEPTH] {
        self.rates.map(|rate| gross * rate)
    }

    /// Withdraw the full balance of `id`
    pub fn withdraw(
        &self,
        directory: &mut ParticipantDirectory,
        treasury: &mut Treasury,
        transfer: &dyn AssetTransfer,
        id: &ParticipantId,
    ) -> Result<WithdrawalReceipt> {
        let gross = directory
            .get(id)
            .map_err(|_| Error::NotRegistered(id.clone()))?
            .balance;

        if gross <= Decimal::ZERO {
            return match self.zero_balance {
                ZeroBalancePolicy::Reject => Err(Error::NothingToWithdraw),
                ZeroBalancePolicy::NoOp => Ok(WithdrawalReceipt {
                    receipt_id: Uuid::now_v7(),
                    participant: id.clone(),
                    gross: Decimal::ZERO,
                    commissions: Vec::new(),
                    retained: Decimal::ZERO,
                    net_payout: Decimal::ZERO,
                    processed_at: Utc::now(),
                }),
            };
        }

        directory.participant_mut(id)?.balance = Decimal::ZERO;

        let fees = self.commission_for(gross);
        let chain = directory.sponsor_chain_upward(id, COMMISSION_DEPTH)?;

        let mut commissions = Vec::with_capacity(chain.len());
        let mut retained = Decimal::ZERO;
        for (index, fee) in fees.into_iter().enumerate() {
            match chain.get(index) {
                Some(sponsor) => {
                    directory.participant_mut(sponsor)?.balance += fee;
                    commissions.push(CommissionCredit {
                        sponsor: sponsor.clone(),
                        depth: index + 1,
                        amount: fee,
                    });
                }
                None => {
                    if self.unpaid_commission == UnpaidCommissionPolicy::RetainByPlatform {
                        retained += fee;
                    }
                }
            }
        }

        let paid: Decimal = commissions.iter().map(|c| c.amount).sum();
        let net_payout = gross - paid - retained;

        treasury.platform_fees += retained;
        treasury.custody -= net_payout;

        tracing::debug!(
            participant = %id,
            %gross,
            %paid,
            %retained,
            %net_payout,
            "Commission routed"
        );

        // Outward call last
        transfer.transfer(&self.custody, id, net_payout)?;

        Ok(WithdrawalReceipt {
            receipt_id: Uuid::now_v7(),
            participant: id.clone(),
            gross,
            commissions,
            retained,
            net_payout,
            processed_at: Utc::now(),
        })
    }
}
