//! Main ledger orchestration layer
//!
//! This module ties together the directory, the deposit and withdrawal
//! engines and the transfer collaborator into the public operation surface.
//! Every mutating call is one unit of work: it is fully applied, or the
//! journal and treasury copy put the ledger back exactly as it was.
//!
//! # Example
//!
//! ```no_run
//! use referral_ledger::{Config, Custody, Ledger, ParticipantId};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! fn main() -> referral_ledger::Result<()> {
//!     let custody = Arc::new(Custody::new());
//!     let mut ledger = Ledger::new(Config::default(), custody.clone())?;
//!
//!     let alice = ParticipantId::new("0xa11ce");
//!     custody.fund(&alice, dec!(1));
//!     ledger.sign_up(&alice)?;
//!     ledger.invest(&alice, dec!(0.006))?;
//!     assert_eq!(ledger.balance(&alice), dec!(0.0057));
//!
//!     Ok(())
//! }
//! ```

use crate::{
    directory::ParticipantDirectory,
    investment::InvestmentEngine,
    metrics::Metrics,
    snapshot::LedgerSnapshot,
    transfer::AssetTransfer,
    types::{
        DepositReceipt, Participant, ParticipantId, ReferralInfo, Treasury, WithdrawalReceipt,
    },
    withdrawal::WithdrawalEngine,
    Config, Error, Result,
};
use rust_decimal::Decimal;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Main ledger interface
pub struct Ledger {
    /// Participant records and referral tree
    directory: ParticipantDirectory,

    /// Custody and platform totals
    treasury: Treasury,

    /// Deposit processing
    investment: InvestmentEngine,

    /// Withdrawal processing
    withdrawal: WithdrawalEngine,

    /// Asset transfer collaborator
    transfer: Arc<dyn AssetTransfer>,

    /// Prometheus metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new(config: Config, transfer: Arc<dyn AssetTransfer>) -> Result<Self> {
        config.validate()?;

        let metrics = Metrics::new()
            .map_err(|e| Error::Other(format!("Failed to create metrics: {}", e)))?;

        Ok(Self {
            directory: ParticipantDirectory::new(),
            treasury: Treasury::default(),
            investment: InvestmentEngine::new(&config)?,
            withdrawal: WithdrawalEngine::new(&config),
            transfer,
            metrics,
            config,
        })
    }

    /// Rebuild a ledger from a snapshot
    pub fn restore(
        config: Config,
        transfer: Arc<dyn AssetTransfer>,
        snapshot: LedgerSnapshot,
    ) -> Result<Self> {
        let mut ledger = Self::new(config, transfer)?;

        // Levels follow the active threshold table, not the stored value.
        let levels = ledger.investment.levels();
        let mut relevelled = 0usize;
        let mut participants = snapshot.participants;
        for participant in &mut participants {
            let level = levels.level(participant.total_deposited);
            if participant.level != level {
                participant.level = level;
                relevelled += 1;
            }
        }

        ledger.directory = ParticipantDirectory::from_participants(participants)?;
        ledger.treasury = snapshot.treasury;
        ledger.check_conservation()?;
        ledger.check_custody_backing()?;
        ledger.metrics.set_participants(ledger.directory.len());

        tracing::info!(
            participants = ledger.directory.len(),
            custody = %ledger.treasury.custody,
            relevelled,
            "Ledger restored from snapshot"
        );

        Ok(ledger)
    }

    /// Restore from the configured snapshot file if present, else start empty
    pub fn open(config: Config, transfer: Arc<dyn AssetTransfer>) -> Result<Self> {
        match config.snapshot.path.clone() {
            Some(path) if path.exists() => {
                let snapshot = LedgerSnapshot::read_from(&path)?;
                Self::restore(config, transfer, snapshot)
            }
            _ => Self::new(config, transfer),
        }
    }

    /// Register the caller as a root participant
    pub fn sign_up(&mut self, caller: &ParticipantId) -> Result<()> {
        self.register(caller, None)
    }

    /// Register the caller under `sponsor`
    pub fn sign_up_with_sponsor(
        &mut self,
        caller: &ParticipantId,
        sponsor: &ParticipantId,
    ) -> Result<()> {
        self.register(caller, Some(sponsor))
    }

    fn register(&mut self, caller: &ParticipantId, sponsor: Option<&ParticipantId>) -> Result<()> {
        self.atomically("sign_up", |ledger| {
            if caller == &ledger.config.asset.custody_id() {
                return Err(Error::ReservedAccount(caller.clone()));
            }
            ledger.directory.register(caller.clone(), sponsor)
        })?;

        self.metrics.record_registration(self.directory.len());
        tracing::info!(
            participant = %caller,
            sponsor = ?sponsor.map(ParticipantId::as_str),
            "Participant signed up"
        );
        Ok(())
    }

    /// Deposit `amount` on behalf of the caller
    pub fn invest(&mut self, caller: &ParticipantId, amount: Decimal) -> Result<DepositReceipt> {
        let receipt = self.atomically("invest", |ledger| {
            ledger.investment.deposit(
                &mut ledger.directory,
                &mut ledger.treasury,
                ledger.transfer.as_ref(),
                caller,
                amount,
            )
        })?;

        self.metrics.record_deposit();
        tracing::info!(
            participant = %caller,
            amount = %receipt.amount,
            credited = %receipt.credited,
            level = receipt.level,
            "Deposit committed"
        );
        Ok(receipt)
    }

    /// Withdraw the caller's full balance
    pub fn withdraw(&mut self, caller: &ParticipantId) -> Result<WithdrawalReceipt> {
        let receipt = self.atomically("withdraw", |ledger| {
            ledger.withdrawal.withdraw(
                &mut ledger.directory,
                &mut ledger.treasury,
                ledger.transfer.as_ref(),
                caller,
            )
        })?;

        if !receipt.gross.is_zero() {
            self.metrics.record_withdrawal(receipt.commissions.len());
        }
        tracing::info!(
            participant = %caller,
            gross = %receipt.gross,
            commission = %receipt.total_commission(),
            net_payout = %receipt.net_payout,
            "Withdrawal committed"
        );
        Ok(receipt)
    }

    /// Withdrawable balance; zero for unknown participants
    pub fn balance(&self, id: &ParticipantId) -> Decimal {
        self.directory
            .get(id)
            .map(|p| p.balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Current tier; zero for unknown participants
    pub fn level(&self, id: &ParticipantId) -> u32 {
        self.directory.get(id).map(|p| p.level).unwrap_or(0)
    }

    /// Direct referrals of the caller with their levels
    pub fn referrals_info(&self, caller: &ParticipantId) -> Result<Vec<ReferralInfo>> {
        if !self.directory.contains(caller) {
            return Err(Error::NoReferrals);
        }
        self.directory.children(caller)
    }

    /// Full participant record
    pub fn participant(&self, id: &ParticipantId) -> Result<&Participant> {
        self.directory.get(id)
    }

    /// Number of registered participants
    pub fn participant_count(&self) -> usize {
        self.directory.len()
    }

    /// Total funds in custody
    pub fn custody(&self) -> Decimal {
        self.treasury.custody
    }

    /// Fees retained by the platform account
    pub fn platform_fees(&self) -> Decimal {
        self.treasury.platform_fees
    }

    /// Verify money conservation
    ///
    /// Custody must equal the sum of all balances plus retained platform fees.
    pub fn check_conservation(&self) -> Result<()> {
        let balances = self.directory.total_balance();
        let expected = balances + self.treasury.platform_fees;
        if self.treasury.custody != expected {
            return Err(Error::InvariantViolation(format!(
                "Custody {} != balances {} + platform fees {}",
                self.treasury.custody, balances, self.treasury.platform_fees
            )));
        }
        Ok(())
    }

    /// Verify the transfer collaborator actually holds the custody total
    pub fn check_custody_backing(&self) -> Result<()> {
        let account = self.config.asset.custody_id();
        let held = self.transfer.available(&account)?;
        if held < self.treasury.custody {
            return Err(Error::InvariantViolation(format!(
                "Custody account {} holds {} but ledger custody is {}",
                account, held, self.treasury.custody
            )));
        }
        Ok(())
    }

    /// Point-in-time copy of ledger state
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(self.directory.iter().cloned().collect(), self.treasury)
    }

    /// Write a snapshot to the configured path, if any
    pub fn save_snapshot(&self) -> Result<Option<PathBuf>> {
        match &self.config.snapshot.path {
            Some(path) => {
                self.snapshot().write_to(path)?;
                Ok(Some(path.clone()))
            }
            None => Ok(None),
        }
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run `operation` as one unit of work
    fn atomically<T>(
        &mut self,
        name: &'static str,
        operation: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.directory.begin()?;
        let treasury = self.treasury;

        match operation(self) {
            Ok(value) => {
                self.directory.commit();
                debug_assert!(self.check_conservation().is_ok());
                Ok(value)
            }
            Err(e) => {
                let restored = self.directory.rollback();
                self.treasury = treasury;
                self.metrics.record_rejected();
                tracing::warn!(operation = name, restored, error = %e, "Operation rejected");
                Err(e)
            }
        }
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("participants", &self.directory.len())
            .field("treasury", &self.treasury)
            .field("config", &self.config)
            .finish()
    }
}
