//! Asset transfer boundary
//!
//! The ledger never moves funds itself. Deposits pull from the caller into
//! the custody account and withdrawals push from custody to the caller, both
//! through one [`AssetTransfer`] capability. Native-value and token variants
//! differ only in the implementation behind the trait.

use crate::{types::ParticipantId, Error, Result};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Moves funds between external accounts
pub trait AssetTransfer: Send + Sync {
    /// Move `amount` from `from` to `to`, all or nothing
    fn transfer(&self, from: &ParticipantId, to: &ParticipantId, amount: Decimal) -> Result<()>;

    /// Funds currently held by `account`
    fn available(&self, account: &ParticipantId) -> Result<Decimal>;
}

/// Completed transfer as seen by [`Custody`]
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    /// Source account
    pub from: ParticipantId,
    /// Destination account
    pub to: ParticipantId,
    /// Amount moved
    pub amount: Decimal,
}

/// In-memory wallet book
///
/// Holds external balances for every account, including the ledger's own
/// custody account. Used by the server binary and by tests; `fail_next`
/// rejects upcoming transfers to simulate a refusing collaborator.
#[derive(Debug, Default)]
pub struct Custody {
    wallets: Mutex<HashMap<ParticipantId, Decimal>>,
    history: Mutex<Vec<TransferRecord>>,
    pending_failures: AtomicUsize,
}

impl Custody {
    /// Create empty wallet book
    pub fn new() -> Self {
        Self::default()
    }

    /// Add funds to an external wallet
    pub fn fund(&self, account: &ParticipantId, amount: Decimal) {
        *self.wallets.lock().entry(account.clone()).or_default() += amount;
    }

    /// External wallet balance
    pub fn balance_of(&self, account: &ParticipantId) -> Decimal {
        self.wallets
            .lock()
            .get(account)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Reject the next `count` transfers
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// All completed transfers, oldest first
    pub fn history(&self) -> Vec<TransferRecord> {
        self.history.lock().clone()
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl AssetTransfer for Custody {
    fn transfer(&self, from: &ParticipantId, to: &ParticipantId, amount: Decimal) -> Result<()> {
        if amount.is_sign_negative() {
            return Err(Error::Transfer(format!("Negative amount {}", amount)));
        }
        if self.take_failure() {
            return Err(Error::Transfer(format!(
                "Transfer of {} from {} to {} rejected",
                amount, from, to
            )));
        }

        let mut wallets = self.wallets.lock();
        let available = wallets.get(from).copied().unwrap_or(Decimal::ZERO);
        if available < amount {
            return Err(Error::Transfer(format!(
                "Insufficient funds in {}: {} < {}",
                from, available, amount
            )));
        }

        *wallets.entry(from.clone()).or_default() -= amount;
        *wallets.entry(to.clone()).or_default() += amount;
        drop(wallets);

        self.history.lock().push(TransferRecord {
            from: from.clone(),
            to: to.clone(),
            amount,
        });

        Ok(())
    }

    fn available(&self, account: &ParticipantId) -> Result<Decimal> {
        Ok(self.balance_of(account))
    }
}
