//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `referral_ledger_registrations_total` - Participants registered
//! - `referral_ledger_deposits_total` - Deposits applied
//! - `referral_ledger_withdrawals_total` - Withdrawals paid out
//! - `referral_ledger_commission_credits_total` - Sponsor credits made during withdrawals
//! - `referral_ledger_rejected_operations_total` - Operations rolled back or refused
//! - `referral_ledger_participants` - Current directory size

use prometheus::{IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
///
/// Collectors live in a private registry, so several ledgers can coexist in
/// one process.
#[derive(Clone)]
pub struct Metrics {
    /// Participants registered
    pub registrations_total: IntCounter,

    /// Deposits applied
    pub deposits_total: IntCounter,

    /// Withdrawals paid out
    pub withdrawals_total: IntCounter,

    /// Sponsor credits
    pub commission_credits_total: IntCounter,

    /// Rejected operations
    pub rejected_total: IntCounter,

    /// Directory size
    pub participants: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let registrations_total = IntCounter::new(
            "referral_ledger_registrations_total",
            "Participants registered",
        )?;
        registry.register(Box::new(registrations_total.clone()))?;

        let deposits_total =
            IntCounter::new("referral_ledger_deposits_total", "Deposits applied")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("referral_ledger_withdrawals_total", "Withdrawals paid out")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let commission_credits_total = IntCounter::new(
            "referral_ledger_commission_credits_total",
            "Sponsor credits made during withdrawals",
        )?;
        registry.register(Box::new(commission_credits_total.clone()))?;

        let rejected_total = IntCounter::new(
            "referral_ledger_rejected_operations_total",
            "Operations rolled back or refused",
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        let participants =
            IntGauge::new("referral_ledger_participants", "Current directory size")?;
        registry.register(Box::new(participants.clone()))?;

        Ok(Self {
            registrations_total,
            deposits_total,
            withdrawals_total,
            commission_credits_total,
            rejected_total,
            participants,
            registry,
        })
    }

    /// Record registration
    pub fn record_registration(&self, directory_size: usize) {
        self.registrations_total.inc();
        self.participants.set(directory_size as i64);
    }

    /// Record deposit
    pub fn record_deposit(&self) {
        self.deposits_total.inc();
    }

    /// Record withdrawal and the number of sponsors credited
    pub fn record_withdrawal(&self, credits: usize) {
        self.withdrawals_total.inc();
        self.commission_credits_total.inc_by(credits as u64);
    }

    /// Record a refused or rolled back operation
    pub fn record_rejected(&self) {
        self.rejected_total.inc();
    }

    /// Set directory size (after a restore)
    pub fn set_participants(&self, count: usize) {
        self.participants.set(count as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("deposits_total", &self.deposits_total.get())
            .field("withdrawals_total", &self.withdrawals_total.get())
            .field("participants", &self.participants.get())
            .finish()
    }
}
