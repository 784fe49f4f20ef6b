//! Actor-based hosting for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`Ledger`]; operations never interleave
//! - Callers hold a cloneable [`LedgerHandle`]
//! - Bounded mailbox gives backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │ Ledger: one unit of work per message           │  │
//! │  │ Every N commits → snapshot                     │  │
//! │  └────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::types::{DepositReceipt, ParticipantId, ReferralInfo, WithdrawalReceipt};
use crate::{Error, Ledger, Result};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Register the caller, optionally under a sponsor
    SignUp {
        caller: ParticipantId,
        sponsor: Option<ParticipantId>,
        response: oneshot::Sender<Result<()>>,
    },

    /// Deposit funds
    Invest {
        caller: ParticipantId,
        amount: Decimal,
        response: oneshot::Sender<Result<DepositReceipt>>,
    },

    /// Withdraw the full balance
    Withdraw {
        caller: ParticipantId,
        response: oneshot::Sender<Result<WithdrawalReceipt>>,
    },

    /// Read balance
    GetBalance {
        id: ParticipantId,
        response: oneshot::Sender<Decimal>,
    },

    /// Read level
    GetLevel {
        id: ParticipantId,
        response: oneshot::Sender<u32>,
    },

    /// Read direct referrals
    GetReferralsInfo {
        caller: ParticipantId,
        response: oneshot::Sender<Result<Vec<ReferralInfo>>>,
    },

    /// Write a snapshot now
    Snapshot {
        response: oneshot::Sender<Result<Option<PathBuf>>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
#[derive(Debug)]
pub struct LedgerActor {
    /// Owned ledger
    ledger: Ledger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Commits since the last snapshot
    commits_since_snapshot: u64,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(ledger: Ledger, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self {
            ledger,
            mailbox,
            commits_since_snapshot: 0,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                break;
            }
            self.handle_message(msg);
        }

        // Mailbox closed or shutdown requested
        if let Err(e) = self.ledger.save_snapshot() {
            tracing::error!("Error writing final snapshot: {}", e);
        }
        tracing::info!("Ledger actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::SignUp {
                caller,
                sponsor,
                response,
            } => {
                let result = match &sponsor {
                    Some(sponsor) => self.ledger.sign_up_with_sponsor(&caller, sponsor),
                    None => self.ledger.sign_up(&caller),
                };
                self.after_commit(result.is_ok());
                let _ = response.send(result);
            }

            LedgerMessage::Invest {
                caller,
                amount,
                response,
            } => {
                let result = self.ledger.invest(&caller, amount);
                self.after_commit(result.is_ok());
                let _ = response.send(result);
            }

            LedgerMessage::Withdraw { caller, response } => {
                let result = self.ledger.withdraw(&caller);
                self.after_commit(result.is_ok());
                let _ = response.send(result);
            }

            LedgerMessage::GetBalance { id, response } => {
                let _ = response.send(self.ledger.balance(&id));
            }

            LedgerMessage::GetLevel { id, response } => {
                let _ = response.send(self.ledger.level(&id));
            }

            LedgerMessage::GetReferralsInfo { caller, response } => {
                let _ = response.send(self.ledger.referrals_info(&caller));
            }

            LedgerMessage::Snapshot { response } => {
                let result = self.ledger.save_snapshot();
                if result.is_ok() {
                    self.commits_since_snapshot = 0;
                }
                let _ = response.send(result);
            }

            LedgerMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }

    /// Count a commit and snapshot when the interval is reached
    fn after_commit(&mut self, committed: bool) {
        if !committed {
            return;
        }

        self.commits_since_snapshot += 1;
        let interval = self.ledger.config().snapshot.interval_ops;
        if interval == 0 || self.commits_since_snapshot < interval {
            return;
        }

        match self.ledger.save_snapshot() {
            Ok(_) => self.commits_since_snapshot = 0,
            Err(e) => tracing::error!("Error writing periodic snapshot: {}", e),
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Register the caller as a root participant
    pub async fn sign_up(&self, caller: ParticipantId) -> Result<()> {
        self.request(|response| LedgerMessage::SignUp {
            caller,
            sponsor: None,
            response,
        })
        .await?
    }

    /// Register the caller under `sponsor`
    pub async fn sign_up_with_sponsor(
        &self,
        caller: ParticipantId,
        sponsor: ParticipantId,
    ) -> Result<()> {
        self.request(|response| LedgerMessage::SignUp {
            caller,
            sponsor: Some(sponsor),
            response,
        })
        .await?
    }

    /// Deposit funds
    pub async fn invest(&self, caller: ParticipantId, amount: Decimal) -> Result<DepositReceipt> {
        self.request(|response| LedgerMessage::Invest {
            caller,
            amount,
            response,
        })
        .await?
    }

    /// Withdraw the full balance
    pub async fn withdraw(&self, caller: ParticipantId) -> Result<WithdrawalReceipt> {
        self.request(|response| LedgerMessage::Withdraw { caller, response })
            .await?
    }

    /// Read balance
    pub async fn balance(&self, id: ParticipantId) -> Result<Decimal> {
        self.request(|response| LedgerMessage::GetBalance { id, response })
            .await
    }

    /// Read level
    pub async fn level(&self, id: ParticipantId) -> Result<u32> {
        self.request(|response| LedgerMessage::GetLevel { id, response })
            .await
    }

    /// Read direct referrals
    pub async fn referrals_info(&self, caller: ParticipantId) -> Result<Vec<ReferralInfo>> {
        self.request(|response| LedgerMessage::GetReferralsInfo { caller, response })
            .await?
    }

    /// Write a snapshot to the configured path
    pub async fn snapshot(&self) -> Result<Option<PathBuf>> {
        self.request(|response| LedgerMessage::Snapshot { response })
            .await?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(ledger: Ledger) -> (LedgerHandle, tokio::task::JoinHandle<()>) {
    let capacity = ledger.config().actor.mailbox_capacity;
    let (tx, rx) = mpsc::channel(capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(ledger, rx);

    let task = tokio::spawn(async move {
        actor.run().await;
    });

    (LedgerHandle::new(tx), task)
}
