//! Durable snapshots of ledger state
//!
//! # Format
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────┐
//! │ SHA-256(body) 32 B   │ body: bincode(LedgerSnapshot)    │
//! └──────────────────────┴──────────────────────────────────┘
//! ```
//!
//! Files are written to a sibling temp file and renamed into place, so a
//! crash mid-write never leaves a truncated snapshot behind.

use crate::{
    types::{Participant, Treasury},
    Error, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

const DIGEST_LEN: usize = 32;

/// Point-in-time copy of the directory and treasury
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Format version
    pub version: u32,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// All participants, sorted by ID
    pub participants: Vec<Participant>,

    /// Custody and platform totals
    pub treasury: Treasury,
}

impl LedgerSnapshot {
    /// Build a snapshot; participants are sorted for a stable encoding
    pub fn new(mut participants: Vec<Participant>, treasury: Treasury) -> Self {
        participants.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            version: SNAPSHOT_VERSION,
            taken_at: Utc::now(),
            participants,
            treasury,
        }
    }

    /// Encode as digest || body
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)?;
        let digest = Sha256::digest(&body);

        let mut bytes = Vec::with_capacity(DIGEST_LEN + body.len());
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode and verify digest and version
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DIGEST_LEN {
            return Err(Error::Snapshot(format!(
                "Snapshot too short: {} bytes",
                bytes.len()
            )));
        }

        let (digest, body) = bytes.split_at(DIGEST_LEN);
        if Sha256::digest(body).as_slice() != digest {
            return Err(Error::Snapshot("Digest mismatch".to_string()));
        }

        let snapshot: LedgerSnapshot = bincode::deserialize(body)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Snapshot(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }

        Ok(snapshot)
    }

    /// Write atomically to `path`
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_bytes()?)?;
        std::fs::rename(&tmp, path)?;

        tracing::info!(
            path = %path.display(),
            participants = self.participants.len(),
            "Snapshot written"
        );

        Ok(())
    }

    /// Read and verify from `path`
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
