//! Participant directory and referral tree
//!
//! The directory is the sole owner of participant records. Sponsors are
//! stored as identities and resolved through the directory on every use.
//!
//! Mutating accessors feed the open [`Journal`], if any, so the ledger can
//! undo a failed operation.

use crate::{
    journal::Journal,
    types::{Participant, ParticipantId, ReferralInfo},
    Error, Result,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Owns participant records and the referral tree
///
/// Records only change through the ledger's engines:
///
/// ```compile_fail
/// use referral_ledger::{ParticipantDirectory, ParticipantId};
///
/// let mut directory = ParticipantDirectory::new();
/// directory.register(ParticipantId::new("a"), None).unwrap();
/// directory.participant_mut(&ParticipantId::new("a")).unwrap().level = 3;
/// ```
#[derive(Debug, Default)]
pub struct ParticipantDirectory {
    participants: HashMap<ParticipantId, Participant>,
    journal: Option<Journal>,
}

impl ParticipantDirectory {
    /// Create empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a directory from stored records
    ///
    /// Rejects duplicates, dangling sponsors and child lists that disagree
    /// with sponsor links.
    pub fn from_participants(records: Vec<Participant>) -> Result<Self> {
        let mut participants = HashMap::with_capacity(records.len());
        for record in records {
            if participants.contains_key(&record.id) {
                return Err(Error::InvariantViolation(format!(
                    "Duplicate participant {}",
                    record.id
                )));
            }
            participants.insert(record.id.clone(), record);
        }

        for participant in participants.values() {
            if let Some(sponsor) = &participant.sponsor {
                let linked = participants
                    .get(sponsor)
                    .map(|s| s.children.contains(&participant.id))
                    .unwrap_or(false);
                if !linked {
                    return Err(Error::InvariantViolation(format!(
                        "Participant {} is not listed under sponsor {}",
                        participant.id, sponsor
                    )));
                }
            }
            for child in &participant.children {
                let sponsored = participants
                    .get(child)
                    .and_then(|c| c.sponsor.as_ref())
                    .map(|s| s == &participant.id)
                    .unwrap_or(false);
                if !sponsored {
                    return Err(Error::InvariantViolation(format!(
                        "Child {} of {} does not name it as sponsor",
                        child, participant.id
                    )));
                }
            }
        }

        Ok(Self {
            participants,
            journal: None,
        })
    }

    /// Register a participant under an optional sponsor
    pub fn register(&mut self, id: ParticipantId, sponsor: Option<&ParticipantId>) -> Result<()> {
        if self.participants.contains_key(&id) {
            return Err(Error::AlreadyRegistered(id));
        }
        // A caller naming itself is rejected here too, since it is not yet registered.
        if let Some(sponsor) = sponsor {
            if !self.participants.contains_key(sponsor) {
                return Err(Error::UnknownSponsor(sponsor.clone()));
            }
        }

        self.record(&id);
        self.participants
            .insert(id.clone(), Participant::new(id.clone(), sponsor.cloned()));

        if let Some(sponsor) = sponsor {
            self.participant_mut(sponsor)?.children.push(id.clone());
        }

        tracing::debug!(
            participant = %id,
            sponsor = ?sponsor.map(ParticipantId::as_str),
            "Participant registered"
        );

        Ok(())
    }

    /// Get participant by ID
    pub fn get(&self, id: &ParticipantId) -> Result<&Participant> {
        self.participants
            .get(id)
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    /// Up to `depth` sponsors above `id`, nearest first
    pub fn sponsor_chain_upward(&self, id: &ParticipantId, depth: usize) -> Result<Vec<ParticipantId>> {
        let mut chain = Vec::with_capacity(depth);
        let mut next = self.get(id)?.sponsor.as_ref();

        while chain.len() < depth {
            let Some(sponsor) = next else { break };
            chain.push(sponsor.clone());
            next = self.participants.get(sponsor).and_then(|p| p.sponsor.as_ref());
        }

        Ok(chain)
    }

    /// Direct referrals of `id` with their current level, in registration order
    pub fn children(&self, id: &ParticipantId) -> Result<Vec<ReferralInfo>> {
        let participant = self.get(id)?;
        if participant.children.is_empty() {
            return Err(Error::NoReferrals);
        }

        Ok(participant
            .children
            .iter()
            .filter_map(|child| self.participants.get(child))
            .map(|child| ReferralInfo {
                id: child.id.clone(),
                level: child.level,
            })
            .collect())
    }

    /// Mutable access to a registered participant, journaled
    pub(crate) fn participant_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant> {
        self.record(id);
        self.participants
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Number of registered participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// True if nobody is registered
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Iterate over all participants (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Sum of all withdrawable balances
    pub fn total_balance(&self) -> Decimal {
        self.participants.values().map(|p| p.balance).sum()
    }

    // Unit of work

    /// Start journaling mutations
    pub fn begin(&mut self) -> Result<()> {
        if self.journal.is_some() {
            return Err(Error::Concurrency("Unit of work already open".to_string()));
        }
        self.journal = Some(Journal::new());
        Ok(())
    }

    /// Keep all mutations since `begin`; returns the number of touched records
    pub fn commit(&mut self) -> usize {
        self.journal.take().map(|j| j.len()).unwrap_or(0)
    }

    /// Undo all mutations since `begin`; returns the number of restored records
    pub fn rollback(&mut self) -> usize {
        let Some(journal) = self.journal.take() else {
            return 0;
        };

        let restored = journal.len();
        for (id, pre_image) in journal.into_undo() {
            match pre_image {
                Some(participant) => {
                    self.participants.insert(id, participant);
                }
                None => {
                    self.participants.remove(&id);
                }
            }
        }

        tracing::debug!(restored, "Unit of work rolled back");
        restored
    }

    fn record(&mut self, id: &ParticipantId) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record(id, self.participants.get(id));
        }
    }
}
