//! Undo log for a unit of work
//!
//! The directory records the first pre-image of every participant an open
//! unit of work touches. Rolling back replays the pre-images in reverse
//! order; a `None` pre-image removes a record created inside the unit.

use crate::types::{Participant, ParticipantId};
use std::collections::HashSet;

/// Pre-images captured during one unit of work
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<(ParticipantId, Option<Participant>)>,
    touched: HashSet<ParticipantId>,
}

impl Journal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state of `id` before its first mutation in this unit
    pub fn record(&mut self, id: &ParticipantId, pre_image: Option<&Participant>) {
        if self.touched.insert(id.clone()) {
            self.entries.push((id.clone(), pre_image.cloned()));
        }
    }

    /// Whether `id` has been touched
    pub fn is_touched(&self, id: &ParticipantId) -> bool {
        self.touched.contains(id)
    }

    /// Number of touched participants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was touched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pre-images, most recent first
    pub fn into_undo(self) -> impl Iterator<Item = (ParticipantId, Option<Participant>)> {
        self.entries.into_iter().rev()
    }
}
