use super::id::RecordId;
use super::money::Fee;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event students can register for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub name: String,
    /// Display date as entered by the organiser.
    pub date: String,
    pub venue: Option<String>,
    /// The teacher who owns the event, if any.
    pub teacher_id: Option<RecordId>,
    /// Upper bound on non-cancelled registrations.
    pub capacity: Option<u32>,
    /// Absent or zero means the event is free.
    pub fee: Option<Fee>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub group_link: Option<String>,
    /// Registration ids in the order they were finalized.
    #[serde(default)]
    pub registrations: Vec<RecordId>,
}

impl Event {
    pub fn new(id: RecordId, name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            date: date.into(),
            venue: None,
            teacher_id: None,
            capacity: None,
            fee: None,
            registration_deadline: None,
            group_link: None,
            registrations: Vec::new(),
        }
    }

    pub fn fee(&self) -> Fee {
        self.fee.unwrap_or(Fee::ZERO)
    }

    /// Whether `active` registrations already fill the event.
    pub fn is_full(&self, active: usize) -> bool {
        match self.capacity {
            Some(capacity) => active >= capacity as usize,
            None => false,
        }
    }

    /// Registrations are accepted up to and including the deadline instant.
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        match self.registration_deadline {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    /// Set-like append; returns `false` when the id was already linked.
    pub fn link_registration(&mut self, registration: &RecordId) -> bool {
        if self.registrations.contains(registration) {
            return false;
        }
        self.registrations.push(registration.clone());
        true
    }
}
