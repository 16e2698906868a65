use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A schedulable org event. `id` is a stable surrogate key assigned at
/// creation; display position is derived from the roster order and is NOT
/// stable across removals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    pub title: String,
    pub date: String,
    pub description: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub declined: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RsvpOutcome {
    Joined,
    AlreadyJoined,
    Declined,
    AlreadyDeclined,
}

/// Ordered roster of events plus the monotonic id counter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRoster {
    pub next_event_id: u64,
    pub events: Vec<EventRecord>,
}

impl EventRoster {
    pub fn create(
        &mut self,
        title: impl Into<String>,
        date: impl Into<String>,
        description: impl Into<String>,
        authorized: bool,
    ) -> Result<EventRecord, DomainError> {
        if !authorized {
            return Err(DomainError::Unauthorized);
        }

        let event = EventRecord {
            id: self.next_event_id,
            title: title.into(),
            date: date.into(),
            description: description.into(),
            participants: Vec::new(),
            declined: Vec::new(),
        };
        self.next_event_id = self.next_event_id.saturating_add(1);
        self.events.push(event.clone());
        Ok(event)
    }

    /// Join is idempotent and clears any earlier refusal, keeping
    /// `participants` and `declined` disjoint.
    pub fn join(&mut self, event_id: u64, user_id: &str) -> Result<RsvpOutcome, DomainError> {
        let event = self.event_by_id_mut(event_id)?;
        event.declined.retain(|user| user != user_id);
        if event.participants.iter().any(|user| user == user_id) {
            return Ok(RsvpOutcome::AlreadyJoined);
        }
        event.participants.push(user_id.to_owned());
        Ok(RsvpOutcome::Joined)
    }

    /// Decline removes the user from `participants` unconditionally and
    /// records the explicit refusal.
    pub fn decline(&mut self, event_id: u64, user_id: &str) -> Result<RsvpOutcome, DomainError> {
        let event = self.event_by_id_mut(event_id)?;
        event.participants.retain(|user| user != user_id);
        if event.declined.iter().any(|user| user == user_id) {
            return Ok(RsvpOutcome::AlreadyDeclined);
        }
        event.declined.push(user_id.to_owned());
        Ok(RsvpOutcome::Declined)
    }

    pub fn remove(&mut self, event_id: u64, authorized: bool) -> Result<EventRecord, DomainError> {
        if !authorized {
            return Err(DomainError::Unauthorized);
        }
        let position = self
            .events
            .iter()
            .position(|event| event.id == event_id)
            .ok_or_else(|| DomainError::not_found(event_id.to_string()))?;
        Ok(self.events.remove(position))
    }

    /// Remove by current display position; later events shift down by one.
    pub fn remove_at(&mut self, position: usize, authorized: bool) -> Result<EventRecord, DomainError> {
        if !authorized {
            return Err(DomainError::Unauthorized);
        }
        if position >= self.events.len() {
            return Err(DomainError::not_found(position.to_string()));
        }
        Ok(self.events.remove(position))
    }

    pub fn event_by_id(&self, event_id: u64) -> Option<&EventRecord> {
        self.events.iter().find(|event| event.id == event_id)
    }

    fn event_by_id_mut(&mut self, event_id: u64) -> Result<&mut EventRecord, DomainError> {
        self.events
            .iter_mut()
            .find(|event| event.id == event_id)
            .ok_or_else(|| DomainError::not_found(event_id.to_string()))
    }
}
