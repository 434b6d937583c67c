use crate::domain::event::Event;
use crate::domain::id::RecordId;
use crate::domain::ports::{EventStore, InsertOutcome, RegistrationStore, StudentStore, Stores};
use crate::domain::registration::Registration;
use crate::domain::student::Student;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for events.
///
/// Uses `Arc<RwLock<HashMap<RecordId, Event>>>`; clones share the same map.
#[derive(Default, Clone)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<HashMap<RecordId, Event>>>,
}

impl InMemoryEventStore {
    /// Creates a new, empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn store(&self, event: Event) -> Result<()> {
        let mut events = self.events.write().await;
        events.insert(event.id.clone(), event);
        Ok(())
    }

    async fn get(&self, event_id: &RecordId) -> Result<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.get(event_id).cloned())
    }

    /// Appends under the write lock, so concurrent links cannot drop each other.
    async fn link_registration(
        &self,
        event_id: &RecordId,
        registration_id: &RecordId,
    ) -> Result<bool> {
        let mut events = self.events.write().await;
        Ok(events
            .get_mut(event_id)
            .map(|event| event.link_registration(registration_id))
            .unwrap_or(false))
    }
}

/// A thread-safe in-memory store for students.
///
/// Uses `Arc<RwLock<HashMap<RecordId, Student>>>`; clones share the same map.
#[derive(Default, Clone)]
pub struct InMemoryStudentStore {
    students: Arc<RwLock<HashMap<RecordId, Student>>>,
}

impl InMemoryStudentStore {
    /// Creates a new, empty in-memory student store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn store(&self, student: Student) -> Result<()> {
        let mut students = self.students.write().await;
        students.insert(student.id.clone(), student);
        Ok(())
    }

    async fn get(&self, student_id: &RecordId) -> Result<Option<Student>> {
        let students = self.students.read().await;
        Ok(students.get(student_id).cloned())
    }

    /// Unknown students are left alone and reported as unchanged.
    async fn add_event_name(&self, student_id: &RecordId, event_name: &str) -> Result<bool> {
        let mut students = self.students.write().await;
        Ok(students
            .get_mut(student_id)
            .map(|student| student.add_event_name(event_name))
            .unwrap_or(false))
    }
}

/// A thread-safe in-memory store for registrations.
///
/// The conditional insert holds the write lock across check and insert, so
/// concurrent finalizations for the same pair or the last free slot
/// serialize on it.
#[derive(Default, Clone)]
pub struct InMemoryRegistrationStore {
    registrations: Arc<RwLock<HashMap<RecordId, Registration>>>,
}

impl InMemoryRegistrationStore {
    /// Creates a new, empty in-memory registration store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn insert_if_vacant(
        &self,
        registration: Registration,
        capacity: Option<u32>,
    ) -> Result<InsertOutcome> {
        let mut registrations = self.registrations.write().await;

        let mut active = 0usize;
        for existing in registrations.values() {
            if existing.event_id != registration.event_id || !existing.is_active() {
                continue;
            }
            if let Some(student_id) = &registration.student_id {
                if existing.belongs_to(&registration.event_id, student_id) {
                    return Ok(InsertOutcome::Duplicate(existing.clone()));
                }
            }
            active += 1;
        }

        if let Some(capacity) = capacity {
            if active >= capacity as usize {
                return Ok(InsertOutcome::Full);
            }
        }

        registrations.insert(registration.id.clone(), registration.clone());
        Ok(InsertOutcome::Inserted(registration))
    }

    async fn store(&self, registration: Registration) -> Result<()> {
        let mut registrations = self.registrations.write().await;
        registrations.insert(registration.id.clone(), registration);
        Ok(())
    }

    async fn get(&self, registration_id: &RecordId) -> Result<Option<Registration>> {
        let registrations = self.registrations.read().await;
        Ok(registrations.get(registration_id).cloned())
    }

    async fn find_active(
        &self,
        event_id: &RecordId,
        student_id: &RecordId,
    ) -> Result<Option<Registration>> {
        let registrations = self.registrations.read().await;
        Ok(registrations
            .values()
            .find(|r| r.is_active() && r.belongs_to(event_id, student_id))
            .cloned())
    }

    async fn count_active(&self, event_id: &RecordId) -> Result<usize> {
        let registrations = self.registrations.read().await;
        Ok(registrations
            .values()
            .filter(|r| r.is_active() && &r.event_id == event_id)
            .count())
    }

    async fn list_for_event(&self, event_id: &RecordId) -> Result<Vec<Registration>> {
        let registrations = self.registrations.read().await;
        Ok(registrations
            .values()
            .filter(|r| &r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_for_student(&self, student_id: &RecordId) -> Result<Vec<Registration>> {
        let registrations = self.registrations.read().await;
        Ok(registrations
            .values()
            .filter(|r| r.student_id.as_ref() == Some(student_id))
            .cloned()
            .collect())
    }

    async fn list_for_payment(&self, payment_id: &str) -> Result<Vec<Registration>> {
        let registrations = self.registrations.read().await;
        Ok(registrations
            .values()
            .filter(|r| r.payment_id.as_deref() == Some(payment_id))
            .cloned()
            .collect())
    }
}

/// Fresh, empty in-memory stores, one per port.
pub fn in_memory_stores() -> Stores {
    Stores::new(
        Arc::new(InMemoryEventStore::new()),
        Arc::new(InMemoryStudentStore::new()),
        Arc::new(InMemoryRegistrationStore::new()),
    )
}
