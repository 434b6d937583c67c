use crate::domain::event::Event;
use crate::domain::id::RecordId;
use crate::domain::ports::{EventStore, InsertOutcome, RegistrationStore, StudentStore, Stores};
use crate::domain::registration::Registration;
use crate::domain::student::Student;
use crate::error::{Result, SettlementError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for events.
pub const CF_EVENTS: &str = "events";
/// Column Family for students.
pub const CF_STUDENTS: &str = "students";
/// Column Family for registrations, keyed by registration id.
pub const CF_REGISTRATIONS: &str = "registrations";
/// `{event}|{student}` -> id of the pair's non-cancelled registration.
pub const CF_PAIRS: &str = "registration_pairs";
/// event id -> number of non-cancelled registrations (u32, big endian).
pub const CF_ACTIVE_COUNTS: &str = "active_counts";

/// A persistent store implementation using RocksDB.
///
/// Serves events, students and registrations from separate Column Families.
/// Read-modify-write operations take `write_lock` and commit through a
/// single `WriteBatch`, which makes the conditional registration insert
/// atomic with respect to the pair index and the per-event active counter.
///
/// `Clone` shares the underlying `Arc<DB>` and lock.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path` with all column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [
            CF_EVENTS,
            CF_STUDENTS,
            CF_REGISTRATIONS,
            CF_PAIRS,
            CF_ACTIVE_COUNTS,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// One database serving all three store ports.
    pub fn into_stores(self) -> Stores {
        let shared = Arc::new(self);
        Stores::new(shared.clone(), shared.clone(), shared)
    }

    /// Looks up a column family handle opened in [`RocksDBStore::open`].
    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            SettlementError::PersistenceError(format!("{} column family not found", name))
        })
    }

    /// Reads and deserializes a JSON value.
    fn read<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` as JSON and puts it outside any batch.
    fn write<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    /// Current value of the event's active counter, 0 when unset.
    fn active_count(&self, event_id: &RecordId) -> Result<u32> {
        let raw = self
            .db
            .get_cf(self.cf(CF_ACTIVE_COUNTS)?, event_id.as_str().as_bytes())?;
        match raw {
            Some(bytes) => {
                let bytes: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    SettlementError::PersistenceError("Corrupt active counter".to_string())
                })?;
                Ok(u32::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    /// Full scan of the registrations column family.
    fn registrations_where<F>(&self, keep: F) -> Result<Vec<Registration>>
    where
        F: Fn(&Registration) -> bool,
    {
        let mut out = Vec::new();
        for item in self
            .db
            .iterator_cf(self.cf(CF_REGISTRATIONS)?, IteratorMode::Start)
        {
            let (_key, value) = item?;
            let registration: Registration = serde_json::from_slice(&value)?;
            if keep(&registration) {
                out.push(registration);
            }
        }
        Ok(out)
    }
}

/// Key of the pair index.
fn pair_key(event_id: &RecordId, student_id: &RecordId) -> Vec<u8> {
    format!("{}|{}", event_id, student_id).into_bytes()
}

#[async_trait]
impl EventStore for RocksDBStore {
    async fn store(&self, event: Event) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(CF_EVENTS, event.id.as_str().as_bytes(), &event)
    }

    async fn get(&self, event_id: &RecordId) -> Result<Option<Event>> {
        self.read(CF_EVENTS, event_id.as_str().as_bytes())
    }

    async fn link_registration(
        &self,
        event_id: &RecordId,
        registration_id: &RecordId,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut event) = self.read::<Event>(CF_EVENTS, event_id.as_str().as_bytes())? else {
            return Ok(false);
        };
        if !event.link_registration(registration_id) {
            return Ok(false);
        }
        self.write(CF_EVENTS, event_id.as_str().as_bytes(), &event)?;
        Ok(true)
    }
}

#[async_trait]
impl StudentStore for RocksDBStore {
    async fn store(&self, student: Student) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(CF_STUDENTS, student.id.as_str().as_bytes(), &student)
    }

    async fn get(&self, student_id: &RecordId) -> Result<Option<Student>> {
        self.read(CF_STUDENTS, student_id.as_str().as_bytes())
    }

    async fn add_event_name(&self, student_id: &RecordId, event_name: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = student_id.as_str().as_bytes();
        let Some(mut student) = self.read::<Student>(CF_STUDENTS, key)? else {
            return Ok(false);
        };
        if !student.add_event_name(event_name) {
            return Ok(false);
        }
        self.write(CF_STUDENTS, key, &student)?;
        Ok(true)
    }
}

#[async_trait]
impl RegistrationStore for RocksDBStore {
    async fn insert_if_vacant(
        &self,
        registration: Registration,
        capacity: Option<u32>,
    ) -> Result<InsertOutcome> {
        let _guard = self.write_lock.lock().await;

        if let Some(student_id) = &registration.student_id {
            let pair = pair_key(&registration.event_id, student_id);
            if let Some(existing_id) = self.db.get_cf(self.cf(CF_PAIRS)?, &pair)? {
                if let Some(existing) = self.read::<Registration>(CF_REGISTRATIONS, &existing_id)? {
                    return Ok(InsertOutcome::Duplicate(existing));
                }
            }
        }

        let active = self.active_count(&registration.event_id)?;
        if let Some(capacity) = capacity {
            if active >= capacity {
                return Ok(InsertOutcome::Full);
            }
        }

        let id = registration.id.as_str().as_bytes();
        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_REGISTRATIONS)?,
            id,
            serde_json::to_vec(&registration)?,
        );
        if let Some(student_id) = &registration.student_id {
            batch.put_cf(
                self.cf(CF_PAIRS)?,
                pair_key(&registration.event_id, student_id),
                id,
            );
        }
        batch.put_cf(
            self.cf(CF_ACTIVE_COUNTS)?,
            registration.event_id.as_str().as_bytes(),
            (active + 1).to_be_bytes(),
        );
        self.db.write(batch)?;

        Ok(InsertOutcome::Inserted(registration))
    }

    /// Upserts and keeps the pair index and the active counter in step
    /// when the registration moves in or out of the cancelled state.
    async fn store(&self, registration: Registration) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let id = registration.id.as_str().as_bytes();
        let was_active = self
            .read::<Registration>(CF_REGISTRATIONS, id)?
            .map(|previous| previous.is_active())
            .unwrap_or(false);

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_REGISTRATIONS)?,
            id,
            serde_json::to_vec(&registration)?,
        );

        if was_active != registration.is_active() {
            let active = self.active_count(&registration.event_id)?;
            let active = if registration.is_active() {
                active + 1
            } else {
                active.saturating_sub(1)
            };
            batch.put_cf(
                self.cf(CF_ACTIVE_COUNTS)?,
                registration.event_id.as_str().as_bytes(),
                active.to_be_bytes(),
            );
            if let Some(student_id) = &registration.student_id {
                let pair = pair_key(&registration.event_id, student_id);
                if registration.is_active() {
                    batch.put_cf(self.cf(CF_PAIRS)?, pair, id);
                } else {
                    batch.delete_cf(self.cf(CF_PAIRS)?, pair);
                }
            }
        }

        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, registration_id: &RecordId) -> Result<Option<Registration>> {
        self.read(CF_REGISTRATIONS, registration_id.as_str().as_bytes())
    }

    async fn find_active(
        &self,
        event_id: &RecordId,
        student_id: &RecordId,
    ) -> Result<Option<Registration>> {
        match self
            .db
            .get_cf(self.cf(CF_PAIRS)?, pair_key(event_id, student_id))?
        {
            Some(id) => self.read(CF_REGISTRATIONS, &id),
            None => Ok(None),
        }
    }

    async fn count_active(&self, event_id: &RecordId) -> Result<usize> {
        Ok(self.active_count(event_id)? as usize)
    }

    async fn list_for_event(&self, event_id: &RecordId) -> Result<Vec<Registration>> {
        self.registrations_where(|r| &r.event_id == event_id)
    }

    async fn list_for_student(&self, student_id: &RecordId) -> Result<Vec<Registration>> {
        self.registrations_where(|r| r.student_id.as_ref() == Some(student_id))
    }

    async fn list_for_payment(&self, payment_id: &str) -> Result<Vec<Registration>> {
        self.registrations_where(|r| r.payment_id.as_deref() == Some(payment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registration::PaymentStatus;
    use chrono::Utc;
    use tempfile::tempdir;

    fn id(s: &str) -> RecordId {
        RecordId::parse(s).unwrap()
    }

    fn registration(student: &str) -> Registration {
        let event = Event::new(id("evt1"), "Hackathon", "2026-11-02");
        let student = Student::new(id(student), "Name", "n@example.com");
        Registration::for_student(&event, &student, None, Utc::now())
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for cf in [CF_EVENTS, CF_STUDENTS, CF_REGISTRATIONS, CF_PAIRS, CF_ACTIVE_COUNTS] {
            assert!(store.db.cf_handle(cf).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_event_and_student_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let event = Event::new(id("evt1"), "Hackathon", "2026-11-02");
        EventStore::store(&store, event.clone()).await.unwrap();
        assert_eq!(EventStore::get(&store, &id("evt1")).await.unwrap(), Some(event));
        assert!(store.link_registration(&id("evt1"), &id("r1")).await.unwrap());
        assert!(!store.link_registration(&id("evt1"), &id("r1")).await.unwrap());

        let student = Student::new(id("s1"), "Asha", "asha@example.com");
        StudentStore::store(&store, student).await.unwrap();
        assert!(store.add_event_name(&id("s1"), "Hackathon").await.unwrap());
        assert!(!store.add_event_name(&id("s1"), "Hackathon").await.unwrap());
        assert!(StudentStore::get(&store, &id("s2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_conditional_insert() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let first = registration("s1");
        assert_eq!(
            store.insert_if_vacant(first.clone(), Some(1)).await.unwrap(),
            InsertOutcome::Inserted(first.clone())
        );
        assert_eq!(
            store.insert_if_vacant(registration("s1"), Some(1)).await.unwrap(),
            InsertOutcome::Duplicate(first.clone())
        );
        assert_eq!(
            store.insert_if_vacant(registration("s2"), Some(1)).await.unwrap(),
            InsertOutcome::Full
        );
        assert_eq!(store.count_active(&id("evt1")).await.unwrap(), 1);

        let mut cancelled = first;
        cancelled.payment_status = PaymentStatus::Cancelled;
        RegistrationStore::store(&store, cancelled).await.unwrap();
        assert_eq!(store.count_active(&id("evt1")).await.unwrap(), 0);
        assert!(store.find_active(&id("evt1"), &id("s1")).await.unwrap().is_none());
        assert!(matches!(
            store.insert_if_vacant(registration("s2"), Some(1)).await.unwrap(),
            InsertOutcome::Inserted(_)
        ));
    }

    #[tokio::test]
    async fn test_rocksdb_persistence_recovery() {
        let dir = tempdir().unwrap();
        let reg = registration("s1");
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.insert_if_vacant(reg.clone(), None).await.unwrap();
        }
        let store = RocksDBStore::open(dir.path()).unwrap();
        assert_eq!(RegistrationStore::get(&store, &reg.id).await.unwrap(), Some(reg.clone()));
        assert_eq!(store.list_for_event(&id("evt1")).await.unwrap(), vec![reg]);
    }

    #[tokio::test]
    async fn test_rocksdb_lists_by_student_and_payment() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut paid = registration("s1");
        paid.payment_id = Some("pay_1".to_string());
        RegistrationStore::store(&store, paid.clone()).await.unwrap();
        RegistrationStore::store(&store, registration("s2")).await.unwrap();

        assert_eq!(store.list_for_student(&id("s1")).await.unwrap(), vec![paid.clone()]);
        assert_eq!(store.list_for_payment("pay_1").await.unwrap(), vec![paid]);
        assert!(store.list_for_payment("pay_9").await.unwrap().is_empty());
    }
}
