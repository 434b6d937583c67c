use super::event::Event;
use super::id::RecordId;
use super::order::{OrderRequest, ProviderOrder, ProviderPayment};
use super::registration::Registration;
use super::student::Student;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn store(&self, event: Event) -> Result<()>;
    async fn get(&self, event_id: &RecordId) -> Result<Option<Event>>;
    /// Appends a registration id to the event's list unless already present.
    /// Returns `false` when the event was not changed.
    async fn link_registration(&self, event_id: &RecordId, registration_id: &RecordId)
    -> Result<bool>;
}

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn store(&self, student: Student) -> Result<()>;
    async fn get(&self, student_id: &RecordId) -> Result<Option<Student>>;
    /// Set-like, order preserving insertion into the student's event names.
    async fn add_event_name(&self, student_id: &RecordId, event_name: &str) -> Result<bool>;
}

/// Result of the atomic conditional insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Registration),
    /// A non-cancelled registration for the pair already exists.
    Duplicate(Registration),
    /// The event's capacity is already used up.
    Full,
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Inserts `registration` only if no other non-cancelled registration
    /// exists for its (event, student) pair and the event's active count is
    /// below `capacity`. Check and insert happen as one atomic step.
    async fn insert_if_vacant(
        &self,
        registration: Registration,
        capacity: Option<u32>,
    ) -> Result<InsertOutcome>;
    /// Unconditional upsert, used for updates of existing records.
    async fn store(&self, registration: Registration) -> Result<()>;
    async fn get(&self, registration_id: &RecordId) -> Result<Option<Registration>>;
    async fn find_active(
        &self,
        event_id: &RecordId,
        student_id: &RecordId,
    ) -> Result<Option<Registration>>;
    async fn count_active(&self, event_id: &RecordId) -> Result<usize>;
    async fn list_for_event(&self, event_id: &RecordId) -> Result<Vec<Registration>>;
    async fn list_for_student(&self, student_id: &RecordId) -> Result<Vec<Registration>>;
    /// Every registration, cancelled or not, that records `payment_id`.
    async fn list_for_payment(&self, payment_id: &str) -> Result<Vec<Registration>>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The provider answered with an explicit error.
    #[error("{0}")]
    Rejected(String),
    #[error("payment provider did not respond in time")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> std::result::Result<ProviderOrder, GatewayError>;
    async fn fetch_payment(
        &self,
        payment_id: &str,
    ) -> std::result::Result<ProviderPayment, GatewayError>;
    async fn fetch_order(&self, order_id: &str) -> std::result::Result<ProviderOrder, GatewayError>;
    /// Public key id handed to clients for checkout.
    fn key_id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> std::result::Result<(), String>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The three stores, shared by the settlement and roster services.
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventStore>,
    pub students: Arc<dyn StudentStore>,
    pub registrations: Arc<dyn RegistrationStore>,
}

impl Stores {
    pub fn new(
        events: Arc<dyn EventStore>,
        students: Arc<dyn StudentStore>,
        registrations: Arc<dyn RegistrationStore>,
    ) -> Self {
        Self {
            events,
            students,
            registrations,
        }
    }
}

pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type NotifierBox = Box<dyn Notifier>;
pub type ClockBox = Box<dyn Clock>;
