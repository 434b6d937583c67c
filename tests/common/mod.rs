#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evsettle::application::settlement::{SettlementService, SettlementSettings};
use evsettle::domain::event::Event;
use evsettle::domain::id::RecordId;
use evsettle::domain::order::{OrderRequest, ProviderOrder, ProviderPayment};
use evsettle::domain::ports::{
    Clock, GatewayError, Notification, Notifier, PaymentGateway, Stores,
};
use evsettle::domain::student::Student;
use evsettle::infrastructure::in_memory::in_memory_stores;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SECRET: &str = "test_secret";

pub fn id(s: &str) -> RecordId {
    RecordId::parse(s).unwrap()
}

/// Scripted payment provider. Orders are numbered `order_Mock1`,
/// `order_Mock2`, ... in creation order; payments exist once captured.
#[derive(Clone)]
pub struct MockGateway {
    pub payment_status: String,
    pub order_failure: Option<GatewayError>,
    pub payment_failure: Option<GatewayError>,
    pub calls: Arc<AtomicUsize>,
    pub orders: Arc<Mutex<Vec<OrderRequest>>>,
    /// payment id -> (order id, captured minor units)
    pub payments: Arc<Mutex<HashMap<String, (String, i64)>>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            payment_status: "captured".to_string(),
            order_failure: None,
            payment_failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            orders: Arc::new(Mutex::new(Vec::new())),
            payments: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl MockGateway {
    pub fn with_status(status: &str) -> Self {
        Self {
            payment_status: status.to_string(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Pays the order in full.
    pub fn capture(&self, order_id: &str, payment_id: &str) {
        let amount = self
            .order(order_id)
            .map(|request| request.amount)
            .unwrap_or_default();
        self.capture_amount(order_id, payment_id, amount);
    }

    pub fn capture_amount(&self, order_id: &str, payment_id: &str, amount: i64) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment_id.to_string(), (order_id.to_string(), amount));
    }

    fn order(&self, order_id: &str) -> Option<OrderRequest> {
        let index: usize = order_id.strip_prefix("order_Mock")?.parse().ok()?;
        self.orders.lock().unwrap().get(index.checked_sub(1)?).cloned()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<ProviderOrder, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.order_failure {
            return Err(e.clone());
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push(request.clone());
        Ok(ProviderOrder {
            id: format!("order_Mock{}", orders.len()),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            notes: Some(request.notes.clone()),
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.payment_failure {
            return Err(e.clone());
        }
        let Some((order_id, amount)) = self.payments.lock().unwrap().get(payment_id).cloned()
        else {
            return Err(GatewayError::Rejected(
                "The id provided does not exist".to_string(),
            ));
        };
        Ok(ProviderPayment {
            id: payment_id.to_string(),
            status: self.payment_status.clone(),
            order_id: Some(order_id),
            amount,
            currency: "INR".to_string(),
        })
    }

    async fn fetch_order(&self, order_id: &str) -> Result<ProviderOrder, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let request = self.order(order_id).ok_or_else(|| {
            GatewayError::Rejected("The id provided does not exist".to_string())
        })?;
        Ok(ProviderOrder {
            id: order_id.to_string(),
            amount: request.amount,
            currency: request.currency,
            receipt: Some(request.receipt),
            notes: Some(request.notes),
        })
    }

    fn key_id(&self) -> &str {
        "rzp_test_mock"
    }
}

/// Keeps every notification it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), String> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct Harness {
    pub service: SettlementService,
    pub stores: Stores,
    pub gateway: MockGateway,
    pub notifier: RecordingNotifier,
}

pub fn harness(gateway: MockGateway) -> Harness {
    let stores = in_memory_stores();
    let notifier = RecordingNotifier::default();
    let settings = SettlementSettings {
        currency: "INR".to_string(),
        key_secret: SECRET.to_string(),
    };
    let service = SettlementService::new(
        stores.clone(),
        Box::new(gateway.clone()),
        Box::new(notifier.clone()),
        settings,
    );
    Harness {
        service,
        stores,
        gateway,
        notifier,
    }
}

pub async fn seed_event(stores: &Stores, event: Event) {
    stores.events.store(event).await.unwrap();
}

pub async fn seed_students(stores: &Stores, count: usize) -> Vec<RecordId> {
    let mut ids = Vec::with_capacity(count);
    for i in 1..=count {
        let student_id = id(&format!("s{}", i));
        let student = Student::new(
            student_id.clone(),
            format!("Student {}", i),
            format!("student{}@example.com", i),
        );
        stores.students.store(student).await.unwrap();
        ids.push(student_id);
    }
    ids
}

pub fn write_file(path: &Path, contents: &str) -> Result<(), Error> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}
