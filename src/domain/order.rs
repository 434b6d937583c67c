use super::event::Event;
use super::id::RecordId;
use super::registration::Registration;
use serde::{Deserialize, Deserializer, Serialize};

/// Provider limit on the receipt and on each notes value.
pub const PROVIDER_FIELD_LIMIT: usize = 40;

/// Statuses the provider reports for a payment that went through.
pub const COMPLETED_PAYMENT_STATUSES: [&str; 2] = ["captured", "authorized"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotes {
    pub event_id: String,
    pub student_id: String,
    pub event_name: String,
}

impl OrderNotes {
    /// Whether these notes were written for the (event, student) pair.
    pub fn names_pair(&self, event_id: &RecordId, student_id: &RecordId) -> bool {
        self.event_id == truncate(event_id.as_str(), PROVIDER_FIELD_LIMIT)
            && self.student_id == truncate(student_id.as_str(), PROVIDER_FIELD_LIMIT)
    }
}

/// Body of an order-creation request to the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

impl OrderRequest {
    pub fn new(event: &Event, student_id: &RecordId, amount: i64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
            receipt: receipt_for(&event.id, student_id),
            notes: OrderNotes {
                event_id: truncate(event.id.as_str(), PROVIDER_FIELD_LIMIT).to_string(),
                student_id: truncate(student_id.as_str(), PROVIDER_FIELD_LIMIT).to_string(),
                event_name: shorten_name(&event.name),
            },
        }
    }
}

/// Order as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: Option<OrderNotes>,
}

/// Payment as returned by the provider's status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayment {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub order_id: Option<String>,
    /// Minor units actually charged.
    pub amount: i64,
    pub currency: String,
}

/// The provider sends `[]` for an order without notes.
fn lenient_notes<'de, D>(deserializer: D) -> Result<Option<OrderNotes>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl ProviderPayment {
    pub fn is_completed(&self) -> bool {
        COMPLETED_PAYMENT_STATUSES.contains(&self.status.as_str())
    }
}

/// What the client needs to open the provider's checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTicket {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

/// Outcome of order initiation: free events register immediately.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OrderResult {
    Registered { registration: Registration },
    PaymentRequired { order: OrderTicket },
}

/// `evt_{event tail}_{student tail}`, bounded to the provider limit.
pub fn receipt_for(event_id: &RecordId, student_id: &RecordId) -> String {
    let receipt = format!("evt_{}_{}", event_id.tail(8), student_id.tail(8));
    truncate(&receipt, PROVIDER_FIELD_LIMIT).to_string()
}

fn shorten_name(name: &str) -> String {
    if name.chars().count() > PROVIDER_FIELD_LIMIT {
        format!("{}...", truncate(name, PROVIDER_FIELD_LIMIT - 3))
    } else {
        name.to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
