use super::event::Event;
use super::id::RecordId;
use super::student::Student;
use crate::error::SettlementError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Free,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Free => "free",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "free" => Ok(Self::Free),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(SettlementError::ValidationError(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

/// A payment the provider confirmed, with what it actually charged.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub payment_id: String,
    /// Major currency units.
    pub amount: Decimal,
}

impl Charge {
    /// Converts the provider's minor units (paise for INR).
    pub fn from_minor_units(payment_id: impl Into<String>, minor_units: i64) -> Self {
        Self {
            payment_id: payment_id.into(),
            amount: Decimal::new(minor_units, 2),
        }
    }

    /// A charge for the event's current fee.
    pub fn at_fee(event: &Event, payment_id: impl Into<String>) -> Self {
        Self {
            payment_id: payment_id.into(),
            amount: event.fee().value(),
        }
    }
}

/// A student's (or guest's) enrolment in one event.
///
/// Contact fields are copied from the student when the registration is
/// finalized so later profile edits leave historical records untouched.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Registration {
    pub id: RecordId,
    pub event_id: RecordId,
    pub student_id: Option<RecordId>,
    pub student_name: String,
    pub student_email: String,
    pub student_mobile: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    /// What was actually charged for this registration.
    pub amount_paid: Decimal,
    pub attendance: bool,
    pub notes: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// Builds the record finalization persists for `student` in `event`.
    /// Contact fields are copied as the student record holds them.
    pub fn for_student(
        event: &Event,
        student: &Student,
        charge: Option<Charge>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        let (payment_status, payment_id, amount_paid) = match charge {
            Some(charge) => (PaymentStatus::Paid, Some(charge.payment_id), charge.amount),
            None => (PaymentStatus::Free, None, Decimal::ZERO),
        };
        Self {
            id: RecordId::generate(),
            event_id: event.id.clone(),
            student_id: Some(student.id.clone()),
            student_name: student.name.clone(),
            student_email: student.email.clone(),
            student_mobile: student.phone.clone(),
            payment_status,
            payment_id,
            amount_paid,
            attendance: false,
            notes: None,
            registered_at,
        }
    }

    /// Non-cancelled registrations count toward capacity and uniqueness.
    pub fn is_active(&self) -> bool {
        self.payment_status != PaymentStatus::Cancelled
    }

    pub fn belongs_to(&self, event_id: &RecordId, student_id: &RecordId) -> bool {
        &self.event_id == event_id && self.student_id.as_ref() == Some(student_id)
    }
}

/// Event details listed next to a student's own registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub id: RecordId,
    pub name: String,
    pub date: String,
    pub venue: Option<String>,
    pub group_link: Option<String>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            name: event.name.clone(),
            date: event.date.clone(),
            venue: event.venue.clone(),
            group_link: event.group_link.clone(),
        }
    }
}

/// A registration as its student sees it. `event` is `None` once the event
/// itself is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRegistration {
    #[serde(flatten)]
    pub registration: Registration,
    pub event: Option<EventSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Fee;
    use rust_decimal_macros::dec;

    fn fixtures() -> (Event, Student) {
        let mut event = Event::new(RecordId::parse("evt1").unwrap(), "Hackathon", "2026-11-02");
        event.fee = Some(Fee::new(dec!(500.00)).unwrap());
        let mut student = Student::new(
            RecordId::parse("stu1").unwrap(),
            "Asha",
            "asha@example.com",
        );
        student.phone = Some("9876543210".to_string());
        (event, student)
    }

    #[test]
    fn test_paid_registration_captures_fee_and_contact() {
        let (event, student) = fixtures();
        let charge = Charge::at_fee(&event, "pay_1");
        let reg = Registration::for_student(&event, &student, Some(charge), Utc::now());
        assert_eq!(reg.payment_status, PaymentStatus::Paid);
        assert_eq!(reg.payment_id.as_deref(), Some("pay_1"));
        assert_eq!(reg.amount_paid, dec!(500.00));
        assert_eq!(reg.student_email, student.email);
        assert_eq!(reg.student_mobile.as_deref(), Some("9876543210"));
        assert!(reg.belongs_to(&event.id, &student.id));
        assert!(!reg.attendance);
    }

    #[test]
    fn test_charged_amount_wins_over_current_fee() {
        let (event, student) = fixtures();
        let charge = Charge::from_minor_units("pay_1", 45050);
        let reg = Registration::for_student(&event, &student, Some(charge), Utc::now());
        assert_eq!(reg.amount_paid, dec!(450.50));
        assert_eq!(reg.amount_paid.to_string(), "450.50");
    }

    #[test]
    fn test_contact_copied_verbatim() {
        let (event, mut student) = fixtures();
        student.email = "Asha.K@Example.com".to_string();
        let reg = Registration::for_student(&event, &student, None, Utc::now());
        assert_eq!(reg.student_email, "Asha.K@Example.com");
    }

    #[test]
    fn test_free_registration_without_payment() {
        let (event, student) = fixtures();
        let reg = Registration::for_student(&event, &student, None, Utc::now());
        assert_eq!(reg.payment_status, PaymentStatus::Free);
        assert_eq!(reg.amount_paid, Decimal::ZERO);
        assert!(reg.payment_id.is_none());
    }

    #[test]
    fn test_cancelled_is_inactive() {
        let (event, student) = fixtures();
        let mut reg = Registration::for_student(&event, &student, None, Utc::now());
        assert!(reg.is_active());
        reg.payment_status = PaymentStatus::Cancelled;
        assert!(!reg.is_active());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("PAID".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }
}
