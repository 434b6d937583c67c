use super::event::Event;
use super::money::Collected;
use super::registration::{PaymentStatus, Registration};
use serde::Serialize;

/// Per-event registration summary.
///
/// `total` and the capacity figures count non-cancelled registrations only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStats {
    pub total: usize,
    pub attended: usize,
    pub not_attended: usize,
    pub paid: usize,
    pub pending: usize,
    pub free: usize,
    pub cancelled: usize,
    /// Sum of what each paid registration was actually charged.
    pub total_collected: Collected,
    pub capacity: Option<u32>,
    pub capacity_used: Option<usize>,
    pub capacity_remaining: Option<usize>,
}

impl RegistrationStats {
    pub fn compute(event: &Event, registrations: &[Registration]) -> Self {
        let mut stats = Self {
            total: 0,
            attended: 0,
            not_attended: 0,
            paid: 0,
            pending: 0,
            free: 0,
            cancelled: 0,
            total_collected: Collected::ZERO,
            capacity: event.capacity,
            capacity_used: None,
            capacity_remaining: None,
        };

        for registration in registrations.iter().filter(|r| r.event_id == event.id) {
            match registration.payment_status {
                PaymentStatus::Cancelled => {
                    stats.cancelled += 1;
                    continue;
                }
                PaymentStatus::Paid => {
                    stats.paid += 1;
                    stats.total_collected += Collected(registration.amount_paid);
                }
                PaymentStatus::Pending => stats.pending += 1,
                PaymentStatus::Free => stats.free += 1,
            }
            stats.total += 1;
            if registration.attendance {
                stats.attended += 1;
            }
        }

        stats.not_attended = stats.total - stats.attended;
        if let Some(capacity) = event.capacity {
            stats.capacity_used = Some(stats.total);
            stats.capacity_remaining = Some((capacity as usize).saturating_sub(stats.total));
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::RecordId;
    use crate::domain::money::Fee;
    use crate::domain::registration::Charge;
    use crate::domain::student::Student;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_collected_uses_amount_actually_paid() {
        let mut event = Event::new(RecordId::parse("evt1").unwrap(), "Hackathon", "2026-11-02");
        event.capacity = Some(10);
        event.fee = Some(Fee::new(dec!(500)).unwrap());

        let s1 = Student::new(RecordId::parse("s1").unwrap(), "A", "a@x.io");
        let s2 = Student::new(RecordId::parse("s2").unwrap(), "B", "b@x.io");
        let s3 = Student::new(RecordId::parse("s3").unwrap(), "C", "c@x.io");
        let s4 = Student::new(RecordId::parse("s4").unwrap(), "D", "d@x.io");

        let paid = |event: &Event, student: &Student, payment: &str| {
            Registration::for_student(event, student, Some(Charge::at_fee(event, payment)), Utc::now())
        };
        let mut first = paid(&event, &s1, "pay_1");
        first.attendance = true;
        // fee raised after the first payment
        event.fee = Some(Fee::new(dec!(750)).unwrap());
        let second = paid(&event, &s2, "pay_2");
        let mut cancelled = paid(&event, &s3, "pay_3");
        cancelled.payment_status = PaymentStatus::Cancelled;
        let mut pending = Registration::for_student(&event, &s4, None, Utc::now());
        pending.payment_status = PaymentStatus::Pending;

        let stats = RegistrationStats::compute(&event, &[first, second, cancelled, pending]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.paid, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.free, 0);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.attended, 1);
        assert_eq!(stats.not_attended, 2);
        assert_eq!(stats.total_collected, Collected(dec!(1250)));
        assert_eq!(stats.capacity_used, Some(3));
        assert_eq!(stats.capacity_remaining, Some(7));
    }

    #[test]
    fn test_uncapped_event_has_no_capacity_figures() {
        let event = Event::new(RecordId::parse("evt1").unwrap(), "Talk", "2026-11-02");
        let stats = RegistrationStats::compute(&event, &[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.capacity, None);
        assert_eq!(stats.capacity_used, None);
        assert_eq!(stats.capacity_remaining, None);
        assert_eq!(stats.total_collected, Collected::ZERO);
    }
}
