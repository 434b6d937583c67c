use crate::domain::event::Event;
use crate::domain::ports::Notification;
use crate::domain::registration::{PaymentStatus, Registration};
use crate::domain::student::Student;
use std::fmt::Write;

/// Confirmation message sent once a registration is persisted.
pub fn confirmation(
    event: &Event,
    student: &Student,
    registration: &Registration,
    currency: &str,
) -> Notification {
    let mut body = String::new();
    // writing into a String cannot fail
    let _ = writeln!(body, "Dear {},", student.name);
    let _ = writeln!(
        body,
        "You have successfully registered for {}.",
        event.name
    );
    let _ = writeln!(body);
    let _ = writeln!(body, "Event: {}", event.name);
    let _ = writeln!(body, "Date: {}", event.date);
    let _ = writeln!(body, "Venue: {}", event.venue.as_deref().unwrap_or("TBA"));
    if registration.payment_status == PaymentStatus::Paid {
        let _ = writeln!(body, "Amount Paid: {} {}", currency, registration.amount_paid);
    } else {
        let _ = writeln!(body, "Fee: Free");
    }
    if let Some(link) = event.group_link.as_deref().filter(|l| !l.trim().is_empty()) {
        let _ = writeln!(body);
        let _ = writeln!(body, "Join the group chat: {}", link);
    }

    Notification {
        to: student.email.clone(),
        subject: format!("Registration Confirmed: {}", event.name),
        body,
    }
}
