use crate::domain::registration::Registration;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct RegistrationRow<'a> {
    name: &'a str,
    email: &'a str,
    mobile: &'a str,
    payment_status: &'static str,
    payment_id: &'a str,
    amount_paid: String,
    attendance: bool,
    registered_at: String,
}

impl<'a> From<&'a Registration> for RegistrationRow<'a> {
    fn from(r: &'a Registration) -> Self {
        Self {
            name: &r.student_name,
            email: &r.student_email,
            mobile: r.student_mobile.as_deref().unwrap_or_default(),
            payment_status: r.payment_status.as_str(),
            payment_id: r.payment_id.as_deref().unwrap_or_default(),
            amount_paid: r.amount_paid.to_string(),
            attendance: r.attendance,
            registered_at: r.registered_at.to_rfc3339(),
        }
    }
}

/// Writes registrations as CSV rows under a fixed header.
pub struct RegistrationWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RegistrationWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_registrations(&mut self, registrations: &[Registration]) -> Result<()> {
        if registrations.is_empty() {
            // serde only emits the header alongside the first row
            self.writer.write_record([
                "name",
                "email",
                "mobile",
                "payment_status",
                "payment_id",
                "amount_paid",
                "attendance",
                "registered_at",
            ])?;
        }
        for registration in registrations {
            self.writer.serialize(RegistrationRow::from(registration))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::Event;
    use crate::domain::id::RecordId;
    use crate::domain::money::Fee;
    use crate::domain::registration::Charge;
    use crate::domain::student::Student;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_paid_row() {
        let mut event = Event::new(RecordId::parse("evt1").unwrap(), "Hackathon", "2026-11-02");
        event.fee = Some(Fee::new(dec!(250.50)).unwrap());
        let mut student = Student::new(RecordId::parse("s1").unwrap(), "Asha, K", "asha@x.io");
        student.phone = Some("98765".into());
        let at = Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap();
        let reg = Registration::for_student(&event, &student, Some(Charge::at_fee(&event, "pay_9")), at);

        let mut out = Vec::new();
        RegistrationWriter::new(&mut out)
            .write_registrations(&[reg])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "name,email,mobile,payment_status,payment_id,amount_paid,attendance,registered_at"
        );
        assert_eq!(
            lines[1],
            "\"Asha, K\",asha@x.io,98765,paid,pay_9,250.50,false,2026-10-01T09:30:00+00:00"
        );
    }

    #[test]
    fn test_empty_export_still_has_header() {
        let mut out = Vec::new();
        RegistrationWriter::new(&mut out)
            .write_registrations(&[])
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim_end(),
            "name,email,mobile,payment_status,payment_id,amount_paid,attendance,registered_at"
        );
    }
}
