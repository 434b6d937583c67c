use crate::domain::event::Event;
use crate::domain::id::RecordId;
use crate::domain::money::Fee;
use crate::domain::student::Student;
use crate::error::{Result, SettlementError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::marker::PhantomData;
use std::str::FromStr;

/// One row of an events import file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub date: String,
    pub venue: Option<String>,
    pub teacher_id: Option<String>,
    pub capacity: Option<u32>,
    /// Decimal in major units; kept as text so no float parsing is involved.
    pub fee: Option<String>,
    /// RFC 3339 instant.
    pub registration_deadline: Option<String>,
    pub group_link: Option<String>,
}

/// One row of a students import file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<EventRecord> for Event {
    type Error = SettlementError;

    fn try_from(record: EventRecord) -> Result<Self> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(SettlementError::ValidationError(
                "Event name is required".to_string(),
            ));
        }
        let mut event = Event::new(RecordId::parse(&record.id)?, name, record.date.trim());
        event.venue = non_blank(record.venue);
        event.teacher_id = non_blank(record.teacher_id)
            .map(|id| RecordId::parse(&id))
            .transpose()?;
        event.capacity = record.capacity;
        event.fee = non_blank(record.fee)
            .map(|raw| {
                Decimal::from_str(&raw)
                    .map_err(|e| {
                        SettlementError::ValidationError(format!("Invalid fee {:?}: {}", raw, e))
                    })
                    .and_then(Fee::new)
            })
            .transpose()?;
        event.registration_deadline = non_blank(record.registration_deadline)
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        SettlementError::ValidationError(format!(
                            "Invalid registration deadline {:?}: {}",
                            raw, e
                        ))
                    })
            })
            .transpose()?;
        event.group_link = non_blank(record.group_link);
        Ok(event)
    }
}

impl TryFrom<StudentRecord> for Student {
    type Error = SettlementError;

    fn try_from(record: StudentRecord) -> Result<Self> {
        let email = record.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(SettlementError::ValidationError(format!(
                "Invalid email: {:?}",
                record.email
            )));
        }
        let mut student = Student::new(RecordId::parse(&record.id)?, record.name.trim(), email);
        student.phone = non_blank(record.phone);
        Ok(student)
    }
}

/// Streams typed rows out of a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths;
/// a malformed row yields an error item and the stream carries on.
pub struct RecordReader<R: Read, T> {
    reader: csv::Reader<R>,
    _record: PhantomData<T>,
}

impl<R: Read, T: DeserializeOwned> RecordReader<R, T> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self {
            reader,
            _record: PhantomData,
        }
    }

    /// Lazily deserializes the rows.
    pub fn records(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(SettlementError::from))
    }
}
