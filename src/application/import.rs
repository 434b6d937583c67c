use crate::domain::event::Event;
use crate::domain::ports::Stores;
use crate::domain::student::Student;
use crate::error::Result;
use crate::interfaces::csv::record_reader::{EventRecord, RecordReader, StudentRecord};
use serde::Serialize;
use std::io::Read;
use tracing::warn;

/// Rows stored and rows rejected by an import.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected: Vec<String>,
}

/// Upserts events from CSV. Re-importing an event keeps the registrations
/// already linked to it.
pub async fn import_events<R: Read>(stores: &Stores, source: R) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for (row, record) in RecordReader::<_, EventRecord>::new(source).records().enumerate() {
        let mut event = match record.and_then(Event::try_from) {
            Ok(event) => event,
            Err(e) => {
                warn!(row = row + 1, error = %e, "Error reading event");
                summary.rejected.push(format!("row {}: {}", row + 1, e));
                continue;
            }
        };
        if let Some(existing) = stores.events.get(&event.id).await? {
            event.registrations = existing.registrations;
        }
        stores.events.store(event).await?;
        summary.imported += 1;
    }
    Ok(summary)
}

/// Upserts students from CSV, keeping their recorded event names.
pub async fn import_students<R: Read>(stores: &Stores, source: R) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for (row, record) in RecordReader::<_, StudentRecord>::new(source)
        .records()
        .enumerate()
    {
        let mut student = match record.and_then(Student::try_from) {
            Ok(student) => student,
            Err(e) => {
                warn!(row = row + 1, error = %e, "Error reading student");
                summary.rejected.push(format!("row {}: {}", row + 1, e));
                continue;
            }
        };
        if let Some(existing) = stores.students.get(&student.id).await? {
            student.event_names = existing.event_names;
        }
        stores.students.store(student).await?;
        summary.imported += 1;
    }
    Ok(summary)
}
