//! CSV import of events and students, CSV export of registrations.

pub mod record_reader;
pub mod registration_writer;
