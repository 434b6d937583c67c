//! Boundary adapters: CSV files in and out, tagged replies for callers.

pub mod csv;
pub mod reply;
