//! Application layer orchestrating the domain through its ports.
//!
//! `SettlementService` owns the registration flow (order initiation, payment
//! verification, finalization); `RosterService` serves the organiser-side
//! operations on the resulting registrations.

pub mod import;
pub mod notice;
pub mod roster;
pub mod settlement;
