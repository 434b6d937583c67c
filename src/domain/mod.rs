//! Domain types and the ports the application layer talks through.

pub mod claims;
pub mod event;
pub mod id;
pub mod money;
pub mod order;
pub mod ports;
pub mod registration;
pub mod signature;
pub mod stats;
pub mod student;
