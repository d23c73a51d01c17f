//! # meeting_scheduler
//!
//! Turns representative availability windows into fixed-length meeting slots
//! and books them for clients, one booking per slot and per id number.
//!
//! - [`partitioner`] splits windows into slot keys
//! - [`backend`] is the storage seam, implemented by [`local_slots`] and
//!   [`database_interface`]
//! - [`booking`] and [`cancellation`] move slots between available and booked
//! - [`scheduler`] ties them together for callers

pub mod backend;
pub mod booking;
pub mod cancellation;
pub mod configuration;
pub mod configuration_handler;
pub mod database_interface;
pub mod error;
pub mod local_slots;
pub mod partitioner;
pub mod requests;
pub mod scheduler;
mod schema;
#[cfg(test)]
mod testutils;
pub mod types;

pub use error::{ErrorKind, SchedulerError};
pub use scheduler::{BatchReport, Scheduler};
