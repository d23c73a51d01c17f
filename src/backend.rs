use crate::types::{ClientBooking, Slot, SlotTime, TemporalKey};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("slot {} for {} already exists", .0.time, .0.representative)]
    DuplicateSlot(TemporalKey),

    #[error("id number is already booked")]
    DuplicateIdentity,

    #[error("display id {0} already exists")]
    DisplayIdTaken(String),

    #[error("slot store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional booking write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Assigned(Slot),
    AlreadyBooked,
}

/// Slot storage. Every mutating call is a single atomic operation against the
/// store; callers never pair a read with a separate write.
pub trait SlotBackend: Clone + Send + Sync + 'static {
    fn insert(&self, slot: Slot) -> Result<(), StoreError>;
    fn all(&self) -> Result<Vec<Slot>, StoreError>;
    fn find_by_time(&self, time: &SlotTime) -> Result<Vec<Slot>, StoreError>;
    fn find_by_display_id(&self, display_id: &str) -> Result<Option<Slot>, StoreError>;
    fn identity_booked(&self, id_number: &str) -> Result<bool, StoreError>;

    /// Stores `booking` on the slot only if it currently holds none.
    fn assign_if_available(
        &self,
        slot_id: Uuid,
        booking: &ClientBooking,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError>;

    /// Clears the booking of a booked slot. An available slot is returned
    /// untouched; `None` means the display id is unknown.
    fn release(&self, display_id: &str, now: DateTime<Utc>) -> Result<Option<Slot>, StoreError>;

    fn find_available(&self) -> Result<Vec<Slot>, StoreError> {
        Ok(self.all()?.into_iter().filter(Slot::is_available).collect())
    }

    fn find_booked(&self) -> Result<Vec<Slot>, StoreError> {
        Ok(self.all()?.into_iter().filter(Slot::is_booked).collect())
    }
}
