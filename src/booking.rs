use crate::{
    backend::{Assignment, SlotBackend},
    error::{Result, SchedulerError},
    requests::BookingRequest,
    types::Slot,
};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Conditional writes attempted per booking: the first choice plus one retry
/// against another candidate.
const MAX_ASSIGN_ATTEMPTS: usize = 2;

#[derive(Debug, Clone)]
pub struct BookingEngine<T: SlotBackend> {
    backend: T,
    require_identity: bool,
}

impl<T: SlotBackend> BookingEngine<T> {
    pub fn new(backend: T, require_identity: bool) -> Self {
        Self {
            backend,
            require_identity,
        }
    }

    /// Assigns the requested client to one available slot at the requested
    /// time. The assignment itself is a single conditional write; losing it to
    /// a concurrent request triggers exactly one retry on a different slot.
    pub fn book(&self, request: &BookingRequest) -> Result<Slot> {
        let booking = request.client_booking(self.require_identity)?;
        let time = request.slot_time();

        let matches = self.backend.find_by_time(&time)?;
        debug!(%time, matches = matches.len(), "Looked up slots for booking");
        if matches.is_empty() {
            warn!(%time, "No meetings at requested time");
            return Err(SchedulerError::NoSuchSlot);
        }

        let mut candidates: Vec<Slot> = matches.into_iter().filter(Slot::is_available).collect();
        if candidates.is_empty() {
            warn!(%time, "No available meetings at requested time");
            return Err(SchedulerError::SlotUnavailable);
        }

        if let Some(id_number) = booking.id_number.as_deref() {
            if self.backend.identity_booked(id_number)? {
                warn!(%time, "Id number already holds a meeting");
                return Err(SchedulerError::DuplicateIdentity);
            }
        }

        candidates.sort_unstable_by_key(|slot| slot.id);
        for candidate in candidates.iter().take(MAX_ASSIGN_ATTEMPTS) {
            match self
                .backend
                .assign_if_available(candidate.id, &booking, Utc::now())?
            {
                Assignment::Assigned(slot) => {
                    info!(
                        display_id = %slot.display_id,
                        representative = %slot.key.representative,
                        %time,
                        "Meeting booked"
                    );
                    return Ok(slot);
                }
                Assignment::AlreadyBooked => {
                    debug!(display_id = %candidate.display_id, "Slot was taken concurrently");
                }
            }
        }

        warn!(%time, "Lost every booking attempt to concurrent requests");
        Err(SchedulerError::SlotUnavailable)
    }
}
