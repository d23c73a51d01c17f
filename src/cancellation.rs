use crate::{
    backend::SlotBackend,
    error::{Result, SchedulerError},
    types::Slot,
};
use chrono::Utc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CancellationEngine<T: SlotBackend> {
    backend: T,
}

impl<T: SlotBackend> CancellationEngine<T> {
    pub fn new(backend: T) -> Self {
        Self { backend }
    }

    /// Returns the slot to the pool. Cancelling an available slot is a no-op.
    /// Authorization is the caller's concern.
    pub fn cancel(&self, display_id: &str) -> Result<Slot> {
        if display_id.trim().is_empty() {
            return Err(SchedulerError::Validation("display id is required".into()));
        }

        match self.backend.release(display_id, Utc::now())? {
            Some(slot) => {
                info!(display_id, time = %slot.time(), "Meeting cancelled");
                Ok(slot)
            }
            None => {
                warn!(display_id, "Cancellation for unknown meeting");
                Err(SchedulerError::NoSuchSlot)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        booking::BookingEngine,
        local_slots::LocalSlots,
        testutils::{booking_request, insert_slot, MockSlotBackend},
    };
    use std::sync::atomic::Ordering;

    #[test]
    fn test_unknown_display_id() {
        let engine = CancellationEngine::new(LocalSlots::default());
        assert_eq!(
            engine.cancel("abc12345").unwrap_err(),
            SchedulerError::NoSuchSlot
        );
    }

    #[test]
    fn test_empty_display_id_never_reaches_store() {
        let mock_backend = MockSlotBackend::new();
        let engine = CancellationEngine::new(mock_backend.clone());

        let err = engine.cancel("  ").unwrap_err();
        assert!(matches!(err, SchedulerError::Validation(_)));
        assert_eq!(mock_backend.0.calls_to_release.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_twice_after_booking() {
        let local_slots = LocalSlots::default();
        let slot = insert_slot(&local_slots, 540, "alice");
        BookingEngine::new(local_slots.clone(), true)
            .book(&booking_request(540, "123"))
            .unwrap();
        let engine = CancellationEngine::new(local_slots.clone());

        let first = engine.cancel(&slot.display_id).unwrap();
        let second = engine.cancel(&slot.display_id).unwrap();
        assert!(first.is_available());
        assert_eq!(first, second);
        assert!(!local_slots.identity_booked("123").unwrap());
    }

    #[test]
    fn test_book_then_cancel_restores_slot() {
        let local_slots = LocalSlots::default();
        let before = insert_slot(&local_slots, 540, "alice");
        BookingEngine::new(local_slots.clone(), true)
            .book(&booking_request(540, "123"))
            .unwrap();

        let mut after = CancellationEngine::new(local_slots)
            .cancel(&before.display_id)
            .unwrap();
        assert!(after.updated_at >= before.updated_at);
        after.updated_at = before.updated_at;
        assert_eq!(after, before);
    }

    #[test]
    fn test_cancelled_slot_can_be_booked_again() {
        let local_slots = LocalSlots::default();
        let slot = insert_slot(&local_slots, 540, "alice");
        let booking_engine = BookingEngine::new(local_slots.clone(), true);
        let cancellation_engine = CancellationEngine::new(local_slots);

        for round in 0..3 {
            let id_number = format!("id-{round}");
            booking_engine.book(&booking_request(540, &id_number)).unwrap();
            cancellation_engine.cancel(&slot.display_id).unwrap();
        }
        booking_engine.book(&booking_request(540, "id-0")).unwrap();
    }

    #[test]
    fn test_storage_failure_is_internal() {
        let mock_backend = MockSlotBackend::new();
        mock_backend.0.available.store(false, Ordering::SeqCst);
        let engine = CancellationEngine::new(mock_backend);

        let err = engine.cancel("abc12345").unwrap_err();
        assert!(matches!(err, SchedulerError::Internal(_)));
    }
}
