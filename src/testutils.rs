use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    backend::{Assignment, SlotBackend, StoreError},
    configuration::{Configuration, DEFAULT_INTERVAL_MINUTES},
    local_slots::LocalSlots,
    requests::BookingRequest,
    scheduler::new_display_id,
    types::{ClientBooking, Slot, SlotTime, TemporalKey},
};

pub struct MockSlotBackendInner {
    pub available: AtomicBool,
    /// Upcoming conditional writes that report a concurrent winner.
    pub lost_assignments: AtomicU64,
    pub fail_assignment_with: Mutex<Option<StoreError>>,
    pub calls_to_insert: AtomicU64,
    pub calls_to_find_by_time: AtomicU64,
    pub calls_to_assign_if_available: AtomicU64,
    pub calls_to_release: AtomicU64,
    pub slots: LocalSlots,
}

#[derive(Clone)]
pub struct MockSlotBackend(pub Arc<MockSlotBackendInner>);

impl MockSlotBackendInner {
    fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            lost_assignments: AtomicU64::default(),
            fail_assignment_with: Mutex::default(),
            calls_to_insert: AtomicU64::default(),
            calls_to_find_by_time: AtomicU64::default(),
            calls_to_assign_if_available: AtomicU64::default(),
            calls_to_release: AtomicU64::default(),
            slots: LocalSlots::default(),
        }
    }
}

impl MockSlotBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockSlotBackendInner::new()))
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match self.0.available.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(StoreError::Unavailable("Supposed to fail".into())),
        }
    }

    fn take_lost_assignment(&self) -> bool {
        self.0
            .lost_assignments
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl SlotBackend for MockSlotBackend {
    fn insert(&self, slot: Slot) -> Result<(), StoreError> {
        self.0.calls_to_insert.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.0.slots.insert(slot)
    }

    fn all(&self) -> Result<Vec<Slot>, StoreError> {
        self.check_available()?;
        self.0.slots.all()
    }

    fn find_by_time(&self, time: &SlotTime) -> Result<Vec<Slot>, StoreError> {
        self.0.calls_to_find_by_time.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.0.slots.find_by_time(time)
    }

    fn find_by_display_id(&self, display_id: &str) -> Result<Option<Slot>, StoreError> {
        self.check_available()?;
        self.0.slots.find_by_display_id(display_id)
    }

    fn identity_booked(&self, id_number: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        self.0.slots.identity_booked(id_number)
    }

    fn assign_if_available(
        &self,
        slot_id: Uuid,
        booking: &ClientBooking,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        self.0
            .calls_to_assign_if_available
            .fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if let Some(err) = self.0.fail_assignment_with.lock().unwrap().take() {
            return Err(err);
        }
        if self.take_lost_assignment() {
            return Ok(Assignment::AlreadyBooked);
        }
        self.0.slots.assign_if_available(slot_id, booking, now)
    }

    fn release(&self, display_id: &str, now: DateTime<Utc>) -> Result<Option<Slot>, StoreError> {
        self.0.calls_to_release.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.0.slots.release(display_id, now)
    }
}

#[derive(Debug, Clone)]
pub struct TestConfiguration {
    pub interval_minutes: u32,
    pub require_identity: bool,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            require_identity: true,
        }
    }
}

impl Configuration for TestConfiguration {
    fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    fn require_identity(&self) -> bool {
        self.require_identity
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn store_file(&self) -> Option<std::path::PathBuf> {
        None
    }
}

/// Inserts a ten minute slot on 05/06/2024 starting at `start_minute`.
pub fn insert_slot<T: SlotBackend>(backend: &T, start_minute: u32, representative: &str) -> Slot {
    let key = TemporalKey {
        time: SlotTime {
            year: 2024,
            month: 6,
            day: 5,
            start_minute,
            end_minute: start_minute + 10,
        },
        representative: representative.into(),
    };
    let slot = Slot::new(key, new_display_id(), Utc::now());
    backend.insert(slot.clone()).unwrap();
    slot
}

/// Complete booking request for the ten minute slot starting at `start_minute`.
pub fn booking_request(start_minute: u32, id_number: &str) -> BookingRequest {
    BookingRequest {
        name: "Dana".into(),
        email: "dana@example.com".into(),
        phone: "0501234567".into(),
        school: Some("Herzl".into()),
        id_number: Some(id_number.into()),
        preferred_day: None,
        day: 5,
        month: 6,
        year: 2024,
        start_time: start_minute,
        end_time: start_minute + 10,
    }
}
