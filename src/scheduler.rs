//! Entry point for callers: wires the configured backend to partitioning,
//! booking and cancellation, and serves the display-ordered read views.

use crate::{
    backend::{SlotBackend, StoreError},
    booking::BookingEngine,
    cancellation::CancellationEngine,
    configuration::Configuration,
    error::{Result, SchedulerError},
    partitioner::partition,
    requests::BookingRequest,
    types::{AvailabilityWindow, Slot, SlotView, TemporalKey},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub const DISPLAY_ID_LENGTH: usize = 8;

const DISPLAY_ID_ALPHABET: &[char; 62] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b',
    'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z',
];

/// Fresh display ids tried per slot before a collision becomes an error.
const DISPLAY_ID_ATTEMPTS: usize = 3;

pub fn new_display_id() -> String {
    nanoid::nanoid!(DISPLAY_ID_LENGTH, DISPLAY_ID_ALPHABET)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedWindow {
    /// Position of the window in the submitted batch.
    pub index: usize,
    pub reason: String,
}

/// Outcome of a batch submission. Malformed windows and already existing slots
/// are both skipped and reported; neither stops the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub created: Vec<Slot>,
    pub rejected_windows: Vec<RejectedWindow>,
    pub duplicates: Vec<String>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.rejected_windows.is_empty() && self.duplicates.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<T: SlotBackend, C: Configuration> {
    backend: T,
    configuration: C,
    booking: BookingEngine<T>,
    cancellation: CancellationEngine<T>,
}

impl<T: SlotBackend, C: Configuration> Scheduler<T, C> {
    pub fn new(backend: T, configuration: C) -> Self {
        Self {
            booking: BookingEngine::new(backend.clone(), configuration.require_identity()),
            cancellation: CancellationEngine::new(backend.clone()),
            backend,
            configuration,
        }
    }

    /// Partitions every window and inserts the generated slots. Only a storage
    /// failure aborts; slots inserted before it stay in place.
    pub fn submit_availability(&self, windows: &[AvailabilityWindow]) -> Result<BatchReport> {
        let interval = self.configuration.interval_minutes();
        let mut report = BatchReport::default();

        for (index, window) in windows.iter().enumerate() {
            let keys = match partition(window, interval) {
                Ok(keys) => keys,
                Err(err) => {
                    warn!(index, ?window, %err, "Skipping malformed availability window");
                    report.rejected_windows.push(RejectedWindow {
                        index,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            for key in keys {
                match self.insert_with_fresh_display_id(key) {
                    Ok(slot) => report.created.push(slot),
                    Err(err @ SchedulerError::DuplicateSlot(_)) => {
                        warn!(index, %err, "Skipping existing meeting");
                        report.duplicates.push(err.to_string());
                    }
                    Err(err) => {
                        error!(?err, index, "Availability submission aborted");
                        return Err(err);
                    }
                }
            }
        }

        info!(
            created = report.created.len(),
            rejected_windows = report.rejected_windows.len(),
            duplicates = report.duplicates.len(),
            "Availability submitted"
        );
        Ok(report)
    }

    fn insert_with_fresh_display_id(&self, key: TemporalKey) -> Result<Slot> {
        let mut last_err = None;
        for _ in 0..DISPLAY_ID_ATTEMPTS {
            let slot = Slot::new(key.clone(), new_display_id(), Utc::now());
            match self.backend.insert(slot.clone()) {
                Ok(()) => return Ok(slot),
                Err(StoreError::DisplayIdTaken(display_id)) => {
                    warn!(%display_id, "Display id collision, regenerating");
                    last_err = Some(StoreError::DisplayIdTaken(display_id));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(last_err
            .map(SchedulerError::from)
            .unwrap_or_else(|| SchedulerError::Internal("no display id attempts made".into())))
    }

    pub fn book(&self, request: &BookingRequest) -> Result<Slot> {
        self.booking.book(request)
    }

    pub fn cancel(&self, display_id: &str) -> Result<Slot> {
        self.cancellation.cancel(display_id)
    }

    pub fn slot(&self, display_id: &str) -> Result<Slot> {
        self.backend
            .find_by_display_id(display_id)?
            .ok_or(SchedulerError::NoSuchSlot)
    }

    /// Slots of the given view ordered by date, start, end and representative.
    pub fn slots(&self, view: SlotView) -> Result<Vec<Slot>> {
        let mut slots = match view {
            SlotView::All => self.backend.all()?,
            SlotView::Available => self.backend.find_available()?,
            SlotView::Booked => self.backend.find_booked()?,
        };
        slots.sort_by(|a, b| a.display_order().cmp(&b.display_order()));
        Ok(slots)
    }
}
