use crate::{
    backend::{Assignment, SlotBackend, StoreError},
    types::{ClientBooking, Slot, SlotTime},
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};
use uuid::Uuid;

type SlotMap = HashMap<Uuid, Slot>;

/// In-process slot store. Each operation holds the lock for its whole
/// check-and-write, which makes every conditional write atomic.
///
/// With a snapshot path, the full slot list is written to that JSON file after
/// every mutation and a mutation is only applied once its snapshot is on disk.
/// The snapshot is owned by a single process.
#[derive(Debug, Clone, Default)]
pub struct LocalSlots {
    slots: Arc<Mutex<SlotMap>>,
    snapshot: Option<PathBuf>,
}

impl LocalSlots {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let slots = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|err| {
                error!(?err, path = %path.display(), "Failed to read slot snapshot");
                StoreError::Unavailable(format!("failed to read {}: {err}", path.display()))
            })?;
            let slots: Vec<Slot> = serde_json::from_str(&contents).map_err(|err| {
                error!(?err, path = %path.display(), "Slot snapshot is corrupt");
                StoreError::Unavailable(format!("failed to parse {}: {err}", path.display()))
            })?;
            slots.into_iter().map(|slot| (slot.id, slot)).collect()
        } else {
            SlotMap::new()
        };
        info!(path = %path.display(), slots = slots.len(), "Opened slot snapshot");

        Ok(Self {
            slots: Arc::new(Mutex::new(slots)),
            snapshot: Some(path),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SlotMap>, StoreError> {
        self.slots
            .lock()
            .map_err(|_| StoreError::Unavailable("slot store lock poisoned".into()))
    }

    /// Runs `change` under the lock and commits it only if the snapshot, when
    /// configured, was written.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut SlotMap) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut slots = self.lock()?;
        match &self.snapshot {
            None => change(&mut *slots),
            Some(path) => {
                let mut next = slots.clone();
                let result = change(&mut next)?;
                write_snapshot(path, &next)?;
                *slots = next;
                Ok(result)
            }
        }
    }
}

fn write_snapshot(path: &Path, slots: &SlotMap) -> Result<(), StoreError> {
    let mut ordered: Vec<&Slot> = slots.values().collect();
    ordered.sort_unstable_by_key(|slot| slot.id);

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let result = (|| -> std::io::Result<()> {
        let mut file = NamedTempFile::new_in(directory)?;
        serde_json::to_writer_pretty(&mut file, &ordered)?;
        file.flush()?;
        file.persist(path).map_err(|err| err.error)?;
        Ok(())
    })();

    result.map_err(|err| {
        error!(?err, path = %path.display(), "Failed to write slot snapshot");
        StoreError::Unavailable(format!("failed to write {}: {err}", path.display()))
    })
}

impl SlotBackend for LocalSlots {
    fn insert(&self, slot: Slot) -> Result<(), StoreError> {
        self.mutate(|slots| {
            if let Some(existing) = slots.values().find(|existing| existing.key == slot.key) {
                debug!(display_id = %existing.display_id, "Temporal key already taken");
                return Err(StoreError::DuplicateSlot(slot.key));
            }
            if slots
                .values()
                .any(|existing| existing.display_id == slot.display_id)
            {
                return Err(StoreError::DisplayIdTaken(slot.display_id));
            }
            slots.insert(slot.id, slot);
            Ok(())
        })
    }

    fn all(&self) -> Result<Vec<Slot>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn find_by_time(&self, time: &SlotTime) -> Result<Vec<Slot>, StoreError> {
        Ok(self
            .lock()?
            .values()
            .filter(|slot| slot.time() == time)
            .cloned()
            .collect())
    }

    fn find_by_display_id(&self, display_id: &str) -> Result<Option<Slot>, StoreError> {
        Ok(self
            .lock()?
            .values()
            .find(|slot| slot.display_id == display_id)
            .cloned())
    }

    fn identity_booked(&self, id_number: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .values()
            .any(|slot| slot.holds_identity(id_number)))
    }

    fn assign_if_available(
        &self,
        slot_id: Uuid,
        booking: &ClientBooking,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        self.mutate(|slots| {
            if let Some(id_number) = booking.id_number.as_deref() {
                if slots.values().any(|slot| slot.holds_identity(id_number)) {
                    return Err(StoreError::DuplicateIdentity);
                }
            }
            let Some(slot) = slots.get_mut(&slot_id) else {
                return Ok(Assignment::AlreadyBooked);
            };
            if slot.is_booked() {
                return Ok(Assignment::AlreadyBooked);
            }
            slot.booking = Some(booking.clone());
            slot.updated_at = now;
            Ok(Assignment::Assigned(slot.clone()))
        })
    }

    fn release(&self, display_id: &str, now: DateTime<Utc>) -> Result<Option<Slot>, StoreError> {
        self.mutate(|slots| {
            let Some(slot) = slots
                .values_mut()
                .find(|slot| slot.display_id == display_id)
            else {
                return Ok(None);
            };
            if slot.is_booked() {
                slot.booking = None;
                slot.updated_at = now;
            }
            Ok(Some(slot.clone()))
        })
    }
}
