use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const MINUTES_IN_HOUR: u32 = 60;

/// Position of a slot in the calendar, without the representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(rename = "start_time")]
    pub start_minute: u32,
    #[serde(rename = "end_time")]
    pub end_minute: u32,
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{} {:02}:{:02}-{:02}:{:02}",
            self.day,
            self.month,
            self.year,
            self.start_minute / MINUTES_IN_HOUR,
            self.start_minute % MINUTES_IN_HOUR,
            self.end_minute / MINUTES_IN_HOUR,
            self.end_minute % MINUTES_IN_HOUR,
        )
    }
}

/// Uniqueness key of a slot. No two slots share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemporalKey {
    #[serde(flatten)]
    pub time: SlotTime,
    pub representative: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBooking {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub school: Option<String>,
    pub id_number: Option<String>,
    pub preferred_day: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub display_id: String,
    #[serde(flatten)]
    pub key: TemporalKey,
    pub booking: Option<ClientBooking>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(key: TemporalKey, display_id: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_id,
            key,
            booking: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn time(&self) -> &SlotTime {
        &self.key.time
    }

    pub fn is_available(&self) -> bool {
        self.booking.is_none()
    }

    pub fn is_booked(&self) -> bool {
        self.booking.is_some()
    }

    pub fn holds_identity(&self, id_number: &str) -> bool {
        self.booking
            .as_ref()
            .and_then(|booking| booking.id_number.as_deref())
            == Some(id_number)
    }

    /// Ordering used by every read view.
    pub fn display_order(&self) -> (&SlotTime, &str) {
        (&self.key.time, &self.key.representative)
    }
}

/// Representative-submitted interval, split into slots by the partitioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    #[serde(rename = "start_time")]
    pub start_minute: u32,
    #[serde(rename = "end_time")]
    pub end_minute: u32,
    #[serde(default)]
    pub representative: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SlotView {
    #[default]
    All,
    Available,
    Booked,
}
