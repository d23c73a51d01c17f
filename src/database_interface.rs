use crate::{
    backend::{Assignment, SlotBackend, StoreError},
    schema::slots,
    types::{ClientBooking, Slot, SlotTime, TemporalKey},
};
use chrono::{DateTime, Utc};
use diesel::{
    connection::SimpleConnection,
    prelude::*,
    r2d2::{ConnectionManager, Pool, PooledConnection},
    result::{DatabaseErrorKind, Error as DieselError},
};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

const SCHEMA: &str = include_str!("../migrations/2024-06-01-000000_create_slots/up.sql");
const DISPLAY_ID_CONSTRAINT: &str = "slots_display_id_key";
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

type PgPool = Pool<ConnectionManager<PgConnection>>;
type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Queryable, Selectable)]
#[diesel(table_name = slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct SlotRecord {
    id: Uuid,
    display_id: String,
    day: i32,
    month: i32,
    year: i32,
    start_minute: i32,
    end_minute: i32,
    representative: String,
    client_name: Option<String>,
    client_email: Option<String>,
    client_phone: Option<String>,
    client_school: Option<String>,
    client_id_number: Option<String>,
    client_preferred_day: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = slots)]
struct NewSlotRecord<'a> {
    id: Uuid,
    display_id: &'a str,
    day: i32,
    month: i32,
    year: i32,
    start_minute: i32,
    end_minute: i32,
    representative: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Booking columns of a slot. All `None` clears the booking.
#[derive(AsChangeset)]
#[diesel(table_name = slots, treat_none_as_null = true)]
struct BookingChangeset<'a> {
    client_name: Option<&'a str>,
    client_email: Option<&'a str>,
    client_phone: Option<&'a str>,
    client_school: Option<&'a str>,
    client_id_number: Option<&'a str>,
    client_preferred_day: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

impl<'a> BookingChangeset<'a> {
    fn booked(booking: &'a ClientBooking, now: DateTime<Utc>) -> Self {
        Self {
            client_name: Some(&booking.name),
            client_email: Some(&booking.email),
            client_phone: Some(&booking.phone),
            client_school: booking.school.as_deref(),
            client_id_number: booking.id_number.as_deref(),
            client_preferred_day: booking.preferred_day.as_deref(),
            updated_at: now,
        }
    }

    fn released(now: DateTime<Utc>) -> Self {
        Self {
            client_name: None,
            client_email: None,
            client_phone: None,
            client_school: None,
            client_id_number: None,
            client_preferred_day: None,
            updated_at: now,
        }
    }
}

fn to_column(value: u32, name: &str) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::Unavailable(format!("{name} {value} does not fit the slot table")))
}

fn from_column(value: i32, name: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Unavailable(format!("stored {name} {value} is negative")))
}

impl TryFrom<SlotRecord> for Slot {
    type Error = StoreError;

    fn try_from(record: SlotRecord) -> Result<Self, Self::Error> {
        let booking = record.client_name.map(|name| ClientBooking {
            name,
            email: record.client_email.unwrap_or_default(),
            phone: record.client_phone.unwrap_or_default(),
            school: record.client_school,
            id_number: record.client_id_number,
            preferred_day: record.client_preferred_day,
        });

        Ok(Slot {
            id: record.id,
            display_id: record.display_id,
            key: TemporalKey {
                time: SlotTime {
                    year: record.year,
                    month: from_column(record.month, "month")?,
                    day: from_column(record.day, "day")?,
                    start_minute: from_column(record.start_minute, "start minute")?,
                    end_minute: from_column(record.end_minute, "end minute")?,
                },
                representative: record.representative,
            },
            booking,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn into_slots(records: Vec<SlotRecord>) -> Result<Vec<Slot>, StoreError> {
    records.into_iter().map(Slot::try_from).collect()
}

fn query_failed(err: DieselError, context: &str) -> StoreError {
    error!(?err, "{context}");
    StoreError::Unavailable(format!("{context}: {err}"))
}

/// PostgreSQL slot store. Uniqueness of temporal keys, display ids and id
/// numbers is enforced by table constraints, and bookings are conditional
/// `UPDATE`s, so concurrent processes can share one database.
#[derive(Clone)]
pub struct DatabaseInterface {
    pool: PgPool,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .map_err(|err| StoreError::Unavailable(format!("failed to connect: {err}")))?;

        let database_interface = Self { pool };
        database_interface.initialize()?;
        Ok(database_interface)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        self.connection()?
            .batch_execute(SCHEMA)
            .map_err(|err| query_failed(err, "Failed to create slot table"))?;
        info!("Slot table ready");
        Ok(())
    }

    fn connection(&self) -> Result<PgPooledConnection, StoreError> {
        self.pool.get().map_err(|err| {
            error!(?err, "No database connection available");
            StoreError::Unavailable(format!("no database connection available: {err}"))
        })
    }

    fn load_slots(&self, available: Option<bool>) -> Result<Vec<Slot>, StoreError> {
        let mut connection = self.connection()?;
        let mut query = slots::table.select(SlotRecord::as_select()).into_boxed();
        query = match available {
            Some(true) => query.filter(slots::client_name.is_null()),
            Some(false) => query.filter(slots::client_name.is_not_null()),
            None => query,
        };
        let records = query
            .load(&mut *connection)
            .map_err(|err| query_failed(err, "Failed to read slots from database"))?;
        into_slots(records)
    }

    /// Deletes every slot. Meant for resetting test databases.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut connection = self.connection()?;
        diesel::delete(slots::table)
            .execute(&mut *connection)
            .map_err(|err| query_failed(err, "Failed to clear database"))?;
        Ok(())
    }
}

impl SlotBackend for DatabaseInterface {
    fn insert(&self, slot: Slot) -> Result<(), StoreError> {
        let record = NewSlotRecord {
            id: slot.id,
            display_id: &slot.display_id,
            day: to_column(slot.key.time.day, "day")?,
            month: to_column(slot.key.time.month, "month")?,
            year: slot.key.time.year,
            start_minute: to_column(slot.key.time.start_minute, "start minute")?,
            end_minute: to_column(slot.key.time.end_minute, "end minute")?,
            representative: &slot.key.representative,
            created_at: slot.created_at,
            updated_at: slot.updated_at,
        };

        let mut connection = self.connection()?;
        let result = diesel::insert_into(slots::table)
            .values(&record)
            .execute(&mut *connection);

        match result {
            Ok(_) => Ok(()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                match info.constraint_name() {
                    Some(DISPLAY_ID_CONSTRAINT) => {
                        Err(StoreError::DisplayIdTaken(slot.display_id.clone()))
                    }
                    _ => Err(StoreError::DuplicateSlot(slot.key.clone())),
                }
            }
            Err(err) => Err(query_failed(err, "Slot can't be added")),
        }
    }

    fn all(&self) -> Result<Vec<Slot>, StoreError> {
        self.load_slots(None)
    }

    fn find_available(&self) -> Result<Vec<Slot>, StoreError> {
        self.load_slots(Some(true))
    }

    fn find_booked(&self) -> Result<Vec<Slot>, StoreError> {
        self.load_slots(Some(false))
    }

    fn find_by_time(&self, time: &SlotTime) -> Result<Vec<Slot>, StoreError> {
        let mut connection = self.connection()?;
        let records = slots::table
            .filter(slots::day.eq(to_column(time.day, "day")?))
            .filter(slots::month.eq(to_column(time.month, "month")?))
            .filter(slots::year.eq(time.year))
            .filter(slots::start_minute.eq(to_column(time.start_minute, "start minute")?))
            .filter(slots::end_minute.eq(to_column(time.end_minute, "end minute")?))
            .order(slots::id.asc())
            .select(SlotRecord::as_select())
            .load(&mut *connection)
            .map_err(|err| query_failed(err, "Failed to look up slots by time"))?;
        into_slots(records)
    }

    fn find_by_display_id(&self, display_id: &str) -> Result<Option<Slot>, StoreError> {
        let mut connection = self.connection()?;
        slots::table
            .filter(slots::display_id.eq(display_id))
            .select(SlotRecord::as_select())
            .first::<SlotRecord>(&mut *connection)
            .optional()
            .map_err(|err| query_failed(err, "Failed to look up slot by display id"))?
            .map(Slot::try_from)
            .transpose()
    }

    fn identity_booked(&self, id_number: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection()?;
        diesel::select(diesel::dsl::exists(
            slots::table.filter(slots::client_id_number.eq(id_number)),
        ))
        .get_result(&mut *connection)
        .map_err(|err| query_failed(err, "Failed to look up id number"))
    }

    fn assign_if_available(
        &self,
        slot_id: Uuid,
        booking: &ClientBooking,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        let mut connection = self.connection()?;
        let result = diesel::update(
            slots::table
                .filter(slots::id.eq(slot_id))
                .filter(slots::client_name.is_null()),
        )
        .set(&BookingChangeset::booked(booking, now))
        .returning(SlotRecord::as_returning())
        .get_result::<SlotRecord>(&mut *connection)
        .optional();

        match result {
            Ok(Some(record)) => Ok(Assignment::Assigned(Slot::try_from(record)?)),
            Ok(None) => Ok(Assignment::AlreadyBooked),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::DuplicateIdentity)
            }
            Err(err) => Err(query_failed(err, "Slot can't be booked")),
        }
    }

    fn release(&self, display_id: &str, now: DateTime<Utc>) -> Result<Option<Slot>, StoreError> {
        let released = {
            let mut connection = self.connection()?;
            diesel::update(
                slots::table
                    .filter(slots::display_id.eq(display_id))
                    .filter(slots::client_name.is_not_null()),
            )
            .set(&BookingChangeset::released(now))
            .returning(SlotRecord::as_returning())
            .get_result::<SlotRecord>(&mut *connection)
            .optional()
            .map_err(|err| query_failed(err, "Slot can't be released"))?
        };

        match released {
            Some(record) => Slot::try_from(record).map(Some),
            // nothing was booked: either already available or unknown
            None => self.find_by_display_id(display_id),
        }
    }
}
