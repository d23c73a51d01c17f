use crate::{
    error::SchedulerError,
    types::{AvailabilityWindow, ClientBooking, SlotTime},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub availabilities: Vec<AvailabilityWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookingRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "school must not be empty"))]
    pub school: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "id number must not be empty"))]
    pub id_number: Option<String>,
    #[serde(default)]
    pub preferred_day: Option<String>,
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub start_time: u32,
    pub end_time: u32,
}

impl BookingRequest {
    pub fn slot_time(&self) -> SlotTime {
        SlotTime {
            year: self.year,
            month: self.month,
            day: self.day,
            start_minute: self.start_time,
            end_minute: self.end_time,
        }
    }

    /// Validates the client details and extracts them. With `require_identity`
    /// the school and id number become mandatory.
    pub fn client_booking(&self, require_identity: bool) -> Result<ClientBooking, SchedulerError> {
        self.validate()
            .map_err(|err| SchedulerError::Validation(describe(&err)))?;

        let missing: Vec<&str> = [
            ("name", self.name.trim().is_empty()),
            ("email", self.email.trim().is_empty()),
            ("phone", self.phone.trim().is_empty()),
            ("school", require_identity && self.school.is_none()),
            ("id number", require_identity && self.id_number.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(SchedulerError::Validation(format!(
                "some of the user details are missing: {}",
                missing.join(", ")
            )));
        }

        Ok(ClientBooking {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            school: self.school.clone(),
            id_number: self.id_number.clone(),
            preferred_day: self.preferred_day.clone(),
        })
    }
}

fn describe(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_values()
        .flat_map(|errors| errors.iter())
        .map(|error| {
            error
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| error.code.to_string())
        })
        .collect();
    messages.sort();
    messages.join(", ")
}
