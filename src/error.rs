//! Error types for scheduling operations.

use crate::backend::StoreError;
use crate::types::SlotTime;
use thiserror::Error;

pub const INTERNAL_ERROR_MESSAGE: &str = "A server error has occurred, please try again later";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("{0}")]
    Validation(String),

    #[error("meeting already exists on: {0}")]
    DuplicateSlot(SlotTime),

    #[error("no available meetings at that time")]
    SlotUnavailable,

    #[error("a meeting with the following id number already exists")]
    DuplicateIdentity,

    #[error("no such meeting")]
    NoSuchSlot,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

impl SchedulerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::Validation(_) => ErrorKind::Validation,
            SchedulerError::DuplicateSlot(_)
            | SchedulerError::SlotUnavailable
            | SchedulerError::DuplicateIdentity => ErrorKind::Conflict,
            SchedulerError::NoSuchSlot => ErrorKind::NotFound,
            SchedulerError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }

    /// Text safe to show to the requester. Internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            SchedulerError::Internal(_) => INTERNAL_ERROR_MESSAGE.into(),
            err => err.to_string(),
        }
    }
}

impl From<StoreError> for SchedulerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateSlot(key) => SchedulerError::DuplicateSlot(key.time),
            StoreError::DuplicateIdentity => SchedulerError::DuplicateIdentity,
            StoreError::DisplayIdTaken(display_id) => {
                SchedulerError::Internal(format!("display id {display_id} already in use"))
            }
            StoreError::Unavailable(message) => SchedulerError::Internal(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
