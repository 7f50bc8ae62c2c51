use thiserror::Error;

use spur_core::SimTime;

use crate::EventHandle;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("cannot schedule at {requested}: clock is already at {now}")]
    PastScheduling { requested: SimTime, now: SimTime },

    #[error("event {0} is no longer pending (already dispatched or cancelled)")]
    NotPending(EventHandle),

    #[error("spawn schedule parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
