use thiserror::Error;

use spur_core::{AgentId, SimTime};
use spur_network::NetworkError;
use spur_schedule::ScheduleError;

use crate::AgentState;

#[derive(Debug, Error)]
pub enum SimError {
    // ── Configuration (raised before the first dispatch) ──────────────────
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("unknown {kind} {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("agent name {0:?} is already in use")]
    DuplicateAgent(String),

    #[error("cannot read model config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse model config: {0}")]
    Json(#[from] serde_json::Error),

    // ── Caller errors at run time ─────────────────────────────────────────
    #[error("cannot inject at {requested}: clock is already at {now}")]
    InjectInPast { requested: SimTime, now: SimTime },

    #[error("agent {0} does not exist")]
    UnknownAgent(AgentId),

    #[error("snapshot does not fit this model: {0}")]
    SnapshotMismatch(String),

    // ── Kernel invariant violations ───────────────────────────────────────
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("illegal transition for {agent}: {from:?} -> {to:?}")]
    IllegalTransition { agent: AgentId, from: AgentState, to: AgentState },

    #[error("{agent} received {event} while {state:?}")]
    UnexpectedEvent { agent: AgentId, state: AgentState, event: &'static str },

    #[error("kernel bookkeeping is inconsistent: {0}")]
    Inconsistent(String),
}

impl SimError {
    /// `true` when the kernel broke one of its own invariants.  The model
    /// must not be stepped again after such an error.
    pub fn is_fatal_kernel(&self) -> bool {
        match self {
            SimError::Network(e) => !e.is_configuration(),
            SimError::Schedule(_)
            | SimError::IllegalTransition { .. }
            | SimError::UnexpectedEvent { .. }
            | SimError::Inconsistent(_) => true,
            _ => false,
        }
    }

    /// `true` for errors surfaced while building a model.
    pub fn is_configuration(&self) -> bool {
        match self {
            SimError::Network(e) => e.is_configuration(),
            SimError::Config(_)
            | SimError::UnknownName { .. }
            | SimError::DuplicateAgent(_)
            | SimError::Io(_)
            | SimError::Json(_) => true,
            _ => false,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
