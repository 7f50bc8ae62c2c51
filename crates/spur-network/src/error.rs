//! Network-subsystem error type.
//!
//! Variants fall into two classes:
//!
//! - **Configuration** errors are raised while a network is being built and
//!   never once a run has started.
//! - **Protocol** errors (`CapacityViolation`, `AgentAlreadyPresent`,
//!   `NotAnOccupant`, `StalledQueue`) mean the kernel broke one of its own
//!   invariants; the run state can no longer be trusted.

use thiserror::Error;

use spur_core::{AgentId, ComponentId, RouteId, TourId};
use spur_jitter::JitterError;

/// Errors produced by `spur-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    // ── Configuration ─────────────────────────────────────────────────────
    #[error("{kind} name {name:?} is already in use")]
    DuplicateName { kind: &'static str, name: String },

    #[error("component {0} not found in network")]
    UnknownComponent(ComponentId),

    #[error("route {0} not found in network")]
    UnknownRoute(RouteId),

    #[error("tour {0} not found in network")]
    UnknownTour(TourId),

    #[error("component {name:?} must have a capacity of at least 1")]
    ZeroCapacity { name: String },

    #[error("route {0:?} has no stops")]
    EmptyRoute(String),

    #[error("route {route:?} visits {component} twice in a row")]
    RepeatedStop { route: String, component: ComponentId },

    #[error("route {route:?} stop {stop}: duration override must be finite and >= 0, got {secs}")]
    InvalidStopDuration { route: String, stop: usize, secs: f64 },

    #[error("tour {0:?} has no routes")]
    EmptyTour(String),

    #[error("tour {tour:?}: route {next} does not start where route {previous} ends")]
    RouteDiscontinuity { tour: String, previous: RouteId, next: RouteId },

    #[error("invalid jitter for {owner}: {source}")]
    InvalidJitter {
        owner:  String,
        #[source]
        source: JitterError,
    },

    #[error("invalid service model for component {component:?}: {reason}")]
    InvalidServiceModel { component: String, reason: String },

    #[error("cannot restore service model state of {component}: {reason}")]
    ServiceState { component: ComponentId, reason: String },

    // ── Protocol violations ───────────────────────────────────────────────
    #[error("capacity violation at {component}: {occupants} occupants exceed capacity {capacity}")]
    CapacityViolation { component: ComponentId, capacity: u32, occupants: usize },

    #[error("{agent} is already present at {component}")]
    AgentAlreadyPresent { agent: AgentId, component: ComponentId },

    #[error("{agent} does not occupy {component}")]
    NotAnOccupant { agent: AgentId, component: ComponentId },

    #[error("{component} has a free slot but agents still waiting")]
    StalledQueue { component: ComponentId },
}

impl NetworkError {
    /// `true` for errors raised while building a network.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            NetworkError::CapacityViolation { .. }
                | NetworkError::AgentAlreadyPresent { .. }
                | NetworkError::NotAnOccupant { .. }
                | NetworkError::StalledQueue { .. }
        )
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;
