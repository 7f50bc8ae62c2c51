//! `spur-network`: the static railway network and the resource protocol.
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`component`] | `Component`, wait/hand-off queues, request/vacate/promote     |
//! | [`service`]   | `ServiceModel` trait, built-in models, `ServiceSpec`          |
//! | [`route`]     | `Route`, `RouteStop`, per-edge `StopParams`                   |
//! | [`tour`]      | `Tour`, flattened `ItineraryStop`s, junction merging          |
//! | [`network`]   | `Network`, `NetworkBuilder`, `ComponentDef`, duration sampling |
//! | [`error`]     | `NetworkError`, `NetworkResult`                               |
//!
//! The network never advances time or schedules anything.  It answers
//! "may this agent enter?" and "how long does this service take?"; the
//! kernel in `spur-sim` decides what happens next.

pub mod component;
pub mod error;
pub mod network;
pub mod route;
pub mod service;
pub mod tour;

#[cfg(test)]
mod tests;

pub use component::{Admission, Claimant, Component, ComponentState, QueueDiscipline, Waiter};
pub use error::{NetworkError, NetworkResult};
pub use network::{ComponentDef, DurationSample, Network, NetworkBuilder};
pub use route::{Route, RouteStop, StopParams};
pub use service::{
    DwellStation, FixedDuration, HeadwayStation, ServiceContext, ServiceModel, ServiceSpec,
    Traversal,
};
pub use tour::{EdgeKey, ItineraryStop, Tour};
