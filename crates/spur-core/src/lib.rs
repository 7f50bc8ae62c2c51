//! `spur-core`: foundational types for the `spur` railway simulation kernel.
//!
//! This crate is a dependency of every other `spur-*` crate.  It has no
//! `spur-*` dependencies and only a handful of external ones (`rand`,
//! `rand_chacha`, `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `ComponentId`, `RouteId`, `TourId`               |
//! | [`time`]   | `SimTime`, `RunConfig`, `AdmissionPolicy`                   |
//! | [`rng`]    | `StreamRng` (one independent stream per jitter instance)    |
//! | [`error`]  | `CoreError`, `CoreResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `spur-sim` snapshots.                          |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, ComponentId, RouteId, TourId};
pub use rng::{derive_seed, StreamPosition, StreamRng};
pub use time::{AdmissionPolicy, RunConfig, SimTime};
