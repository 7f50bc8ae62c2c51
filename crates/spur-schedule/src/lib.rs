//! `spur-schedule`: the simulation clock and the spawn schedule.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`event`]  | `Event<E>`, `EventHandle`                                   |
//! | [`queue`]  | `EventQueue<E>` (`BTreeMap<(SimTime, seq), E>`), snapshots  |
//! | [`spawn`]  | `SpawnEntry`, `RespawnPolicy`                               |
//! | [`loader`] | `load_spawns_csv`, `load_spawns_reader`                     |
//! | [`error`]  | `ScheduleError`, `ScheduleResult<T>`                        |
//!
//! # Ordering model (summary)
//!
//! Every scheduled event receives a strictly increasing sequence id.  The
//! queue dispatches by:
//!
//! ```text
//! (scheduled_time ascending, sequence_id ascending)
//! ```
//!
//! so two events at the same instant always run in insertion order, and a
//! fixed sequence of `schedule` calls always yields the same dispatch order.

pub mod error;
pub mod event;
pub mod loader;
pub mod queue;
pub mod spawn;


pub use error::{ScheduleError, ScheduleResult};
pub use event::{Event, EventHandle};
pub use loader::{load_spawns_csv, load_spawns_reader};
pub use queue::{EventQueue, QueueSnapshot};
pub use spawn::{RespawnPolicy, SpawnEntry};
