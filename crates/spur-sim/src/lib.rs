//! `spur-sim`: discrete-event kernel orchestrator for the spur framework.
//!
//! # Event loop
//!
//! ```text
//! loop:
//!   ① Pause:     stop between events if the pause handle is set.
//!   ② Advance:   pop the next (time, seq) event; the clock jumps to it.
//!   ③ Dispatch:  run the handler for the event kind (see `Model`).
//!                 Hand-offs and the promotions they release complete
//!                 inside this one dispatch.
//!   ④ Check:     capacity and work conservation on every touched component.
//!   ⑤ Deliver:   hand trace records and new anomalies to the observer.
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`model`]    | `Model`, `RunOutcome`, `PauseHandle`, `RunReport`            |
//! | [`builder`]  | `ModelBuilder`                                               |
//! | [`agent`]    | `Agent`, `AgentState` and its transition table               |
//! | [`event`]    | `KernelEvent`, `Intervention`                                |
//! | [`trace`]    | `TraceRecord`, `TransitionKind`, `Anomaly` and warnings      |
//! | [`observer`] | `KernelObserver`, `NoopObserver`, `TraceRecorder`, `ChannelObserver` |
//! | [`snapshot`] | `ModelSnapshot`, `Model::snapshot`, `Model::restore`         |
//! | [`config`]   | `ModelConfig`, `load_config_json`, `load_config_reader`      |
//! | [`error`]    | `SimError`, `SimResult<T>`                                   |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use spur_sim::{load_config_json, ModelBuilder, TraceRecorder};
//!
//! let config = load_config_json("line.json")?;
//! let mut model = ModelBuilder::from_config(config)?.build()?;
//! let mut trace = TraceRecorder::new();
//! model.run(&mut trace)?;
//! for w in model.liveness_warnings() {
//!     eprintln!("stuck: {:?}", w.agents);
//! }
//! ```

pub mod agent;
pub mod builder;
pub mod config;
pub mod error;
pub mod event;
mod liveness;
pub mod model;
pub mod observer;
pub mod snapshot;
pub mod trace;


pub use agent::{Agent, AgentState};
pub use builder::ModelBuilder;
pub use config::{load_config_json, load_config_reader, ModelConfig, RouteDef, StopDef, TourDef};
pub use error::{SimError, SimResult};
pub use event::{Intervention, KernelEvent};
pub use model::{Model, PauseHandle, RunOutcome, RunReport, SpawnPlan};
pub use observer::{ChannelObserver, KernelMessage, KernelObserver, NoopObserver, TraceRecorder};
pub use snapshot::ModelSnapshot;
pub use trace::{Anomaly, LivenessWarning, NegativeDurationWarning, TraceRecord, TransitionKind};
