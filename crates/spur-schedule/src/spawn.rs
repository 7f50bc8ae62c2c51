//! Agent spawn schedule entries.
//!
//! A spawn entry names an agent, the tour it walks, and when it enters the
//! network.  Names are resolved to typed ids by the model builder, so this
//! crate stays independent of the network.

use serde::{Deserialize, Serialize};

use spur_core::SimTime;

/// What happens when an agent spawned from this entry completes its tour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RespawnPolicy {
    /// The agent leaves the simulation for good.
    #[default]
    Never,
    /// A fresh agent starts the same tour `delay_secs` later.  `max_cycles`
    /// bounds the number of respawns; `None` repeats until the run ends.
    Cyclic {
        delay_secs: u64,
        #[serde(default)]
        max_cycles: Option<u32>,
    },
}

impl RespawnPolicy {
    /// Whether another cycle is allowed after `completed_cycles` respawns.
    pub fn allows(&self, completed_cycles: u32) -> bool {
        match *self {
            RespawnPolicy::Never => false,
            RespawnPolicy::Cyclic { max_cycles, .. } => {
                max_cycles.is_none_or(|max| completed_cycles < max)
            }
        }
    }
}

/// One scheduled agent entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Agent name.  Must be unique within a model.
    pub agent:    String,
    /// Name of the tour the agent walks.
    pub tour:     String,
    /// Time at which the agent first requests the head of its tour.
    pub time:     SimTime,
    /// Queue priority for components using priority discipline (higher first).
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub respawn:  RespawnPolicy,
}

impl SpawnEntry {
    pub fn new(agent: impl Into<String>, tour: impl Into<String>, time: SimTime) -> Self {
        Self {
            agent:    agent.into(),
            tour:     tour.into(),
            time,
            priority: 0,
            respawn:  RespawnPolicy::Never,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_respawn(mut self, respawn: RespawnPolicy) -> Self {
        self.respawn = respawn;
        self
    }
}
