//! Kernel event payloads.

use serde::{Deserialize, Serialize};

use spur_core::{AgentId, ComponentId};

/// Payload carried by every entry of the model's event queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelEvent {
    /// Create the agent for spawn plan `plan`, generation `cycle`.
    Spawn { plan: usize, cycle: u32 },
    /// A timetable hold (arrival or departure) has elapsed.
    Ready { agent: AgentId },
    ServiceComplete { agent: AgentId },
    /// Fires once per hand-off block episode, after the liveness horizon.
    LivenessCheck { agent: AgentId, episode: u64 },
    /// Externally injected mutation.
    Intervention(Intervention),
}

impl KernelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            KernelEvent::Spawn { .. } => "spawn",
            KernelEvent::Ready { .. } => "ready",
            KernelEvent::ServiceComplete { .. } => "service_complete",
            KernelEvent::LivenessCheck { .. } => "liveness_check",
            KernelEvent::Intervention(_) => "intervention",
        }
    }
}

/// Operator actions that may be injected mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intervention {
    /// Stop admitting agents.  Occupants finish normally.
    CloseComponent(ComponentId),
    /// Resume admitting; waiting agents are promoted immediately.
    OpenComponent(ComponentId),
    /// Remove an agent: pending events cancelled, queues withdrawn,
    /// occupied component vacated.
    AbortAgent(AgentId),
}
