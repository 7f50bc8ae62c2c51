//! Snapshot and resume.
//!
//! A [`ModelSnapshot`] holds every piece of dynamic state: the clock and
//! pending events, component occupancy and queues, per-agent bookkeeping,
//! jitter stream positions, service-model state and recorded anomalies.
//! Static structure (components, routes, tours, spawn plans) is not included;
//! restore into a model built from the same configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use spur_core::{ComponentId, RunConfig, StreamPosition};
use spur_network::{ComponentState, EdgeKey};
use spur_schedule::{EventQueue, QueueSnapshot};

use crate::{Agent, Anomaly, KernelEvent, Model, SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub config:            RunConfig,
    pub queue:             QueueSnapshot<KernelEvent>,
    pub components:        Vec<ComponentState>,
    pub edge_jitters:      Vec<(EdgeKey, StreamPosition)>,
    pub agents:            Vec<Agent>,
    pub anomalies:         Vec<Anomaly>,
    pub negative_reported: Vec<ComponentId>,
}

impl ModelSnapshot {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Model {
    /// Capture the complete dynamic state.  Take snapshots between steps
    /// (e.g. while paused); the result resumes bit-for-bit.
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            config:            self.config.clone(),
            queue:             self.queue.snapshot(),
            components:        self.network.component_states(),
            edge_jitters:      self.network.edge_jitter_positions(),
            agents:            self.agents.clone(),
            anomalies:         self.anomalies.clone(),
            negative_reported: self.negative_reported.iter().copied().collect(),
        }
    }

    /// Replace this model's dynamic state with `snapshot`.
    ///
    /// The model must have been built from the same configuration as the
    /// one the snapshot was taken from.  Anomalies already in the snapshot
    /// are not re-delivered to observers.  On error the model is left in an
    /// unspecified state and should be discarded.
    pub fn restore(&mut self, snapshot: ModelSnapshot) -> SimResult<()> {
        let components = self.network.components().len();
        if snapshot.components.len() != components {
            return Err(SimError::SnapshotMismatch(format!(
                "snapshot has {} components, model has {components}",
                snapshot.components.len()
            )));
        }
        for (i, agent) in snapshot.agents.iter().enumerate() {
            if agent.id.index() != i {
                return Err(SimError::SnapshotMismatch(format!("agent {} stored at position {i}", agent.id)));
            }
            if agent.plan >= self.plans.len() || self.network.tour(agent.tour).is_err() {
                return Err(SimError::SnapshotMismatch(format!("{} refers to an unknown plan or tour", agent.id)));
            }
        }
        for event in &snapshot.queue.events {
            if let KernelEvent::Spawn { plan, .. } = event.payload {
                if plan >= self.plans.len() {
                    return Err(SimError::SnapshotMismatch(format!("pending spawn of unknown plan {plan}")));
                }
            }
        }

        self.queue = EventQueue::restore(snapshot.queue)?;
        self.network.restore(&snapshot.components, &snapshot.edge_jitters)?;
        self.live = snapshot.agents.iter().filter(|a| a.is_live()).map(|a| a.id).collect();
        self.agents              = snapshot.agents;
        self.anomalies           = snapshot.anomalies;
        self.delivered_anomalies = self.anomalies.len();
        self.negative_reported   = snapshot.negative_reported.into_iter().collect::<BTreeSet<_>>();
        self.config              = snapshot.config;
        self.trace.clear();

        info!(time = %self.now(), agents = self.agents.len(), pending = self.queue.len(), "model restored");
        self.check_invariants()
    }
}
