//! Fluent builder for constructing a [`Model`].

use std::collections::HashSet;

use tracing::info;

use spur_core::RunConfig;
use spur_network::Network;
use spur_schedule::{EventQueue, SpawnEntry};

use crate::model::GENERATION_SEPARATOR;
use crate::{KernelEvent, Model, ModelConfig, SimError, SimResult, SpawnPlan};

/// Fluent builder for [`Model`].
///
/// # Required inputs
///
/// - [`RunConfig`]: seed, end time, liveness horizon, admission policy
/// - [`Network`]: built with the same seed, from
///   [`NetworkBuilder`][spur_network::NetworkBuilder]
///
/// # Optional inputs
///
/// | Method          | Default          |
/// |-----------------|------------------|
/// | `.spawn(e)`     | no agents        |
/// | `.spawns(iter)` | no agents        |
///
/// # Example
///
/// ```rust,ignore
/// let mut model = ModelBuilder::new(RunConfig::with_seed(7), network)
///     .spawn(SpawnEntry::new("IC 101", "mainline", SimTime(0)))
///     .build()?;
/// model.run(&mut NoopObserver)?;
/// ```
pub struct ModelBuilder {
    config:  RunConfig,
    network: Network,
    spawns:  Vec<SpawnEntry>,
}

impl ModelBuilder {
    pub fn new(config: RunConfig, network: Network) -> Self {
        Self { config, network, spawns: Vec::new() }
    }

    /// Build the network described by `config` and queue its spawn schedule.
    pub fn from_config(config: ModelConfig) -> SimResult<Self> {
        let network = config.build_network()?;
        Ok(Self::new(config.run, network).spawns(config.spawns))
    }

    pub fn spawn(mut self, entry: SpawnEntry) -> Self {
        self.spawns.push(entry);
        self
    }

    pub fn spawns(mut self, entries: impl IntoIterator<Item = SpawnEntry>) -> Self {
        self.spawns.extend(entries);
        self
    }

    /// Resolve tour names, check agent names are unique and free of the
    /// respawn separator `#`, and schedule every spawn.  Entries sharing a
    /// spawn time are created in insertion order.
    pub fn build(self) -> SimResult<Model> {
        let mut names = HashSet::with_capacity(self.spawns.len());
        let mut plans = Vec::with_capacity(self.spawns.len());

        for entry in self.spawns {
            if entry.agent.contains(GENERATION_SEPARATOR) {
                return Err(SimError::Config(format!(
                    "agent name {:?} contains {GENERATION_SEPARATOR:?}, which is reserved for respawned agents",
                    entry.agent
                )));
            }
            if !names.insert(entry.agent.clone()) {
                return Err(SimError::DuplicateAgent(entry.agent));
            }
            let tour = self
                .network
                .tour_id(&entry.tour)
                .ok_or_else(|| SimError::UnknownName { kind: "tour", name: entry.tour.clone() })?;
            plans.push(SpawnPlan {
                name:     entry.agent,
                tour,
                time:     entry.time,
                priority: entry.priority,
                respawn:  entry.respawn,
            });
        }

        let mut queue = EventQueue::new();
        for (plan, p) in plans.iter().enumerate() {
            queue.schedule(p.time, KernelEvent::Spawn { plan, cycle: 0 })?;
        }

        info!(
            components = self.network.components().len(),
            routes     = self.network.routes().len(),
            tours      = self.network.tours().len(),
            agents     = plans.len(),
            seed       = self.config.seed,
            "model built"
        );
        Ok(Model::new(self.config, self.network, plans, queue))
    }
}
