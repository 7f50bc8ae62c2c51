//! Capacity-limited track resources and the blocking request/release protocol.
//!
//! # Queues
//!
//! A component keeps two waiting lines:
//!
//! - the **wait queue** holds agents entering the network at this component
//!   (they occupy nothing else);
//! - the **hand-off queue** holds agents that already occupy the previous
//!   component of their itinerary and cannot release it until admitted here.
//!
//! Whenever a slot frees (or a closed component reopens), [`Component::promote`]
//! admits the next claimant.  Which line is served first is decided by the
//! run's [`AdmissionPolicy`]; within a line, order follows the component's
//! [`QueueDiscipline`].
//!
//! # Invariants
//!
//! - `occupants.len() <= capacity` at all times.
//! - An agent appears at most once across occupants and both queues.
//! - Work conservation: an open component with a free slot has empty queues.
//!   This holds between kernel steps; [`Component::check_invariants`] verifies
//!   it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use spur_core::{AdmissionPolicy, AgentId, ComponentId, StreamPosition};
use spur_jitter::Jitter;

use crate::{NetworkError, NetworkResult, ServiceModel};

// ── Public enums ──────────────────────────────────────────────────────────────

/// Ordering applied within each waiting line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueDiscipline {
    /// Strict arrival order.
    #[default]
    Fifo,
    /// Higher priority first; arrival order among equals.
    Priority,
}

/// Immediate result of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The agent now occupies the component.
    Admitted,
    /// The agent joined the wait queue.
    Queued,
    /// The agent joined the hand-off queue and keeps its current component.
    HandoffWait,
}

/// An agent admitted by [`Component::promote`], tagged by the line it left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claimant {
    Entrant(AgentId),
    Handoff(AgentId),
}

impl Claimant {
    pub fn agent(self) -> AgentId {
        match self {
            Claimant::Entrant(a) | Claimant::Handoff(a) => a,
        }
    }
}

/// One entry in a waiting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waiter {
    pub agent:    AgentId,
    pub priority: i32,
}

// ── Component ─────────────────────────────────────────────────────────────────

/// A track section, platform, crossover, or yard.
#[derive(Debug)]
pub struct Component {
    id:         ComponentId,
    name:       String,
    capacity:   u32,
    discipline: QueueDiscipline,
    closed:     bool,

    /// Current occupants in admission order.
    occupants:  Vec<AgentId>,
    wait_queue: VecDeque<Waiter>,
    handoff:    VecDeque<Waiter>,

    /// Service episodes started here since the run began.
    admitted_total: u64,

    pub(crate) service: Box<dyn ServiceModel>,
    pub(crate) jitter:  Jitter,
}

impl Component {
    pub fn new(
        id:         ComponentId,
        name:       impl Into<String>,
        capacity:   u32,
        discipline: QueueDiscipline,
        service:    Box<dyn ServiceModel>,
        jitter:     Jitter,
    ) -> NetworkResult<Self> {
        let name = name.into();
        if capacity == 0 {
            return Err(NetworkError::ZeroCapacity { name });
        }
        Ok(Self {
            id,
            name,
            capacity,
            discipline,
            closed: false,
            occupants: Vec::with_capacity(capacity as usize),
            wait_queue: VecDeque::new(),
            handoff: VecDeque::new(),
            admitted_total: 0,
            service,
            jitter,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn discipline(&self) -> QueueDiscipline {
        self.discipline
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn occupants(&self) -> &[AgentId] {
        &self.occupants
    }

    pub fn wait_queue(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.wait_queue.iter().map(|w| w.agent)
    }

    pub fn handoff_queue(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.handoff.iter().map(|w| w.agent)
    }

    pub fn admitted_total(&self) -> u64 {
        self.admitted_total
    }

    pub fn service_kind(&self) -> &'static str {
        self.service.kind()
    }

    pub fn is_occupant(&self, agent: AgentId) -> bool {
        self.occupants.contains(&agent)
    }

    pub fn is_waiting(&self, agent: AgentId) -> bool {
        self.wait_queue.iter().chain(&self.handoff).any(|w| w.agent == agent)
    }

    /// `true` when the component is open and below capacity.
    #[inline]
    pub fn has_free_slot(&self) -> bool {
        !self.closed && self.occupants.len() < self.capacity as usize
    }

    fn has_waiters(&self) -> bool {
        !self.wait_queue.is_empty() || !self.handoff.is_empty()
    }

    // ── Protocol ──────────────────────────────────────────────────────────

    /// Entry request from an agent that occupies nothing.
    ///
    /// Admits immediately when a slot is free and nobody is waiting;
    /// otherwise appends to the wait queue.
    pub fn request(&mut self, agent: AgentId, priority: i32) -> NetworkResult<Admission> {
        self.ensure_absent(agent)?;
        if self.has_free_slot() && !self.has_waiters() {
            self.admit(agent)?;
            return Ok(Admission::Admitted);
        }
        enqueue(&mut self.wait_queue, self.discipline, Waiter { agent, priority });
        Ok(Admission::Queued)
    }

    /// Hand-off request from an agent that still occupies its previous
    /// component.  On [`Admission::Admitted`] the caller must vacate the
    /// previous component in the same step.
    pub fn request_handoff(&mut self, agent: AgentId, priority: i32) -> NetworkResult<Admission> {
        self.ensure_absent(agent)?;
        if self.has_free_slot() && !self.has_waiters() {
            self.admit(agent)?;
            return Ok(Admission::Admitted);
        }
        enqueue(&mut self.handoff, self.discipline, Waiter { agent, priority });
        Ok(Admission::HandoffWait)
    }

    /// Release the slot held by `agent`.
    ///
    /// Does not promote anyone; the caller drives [`promote`](Self::promote)
    /// so that cascades are processed in a single, ordered pass.
    pub fn vacate(&mut self, agent: AgentId) -> NetworkResult<()> {
        match self.occupants.iter().position(|&a| a == agent) {
            Some(i) => {
                self.occupants.remove(i);
                Ok(())
            }
            None => Err(NetworkError::NotAnOccupant { agent, component: self.id }),
        }
    }

    /// Remove `agent` from either waiting line.  Returns `false` if it was
    /// not waiting here.
    pub fn withdraw(&mut self, agent: AgentId) -> bool {
        for line in [&mut self.wait_queue, &mut self.handoff] {
            if let Some(i) = line.iter().position(|w| w.agent == agent) {
                line.remove(i);
                return true;
            }
        }
        false
    }

    /// The claimant that [`promote`](Self::promote) would admit next, without
    /// admitting it.
    pub fn next_claimant(&self, policy: AdmissionPolicy) -> Option<Claimant> {
        if !self.has_free_slot() {
            return None;
        }
        let entrant = self.wait_queue.front().map(|w| Claimant::Entrant(w.agent));
        let handoff = self.handoff.front().map(|w| Claimant::Handoff(w.agent));
        match policy {
            AdmissionPolicy::WaitQueueFirst => entrant.or(handoff),
            AdmissionPolicy::HandoffFirst   => handoff.or(entrant),
        }
    }

    /// Admit the next claimant if a slot is free.
    pub fn promote(&mut self, policy: AdmissionPolicy) -> NetworkResult<Option<Claimant>> {
        let Some(claimant) = self.next_claimant(policy) else {
            return Ok(None);
        };
        match claimant {
            Claimant::Entrant(_) => self.wait_queue.pop_front(),
            Claimant::Handoff(_) => self.handoff.pop_front(),
        };
        self.admit(claimant.agent())?;
        Ok(Some(claimant))
    }

    /// Stop admitting.  Current occupants are unaffected.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Resume admitting.  The caller should then drive `promote`.
    pub fn open(&mut self) {
        self.closed = false;
    }

    /// Verify capacity and work conservation.
    pub fn check_invariants(&self) -> NetworkResult<()> {
        if self.occupants.len() > self.capacity as usize {
            return Err(NetworkError::CapacityViolation {
                component: self.id,
                capacity:  self.capacity,
                occupants: self.occupants.len(),
            });
        }
        if self.has_free_slot() && self.has_waiters() {
            return Err(NetworkError::StalledQueue { component: self.id });
        }
        Ok(())
    }

    // ── Snapshot ──────────────────────────────────────────────────────────

    /// Capture dynamic state.
    pub fn state(&self) -> ComponentState {
        ComponentState {
            id:             self.id,
            closed:         self.closed,
            occupants:      self.occupants.clone(),
            wait_queue:     self.wait_queue.iter().copied().collect(),
            handoff:        self.handoff.iter().copied().collect(),
            admitted_total: self.admitted_total,
            jitter:         self.jitter.position(),
            service:        self.service.save_state(),
        }
    }

    /// Overwrite dynamic state with a previously captured `state`.
    pub fn restore(&mut self, state: &ComponentState) -> NetworkResult<()> {
        if state.id != self.id {
            return Err(NetworkError::UnknownComponent(state.id));
        }
        if state.occupants.len() > self.capacity as usize {
            return Err(NetworkError::CapacityViolation {
                component: self.id,
                capacity:  self.capacity,
                occupants: state.occupants.len(),
            });
        }
        self.service
            .load_state(&state.service)
            .map_err(|reason| NetworkError::ServiceState { component: self.id, reason })?;
        self.closed         = state.closed;
        self.occupants      = state.occupants.clone();
        self.wait_queue     = state.wait_queue.iter().copied().collect();
        self.handoff        = state.handoff.iter().copied().collect();
        self.admitted_total = state.admitted_total;
        self.jitter.restore(state.jitter);
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn ensure_absent(&self, agent: AgentId) -> NetworkResult<()> {
        if self.is_occupant(agent) || self.is_waiting(agent) {
            return Err(NetworkError::AgentAlreadyPresent { agent, component: self.id });
        }
        Ok(())
    }

    fn admit(&mut self, agent: AgentId) -> NetworkResult<()> {
        if self.occupants.len() >= self.capacity as usize {
            return Err(NetworkError::CapacityViolation {
                component: self.id,
                capacity:  self.capacity,
                occupants: self.occupants.len() + 1,
            });
        }
        self.occupants.push(agent);
        self.admitted_total += 1;
        Ok(())
    }
}

fn enqueue(line: &mut VecDeque<Waiter>, discipline: QueueDiscipline, waiter: Waiter) {
    match discipline {
        QueueDiscipline::Fifo => line.push_back(waiter),
        QueueDiscipline::Priority => {
            // Behind every waiter of equal or higher priority.
            let at = line
                .iter()
                .position(|w| w.priority < waiter.priority)
                .unwrap_or(line.len());
            line.insert(at, waiter);
        }
    }
}

// ── ComponentState ────────────────────────────────────────────────────────────

/// Serialisable dynamic state of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentState {
    pub id:             ComponentId,
    pub closed:         bool,
    pub occupants:      Vec<AgentId>,
    pub wait_queue:     Vec<Waiter>,
    pub handoff:        Vec<Waiter>,
    pub admitted_total: u64,
    pub jitter:         StreamPosition,
    pub service:        Value,
}
