//! Train agents and their state machine.
//!
//! ```text
//! spawned ─► requesting ─┬─► queued ──────────────┐
//!                        ├─► blocked_on_handoff ──┤
//!                        └────────────────────────┴─► in_service ─► advancing ─┬─► requesting
//!                                                                              └─► completed
//! any non-terminal state ─► aborted
//! ```
//!
//! Agents never schedule their own events; every transition happens inside
//! a kernel handler in [`Model`][crate::Model].

use serde::{Deserialize, Serialize};

use spur_core::{AgentId, ComponentId, SimTime, TourId};
use spur_schedule::EventHandle;

use crate::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Created; may be held until the arrival time of its first stop.
    Spawned,
    /// Transient, within one dispatch: a request is being decided.
    Requesting,
    /// In a component's wait queue, occupying nothing.
    Queued,
    /// Occupying a component with a service-complete event pending.
    InService,
    /// Occupying a component and waiting for the next one to accept it.
    BlockedOnHandoff,
    /// Service finished; held by a timetable or about to request the next stop.
    Advancing,
    Completed,
    Aborted,
}

impl AgentState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Completed | AgentState::Aborted)
    }

    /// Whether `self → to` is an edge of the state machine.
    pub fn can_transition(self, to: AgentState) -> bool {
        use AgentState::*;
        match (self, to) {
            (s, Aborted) => !s.is_terminal(),
            (Spawned, Requesting)
            | (Requesting, Queued | InService | BlockedOnHandoff)
            | (Queued, InService)
            | (BlockedOnHandoff, InService)
            | (InService, Advancing)
            | (Advancing, Requesting | Completed) => true,
            _ => false,
        }
    }
}

/// Per-agent kernel bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id:       AgentId,
    pub name:     String,
    pub tour:     TourId,
    /// Index of the spawn plan this agent was created from.
    pub plan:     usize,
    /// Respawn generation: 0 for the original agent.
    pub cycle:    u32,
    pub priority: i32,

    pub state:  AgentState,
    /// Index into the tour itinerary of the stop being served or held at.
    pub cursor: usize,

    pub occupying:  Option<ComponentId>,
    /// Component whose wait or hand-off queue holds this agent.
    pub waiting_on: Option<ComponentId>,

    /// Outstanding spawn-hold, service-complete or timetable-hold event.
    pub pending:        Option<EventHandle>,
    pub liveness_check: Option<EventHandle>,

    pub blocked_since: Option<SimTime>,
    /// Incremented each time the agent enters `BlockedOnHandoff`.
    pub block_episode: u64,
    /// A liveness warning already covers the current episode.
    pub stuck_reported:    bool,
    /// That warning named a deadlocked set.
    #[serde(default)]
    pub deadlock_reported: bool,

    pub spawned_at:  SimTime,
    pub finished_at: Option<SimTime>,
}

impl Agent {
    pub fn new(
        id:       AgentId,
        name:     String,
        tour:     TourId,
        plan:     usize,
        cycle:    u32,
        priority: i32,
        now:      SimTime,
    ) -> Self {
        Self {
            id,
            name,
            tour,
            plan,
            cycle,
            priority,
            state:             AgentState::Spawned,
            cursor:            0,
            occupying:         None,
            waiting_on:        None,
            pending:           None,
            liveness_check:    None,
            blocked_since:     None,
            block_episode:     0,
            stuck_reported:    false,
            deadlock_reported: false,
            spawned_at:        now,
            finished_at:       None,
        }
    }

    /// Move to `to`, rejecting transitions the state machine does not allow.
    pub fn set_state(&mut self, to: AgentState) -> SimResult<AgentState> {
        let from = self.state;
        if !from.can_transition(to) {
            return Err(SimError::IllegalTransition { agent: self.id, from, to });
        }
        self.state = to;
        Ok(from)
    }

    pub fn is_live(&self) -> bool {
        !self.state.is_terminal()
    }
}
