//! The dispatched-event trace and modelling anomalies.
//!
//! Both are plain values handed to [`KernelObserver`][crate::KernelObserver]s.
//! Anomalies are also kept by the model and included in snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use spur_core::{AgentId, ComponentId, SimTime};
use spur_schedule::EventHandle;

// ── Trace ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Spawned,
    /// Agent asked to enter `component`.
    Requested,
    /// Agent joined `component`'s wait queue.
    Queued,
    /// Agent started service at `component`.
    Admitted,
    /// Agent finished service at `component`.
    ServiceCompleted,
    /// Agent is waiting, inside its current block, for `component` ahead.
    HandoffBlocked,
    /// Agent is held by its timetable.
    Held,
    /// Agent left `component`.
    Vacated,
    Completed,
    Aborted,
    ComponentClosed,
    ComponentOpened,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionKind::Spawned          => "spawned",
            TransitionKind::Requested        => "requested",
            TransitionKind::Queued           => "queued",
            TransitionKind::Admitted         => "admitted",
            TransitionKind::ServiceCompleted => "service_completed",
            TransitionKind::HandoffBlocked   => "handoff_blocked",
            TransitionKind::Held             => "held",
            TransitionKind::Vacated          => "vacated",
            TransitionKind::Completed        => "completed",
            TransitionKind::Aborted          => "aborted",
            TransitionKind::ComponentClosed  => "component_closed",
            TransitionKind::ComponentOpened  => "component_opened",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the read-only trace stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub time:      SimTime,
    /// Event whose dispatch produced this record.
    pub event:     EventHandle,
    pub agent:     Option<AgentId>,
    pub component: Option<ComponentId>,
    pub kind:      TransitionKind,
}

// ── Anomalies ─────────────────────────────────────────────────────────────────

/// Agents stuck on a hand-off for longer than the liveness horizon.
///
/// For a deadlock (`cyclic`), `agents` is the whole set of agents that can
/// never move again, in id order, and `components` the blocks they wait for.
/// One warning covers the set; agents queued behind it are not reported
/// separately.  Otherwise `agents` holds the one stuck agent and
/// `components` the block it waits for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessWarning {
    pub time:          SimTime,
    /// Earliest start of a blocked wait among `agents`.
    pub blocked_since: SimTime,
    pub agents:        Vec<AgentId>,
    pub components:    Vec<ComponentId>,
    pub cyclic:        bool,
}

/// A jittered duration came out negative (or non-finite) and was clipped to
/// zero.  Reported once per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeDurationWarning {
    pub time:      SimTime,
    pub component: ComponentId,
    pub agent:     AgentId,
    pub raw:       f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    Liveness(LivenessWarning),
    NegativeDuration(NegativeDurationWarning),
}

impl Anomaly {
    pub fn time(&self) -> SimTime {
        match self {
            Anomaly::Liveness(w) => w.time,
            Anomaly::NegativeDuration(w) => w.time,
        }
    }

    pub fn as_liveness(&self) -> Option<&LivenessWarning> {
        match self {
            Anomaly::Liveness(w) => Some(w),
            Anomaly::NegativeDuration(_) => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::Liveness(w) => {
                write!(f, "liveness at {}: ", w.time)?;
                write_list(f, &w.agents)?;
                f.write_str(if w.agents.len() == 1 { " waits for " } else { " wait for " })?;
                write_list(f, &w.components)?;
                if w.cyclic {
                    f.write_str(" (deadlock)")?;
                }
                Ok(())
            }
            Anomaly::NegativeDuration(w) => write!(
                f,
                "negative duration at {}: {} drew {:.3}s for {}, clipped to 0",
                w.time, w.component, w.raw, w.agent
            ),
        }
    }
}
