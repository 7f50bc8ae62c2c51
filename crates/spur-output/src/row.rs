//! Flat row types written by output backends.

use serde::Serialize;

use spur_sim::{Anomaly, TraceRecord};

/// One transition of the kernel trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRow {
    pub time:      u64,
    /// Sequence id of the event that caused the transition.
    pub event:     u64,
    pub agent:     Option<u32>,
    pub component: Option<u32>,
    pub kind:      &'static str,
}

impl From<&TraceRecord> for TransitionRow {
    fn from(r: &TraceRecord) -> Self {
        Self {
            time:      r.time.0,
            event:     r.event.0,
            agent:     r.agent.map(|a| a.0),
            component: r.component.map(|c| c.0),
            kind:      r.kind.as_str(),
        }
    }
}

/// One anomaly.  Agent and component lists are `;`-separated ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRow {
    pub time:          u64,
    pub kind:          &'static str,
    pub agents:        String,
    pub components:    String,
    /// Liveness: whether the wait-for chain closes on itself.
    pub cyclic:        Option<bool>,
    /// Liveness: when the reported agent started waiting.
    pub blocked_since: Option<u64>,
    /// Negative duration: the unclipped sample.
    pub raw_secs:      Option<f64>,
}

fn join<T: Copy>(ids: &[T], to_u32: impl Fn(T) -> u32) -> String {
    ids.iter().map(|&id| to_u32(id).to_string()).collect::<Vec<_>>().join(";")
}

impl From<&Anomaly> for AnomalyRow {
    fn from(a: &Anomaly) -> Self {
        match a {
            Anomaly::Liveness(w) => Self {
                time:          w.time.0,
                kind:          "liveness",
                agents:        join(&w.agents, |id| id.0),
                components:    join(&w.components, |id| id.0),
                cyclic:        Some(w.cyclic),
                blocked_since: Some(w.blocked_since.0),
                raw_secs:      None,
            },
            Anomaly::NegativeDuration(w) => Self {
                time:          w.time.0,
                kind:          "negative_duration",
                agents:        w.agent.0.to_string(),
                components:    w.component.0.to_string(),
                cyclic:        None,
                blocked_since: None,
                raw_secs:      Some(w.raw),
            },
        }
    }
}
