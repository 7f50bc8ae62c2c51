//! Routes: immutable ordered sequences of components with per-edge parameters.

use serde::{Deserialize, Serialize};

use spur_core::{ComponentId, RouteId, SimTime};
use spur_jitter::JitterSpec;

/// Per-stop parameters attached to one edge of a route.
///
/// Every field is optional; an empty `StopParams` means "use the component's
/// own service model and jitter, with no timetable holds".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopParams {
    /// Nominal service duration override in seconds.  Bypasses the
    /// component's service model.
    pub duration:  Option<f64>,
    /// Jitter override for this edge only.
    pub jitter:    Option<JitterSpec>,
    /// Earliest time the agent may request this component.
    pub arrival:   Option<SimTime>,
    /// Earliest time the agent may leave this component.
    pub departure: Option<SimTime>,
}

impl StopParams {
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    pub fn with_jitter(mut self, jitter: JitterSpec) -> Self {
        self.jitter = Some(jitter);
        self
    }

    pub fn with_arrival(mut self, at: SimTime) -> Self {
        self.arrival = Some(at);
        self
    }

    pub fn with_departure(mut self, at: SimTime) -> Self {
        self.departure = Some(at);
        self
    }

    /// Combine the closing stop of one route with the opening stop of the
    /// next.  The arrival hold comes from the earlier route, the departure
    /// hold and service overrides prefer the later one.
    pub fn merge_junction(ending: &StopParams, starting: &StopParams) -> StopParams {
        StopParams {
            duration:  starting.duration.or(ending.duration),
            jitter:    starting.jitter.or(ending.jitter),
            arrival:   ending.arrival.or(starting.arrival),
            departure: starting.departure.or(ending.departure),
        }
    }
}

/// One stop on a route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub component: ComponentId,
    pub params:    StopParams,
}

/// Immutable ordered sequence of at least one component.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    id:    RouteId,
    name:  String,
    stops: Vec<RouteStop>,
}

impl Route {
    pub(crate) fn new(id: RouteId, name: String, stops: Vec<RouteStop>) -> Self {
        debug_assert!(!stops.is_empty());
        Self { id, name, stops }
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[RouteStop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always `false`: empty routes are rejected at build time.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn first(&self) -> &RouteStop {
        &self.stops[0]
    }

    pub fn last(&self) -> &RouteStop {
        &self.stops[self.stops.len() - 1]
    }
}
