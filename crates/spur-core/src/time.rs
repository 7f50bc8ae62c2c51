//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically non-decreasing count of simulated seconds held in
//! a `SimTime`.  Integer seconds keep event ordering exact: two events either
//! share a timestamp (and are then ordered by insertion sequence) or they do
//! not, with no floating-point drift in between.
//!
//! Stochastic durations are sampled as `f64` by the jitter layer and rounded
//! to whole seconds before they reach the clock.

use std::fmt;

// ── SimTime ──────────────────────────────────────────────────────────────────

/// An absolute simulation timestamp in seconds since the start of the run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Return the time `secs` seconds after `self`.
    #[inline]
    pub fn offset(self, secs: u64) -> SimTime {
        SimTime(self.0.saturating_add(secs))
    }

    /// Seconds elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Round a non-negative duration in seconds to the clock resolution.
    ///
    /// Negative and non-finite inputs map to zero.
    #[inline]
    pub fn secs_from_f64(secs: f64) -> u64 {
        if secs.is_finite() && secs > 0.0 {
            secs.round() as u64
        } else {
            0
        }
    }
}

impl std::ops::Add<u64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: u64) -> SimTime {
        self.offset(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: SimTime) -> u64 {
        self.since(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

// ── AdmissionPolicy ──────────────────────────────────────────────────────────

/// Who gets a freed slot first when a component's occupancy shrinks.
///
/// `WaitQueueFirst` serves agents queued to *enter the network* at this
/// component before agents already occupying an upstream block and waiting
/// to hand off into it.  `HandoffFirst` reverses that order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AdmissionPolicy {
    #[default]
    WaitQueueFirst,
    HandoffFirst,
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically loaded from a JSON model description by `spur-sim` and passed
/// to the model builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    /// Master RNG seed.  The same seed always produces an identical trace.
    pub seed: u64,

    /// Stop dispatching once the next event lies beyond this time.
    /// `None` runs until the event queue is exhausted.
    pub end_time: Option<SimTime>,

    /// An agent blocked on a hand-off for longer than this many seconds is
    /// reported with a liveness warning.
    pub liveness_horizon_secs: u64,

    /// Slot allocation order between queued entrants and hand-off claimants.
    pub admission: AdmissionPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed:                  0,
            end_time:              None,
            liveness_horizon_secs: 3_600,
            admission:             AdmissionPolicy::WaitQueueFirst,
        }
    }
}

impl RunConfig {
    /// Default configuration with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }

    /// `true` if `time` is past the configured end of the run.
    #[inline]
    pub fn is_past_end(&self, time: SimTime) -> bool {
        self.end_time.is_some_and(|end| time > end)
    }
}
