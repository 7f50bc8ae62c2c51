//! Service sub-models: how long an agent holds a component.
//!
//! A [`ServiceModel`] produces the *nominal* duration of one service episode.
//! Jitter is applied on top by the network, never by the model itself, so
//! models stay deterministic functions of their inputs and internal state.
//!
//! Built-in models are described declaratively by [`ServiceSpec`] so they can
//! be loaded from JSON config.  Custom models implement the trait directly and
//! are registered with
//! [`NetworkBuilder::add_component_with_model`][crate::NetworkBuilder::add_component_with_model].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use spur_core::{AgentId, ComponentId, SimTime};

use crate::StopParams;

// ── ServiceContext ────────────────────────────────────────────────────────────

/// Read-only inputs handed to [`ServiceModel::nominal_duration`].
#[derive(Debug, Clone, Copy)]
pub struct ServiceContext<'a> {
    /// Time at which service begins.
    pub now:       SimTime,
    pub agent:     AgentId,
    pub component: ComponentId,
    /// Parameters of the itinerary stop being served.
    pub stop:      &'a StopParams,
}

impl ServiceContext<'_> {
    /// `true` when the stop carries a scheduled departure, i.e. the agent
    /// halts here rather than running through.
    #[inline]
    pub fn is_stopping(&self) -> bool {
        self.stop.departure.is_some()
    }
}

// ── ServiceModel trait ────────────────────────────────────────────────────────

/// Pluggable per-component service-duration model.
///
/// Only [`nominal_duration`][Self::nominal_duration] is required.  Stateful
/// models (e.g. [`HeadwayStation`]) override `save_state`/`load_state` so the
/// model can be captured in a snapshot and restored on resume.
///
/// Returning a negative or non-finite duration is allowed; the network clips
/// it to zero and the kernel reports the clip once per component.
pub trait ServiceModel: Send + fmt::Debug + 'static {
    /// Nominal service duration in seconds for the episode described by `ctx`.
    fn nominal_duration(&mut self, ctx: &ServiceContext<'_>) -> f64;

    /// Short identifier used in logs.
    fn kind(&self) -> &'static str;

    /// Serialisable internal state.  Default: stateless.
    fn save_state(&self) -> Value {
        Value::Null
    }

    /// Restore state produced by [`save_state`][Self::save_state].
    fn load_state(&mut self, _state: &Value) -> Result<(), String> {
        Ok(())
    }
}

// ── Built-in models ───────────────────────────────────────────────────────────

/// Constant duration, e.g. a timed track section or crossover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDuration {
    pub secs: f64,
}

impl ServiceModel for FixedDuration {
    fn nominal_duration(&mut self, _ctx: &ServiceContext<'_>) -> f64 {
        self.secs
    }

    fn kind(&self) -> &'static str {
        "fixed"
    }
}

/// Track section traversed at a constant speed: `length / speed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Traversal {
    pub length: f64,
    pub speed:  f64,
}

impl ServiceModel for Traversal {
    fn nominal_duration(&mut self, _ctx: &ServiceContext<'_>) -> f64 {
        self.length / self.speed
    }

    fn kind(&self) -> &'static str {
        "traversal"
    }
}

/// Platform dwell driven by mean passenger counts.
///
/// Dwell = `2 + 0.4 · boarding + 0.4 · alighting` seconds.  When
/// `bypass_secs` is set, agents whose stop has no scheduled departure run
/// through in `bypass_secs` instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellStation {
    pub mean_boarding:  f64,
    pub mean_alighting: f64,
    pub bypass_secs:    Option<f64>,
}

impl DwellStation {
    pub const BASE_SECS:          f64 = 2.0;
    pub const SECS_PER_PASSENGER: f64 = 0.4;
}

impl ServiceModel for DwellStation {
    fn nominal_duration(&mut self, ctx: &ServiceContext<'_>) -> f64 {
        match self.bypass_secs {
            Some(bypass) if !ctx.is_stopping() => bypass,
            _ => {
                Self::BASE_SECS
                    + Self::SECS_PER_PASSENGER * (self.mean_boarding + self.mean_alighting)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "dwell_station"
    }
}

/// Platform whose dwell grows with the headway since the previous train.
///
/// Passengers accumulate at `boarding_rate` / `alighting_rate` per second
/// between trains; dwell is `intercept + boarding_slope · boarding +
/// alighting_slope · alighting`.  The first train served uses
/// `first_train_dwell`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadwayStation {
    pub boarding_rate:     f64,
    pub alighting_rate:    f64,
    pub boarding_slope:    f64,
    pub alighting_slope:   f64,
    pub intercept:         f64,
    pub first_train_dwell: f64,
    last_service:          Option<SimTime>,
}

impl HeadwayStation {
    pub fn new(
        boarding_rate:     f64,
        alighting_rate:    f64,
        boarding_slope:    f64,
        alighting_slope:   f64,
        intercept:         f64,
        first_train_dwell: f64,
    ) -> Self {
        Self {
            boarding_rate,
            alighting_rate,
            boarding_slope,
            alighting_slope,
            intercept,
            first_train_dwell,
            last_service: None,
        }
    }

    /// Start time of the most recent service episode, if any.
    pub fn last_service(&self) -> Option<SimTime> {
        self.last_service
    }
}

impl ServiceModel for HeadwayStation {
    fn nominal_duration(&mut self, ctx: &ServiceContext<'_>) -> f64 {
        let dwell = match self.last_service {
            None => self.first_train_dwell,
            Some(prev) => {
                let headway   = ctx.now.since(prev) as f64;
                let boarding  = self.boarding_rate * headway;
                let alighting = self.alighting_rate * headway;
                self.intercept + self.boarding_slope * boarding + self.alighting_slope * alighting
            }
        };
        self.last_service = Some(ctx.now);
        dwell
    }

    fn kind(&self) -> &'static str {
        "headway_station"
    }

    fn save_state(&self) -> Value {
        serde_json::to_value(self.last_service).unwrap_or(Value::Null)
    }

    fn load_state(&mut self, state: &Value) -> Result<(), String> {
        self.last_service = serde_json::from_value(state.clone()).map_err(|e| e.to_string())?;
        Ok(())
    }
}

// ── ServiceSpec ───────────────────────────────────────────────────────────────

/// Declarative description of a built-in [`ServiceModel`].
///
/// JSON shape: `{"model": "traversal", "length": 1200.0, "speed": 20.0}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ServiceSpec {
    /// Constant duration in seconds.
    Fixed { secs: f64 },
    /// Storage yard: zero service time.
    #[default]
    Yard,
    Traversal { length: f64, speed: f64 },
    DwellStation {
        mean_boarding:  f64,
        mean_alighting: f64,
        #[serde(default)]
        bypass_secs:    Option<f64>,
    },
    HeadwayStation {
        boarding_rate:     f64,
        alighting_rate:    f64,
        #[serde(default = "default_slope")]
        boarding_slope:    f64,
        #[serde(default = "default_slope")]
        alighting_slope:   f64,
        #[serde(default)]
        intercept:         f64,
        first_train_dwell: f64,
    },
}

fn default_slope() -> f64 {
    DwellStation::SECS_PER_PASSENGER
}

impl ServiceSpec {
    /// Check parameters and instantiate the model.
    ///
    /// Returns the reason on failure; the caller attaches the component name.
    pub fn build(&self) -> Result<Box<dyn ServiceModel>, String> {
        fn finite(name: &str, v: f64) -> Result<f64, String> {
            if v.is_finite() { Ok(v) } else { Err(format!("{name} must be finite, got {v}")) }
        }
        fn non_negative(name: &str, v: f64) -> Result<f64, String> {
            if finite(name, v)? >= 0.0 { Ok(v) } else { Err(format!("{name} must be >= 0, got {v}")) }
        }

        Ok(match *self {
            ServiceSpec::Fixed { secs } => Box::new(FixedDuration { secs: non_negative("secs", secs)? }),
            ServiceSpec::Yard => Box::new(FixedDuration { secs: 0.0 }),
            ServiceSpec::Traversal { length, speed } => {
                non_negative("length", length)?;
                if finite("speed", speed)? <= 0.0 {
                    return Err(format!("speed must be > 0, got {speed}"));
                }
                Box::new(Traversal { length, speed })
            }
            ServiceSpec::DwellStation { mean_boarding, mean_alighting, bypass_secs } => {
                non_negative("mean_boarding", mean_boarding)?;
                non_negative("mean_alighting", mean_alighting)?;
                if let Some(b) = bypass_secs {
                    non_negative("bypass_secs", b)?;
                }
                Box::new(DwellStation { mean_boarding, mean_alighting, bypass_secs })
            }
            ServiceSpec::HeadwayStation {
                boarding_rate,
                alighting_rate,
                boarding_slope,
                alighting_slope,
                intercept,
                first_train_dwell,
            } => {
                non_negative("boarding_rate", boarding_rate)?;
                non_negative("alighting_rate", alighting_rate)?;
                finite("boarding_slope", boarding_slope)?;
                finite("alighting_slope", alighting_slope)?;
                finite("intercept", intercept)?;
                non_negative("first_train_dwell", first_train_dwell)?;
                Box::new(HeadwayStation::new(
                    boarding_rate,
                    alighting_rate,
                    boarding_slope,
                    alighting_slope,
                    intercept,
                    first_train_dwell,
                ))
            }
        })
    }
}
