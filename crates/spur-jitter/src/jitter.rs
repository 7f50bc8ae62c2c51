//! Stateful jitter instances.

use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{LogNormal, Normal};

use spur_core::{StreamPosition, StreamRng};

use crate::{JitterError, JitterResult, JitterSpec};

/// Result of one [`Jitter::sample`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JitterSample {
    /// The usable, non-negative duration in seconds.
    pub value:   f64,
    /// The perturbed duration before clipping.  May be negative.
    pub raw:     f64,
    /// `true` when `raw < 0` and `value` was clipped to zero.
    pub clipped: bool,
}

/// Pre-built distribution for a validated spec.
#[derive(Clone, Copy, Debug)]
enum Sampler {
    Fixed,
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    LogNormal { dist: LogNormal<f64>, mean: f64 },
    Disruption { p: f64, delay: f64 },
}

impl Sampler {
    fn build(spec: &JitterSpec) -> JitterResult<Self> {
        spec.validate()?;
        Ok(match *spec {
            JitterSpec::Fixed => Sampler::Fixed,
            JitterSpec::Uniform { min, max } => Sampler::Uniform(Uniform::new_inclusive(min, max)),
            JitterSpec::Normal { mean, std_dev } => Sampler::Normal(
                Normal::new(mean, std_dev).map_err(|_| JitterError::InvalidStdDev(std_dev))?,
            ),
            JitterSpec::LogNormal { mean, std_dev } => {
                // Match the first two moments: a = 1 + cv², σ = √ln a, μ = ln(mean / √a).
                let a = 1.0 + (std_dev / mean).powi(2);
                let sigma = a.ln().sqrt();
                let mu = (mean / a.sqrt()).ln();
                let dist =
                    LogNormal::new(mu, sigma).map_err(|_| JitterError::InvalidStdDev(std_dev))?;
                Sampler::LogNormal { dist, mean }
            }
            JitterSpec::Disruption { p, delay } => Sampler::Disruption { p, delay },
        })
    }
}

/// A seeded jitter instance owning its RNG stream.
#[derive(Debug)]
pub struct Jitter {
    spec:    JitterSpec,
    sampler: Sampler,
    rng:     StreamRng,
}

impl Jitter {
    /// Build a jitter instance whose stream is derived from the run's global
    /// seed and `salt`.  Distinct salts give independent streams.
    pub fn new(spec: JitterSpec, global_seed: u64, salt: u64) -> JitterResult<Self> {
        Ok(Self {
            sampler: Sampler::build(&spec)?,
            spec,
            rng: StreamRng::new(global_seed, salt),
        })
    }

    /// A jitter instance that never perturbs.
    pub fn fixed() -> Self {
        Self {
            spec:    JitterSpec::Fixed,
            sampler: Sampler::Fixed,
            rng:     StreamRng::from_seed(0),
        }
    }

    pub fn spec(&self) -> &JitterSpec {
        &self.spec
    }

    /// Perturb `nominal` (seconds) and clip the result at zero.
    pub fn sample(&mut self, nominal: f64) -> JitterSample {
        let perturbation = match self.sampler {
            Sampler::Fixed => 0.0,
            Sampler::Uniform(dist) => self.rng.inner().sample(dist),
            Sampler::Normal(dist) => self.rng.inner().sample(dist),
            Sampler::LogNormal { dist, mean } => self.rng.inner().sample(dist) - mean,
            Sampler::Disruption { p, delay } => {
                if self.rng.unit_f64() < p { delay } else { 0.0 }
            }
        };
        let raw = nominal + perturbation;
        if raw < 0.0 {
            JitterSample { value: 0.0, raw, clipped: true }
        } else {
            JitterSample { value: raw, raw, clipped: false }
        }
    }

    /// Current RNG stream position, for snapshots.
    pub fn position(&self) -> StreamPosition {
        self.rng.position()
    }

    /// Continue from a previously captured stream position.
    pub fn restore(&mut self, position: StreamPosition) {
        self.rng = StreamRng::at(position);
    }
}
