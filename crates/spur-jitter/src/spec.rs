//! Serializable jitter descriptions.

use serde::{Deserialize, Serialize};

use crate::{JitterError, JitterResult};

/// The distribution kind and parameters of a jitter instance.
///
/// Deserializes from an internally tagged object, e.g.
/// `{"kind": "normal", "mean": 0.0, "std_dev": 5.0}`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JitterSpec {
    /// No perturbation.
    #[default]
    #[serde(alias = "none")]
    Fixed,
    /// Uniform perturbation in `[min, max]`.
    Uniform { min: f64, max: f64 },
    /// Gaussian perturbation.
    Normal { mean: f64, std_dev: f64 },
    /// Log-normally distributed duration with the given mean and standard
    /// deviation, re-centred on zero.
    LogNormal { mean: f64, std_dev: f64 },
    /// A fixed `delay` applied with probability `p`.
    Disruption { p: f64, delay: f64 },
}

impl JitterSpec {
    /// Uniform perturbation in `[-spread, +spread]`.
    pub fn symmetric(spread: f64) -> Self {
        let spread = spread.abs();
        JitterSpec::Uniform { min: -spread, max: spread }
    }

    /// `true` if sampling never consumes randomness.
    pub fn is_fixed(&self) -> bool {
        matches!(self, JitterSpec::Fixed)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> JitterResult<()> {
        match *self {
            JitterSpec::Fixed => Ok(()),
            JitterSpec::Uniform { min, max } => {
                finite("min", min)?;
                finite("max", max)?;
                if min > max {
                    return Err(JitterError::InvertedBounds { min, max });
                }
                Ok(())
            }
            JitterSpec::Normal { mean, std_dev } => {
                finite("mean", mean)?;
                std_dev_ok(std_dev)
            }
            JitterSpec::LogNormal { mean, std_dev } => {
                finite("mean", mean)?;
                if mean <= 0.0 {
                    return Err(JitterError::NonPositiveMean(mean));
                }
                std_dev_ok(std_dev)
            }
            JitterSpec::Disruption { p, delay } => {
                finite("delay", delay)?;
                if !(0.0..=1.0).contains(&p) {
                    return Err(JitterError::NotAProbability(p));
                }
                Ok(())
            }
        }
    }
}

fn finite(name: &'static str, v: f64) -> JitterResult<()> {
    if v.is_finite() { Ok(()) } else { Err(JitterError::NonFinite(name)) }
}

fn std_dev_ok(std_dev: f64) -> JitterResult<()> {
    if std_dev.is_finite() && std_dev >= 0.0 {
        Ok(())
    } else {
        Err(JitterError::InvalidStdDev(std_dev))
    }
}
