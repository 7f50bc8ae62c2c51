//! `spur-jitter`: seeded perturbation of nominal durations.
//!
//! A [`Jitter`] turns a nominal duration (seconds, as produced by a
//! component's service model) into a perturbed, non-negative duration:
//!
//! ```text
//! raw   = nominal + perturbation(spec, rng)
//! value = max(raw, 0)            // `clipped` is set when raw < 0
//! ```
//!
//! Every instance owns its own RNG stream (see [`spur_core::StreamRng`]), so
//! the n-th sample of a component depends only on the run seed, the
//! component's stream salt, and n; never on how other components were
//! sampled in between.
//!
//! | Kind         | Perturbation                                             |
//! |--------------|----------------------------------------------------------|
//! | `fixed`      | 0 (no RNG draws)                                         |
//! | `uniform`    | U(min, max)                                              |
//! | `normal`     | N(mean, std_dev)                                         |
//! | `log_normal` | LogNormal with the given mean/std dev, minus the mean    |
//! | `disruption` | `delay` with probability `p`, else 0                     |

pub mod error;
pub mod jitter;
pub mod spec;

#[cfg(test)]
mod tests;

pub use error::{JitterError, JitterResult};
pub use jitter::{Jitter, JitterSample};
pub use spec::JitterSpec;
