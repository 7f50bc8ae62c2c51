//! Unit tests for spur-jitter.

use crate::{Jitter, JitterError, JitterSpec};

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod sampling {
    use super::*;

    #[test]
    fn fixed_returns_nominal() {
        let mut j = Jitter::new(JitterSpec::Fixed, 7, 0).unwrap();
        for _ in 0..10 {
            let s = j.sample(30.0);
            assert_eq!(s.value, 30.0);
            assert!(!s.clipped);
        }
    }

    #[test]
    fn fixed_consumes_no_randomness() {
        let mut j = Jitter::new(JitterSpec::Fixed, 7, 0).unwrap();
        let before = j.position();
        j.sample(5.0);
        assert_eq!(j.position(), before);
    }

    #[test]
    fn normal_mean_is_preserved_and_never_negative() {
        let mut j = Jitter::new(JitterSpec::Normal { mean: 0.0, std_dev: 5.0 }, 2024, 3).unwrap();
        let samples: Vec<f64> = (0..10_000).map(|_| j.sample(30.0).value).collect();
        let m = mean(&samples);
        // Standard error is 5 / √10 000 = 0.05; allow ~6 σ.
        assert!((m - 30.0).abs() < 0.3, "sample mean {m}");
        assert!(samples.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn heavy_negative_shift_is_clipped_to_zero() {
        let mut j = Jitter::new(JitterSpec::Normal { mean: -100.0, std_dev: 1.0 }, 1, 1).unwrap();
        for _ in 0..100 {
            let s = j.sample(30.0);
            assert!(s.clipped);
            assert_eq!(s.value, 0.0);
            assert!(s.raw < 0.0);
        }
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut j = Jitter::new(JitterSpec::symmetric(4.0), 11, 0).unwrap();
        for _ in 0..1_000 {
            let v = j.sample(10.0).value;
            assert!((6.0..=14.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn lognormal_perturbation_is_centred() {
        let mut j =
            Jitter::new(JitterSpec::LogNormal { mean: 60.0, std_dev: 10.0 }, 5, 9).unwrap();
        let samples: Vec<f64> = (0..20_000).map(|_| j.sample(100.0).raw).collect();
        let m = mean(&samples);
        assert!((m - 100.0).abs() < 0.5, "sample mean {m}");
    }

    #[test]
    fn disruption_extremes() {
        let mut never = Jitter::new(JitterSpec::Disruption { p: 0.0, delay: 50.0 }, 1, 0).unwrap();
        let mut always = Jitter::new(JitterSpec::Disruption { p: 1.0, delay: 50.0 }, 1, 0).unwrap();
        for _ in 0..100 {
            assert_eq!(never.sample(10.0).value, 10.0);
            assert_eq!(always.sample(10.0).value, 60.0);
        }
    }
}

#[cfg(test)]
mod determinism {
    use super::*;

    fn draw(seed: u64, salt: u64, n: usize) -> Vec<f64> {
        let mut j = Jitter::new(JitterSpec::Normal { mean: 0.0, std_dev: 3.0 }, seed, salt).unwrap();
        (0..n).map(|_| j.sample(20.0).raw).collect()
    }

    #[test]
    fn same_seed_same_sequence() {
        assert_eq!(draw(42, 1, 200), draw(42, 1, 200));
    }

    #[test]
    fn independent_streams() {
        assert_ne!(draw(42, 1, 20), draw(42, 2, 20));
        // Sampling stream 2 does not perturb stream 1.
        let mut a = Jitter::new(JitterSpec::symmetric(5.0), 42, 1).unwrap();
        let mut b = Jitter::new(JitterSpec::symmetric(5.0), 42, 2).unwrap();
        let mut a_alone = Jitter::new(JitterSpec::symmetric(5.0), 42, 1).unwrap();
        for _ in 0..50 {
            b.sample(1.0);
            assert_eq!(a.sample(1.0), a_alone.sample(1.0));
        }
    }

    #[test]
    fn restore_continues_stream() {
        let spec = JitterSpec::Normal { mean: 0.0, std_dev: 3.0 };
        let mut original = Jitter::new(spec, 8, 8).unwrap();
        for _ in 0..33 {
            original.sample(10.0);
        }
        let mut resumed = Jitter::new(spec, 8, 8).unwrap();
        resumed.restore(original.position());
        for _ in 0..100 {
            assert_eq!(original.sample(10.0), resumed.sample(10.0));
        }
    }
}

#[cfg(test)]
mod validation {
    use super::*;

    #[test]
    fn rejects_inverted_uniform() {
        let err = Jitter::new(JitterSpec::Uniform { min: 5.0, max: 1.0 }, 0, 0).unwrap_err();
        assert_eq!(err, JitterError::InvertedBounds { min: 5.0, max: 1.0 });
    }

    #[test]
    fn rejects_bad_probability() {
        assert!(matches!(
            JitterSpec::Disruption { p: 1.5, delay: 1.0 }.validate(),
            Err(JitterError::NotAProbability(_))
        ));
    }

    #[test]
    fn rejects_negative_std_dev() {
        assert!(matches!(
            JitterSpec::Normal { mean: 0.0, std_dev: -1.0 }.validate(),
            Err(JitterError::InvalidStdDev(_))
        ));
    }

    #[test]
    fn rejects_non_positive_lognormal_mean() {
        assert!(matches!(
            JitterSpec::LogNormal { mean: 0.0, std_dev: 1.0 }.validate(),
            Err(JitterError::NonPositiveMean(_))
        ));
    }

    #[test]
    fn symmetric_helper_and_default() {
        let spec = JitterSpec::symmetric(2.0);
        assert_eq!(spec, JitterSpec::Uniform { min: -2.0, max: 2.0 });
        assert!(JitterSpec::default().is_fixed());
    }
}
