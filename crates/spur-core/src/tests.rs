//! Unit tests for spur-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, ComponentId, RouteId, TourId};

    #[test]
    fn index_roundtrip() {
        let id = ComponentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(ComponentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(AgentId(0) < AgentId(1));
        assert!(RouteId(100) > RouteId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(TourId::default(), TourId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "train#7");
        assert_eq!(ComponentId(3).to_string(), "comp#3");
    }
}

#[cfg(test)]
mod time {
    use crate::{RunConfig, SimTime};

    #[test]
    fn time_arithmetic() {
        let t = SimTime(10);
        assert_eq!(t + 5, SimTime(15));
        assert_eq!(t.offset(3), SimTime(13));
        assert_eq!(SimTime(15) - SimTime(10), 5u64);
    }

    #[test]
    fn since_saturates() {
        assert_eq!(SimTime(3).since(SimTime(10)), 0);
    }

    #[test]
    fn secs_from_f64_rounds_and_clips() {
        assert_eq!(SimTime::secs_from_f64(29.5), 30);
        assert_eq!(SimTime::secs_from_f64(29.49), 29);
        assert_eq!(SimTime::secs_from_f64(-4.0), 0);
        assert_eq!(SimTime::secs_from_f64(f64::NAN), 0);
    }

    #[test]
    fn end_time_check() {
        let mut cfg = RunConfig::with_seed(1);
        assert!(!cfg.is_past_end(SimTime(1_000_000)));
        cfg.end_time = Some(SimTime(100));
        assert!(!cfg.is_past_end(SimTime(100)));
        assert!(cfg.is_past_end(SimTime(101)));
    }
}

#[cfg(test)]
mod rng {
    use crate::{derive_seed, StreamRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = StreamRng::new(12345, 0);
        let mut r2 = StreamRng::new(12345, 0);
        for _ in 0..100 {
            assert_eq!(r1.unit_f64(), r2.unit_f64());
        }
    }

    #[test]
    fn different_salts_differ() {
        assert_ne!(derive_seed(1, 0), derive_seed(1, 1));
        let mut r0 = StreamRng::new(1, 0);
        let mut r1 = StreamRng::new(1, 1);
        assert_ne!(r0.unit_f64(), r1.unit_f64(), "adjacent streams should diverge");
    }

    #[test]
    fn unit_in_bounds() {
        let mut rng = StreamRng::new(0, 0);
        for _ in 0..1000 {
            let v = rng.unit_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn restore_from_position_continues_stream() {
        let mut original = StreamRng::new(99, 4);
        for _ in 0..17 {
            original.unit_f64();
        }
        let mut resumed = StreamRng::at(original.position());
        for _ in 0..50 {
            assert_eq!(original.unit_f64(), resumed.unit_f64());
        }
    }
}
