//! Unit tests for spur-network.

#[cfg(test)]
mod helpers {
    use spur_core::ComponentId;
    use spur_jitter::Jitter;

    use crate::{Component, FixedDuration, QueueDiscipline};

    pub fn component(capacity: u32, discipline: QueueDiscipline) -> Component {
        Component::new(
            ComponentId(0),
            "C",
            capacity,
            discipline,
            Box::new(FixedDuration { secs: 30.0 }),
            Jitter::fixed(),
        )
        .unwrap()
    }
}

// ── Component protocol ─────────────────────────────────────────────────────────

#[cfg(test)]
mod component {
    use spur_core::{AdmissionPolicy, AgentId};

    use super::helpers::component;
    use crate::{Admission, Claimant, NetworkError, QueueDiscipline};

    const A: AgentId = AgentId(0);
    const B: AgentId = AgentId(1);
    const C: AgentId = AgentId(2);

    #[test]
    fn admits_up_to_capacity_then_queues() {
        let mut c = component(2, QueueDiscipline::Fifo);
        assert_eq!(c.request(A, 0).unwrap(), Admission::Admitted);
        assert_eq!(c.request(B, 0).unwrap(), Admission::Admitted);
        assert_eq!(c.request(C, 0).unwrap(), Admission::Queued);
        assert_eq!(c.occupants(), &[A, B]);
        assert_eq!(c.wait_queue().collect::<Vec<_>>(), vec![C]);
        c.check_invariants().unwrap();
    }

    #[test]
    fn zero_capacity_is_rejected() {
        use spur_core::ComponentId;
        use spur_jitter::Jitter;
        let err = crate::Component::new(
            ComponentId(0),
            "empty",
            0,
            QueueDiscipline::Fifo,
            Box::new(crate::FixedDuration { secs: 1.0 }),
            Jitter::fixed(),
        )
        .unwrap_err();
        assert!(matches!(err, NetworkError::ZeroCapacity { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn duplicate_request_is_rejected() {
        let mut c = component(1, QueueDiscipline::Fifo);
        c.request(A, 0).unwrap();
        let err = c.request(A, 0).unwrap_err();
        assert!(matches!(err, NetworkError::AgentAlreadyPresent { .. }));
        assert!(!err.is_configuration());

        c.request(B, 0).unwrap();
        assert!(c.request_handoff(B, 0).is_err());
    }

    #[test]
    fn vacate_requires_occupancy() {
        let mut c = component(1, QueueDiscipline::Fifo);
        assert!(matches!(c.vacate(A), Err(NetworkError::NotAnOccupant { .. })));
        c.request(A, 0).unwrap();
        c.vacate(A).unwrap();
        assert!(c.occupants().is_empty());
    }

    #[test]
    fn vacate_does_not_promote_by_itself() {
        let mut c = component(1, QueueDiscipline::Fifo);
        c.request(A, 0).unwrap();
        c.request(B, 0).unwrap();
        c.vacate(A).unwrap();
        // Transiently stalled until the caller drives promotion.
        assert!(matches!(c.check_invariants(), Err(NetworkError::StalledQueue { .. })));
        assert_eq!(c.promote(AdmissionPolicy::WaitQueueFirst).unwrap(), Some(Claimant::Entrant(B)));
        assert_eq!(c.occupants(), &[B]);
        c.check_invariants().unwrap();
    }

    #[test]
    fn wait_queue_first_policy() {
        let mut c = component(1, QueueDiscipline::Fifo);
        c.request(A, 0).unwrap();
        assert_eq!(c.request_handoff(B, 0).unwrap(), Admission::HandoffWait);
        assert_eq!(c.request(C, 0).unwrap(), Admission::Queued);
        c.vacate(A).unwrap();
        assert_eq!(c.next_claimant(AdmissionPolicy::WaitQueueFirst), Some(Claimant::Entrant(C)));
        assert_eq!(c.next_claimant(AdmissionPolicy::HandoffFirst), Some(Claimant::Handoff(B)));
    }

    #[test]
    fn handoff_first_policy_admits_handoff_claimant() {
        let mut c = component(1, QueueDiscipline::Fifo);
        c.request(A, 0).unwrap();
        c.request(C, 0).unwrap();
        c.request_handoff(B, 0).unwrap();
        c.vacate(A).unwrap();
        let claimant = c.promote(AdmissionPolicy::HandoffFirst).unwrap();
        assert_eq!(claimant, Some(Claimant::Handoff(B)));
        assert_eq!(claimant.map(Claimant::agent), Some(B));
        assert_eq!(c.wait_queue().collect::<Vec<_>>(), vec![C]);
    }

    #[test]
    fn priority_discipline_orders_by_priority_then_arrival() {
        let mut c = component(1, QueueDiscipline::Priority);
        c.request(AgentId(9), 0).unwrap();
        c.request(A, 1).unwrap();
        c.request(B, 5).unwrap();
        c.request(C, 1).unwrap();
        assert_eq!(c.wait_queue().collect::<Vec<_>>(), vec![B, A, C]);
    }

    #[test]
    fn fifo_ignores_priority() {
        let mut c = component(1, QueueDiscipline::Fifo);
        c.request(AgentId(9), 0).unwrap();
        c.request(A, 1).unwrap();
        c.request(B, 5).unwrap();
        assert_eq!(c.wait_queue().collect::<Vec<_>>(), vec![A, B]);
    }

    #[test]
    fn withdraw_removes_from_either_line() {
        let mut c = component(1, QueueDiscipline::Fifo);
        c.request(A, 0).unwrap();
        c.request(B, 0).unwrap();
        c.request_handoff(C, 0).unwrap();
        assert!(c.withdraw(C));
        assert!(c.withdraw(B));
        assert!(!c.withdraw(B));
        assert!(!c.is_waiting(B));
    }

    #[test]
    fn closed_component_admits_nobody() {
        let mut c = component(2, QueueDiscipline::Fifo);
        c.close();
        assert_eq!(c.request(A, 0).unwrap(), Admission::Queued);
        assert_eq!(c.promote(AdmissionPolicy::WaitQueueFirst).unwrap(), None);
        c.check_invariants().unwrap();
        c.open();
        assert_eq!(c.promote(AdmissionPolicy::WaitQueueFirst).unwrap(), Some(Claimant::Entrant(A)));
        assert_eq!(c.admitted_total(), 1);
    }

    #[test]
    fn state_restores_queues_and_occupants() {
        let mut c = component(1, QueueDiscipline::Fifo);
        c.request(A, 0).unwrap();
        c.request(B, 3).unwrap();
        c.request_handoff(C, 0).unwrap();
        let saved = c.state();

        let mut fresh = component(1, QueueDiscipline::Fifo);
        fresh.restore(&saved).unwrap();
        assert_eq!(fresh.state(), saved);
        assert_eq!(fresh.occupants(), &[A]);
        assert_eq!(fresh.handoff_queue().collect::<Vec<_>>(), vec![C]);
    }
}

// ── Service models ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod service {
    use spur_core::{AgentId, ComponentId, SimTime};

    use crate::{
        DwellStation, HeadwayStation, ServiceContext, ServiceModel, ServiceSpec, StopParams,
        Traversal,
    };

    fn ctx(now: u64, stop: &StopParams) -> ServiceContext<'_> {
        ServiceContext { now: SimTime(now), agent: AgentId(0), component: ComponentId(0), stop }
    }

    #[test]
    fn traversal_is_length_over_speed() {
        let mut m = Traversal { length: 1200.0, speed: 20.0 };
        assert_eq!(m.nominal_duration(&ctx(0, &StopParams::default())), 60.0);
    }

    #[test]
    fn dwell_station_formula() {
        let mut m = DwellStation { mean_boarding: 10.0, mean_alighting: 5.0, bypass_secs: None };
        let d = m.nominal_duration(&ctx(0, &StopParams::default()));
        assert!((d - 8.0).abs() < 1e-9);
    }

    #[test]
    fn dwell_station_bypass_only_without_departure() {
        let mut m = DwellStation { mean_boarding: 10.0, mean_alighting: 5.0, bypass_secs: Some(3.0) };
        let through = StopParams::default();
        let halt    = StopParams::default().with_departure(SimTime(100));
        assert_eq!(m.nominal_duration(&ctx(0, &through)), 3.0);
        assert!((m.nominal_duration(&ctx(0, &halt)) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn headway_station_uses_time_since_previous_train() {
        let mut m = HeadwayStation::new(0.5, 0.25, 0.4, 0.4, 2.0, 45.0);
        let stop = StopParams::default();
        assert_eq!(m.nominal_duration(&ctx(100, &stop)), 45.0);
        // 60 s headway: 30 boarding, 15 alighting → 2 + 12 + 6.
        let d = m.nominal_duration(&ctx(160, &stop));
        assert!((d - 20.0).abs() < 1e-9);
        assert_eq!(m.last_service(), Some(SimTime(160)));
    }

    #[test]
    fn headway_station_state_roundtrip() {
        let mut m = HeadwayStation::new(0.5, 0.25, 0.4, 0.4, 2.0, 45.0);
        m.nominal_duration(&ctx(100, &StopParams::default()));
        let saved = m.save_state();

        let mut fresh = HeadwayStation::new(0.5, 0.25, 0.4, 0.4, 2.0, 45.0);
        fresh.load_state(&saved).unwrap();
        assert_eq!(fresh.last_service(), Some(SimTime(100)));
        assert!(fresh.load_state(&serde_json::json!("nonsense")).is_err());
    }

    #[test]
    fn spec_validation() {
        assert!(ServiceSpec::Traversal { length: 100.0, speed: 0.0 }.build().is_err());
        assert!(ServiceSpec::Fixed { secs: -1.0 }.build().is_err());
        assert!(ServiceSpec::Fixed { secs: f64::NAN }.build().is_err());
        assert_eq!(ServiceSpec::Yard.build().unwrap().kind(), "fixed");
        assert_eq!(ServiceSpec::default(), ServiceSpec::Yard);
    }

    #[test]
    fn spec_json_shape() {
        let spec: ServiceSpec =
            serde_json::from_str(r#"{"model":"traversal","length":1200.0,"speed":20.0}"#).unwrap();
        assert_eq!(spec, ServiceSpec::Traversal { length: 1200.0, speed: 20.0 });

        let spec: ServiceSpec = serde_json::from_str(
            r#"{"model":"headway_station","boarding_rate":0.5,"alighting_rate":0.2,"first_train_dwell":30.0}"#,
        )
        .unwrap();
        assert!(matches!(spec, ServiceSpec::HeadwayStation { boarding_slope, .. } if boarding_slope == 0.4));
    }
}

// ── Builder, routes and tours ──────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use spur_core::{AgentId, SimTime};
    use spur_jitter::JitterSpec;

    use crate::{ComponentDef, NetworkBuilder, NetworkError, ServiceSpec, StopParams};

    fn fixed(name: &str, secs: f64) -> ComponentDef {
        ComponentDef::new(name, 1, ServiceSpec::Fixed { secs })
    }

    #[test]
    fn duplicate_component_name_rejected() {
        let mut b = NetworkBuilder::new(1);
        b.add_component(fixed("A", 1.0)).unwrap();
        let err = b.add_component(fixed("A", 2.0)).unwrap_err();
        assert!(matches!(err, NetworkError::DuplicateName { kind: "component", .. }));
    }

    #[test]
    fn empty_and_repeating_routes_rejected() {
        let mut b = NetworkBuilder::new(1);
        let a = b.add_component(fixed("A", 1.0)).unwrap();
        assert!(matches!(b.add_route("r", vec![]), Err(NetworkError::EmptyRoute(_))));
        let err = b
            .add_route("r", vec![(a, StopParams::default()), (a, StopParams::default())])
            .unwrap_err();
        assert!(matches!(err, NetworkError::RepeatedStop { .. }));
    }

    #[test]
    fn invalid_jitter_rejected() {
        let mut b = NetworkBuilder::new(1);
        let bad = fixed("A", 1.0).with_jitter(JitterSpec::Uniform { min: 5.0, max: 1.0 });
        assert!(matches!(b.add_component(bad), Err(NetworkError::InvalidJitter { .. })));
    }

    #[test]
    fn tour_merges_junction_components() {
        let mut b = NetworkBuilder::new(1);
        let a = b.add_component(fixed("A", 1.0)).unwrap();
        let c = b.add_component(fixed("C", 1.0)).unwrap();
        let d = b.add_component(fixed("D", 1.0)).unwrap();
        let out = b
            .add_route("out", vec![
                (a, StopParams::default()),
                (c, StopParams::default().with_arrival(SimTime(50))),
            ])
            .unwrap();
        let back = b
            .add_route("on", vec![
                (c, StopParams::default().with_departure(SimTime(90))),
                (d, StopParams::default()),
            ])
            .unwrap();
        let t = b.add_tour("day", vec![out, back]).unwrap();
        let net = b.build().unwrap();

        let stops = net.itinerary(t).unwrap();
        let comps: Vec<_> = stops.iter().map(|s| s.component).collect();
        assert_eq!(comps, vec![a, c, d]);
        assert_eq!(stops[1].params.arrival, Some(SimTime(50)));
        assert_eq!(stops[1].params.departure, Some(SimTime(90)));
        assert_eq!(net.tour_id("day"), Some(t));
        assert_eq!(net.tour(t).unwrap().routes(), &[out, back]);
    }

    #[test]
    fn discontinuous_tour_rejected() {
        let mut b = NetworkBuilder::new(1);
        let a = b.add_component(fixed("A", 1.0)).unwrap();
        let c = b.add_component(fixed("C", 1.0)).unwrap();
        let r1 = b.add_route("r1", vec![(a, StopParams::default()), (c, StopParams::default())]).unwrap();
        let r2 = b.add_route("r2", vec![(a, StopParams::default())]).unwrap();
        let err = b.add_tour("t", vec![r1, r2]).unwrap_err();
        assert!(matches!(err, NetworkError::RouteDiscontinuity { .. }));
        assert!(matches!(b.add_tour("t", vec![]), Err(NetworkError::EmptyTour(_))));
    }

    #[test]
    fn stop_override_beats_component_model() {
        let mut b = NetworkBuilder::new(1);
        let a = b.add_component(fixed("A", 30.0)).unwrap();
        let r = b
            .add_route("r", vec![(a, StopParams::default().with_duration(12.4))])
            .unwrap();
        let t = b.add_tour("t", vec![r]).unwrap();
        let mut net = b.build().unwrap();

        let stop = net.itinerary(t).unwrap()[0].clone();
        let s = net.sample_duration(&stop, AgentId(0), SimTime(0)).unwrap();
        assert_eq!(s.secs, 12);
        assert!(!s.clipped);
    }

    #[test]
    fn malformed_stop_duration_rejected() {
        for secs in [f64::INFINITY, f64::NAN, -5.0] {
            let mut b = NetworkBuilder::new(1);
            let a = b.add_component(fixed("A", 30.0)).unwrap();
            let c = b.add_component(fixed("C", 30.0)).unwrap();
            let err = b
                .add_route("r", vec![(a, StopParams::default()), (c, StopParams::default().with_duration(secs))])
                .unwrap_err();
            assert!(matches!(err, NetworkError::InvalidStopDuration { stop: 1, .. }), "{secs}: {err}");
            assert!(err.is_configuration());
            assert!(b.route_id("r").is_none());
        }
    }

    #[test]
    fn zero_stop_duration_allowed() {
        let mut b = NetworkBuilder::new(1);
        let a = b.add_component(fixed("A", 30.0)).unwrap();
        assert!(b.add_route("r", vec![(a, StopParams::default().with_duration(0.0))]).is_ok());
    }

    #[test]
    fn negative_duration_clips_to_zero() {
        let mut b = NetworkBuilder::new(1);
        let a = b
            .add_component(fixed("A", 1.0).with_jitter(JitterSpec::Uniform { min: -50.0, max: -10.0 }))
            .unwrap();
        let r = b.add_route("r", vec![(a, StopParams::default())]).unwrap();
        let t = b.add_tour("t", vec![r]).unwrap();
        let mut net = b.build().unwrap();

        let stop = net.itinerary(t).unwrap()[0].clone();
        let s = net.sample_duration(&stop, AgentId(0), SimTime(0)).unwrap();
        assert_eq!(s.secs, 0);
        assert!(s.clipped);
        assert!(s.raw < 0.0);
    }

    #[test]
    fn edge_jitter_is_independent_of_component_jitter() {
        let build = || {
            let mut b = NetworkBuilder::new(7);
            let spec = JitterSpec::Normal { mean: 0.0, std_dev: 5.0 };
            let a = b.add_component(fixed("A", 30.0).with_jitter(spec)).unwrap();
            let r = b.add_route("r", vec![(a, StopParams::default().with_jitter(spec))]).unwrap();
            let plain = b.add_route("p", vec![(a, StopParams::default())]).unwrap();
            let t1 = b.add_tour("edge", vec![r]).unwrap();
            let t2 = b.add_tour("plain", vec![plain]).unwrap();
            (b.build().unwrap(), t1, t2)
        };
        let (mut net, t_edge, t_plain) = build();
        let edge  = net.itinerary(t_edge).unwrap()[0].clone();
        let plain = net.itinerary(t_plain).unwrap()[0].clone();
        assert!(edge.jitter_edge.is_some());
        assert!(plain.jitter_edge.is_none());

        // Drawing from the edge stream leaves the component stream untouched.
        let before = net.component_states()[0].jitter;
        for _ in 0..5 {
            net.sample_duration(&edge, AgentId(0), SimTime(0)).unwrap();
        }
        assert_eq!(net.component_states()[0].jitter, before);
        net.sample_duration(&plain, AgentId(0), SimTime(0)).unwrap();
        assert_ne!(net.component_states()[0].jitter, before);
    }

    #[test]
    fn restore_rewinds_jitter_streams() {
        let mut b = NetworkBuilder::new(3);
        let spec = JitterSpec::Uniform { min: -5.0, max: 5.0 };
        let a = b.add_component(fixed("A", 30.0).with_jitter(spec)).unwrap();
        let r = b.add_route("r", vec![(a, StopParams::default().with_jitter(spec))]).unwrap();
        let t = b.add_tour("t", vec![r]).unwrap();
        let mut net = b.build().unwrap();
        let stop = net.itinerary(t).unwrap()[0].clone();

        let comps = net.component_states();
        let edges = net.edge_jitter_positions();
        let first: Vec<_> = (0..4)
            .map(|_| net.sample_duration(&stop, AgentId(0), SimTime(0)).unwrap())
            .collect();
        net.restore(&comps, &edges).unwrap();
        let again: Vec<_> = (0..4)
            .map(|_| net.sample_duration(&stop, AgentId(0), SimTime(0)).unwrap())
            .collect();
        assert_eq!(first, again);
    }

    #[test]
    fn component_def_from_json_uses_defaults() {
        let def: ComponentDef = serde_json::from_str(r#"{"name":"Y"}"#).unwrap();
        assert_eq!(def.capacity, 1);
        assert_eq!(def.service, ServiceSpec::Yard);
        assert!(def.jitter.is_fixed());
    }
}

// ── Network-wide invariants ────────────────────────────────────────────────────

#[cfg(test)]
mod invariants {
    use spur_core::AgentId;

    use crate::{ComponentDef, NetworkBuilder, NetworkError, ServiceSpec};

    #[test]
    fn blocked_handoff_is_not_a_violation_but_double_occupancy_is() {
        let mut b = NetworkBuilder::new(0);
        let c1 = b.add_component(ComponentDef::new("C1", 1, ServiceSpec::Yard)).unwrap();
        let c2 = b.add_component(ComponentDef::new("C2", 1, ServiceSpec::Yard)).unwrap();
        let mut net = b.build().unwrap();
        let (a, x) = (AgentId(0), AgentId(1));

        net.component_mut(c1).unwrap().request(a, 0).unwrap();
        net.component_mut(c2).unwrap().request(x, 0).unwrap();
        net.component_mut(c2).unwrap().request_handoff(a, 0).unwrap();
        net.check_invariants().unwrap();

        net.component_mut(c2).unwrap().withdraw(a);
        net.component_mut(c2).unwrap().vacate(x).unwrap();
        net.component_mut(c2).unwrap().request(a, 0).unwrap();
        assert!(matches!(net.check_invariants(), Err(NetworkError::AgentAlreadyPresent { .. })));
    }
}
