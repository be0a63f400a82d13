//! Unit tests for the mock simulator and the error taxonomy.

#[cfg(test)]
mod errors {
    use crate::TraciError;

    #[test]
    fn transient_class() {
        assert!(TraciError::VehicleMissing("v".into()).is_transient());
        assert!(TraciError::VehicleExists("v".into()).is_transient());
        assert!(TraciError::RouteMissing("r".into()).is_transient());
        assert!(!TraciError::Protocol("bad".into()).is_transient());
        assert!(!TraciError::Io(std::io::Error::other("gone")).is_transient());
    }
}

#[cfg(test)]
mod mock {
    use crate::{MockSimulator, TraciClient, TraciError, VehicleSpec};

    fn spec(id: &str, route: &str, speed: f64) -> VehicleSpec {
        VehicleSpec {
            id: id.into(),
            vehicle_type: "passenger".into(),
            route: route.into(),
            lane_index: 0,
            lane_pos: 0.0,
            speed,
        }
    }

    /// Two 100 m edges in a line, one route over both.
    fn two_edge_sim() -> MockSimulator {
        let sim = MockSimulator::new(1.0);
        sim.add_edge("a", 1, 100.0);
        sim.add_edge("b", 1, 100.0);
        sim.add_route("r", &["a", "b"]);
        sim
    }

    #[test]
    fn clock_advances_by_delta_t() {
        let mut sim = two_edge_sim();
        assert_eq!(sim.current_time().unwrap().secs(), 0.0);
        sim.step().unwrap();
        sim.step().unwrap();
        assert_eq!(sim.current_time().unwrap().secs(), 2.0);
        assert_eq!(sim.delta_t().unwrap(), 1.0);
    }

    #[test]
    fn vehicle_moves_and_hops_edges() {
        let mut sim = two_edge_sim();
        sim.spawn(spec("v1", "r", 30.0)).unwrap();
        assert_eq!(sim.vehicle_edge("v1").as_deref(), Some("a"));

        // 30 m/s: after 4 steps the vehicle is 120 m in, i.e. 20 m onto "b".
        for _ in 0..4 {
            sim.step().unwrap();
        }
        assert_eq!(sim.vehicle_edge("v1").as_deref(), Some("b"));
        assert_eq!(sim.vehicle_lane_position("v1"), Some(20.0));
        assert_eq!(sim.vehicles_on_edge("b").unwrap(), vec!["v1".to_owned()]);
        assert!(sim.vehicles_on_edge("a").unwrap().is_empty());
    }

    #[test]
    fn vehicle_despawns_at_route_end() {
        let mut sim = two_edge_sim();
        sim.spawn(spec("v1", "r", 50.0)).unwrap();
        for _ in 0..4 {
            sim.step().unwrap();
        }
        assert!(!sim.has_vehicle("v1"));
        assert!(matches!(
            sim.speed("v1"),
            Err(TraciError::VehicleMissing(_))
        ));
    }

    #[test]
    fn scheduled_spawn_appears_on_time() {
        let mut sim = two_edge_sim();
        sim.spawn_at(3.0, spec("late", "r", 1.0));
        sim.step().unwrap();
        assert!(!sim.has_vehicle("late"));
        sim.step().unwrap();
        sim.step().unwrap();
        assert!(sim.has_vehicle("late"));
    }

    #[test]
    fn slow_down_clamps_at_next_step() {
        let mut sim = two_edge_sim();
        sim.spawn(spec("v1", "r", 20.0)).unwrap();
        sim.slow_down("v1", 5.0, 1.0).unwrap();
        assert_eq!(sim.vehicle_speed("v1"), Some(20.0));
        sim.step().unwrap();
        assert_eq!(sim.vehicle_speed("v1"), Some(5.0));
        assert_eq!(sim.vehicle_lane_position("v1"), Some(5.0));
        assert_eq!(sim.slowdown_log(), vec![("v1".to_owned(), 5.0)]);
    }

    #[test]
    fn add_and_move_to_relocate() {
        let mut sim = two_edge_sim();
        sim.add_vehicle("in", "r", "passenger", 0, 10.0, 8.0).unwrap();
        assert_eq!(sim.vehicle_edge("in").as_deref(), Some("a"));
        sim.move_to("in", "b_0", 42.5).unwrap();
        assert_eq!(sim.vehicle_edge("in").as_deref(), Some("b"));
        assert_eq!(sim.lane_position("in").unwrap(), 42.5);
        assert_eq!(sim.lane_id("in").unwrap(), "b_0");
    }

    #[test]
    fn duplicate_add_is_transient() {
        let mut sim = two_edge_sim();
        sim.spawn(spec("v1", "r", 10.0)).unwrap();
        let err = sim.add_vehicle("v1", "r", "passenger", 0, 0.0, 10.0).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn unknown_route_is_transient() {
        let mut sim = two_edge_sim();
        assert!(matches!(
            sim.route_edges("nope"),
            Err(TraciError::RouteMissing(_))
        ));
        let err = sim.add_vehicle("v2", "nope", "passenger", 0, 0.0, 1.0).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn vanish_fires_once() {
        let mut sim = two_edge_sim();
        sim.spawn(spec("v1", "r", 1.0)).unwrap();
        sim.vanish_on_next_access("v1");

        // Edge listings are not vehicle-addressed and do not trip the hook.
        assert_eq!(sim.vehicles_on_edge("a").unwrap().len(), 1);

        assert!(matches!(
            sim.slow_down("v1", 2.0, 1.0),
            Err(TraciError::VehicleMissing(_))
        ));
        assert!(!sim.has_vehicle("v1"));
    }

    #[test]
    fn reads_reflect_spawn_state() {
        let mut sim = two_edge_sim();
        let mut s = spec("v1", "r", 13.0);
        s.lane_pos = 7.0;
        sim.spawn(s).unwrap();
        assert_eq!(sim.vehicle_type("v1").unwrap(), "passenger");
        assert_eq!(sim.route_id("v1").unwrap(), "r");
        assert_eq!(sim.lane_index("v1").unwrap(), 0);
        assert_eq!(sim.lane_id("v1").unwrap(), "a_0");
        assert_eq!(sim.lane_position("v1").unwrap(), 7.0);
        assert_eq!(sim.speed("v1").unwrap(), 13.0);
    }
}
