//! Integration tests for the coordination layer, driven by mock simulators.

use std::collections::BTreeMap;
use std::sync::Mutex;

use parsim_core::{PartitionId, SimTime};
use parsim_net::{BorderEdge, PartitionBorders};
use parsim_traci::{MockSimulator, TraciError, TraciResult, VehicleSpec};

use crate::{Coordinator, RunObserver, SimulatorEndpoint, TransferStats};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Endpoint that hands each worker a clone of a pre-staged mock simulator.
struct MockEndpoint {
    sims: Vec<MockSimulator>,
}

impl MockEndpoint {
    fn new(sims: &[MockSimulator]) -> Self {
        MockEndpoint { sims: sims.to_vec() }
    }
}

impl SimulatorEndpoint for MockEndpoint {
    type Client = MockSimulator;

    fn connect(&self, id: PartitionId) -> TraciResult<MockSimulator> {
        Ok(self.sims[id.index()].clone())
    }
}

fn border(id: &str, from: u32, to: u32) -> BorderEdge {
    BorderEdge {
        id: id.into(),
        lanes: vec![format!("{id}_0")],
        from: PartitionId(from),
        to: PartitionId(to),
    }
}

fn car(id: &str, route: &str, speed: f64) -> VehicleSpec {
    VehicleSpec {
        id: id.into(),
        vehicle_type: "passenger".into(),
        route: route.into(),
        lane_index: 0,
        lane_pos: 0.0,
        speed,
    }
}

/// Records every tick's starting time, per partition.
#[derive(Default)]
struct TickLog(Mutex<BTreeMap<u32, Vec<f64>>>);

impl RunObserver for TickLog {
    fn on_tick(&self, partition: PartitionId, start: SimTime) {
        self.0
            .lock()
            .unwrap()
            .entry(partition.0)
            .or_default()
            .push(start.secs());
    }
}

// ── Coordinator construction ──────────────────────────────────────────────────

#[cfg(test)]
mod construction {
    use super::*;
    use crate::CoordError;

    #[test]
    fn zero_partitions_rejected() {
        let endpoint = MockEndpoint::new(&[]);
        let result = Coordinator::new(0, SimTime::at(1.0), &[], endpoint);
        assert!(matches!(result, Err(CoordError::Config(_))));
    }

    #[test]
    fn border_edge_out_of_range_rejected() {
        let sims = [MockSimulator::new(1.0), MockSimulator::new(1.0)];
        let result = Coordinator::new(
            2,
            SimTime::at(1.0),
            &[super::border("x", 0, 5)],
            MockEndpoint::new(&sims),
        );
        assert!(matches!(result, Err(CoordError::Config(_))));
    }

    #[test]
    fn self_loop_border_edge_rejected() {
        let sims = [MockSimulator::new(1.0), MockSimulator::new(1.0)];
        let result = Coordinator::new(
            2,
            SimTime::at(1.0),
            &[super::border("x", 1, 1)],
            MockEndpoint::new(&sims),
        );
        assert!(matches!(result, Err(CoordError::Config(_))));
    }

    #[test]
    fn borders_distributed_to_both_sides() {
        let sims = [MockSimulator::new(1.0), MockSimulator::new(1.0)];
        let coordinator = Coordinator::new(
            2,
            SimTime::at(1.0),
            &[super::border("x", 0, 1)],
            MockEndpoint::new(&sims),
        )
        .unwrap();
        assert_eq!(coordinator.partition(PartitionId(0)).from_edges().len(), 1);
        assert!(coordinator.partition(PartitionId(0)).to_edges().is_empty());
        assert_eq!(coordinator.partition(PartitionId(1)).to_edges().len(), 1);
        assert!(coordinator.partition(PartitionId(1)).from_edges().is_empty());
    }
}

// ── Scenario: empty network runs to the end time in lock step ─────────────────

#[cfg(test)]
mod lock_step {
    use super::*;

    #[test]
    fn empty_network_reaches_end_time() {
        let sims = [MockSimulator::new(1.0), MockSimulator::new(1.0)];
        let coordinator =
            Coordinator::new(2, SimTime::at(10.0), &[], MockEndpoint::new(&sims)).unwrap();

        let stats = TransferStats::new();
        coordinator.run_with(&stats).unwrap();

        assert_eq!(sims[0].time(), 10.0);
        assert_eq!(sims[1].time(), 10.0);
        assert_eq!(stats.transfers(), 0);
        assert_eq!(stats.slowdowns(), 0);
    }

    #[test]
    fn partitions_tick_in_lock_step() {
        let sims = [MockSimulator::new(1.0), MockSimulator::new(1.0)];
        let coordinator =
            Coordinator::new(2, SimTime::at(10.0), &[], MockEndpoint::new(&sims)).unwrap();

        let log = TickLog::default();
        coordinator.run_with(&log).unwrap();

        let log = log.0.lock().unwrap();
        let expected: Vec<f64> = (0..10).map(f64::from).collect();
        assert_eq!(log[&0], expected, "partition 0 tick starts");
        assert_eq!(log[&1], expected, "partition 1 tick starts");
    }

    #[test]
    fn three_partitions_also_synchronize() {
        let sims = [
            MockSimulator::new(1.0),
            MockSimulator::new(1.0),
            MockSimulator::new(1.0),
        ];
        let coordinator =
            Coordinator::new(3, SimTime::at(5.0), &[], MockEndpoint::new(&sims)).unwrap();
        coordinator.run().unwrap();
        for sim in &sims {
            assert_eq!(sim.time(), 5.0);
        }
    }
}

// ── Scenario: a single vehicle crosses the border ─────────────────────────────

#[cfg(test)]
mod crossing {
    use super::*;
    use parsim_traci::TraciClient;

    /// Partition 0 owns "west" and the shared "xing"; partition 1 owns
    /// "xing" and "east".  Vehicle `car` drives west → xing → east at
    /// 10 m/s, crossing the cut at t = 10.
    fn stage() -> ([MockSimulator; 2], Vec<BorderEdge>) {
        let p0 = MockSimulator::new(1.0);
        p0.add_edge("west", 1, 100.0);
        p0.add_edge("xing", 1, 50.0);
        p0.add_route("commute", &["west", "xing"]);
        p0.spawn(car("car", "commute", 10.0)).unwrap();

        let p1 = MockSimulator::new(1.0);
        p1.add_edge("xing", 1, 50.0);
        p1.add_edge("east", 1, 100.0);
        p1.add_route("commute", &["xing", "east"]);

        ([p0, p1], vec![border("xing", 0, 1)])
    }

    #[test]
    fn vehicle_is_mirrored_downstream() {
        let (sims, borders) = stage();
        let coordinator =
            Coordinator::new(2, SimTime::at(20.0), &borders, MockEndpoint::new(&sims)).unwrap();
        let stats = TransferStats::new();
        coordinator.run_with(&stats).unwrap();

        assert_eq!(stats.transfers(), 1, "exactly one hand-off");

        // Downstream copy carried on past the border edge…
        assert!(sims[1].has_vehicle("car"));
        assert_eq!(sims[1].vehicle_edge("car").as_deref(), Some("east"));
        let mut handle = sims[1].clone();
        assert_eq!(handle.vehicle_type("car").unwrap(), "passenger");

        // …while the upstream copy ran off the end of its clipped route.
        assert!(!sims[0].has_vehicle("car"));
    }

    #[test]
    fn downstream_speed_is_pushed_back_upstream() {
        let (sims, borders) = stage();
        let coordinator =
            Coordinator::new(2, SimTime::at(16.0), &borders, MockEndpoint::new(&sims)).unwrap();
        let stats = TransferStats::new();
        coordinator.run_with(&stats).unwrap();

        // While `car` was on "xing" in both simulators, partition 1 pushed
        // its measured speed into partition 0 at least once.
        assert!(stats.slowdowns() >= 1, "slowdowns: {}", stats.slowdowns());
        let log = sims[0].slowdown_log();
        assert!(!log.is_empty());
        assert!(log.iter().all(|(v, s)| v == "car" && *s == 10.0));
    }

    #[test]
    fn mirrored_state_matches_source() {
        // One shared edge only; the vehicle sits on it from t = 0, so the
        // mirror happens on the first tick and both copies then integrate
        // identically.
        let p0 = MockSimulator::new(1.0);
        p0.add_edge("xing", 2, 100.0);
        p0.add_route("m", &["xing"]);
        let mut spec = car("v", "m", 7.0);
        spec.vehicle_type = "bus".into();
        spec.lane_index = 1;
        spec.lane_pos = 33.5;
        p0.spawn(spec).unwrap();

        let p1 = MockSimulator::new(1.0);
        p1.add_edge("xing", 2, 100.0);
        p1.add_edge("tail", 1, 100.0);
        p1.add_route("m", &["xing", "tail"]);

        let sims = [p0, p1];
        let coordinator = Coordinator::new(
            2,
            SimTime::at(2.0),
            &[border("xing", 0, 1)],
            MockEndpoint::new(&sims),
        )
        .unwrap();
        coordinator.run().unwrap();

        let mut source = sims[0].clone();
        let mut mirror = sims[1].clone();
        assert_eq!(mirror.vehicle_type("v").unwrap(), "bus");
        assert_eq!(mirror.lane_id("v").unwrap(), "xing_1");
        let drift =
            (source.lane_position("v").unwrap() - mirror.lane_position("v").unwrap()).abs();
        assert!(drift < 1e-9, "positions diverged by {drift}");
    }
}

// ── Scenario: two-way road, mutual updates in the same tick ───────────────────

#[cfg(test)]
mod two_way {
    use super::*;

    #[test]
    fn opposing_vehicles_both_mirrored() {
        // Directed edges "eastbound" (0 → 1) and "westbound" (1 → 0) model a
        // two-way road on the cut; `a` and `b` reach their border edges on
        // the same tick, so the partitions race to update each other.
        let p0 = MockSimulator::new(1.0);
        p0.add_edge("approach_w", 1, 50.0);
        p0.add_edge("eastbound", 1, 100.0);
        p0.add_edge("westbound", 1, 100.0);
        p0.add_edge("exit_w", 1, 100.0);
        p0.add_route("ra", &["approach_w", "eastbound"]);
        p0.add_route("rb", &["westbound", "exit_w"]);
        p0.spawn(car("a", "ra", 10.0)).unwrap();

        let p1 = MockSimulator::new(1.0);
        p1.add_edge("approach_e", 1, 50.0);
        p1.add_edge("eastbound", 1, 100.0);
        p1.add_edge("westbound", 1, 100.0);
        p1.add_edge("exit_e", 1, 100.0);
        p1.add_route("rb", &["approach_e", "westbound"]);
        p1.add_route("ra", &["eastbound", "exit_e"]);
        p1.spawn(car("b", "rb", 10.0)).unwrap();

        let sims = [p0, p1];
        let borders = vec![border("eastbound", 0, 1), border("westbound", 1, 0)];
        let coordinator =
            Coordinator::new(2, SimTime::at(12.0), &borders, MockEndpoint::new(&sims)).unwrap();

        let stats = TransferStats::new();
        coordinator.run_with(&stats).unwrap();

        // Neither handshake deadlocked (the run completed) and both vehicles
        // made it across — an aborted attempt is retried the next tick.
        assert!(sims[1].has_vehicle("a"), "a mirrored into partition 1");
        assert!(sims[0].has_vehicle("b"), "b mirrored into partition 0");
        assert_eq!(stats.transfers(), 2);
    }
}

// ── Scenario: split-route rewriting ───────────────────────────────────────────

#[cfg(test)]
mod split_routes {
    use super::*;

    #[test]
    fn insertion_uses_fragment_starting_at_border() {
        let p0 = MockSimulator::new(1.0);
        p0.add_edge("lead", 1, 50.0);
        p0.add_edge("bx", 1, 100.0);
        p0.add_route("r_part0", &["lead", "bx"]);
        p0.spawn(car("v_partA", "r_part0", 10.0)).unwrap();

        let p1 = MockSimulator::new(1.0);
        p1.add_edge("decoy", 1, 10.0);
        p1.add_edge("bx", 1, 100.0);
        p1.add_edge("tail", 1, 100.0);
        // Fragment 0 starts elsewhere; fragment 1 starts at the border edge.
        p1.add_route("r_part0", &["decoy"]);
        p1.add_route("r_part1", &["bx", "tail"]);

        let sims = [p0, p1];
        let coordinator = Coordinator::new(
            2,
            SimTime::at(10.0),
            &[border("bx", 0, 1)],
            MockEndpoint::new(&sims),
        )
        .unwrap();
        coordinator.run().unwrap();

        assert!(sims[1].has_vehicle("v_partA"));
        assert_eq!(sims[1].vehicle_route("v_partA").as_deref(), Some("r_part1"));
    }

    #[test]
    fn missing_fragment_skips_insertion_without_crashing() {
        let p0 = MockSimulator::new(1.0);
        p0.add_edge("lead", 1, 50.0);
        p0.add_edge("bx", 1, 100.0);
        p0.add_route("r_part0", &["lead", "bx"]);
        p0.spawn(car("v_part9", "r_part0", 10.0)).unwrap();

        let p1 = MockSimulator::new(1.0);
        p1.add_edge("bx", 1, 100.0);
        // No fragment of "r_part…" starts at "bx": the scan ends on the
        // missing-route error and the insertion is skipped.
        p1.add_route("r_part0", &["bx_other"]);
        p1.add_edge("bx_other", 1, 10.0);

        let sims = [p0, p1];
        let coordinator = Coordinator::new(
            2,
            SimTime::at(8.0),
            &[border("bx", 0, 1)],
            MockEndpoint::new(&sims),
        )
        .unwrap();
        let stats = TransferStats::new();
        coordinator.run_with(&stats).unwrap();

        assert!(!sims[1].has_vehicle("v_part9"));
        assert_eq!(stats.transfers(), 0);
        assert!(stats.transient_misses() >= 1);
    }
}

// ── Scenario: transient vehicle miss is swallowed ─────────────────────────────

#[cfg(test)]
mod transient_miss {
    use super::*;

    #[test]
    fn vanished_vehicle_does_not_crash_the_run() {
        // `ghost` exists on the shared edge in both partitions from t = 0, as
        // if already handed off.  The upstream copy is rigged to vanish at the
        // next vehicle-addressed access — which is the downstream partition's
        // remote slow_down.
        let p0 = MockSimulator::new(1.0);
        p0.add_edge("bx", 1, 100.0);
        p0.add_route("rg", &["bx"]);
        let mut spec = car("ghost", "rg", 1.0);
        spec.lane_pos = 10.0;
        p0.spawn(spec.clone()).unwrap();
        p0.vanish_on_next_access("ghost");

        let p1 = MockSimulator::new(1.0);
        p1.add_edge("bx", 1, 100.0);
        p1.add_edge("tail", 1, 100.0);
        p1.add_route("rg", &["bx", "tail"]);
        p1.spawn(spec).unwrap();

        let sims = [p0, p1];
        let coordinator = Coordinator::new(
            2,
            SimTime::at(6.0),
            &[border("bx", 0, 1)],
            MockEndpoint::new(&sims),
        )
        .unwrap();
        let stats = TransferStats::new();
        coordinator.run_with(&stats).unwrap();

        assert!(stats.transient_misses() >= 1, "the miss was counted");
        assert!(!sims[0].has_vehicle("ghost"), "upstream copy was consumed");
        assert!(sims[1].has_vehicle("ghost"), "downstream copy unaffected");
        assert!(sims[0].slowdown_log().is_empty(), "no slow_down landed upstream");
    }
}

// ── Connect retry ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod connect_retry {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::CoordError;

    /// Refuses the first `failures` connection attempts per partition.
    struct FlakyEndpoint {
        sims: Vec<MockSimulator>,
        remaining: AtomicU32,
    }

    impl SimulatorEndpoint for FlakyEndpoint {
        type Client = MockSimulator;

        fn connect(&self, id: PartitionId) -> TraciResult<MockSimulator> {
            if self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(TraciError::Connect {
                    host: "localhost".into(),
                    port: 8813 + id.0 as u16,
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                });
            }
            Ok(self.sims[id.index()].clone())
        }
    }

    #[test]
    fn slow_simulator_startup_is_retried() {
        let sims = vec![MockSimulator::new(1.0), MockSimulator::new(1.0)];
        let endpoint = FlakyEndpoint {
            sims: sims.clone(),
            remaining: AtomicU32::new(3),
        };
        let coordinator = Coordinator::new(2, SimTime::at(3.0), &[], endpoint).unwrap();
        coordinator.run().unwrap();
        assert_eq!(sims[0].time(), 3.0);
        assert_eq!(sims[1].time(), 3.0);
    }

    #[test]
    fn non_connect_error_is_fatal() {
        // Single partition, so the failure cannot strand peers at the barrier.
        struct BrokenEndpoint;
        impl SimulatorEndpoint for BrokenEndpoint {
            type Client = MockSimulator;
            fn connect(&self, _id: PartitionId) -> TraciResult<MockSimulator> {
                Err(TraciError::Protocol("handshake rejected".into()))
            }
        }

        let coordinator = Coordinator::new(1, SimTime::at(1.0), &[], BrokenEndpoint).unwrap();
        assert!(matches!(
            coordinator.run(),
            Err(CoordError::Connect { id: PartitionId(0), .. })
        ));
    }
}

// ── Handshake primitives ──────────────────────────────────────────────────────

#[cfg(test)]
mod handshake {
    use std::time::Duration;

    use super::*;
    use crate::set::PartitionSet;
    use crate::worker::{begin_peer_update, Handshake};

    fn bare_set(n: usize) -> PartitionSet<MockSimulator> {
        PartitionSet::new(SimTime::at(10.0), vec![PartitionBorders::default(); n])
    }

    #[test]
    fn acquired_when_peer_is_parked() {
        let set = bare_set(2);
        set.partition(PartitionId(1)).set_waiting(true);

        let me = set.partition(PartitionId(0));
        let outcome = begin_peer_update(&set, me, PartitionId(1));
        assert_eq!(outcome, Handshake::Acquired);
        assert!(set.partition(PartitionId(1)).is_synching());
    }

    #[test]
    fn aborted_when_own_flag_raised_mid_spin() {
        let set = bare_set(2);
        // Peer 1 is never waiting, so the spin only ends via the escape.
        let outcome = std::thread::scope(|scope| {
            scope.spawn(|| {
                std::thread::sleep(Duration::from_millis(100));
                set.partition(PartitionId(0)).set_synching(true);
            });
            begin_peer_update(&set, set.partition(PartitionId(0)), PartitionId(1))
        });

        assert_eq!(outcome, Handshake::Aborted);
        assert!(
            !set.partition(PartitionId(1)).is_synching(),
            "abort must clear the flag it raised on the peer"
        );
    }

    #[test]
    fn wait_for_synch_parks_until_cleared() {
        let set = bare_set(2);
        let p0 = set.partition(PartitionId(0));
        p0.set_synching(true);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                std::thread::sleep(Duration::from_millis(100));
                assert!(p0.is_waiting(), "parked partition advertises waiting");
                let clients = set.synch().clients();
                p0.set_synching(false);
                drop(clients);
                set.synch().notify_peers();
            });
            set.synch().wait_for_synch(p0);
        });

        assert!(!p0.is_waiting());
        assert!(!p0.is_synching());
    }
}

// ── Per-edge memory ───────────────────────────────────────────────────────────

#[cfg(test)]
mod edge_memory {
    use crate::worker::EdgeMemory;

    #[test]
    fn empty_observation_keeps_history() {
        let mut memory = EdgeMemory::new(1);
        memory.observe(0, vec!["a".into(), "b".into()]);
        assert!(memory.contains(0, "a"));

        // A transient empty read must not erase the previous tick's view.
        memory.observe(0, vec![]);
        assert!(memory.contains(0, "a"));
        assert!(memory.contains(0, "b"));
    }

    #[test]
    fn non_empty_observation_replaces_history() {
        let mut memory = EdgeMemory::new(2);
        memory.observe(0, vec!["a".into()]);
        memory.observe(0, vec!["b".into()]);
        assert!(!memory.contains(0, "a"));
        assert!(memory.contains(0, "b"));
        assert!(!memory.contains(1, "b"), "slots are independent");
    }
}
