//! twin-grid — smallest runnable demonstration of partitioned coordination.
//!
//! Two in-memory simulators stand in for two SUMO processes.  Their networks
//! share a two-way border road (`main_east` flowing 0 → 1, `main_west`
//! flowing 1 → 0); the border-edge index is built from the same `.net.xml`
//! structure the production pipeline produces.  Two vehicles with pre-split
//! routes cross in opposite directions, exercising insertion, the split-route
//! fragment scan, speed back-propagation and the two-way handshake.
//!
//! Swap the mock endpoint for one that spawns SUMO (`parsim-launch`) and
//! connects a real TraCI client to run the same coordination against real
//! simulators.

use std::path::Path;

use anyhow::Result;

use parsim_coord::{Coordinator, SimulatorEndpoint, TransferStats};
use parsim_core::{PartitionId, SimTime};
use parsim_net::{find_border_edges, NetFile};
use parsim_traci::{MockSimulator, TraciResult, VehicleSpec};

// ── Constants ─────────────────────────────────────────────────────────────────

const DELTA_T_SECS: f64 = 1.0;
const END_TIME_SECS: f64 = 20.0;

// ── Partition network files ───────────────────────────────────────────────────

// The same shape netconvert produces for a vertical cut: the shared edges
// appear in both files, and the side where an edge *enters* the partition has
// its origin junction clipped to a dead end.
const PART0_NET: &str = r#"<net version="1.9">
    <edge id="west_ave" from="j_w"><lane id="west_ave_0"/></edge>
    <edge id="main_east" from="j_mid"><lane id="main_east_0"/></edge>
    <edge id="main_west" from="j_cut"><lane id="main_west_0"/></edge>
    <edge id="west_out" from="j_mid"><lane id="west_out_0"/></edge>
    <junction id="j_w" type="dead_end"/>
    <junction id="j_mid" type="priority"/>
    <junction id="j_cut" type="dead_end"/>
</net>"#;

const PART1_NET: &str = r#"<net version="1.9">
    <edge id="main_east" from="j_cut2"><lane id="main_east_0"/></edge>
    <edge id="main_west" from="j_east"><lane id="main_west_0"/></edge>
    <edge id="east_in" from="j_e"><lane id="east_in_0"/></edge>
    <edge id="east_blvd" from="j_east"><lane id="east_blvd_0"/></edge>
    <junction id="j_cut2" type="dead_end"/>
    <junction id="j_east" type="priority"/>
    <junction id="j_e" type="dead_end"/>
</net>"#;

// ── Mock endpoint ─────────────────────────────────────────────────────────────

struct MockEndpoint {
    sims: Vec<MockSimulator>,
}

impl SimulatorEndpoint for MockEndpoint {
    type Client = MockSimulator;

    fn connect(&self, id: PartitionId) -> TraciResult<MockSimulator> {
        Ok(self.sims[id.index()].clone())
    }
}

// ── Staging ───────────────────────────────────────────────────────────────────

fn vehicle(id: &str, route: &str, speed: f64) -> VehicleSpec {
    VehicleSpec {
        id: id.into(),
        vehicle_type: "passenger".into(),
        route: route.into(),
        lane_index: 0,
        lane_pos: 0.0,
        speed,
    }
}

/// Partition 0: the west side.  `alice` departs here and leaves eastbound.
fn stage_partition0() -> Result<MockSimulator> {
    let sim = MockSimulator::new(DELTA_T_SECS);
    sim.add_edge("west_ave", 1, 100.0);
    sim.add_edge("main_east", 1, 100.0);
    sim.add_edge("main_west", 1, 100.0);
    sim.add_edge("west_out", 1, 100.0);

    // Route fragments as the route cutter names them.  Fragment 0 of the
    // return route belongs to the other partition; it is present here only
    // as a name, which is all the fragment scan consults.
    sim.add_route("commute_part0", &["west_ave", "main_east"]);
    sim.add_route("return_part0", &["east_in"]);
    sim.add_route("return_part1", &["main_west", "west_out"]);

    sim.spawn(vehicle("alice_part0", "commute_part0", 12.0))?;
    Ok(sim)
}

/// Partition 1: the east side.  `bob` departs here and leaves westbound.
fn stage_partition1() -> Result<MockSimulator> {
    let sim = MockSimulator::new(DELTA_T_SECS);
    sim.add_edge("main_east", 1, 100.0);
    sim.add_edge("main_west", 1, 100.0);
    sim.add_edge("east_in", 1, 50.0);
    sim.add_edge("east_blvd", 1, 100.0);

    sim.add_route("commute_part0", &["west_ave"]);
    sim.add_route("commute_part1", &["main_east", "east_blvd"]);
    sim.add_route("return_part0", &["east_in", "main_west"]);

    sim.spawn(vehicle("bob_part0", "return_part0", 10.0))?;
    Ok(sim)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();

    println!("=== twin-grid — two partitions, one two-way border ===");
    println!();

    // 1. Border edges, discovered the same way the production path does.
    let nets = vec![
        NetFile::parse(PART0_NET, Path::new("part0.net.xml"))?,
        NetFile::parse(PART1_NET, Path::new("part1.net.xml"))?,
    ];
    let borders = find_border_edges(&nets);
    println!("Border edges:");
    for edge in &borders {
        println!("  {:<12} {} -> {}", edge.id, edge.from, edge.to);
    }
    println!();

    // 2. Stage one mock simulator per partition.
    let sims = vec![stage_partition0()?, stage_partition1()?];
    let handles = sims.clone();

    // 3. Run to the end time.
    let coordinator = Coordinator::new(
        2,
        SimTime::at(END_TIME_SECS),
        &borders,
        MockEndpoint { sims },
    )?;
    let stats = TransferStats::new();
    coordinator.run_with(&stats)?;

    // 4. Summary.
    println!("Run complete at t = {END_TIME_SECS}s");
    println!("  vehicles transferred : {}", stats.transfers());
    println!("  speeds propagated    : {}", stats.slowdowns());
    println!("  handshake aborts     : {}", stats.handshake_aborts());
    println!("  transient misses     : {}", stats.transient_misses());
    println!();

    println!("{:<14} {:<11} {:<12} {:<10}", "Vehicle", "Partition", "Edge", "Route");
    println!("{}", "-".repeat(50));
    for name in ["alice_part0", "bob_part0"] {
        for (partition, handle) in handles.iter().enumerate() {
            if handle.has_vehicle(name) {
                println!(
                    "{:<14} {:<11} {:<12} {:<10}",
                    name,
                    format!("P{partition}"),
                    handle.vehicle_edge(name).unwrap_or_default(),
                    handle.vehicle_route(name).unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}
