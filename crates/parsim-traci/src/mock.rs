//! A deterministic in-memory simulator.
//!
//! `MockSimulator` implements [`TraciClient`] over a small vehicle-following
//! model: every [`step`](TraciClient::step) advances the clock by delta-t and
//! moves each vehicle along its route by `speed × delta_t`, hopping to the
//! next route edge when it runs off the end of the current one and leaving
//! the simulation after the last.  That is enough physics to exercise the
//! cross-partition protocol — border-edge observation, insertion, relocation
//! and speed clamping — without a SUMO process.
//!
//! The struct is a cheap-to-clone handle around shared state, so a test can
//! keep one handle for staging and inspection while the coordinator drives
//! another as its client.
//!
//! Transient errors are produced exactly where a real simulator raises them:
//! vehicle-addressed operations on an unknown vehicle, insertion of a known
//! vehicle, and lookups of an unknown route.  The
//! [`vanish_on_next_access`](MockSimulator::vanish_on_next_access) hook makes
//! the *next* vehicle-addressed operation fail that way, for staging the
//! read-here/write-there races the coordinator must swallow.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use parsim_core::SimTime;

use crate::{TraciClient, TraciError, TraciResult};

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything needed to place a vehicle into a [`MockSimulator`].
#[derive(Clone, Debug)]
pub struct VehicleSpec {
    pub id: String,
    pub vehicle_type: String,
    /// Named route the vehicle follows; it departs on the route's first edge.
    pub route: String,
    pub lane_index: i32,
    /// Initial position along the departure lane, in metres.
    pub lane_pos: f64,
    /// Initial (and, absent a slow-down, constant) speed in m/s.
    pub speed: f64,
}

/// Shared-state handle to one in-memory simulator instance.
#[derive(Clone)]
pub struct MockSimulator {
    state: Arc<Mutex<SimState>>,
}

// ── Internal state ────────────────────────────────────────────────────────────

struct Edge {
    lanes: Vec<String>,
    length: f64,
}

struct Vehicle {
    vehicle_type: String,
    route: String,
    /// Index into the route's edge list of the edge currently occupied.
    route_pos: usize,
    lane_index: i32,
    lane_pos: f64,
    speed: f64,
    /// Speed clamp requested by `slow_down`, applied at the next step.
    pending_speed: Option<f64>,
}

struct SimState {
    time: f64,
    delta_t: f64,
    edges: BTreeMap<String, Edge>,
    routes: BTreeMap<String, Vec<String>>,
    vehicles: BTreeMap<String, Vehicle>,
    /// Vehicles scheduled to appear once `time` reaches their due time.
    pending_spawns: Vec<(f64, VehicleSpec)>,
    /// Vehicle ids whose next addressed operation fails transiently.
    vanishing: HashSet<String>,
    /// Record of every accepted `slow_down`, in call order.
    slowdown_log: Vec<(String, f64)>,
}

impl SimState {
    fn current_edge(&self, vehicle: &Vehicle) -> Option<&str> {
        self.routes
            .get(&vehicle.route)
            .and_then(|edges| edges.get(vehicle.route_pos))
            .map(String::as_str)
    }

    /// Gate every vehicle-addressed operation: fire a pending vanish, or fail
    /// if the vehicle is simply not there.
    fn touch(&mut self, id: &str) -> TraciResult<()> {
        if self.vanishing.remove(id) {
            self.vehicles.remove(id);
            return Err(TraciError::VehicleMissing(id.to_owned()));
        }
        if self.vehicles.contains_key(id) {
            Ok(())
        } else {
            Err(TraciError::VehicleMissing(id.to_owned()))
        }
    }

    fn place(&mut self, spec: VehicleSpec) -> TraciResult<()> {
        if self.vehicles.contains_key(&spec.id) {
            return Err(TraciError::VehicleExists(spec.id));
        }
        if !self.routes.contains_key(&spec.route) {
            return Err(TraciError::RouteMissing(spec.route));
        }
        self.vehicles.insert(
            spec.id,
            Vehicle {
                vehicle_type: spec.vehicle_type,
                route: spec.route,
                route_pos: 0,
                lane_index: spec.lane_index.max(0),
                lane_pos: spec.lane_pos,
                speed: spec.speed,
                pending_speed: None,
            },
        );
        Ok(())
    }

    fn advance(&mut self) {
        self.time += self.delta_t;

        // Release scheduled spawns that have come due.  Specs whose route the
        // fixture never defined are dropped.
        let time = self.time;
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_spawns)
            .into_iter()
            .partition(|(at, _)| *at <= time);
        self.pending_spawns = later;
        for (_, spec) in due {
            let _ = self.place(spec);
        }

        // Move every vehicle along its route; despawn at route end.
        let ids: Vec<String> = self.vehicles.keys().cloned().collect();
        for id in ids {
            let mut despawn = false;
            if let Some(vehicle) = self.vehicles.get_mut(&id) {
                if let Some(clamp) = vehicle.pending_speed.take() {
                    vehicle.speed = clamp;
                }
                vehicle.lane_pos += vehicle.speed * self.delta_t;

                if let Some(route) = self.routes.get(&vehicle.route) {
                    loop {
                        let edge_len = match route
                            .get(vehicle.route_pos)
                            .and_then(|e| self.edges.get(e))
                        {
                            Some(edge) => edge.length,
                            None => break,
                        };
                        if vehicle.lane_pos < edge_len {
                            break;
                        }
                        if vehicle.route_pos + 1 >= route.len() {
                            despawn = true;
                            break;
                        }
                        vehicle.lane_pos -= edge_len;
                        vehicle.route_pos += 1;
                        let lane_count = self
                            .edges
                            .get(&route[vehicle.route_pos])
                            .map_or(1, |e| e.lanes.len());
                        if vehicle.lane_index as usize >= lane_count {
                            vehicle.lane_index = 0;
                        }
                    }
                }
            }
            if despawn {
                self.vehicles.remove(&id);
            }
        }
    }
}

// ── Staging and inspection API ────────────────────────────────────────────────

impl MockSimulator {
    pub fn new(delta_t: f64) -> Self {
        MockSimulator {
            state: Arc::new(Mutex::new(SimState {
                time: 0.0,
                delta_t,
                edges: BTreeMap::new(),
                routes: BTreeMap::new(),
                vehicles: BTreeMap::new(),
                pending_spawns: Vec::new(),
                vanishing: HashSet::new(),
                slowdown_log: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().expect("mock simulator state poisoned")
    }

    /// Define an edge with `lane_count` lanes (ids `<edge>_0`, `<edge>_1`, …)
    /// of the given length in metres.
    pub fn add_edge(&self, id: &str, lane_count: usize, length: f64) {
        let lanes = (0..lane_count).map(|i| format!("{id}_{i}")).collect();
        self.state().edges.insert(id.to_owned(), Edge { lanes, length });
    }

    /// Define a named route over previously-added edges.
    pub fn add_route(&self, id: &str, edges: &[&str]) {
        self.state()
            .routes
            .insert(id.to_owned(), edges.iter().map(|&e| e.to_owned()).collect());
    }

    /// Place a vehicle immediately on the first edge of its route.
    pub fn spawn(&self, spec: VehicleSpec) -> TraciResult<()> {
        self.state().place(spec)
    }

    /// Schedule a vehicle to appear once simulated time reaches `at_secs`.
    pub fn spawn_at(&self, at_secs: f64, spec: VehicleSpec) {
        self.state().pending_spawns.push((at_secs, spec));
    }

    /// Make the next vehicle-addressed operation for `vehicle` fail with
    /// [`TraciError::VehicleMissing`], removing the vehicle — as if the
    /// simulator consumed it between a peer's read and write.
    pub fn vanish_on_next_access(&self, vehicle: &str) {
        self.state().vanishing.insert(vehicle.to_owned());
    }

    // ── Inspection (used by tests; not part of the client contract) ───────

    pub fn time(&self) -> f64 {
        self.state().time
    }

    pub fn has_vehicle(&self, id: &str) -> bool {
        self.state().vehicles.contains_key(id)
    }

    pub fn vehicle_edge(&self, id: &str) -> Option<String> {
        let state = self.state();
        let vehicle = state.vehicles.get(id)?;
        state.current_edge(vehicle).map(str::to_owned)
    }

    pub fn vehicle_route(&self, id: &str) -> Option<String> {
        self.state().vehicles.get(id).map(|v| v.route.clone())
    }

    pub fn vehicle_speed(&self, id: &str) -> Option<f64> {
        self.state().vehicles.get(id).map(|v| v.speed)
    }

    pub fn vehicle_lane_position(&self, id: &str) -> Option<f64> {
        self.state().vehicles.get(id).map(|v| v.lane_pos)
    }

    /// Every `slow_down` accepted so far, as `(vehicle, target_speed)`.
    pub fn slowdown_log(&self) -> Vec<(String, f64)> {
        self.state().slowdown_log.clone()
    }
}

// ── TraciClient implementation ────────────────────────────────────────────────

fn missing(vehicle: &str) -> TraciError {
    TraciError::VehicleMissing(vehicle.to_owned())
}

impl TraciClient for MockSimulator {
    fn current_time(&mut self) -> TraciResult<SimTime> {
        Ok(SimTime::at(self.state().time))
    }

    fn step(&mut self) -> TraciResult<()> {
        self.state().advance();
        Ok(())
    }

    fn delta_t(&mut self) -> TraciResult<f64> {
        Ok(self.state().delta_t)
    }

    fn vehicles_on_edge(&mut self, edge: &str) -> TraciResult<Vec<String>> {
        let state = self.state();
        if !state.edges.contains_key(edge) {
            return Err(TraciError::Protocol(format!("unknown edge '{edge}'")));
        }
        Ok(state
            .vehicles
            .iter()
            .filter(|(_, v)| state.current_edge(v) == Some(edge))
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn route_edges(&mut self, route: &str) -> TraciResult<Vec<String>> {
        self.state()
            .routes
            .get(route)
            .cloned()
            .ok_or_else(|| TraciError::RouteMissing(route.to_owned()))
    }

    fn vehicle_type(&mut self, vehicle: &str) -> TraciResult<String> {
        let mut state = self.state();
        state.touch(vehicle)?;
        let v = state.vehicles.get(vehicle).ok_or_else(|| missing(vehicle))?;
        Ok(v.vehicle_type.clone())
    }

    fn route_id(&mut self, vehicle: &str) -> TraciResult<String> {
        let mut state = self.state();
        state.touch(vehicle)?;
        let v = state.vehicles.get(vehicle).ok_or_else(|| missing(vehicle))?;
        Ok(v.route.clone())
    }

    fn lane_index(&mut self, vehicle: &str) -> TraciResult<i32> {
        let mut state = self.state();
        state.touch(vehicle)?;
        let v = state.vehicles.get(vehicle).ok_or_else(|| missing(vehicle))?;
        Ok(v.lane_index)
    }

    fn lane_id(&mut self, vehicle: &str) -> TraciResult<String> {
        let mut state = self.state();
        state.touch(vehicle)?;
        let v = state.vehicles.get(vehicle).ok_or_else(|| missing(vehicle))?;
        let edge = state
            .current_edge(v)
            .ok_or_else(|| TraciError::Protocol(format!("vehicle '{vehicle}' is off-route")))?;
        Ok(format!("{edge}_{}", v.lane_index))
    }

    fn lane_position(&mut self, vehicle: &str) -> TraciResult<f64> {
        let mut state = self.state();
        state.touch(vehicle)?;
        let v = state.vehicles.get(vehicle).ok_or_else(|| missing(vehicle))?;
        Ok(v.lane_pos)
    }

    fn speed(&mut self, vehicle: &str) -> TraciResult<f64> {
        let mut state = self.state();
        state.touch(vehicle)?;
        let v = state.vehicles.get(vehicle).ok_or_else(|| missing(vehicle))?;
        Ok(v.speed)
    }

    fn add_vehicle(
        &mut self,
        vehicle: &str,
        route: &str,
        vehicle_type: &str,
        lane_index: i32,
        depart_pos: f64,
        speed: f64,
    ) -> TraciResult<()> {
        self.state().place(VehicleSpec {
            id: vehicle.to_owned(),
            vehicle_type: vehicle_type.to_owned(),
            route: route.to_owned(),
            lane_index,
            lane_pos: depart_pos,
            speed,
        })
    }

    fn move_to(&mut self, vehicle: &str, lane: &str, pos: f64) -> TraciResult<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.touch(vehicle)?;

        let edge = state
            .edges
            .iter()
            .find(|(_, e)| e.lanes.iter().any(|l| l == lane))
            .map(|(id, _)| id.clone())
            .ok_or_else(|| TraciError::Protocol(format!("unknown lane '{lane}'")))?;

        let v = state.vehicles.get_mut(vehicle).ok_or_else(|| missing(vehicle))?;
        let route_pos = state
            .routes
            .get(&v.route)
            .and_then(|edges| edges.iter().position(|e| *e == edge))
            .ok_or_else(|| {
                TraciError::Protocol(format!(
                    "lane '{lane}' is not on route '{}' of vehicle '{vehicle}'",
                    v.route
                ))
            })?;
        v.route_pos = route_pos;
        v.lane_pos = pos;
        if let Some(index) = lane.rsplit('_').next().and_then(|s| s.parse().ok()) {
            v.lane_index = index;
        }
        Ok(())
    }

    fn slow_down(&mut self, vehicle: &str, speed: f64, _duration_secs: f64) -> TraciResult<()> {
        let mut guard = self.state();
        let state = &mut *guard;
        state.touch(vehicle)?;
        let v = state.vehicles.get_mut(vehicle).ok_or_else(|| missing(vehicle))?;
        v.pending_speed = Some(speed);
        state.slowdown_log.push((vehicle.to_owned(), speed));
        Ok(())
    }

    fn close(&mut self) -> TraciResult<()> {
        Ok(())
    }
}
