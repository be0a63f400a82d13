//! The `TraciClient` trait — one connection to one simulator process.

use parsim_core::SimTime;

use crate::TraciResult;

/// The slice of the TraCI surface the coordinator depends on.
///
/// One implementor instance corresponds to one TCP connection to one
/// simulator process; a TraCI connection is a single request/response stream,
/// so every operation takes `&mut self`.
///
/// Vehicle, route, edge and lane identifiers are the opaque strings the
/// simulator assigns; the coordinator never parses them beyond the split-route
/// naming convention.
///
/// # Errors
///
/// Vehicle-addressed reads and writes may fail with a transient error
/// ([`TraciError::is_transient`]) when the vehicle has already been removed
/// or has not yet been inserted; callers in the coordination layer swallow
/// those and continue.  Everything else (connection loss, protocol faults) is
/// fatal to the run.
pub trait TraciClient: Send {
    /// Current simulated time.  Monotone non-decreasing within a connection.
    fn current_time(&mut self) -> TraciResult<SimTime>;

    /// Advance the simulator by exactly one delta-t tick.  Blocking.
    fn step(&mut self) -> TraciResult<()>;

    /// Seconds of simulated time per tick.
    fn delta_t(&mut self) -> TraciResult<f64>;

    /// Identifiers of the vehicles currently on `edge`, in the order the
    /// simulator reports them.
    fn vehicles_on_edge(&mut self, edge: &str) -> TraciResult<Vec<String>>;

    /// The edges of a named route, in driving order.
    fn route_edges(&mut self, route: &str) -> TraciResult<Vec<String>>;

    // ── Per-vehicle reads ─────────────────────────────────────────────────

    fn vehicle_type(&mut self, vehicle: &str) -> TraciResult<String>;
    fn route_id(&mut self, vehicle: &str) -> TraciResult<String>;
    fn lane_index(&mut self, vehicle: &str) -> TraciResult<i32>;
    fn lane_id(&mut self, vehicle: &str) -> TraciResult<String>;
    fn lane_position(&mut self, vehicle: &str) -> TraciResult<f64>;
    fn speed(&mut self, vehicle: &str) -> TraciResult<f64>;

    // ── Per-vehicle writes ────────────────────────────────────────────────

    /// Insert a vehicle departing now on the first edge of `route`, at the
    /// given lane index, position along the lane, and initial speed.
    fn add_vehicle(
        &mut self,
        vehicle: &str,
        route: &str,
        vehicle_type: &str,
        lane_index: i32,
        depart_pos: f64,
        speed: f64,
    ) -> TraciResult<()>;

    /// Relocate a vehicle to an exact position on a lane.
    fn move_to(&mut self, vehicle: &str, lane: &str, pos: f64) -> TraciResult<()>;

    /// Clamp the vehicle's speed to `speed` over `duration_secs` of simulated
    /// time (the coordinator always passes the simulator's own delta-t).
    fn slow_down(&mut self, vehicle: &str, speed: f64, duration_secs: f64) -> TraciResult<()>;

    /// Release the connection.
    fn close(&mut self) -> TraciResult<()>;
}
