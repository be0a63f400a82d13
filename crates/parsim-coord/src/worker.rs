//! The per-partition worker: start-up, tick loop, and the border handlers.

use std::time::{Duration, Instant};

use log::{debug, info};

use parsim_core::PartitionId;
use parsim_net::BorderEdge;
use parsim_traci::{TraciClient, TraciError};

use crate::endpoint::SimulatorEndpoint;
use crate::error::{CoordError, CoordResult};
use crate::observer::RunObserver;
use crate::partition::Partition;
use crate::set::PartitionSet;
use crate::synch::Clients;

/// Vehicle and route ids containing this marker follow the route cutter's
/// `<base>_part<k>` fragment naming.
const SPLIT_ROUTE_MARKER: &str = "_part";

const CONNECT_BACKOFF_INITIAL: Duration = Duration::from_millis(100);
const CONNECT_BACKOFF_MAX: Duration = Duration::from_secs(2);
const CONNECT_DEADLINE: Duration = Duration::from_secs(30);

// ── Worker entry point ────────────────────────────────────────────────────────

/// Drive one partition from process launch to end time.
///
/// A worker that fails before the start-up rendezvous leaves its peers parked
/// at the barrier; there is no cancellation path (accepted limitation — the
/// operator kills the run).
pub(crate) fn run_partition<E: SimulatorEndpoint>(
    set: &PartitionSet<E::Client>,
    endpoint: &E,
    id: PartitionId,
    observer: &dyn RunObserver,
) -> CoordResult<()> {
    endpoint.launch(id)?;
    let client = connect_with_retry(endpoint, id)?;
    set.synch().clients().install(id, client);

    // No partition may touch a peer before every client is installed.
    set.synch().barrier_wait();
    observer.on_partition_connected(id);
    info!("partition {id} connected and synchronized");

    let me = set.partition(id);
    let mut to_memory = EdgeMemory::new(me.to_edges().len());
    let mut from_memory = EdgeMemory::new(me.from_edges().len());

    loop {
        let now = set.synch().clients().current_time(id)?;
        if now >= me.end_time() {
            break;
        }

        me.set_waiting(false);
        set.synch().clients().step(id)?;
        handle_to_edges(set, me, &mut to_memory, observer)?;
        handle_from_edges(set, me, &mut from_memory, observer)?;
        observer.on_tick(id, now);

        // No partition begins tick k+1 until all have finished tick k.
        me.set_waiting(true);
        set.synch().barrier_wait();
    }

    // All partitions share one end time, so every worker passes the final
    // barrier before any client is closed; no peer operation can race this.
    me.set_waiting(true);
    if let Some(mut client) = set.synch().clients().take(id) {
        client.close().map_err(CoordError::Client)?;
    }
    info!("partition {id} finished at {}", me.end_time());
    Ok(())
}

fn connect_with_retry<E: SimulatorEndpoint>(
    endpoint: &E,
    id: PartitionId,
) -> CoordResult<E::Client> {
    let deadline = Instant::now() + CONNECT_DEADLINE;
    let mut backoff = CONNECT_BACKOFF_INITIAL;
    loop {
        match endpoint.connect(id) {
            Ok(client) => return Ok(client),
            // The simulator may still be starting up; only refused
            // connections are worth retrying.
            Err(e @ TraciError::Connect { .. }) if Instant::now() + backoff < deadline => {
                debug!("partition {id}: {e}; retrying in {backoff:?}");
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(CONNECT_BACKOFF_MAX);
            }
            Err(e) => return Err(CoordError::Connect { id, source: e }),
        }
    }
}

// ── Border handlers ───────────────────────────────────────────────────────────

/// Incoming borders: a vehicle seen on an incoming border edge for at least
/// two ticks has been handed off — this side's measurement is authoritative,
/// so push it back to the upstream copy.
fn handle_to_edges<C: TraciClient>(
    set: &PartitionSet<C>,
    me: &Partition,
    memory: &mut EdgeMemory,
    observer: &dyn RunObserver,
) -> CoordResult<()> {
    for (slot, edge) in me.to_edges().iter().enumerate() {
        let current = set.synch().clients().vehicles_on_edge(me.id(), &edge.id)?;
        if current.is_empty() {
            continue;
        }
        let mut aborted = false;
        for vehicle in &current {
            if !memory.contains(slot, vehicle) {
                continue;
            }
            match begin_peer_update(set, me, edge.from) {
                Handshake::Aborted => {
                    aborted = true;
                    observer.on_handshake_abort(me.id(), edge.from);
                    continue;
                }
                Handshake::Acquired => {}
            }
            with_peer_released(set, edge.from, |clients| {
                push_speed_upstream(clients, me, edge, vehicle, observer)
            })?;
        }
        if !aborted {
            memory.observe(slot, current);
        }
    }
    Ok(())
}

fn push_speed_upstream<C: TraciClient>(
    clients: &mut Clients<'_, C>,
    me: &Partition,
    edge: &BorderEdge,
    vehicle: &str,
    observer: &dyn RunObserver,
) -> CoordResult<()> {
    // The upstream copy may already have left the simulation.
    let upstream = clients.vehicles_on_edge(edge.from, &edge.id)?;
    if !upstream.iter().any(|v| v == vehicle) {
        return Ok(());
    }

    let Some(speed) = swallow_transient(clients.speed(me.id(), vehicle), me.id(), observer)?
    else {
        return Ok(());
    };
    let pushed = swallow_transient(
        clients.slow_down(edge.from, vehicle, speed),
        me.id(),
        observer,
    )?;
    if pushed.is_some() {
        observer.on_speed_propagated(me.id(), edge.from, &edge.id, vehicle, speed);
    }
    Ok(())
}

/// Outgoing borders: a vehicle appearing on an outgoing border edge for the
/// first time has just left this partition — mirror it into the downstream
/// one, carrying type, route, lane index, position and speed.
fn handle_from_edges<C: TraciClient>(
    set: &PartitionSet<C>,
    me: &Partition,
    memory: &mut EdgeMemory,
    observer: &dyn RunObserver,
) -> CoordResult<()> {
    for (slot, edge) in me.from_edges().iter().enumerate() {
        let current = set.synch().clients().vehicles_on_edge(me.id(), &edge.id)?;
        if current.is_empty() {
            continue;
        }
        let mut aborted = false;
        for vehicle in &current {
            if memory.contains(slot, vehicle) {
                continue;
            }
            match begin_peer_update(set, me, edge.to) {
                Handshake::Aborted => {
                    aborted = true;
                    observer.on_handshake_abort(me.id(), edge.to);
                    continue;
                }
                Handshake::Acquired => {}
            }
            with_peer_released(set, edge.to, |clients| {
                mirror_downstream(clients, me, edge, vehicle, observer)
            })?;
        }
        if !aborted {
            memory.observe(slot, current);
        }
    }
    Ok(())
}

fn mirror_downstream<C: TraciClient>(
    clients: &mut Clients<'_, C>,
    me: &Partition,
    edge: &BorderEdge,
    vehicle: &str,
    observer: &dyn RunObserver,
) -> CoordResult<()> {
    // A vehicle that starts life on a border edge already exists downstream.
    let downstream = clients.vehicles_on_edge(edge.to, &edge.id)?;
    if downstream.iter().any(|v| v == vehicle) {
        return Ok(());
    }

    let id = me.id();
    let Some(route) = swallow_transient(clients.route_id(id, vehicle), id, observer)? else {
        return Ok(());
    };
    let route = if vehicle.contains(SPLIT_ROUTE_MARKER) {
        match swallow_transient(split_route_for(clients, edge, &route), id, observer)? {
            Some(fragment) => fragment,
            // The fragment scan hit a route the downstream partition does not
            // know; skip this tick and re-attempt on the next sighting.
            None => return Ok(()),
        }
    } else {
        route
    };

    let Some(vehicle_type) = swallow_transient(clients.vehicle_type(id, vehicle), id, observer)?
    else {
        return Ok(());
    };
    let Some(lane_index) = swallow_transient(clients.lane_index(id, vehicle), id, observer)?
    else {
        return Ok(());
    };
    let Some(lane) = swallow_transient(clients.lane_id(id, vehicle), id, observer)? else {
        return Ok(());
    };
    let Some(pos) = swallow_transient(clients.lane_position(id, vehicle), id, observer)? else {
        return Ok(());
    };
    let Some(speed) = swallow_transient(clients.speed(id, vehicle), id, observer)? else {
        return Ok(());
    };

    let added = swallow_transient(
        clients.add_vehicle(edge.to, vehicle, &route, &vehicle_type, lane_index, pos, speed),
        id,
        observer,
    )?;
    if added.is_none() {
        return Ok(());
    }
    if swallow_transient(clients.move_to(edge.to, vehicle, &lane, pos), id, observer)?.is_none() {
        return Ok(());
    }
    observer.on_vehicle_transferred(id, edge.to, &edge.id, vehicle);
    Ok(())
}

/// Resolve the downstream route fragment for a split route: scan
/// `<base>_part0, _part1, …` until the downstream partition reports one whose
/// first edge is the border edge itself.
///
/// A route id without the marker is used as-is.  The scan terminates because
/// an unknown fragment comes back as a (transient) missing-route error.
fn split_route_for<C: TraciClient>(
    clients: &mut Clients<'_, C>,
    edge: &BorderEdge,
    route: &str,
) -> CoordResult<String> {
    let Some(pos) = route.find(SPLIT_ROUTE_MARKER) else {
        return Ok(route.to_owned());
    };
    let base = &route[..pos + SPLIT_ROUTE_MARKER.len()];
    let mut k = 0usize;
    loop {
        let candidate = format!("{base}{k}");
        let edges = clients.route_edges(edge.to, &candidate)?;
        if edges.first().map(String::as_str) == Some(edge.id.as_str()) {
            return Ok(candidate);
        }
        k += 1;
    }
}

// ── Handshake ─────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Handshake {
    /// The peer is parked; proceed with the locked client operations.
    Acquired,
    /// A peer announced intent on us mid-spin; the operation is abandoned
    /// for this tick.
    Aborted,
}

/// Announce intent to mutate `peer_id` and wait until it is safe.
///
/// The spin's escape hatch is the deadlock-avoidance rule for two-way border
/// roads: when two partitions try to update each other in the same tick,
/// whichever observes its own `synching` flag first backs off without
/// touching the peer's client, clearing the flag it raised so the peer is
/// not left parked.
pub(crate) fn begin_peer_update<C: TraciClient>(
    set: &PartitionSet<C>,
    me: &Partition,
    peer_id: PartitionId,
) -> Handshake {
    // Someone is already operating on us; yield to them first.
    if me.is_synching() {
        set.synch().wait_for_synch(me);
    }

    let peer = set.partition(peer_id);
    peer.set_synching(true);
    while !peer.is_waiting() {
        if me.is_synching() {
            // The flag must clear under the lock — wait_for_synch checks it
            // under the lock, and an unlocked clear could slip into the gap
            // between that check and the condvar park, losing the wakeup.
            let clients = set.synch().clients();
            peer.set_synching(false);
            drop(clients);
            set.synch().notify_peers();
            return Handshake::Aborted;
        }
        std::hint::spin_loop();
    }
    Handshake::Acquired
}

/// Run `op` under the global lock, then withdraw the intent raised by
/// [`begin_peer_update`] and wake the peer.
///
/// The flag clears inside the critical section (see the comment in
/// [`begin_peer_update`]); the condvar is signalled after the lock drops.
fn with_peer_released<C: TraciClient, T>(
    set: &PartitionSet<C>,
    peer_id: PartitionId,
    op: impl FnOnce(&mut Clients<'_, C>) -> CoordResult<T>,
) -> CoordResult<T> {
    let mut clients = set.synch().clients();
    let result = op(&mut clients);
    set.partition(peer_id).set_synching(false);
    drop(clients);
    set.synch().notify_peers();
    result
}

// ── Per-edge vehicle memory ───────────────────────────────────────────────────

/// The vehicles observed on each border edge at the previous tick.
///
/// Owned by the worker and touched only from its own tick body.  A fresh
/// observation replaces the memory only when it is non-empty, so a transient
/// empty read never erases history; and the handlers skip the update for an
/// edge whose tick had a handshake abort, so the skipped vehicle is
/// re-detected next tick.
pub(crate) struct EdgeMemory {
    seen: Vec<Vec<String>>,
}

impl EdgeMemory {
    pub(crate) fn new(edges: usize) -> Self {
        EdgeMemory { seen: vec![Vec::new(); edges] }
    }

    pub(crate) fn contains(&self, slot: usize, vehicle: &str) -> bool {
        self.seen[slot].iter().any(|v| v == vehicle)
    }

    pub(crate) fn observe(&mut self, slot: usize, current: Vec<String>) {
        if !current.is_empty() {
            self.seen[slot] = current;
        }
    }
}

// ── Error plumbing ────────────────────────────────────────────────────────────

/// Transient vehicle-state errors are recovered locally: count, log, move on.
fn swallow_transient<T>(
    result: CoordResult<T>,
    partition: PartitionId,
    observer: &dyn RunObserver,
) -> CoordResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CoordError::Client(e)) if e.is_transient() => {
            debug!("partition {partition}: transient vehicle-state miss ({e})");
            observer.on_transient_miss(partition);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
