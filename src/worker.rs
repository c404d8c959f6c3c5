use std::net::SocketAddr;

use crate::region::{assign_region, Region, MAX_NODES, NODE_BITMAP_W};

/// Reference packet size the expected-fragments heuristic was calibrated
/// against; distinct from the current [`crate::wire::MAX_PACKET_SIZE`].
const LEGACY_PACKET_SIZE: usize = 256;
const UPLOAD_HEADER_SIZE: usize = 9;
const DATAGRAM_HEADER_SIZE: usize = 4;

/// Rows of node-bitmap pixels that fit in one UPLOAD fragment under the
/// legacy packet size, and the resulting fragment count for the full
/// node bitmap height. Reproduces the reference implementation's
/// pre-computed value of 2.
fn default_expected_fragments() -> u8 {
    let max_payload_pixels = LEGACY_PACKET_SIZE - DATAGRAM_HEADER_SIZE - UPLOAD_HEADER_SIZE;
    let rows_per_fragment = max_payload_pixels / NODE_BITMAP_W as usize;
    let height = crate::region::NODE_BITMAP_H as usize;
    ((height + rows_per_fragment - 1) / rows_per_fragment) as u8
}

/// A worker's lifecycle state, driven solely by inbound REGISTER/DONE and
/// canvas-exit handovers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Unregistered,
    Configured,
    Finished,
}

/// Everything the orchestrator tracks about one rendering worker.
#[derive(Debug, Clone)]
pub struct Worker {
    pub addr: SocketAddr,
    pub region: Region,
    pub state: WorkerState,
    pub expected_fragments: u8,
    pub fragments_received: u8,
    /// Set once the first UPLOAD's `total_fragments` has superseded the
    /// registration-time heuristic (see the expected-fragments open question).
    pub fragments_confirmed: bool,
}

impl Worker {
    fn new(index: usize, addr: SocketAddr) -> Worker {
        Worker {
            addr,
            region: assign_region(index),
            state: WorkerState::Configured,
            expected_fragments: default_expected_fragments(),
            fragments_received: 0,
            fragments_confirmed: false,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.fragments_received >= self.expected_fragments
    }
}

/// The fixed-size table of up to [`MAX_NODES`] workers, keyed by the
/// `(address, port)` of their REGISTER datagram.
#[derive(Debug, Default)]
pub struct WorkerTable {
    workers: Vec<Worker>,
}

impl WorkerTable {
    pub fn new() -> WorkerTable {
        WorkerTable {
            workers: Vec::with_capacity(MAX_NODES),
        }
    }

    pub fn find_index(&self, addr: SocketAddr) -> Option<usize> {
        self.workers.iter().position(|w| w.addr == addr)
    }

    /// Registers `addr` as a new worker, or returns the index of an existing
    /// registration for the same endpoint (idempotent REGISTER). Once the
    /// table is at [`MAX_NODES`], every REGISTER is dropped — `None` is
    /// returned even for a replay from an already-registered endpoint,
    /// matching the reference implementation's unconditional capacity gate.
    pub fn register(&mut self, addr: SocketAddr) -> Option<usize> {
        if self.workers.len() >= MAX_NODES {
            return None;
        }
        if let Some(i) = self.find_index(addr) {
            return Some(i);
        }
        let index = self.workers.len();
        self.workers.push(Worker::new(index, addr));
        Some(index)
    }

    pub fn get(&self, index: usize) -> Option<&Worker> {
        self.workers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Worker> {
        self.workers.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.workers.len() >= MAX_NODES
    }

    pub fn all_delivered(&self) -> bool {
        self.workers.len() == MAX_NODES && self.workers.iter().all(|w| w.is_delivered())
    }
}
