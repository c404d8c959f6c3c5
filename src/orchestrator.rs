use std::net::SocketAddr;

use bytes::BytesMut;

use crate::bitmap::Bitmap;
use crate::chunkserver::serve_chunk;
use crate::grammar::Grammar;
use crate::region::MAX_NODES;
use crate::router;
use crate::wire::{decode_datagram, encode_datagram, Direction, Payload};
use crate::worker::WorkerTable;

const DEFAULT_STEP_SIZE: u8 = 2;

/// A reply the dispatcher wants sent, paired with the endpoint to send it to.
/// `main` owns the actual socket; this keeps handler logic socket-free and
/// trivially testable.
pub struct Outbound {
    pub to: SocketAddr,
    pub bytes: BytesMut,
}

/// All mutable state the orchestrator owns: the worker table, the expanded
/// L-system string, the composited canvas, and the running counters.
/// Handlers operate on a single owned value, taken by exclusive reference,
/// per the single-threaded cooperative model.
pub struct Orchestrator {
    workers: WorkerTable,
    string: String,
    bitmap: Bitmap,
    angle: i64,
    seq_no: u8,
    total_handovers: u64,
    messages_sent: u64,
    messages_received: u64,
    completed: bool,
}

impl Orchestrator {
    pub fn new(grammar: &Grammar, string: String) -> Orchestrator {
        Orchestrator {
            workers: WorkerTable::new(),
            string,
            bitmap: Bitmap::new(),
            angle: grammar.angle,
            seq_no: 0,
            total_handovers: 0,
            messages_sent: 0,
            messages_received: 0,
            completed: false,
        }
    }

    fn next_seq(&mut self) -> u8 {
        let s = self.seq_no;
        self.seq_no = self.seq_no.wrapping_add(1);
        s
    }

    fn queue(&mut self, out: &mut Vec<Outbound>, to: SocketAddr, payload: Payload) {
        let seq = self.next_seq();
        let bytes = encode_datagram(seq, &payload);
        self.messages_sent += 1;
        out.push(Outbound { to, bytes });
    }

    pub fn total_handovers(&self) -> u64 {
        self.total_handovers
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Decodes and dispatches one inbound datagram. Never propagates a
    /// decode error to the caller: malformed datagrams are logged at `warn`
    /// and dropped. Returns the datagrams that should be sent in response,
    /// if any.
    pub fn handle_datagram(&mut self, src: SocketAddr, buf: &[u8]) -> Vec<Outbound> {
        let mut out = Vec::new();

        let (header, payload) = match decode_datagram(buf) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("dropping datagram from {src}: {e}");
                return out;
            }
        };
        self.messages_received += 1;

        match payload {
            Payload::Register { node_port } => self.handle_register(src, node_port, &mut out),
            Payload::RequestChunk { offset, max_len } => {
                self.handle_request_chunk(src, offset, max_len, &mut out)
            }
            Payload::Handover {
                exit_dir,
                ref stack,
                string_pos,
                current_x,
                current_y,
                current_angle,
                ..
            } => self.handle_handover(
                src,
                exit_dir,
                string_pos,
                current_x,
                current_y,
                current_angle,
                stack.clone(),
                &mut out,
            ),
            Payload::Done {
                node_id,
                total_steps,
            } => self.handle_done(src, node_id, total_steps),
            Payload::Upload {
                total_width,
                total_fragments,
                row_start,
                row_count,
                ref pixels,
                ..
            } => self.handle_upload(src, total_width, total_fragments, row_start, row_count, pixels),
            Payload::Ack { .. } => {
                log::debug!("ack from {src} for type 0x{:02x}", header.msg_type.value());
            }
            Payload::ErrorMsg {
                error_code,
                message,
            } => {
                log::warn!(
                    "error report from {src}: code=0x{error_code:02x} message={:?}",
                    String::from_utf8_lossy(&message)
                );
            }
            Payload::Config { .. } | Payload::StringChunk { .. } | Payload::Start { .. } => {
                log::warn!(
                    "unexpected orchestrator-bound message type 0x{:02x} from {src}",
                    header.msg_type.value()
                );
            }
        }

        out
    }

    fn handle_register(&mut self, src: SocketAddr, node_port: u16, out: &mut Vec<Outbound>) {
        let was_full = self.workers.is_full();
        let index = match self.workers.register(src) {
            Some(i) => i,
            None => {
                log::warn!("rejecting REGISTER from {src}: already at capacity ({MAX_NODES} nodes)");
                return;
            }
        };
        let region = self.workers.get(index).expect("just registered").region;
        log::info!("worker {index} registered from {src} (node_port={node_port})");

        self.queue(
            out,
            src,
            Payload::Config {
                node_id: index as u8,
                step_size: DEFAULT_STEP_SIZE,
                angle: self.angle as u16,
                x_min: region.x_min,
                x_max: region.x_max,
                y_min: region.y_min,
                y_max: region.y_max,
            },
        );

        if !was_full && self.workers.is_full() {
            if let Some(driver) = self.workers.get(2) {
                let start = Payload::Start {
                    start_x: driver.region.x_min + 5,
                    start_y: driver.region.y_min + 5,
                    start_angle: 0,
                    string_pos: 0,
                };
                let driver_addr = driver.addr;
                log::info!("all {MAX_NODES} workers registered, starting walk at worker 2");
                self.queue(out, driver_addr, start);
            }
        }
    }

    fn handle_request_chunk(&mut self, src: SocketAddr, offset: u32, max_len: u16, out: &mut Vec<Outbound>) {
        if self.workers.find_index(src).is_none() {
            log::warn!("dropping REQUEST_CHUNK from unregistered {src}");
            return;
        }
        if offset % 1000 == 0 {
            log::debug!("REQUEST_CHUNK offset={offset} max_len={max_len} from {src}");
        }
        let payload = serve_chunk(&self.string, offset, max_len);
        self.queue(out, src, payload);
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_handover(
        &mut self,
        src: SocketAddr,
        exit_dir: u8,
        string_pos: u32,
        current_x: u16,
        current_y: u16,
        current_angle: i16,
        stack: Vec<crate::wire::StackItem>,
        out: &mut Vec<Outbound>,
    ) {
        let source_idx = match self.workers.find_index(src) {
            Some(i) => i,
            None => {
                log::warn!("dropping HANDOVER from unregistered {src}");
                return;
            }
        };

        let dir = match Direction::try_from(exit_dir) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("dropping HANDOVER from {src}: {e}");
                return;
            }
        };

        let target_idx = router::route(source_idx, dir);

        let target = target_idx.and_then(|t| self.workers.get(t).map(|w| (t, w.addr)));

        match target {
            Some((target_idx, target_addr)) => {
                self.total_handovers += 1;
                log::info!("handover: worker {source_idx} -> worker {target_idx} (dir={dir:?})");
                self.queue(
                    out,
                    target_addr,
                    Payload::Handover {
                        target_node_id: target_idx as u8,
                        exit_dir,
                        string_pos,
                        current_x,
                        current_y,
                        current_angle,
                        stack,
                    },
                );
            }
            None => {
                log::warn!("worker {source_idx} handover exits the canvas (dir={dir:?}), marking finished");
                if let Some(w) = self.workers.get_mut(source_idx) {
                    w.state = crate::worker::WorkerState::Finished;
                }
            }
        }
    }

    fn handle_done(&mut self, src: SocketAddr, node_id: u8, total_steps: u32) {
        let idx = match self.workers.find_index(src) {
            Some(i) => i,
            None => {
                log::warn!("dropping DONE from unregistered {src}");
                return;
            }
        };
        if let Some(w) = self.workers.get_mut(idx) {
            w.state = crate::worker::WorkerState::Finished;
        }
        log::info!("worker {node_id} (idx {idx}) done after {total_steps} steps");
    }

    fn handle_upload(
        &mut self,
        src: SocketAddr,
        total_width: u8,
        total_fragments: u8,
        row_start: u16,
        row_count: u16,
        pixels: &[u8],
    ) {
        let idx = match self.workers.find_index(src) {
            Some(i) => i,
            None => {
                log::warn!("dropping UPLOAD from unregistered {src}");
                return;
            }
        };

        let (origin_x, origin_y) = {
            let w = self.workers.get_mut(idx).expect("looked up by index");
            if !w.fragments_confirmed {
                w.expected_fragments = total_fragments;
                w.fragments_confirmed = true;
            }
            (w.region.x_min, w.region.y_min + row_start)
        };

        self.bitmap
            .blit(origin_x, origin_y, total_width as u16, row_count, pixels);

        if let Some(w) = self.workers.get_mut(idx) {
            w.fragments_received += 1;
            log::debug!(
                "worker {idx} fragment received ({}/{})",
                w.fragments_received,
                w.expected_fragments
            );
        }

        if !self.completed && self.workers.all_delivered() {
            self.completed = true;
            self.print_completion();
        }
    }

    fn print_completion(&self) {
        log::info!(
            "render complete: total_handovers={} messages_sent={} messages_received={}",
            self.total_handovers,
            self.messages_sent,
            self.messages_received
        );
        println!(
            "total_handovers={} messages_sent={} messages_received={}",
            self.total_handovers, self.messages_sent, self.messages_received
        );
        print!("{}", self.bitmap.render());
    }
}
