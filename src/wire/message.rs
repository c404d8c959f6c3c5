use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::wire::header::{Header, MsgType, HEADER_LEN};

/// Exit direction a turtle reports when it leaves a worker's region.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl TryFrom<u8> for Direction {
    type Error = Error;

    fn try_from(b: u8) -> Result<Self> {
        Ok(match b {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            3 => Direction::West,
            _ => return Err(Error::Malformed(MsgType::Handover.value(), "exit_dir out of range")),
        })
    }
}

/// One (x, y, heading) triple in a turtle's bracket stack. The orchestrator
/// never interprets these, only forwards them verbatim on handover.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StackItem {
    pub x: u16,
    pub y: u16,
    pub angle: i16,
}

impl StackItem {
    const LEN: usize = 6;

    fn encode_to(&self, buf: &mut impl BufMut) {
        buf.put_u16(self.x);
        buf.put_u16(self.y);
        buf.put_i16(self.angle);
    }

    fn decode_from(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < Self::LEN {
            return Err(Error::PayloadTruncated {
                expected: Self::LEN,
                got: buf.remaining(),
            });
        }
        Ok(StackItem {
            x: buf.get_u16(),
            y: buf.get_u16(),
            angle: buf.get_i16(),
        })
    }
}

/// A fully decoded datagram payload, one variant per message type in
/// section 6.1 of the wire format. Field order within each variant mirrors
/// the wire layout exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Register {
        node_port: u16,
    },
    Config {
        node_id: u8,
        step_size: u8,
        angle: u16,
        x_min: u16,
        x_max: u16,
        y_min: u16,
        y_max: u16,
    },
    StringChunk {
        offset: u32,
        data_len: u16,
        total_len: u32,
        data: Bytes,
    },
    RequestChunk {
        offset: u32,
        max_len: u16,
    },
    Start {
        start_x: u16,
        start_y: u16,
        start_angle: i16,
        string_pos: u32,
    },
    Handover {
        target_node_id: u8,
        exit_dir: u8,
        string_pos: u32,
        current_x: u16,
        current_y: u16,
        current_angle: i16,
        stack: Vec<StackItem>,
    },
    Done {
        node_id: u8,
        total_steps: u32,
    },
    Upload {
        node_id: u8,
        total_width: u8,
        total_height: u8,
        fragment_id: u8,
        total_fragments: u8,
        row_start: u16,
        row_count: u16,
        pixels: Bytes,
    },
    Ack {
        acked_type: u8,
        acked_seq: u8,
    },
    ErrorMsg {
        error_code: u8,
        message: Bytes,
    },
}

impl Payload {
    pub fn msg_type(&self) -> MsgType {
        match self {
            Payload::Register { .. } => MsgType::Register,
            Payload::Config { .. } => MsgType::Config,
            Payload::StringChunk { .. } => MsgType::StringChunk,
            Payload::RequestChunk { .. } => MsgType::RequestChunk,
            Payload::Start { .. } => MsgType::Start,
            Payload::Handover { .. } => MsgType::Handover,
            Payload::Done { .. } => MsgType::Done,
            Payload::Upload { .. } => MsgType::Upload,
            Payload::Ack { .. } => MsgType::Ack,
            Payload::ErrorMsg { .. } => MsgType::Error,
        }
    }

    pub fn encode_to(&self, buf: &mut BytesMut) {
        match self {
            Payload::Register { node_port } => {
                buf.put_u16(*node_port);
            }
            Payload::Config {
                node_id,
                step_size,
                angle,
                x_min,
                x_max,
                y_min,
                y_max,
            } => {
                buf.put_u8(*node_id);
                buf.put_u8(*step_size);
                buf.put_u16(*angle);
                buf.put_u16(*x_min);
                buf.put_u16(*x_max);
                buf.put_u16(*y_min);
                buf.put_u16(*y_max);
            }
            Payload::StringChunk {
                offset,
                data_len,
                total_len,
                data,
            } => {
                buf.put_u32(*offset);
                buf.put_u16(*data_len);
                buf.put_u32(*total_len);
                buf.put_slice(data);
            }
            Payload::RequestChunk { offset, max_len } => {
                buf.put_u32(*offset);
                buf.put_u16(*max_len);
            }
            Payload::Start {
                start_x,
                start_y,
                start_angle,
                string_pos,
            } => {
                buf.put_u16(*start_x);
                buf.put_u16(*start_y);
                buf.put_i16(*start_angle);
                buf.put_u32(*string_pos);
            }
            Payload::Handover {
                target_node_id,
                exit_dir,
                string_pos,
                current_x,
                current_y,
                current_angle,
                stack,
            } => {
                buf.put_u8(*target_node_id);
                buf.put_u8(*exit_dir);
                buf.put_u32(*string_pos);
                buf.put_u16(*current_x);
                buf.put_u16(*current_y);
                buf.put_i16(*current_angle);
                buf.put_u16(stack.len() as u16);
                for item in stack {
                    item.encode_to(buf);
                }
            }
            Payload::Done {
                node_id,
                total_steps,
            } => {
                buf.put_u8(*node_id);
                buf.put_u32(*total_steps);
            }
            Payload::Upload {
                node_id,
                total_width,
                total_height,
                fragment_id,
                total_fragments,
                row_start,
                row_count,
                pixels,
            } => {
                buf.put_u8(*node_id);
                buf.put_u8(*total_width);
                buf.put_u8(*total_height);
                buf.put_u8(*fragment_id);
                buf.put_u8(*total_fragments);
                buf.put_u16(*row_start);
                buf.put_u16(*row_count);
                buf.put_slice(pixels);
            }
            Payload::Ack {
                acked_type,
                acked_seq,
            } => {
                buf.put_u8(*acked_type);
                buf.put_u8(*acked_seq);
            }
            Payload::ErrorMsg {
                error_code,
                message,
            } => {
                buf.put_u8(*error_code);
                buf.put_slice(message);
            }
        }
    }

    fn decode(msg_type: MsgType, buf: &mut impl Buf) -> Result<Self> {
        let need = |buf: &dyn Buf, n: usize| -> Result<()> {
            if buf.remaining() < n {
                Err(Error::PayloadTruncated {
                    expected: n,
                    got: buf.remaining(),
                })
            } else {
                Ok(())
            }
        };

        Ok(match msg_type {
            MsgType::Register => {
                need(buf, 2)?;
                Payload::Register {
                    node_port: buf.get_u16(),
                }
            }
            MsgType::Config => {
                need(buf, 12)?;
                Payload::Config {
                    node_id: buf.get_u8(),
                    step_size: buf.get_u8(),
                    angle: buf.get_u16(),
                    x_min: buf.get_u16(),
                    x_max: buf.get_u16(),
                    y_min: buf.get_u16(),
                    y_max: buf.get_u16(),
                }
            }
            MsgType::StringChunk => {
                need(buf, 10)?;
                let offset = buf.get_u32();
                let data_len = buf.get_u16();
                let total_len = buf.get_u32();
                need(buf, data_len as usize)?;
                let data = buf.copy_to_bytes(data_len as usize);
                Payload::StringChunk {
                    offset,
                    data_len,
                    total_len,
                    data,
                }
            }
            MsgType::RequestChunk => {
                need(buf, 6)?;
                Payload::RequestChunk {
                    offset: buf.get_u32(),
                    max_len: buf.get_u16(),
                }
            }
            MsgType::Start => {
                need(buf, 8)?;
                Payload::Start {
                    start_x: buf.get_u16(),
                    start_y: buf.get_u16(),
                    start_angle: buf.get_i16(),
                    string_pos: buf.get_u32(),
                }
            }
            MsgType::Handover => {
                need(buf, 12)?;
                let target_node_id = buf.get_u8();
                let exit_dir = buf.get_u8();
                let string_pos = buf.get_u32();
                let current_x = buf.get_u16();
                let current_y = buf.get_u16();
                let current_angle = buf.get_i16();
                let stack_depth = buf.get_u16();
                let mut stack = Vec::with_capacity(stack_depth as usize);
                for _ in 0..stack_depth {
                    stack.push(StackItem::decode_from(buf)?);
                }
                Payload::Handover {
                    target_node_id,
                    exit_dir,
                    string_pos,
                    current_x,
                    current_y,
                    current_angle,
                    stack,
                }
            }
            MsgType::Done => {
                need(buf, 5)?;
                Payload::Done {
                    node_id: buf.get_u8(),
                    total_steps: buf.get_u32(),
                }
            }
            MsgType::Upload => {
                need(buf, 9)?;
                let node_id = buf.get_u8();
                let total_width = buf.get_u8();
                let total_height = buf.get_u8();
                let fragment_id = buf.get_u8();
                let total_fragments = buf.get_u8();
                let row_start = buf.get_u16();
                let row_count = buf.get_u16();
                let pixel_count = row_count as usize * total_width as usize;
                need(buf, pixel_count)?;
                let pixels = buf.copy_to_bytes(pixel_count);
                Payload::Upload {
                    node_id,
                    total_width,
                    total_height,
                    fragment_id,
                    total_fragments,
                    row_start,
                    row_count,
                    pixels,
                }
            }
            MsgType::Ack => {
                need(buf, 2)?;
                Payload::Ack {
                    acked_type: buf.get_u8(),
                    acked_seq: buf.get_u8(),
                }
            }
            MsgType::Error => {
                need(buf, 1)?;
                let error_code = buf.get_u8();
                let message = buf.copy_to_bytes(buf.remaining());
                Payload::ErrorMsg {
                    error_code,
                    message,
                }
            }
        })
    }
}

/// Encodes a full datagram (header + payload) ready to hand to a socket.
pub fn encode_datagram(seq_no: u8, payload: &Payload) -> BytesMut {
    let mut body = BytesMut::new();
    payload.encode_to(&mut body);

    let header = Header {
        msg_type: payload.msg_type(),
        seq_no,
        payload_length: body.len() as u16,
    };

    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    header.encode_to(&mut out);
    out.extend_from_slice(&body);
    out
}

/// Decodes a full datagram into its header and payload. Returns
/// [`Error::Truncated`] if the buffer is too short for even the header, and
/// [`Error::PayloadTruncated`] if the declared `payload_length` runs past
/// the end of the buffer.
pub fn decode_datagram(mut buf: &[u8]) -> Result<(Header, Payload)> {
    let header = Header::decode_from(&mut buf)?;
    if buf.len() < header.payload_length as usize {
        return Err(Error::PayloadTruncated {
            expected: header.payload_length as usize,
            got: buf.len(),
        });
    }
    let mut payload_buf = &buf[..header.payload_length as usize];
    let payload = Payload::decode(header.msg_type, &mut payload_buf)?;
    Ok((header, payload))
}

#[cfg(test)]
mod message_test;
