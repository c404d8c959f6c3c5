use bytes::{Buf, BufMut};

use crate::error::{Error, Result};

/// Size in bytes of the 4-byte datagram header shared by every message type.
pub const HEADER_LEN: usize = 4;

/// Whole-datagram ceiling, inclusive of the header. Workers size their
/// receive buffers to this; the chunk server uses it to bound `data_len`.
pub const MAX_PACKET_SIZE: usize = 512;

/// Message type codes, authoritative field order documented per-variant in
/// [`crate::wire::message`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    Register = 0x01,
    Config = 0x02,
    StringChunk = 0x03,
    RequestChunk = 0x04,
    Start = 0x05,
    Handover = 0x06,
    Done = 0x07,
    Upload = 0x08,
    Ack = 0x09,
    Error = 0x0A,
}

impl MsgType {
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MsgType {
    type Error = Error;

    fn try_from(b: u8) -> Result<Self> {
        Ok(match b {
            0x01 => MsgType::Register,
            0x02 => MsgType::Config,
            0x03 => MsgType::StringChunk,
            0x04 => MsgType::RequestChunk,
            0x05 => MsgType::Start,
            0x06 => MsgType::Handover,
            0x07 => MsgType::Done,
            0x08 => MsgType::Upload,
            0x09 => MsgType::Ack,
            0x0A => MsgType::Error,
            other => return Err(Error::UnknownMessageType(other)),
        })
    }
}

/// The 4-byte header common to every datagram: `type`, `seq_no`, and the
/// big-endian `payload_length` that follows it. `seq_no` is a single byte
/// (not big-endian, per the wire format's "except single-byte fields" rule).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub msg_type: MsgType,
    pub seq_no: u8,
    pub payload_length: u16,
}

impl Header {
    pub fn encode_to(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.msg_type.value());
        buf.put_u8(self.seq_no);
        buf.put_u16(self.payload_length);
    }

    pub fn decode_from(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < HEADER_LEN {
            return Err(Error::Truncated {
                len: buf.remaining(),
            });
        }
        let msg_type = MsgType::try_from(buf.get_u8())?;
        let seq_no = buf.get_u8();
        let payload_length = buf.get_u16();
        Ok(Header {
            msg_type,
            seq_no,
            payload_length,
        })
    }
}

#[cfg(test)]
mod header_test {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn round_trips() {
        let h = Header {
            msg_type: MsgType::Handover,
            seq_no: 7,
            payload_length: 300,
        };
        let mut buf = BytesMut::new();
        h.encode_to(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);

        let mut frozen = buf.freeze();
        let got = Header::decode_from(&mut frozen).unwrap();
        assert_eq!(got, h);
    }

    #[test]
    fn rejects_short_buffer() {
        let mut buf = bytes::Bytes::from_static(&[0x01, 0x00]);
        let err = Header::decode_from(&mut buf).unwrap_err();
        assert!(matches!(err, Error::Truncated { len: 2 }));
    }

    #[test]
    fn rejects_unknown_type() {
        let mut buf = bytes::Bytes::from_static(&[0xFF, 0x00, 0x00, 0x00]);
        let err = Header::decode_from(&mut buf).unwrap_err();
        assert!(matches!(err, Error::UnknownMessageType(0xFF)));
    }
}
