pub mod header;
pub mod message;

pub use header::{Header, MsgType, HEADER_LEN, MAX_PACKET_SIZE};
pub use message::{decode_datagram, encode_datagram, Direction, Payload, StackItem};
