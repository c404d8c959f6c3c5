use bytes::Bytes;

use crate::wire::{Payload, HEADER_LEN, MAX_PACKET_SIZE};

/// Size in bytes of STRING_CHUNK's fixed fields (`offset`, `data_len`,
/// `total_len`), ahead of the variable-length `data` tail.
const STRING_CHUNK_HEADER_SIZE: usize = 4 + 2 + 4;

/// Largest `data` slice that still keeps a whole STRING_CHUNK datagram
/// within [`MAX_PACKET_SIZE`].
pub const MAX_DATA_PER_CHUNK: usize = MAX_PACKET_SIZE - HEADER_LEN - STRING_CHUNK_HEADER_SIZE;

/// Serves one REQUEST_CHUNK against the full expanded string. Stateless: the
/// same `(offset, max_len)` against the same string always yields the same
/// chunk. An `offset` at or past the end of the string yields the
/// zero-length terminator chunk.
pub fn serve_chunk(full_string: &str, offset: u32, max_len: u16) -> Payload {
    let bytes = full_string.as_bytes();
    let total_len = bytes.len() as u32;

    let data = if offset as usize >= bytes.len() {
        Bytes::new()
    } else {
        let available = bytes.len() - offset as usize;
        let n = (max_len as usize).min(available).min(MAX_DATA_PER_CHUNK);
        Bytes::copy_from_slice(&bytes[offset as usize..offset as usize + n])
    };

    Payload::StringChunk {
        offset,
        data_len: data.len() as u16,
        total_len,
        data,
    }
}

#[cfg(test)]
mod chunkserver_test {
    use super::*;

    #[test]
    fn serves_requested_slice() {
        let payload = serve_chunk("F+F-F-F+F", 2, 4);
        match payload {
            Payload::StringChunk {
                offset,
                data_len,
                total_len,
                data,
            } => {
                assert_eq!(offset, 2);
                assert_eq!(data_len, 4);
                assert_eq!(total_len, 9);
                assert_eq!(&data[..], b"F-F-");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn clamps_to_remaining_length() {
        let payload = serve_chunk("F+F", 1, 100);
        match payload {
            Payload::StringChunk { data_len, data, .. } => {
                assert_eq!(data_len, 2);
                assert_eq!(&data[..], b"+F");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn offset_past_end_yields_zero_length_terminator() {
        let payload = serve_chunk("F", 5, 10);
        match payload {
            Payload::StringChunk {
                offset,
                data_len,
                total_len,
                data,
            } => {
                assert_eq!(offset, 5);
                assert_eq!(data_len, 0);
                assert_eq!(total_len, 1);
                assert!(data.is_empty());
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn duplicate_requests_are_identical() {
        let a = serve_chunk("F+F-F-F+F", 0, 3);
        let b = serve_chunk("F+F-F-F+F", 0, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn never_exceeds_max_data_per_chunk() {
        let long = "F".repeat(MAX_DATA_PER_CHUNK * 2);
        let payload = serve_chunk(&long, 0, u16::MAX);
        match payload {
            Payload::StringChunk { data_len, .. } => {
                assert_eq!(data_len as usize, MAX_DATA_PER_CHUNK);
            }
            _ => panic!("wrong variant"),
        }
    }
}
