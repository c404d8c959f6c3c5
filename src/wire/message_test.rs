use super::*;
use bytes::Bytes;

#[test]
fn register_round_trips() {
    let payload = Payload::Register { node_port: 5101 };
    let encoded = encode_datagram(3, &payload);
    let (header, decoded) = decode_datagram(&encoded).unwrap();
    assert_eq!(header.msg_type, MsgType::Register);
    assert_eq!(header.seq_no, 3);
    assert_eq!(decoded, payload);
}

#[test]
fn handover_round_trips_with_stack() {
    let payload = Payload::Handover {
        target_node_id: 2,
        exit_dir: Direction::East as u8,
        string_pos: 128,
        current_x: 19,
        current_y: 4,
        current_angle: 90,
        stack: vec![
            StackItem { x: 1, y: 1, angle: 0 },
            StackItem { x: 2, y: 3, angle: -90 },
        ],
    };
    let encoded = encode_datagram(9, &payload);
    let (header, decoded) = decode_datagram(&encoded).unwrap();
    assert_eq!(header.msg_type, MsgType::Handover);
    assert_eq!(decoded, payload);
}

#[test]
fn handover_round_trips_empty_stack() {
    let payload = Payload::Handover {
        target_node_id: 0,
        exit_dir: Direction::North as u8,
        string_pos: 0,
        current_x: 0,
        current_y: 0,
        current_angle: 0,
        stack: Vec::new(),
    };
    let encoded = encode_datagram(0, &payload);
    let (_, decoded) = decode_datagram(&encoded).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn string_chunk_round_trips() {
    let payload = Payload::StringChunk {
        offset: 40,
        data_len: 3,
        total_len: 512,
        data: Bytes::from_static(b"F+F"),
    };
    let encoded = encode_datagram(1, &payload);
    let (_, decoded) = decode_datagram(&encoded).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn upload_round_trips() {
    let pixels = Bytes::from(vec![b'*'; 20 * 2]);
    let payload = Payload::Upload {
        node_id: 1,
        total_width: 20,
        total_height: 15,
        fragment_id: 0,
        total_fragments: 2,
        row_start: 0,
        row_count: 2,
        pixels,
    };
    let encoded = encode_datagram(4, &payload);
    let (_, decoded) = decode_datagram(&encoded).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn decode_datagram_rejects_truncated_payload() {
    let payload = Payload::Done {
        node_id: 1,
        total_steps: 10,
    };
    let mut encoded = encode_datagram(1, &payload);
    encoded.truncate(encoded.len() - 2);
    let err = decode_datagram(&encoded).unwrap_err();
    assert!(matches!(err, Error::PayloadTruncated { .. }));
}

#[test]
fn error_message_consumes_remaining_bytes() {
    let payload = Payload::ErrorMsg {
        error_code: 4,
        message: Bytes::from_static(b"unregistered node"),
    };
    let encoded = encode_datagram(2, &payload);
    let (_, decoded) = decode_datagram(&encoded).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn direction_rejects_out_of_range() {
    let err = Direction::try_from(7).unwrap_err();
    assert!(matches!(err, Error::Malformed(_, _)));
}
