//! Integration tests: whole frames through `PacketReader` / `PacketWriter`.
//!
//! These run the full pipeline (header, payload codec, event model) over
//! in-memory transports, so the bytes checked here are exactly the bytes
//! a desktop client would see.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread;

use discord_ipc_protocol::{
    ClosePacket, CodecConfig, Command, ErrorEvent, Event, EventKind, FrameData, FrameHeader,
    HandshakePacket, IncomingFrame, Opcode, OutgoingFrame, Packet, PacketCodec, PacketReader,
    PacketWriter, PingPacket, PongPacket, ProtocolError, ReadOutcome, ReadyConfig, ReadyEvent,
    UnknownOpcodePolicy, User, VoiceChannelSelectEvent,
};
use discord_ipc_transport::{ReadFully, StreamTransport, TransportError};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Builds a raw frame by hand, bypassing the writer.
fn raw_frame(opcode: u32, payload: &[u8]) -> Vec<u8> {
    let header = FrameHeader {
        opcode,
        length: payload.len() as u32,
    };
    let mut bytes = header.encode().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

fn reader_over(bytes: Vec<u8>) -> PacketReader<StreamTransport<Cursor<Vec<u8>>>> {
    PacketReader::new(StreamTransport::new(Cursor::new(bytes)))
}

/// Encodes packets with a real writer and returns the bytes on the wire.
fn encode_all(packets: &[Packet]) -> Vec<u8> {
    let mut writer = PacketWriter::new(StreamTransport::new(Vec::new()));
    for packet in packets {
        writer.write(packet).unwrap();
    }
    writer.into_inner().into_inner()
}

fn round_trip(packet: Packet) -> Packet {
    let mut reader = reader_over(encode_all(std::slice::from_ref(&packet)));
    reader.read().unwrap().expect("a packet should be available")
}

/// A transport fed by the test. Reads that cannot be satisfied consume
/// whatever is buffered and report "no data", like a non-blocking socket
/// read that gives up mid-buffer.
#[derive(Default)]
struct Pipe {
    buffered: VecDeque<u8>,
}

impl Pipe {
    fn feed(&mut self, bytes: &[u8]) {
        self.buffered.extend(bytes);
    }
}

impl ReadFully for Pipe {
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<bool, TransportError> {
        if self.buffered.len() < buf.len() {
            self.buffered.clear();
            return Ok(false);
        }
        for slot in buf.iter_mut() {
            *slot = self.buffered.pop_front().unwrap_or_default();
        }
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn test_round_trip_close() {
    let packet = Packet::Close(ClosePacket {
        code: 4000,
        message: "Invalid Client ID".into(),
    });
    assert_eq!(round_trip(packet.clone()), packet);
}

#[test]
fn test_round_trip_ping_and_pong() {
    let ping = Packet::Ping(PingPacket(json!({ "ts": 123 })));
    let pong = Packet::Pong(PongPacket(json!([1, "two", null])));
    assert_eq!(round_trip(ping.clone()), ping);
    assert_eq!(round_trip(pong.clone()), pong);
}

#[test]
fn test_round_trip_ready_event() {
    let packet = Packet::IncomingFrame(IncomingFrame::dispatch(ReadyEvent {
        v: Some(1),
        config: Some(ReadyConfig {
            cdn_host: Some("cdn.discordapp.com".into()),
            api_endpoint: Some("//discord.com/api".into()),
            environment: Some("production".into()),
        }),
        user: Some(User {
            id: "42".into(),
            username: "wumpus".into(),
            discriminator: Some("0".into()),
            global_name: None,
            avatar: None,
        }),
    }));
    assert_eq!(round_trip(packet.clone()), packet);
}

#[test]
fn test_round_trip_empty_ready_event() {
    let packet = Packet::IncomingFrame(IncomingFrame::dispatch(ReadyEvent::default()));
    assert_eq!(round_trip(packet.clone()), packet);
}

#[test]
fn test_round_trip_voice_channel_select_variants() {
    let cases = [
        (Some("1"), Some("2")),
        (Some("1"), None),
        (None, None),
    ];
    for (channel_id, guild_id) in cases {
        let packet = Packet::IncomingFrame(IncomingFrame::dispatch(VoiceChannelSelectEvent {
            channel_id: channel_id.map(Into::into),
            guild_id: guild_id.map(Into::into),
        }));
        assert_eq!(round_trip(packet.clone()), packet);
    }
}

#[test]
fn test_round_trip_error_event_with_nonce() {
    let packet = Packet::IncomingFrame(IncomingFrame {
        cmd: Command::Subscribe,
        nonce: Some("n-1".into()),
        data: FrameData::Event(Event::Error(ErrorEvent {
            code: 4006,
            message: "Not authenticated or invalid scope".into(),
        })),
    });
    assert_eq!(round_trip(packet.clone()), packet);
}

#[test]
fn test_round_trip_command_responses() {
    for data in [json!({ "evt": "READY" }), json!(null)] {
        let packet = Packet::IncomingFrame(IncomingFrame {
            cmd: Command::Subscribe,
            nonce: Some("abc".into()),
            data: FrameData::Response(data),
        });
        assert_eq!(round_trip(packet.clone()), packet);
    }
}

// ---------------------------------------------------------------------------
// Wire bytes
// ---------------------------------------------------------------------------

#[test]
fn test_written_header_is_little_endian() {
    // `[1,2,3,4,5]` serializes to 11 bytes.
    let bytes = encode_all(&[Packet::Pong(PongPacket(json!([1, 2, 3, 4, 5])))]);
    assert_eq!(&bytes[..8], &[0x04, 0, 0, 0, 0x0B, 0, 0, 0]);
    assert_eq!(&bytes[8..], b"[1,2,3,4,5]");
}

#[test]
fn test_written_handshake_frame() {
    let bytes = encode_all(&[HandshakePacket::new("1234").into()]);
    let payload = br#"{"v":1,"client_id":"1234"}"#;
    assert_eq!(bytes, raw_frame(0, payload));
}

#[test]
fn test_written_subscribe_frame() {
    let bytes = encode_all(&[OutgoingFrame::subscribe(EventKind::VoiceChannelSelect, "x").into()]);
    let header = FrameHeader::decode(bytes[..8].try_into().unwrap());
    assert_eq!(header.opcode_kind(), Some(Opcode::Frame));
    assert_eq!(header.length as usize, bytes.len() - 8);

    let payload: serde_json::Value = serde_json::from_slice(&bytes[8..]).unwrap();
    assert_eq!(
        payload,
        json!({ "cmd": "SUBSCRIBE", "args": {}, "evt": "VOICE_CHANNEL_SELECT", "nonce": "x" })
    );
}

#[test]
fn test_left_voice_channel_payload_has_explicit_nulls() {
    let bytes = encode_all(&[IncomingFrame::dispatch(VoiceChannelSelectEvent::default()).into()]);
    let payload: serde_json::Value = serde_json::from_slice(&bytes[8..]).unwrap();
    assert_eq!(payload["data"], json!({ "channel_id": null, "guild_id": null }));
}

#[test]
fn test_reads_payload_from_desktop_client() {
    let payload = br#"{"cmd":"DISPATCH","data":{"v":1,"config":{"cdn_host":"cdn.discordapp.com","api_endpoint":"//discord.com/api","environment":"production"},"user":{"id":"1","username":"wumpus","discriminator":"0","global_name":"Wumpus","avatar":null,"avatar_decoration_data":null,"bot":false,"flags":0,"premium_type":0}},"evt":"READY","nonce":null}"#;
    let mut reader = reader_over(raw_frame(1, payload));
    let packet = reader.read().unwrap().unwrap();
    let Some(Event::Ready(ready)) = packet.event() else {
        panic!("expected READY");
    };
    assert_eq!(ready.v, Some(1));
    assert_eq!(ready.user.as_ref().unwrap().global_name.as_deref(), Some("Wumpus"));
}

// ---------------------------------------------------------------------------
// Soft unavailability
// ---------------------------------------------------------------------------

#[test]
fn test_empty_stream_yields_no_packet() {
    let mut reader = reader_over(Vec::new());
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn test_unknown_opcode_yields_no_packet() {
    let mut bytes = raw_frame(255, br#"{"whatever":true}"#);
    bytes.extend(raw_frame(2, br#"{"code":1000,"message":"bye"}"#));
    let mut reader = reader_over(bytes);

    assert!(reader.read().unwrap().is_none());
    // The default policy drained the payload, so framing is intact.
    assert_eq!(
        reader.read().unwrap(),
        Some(Packet::Close(ClosePacket {
            code: 1000,
            message: "bye".into(),
        }))
    );
}

#[test]
fn test_unknown_opcode_with_missing_payload_yields_no_packet() {
    let header = FrameHeader {
        opcode: 255,
        length: 1_000_000,
    };
    let mut reader = reader_over(header.encode().to_vec());
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn test_unknown_opcode_drains_in_small_chunks() {
    let config = CodecConfig {
        drain_chunk_size: 3,
        ..CodecConfig::default()
    };
    let mut bytes = raw_frame(77, b"0123456789");
    bytes.extend(raw_frame(3, b"{}"));
    let mut reader = PacketReader::with_config(StreamTransport::new(Cursor::new(bytes)), config);

    assert!(reader.read().unwrap().is_none());
    assert_eq!(reader.read().unwrap(), Some(Packet::Ping(PingPacket(json!({})))));
}

#[test]
fn test_unknown_opcode_abandon_leaves_payload_unread() {
    let config = CodecConfig {
        unknown_opcode: UnknownOpcodePolicy::Abandon,
        ..CodecConfig::default()
    };
    let bytes = raw_frame(255, b"ignored payload");
    let mut reader = PacketReader::with_config(StreamTransport::new(Cursor::new(bytes)), config);

    assert!(reader.read().unwrap().is_none());
    assert_eq!(reader.get_ref().get_ref().position(), 8);
}

#[test]
fn test_handshake_opcode_is_skipped_on_read() {
    let mut bytes = raw_frame(0, br#"{"v":1,"client_id":"1"}"#);
    bytes.extend(raw_frame(4, b"7"));
    let mut reader = reader_over(bytes);

    assert!(reader.read().unwrap().is_none());
    assert_eq!(reader.read().unwrap(), Some(Packet::Pong(PongPacket(json!(7)))));
}

#[test]
fn test_read_frame_tells_skipped_from_unavailable() {
    let mut bytes = raw_frame(42, b"{}");
    bytes.extend(raw_frame(3, b"1"));
    let mut reader = reader_over(bytes);

    assert_eq!(reader.read_frame().unwrap(), ReadOutcome::Skipped);
    assert_eq!(
        reader.read_frame().unwrap(),
        ReadOutcome::Packet(Packet::Ping(PingPacket(json!(1))))
    );
    assert_eq!(reader.read_frame().unwrap(), ReadOutcome::Unavailable);
}

#[test]
fn test_interrupted_drain_is_unavailable() {
    let header = FrameHeader {
        opcode: 99,
        length: 64,
    };
    let mut bytes = header.encode().to_vec();
    bytes.extend_from_slice(b"short");
    let mut reader = reader_over(bytes);
    assert!(reader.read_frame().unwrap().is_unavailable());
}

#[test]
fn test_oversized_payload_is_drained_and_rejected() {
    let config = CodecConfig {
        max_payload_len: 8,
        ..CodecConfig::default()
    };
    let mut bytes = raw_frame(2, br#"{"code":1000,"message":"bye"}"#);
    bytes.extend(raw_frame(3, b"2"));
    let mut reader = PacketReader::with_config(StreamTransport::new(Cursor::new(bytes)), config);

    let err = reader.read().unwrap_err();
    assert!(matches!(err, ProtocolError::PayloadTooLarge(29)));
    assert_eq!(reader.read().unwrap(), Some(Packet::Ping(PingPacket(json!(2)))));
}

#[test]
fn test_oversized_header_does_not_allocate_payload() {
    let header = FrameHeader {
        opcode: 1,
        length: u32::MAX,
    };
    let mut reader = reader_over(header.encode().to_vec());
    // The drain runs out of bytes long before the announced length.
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn test_truncated_payload_yields_no_packet() {
    let mut bytes = raw_frame(2, br#"{"code":1000,"message":"bye"}"#);
    bytes.truncate(bytes.len() - 4);
    let mut reader = reader_over(bytes);
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn test_partial_header_then_fresh_data() {
    let mut reader = PacketReader::new(Pipe::default());

    // Only 5 of 8 header bytes arrive: no packet, no error.
    reader.get_mut().feed(&[0x02, 0x00, 0x00, 0x00, 0x1D]);
    assert!(reader.read().unwrap().is_none());

    // The attempt was abandoned; a complete frame read afterwards decodes.
    reader.get_mut().feed(&raw_frame(2, br#"{"code":1000,"message":"bye"}"#));
    assert_eq!(
        reader.read().unwrap(),
        Some(Packet::Close(ClosePacket {
            code: 1000,
            message: "bye".into(),
        }))
    );
}

// ---------------------------------------------------------------------------
// Structural errors
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_event_is_an_error_and_framing_survives() {
    let mut bytes = raw_frame(
        1,
        br#"{"cmd":"DISPATCH","evt":"SOMETHING_UNDEFINED","data":{},"nonce":null}"#,
    );
    bytes.extend(raw_frame(3, br#"{"ts":1}"#));
    let mut reader = reader_over(bytes);

    let err = reader.read().unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownEvent(ref name) if name == "SOMETHING_UNDEFINED"));
    assert_eq!(
        reader.read().unwrap(),
        Some(Packet::Ping(PingPacket(json!({ "ts": 1 }))))
    );
}

#[test]
fn test_malformed_json_is_an_error() {
    let mut reader = reader_over(raw_frame(2, b"{not json"));
    assert!(matches!(reader.read(), Err(ProtocolError::Decode(_))));
}

#[test]
fn test_invalid_utf8_is_an_error() {
    let mut bytes = raw_frame(3, &[0x22, 0xFF, 0xFE, 0x22]);
    bytes.extend(raw_frame(3, b"1"));
    let mut reader = reader_over(bytes);

    assert!(matches!(reader.read(), Err(ProtocolError::InvalidUtf8(_))));
    assert_eq!(reader.read().unwrap(), Some(Packet::Ping(PingPacket(json!(1)))));
}

#[test]
fn test_zero_length_payload_must_satisfy_schema() {
    let mut reader = reader_over(raw_frame(2, b""));
    assert!(matches!(reader.read(), Err(ProtocolError::Decode(_))));
}

#[test]
fn test_missing_required_field_is_an_error() {
    let mut reader = reader_over(raw_frame(2, br#"{"message":"no code"}"#));
    assert!(matches!(reader.read(), Err(ProtocolError::Decode(_))));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_ping_is_answered_with_identical_pong() {
    let ping = PingPacket(json!({ "ts": 123 }));
    let received = round_trip(Packet::Ping(ping));
    let Packet::Ping(received) = received else {
        panic!("expected a ping");
    };

    let pong = round_trip(Packet::Pong(received.to_pong()));
    assert_eq!(pong, Packet::Pong(PongPacket(json!({ "ts": 123 }))));
}

#[test]
fn test_packet_codec_reads_and_writes() {
    let incoming = raw_frame(3, br#"{"ts":5}"#);
    let mut codec = PacketCodec::new(
        StreamTransport::new(Cursor::new(incoming)),
        StreamTransport::new(Vec::new()),
    );

    let Some(Packet::Ping(ping)) = codec.read().unwrap() else {
        panic!("expected a ping");
    };
    codec.write(&Packet::Pong(ping.to_pong())).unwrap();
    assert!(codec.read().unwrap().is_none());

    let (_reader, writer) = codec.split();
    assert_eq!(writer.into_inner().into_inner(), raw_frame(4, br#"{"ts":5}"#));
}

#[test]
fn test_writer_refuses_dispatch_without_event() {
    let mut writer = PacketWriter::new(StreamTransport::new(Vec::new()));
    let packet = Packet::IncomingFrame(IncomingFrame {
        cmd: Command::Dispatch,
        nonce: None,
        data: FrameData::Response(json!({})),
    });

    let err = writer.write(&packet).unwrap_err();
    assert!(matches!(err, ProtocolError::MissingField("evt")));
    assert!(writer.get_ref().get_ref().is_empty());
}

#[test]
fn test_concurrent_writers_do_not_interleave() {
    let writer = Arc::new(Mutex::new(PacketWriter::new(StreamTransport::new(Vec::new()))));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                for i in 0..25 {
                    let packet = Packet::Ping(PingPacket(json!({ "thread": t, "i": i })));
                    writer.lock().unwrap().write(&packet).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let bytes = Arc::try_unwrap(writer)
        .ok()
        .expect("all threads finished")
        .into_inner()
        .unwrap()
        .into_inner()
        .into_inner();
    let mut reader = reader_over(bytes);
    let mut count = 0;
    while let Some(packet) = reader.read().unwrap() {
        assert!(matches!(packet, Packet::Ping(_)));
        count += 1;
    }
    assert_eq!(count, 100);
}
