use nmea2000::{FastPacket, Identifier};
use socketcan::ExtendedId;
use std::collections::HashMap;
use tracing::trace;

use crate::pgns::N2kMessage;

// Key for tracking multi-frame messages: (PGN, Source)
type FastPacketKey = (u32, u8);

struct FastPacketBuffer {
    sequence: u8,
    next_frame: u8,
    data: Vec<u8>,
    total_len: usize,
}

impl FastPacketBuffer {
    fn new(sequence: u8, total_len: usize) -> Self {
        Self {
            sequence,
            next_frame: 1,
            data: Vec::with_capacity(total_len + 7),
            total_len,
        }
    }

    /// Appends a continuation frame; false when it does not belong to this packet.
    fn add_frame(&mut self, sequence: u8, frame_counter: u8, payload: &[u8]) -> bool {
        if sequence != self.sequence || frame_counter != self.next_frame {
            return false;
        }
        self.data.extend_from_slice(payload);
        self.next_frame = self.next_frame.wrapping_add(1);
        true
    }

    fn is_complete(&self) -> bool {
        self.data.len() >= self.total_len
    }

    fn into_data(mut self) -> Vec<u8> {
        self.data.truncate(self.total_len);
        self.data
    }
}

/// A decoded NMEA2000 message with metadata
pub struct N2kFrame {
    pub identifier: Identifier,
    pub message: N2kMessage,
    #[allow(dead_code)]
    pub is_fast_packet: bool,
    pub data: Vec<u8>, // Complete assembled data
}

/// NMEA2000 Stream Reader
///
/// Stateful reader for NMEA2000 CAN frames. Single-frame PGNs are decoded
/// immediately; fast-packet PGNs are reassembled per (PGN, source) before decoding.
///
/// ```no_run
/// use nmea2k::N2kStreamReader;
/// # let (can_id, data): (nmea2k::ExtendedId, Vec<u8>) = unimplemented!();
///
/// let mut reader = N2kStreamReader::new();
/// if let Some(frame) = reader.process_frame(can_id, &data) {
///     println!("PGN {} from {}: {}", frame.identifier.pgn(), frame.identifier.source(), frame.message);
/// }
/// ```
pub struct N2kStreamReader {
    fast_packet_buffers: HashMap<FastPacketKey, FastPacketBuffer>,
}

impl N2kStreamReader {
    pub fn new() -> Self {
        Self {
            fast_packet_buffers: HashMap::new(),
        }
    }

    /// Process a CAN frame and return a complete message if available
    pub fn process_frame(&mut self, can_id: ExtendedId, data: &[u8]) -> Option<N2kFrame> {
        let identifier = Identifier::from_can_id(can_id);
        let pgn = identifier.pgn();

        if is_fast_packet_pgn(pgn) && data.len() == 8 {
            self.process_fast_packet(identifier, data)
        } else {
            let message = N2kMessage::from_pgn(pgn, data);
            Some(N2kFrame {
                identifier,
                message,
                is_fast_packet: false,
                data: data.to_vec(),
            })
        }
    }

    fn process_fast_packet(&mut self, identifier: Identifier, data: &[u8]) -> Option<N2kFrame> {
        let mut packet_data = [0u8; 8];
        packet_data.copy_from_slice(data);
        let fast_packet = FastPacket(packet_data);

        let pgn = identifier.pgn();
        let key = (pgn, identifier.source());
        let sequence = data[0] >> 5;
        let frame_counter = data[0] & 0x1F;

        let buffer = if fast_packet.is_first() {
            let total_len = fast_packet.total_len()? as usize;
            let mut buffer = FastPacketBuffer::new(sequence, total_len);
            buffer.data.extend_from_slice(fast_packet.data());
            buffer
        } else {
            let mut buffer = self.fast_packet_buffers.remove(&key)?;
            if !buffer.add_frame(sequence, frame_counter, fast_packet.data()) {
                trace!("Dropping out-of-order fast packet frame for PGN {} from {}", key.0, key.1);
                return None;
            }
            buffer
        };

        if !buffer.is_complete() {
            self.fast_packet_buffers.insert(key, buffer);
            return None;
        }

        let complete_data = buffer.into_data();
        let message = N2kMessage::from_pgn(pgn, &complete_data);
        Some(N2kFrame {
            identifier,
            message,
            is_fast_packet: true,
            data: complete_data,
        })
    }
}

fn is_fast_packet_pgn(pgn: u32) -> bool {
    matches!(
        pgn,
        126996 | 127233 | 127237 | 127489 | 127493 | 127505 | 128275 | 129029
            | 129038 | 129039 | 129540 | 129794 | 129809 | 129810
    )
}

impl Default for N2kStreamReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn can_id(pgn: u32, source: u8) -> ExtendedId {
        ExtendedId::new((6 << 26) | (pgn << 8) | source as u32).unwrap()
    }

    /// Splits a payload into fast-packet frames using sequence id 2.
    fn fast_frames(payload: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut first = vec![0x40, payload.len() as u8];
        first.extend_from_slice(&payload[..6.min(payload.len())]);
        first.resize(8, 0xFF);
        frames.push(first);
        for (index, chunk) in payload[6.min(payload.len())..].chunks(7).enumerate() {
            let mut frame = vec![0x40 | (index as u8 + 1)];
            frame.extend_from_slice(chunk);
            frame.resize(8, 0xFF);
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_frame_decoded_immediately() {
        let mut reader = N2kStreamReader::new();
        let data = [0x00, 0xFF, 0xFF, 0x7F, 0xD1, 0x06, 0xFF, 0xFF];
        let frame = reader.process_frame(can_id(127245, 0x23), &data).unwrap();
        assert_eq!(frame.identifier.pgn(), 127245);
        assert_eq!(frame.identifier.source(), 0x23);
        assert!(!frame.is_fast_packet);
        assert!(matches!(frame.message, N2kMessage::Rudder(_)));
    }

    #[test]
    fn test_fast_packet_reassembly() {
        let mut reader = N2kStreamReader::new();
        // distance log: 14 bytes, log 1852 m, trip 926 m
        let mut payload = vec![0xFF; 6];
        payload.extend_from_slice(&1852u32.to_le_bytes());
        payload.extend_from_slice(&926u32.to_le_bytes());
        let frames = fast_frames(&payload);
        assert_eq!(frames.len(), 3);

        assert!(reader.process_frame(can_id(128275, 0x10), &frames[0]).is_none());
        assert!(reader.process_frame(can_id(128275, 0x10), &frames[1]).is_none());
        let frame = reader.process_frame(can_id(128275, 0x10), &frames[2]).unwrap();
        assert!(frame.is_fast_packet);
        assert_eq!(frame.data, payload);
        match frame.message {
            N2kMessage::DistanceLog(log) => {
                assert!((log.log_nm().unwrap() - 1.0).abs() < 1e-9);
                assert!((log.trip_nm().unwrap() - 0.5).abs() < 1e-9);
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn test_fast_packet_sources_assembled_independently() {
        let mut reader = N2kStreamReader::new();
        let payload: Vec<u8> = (0..14).collect();
        let frames = fast_frames(&payload);
        assert!(reader.process_frame(can_id(128275, 1), &frames[0]).is_none());
        assert!(reader.process_frame(can_id(128275, 2), &frames[0]).is_none());
        assert!(reader.process_frame(can_id(128275, 2), &frames[1]).is_none());
        assert!(reader.process_frame(can_id(128275, 1), &frames[1]).is_none());
        assert!(reader.process_frame(can_id(128275, 2), &frames[2]).is_some());
        assert!(reader.process_frame(can_id(128275, 1), &frames[2]).is_some());
    }

    #[test]
    fn test_orphan_continuation_frame_dropped() {
        let mut reader = N2kStreamReader::new();
        let payload: Vec<u8> = (0..14).collect();
        let frames = fast_frames(&payload);
        assert!(reader.process_frame(can_id(128275, 1), &frames[1]).is_none());
        assert!(reader.process_frame(can_id(128275, 1), &frames[2]).is_none());
    }
}
