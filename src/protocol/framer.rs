//! Per-connection packet framing
//!
//! Glue between a byte stream and the resolver: bytes go in with
//! [`PacketFramer::extend`], complete frames come out of
//! [`PacketFramer::next_frame`]. No I/O happens here.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::trace;

use super::resolver::{FrameResolver, Resolution, ResolverState};
use super::schema::SchemaTable;
use super::types::{opcode_name, Side};
use crate::constants::{DEFAULT_MAX_FRAME_SIZE, READ_CHUNK_SIZE};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Unknown Packet ID: 0x{opcode:02x}({})", opcode_name(.opcode))]
    UnrecognizedOpcode { opcode: u8 },

    #[error("Packet 0x{opcode:02x} is {len} bytes, limit is {max}")]
    FrameTooLarge { opcode: u8, len: usize, max: usize },
}

/// Buffer and resolver state for the packets one connection receives.
pub struct PacketFramer {
    table: Arc<SchemaTable>,
    side: Side,
    buffer: BytesMut,
    state: ResolverState,
    max_frame_len: usize,
}

impl PacketFramer {
    pub fn new(table: Arc<SchemaTable>, side: Side) -> Self {
        Self::with_max_frame_len(table, side, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_len(table: Arc<SchemaTable>, side: Side, max_frame_len: usize) -> Self {
        Self {
            table,
            side,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            state: ResolverState::new(),
            max_frame_len,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn table(&self) -> &SchemaTable {
        &self.table
    }

    /// Append bytes read from the stream.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet returned as frames.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next complete frame off the buffer.
    ///
    /// `Ok(None)` means the buffer holds a partial frame (or nothing); call
    /// again after [`PacketFramer::extend`]. After an error the stream can no
    /// longer be framed and the connection should be dropped.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        let Some(&opcode) = self.buffer.first() else {
            return Ok(None);
        };

        let resolver = FrameResolver::new(&self.table, self.side);
        match resolver.resolve(opcode, &self.buffer, &mut self.state) {
            Resolution::Determined(len) => {
                self.check_len(opcode, len)?;
                trace!("Framed 0x{:02x}: {} bytes", opcode, len);
                Ok(Some(self.buffer.split_to(len).freeze()))
            }
            Resolution::NeedMore => {
                if let Some(len) = self.state.known_length() {
                    self.check_len(opcode, len)?;
                }
                Ok(None)
            }
            Resolution::Unrecognized => Err(FrameError::UnrecognizedOpcode { opcode }),
        }
    }

    /// Bytes still missing from the frame in progress, when its length is known.
    pub fn bytes_wanted(&self) -> Option<usize> {
        self.state
            .known_length()
            .map(|len| len.saturating_sub(self.buffer.len()))
    }

    /// Drop buffered bytes and resolver progress.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state.reset();
    }

    fn check_len(&self, opcode: u8, len: usize) -> Result<(), FrameError> {
        if len > self.max_frame_len {
            return Err(FrameError::FrameTooLarge {
                opcode,
                len,
                max: self.max_frame_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::Packet;
    use crate::protocol::packets::{ChatMessage, HandshakeC2s, KeepAlive, ServerboundPacket};
    use crate::protocol::string16::String16;

    fn framer(side: Side) -> PacketFramer {
        PacketFramer::new(Arc::new(SchemaTable::standard().unwrap()), side)
    }

    #[test]
    fn test_frames_split_across_reads() {
        let mut framer = framer(Side::Server);
        let mut stream = HandshakeC2s {
            username: String16::from("Notch"),
        }
        .encode();
        stream.extend(KeepAlive { keep_alive_id: 9 }.encode());

        framer.extend(&stream[..2]);
        assert_eq!(framer.next_frame(), Ok(None));
        assert_eq!(framer.bytes_wanted(), None);

        framer.extend(&stream[2..5]);
        assert_eq!(framer.next_frame(), Ok(None));
        assert_eq!(framer.bytes_wanted(), Some(13 - 5));

        framer.extend(&stream[5..]);
        let first = framer.next_frame().unwrap().unwrap();
        assert_eq!(first.len(), 13);
        assert!(matches!(
            ServerboundPacket::decode(&first),
            Ok(ServerboundPacket::HandshakeC2s(p)) if p.username == "Notch"
        ));

        let second = framer.next_frame().unwrap().unwrap();
        assert_eq!(&second[..], &[0x00, 0x00, 0x00, 0x00, 0x09]);
        assert_eq!(framer.next_frame(), Ok(None));
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut framer = framer(Side::Server);
        let frame = ChatMessage {
            msg: String16::from("hello"),
        }
        .encode();

        let mut frames = Vec::new();
        for byte in &frame {
            framer.extend(&[*byte]);
            if let Some(f) = framer.next_frame().unwrap() {
                frames.push(f);
            }
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], &frame[..]);
    }

    #[test]
    fn test_unrecognized_opcode() {
        let mut framer = framer(Side::Server);
        framer.extend(&[0x33, 0x00]);

        let err = framer.next_frame().unwrap_err();
        assert_eq!(err, FrameError::UnrecognizedOpcode { opcode: 0x33 });
        assert_eq!(err.to_string(), "Unknown Packet ID: 0x33(CHUNK_MAP)");
    }

    #[test]
    fn test_frame_too_large_before_payload_arrives() {
        let mut framer = PacketFramer::with_max_frame_len(
            Arc::new(SchemaTable::standard().unwrap()),
            Side::Client,
            64,
        );
        // Kick announcing 1000 characters.
        framer.extend(&[0xFF, 0x03, 0xE8]);

        assert_eq!(
            framer.next_frame(),
            Err(FrameError::FrameTooLarge {
                opcode: 0xFF,
                len: 2003,
                max: 64
            })
        );
    }

    #[test]
    fn test_clear() {
        let mut framer = framer(Side::Client);
        framer.extend(&[0x03, 0x00, 0x04]);
        assert_eq!(framer.next_frame(), Ok(None));

        framer.clear();
        assert_eq!(framer.buffered(), 0);
        assert_eq!(framer.bytes_wanted(), None);
    }
}
