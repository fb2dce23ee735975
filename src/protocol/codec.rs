//! Typed packet codec
//!
//! [`Packet`] is implemented by every record struct generated with
//! [`define_packets!`](crate::define_packets). Encoding writes the opcode and
//! each field in declared order; decoding works on a frame whose length the
//! resolver has already confirmed.

use thiserror::Error;

use super::reader::DecodeCursor;
use super::record::DynamicRecord;
use super::schema::SchemaTable;
use super::types::{opcode_name, Direction, FieldType, FieldValue, PacketId, Side};
use super::writer::PacketWriter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty frame")]
    EmptyFrame,

    #[error("Frame opcode 0x{found:02x} does not match expected 0x{expected:02x}")]
    OpcodeMismatch { expected: u8, found: u8 },

    #[error("Unknown Packet ID: 0x{opcode:02x}({}) for the {side} side", opcode_name(.opcode))]
    UnrecognizedOpcode { opcode: u8, side: Side },

    #[error("Failed to decode {failures} field(s) of packet 0x{opcode:02x}")]
    FieldFailures { opcode: u8, failures: u32 },

    #[error("Packet 0x{opcode:02x} has {trailing} trailing byte(s)")]
    TrailingBytes { opcode: u8, trailing: usize },
}

/// A packet record with a statically known layout.
pub trait Packet: Sized + Default {
    const ID: PacketId;
    const DIRECTION: Direction;
    /// Schema name, e.g. `keep_alive`.
    const NAME: &'static str;
    const DOC: &'static str;
    /// Field names and types in wire order.
    const FIELDS: &'static [(&'static str, FieldType)];

    /// Write every field in declared order.
    fn encode_fields(&self, writer: &mut PacketWriter);

    /// Read every field in declared order, counting failures on the cursor.
    fn decode_fields(cursor: &mut DecodeCursor<'_>) -> Self;

    /// Frame length of this record, opcode included.
    fn encoded_len(&self) -> usize;

    /// Field values in declared order.
    fn field_values(&self) -> Vec<(&'static str, FieldValue)>;

    /// Encode the record as one complete frame.
    fn encode(&self) -> Vec<u8> {
        let mut writer = PacketWriter::with_capacity(self.encoded_len());
        writer.write_u8(Self::ID.id());
        self.encode_fields(&mut writer);
        debug_assert_eq!(writer.len(), self.encoded_len());
        writer.into_bytes()
    }

    /// Decode one complete frame, opcode byte included.
    fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        let opcode = *frame.first().ok_or(DecodeError::EmptyFrame)?;
        if opcode != Self::ID.id() {
            return Err(DecodeError::OpcodeMismatch {
                expected: Self::ID.id(),
                found: opcode,
            });
        }

        let mut cursor = DecodeCursor::after_opcode(frame);
        let packet = Self::decode_fields(&mut cursor);
        if cursor.failures() > 0 {
            return Err(DecodeError::FieldFailures {
                opcode,
                failures: cursor.failures(),
            });
        }
        if !cursor.is_empty() {
            return Err(DecodeError::TrailingBytes {
                opcode,
                trailing: cursor.remaining(),
            });
        }
        Ok(packet)
    }

    fn to_record(&self) -> DynamicRecord {
        DynamicRecord {
            opcode: Self::ID.id(),
            name: Self::NAME,
            fields: self.field_values(),
        }
    }
}

/// Render a frame for logs: `name (0x..) { field: value, ... }`.
///
/// Frames that do not decode are shown with their error and a hex dump.
pub fn describe_frame(table: &SchemaTable, side: Side, frame: &[u8]) -> String {
    let Some(&opcode) = frame.first() else {
        return "<empty frame>".to_string();
    };

    match table.lookup(opcode, side) {
        Some(schema) => match schema.decode_record(frame) {
            Ok(record) => record.to_string(),
            Err(e) => format!(
                "{} (0x{:02x}) <{}> [{}]",
                schema.name(),
                opcode,
                e,
                hex::encode(frame)
            ),
        },
        None => format!(
            "0x{:02x}({}) <no {} schema> [{}]",
            opcode,
            PacketId::name_for(opcode),
            side,
            hex::encode(frame)
        ),
    }
}
