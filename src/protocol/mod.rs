//! Beta 1.8.1 packet protocol
//!
//! Packets are a one byte opcode followed by big-endian fields in declared
//! order. There is no length prefix: frame lengths come from the schema
//! table and the one String16 count a packet may carry.

#[macro_use]
mod macros;

pub mod codec;
pub mod framer;
pub mod packets;
pub mod reader;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod string16;
pub mod types;
pub mod writer;

pub use codec::{describe_frame, DecodeError, Packet};
pub use framer::{FrameError, PacketFramer};
pub use packets::{ClientboundPacket, ServerboundPacket};
pub use reader::{DecodeCursor, ReadError, ReadResult};
pub use record::DynamicRecord;
pub use resolver::{FrameResolver, Resolution, ResolverState};
pub use schema::{FieldSpec, PacketSchema, SchemaError, SchemaResult, SchemaTable, SchemaTableBuilder};
pub use string16::String16;
pub use types::{Direction, FieldType, FieldValue, PacketId, Side, WireField};
pub use writer::PacketWriter;
