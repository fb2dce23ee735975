//! Packet schema catalog
//!
//! A [`SchemaTable`] is built once at startup through [`SchemaTableBuilder`]
//! and is immutable afterwards. Schemas with more than one String16 field are
//! rejected during registration and never reach lookup, so no framing or
//! decoding path can exist for them.

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use super::types::{Direction, FieldType, PacketId, Side};
use crate::constants::{OPCODE_LEN, STRING16_PREFIX_LEN};

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema {name} (0x{opcode:02x}) has {variable_fields} String16 fields, at most one is supported")]
    UnsupportedSchema {
        name: &'static str,
        opcode: u8,
        variable_fields: usize,
    },

    #[error("Schema {name} reuses opcode 0x{opcode:02x} already taken by {existing} for the {side} side")]
    DuplicateOpcode {
        opcode: u8,
        side: Side,
        existing: &'static str,
        name: &'static str,
    },
}

/// Number of variable-width fields in a field list.
pub const fn variable_field_count(fields: &[(&str, FieldType)]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < fields.len() {
        if fields[i].1.is_variable() {
            count += 1;
        }
        i += 1;
    }
    count
}

/// Whether no opcode appears twice.
pub const fn opcodes_unique(opcodes: &[u8]) -> bool {
    let mut i = 0;
    while i < opcodes.len() {
        let mut j = i + 1;
        while j < opcodes.len() {
            if opcodes[i] == opcodes[j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

// =============================================================================
// FIELD SPEC / PACKET SCHEMA
// =============================================================================

/// One field of a packet layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    /// Zero-based wire order.
    pub position: usize,
}

/// The layout of one packet in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSchema {
    name: &'static str,
    opcode: u8,
    fields: Vec<FieldSpec>,
    direction: Direction,
    doc: &'static str,
}

impl PacketSchema {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn packet_id(&self) -> Option<PacketId> {
        PacketId::from_id(self.opcode)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn is_received_by(&self, side: Side) -> bool {
        self.direction.received_by(side)
    }

    pub fn variable_field_count(&self) -> usize {
        self.fields.iter().filter(|f| f.field_type.is_variable()).count()
    }

    /// Frame length with every String16 empty.
    pub fn min_frame_len(&self) -> usize {
        OPCODE_LEN
            + self
                .fields
                .iter()
                .map(|f| f.field_type.fixed_width().unwrap_or(STRING16_PREFIX_LEN))
                .sum::<usize>()
    }

    /// Frame length when the schema has no String16 field.
    pub fn fixed_frame_len(&self) -> Option<usize> {
        (self.variable_field_count() == 0).then(|| self.min_frame_len())
    }
}

impl fmt::Display for PacketSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x}, {})", self.name, self.opcode, self.direction)
    }
}

/// A schema turned away at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedSchema {
    pub name: &'static str,
    pub opcode: u8,
    pub direction: Direction,
    pub variable_fields: usize,
}

// =============================================================================
// TABLE
// =============================================================================

type SideIndex = [Option<u16>; 256];

/// Immutable catalog of supported packet layouts.
///
/// Lookup is per receiving side: the same opcode can name different layouts
/// for the server and the client (e.g. the login request), but never two
/// layouts for one side.
#[derive(Debug, Clone)]
pub struct SchemaTable {
    schemas: Vec<PacketSchema>,
    by_side: [SideIndex; 2],
    unsupported: Vec<UnsupportedSchema>,
}

impl SchemaTable {
    pub fn builder() -> SchemaTableBuilder {
        SchemaTableBuilder::new()
    }

    /// The schema `side` uses to frame and decode `opcode`.
    pub fn lookup(&self, opcode: u8, side: Side) -> Option<&PacketSchema> {
        self.by_side[side.index()][opcode as usize].map(|i| &self.schemas[i as usize])
    }

    /// The schema registered for exactly this opcode and direction.
    pub fn get(&self, opcode: u8, direction: Direction) -> Option<&PacketSchema> {
        self.schemas
            .iter()
            .find(|s| s.opcode == opcode && s.direction == direction)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PacketSchema> {
        self.schemas.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PacketSchema> {
        self.schemas.iter()
    }

    /// Schemas received by `side`, in registration order.
    pub fn received_by(&self, side: Side) -> impl Iterator<Item = &PacketSchema> {
        self.schemas.iter().filter(move |s| s.is_received_by(side))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Schemas excluded at registration for having several String16 fields.
    pub fn unsupported(&self) -> &[UnsupportedSchema] {
        &self.unsupported
    }
}

/// Collects registrations and validates them one by one.
#[derive(Debug, Default)]
pub struct SchemaTableBuilder {
    schemas: Vec<PacketSchema>,
    unsupported: Vec<UnsupportedSchema>,
}

impl SchemaTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one packet layout. Field order in `fields` is wire order.
    ///
    /// A layout with more than one String16 field is recorded as unsupported
    /// and left out of the table; the returned error says so but leaves the
    /// builder usable.
    pub fn register(
        &mut self,
        name: &'static str,
        opcode: u8,
        fields: &[(&'static str, FieldType)],
        direction: Direction,
        doc: &'static str,
    ) -> SchemaResult<()> {
        let variable_fields = variable_field_count(fields);
        if variable_fields > 1 {
            warn!(
                "Excluding {} (0x{:02x}): {} String16 fields need hand-written framing",
                name, opcode, variable_fields
            );
            self.unsupported.push(UnsupportedSchema {
                name,
                opcode,
                direction,
                variable_fields,
            });
            return Err(SchemaError::UnsupportedSchema {
                name,
                opcode,
                variable_fields,
            });
        }

        for side in Side::BOTH {
            if !direction.received_by(side) {
                continue;
            }
            if let Some(existing) = self
                .schemas
                .iter()
                .find(|s| s.opcode == opcode && s.is_received_by(side))
            {
                return Err(SchemaError::DuplicateOpcode {
                    opcode,
                    side,
                    existing: existing.name,
                    name,
                });
            }
        }

        let fields = fields
            .iter()
            .enumerate()
            .map(|(position, &(name, field_type))| FieldSpec {
                name,
                field_type,
                position,
            })
            .collect();

        debug!("Registered schema {} (0x{:02x}, {})", name, opcode, direction);
        self.schemas.push(PacketSchema {
            name,
            opcode,
            fields,
            direction,
            doc,
        });
        Ok(())
    }

    /// Freeze the registrations into a table.
    pub fn build(self) -> SchemaTable {
        let mut by_side: [SideIndex; 2] = [[None; 256]; 2];
        for (i, schema) in self.schemas.iter().enumerate() {
            for side in Side::BOTH {
                if schema.is_received_by(side) {
                    by_side[side.index()][schema.opcode as usize] = Some(i as u16);
                }
            }
        }

        SchemaTable {
            schemas: self.schemas,
            by_side,
            unsupported: self.unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_fields() -> [(&'static str, FieldType); 1] {
        [("msg", FieldType::String16)]
    }

    #[test]
    fn test_register_assigns_positions() {
        let mut builder = SchemaTable::builder();
        builder
            .register(
                "ent_equipment",
                0x05,
                &[
                    ("eid", FieldType::Int),
                    ("slot", FieldType::Short),
                    ("item_id", FieldType::Short),
                    ("damage", FieldType::Short),
                ],
                Direction::Bidirectional,
                "",
            )
            .unwrap();
        let table = builder.build();

        let schema = table.lookup(0x05, Side::Server).unwrap();
        let positions: Vec<usize> = schema.fields().iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert_eq!(schema.fixed_frame_len(), Some(11));
        assert_eq!(schema.field("slot").unwrap().field_type, FieldType::Short);
    }

    #[test]
    fn test_multiple_strings_excluded() {
        let mut builder = SchemaTable::builder();
        let result = builder.register(
            "update_sign",
            0x82,
            &[
                ("x", FieldType::Int),
                ("text0", FieldType::String16),
                ("text1", FieldType::String16),
            ],
            Direction::Bidirectional,
            "",
        );
        assert_eq!(
            result,
            Err(SchemaError::UnsupportedSchema {
                name: "update_sign",
                opcode: 0x82,
                variable_fields: 2
            })
        );

        builder
            .register("chat_message", 0x03, &chat_fields(), Direction::Bidirectional, "")
            .unwrap();
        let table = builder.build();

        assert_eq!(table.len(), 1);
        assert!(table.lookup(0x82, Side::Server).is_none());
        assert!(table.lookup(0x82, Side::Client).is_none());
        assert_eq!(table.unsupported().len(), 1);
        assert_eq!(table.unsupported()[0].name, "update_sign");
    }

    #[test]
    fn test_same_opcode_per_direction() {
        let mut builder = SchemaTable::builder();
        builder
            .register(
                "handshake_c2s",
                0x02,
                &[("username", FieldType::String16)],
                Direction::ClientToServer,
                "",
            )
            .unwrap();
        builder
            .register(
                "handshake_s2c",
                0x02,
                &[("connection_hash", FieldType::String16)],
                Direction::ServerToClient,
                "",
            )
            .unwrap();
        let table = builder.build();

        assert_eq!(table.lookup(0x02, Side::Server).unwrap().name(), "handshake_c2s");
        assert_eq!(table.lookup(0x02, Side::Client).unwrap().name(), "handshake_s2c");
        assert_eq!(
            table.get(0x02, Direction::ServerToClient).unwrap().fields()[0].name,
            "connection_hash"
        );
    }

    #[test]
    fn test_duplicate_for_same_side_rejected() {
        let mut builder = SchemaTable::builder();
        builder
            .register("chat_message", 0x03, &chat_fields(), Direction::Bidirectional, "")
            .unwrap();
        let err = builder
            .register("chat_c2s", 0x03, &chat_fields(), Direction::ClientToServer, "")
            .unwrap_err();

        assert_eq!(
            err,
            SchemaError::DuplicateOpcode {
                opcode: 0x03,
                side: Side::Server,
                existing: "chat_message",
                name: "chat_c2s"
            }
        );
    }

    #[test]
    fn test_min_frame_len_counts_string_prefix() {
        let mut builder = SchemaTable::builder();
        builder
            .register(
                "window_open",
                0x64,
                &[
                    ("window_id", FieldType::Byte),
                    ("window_type", FieldType::Byte),
                    ("title", FieldType::String16),
                    ("num_slots", FieldType::Byte),
                ],
                Direction::Bidirectional,
                "",
            )
            .unwrap();
        let table = builder.build();
        let schema = table.find_by_name("WINDOW_OPEN").unwrap();

        assert_eq!(schema.min_frame_len(), 6);
        assert_eq!(schema.fixed_frame_len(), None);
        assert_eq!(schema.variable_field_count(), 1);
    }

    #[test]
    fn test_const_helpers() {
        const FIELDS: &[(&str, FieldType)] = &[
            ("a", FieldType::String16),
            ("b", FieldType::Int),
            ("c", FieldType::String16),
        ];
        assert_eq!(variable_field_count(FIELDS), 2);
        assert!(opcodes_unique(&[0x00, 0x01, 0xFF]));
        assert!(!opcodes_unique(&[0x00, 0x01, 0x00]));
        assert!(opcodes_unique(&[]));
    }
}
