//! Schema-driven records
//!
//! [`DynamicRecord`] is the runtime counterpart of the generated packet
//! structs: it holds one [`FieldValue`] per schema field and is encoded and
//! decoded by walking the schema. Tooling uses it for packets it only knows
//! by name.

use std::fmt;

use super::codec::DecodeError;
use super::reader::DecodeCursor;
use super::schema::PacketSchema;
use super::types::FieldValue;
use super::writer::PacketWriter;

/// A packet record with named, typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    pub opcode: u8,
    pub name: &'static str,
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl DynamicRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Replace the value of a field. Returns false when there is no such field.
    pub fn set(&mut self, name: &str, value: FieldValue) -> bool {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_i64)
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(FieldValue::as_string16)
            .map(|s| s.to_string_lossy())
    }

    /// Bytes the encoded record occupies, opcode included.
    pub fn encoded_len(&self) -> usize {
        1 + self.fields.iter().map(|(_, v)| v.wire_len()).sum::<usize>()
    }
}

impl fmt::Display for DynamicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name, self.opcode)?;
        if !self.fields.is_empty() {
            write!(f, " {{")?;
            for (i, (name, value)) in self.fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {}: {}", name, value)?;
            }
            write!(f, " }}")?;
        }
        Ok(())
    }
}

impl PacketSchema {
    /// A record of this schema with every field at its default value.
    pub fn default_record(&self) -> DynamicRecord {
        DynamicRecord {
            opcode: self.opcode(),
            name: self.name(),
            fields: self
                .fields()
                .iter()
                .map(|f| (f.name, f.field_type.default_value()))
                .collect(),
        }
    }

    /// Encode a record of this schema.
    ///
    /// # Panics
    ///
    /// When the record's opcode, field count or any field type disagrees with
    /// the schema. Those records can only come from a programming error.
    pub fn encode_record(&self, record: &DynamicRecord) -> Vec<u8> {
        assert_eq!(
            record.opcode,
            self.opcode(),
            "record opcode does not match schema {}",
            self.name()
        );
        assert_eq!(
            record.fields.len(),
            self.fields().len(),
            "record field count does not match schema {}",
            self.name()
        );

        let mut writer = PacketWriter::with_capacity(record.encoded_len());
        writer.write_u8(self.opcode());
        for (spec, (_, value)) in self.fields().iter().zip(&record.fields) {
            assert_eq!(
                value.field_type(),
                spec.field_type,
                "field {}.{} has the wrong type",
                self.name(),
                spec.name
            );
            value.write(&mut writer);
        }
        writer.into_bytes()
    }

    /// Decode a complete frame of this schema.
    ///
    /// Every field is attempted even after a failure; any failure rejects the
    /// whole record.
    pub fn decode_record(&self, frame: &[u8]) -> Result<DynamicRecord, DecodeError> {
        let opcode = *frame.first().ok_or(DecodeError::EmptyFrame)?;
        if opcode != self.opcode() {
            return Err(DecodeError::OpcodeMismatch {
                expected: self.opcode(),
                found: opcode,
            });
        }

        let mut cursor = DecodeCursor::after_opcode(frame);
        let mut record = self.default_record();
        for (spec, (_, slot)) in self.fields().iter().zip(record.fields.iter_mut()) {
            match spec.field_type.read(&mut cursor) {
                Ok(value) => *slot = value,
                Err(_) => cursor.record_failure(),
            }
        }

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
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::schema::SchemaTable;
    use crate::protocol::string16::String16;
    use crate::protocol::types::{Direction, FieldType, Side};

    fn spawn_named_table() -> SchemaTable {
        let mut builder = SchemaTable::builder();
        builder
            .register(
                "ent_spawn_named",
                0x14,
                &[
                    ("eid", FieldType::Int),
                    ("name", FieldType::String16),
                    ("x", FieldType::Int),
                    ("y", FieldType::Int),
                    ("z", FieldType::Int),
                    ("rotation", FieldType::Byte),
                    ("pitch", FieldType::Byte),
                    ("cur_item", FieldType::Short),
                ],
                Direction::ServerToClient,
                "",
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_default_record() {
        let table = spawn_named_table();
        let record = table.lookup(0x14, Side::Client).unwrap().default_record();

        assert_eq!(record.fields.len(), 8);
        assert_eq!(record.get_i64("eid"), Some(0));
        assert_eq!(record.get_string("name").as_deref(), Some(""));
        assert_eq!(record.encoded_len(), 1 + 4 + 2 + 12 + 2 + 2);
    }

    #[test]
    fn test_encode_decode_record() {
        let table = spawn_named_table();
        let schema = table.lookup(0x14, Side::Client).unwrap();
        let mut record = schema.default_record();
        assert!(record.set("eid", FieldValue::Int(-7)));
        assert!(record.set("name", FieldValue::String16(String16::from("Notch"))));
        assert!(record.set("cur_item", FieldValue::Short(i16::MAX)));
        assert!(!record.set("missing", FieldValue::Int(0)));

        let bytes = schema.encode_record(&record);
        assert_eq!(bytes.len(), record.encoded_len());
        assert_eq!(&bytes[..5], &[0x14, 0xFF, 0xFF, 0xFF, 0xF9]);

        let decoded = schema.decode_record(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(
            decoded.to_string(),
            "ent_spawn_named (0x14) { eid: -7, name: \"Notch\", x: 0, y: 0, z: 0, rotation: 0, pitch: 0, cur_item: 32767 }"
        );
    }

    #[test]
    fn test_decode_record_truncated() {
        let table = spawn_named_table();
        let schema = table.lookup(0x14, Side::Client).unwrap();
        let bytes = schema.encode_record(&schema.default_record());

        let err = schema.decode_record(&bytes[..9]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::FieldFailures {
                opcode: 0x14,
                failures: 4
            }
        );
    }

    #[test]
    #[should_panic(expected = "record opcode does not match schema")]
    fn test_encode_opcode_mismatch_panics() {
        let table = spawn_named_table();
        let schema = table.lookup(0x14, Side::Client).unwrap();
        let mut record = schema.default_record();
        record.opcode = 0x15;

        schema.encode_record(&record);
    }

    #[test]
    #[should_panic(expected = "has the wrong type")]
    fn test_encode_type_mismatch_panics() {
        let table = spawn_named_table();
        let schema = table.lookup(0x14, Side::Client).unwrap();
        let mut record = schema.default_record();
        record.set("eid", FieldValue::Long(1));

        schema.encode_record(&record);
    }
}
